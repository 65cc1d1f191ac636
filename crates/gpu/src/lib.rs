pub mod backend;
pub mod commands;

pub use backend::*;
pub use commands::*;
