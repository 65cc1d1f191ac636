pub mod cache;
pub mod index;

pub use cache::*;
pub use index::*;
