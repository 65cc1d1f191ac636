pub mod catalog;
pub mod color;
pub mod footprint;
pub mod grid;
pub mod stack;
pub mod survey;

pub use catalog::*;
pub use color::*;
pub use footprint::*;
pub use grid::*;
pub use stack::*;
pub use survey::*;
