pub mod bounds;
pub mod math;
pub mod time;

pub use bounds::*;
pub use time::*;
