pub mod budget;
pub mod event_bus;
pub mod frame;
pub mod redraw;
pub mod work_queue;

pub use budget::*;
pub use event_bus::*;
pub use frame::*;
pub use redraw::*;
pub use work_queue::*;
