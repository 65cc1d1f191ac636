pub mod picking;
pub mod selector;
pub mod traversal;
pub mod view;
pub mod viewport;
pub mod zoom;

pub use picking::*;
pub use selector::*;
pub use traversal::*;
pub use view::*;
pub use viewport::*;
pub use zoom::*;
