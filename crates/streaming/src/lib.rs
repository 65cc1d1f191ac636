pub mod allsky;
pub mod buffer;
pub mod downloader;
pub mod properties;
pub mod tile;
pub mod url;

pub use allsky::*;
pub use buffer::*;
pub use downloader::*;
pub use properties::*;
pub use tile::*;
pub use url::*;
