//! Download system for ttgrab

pub mod downloader;
pub mod transport;
pub mod waterfall;

pub use downloader::*;
pub use transport::*;
pub use waterfall::*;
