//! Multi-provider resolution for ttgrab

pub mod providers;
pub mod resolver;

pub use providers::*;
pub use resolver::*;
