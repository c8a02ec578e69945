//! Core functionality for ttgrab

pub mod descriptor;
pub mod history;
pub mod queue;
pub mod session;

pub use descriptor::*;
pub use history::*;
pub use queue::*;
pub use session::*;
