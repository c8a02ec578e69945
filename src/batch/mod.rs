//! Bulk input parsing and batched resolution

pub mod scheduler;

pub use scheduler::*;
