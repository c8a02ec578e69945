//! Command-line interface

pub mod args;
pub mod output;

pub use args::*;
