//! Command-line interface module
//!
//! Handles argument parsing and maps flags onto generation options

pub mod args;

pub use args::*;
