//! Utility functions and helpers

pub mod path;
