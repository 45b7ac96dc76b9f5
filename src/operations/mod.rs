//! Operations module
//!
//! Loads charts with their dependencies, renders documentation and keeps
//! generated files up to date

pub mod archive;
pub mod dependencies;
pub mod generate;
pub mod hook;
pub mod render;

pub use dependencies::{LoadOptions, LoadedChart, load_chart, load_with_dependencies, squash};
pub use generate::{GenerateOptions, generate};
pub use hook::run_hook;
pub use render::{OutputFormat, list_templates, render};
