//! `chartdoc` - Documentation generator for Helm charts
//!
//! Reads a chart's `values.yaml`, turns every leaf value into a documented
//! parameter (dot-joined path, inline comment, JSON default), merges in the
//! parameters of the chart's dependencies and renders the result through a
//! Markdown or reStructuredText template.

pub mod cli;
pub mod config;
pub mod error;
pub mod operations;
pub mod system;
pub mod utils;
pub mod values;

use anyhow::Result;
use cli::{GenArgs, HookArgs};
use config::Config;
use operations::{generate, list_templates, run_hook};
use system::System;

/// Run the `gen` command, returning the documentation
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the chart cannot be
/// documented
pub fn run_gen(args: &GenArgs, system: &dyn System) -> Result<String> {
    let (config_path, explicit) = args.render.config_path();
    let config = Config::discover(system, &config_path, explicit)?;
    let options = args.options(&config)?;

    generate(system, &args.chart_dir, &options)
}

/// Run the `hook` command over the current directory
///
/// Returns the number of files rewritten.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or any chart cannot be
/// documented
pub fn run_hook_command(args: &HookArgs, system: &dyn System) -> Result<usize> {
    let (config_path, explicit) = args.render.config_path();
    let config = Config::discover(system, &config_path, explicit)?;
    let options = args.options(&config)?;
    let root = system.current_dir()?;

    run_hook(system, &root, &args.output_file, &options)
}

/// Names of the built-in output formats, one per line
#[must_use]
pub fn run_templates() -> String {
    list_templates().join("\n")
}
