//! Documentation generation for a single chart

use crate::config::Config;
use crate::operations::dependencies::{LoadOptions, load_with_dependencies};
use crate::operations::render::{OutputFormat, render};
use crate::system::System;
use anyhow::Result;
use std::path::Path;
use tracing::info;

/// Everything needed to document a chart
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerateOptions {
    pub format: OutputFormat,
    /// Append a generated-by footer
    pub credits: bool,
    pub load: LoadOptions,
}

impl GenerateOptions {
    /// Options described by a configuration file, defaults elsewhere
    ///
    /// # Errors
    ///
    /// Returns an error if the configured output format is unknown
    pub fn from_config(config: &Config) -> Result<Self> {
        let defaults = LoadOptions::default();
        let deps = &config.dependencies;

        let format = match config.output_format.as_deref() {
            Some(name) => name.parse::<OutputFormat>().map_err(anyhow::Error::msg)?,
            None => OutputFormat::default(),
        };

        Ok(Self {
            format,
            credits: config.credits.unwrap_or(true),
            load: LoadOptions {
                include_dependencies: deps.include.unwrap_or(defaults.include_dependencies),
                skip_dependency_repo_refresh: deps
                    .skip_repo_refresh
                    .unwrap_or(defaults.skip_dependency_repo_refresh),
                update_dependencies: deps.update.unwrap_or(defaults.update_dependencies),
                missing_archive: deps.on_missing_archive.unwrap_or(defaults.missing_archive),
            },
        })
    }
}

/// Generate documentation for the chart in `chart_dir`
///
/// # Errors
///
/// Returns an error if the chart cannot be loaded or the template fails
pub fn generate(system: &dyn System, chart_dir: &Path, options: &GenerateOptions) -> Result<String> {
    info!("Documenting chart at {}", chart_dir.display());

    let loaded = load_with_dependencies(system, chart_dir, &options.load)?;

    render(
        system,
        chart_dir,
        &loaded.manifest,
        &loaded.parameters,
        options.format,
        options.credits,
    )
}
