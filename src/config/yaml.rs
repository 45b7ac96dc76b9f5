//! YAML configuration loading and parsing

use crate::config::Config;
use crate::error::ChartDocError;
use crate::system::System;
use anyhow::{Context as _, Result};
use std::path::Path;

/// Load and parse YAML configuration from file
///
/// # Errors
///
/// Returns [`ChartDocError::Configuration`] if the file is missing, is not
/// valid YAML or does not match the schema
pub fn load_config(system: &dyn System, path: &Path) -> Result<Config> {
    if !system.exists(path) {
        return Err(ChartDocError::configuration(format!(
            "Configuration file not found: {}\n\
            Create a chartdoc.yaml file or specify a different path with --config",
            path.display()
        ))
        .into());
    }

    let content = system
        .read_to_string(path)
        .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;

    parse_config(&content).map_err(|e| {
        ChartDocError::configuration(format!("{}: {e:#}", path.display())).into()
    })
}

/// Parse and validate configuration text
///
/// The raw document is checked against the JSON schema before it is
/// deserialized, so unknown keys are reported instead of ignored.
///
/// # Errors
///
/// Returns an error if the text is not valid YAML, fails schema validation
/// or fails semantic validation
pub fn parse_config(content: &str) -> Result<Config> {
    let mut raw: serde_json::Value = if content.trim().is_empty() {
        serde_json::Value::Null
    } else {
        serde_yaml::from_str(content).context("Failed to parse YAML configuration")?
    };
    if raw.is_null() {
        raw = serde_json::Value::Object(serde_json::Map::new());
    }

    crate::config::schema::validate_against_schema(&raw)?;

    let config: Config =
        serde_json::from_value(raw).context("Failed to read configuration fields")?;

    crate::config::validation::validate_config(&config)?;

    Ok(config)
}
