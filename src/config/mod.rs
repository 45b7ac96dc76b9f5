//! Configuration management module
//!
//! Handles the optional `chartdoc.yaml` file, its JSON schema validation and
//! the chart manifest model

pub mod chart;
pub mod schema;
pub mod validation;
pub mod yaml;

use crate::system::System;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default location of the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "./chartdoc.yaml";

/// Main configuration structure
///
/// Every field is optional; command-line flags take precedence over values
/// set here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Built-in output format name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_format: Option<String>,

    /// Append a generated-by footer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credits: Option<bool>,

    /// Dependency handling
    #[serde(default)]
    pub dependencies: DependencyConfig,
}

/// `dependencies` section of the configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_repo_refresh: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_missing_archive: Option<MissingArchivePolicy>,
}

/// What to do when a declared dependency has no archive under `charts/`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingArchivePolicy {
    /// Log a warning and leave the dependency undocumented
    #[default]
    Skip,
    /// Abort with `DependencyArchiveMissing`
    Fail,
}

impl Config {
    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, malformed or invalid
    pub fn load_from_file(system: &dyn System, path: &Path) -> anyhow::Result<Self> {
        yaml::load_config(system, path)
    }

    /// Load configuration, tolerating a missing file unless it was asked for
    ///
    /// `explicit` is true when the path came from `--config`.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicit file is missing, or any file present
    /// is malformed or invalid
    pub fn discover(system: &dyn System, path: &Path, explicit: bool) -> anyhow::Result<Self> {
        if !explicit && !system.exists(path) {
            tracing::debug!("No configuration file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load_from_file(system, path)
    }

    /// Validate configuration semantics
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is inconsistent
    pub fn validate(&self) -> anyhow::Result<()> {
        validation::validate_config(self)
    }
}
