//! Configuration validation logic

use crate::config::{Config, MissingArchivePolicy};
use crate::operations::render::OutputFormat;
use anyhow::{Result, anyhow};
use tracing::warn;

/// Validate a complete configuration
///
/// # Errors
///
/// Returns an error if:
/// - The output format is not a built-in format
#[inline]
pub fn validate_config(config: &Config) -> Result<()> {
    if let Some(format) = config.output_format.as_ref() {
        format.parse::<OutputFormat>().map_err(|e| anyhow!("outputFormat: {e}"))?;
    }

    validate_dependency_settings(config);

    Ok(())
}

/// Warn about dependency settings that have no effect
fn validate_dependency_settings(config: &Config) {
    let deps = &config.dependencies;

    if deps.include == Some(false) {
        if deps.update.is_some() || deps.skip_repo_refresh.is_some() {
            warn!("dependencies.update and dependencies.skipRepoRefresh are ignored when dependencies.include is false");
        }
        if deps.on_missing_archive == Some(MissingArchivePolicy::Fail) {
            warn!("dependencies.onMissingArchive has no effect when dependencies.include is false");
        }
    }

    if deps.update == Some(false) && deps.skip_repo_refresh == Some(true) {
        warn!("dependencies.skipRepoRefresh has no effect when dependencies.update is false");
    }
}
