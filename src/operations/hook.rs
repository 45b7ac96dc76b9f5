//! Pre-commit hook: regenerate documentation for every chart in a tree

use crate::config::chart::CHART_FILE;
use crate::operations::generate::{GenerateOptions, generate};
use crate::system::System;
use anyhow::{Context as _, Result};
use std::ffi::OsStr;
use std::path::Path;
use tracing::{debug, info};

/// Regenerate `output_file` next to every `Chart.yaml` under `root`
///
/// A file is only written when its content would change; a missing file
/// counts as changed. Hidden directories are not searched, and the
/// dependency repository refresh is always skipped.
///
/// Returns the number of files written.
///
/// # Errors
///
/// Returns an error if walking the tree fails, a chart cannot be
/// documented or a file cannot be written
pub fn run_hook(
    system: &dyn System,
    root: &Path,
    output_file: &str,
    options: &GenerateOptions,
) -> Result<usize> {
    let mut options = *options;
    options.load.skip_dependency_repo_refresh = true;

    let entries = system
        .walk_dir(root, false, false)
        .with_context(|| format!("Failed to walk directory: {}", root.display()))?;

    let mut changed = 0;
    for entry in entries {
        if !entry.is_file || entry.path.file_name() != Some(OsStr::new(CHART_FILE)) {
            continue;
        }
        let Some(chart_dir) = entry.path.parent() else {
            continue;
        };

        let documentation = generate(system, chart_dir, &options)?;
        let artifact = chart_dir.join(output_file);

        let current = if system.is_file(&artifact) {
            system
                .read_to_string(&artifact)
                .with_context(|| format!("Failed to read {}", artifact.display()))?
        } else {
            String::new()
        };

        if current == documentation {
            debug!("{} is up to date", artifact.display());
            continue;
        }

        system
            .write(&artifact, documentation.as_bytes())
            .with_context(|| format!("Failed to write {}", artifact.display()))?;
        info!("Updated {}", artifact.display());
        changed += 1;
    }

    Ok(changed)
}
