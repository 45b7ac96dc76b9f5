//! Chart loading with dependency merge
//!
//! A chart documents its own values first. Each declared dependency is then
//! located under `charts/`, unpacked into a scratch directory, loaded
//! recursively under its namespace and merged into the result. When the
//! same path is produced twice, the first occurrence wins.

use crate::config::MissingArchivePolicy;
use crate::config::chart::{CHART_FILE, ChartManifest, Dependency, VALUES_FILE, read_chart_file};
use crate::error::ChartDocError;
use crate::operations::archive::extract_archive;
use crate::system::System;
use crate::values::{Parameter, parse_values, traverse};
use anyhow::{Context as _, Result};
use indexmap::IndexMap;
use indexmap::map::Entry;
use regex::Regex;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Name of the external dependency tool
pub const HELM_PROGRAM: &str = "helm";

/// Directory holding a chart's packaged dependencies
pub const CHARTS_DIR: &str = "charts";

/// Options controlling dependency handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    /// Document dependencies at all
    pub include_dependencies: bool,
    /// Pass `--skip-refresh` to `helm dependency update`
    pub skip_dependency_repo_refresh: bool,
    /// Run `helm dependency update` before reading archives
    pub update_dependencies: bool,
    pub missing_archive: MissingArchivePolicy,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            include_dependencies: true,
            skip_dependency_repo_refresh: false,
            update_dependencies: true,
            missing_archive: MissingArchivePolicy::Skip,
        }
    }
}

/// A chart's manifest together with its documented parameters
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedChart {
    pub manifest: ChartManifest,
    pub parameters: Vec<Parameter>,
}

/// Where a dependency's chart was found
#[derive(Debug, Clone, PartialEq, Eq)]
enum DependencySource {
    Archive(PathBuf),
    Directory(PathBuf),
}

/// Load a chart and document its own values only
///
/// `root` prefixes every parameter path.
///
/// # Errors
///
/// Returns an error if `Chart.yaml` or `values.yaml` is missing or malformed
pub fn load_chart(system: &dyn System, chart_dir: &Path, root: &[String]) -> Result<LoadedChart> {
    let manifest = ChartManifest::load(system, chart_dir)?;

    let values_path = chart_dir.join(VALUES_FILE);
    let content = read_chart_file(system, chart_dir, VALUES_FILE)?;
    let tree = parse_values(&content)
        .with_context(|| format!("Failed to parse {}", values_path.display()))?;

    let parameters = traverse(&tree, root)?;
    debug!(
        "Chart '{}' at {} documents {} parameters",
        manifest.name,
        chart_dir.display(),
        parameters.len()
    );

    Ok(LoadedChart {
        manifest,
        parameters,
    })
}

/// Load a chart and merge in the parameters of its dependencies
///
/// The returned manifest is the chart's own. Parameters come in document
/// order, own values first, then each dependency in declaration order.
///
/// # Errors
///
/// Returns an error if:
/// - The chart's own documents are missing or malformed
/// - `helm` is missing or fails while updating dependencies
/// - An archive is missing and the policy is [`MissingArchivePolicy::Fail`]
/// - An archive cannot be extracted
pub fn load_with_dependencies(
    system: &dyn System,
    chart_dir: &Path,
    options: &LoadOptions,
) -> Result<LoadedChart> {
    load_recursive(system, chart_dir, &[], options)
}

fn load_recursive(
    system: &dyn System,
    chart_dir: &Path,
    root: &[String],
    options: &LoadOptions,
) -> Result<LoadedChart> {
    let LoadedChart {
        manifest,
        parameters,
    } = load_chart(system, chart_dir, root)?;

    if !options.include_dependencies || manifest.dependencies.is_empty() {
        return Ok(LoadedChart {
            manifest,
            parameters,
        });
    }

    if options.update_dependencies {
        update_dependencies(system, chart_dir, options.skip_dependency_repo_refresh)?;
    }

    // Bundled charts of an archive are already materialized.
    let nested_options = LoadOptions {
        update_dependencies: false,
        ..*options
    };

    let mut merged = parameters;
    for dependency in &manifest.dependencies {
        let mut namespace = root.to_vec();
        namespace.push(dependency.namespace().to_owned());

        let Some(source) = locate_dependency(system, chart_dir, dependency)? else {
            let message = format!(
                "No archive for dependency '{}' version {} under {}",
                dependency.name,
                dependency.version,
                chart_dir.join(CHARTS_DIR).display()
            );
            match options.missing_archive {
                MissingArchivePolicy::Skip => {
                    warn!("{message}, skipping its values");
                    continue;
                }
                MissingArchivePolicy::Fail => {
                    return Err(ChartDocError::dependency_archive_missing(message).into());
                }
            }
        };

        let loaded = match source {
            DependencySource::Directory(dir) => {
                debug!("Using unpacked dependency at {}", dir.display());
                load_recursive(system, &dir, &namespace, &nested_options)?
            }
            DependencySource::Archive(archive) => {
                let scratch = system.create_temp_dir().map_err(|e| {
                    ChartDocError::filesystem(format!("Failed to create temporary directory: {e}"))
                })?;
                extract_archive(system, &archive, scratch.path())?;
                let dir = find_chart_root(system, scratch.path(), dependency, &archive)?;
                debug!(
                    "Loading dependency '{}' from {}",
                    dependency.name,
                    archive.display()
                );
                load_recursive(system, &dir, &namespace, &nested_options)?
            }
        };

        merged = squash(merged.into_iter().chain(loaded.parameters));
    }

    Ok(LoadedChart {
        manifest,
        parameters: merged,
    })
}

/// Deduplicate parameters by path, keeping the first occurrence
///
/// Paths keep the order in which they were first seen.
///
/// # Example
/// ```
/// use chartdoc::operations::dependencies::squash;
/// use chartdoc::values::Parameter;
///
/// let merged = squash([Parameter::new("k", "d1", "v1"), Parameter::new("k", "d2", "v2")]);
/// assert_eq!(merged, vec![Parameter::new("k", "d1", "v1")]);
/// ```
pub fn squash<I>(parameters: I) -> Vec<Parameter>
where
    I: IntoIterator<Item = Parameter>,
{
    let mut table: IndexMap<String, (String, String)> = IndexMap::new();

    for parameter in parameters {
        match table.entry(parameter.path) {
            Entry::Occupied(slot) => debug!("Dropping duplicate parameter {}", slot.key()),
            Entry::Vacant(slot) => {
                slot.insert((parameter.description, parameter.default));
            }
        }
    }

    table
        .into_iter()
        .map(|(path, (description, default))| Parameter {
            path,
            description,
            default,
        })
        .collect()
}

/// Run `helm dependency update` on a chart directory
///
/// # Errors
///
/// Returns [`ChartDocError::DependencyToolMissing`] if `helm` is not
/// installed and [`ChartDocError::DependencyTool`] if it fails
pub fn update_dependencies(system: &dyn System, chart_dir: &Path, skip_refresh: bool) -> Result<()> {
    let mut args = vec![
        "dependency".to_owned(),
        "update".to_owned(),
        chart_dir.display().to_string(),
    ];
    if skip_refresh {
        args.push("--skip-refresh".to_owned());
    }

    info!("Running {HELM_PROGRAM} {}", args.join(" "));

    let output = system.run_command(HELM_PROGRAM, &args).map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            ChartDocError::dependency_tool_missing(
                "'helm' was not found on PATH. Install Helm (https://helm.sh/docs/intro/install/) \
                or pass --no-deps to document the chart without its dependencies",
            )
        } else {
            ChartDocError::dependency_tool(format!("Failed to run helm: {e}"))
        }
    })?;

    if !output.success {
        let code = output
            .code
            .map_or_else(|| "a signal".to_owned(), |c| format!("exit code {c}"));
        return Err(ChartDocError::dependency_tool(format!(
            "helm dependency update failed with {code}: {}",
            output.stderr.trim()
        ))
        .into());
    }

    Ok(())
}

/// Find a dependency's chart under `charts/`
///
/// Tries the exact `{name}-{version}.tgz` archive, then an unpacked
/// `charts/{name}/` chart, then a single `{name}-<semver>.tgz` archive for
/// version ranges resolved by helm.
fn locate_dependency(
    system: &dyn System,
    chart_dir: &Path,
    dependency: &Dependency,
) -> Result<Option<DependencySource>> {
    let charts = chart_dir.join(CHARTS_DIR);

    let exact = charts.join(dependency.archive_name());
    if system.is_file(&exact) {
        return Ok(Some(DependencySource::Archive(exact)));
    }

    let unpacked = charts.join(&dependency.name);
    if system.is_file(&unpacked.join(CHART_FILE)) {
        return Ok(Some(DependencySource::Directory(unpacked)));
    }

    if !system.is_dir(&charts) {
        return Ok(None);
    }

    let pattern = Regex::new(&format!(
        r"^{}-v?\d+\.\d+\.\d+(?:[-+][0-9A-Za-z.+-]*)?\.tgz$",
        regex::escape(&dependency.name)
    ))?;

    let candidates: Vec<PathBuf> = system
        .read_dir(&charts)
        .with_context(|| format!("Failed to list {}", charts.display()))?
        .into_iter()
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| pattern.is_match(name))
                && system.is_file(path)
        })
        .collect();

    match candidates.as_slice() {
        [single] => Ok(Some(DependencySource::Archive(single.clone()))),
        [] => Ok(None),
        several => {
            warn!(
                "Found {} archives for dependency '{}' with no exact version match: {}",
                several.len(),
                dependency.name,
                several
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            Ok(None)
        }
    }
}

/// Directory of the chart unpacked from an archive
///
/// Helm packages a chart under a directory named after it; an archive with
/// a single top-level chart directory of another name is accepted too.
fn find_chart_root(
    system: &dyn System,
    extracted: &Path,
    dependency: &Dependency,
    archive: &Path,
) -> Result<PathBuf> {
    let named = extracted.join(&dependency.name);
    if system.is_file(&named.join(CHART_FILE)) {
        return Ok(named);
    }

    let charts: Vec<PathBuf> = system
        .read_dir(extracted)
        .map_err(|e| ChartDocError::archive_extraction(format!("{}: {e}", archive.display())))?
        .into_iter()
        .filter(|path| system.is_file(&path.join(CHART_FILE)))
        .collect();

    if let [single] = charts.as_slice() {
        return Ok(single.clone());
    }

    Err(ChartDocError::archive_extraction(format!(
        "{} does not contain a '{}' chart directory",
        archive.display(),
        dependency.name
    ))
    .into())
}
