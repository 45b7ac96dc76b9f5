//! `Chart.yaml` manifest loading

use crate::error::ChartDocError;
use crate::system::System;
use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// File name of a chart manifest
pub const CHART_FILE: &str = "Chart.yaml";

/// File name of a chart's values document
pub const VALUES_FILE: &str = "values.yaml";

/// Chart manifest
///
/// Fields that chartdoc does not interpret are kept in `extra` so custom
/// templates can still reference them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChartManifest {
    /// Chart name
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_version: Option<String>,

    /// Sub-charts this chart depends on
    #[serde(default)]
    pub dependencies: Vec<Dependency>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

/// A dependency declared in `Chart.yaml`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Dependency {
    pub name: String,

    /// Version used to locate the packaged archive
    pub version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,

    /// Name the dependency's values are scoped under, instead of `name`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

impl Dependency {
    /// Key the dependency's values live under in the parent chart
    #[must_use]
    pub fn namespace(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    /// File name of the packaged archive under `charts/`
    #[must_use]
    pub fn archive_name(&self) -> String {
        format!("{}-{}.tgz", self.name, self.version)
    }
}

impl ChartManifest {
    /// Parse a manifest from YAML text
    ///
    /// # Errors
    ///
    /// Returns [`ChartDocError::DocumentParse`] with line and column when
    /// the YAML is malformed or misses required fields
    pub fn from_yaml(content: &str, origin: &Path) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| {
            let message = if let Some(location) = e.location() {
                format!(
                    "{} at line {}, column {}: {e}",
                    origin.display(),
                    location.line(),
                    location.column()
                )
            } else {
                format!("{}: {e}", origin.display())
            };
            ChartDocError::document_parse(message).into()
        })
    }

    /// Load `Chart.yaml` from a chart directory
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, unreadable or malformed
    pub fn load(system: &dyn System, chart_dir: &Path) -> Result<Self> {
        let content = read_chart_file(system, chart_dir, CHART_FILE)?;
        Self::from_yaml(&content, &chart_dir.join(CHART_FILE))
    }
}

/// Read one of a chart's documents, failing with `DocumentNotFound` if absent
///
/// # Errors
///
/// Returns an error if the file does not exist or cannot be read
pub fn read_chart_file(system: &dyn System, chart_dir: &Path, file_name: &str) -> Result<String> {
    let path = chart_dir.join(file_name);

    if !system.is_file(&path) {
        return Err(ChartDocError::document_not_found(format!(
            "{} (is '{}' a Helm chart directory?)",
            path.display(),
            chart_dir.display()
        ))
        .into());
    }

    system
        .read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::MockSystem;

    #[test]
    fn test_parse_manifest_with_dependencies() {
        let manifest = ChartManifest::from_yaml(
            "apiVersion: v2\nname: web\nversion: 1.2.0\ndependencies:\n  - name: redis\n    version: 17.0.0\n    alias: cache\n",
            Path::new("Chart.yaml"),
        )
        .unwrap();

        assert_eq!(manifest.name, "web");
        assert_eq!(manifest.dependencies.len(), 1);
        assert_eq!(manifest.dependencies[0].namespace(), "cache");
        assert_eq!(manifest.dependencies[0].archive_name(), "redis-17.0.0.tgz");
        assert!(manifest.extra.contains_key("apiVersion"));
    }

    #[test]
    fn test_missing_name_is_parse_error() {
        let err = ChartManifest::from_yaml("version: 1.0.0\n", Path::new("Chart.yaml")).unwrap_err();
        let err = err.downcast_ref::<ChartDocError>().unwrap();
        assert!(matches!(err, ChartDocError::DocumentParse { .. }));
    }

    #[test]
    fn test_missing_chart_file() {
        let system = MockSystem::new().with_dir("/charts/empty").unwrap();
        let err = ChartManifest::load(&system, Path::new("/charts/empty")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ChartDocError>(),
            Some(ChartDocError::DocumentNotFound { .. })
        ));
    }
}
