//! Documentation rendering with Tera templates

use crate::config::chart::ChartManifest;
use crate::error::ChartDocError;
use crate::system::System;
use crate::values::Parameter;
use anyhow::{Context as _, Result};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tera::{Context, Tera};
use tracing::debug;

/// Name of the per-chart template override file
pub const DOTFILE_NAME: &str = ".chartdoc";

/// Built-in documentation format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[non_exhaustive]
pub enum OutputFormat {
    /// Markdown with a parameter table
    #[default]
    Markdown,
    /// reStructuredText with a list-table
    Rst,
}

impl OutputFormat {
    /// Every built-in format
    pub const ALL: [Self; 2] = [Self::Markdown, Self::Rst];

    /// Template name used on the command line and in configuration
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Markdown => "markdown",
            Self::Rst => "rst",
        }
    }

    const fn template_source(self) -> &'static str {
        match self {
            Self::Markdown => include_str!("../../templates/markdown.tera"),
            Self::Rst => include_str!("../../templates/rst.tera"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "markdown" | "md" => Ok(Self::Markdown),
            "rst" => Ok(Self::Rst),
            _ => Err(format!(
                "Invalid format: {s}. Use one of: {}",
                list_templates().join(", ")
            )),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Names of the built-in templates
#[must_use]
pub fn list_templates() -> Vec<&'static str> {
    OutputFormat::ALL.iter().map(|format| format.name()).collect()
}

/// Render documentation for a chart
///
/// A `.chartdoc` file in `chart_dir` replaces the built-in template for
/// `format`. The template sees every manifest field at the top level,
/// `values` (the parameters) and `credits`.
///
/// # Errors
///
/// Returns [`ChartDocError::Template`] if the template fails to parse or
/// render
pub fn render(
    system: &dyn System,
    chart_dir: &Path,
    manifest: &ChartManifest,
    parameters: &[Parameter],
    format: OutputFormat,
    credits: bool,
) -> Result<String> {
    let dotfile = chart_dir.join(DOTFILE_NAME);
    let (template_name, source) = if system.is_file(&dotfile) {
        debug!("Using template override {}", dotfile.display());
        let source = system
            .read_to_string(&dotfile)
            .with_context(|| format!("Failed to read {}", dotfile.display()))?;
        (DOTFILE_NAME, source)
    } else {
        (format.name(), format.template_source().to_owned())
    };

    let mut tera = Tera::default();
    tera.add_raw_template(template_name, &source)
        .map_err(|e| ChartDocError::template(format_tera_error(&e)))?;

    let mut context = Context::from_serialize(manifest)
        .map_err(|e| ChartDocError::template(format_tera_error(&e)))?;
    context.insert("values", parameters);
    context.insert("credits", &credits);

    let rendered = tera
        .render(template_name, &context)
        .map_err(|e| ChartDocError::template(format_tera_error(&e)))?;

    Ok(rendered)
}

/// Collect a Tera error and its causes into one message
fn format_tera_error(error: &tera::Error) -> String {
    use std::error::Error as _;

    let mut messages = vec![error.to_string()];
    let mut current = error.source();
    while let Some(cause) = current {
        messages.push(cause.to_string());
        current = cause.source();
    }

    messages.join("\n  → ")
}
