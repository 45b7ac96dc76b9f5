use crate::config::{Config, DEFAULT_CONFIG_PATH, MissingArchivePolicy};
use crate::operations::generate::GenerateOptions;
use crate::operations::render::OutputFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments for chartdoc
#[derive(Parser, Debug, Clone)]
#[command(name = "chartdoc")]
#[command(about = "Generate documentation for Helm charts from their values.yaml")]
#[command(long_about = None)]
#[command(version)]
pub struct Args {
    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Print documentation for a chart
    Gen(GenArgs),

    /// Regenerate documentation for every chart below the current directory
    ///
    /// Exits with status 1 when any file was rewritten.
    Hook(HookArgs),

    /// List the built-in output formats
    Templates,
}

/// Flags shared by `gen` and `hook`
#[derive(clap::Args, Debug, Clone, Default)]
pub struct RenderArgs {
    /// Output format (built-in template name)
    #[arg(short = 'o', long = "output-format", value_name = "FORMAT")]
    pub output_format: Option<OutputFormat>,

    /// Leave out the generated-by footer
    #[arg(long)]
    pub no_credits: bool,

    /// Do not document the values of chart dependencies
    #[arg(long)]
    pub no_deps: bool,

    /// Configuration file path
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Arguments of `chartdoc gen`
#[derive(clap::Args, Debug, Clone)]
pub struct GenArgs {
    /// Chart directory containing Chart.yaml and values.yaml
    #[arg(value_name = "CHART_DIR")]
    pub chart_dir: PathBuf,

    #[command(flatten)]
    pub render: RenderArgs,

    /// Pass --skip-refresh to helm dependency update
    #[arg(long)]
    pub skip_dependency_refresh: bool,

    /// Use archives already under charts/ without running helm
    #[arg(long)]
    pub no_dependency_update: bool,

    /// Fail when a dependency archive is missing instead of skipping it
    #[arg(long)]
    pub strict_dependencies: bool,
}

/// Arguments of `chartdoc hook`
#[derive(clap::Args, Debug, Clone)]
pub struct HookArgs {
    /// File written next to each Chart.yaml
    #[arg(long, value_name = "NAME", default_value = "README.md")]
    pub output_file: String,

    #[command(flatten)]
    pub render: RenderArgs,
}

impl RenderArgs {
    /// Configuration path and whether it was given explicitly
    #[must_use]
    pub fn config_path(&self) -> (PathBuf, bool) {
        self.config.clone().map_or_else(
            || (PathBuf::from(DEFAULT_CONFIG_PATH), false),
            |path| (path, true),
        )
    }

    /// Apply these flags on top of options from the configuration file
    pub fn apply(&self, options: &mut GenerateOptions) {
        if let Some(format) = self.output_format {
            options.format = format;
        }
        if self.no_credits {
            options.credits = false;
        }
        if self.no_deps {
            options.load.include_dependencies = false;
        }
    }
}

impl GenArgs {
    /// Resolve generation options from the configuration and flags
    ///
    /// # Errors
    ///
    /// Returns an error if the configured output format is unknown
    pub fn options(&self, config: &Config) -> anyhow::Result<GenerateOptions> {
        let mut options = GenerateOptions::from_config(config)?;
        self.render.apply(&mut options);

        if self.skip_dependency_refresh {
            options.load.skip_dependency_repo_refresh = true;
        }
        if self.no_dependency_update {
            options.load.update_dependencies = false;
        }
        if self.strict_dependencies {
            options.load.missing_archive = MissingArchivePolicy::Fail;
        }

        Ok(options)
    }
}

impl HookArgs {
    /// Resolve generation options from the configuration and flags
    ///
    /// # Errors
    ///
    /// Returns an error if the configured output format is unknown
    pub fn options(&self, config: &Config) -> anyhow::Result<GenerateOptions> {
        let mut options = GenerateOptions::from_config(config)?;
        self.render.apply(&mut options);
        Ok(options)
    }
}
