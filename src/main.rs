//! # chartdoc
//!
//! Command-line entry point. Documentation goes to stdout, logs go to
//! stderr.
//!
//! ```sh
//! chartdoc gen ./charts/web -o markdown > README.md
//! chartdoc hook --output-file README.md
//! ```

use chartdoc::cli::{Args, Command};
use chartdoc::error::ChartDocError;
use chartdoc::system::RealSystem;
use clap::Parser as _;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::{EnvFilter, fmt};

fn main() -> ExitCode {
    let args = Args::parse();

    let log_level = if args.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();

    let system = RealSystem::new();

    let result = match &args.command {
        Command::Gen(gen_args) => chartdoc::run_gen(gen_args, &system).map(|documentation| {
            print!("{documentation}");
            ExitCode::SUCCESS
        }),
        Command::Hook(hook_args) => {
            chartdoc::run_hook_command(hook_args, &system).map(|changed| {
                if changed == 0 {
                    ExitCode::SUCCESS
                } else {
                    eprintln!("chartdoc: updated {changed} file(s)");
                    ExitCode::FAILURE
                }
            })
        }
        Command::Templates => {
            println!("{}", chartdoc::run_templates());
            Ok(ExitCode::SUCCESS)
        }
    };

    result.unwrap_or_else(|err| {
        error!("{err:#}");
        let code = err
            .downcast_ref::<ChartDocError>()
            .map_or(1, ChartDocError::exit_code);
        ExitCode::from(u8::try_from(code).unwrap_or(1))
    })
}
