//! rtvars - real-time variable substrate CLI
//!
//! Inspects the demo robot registry and drives it through a filter pipeline
//! into a history buffer.

#![deny(static_mut_refs)]
#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]

mod commands;
mod demo;
mod error;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::commands::{SchemaArgs, SimulateArgs};
use crate::error::CliError;

#[derive(Parser)]
#[command(name = "rtvars")]
#[command(about = "Real-time variable substrate CLI - inspect registries and record filter runs")]
#[command(version)]
#[command(long_about = "
rtvars builds a small demo robot registry and lets you inspect its schema or
run it through an alpha filter, a rate limiter and a backlash compensator
while a history buffer records every tick.

Both commands accept --config with a .json, .yaml or .yml file that sets the
buffer capacity, the default bounds policy and the allowed variable kinds.
")]
struct Cli {
    /// Verbose logging
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the demo registry schema
    Schema(SchemaArgs),

    /// Run the demo filter pipeline and print the newest recorded rows as JSON
    Simulate(SimulateArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("rtvars={log_level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();

    match execute_command(&cli) {
        Ok(()) => Ok(()),
        Err(e) => {
            output::print_error_human(&e);

            let exit_code = e.downcast_ref::<CliError>().map_or(1, CliError::exit_code);
            std::process::exit(exit_code);
        }
    }
}

fn execute_command(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Schema(args) => commands::schema::execute(args),
        Commands::Simulate(args) => commands::simulate::execute(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn parse_schema_defaults() -> TestResult {
        let cli = Cli::try_parse_from(["rtvars", "schema"])?;
        assert_eq!(cli.verbose, 0);
        assert!(matches!(
            cli.command,
            Commands::Schema(SchemaArgs {
                config: None,
                json: false
            })
        ));
        Ok(())
    }

    #[test]
    fn parse_verbose_levels() -> TestResult {
        let cli = Cli::try_parse_from(["rtvars", "-vv", "schema", "--json"])?;
        assert_eq!(cli.verbose, 2);
        let cli = Cli::try_parse_from(["rtvars", "schema", "-vvv"])?;
        assert_eq!(cli.verbose, 3);
        Ok(())
    }

    #[test]
    fn parse_simulate() -> TestResult {
        let cli = Cli::try_parse_from([
            "rtvars", "simulate", "--config", "sub.yaml", "--ticks", "100", "--dt", "0.002",
            "--window", "5",
        ])?;
        match cli.command {
            Commands::Simulate(args) => {
                assert_eq!(args.ticks, 100);
                assert!((args.dt - 0.002).abs() < f64::EPSILON);
                assert_eq!(args.window, 5);
                assert_eq!(args.config.as_deref(), Some(std::path::Path::new("sub.yaml")));
            }
            Commands::Schema(_) => return Err("expected simulate".into()),
        }
        Ok(())
    }

    #[test]
    fn parse_simulate_default_window() -> TestResult {
        let cli = Cli::try_parse_from(["rtvars", "simulate", "--ticks", "1", "--dt", "1"])?;
        assert!(matches!(
            cli.command,
            Commands::Simulate(SimulateArgs { window: 10, .. })
        ));
        Ok(())
    }

    #[test]
    fn reject_bad_timestep() {
        for dt in ["0", "-0.1", "nan", "inf", "fast"] {
            assert!(
                Cli::try_parse_from(["rtvars", "simulate", "--ticks", "1", "--dt", dt]).is_err(),
                "dt {dt} should be rejected"
            );
        }
    }

    #[test]
    fn reject_zero_ticks_and_window() {
        assert!(Cli::try_parse_from(["rtvars", "simulate", "--ticks", "0", "--dt", "0.01"]).is_err());
        assert!(
            Cli::try_parse_from([
                "rtvars", "simulate", "--ticks", "5", "--dt", "0.01", "--window", "0"
            ])
            .is_err()
        );
    }

    #[test]
    fn missing_subcommand_is_error() {
        assert!(Cli::try_parse_from(["rtvars"]).is_err());
    }
}
