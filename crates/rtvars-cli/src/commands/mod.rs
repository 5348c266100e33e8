//! Command implementations for the rtvars CLI

pub mod schema;
pub mod simulate;

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;
use rtvars_config::{SubstrateConfig, is_config_error};
use rtvars_errors::RegistryError;
use tracing::info;

use crate::demo::DemoRobot;
use crate::error::CliError;

#[derive(Args, Debug)]
pub struct SchemaArgs {
    /// Configuration file (.json, .yaml or .yml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output in JSON format for machine parsing
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Configuration file (.json, .yaml or .yml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Number of control ticks to run
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub ticks: u64,

    /// Control period in seconds
    #[arg(long, value_parser = parse_timestep)]
    pub dt: f64,

    /// Number of most recent rows to print
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    pub window: u64,

    /// Alpha filter break frequency [Hz]
    #[arg(long, default_value_t = 5.0)]
    pub break_frequency: f64,

    /// Rate limit [rad/s]
    #[arg(long, default_value_t = 2.0)]
    pub max_rate: f64,

    /// Backlash dead band [rad]
    #[arg(long, default_value_t = 0.01)]
    pub dead_band: f64,
}

fn parse_timestep(raw: &str) -> Result<f64, String> {
    let dt: f64 = raw.parse().map_err(|e| format!("{e}"))?;
    rtvars_filters::validate_timestep(dt).map_err(|e| e.to_string())?;
    Ok(dt)
}

/// Load the configuration file, or the built-in defaults without one.
///
/// Problems with the file's content are reported as configuration errors;
/// failing to read it is not.
pub fn load_config(path: Option<&Path>) -> Result<SubstrateConfig> {
    let Some(path) = path else {
        return Ok(SubstrateConfig::default());
    };
    let config = SubstrateConfig::load(path).map_err(|error| {
        if is_config_error(&error) {
            CliError::InvalidConfiguration(format!("{error:#}")).into()
        } else {
            error
        }
    })?;
    info!(path = %path.display(), capacity = config.buffer.capacity, "loaded configuration");
    Ok(config)
}

/// Build the demo robot, treating a disallowed kind as a configuration error.
pub fn build_robot(config: &SubstrateConfig) -> Result<DemoRobot, CliError> {
    DemoRobot::build(config).map_err(|error| match error {
        RegistryError::KindNotAllowed { .. } => {
            CliError::InvalidConfiguration(error.to_string())
        }
        other => CliError::Registry(other),
    })
}
