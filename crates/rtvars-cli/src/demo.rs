//! Demo robot registry used by `schema` and `simulate`.

use std::f64::consts::PI;

use rtvars_config::SubstrateConfig;
use rtvars_errors::RegistryError;
use rtvars_registry::{Registry, VariableHandle, VariableSpec};

/// Operating modes of the demo joint controller.
pub const MODES: [&str; 3] = ["idle", "tracking", "fault"];

/// A single-joint robot with a command smoothing pipeline.
#[derive(Debug)]
pub struct DemoRobot {
    pub registry: Registry,
    pub command: VariableHandle,
    pub smoothed: VariableHandle,
    pub limited: VariableHandle,
    pub output: VariableHandle,
    pub enabled: VariableHandle,
    pub mode: VariableHandle,
    pub cycle: VariableHandle,
}

impl DemoRobot {
    /// Build the registry under the given configuration.
    ///
    /// Fails with `KindNotAllowed` if the configuration excludes a kind the
    /// demo needs.
    pub fn build(config: &SubstrateConfig) -> Result<Self, RegistryError> {
        let mut registry = Registry::with_options("robot", config.registry_options())?;

        let joint = registry.create_child("joint")?;
        let command = joint.register(
            VariableSpec::double("q_command")
                .with_bounds(-PI, PI)
                .with_description("commanded joint angle [rad]"),
        )?;
        let smoothed = joint.register(
            VariableSpec::double("q_smoothed").with_description("alpha filtered command [rad]"),
        )?;
        let limited = joint.register(
            VariableSpec::double("q_limited").with_description("rate limited command [rad]"),
        )?;
        let output = joint.register(
            VariableSpec::double("q_output").with_description("backlash compensated output [rad]"),
        )?;

        let status = registry.create_child("status")?;
        let enabled = status.register(VariableSpec::boolean("enabled"))?;
        let mode = status.register(VariableSpec::enumeration("mode", MODES))?;
        let cycle = status.register(VariableSpec::long("cycle").with_description("tick counter"))?;

        Ok(Self {
            registry,
            command,
            smoothed,
            limited,
            output,
            enabled,
            mode,
            cycle,
        })
    }
}

/// Commanded joint angle at `time` seconds.
///
/// A slow sine with a step in the middle, so every filter has work to do.
pub fn trajectory(time: f64) -> f64 {
    let wave = 0.8 * (2.0 * PI * 0.5 * time).sin();
    let step = if time >= 1.0 { 0.5 } else { 0.0 };
    wave + step
}
