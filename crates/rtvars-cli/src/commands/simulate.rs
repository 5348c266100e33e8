//! `rtvars simulate`

use anyhow::Result;
use rtvars_buffer::{ColumnInfo, CounterSnapshot, HistoryBuffer};
use rtvars_config::SubstrateConfig;
use rtvars_filters::{AlphaFilter, BacklashCompensator, FilterChain, RateLimiter};
use serde::Serialize;
use tracing::info;

use crate::commands::{SimulateArgs, build_robot, load_config};
use crate::demo::trajectory;
use crate::error::CliError;
use crate::output;

/// Result of a simulation run.
#[derive(Debug, Serialize)]
pub struct SimulationReport {
    pub ticks: u64,
    pub dt: f64,
    pub capacity: usize,
    pub columns: Vec<ColumnInfo>,
    pub rows: Vec<SimulationRow>,
    pub counters: CounterSnapshot,
}

/// One recorded tick.
#[derive(Debug, Serialize)]
pub struct SimulationRow {
    pub tick: u64,
    pub values: Vec<serde_json::Value>,
}

pub fn execute(args: &SimulateArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let report = run(args, &config)?;
    output::print_simulation(&report)?;
    Ok(())
}

/// Drive the demo robot for `args.ticks` ticks and collect the newest rows.
pub fn run(args: &SimulateArgs, config: &SubstrateConfig) -> Result<SimulationReport, CliError> {
    let robot = build_robot(config)?;

    let mut chain = FilterChain::new()
        .with(AlphaFilter::new(
            &robot.command,
            &robot.smoothed,
            args.break_frequency,
        )?)
        .with(RateLimiter::new(
            &robot.smoothed,
            &robot.limited,
            args.max_rate,
        )?)
        .with(BacklashCompensator::new(
            &robot.limited,
            &robot.output,
            args.dead_band,
        )?);

    let mut buffer = HistoryBuffer::new();
    buffer.configure(
        robot.registry.all_variables().cloned().collect(),
        config.buffer.capacity,
    )?;

    robot.enabled.set_boolean(true)?;
    robot.mode.set_enum(Some(1))?;

    info!(ticks = args.ticks, dt = args.dt, "starting simulation");
    let mut time = 0.0;
    for cycle in 0..args.ticks {
        robot.command.set_double(trajectory(time))?;
        chain.update(args.dt)?;
        robot.cycle.set_long(i64::try_from(cycle).unwrap_or(i64::MAX))?;
        buffer.tick()?;
        time += args.dt;
    }

    let window = buffer.read_latest(args.window)?;
    let rows = window
        .rows()
        .map(|(tick, values)| SimulationRow {
            tick,
            values: values.into_iter().map(output::value_json).collect(),
        })
        .collect();

    Ok(SimulationReport {
        ticks: args.ticks,
        dt: args.dt,
        capacity: buffer.capacity(),
        columns: window.columns().to_vec(),
        rows,
        counters: buffer.counters().snapshot(),
    })
}
