//! `rtvars schema`

use anyhow::Result;

use crate::commands::{SchemaArgs, build_robot, load_config};
use crate::output;

pub fn execute(args: &SchemaArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let robot = build_robot(&config)?;
    output::print_schema(&robot.registry.schema(), args.json)?;
    Ok(())
}
