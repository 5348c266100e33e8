//! Output formatting for CLI responses

use anyhow::{Error, Result};
use colored::*;
use rtvars_registry::{RegistrySchema, VariableValue};
use serde_json::{Value, json};

use crate::commands::simulate::SimulationReport;

/// Print error in human-readable format
pub fn print_error_human(error: &Error) {
    eprintln!("{} {}", "Error:".red().bold(), error);

    for cause in error.chain().skip(1) {
        eprintln!("  {} {}", "Caused by:".yellow(), cause);
    }
}

/// Print a registry schema in the requested format
pub fn print_schema(schema: &RegistrySchema, json: bool) -> Result<()> {
    if json {
        let output = json!({
            "success": true,
            "schema": schema,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!(
        "{} ({} variables)",
        schema.root.bold(),
        schema.variables.len()
    );
    let width = schema
        .variables
        .iter()
        .map(|v| v.path.len())
        .max()
        .unwrap_or(0);
    for variable in &schema.variables {
        let mut detail = String::new();
        if let Some(bounds) = variable.bounds {
            detail.push_str(&format!(
                " [{:.4}, {:.4}] {}",
                bounds.min, bounds.max, variable.policy
            ));
        }
        if !variable.enum_constants.is_empty() {
            detail.push_str(&format!(" {{{}}}", variable.enum_constants.join(", ")));
        }
        println!(
            "  {}  {:8}{}",
            format!("{:width$}", variable.path).cyan(),
            variable.kind.name(),
            detail.dimmed(),
        );
        if !variable.description.is_empty() {
            println!("  {:width$}  {}", "", variable.description.dimmed());
        }
    }
    Ok(())
}

/// Print simulation results as JSON
pub fn print_simulation(report: &SimulationReport) -> Result<()> {
    let output = json!({
        "success": true,
        "simulation": report,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// A variable value as plain JSON. Non-finite doubles become `null`.
pub fn value_json(value: VariableValue) -> Value {
    match value {
        VariableValue::Double(v) => serde_json::Number::from_f64(v).map_or(Value::Null, Value::Number),
        VariableValue::Integer(v) => json!(v),
        VariableValue::Long(v) => json!(v),
        VariableValue::Boolean(v) => json!(v),
        VariableValue::Enum(ordinal) => json!(ordinal),
    }
}
