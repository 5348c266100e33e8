//! Snapshot tests for the exported registry schema.

use insta::assert_snapshot;
use rtvars_registry::prelude::*;

type TestResult = Result<(), Box<dyn std::error::Error>>;

#[test]
fn test_schema_json() -> TestResult {
    let mut root = Registry::new("robot")?;
    root.create_child("arm")?
        .register(VariableSpec::double("q").with_bounds(-1.0, 1.0))?;
    root.register(
        VariableSpec::enumeration("mode", ["idle", "run"]).with_description("controller mode"),
    )?;

    assert_snapshot!(
        serde_json::to_string(&root.schema())?,
        @r#"{"root":"robot","variables":[{"path":"robot.arm.q","kind":"double","bounds":{"min":-1.0,"max":1.0},"policy":"clamp"},{"path":"robot.mode","kind":"enum","policy":"clamp","enum_constants":["idle","run"],"description":"controller mode"}]}"#
    );
    Ok(())
}

#[test]
fn test_namespace_display() -> TestResult {
    let mut root = Registry::new("robot")?;
    let leaf = root
        .create_child("arm")?
        .create_child("wrist")?
        .register_variable("torque", VariableKind::Double, None)?;

    assert_snapshot!(leaf.namespace().to_string(), @"robot.arm.wrist");
    assert_snapshot!(leaf.full_name(), @"robot.arm.wrist.torque");
    Ok(())
}
