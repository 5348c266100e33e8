//! Snapshot tests for filter error messages.

use rtvars_filters::prelude::*;

#[test]
fn snapshot_invalid_timestep() {
    let mut state = RateLimitState::unlimited();
    let err = rate_limit_filter(1.0, -0.5, &mut state).err().map(|e| e.to_string());
    insta::assert_debug_snapshot!(err, @r#"
    Some(
        "invalid timestep -0.5: must be positive and finite",
    )
    "#);
}

#[test]
fn snapshot_invalid_parameter() {
    let err = AlphaState::fixed(2.0).err().map(|e| e.to_string());
    insta::assert_debug_snapshot!(err, @r#"
    Some(
        "invalid filter parameter alpha = 2",
    )
    "#);
}
