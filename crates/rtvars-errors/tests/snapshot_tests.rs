//! Snapshot tests for error message formatting.
//!
//! These pin the exact wording of every error so log scrapers and CLI output
//! stay stable across changes.

use rtvars_errors::{BufferError, FilterError, RegistryError, RtVarsError, VariableError};

mod variable_error_snapshots {
    use super::*;
    use insta::assert_snapshot;

    #[test]
    fn test_out_of_bounds() {
        assert_snapshot!(
            VariableError::OutOfBounds { value: 4.0, min: -1.5, max: 1.5 }.to_string(),
            @"value 4 is outside bounds [-1.5, 1.5]"
        );
    }

    #[test]
    fn test_kind_mismatch() {
        assert_snapshot!(
            VariableError::KindMismatch { expected: "double", actual: "boolean" }.to_string(),
            @"kind mismatch: variable is double, value is boolean"
        );
    }

    #[test]
    fn test_reentrancy() {
        assert_snapshot!(
            VariableError::Reentrancy.to_string(),
            @"listener table modified during notification"
        );
    }

    #[test]
    fn test_invalid_enum_ordinal() {
        assert_snapshot!(
            VariableError::InvalidEnumOrdinal { ordinal: -1, constants: 3, allow_null: false }.to_string(),
            @"invalid enum ordinal -1 (constants: 3, null allowed: false)"
        );
    }
}

mod buffer_error_snapshots {
    use super::*;
    use insta::assert_snapshot;

    #[test]
    fn test_already_configured() {
        assert_snapshot!(
            BufferError::AlreadyConfigured.to_string(),
            @"history buffer is already configured"
        );
    }

    #[test]
    fn test_range() {
        assert_snapshot!(
            BufferError::Range { from: 2, count: 8, first: 10, end: 14 }.to_string(),
            @"window [2, +8) does not overlap valid range [10, 14)"
        );
    }

    #[test]
    fn test_duplicate_column() {
        assert_snapshot!(
            BufferError::DuplicateColumn { first: 0, second: 3 }.to_string(),
            @"variable bound twice (columns 0 and 3)"
        );
    }
}

mod registry_error_snapshots {
    use super::*;
    use insta::assert_snapshot;

    #[test]
    fn test_not_found() {
        assert_snapshot!(
            RegistryError::not_found("root.joint9.position").to_string(),
            @"nothing found at 'root.joint9.position'"
        );
    }

    #[test]
    fn test_illegal_name() {
        assert_snapshot!(
            RegistryError::illegal_name("a.b", "contains the namespace separator").to_string(),
            @"illegal name 'a.b': contains the namespace separator"
        );
    }
}

mod top_level_snapshots {
    use super::*;
    use insta::assert_snapshot;

    #[test]
    fn test_wrapped_filter_error() {
        let err: RtVarsError = FilterError::InvalidTimestep { dt: -0.5 }.into();
        assert_snapshot!(
            err.to_string(),
            @"Filter error: invalid timestep -0.5: must be positive and finite"
        );
    }

    #[test]
    fn test_wrapped_registry_error() {
        let err: RtVarsError = RegistryError::duplicate("root", "joint1").into();
        assert_snapshot!(
            err.to_string(),
            @"Registry error: 'joint1' already exists in namespace 'root'"
        );
    }
}
