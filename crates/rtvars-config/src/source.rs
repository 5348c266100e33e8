//! Reading configuration documents from disk.

use std::fs;
use std::path::Path;

use rtvars_errors::{ErrorContext, ResultExt, RtVarsError};

/// Read `path` as UTF-8 text.
pub(crate) fn read(path: &Path) -> Result<String, RtVarsError> {
    fs::read_to_string(path)
        .context(ErrorContext::new("failed to read configuration").with("path", path.display()))
}
