//! Construction-time configuration for rtvars.
//!
//! A [`SubstrateConfig`] fixes the history buffer capacity, the default
//! bounds policy for new variables and the set of variable kinds a registry
//! accepts. It is read once, before any real-time work starts, from YAML or
//! JSON:
//!
//! ```yaml
//! buffer:
//!   capacity: 1024
//! bounds_policy: clamp
//! variable_kinds: [double, integer, long, boolean, enum]
//! ```
//!
//! Every field is optional; missing fields take the values in
//! [`DEFAULT_CONFIG_YAML`].

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

mod source;

use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use rtvars_errors::RtVarsError;
use rtvars_registry::{BoundsPolicy, RegistryOptions, VariableKind};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// The built-in configuration, as YAML.
pub const DEFAULT_CONFIG_YAML: &str = include_str!("default_config.yaml");

/// Ring length used when a configuration does not set one.
pub const DEFAULT_BUFFER_CAPACITY: usize = 1024;

/// History buffer settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BufferConfig {
    /// Number of rows retained
    pub capacity: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_BUFFER_CAPACITY,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SubstrateConfig {
    /// History buffer settings
    pub buffer: BufferConfig,
    /// Policy for numeric variables registered without their own
    pub bounds_policy: BoundsPolicy,
    /// Kinds a registry built from this configuration accepts
    pub variable_kinds: BTreeSet<VariableKind>,
}

impl Default for SubstrateConfig {
    fn default() -> Self {
        Self {
            buffer: BufferConfig::default(),
            bounds_policy: BoundsPolicy::Clamp,
            variable_kinds: VariableKind::ALL.into_iter().collect(),
        }
    }
}

impl SubstrateConfig {
    /// Parse and validate a YAML document.
    pub fn from_yaml_str(source: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(source).context("invalid YAML configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a JSON document.
    pub fn from_json_str(source: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(source).context("invalid JSON configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file, choosing the format from its extension.
    ///
    /// `.json` is read as JSON, `.yaml` and `.yml` as YAML. Any other
    /// extension is an error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let format = ConfigFormat::from_path(path)?;
        let content = source::read(path)?;
        debug!(path = %path.display(), ?format, "loading configuration");

        let config = match format {
            ConfigFormat::Json => Self::from_json_str(&content),
            ConfigFormat::Yaml => Self::from_yaml_str(&content),
        };
        config.with_context(|| format!("in {}", path.display()))
    }

    /// Check the values serde cannot.
    ///
    /// A capacity that is not a power of two is allowed but logged.
    pub fn validate(&self) -> Result<()> {
        if self.buffer.capacity == 0 {
            return Err(RtVarsError::config("buffer capacity must be positive").into());
        }
        if self.variable_kinds.is_empty() {
            return Err(RtVarsError::config("variable_kinds must name at least one kind").into());
        }
        if !self.buffer.capacity.is_power_of_two() {
            warn!(
                capacity = self.buffer.capacity,
                "buffer capacity is not a power of two"
            );
        }
        Ok(())
    }

    /// Options for building a registry under this configuration.
    pub fn registry_options(&self) -> RegistryOptions {
        RegistryOptions {
            default_policy: self.bounds_policy,
            allowed_kinds: self.variable_kinds.clone(),
        }
    }

    /// Serialize as YAML.
    pub fn to_yaml_string(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Serialize as pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Parse the built-in configuration.
pub fn load_default_config() -> Result<SubstrateConfig> {
    SubstrateConfig::from_yaml_str(DEFAULT_CONFIG_YAML)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigFormat {
    Json,
    Yaml,
}

impl ConfigFormat {
    fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("json") => Ok(Self::Json),
            Some("yaml" | "yml") => Ok(Self::Yaml),
            _ => Err(anyhow!(RtVarsError::config(format!(
                "unsupported configuration file {}: expected .json, .yaml or .yml",
                path.display()
            )))),
        }
    }
}

/// True if `error` came from configuration content rather than I/O.
pub fn is_config_error(error: &anyhow::Error) -> bool {
    error.chain().any(|cause| {
        matches!(cause.downcast_ref::<RtVarsError>(), Some(RtVarsError::Config(_)))
            || cause.is::<serde_json::Error>()
            || cause.is::<serde_yaml::Error>()
    })
}
