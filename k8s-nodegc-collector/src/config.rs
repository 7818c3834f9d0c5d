use std::time::Duration;

use serde::Serialize;

pub(crate) const NODES_GC_INTERVAL: &str = "NODES_GC_INTERVAL";
pub(crate) const ENABLE_CILIUM_NODE_CRD: &str = "ENABLE_CILIUM_NODE_CRD";

#[derive(Debug, thiserror::Error)]
#[error("invalid {name} {value:?}: {reason}")]
pub struct ConfigError {
    name: &'static str,
    value: String,
    reason: String,
}

impl ConfigError {
    pub fn invalid(name: &'static str, value: impl ToString, reason: impl ToString) -> Self {
        Self {
            name,
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// How the collector runs, decided once when it starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum GcMode {
    /// Confirmed orphans are collected every interval.
    Periodic,
    /// CRD support is disabled, every record is purged once.
    OneOff,
    /// Interval is zero, nothing ever runs.
    Disabled,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GcConfig {
    /// GC interval for CiliumNodes. Zero turns periodic collection off.
    pub nodes_gc_interval: Duration,
    /// Whether CiliumNode CRD support is enabled.
    pub enable_cilium_node_crd: bool,
}

impl Default for GcConfig {
    fn default() -> Self {
        Self {
            nodes_gc_interval: Self::DEFAULT_NODES_GC_INTERVAL,
            enable_cilium_node_crd: true,
        }
    }
}

impl GcConfig {
    pub const DEFAULT_NODES_GC_INTERVAL: Duration = Duration::from_secs(5 * 60);

    /// Reads `NODES_GC_INTERVAL` and `ENABLE_CILIUM_NODE_CRD` from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from `lookup`, falling back to defaults for unset keys.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(text) = lookup(NODES_GC_INTERVAL) {
            config.nodes_gc_interval = parse_duration(NODES_GC_INTERVAL, &text)?;
        }
        if let Some(text) = lookup(ENABLE_CILIUM_NODE_CRD) {
            config.enable_cilium_node_crd = parse_bool(ENABLE_CILIUM_NODE_CRD, &text)?;
        }
        Ok(config)
    }

    pub fn interval(self, nodes_gc_interval: Duration) -> Self {
        Self {
            nodes_gc_interval,
            ..self
        }
    }

    pub fn crd(self, enable_cilium_node_crd: bool) -> Self {
        Self {
            enable_cilium_node_crd,
            ..self
        }
    }

    pub fn mode(&self) -> GcMode {
        if !self.enable_cilium_node_crd {
            GcMode::OneOff
        } else if self.nodes_gc_interval.is_zero() {
            GcMode::Disabled
        } else {
            GcMode::Periodic
        }
    }
}

/// Parses a Go style duration such as `5m`, `1h30m` or `0`.
pub(crate) fn parse_duration(name: &'static str, text: &str) -> Result<Duration, ConfigError> {
    let text = text.trim();
    if text == "0" {
        return Ok(Duration::ZERO);
    }
    let nanos = go_parse_duration::parse_duration(text)
        .map_err(|err| ConfigError::invalid(name, text, format!("{err:?}")))?;
    u64::try_from(nanos)
        .map(Duration::from_nanos)
        .map_err(|_| ConfigError::invalid(name, text, "negative duration"))
}

/// Parses booleans the way Go's `strconv.ParseBool` does.
pub(crate) fn parse_bool(name: &'static str, text: &str) -> Result<bool, ConfigError> {
    match text.trim() {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
        other => Err(ConfigError::invalid(name, other, "expected a boolean")),
    }
}
