//! Diagnostics configuration.
//!
//! Replaces process-wide verbosity flags with a value that is handed to the
//! components that log. A config can be built in code, parsed from JSON, or
//! read from the `TERMDAG_DIAG` environment variable (also JSON):
//!
//! ```text
//! TERMDAG_DIAG='{"verbosity": 2, "enabled_tags": ["congruence"]}'
//! ```
//!
//! Tags name the crate modules whose output should be raised to `trace`:
//! `term`, `congruence` and `generalize`.

use serde::Deserialize;
use std::collections::BTreeSet;
use std::fmt;

/// Environment variable read by [`DiagnosticsConfig::from_env`].
pub const DIAG_ENV_VAR: &str = "TERMDAG_DIAG";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    /// 0 = warnings only, 1 = info, 2 = debug, 3 and up = trace.
    pub verbosity: u8,
    pub enabled_tags: BTreeSet<String>,
}

impl DiagnosticsConfig {
    pub fn new(verbosity: u8) -> Self {
        Self {
            verbosity,
            enabled_tags: BTreeSet::new(),
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.enabled_tags.insert(tag.into());
        self
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(ConfigError::Json)
    }

    /// Read the config from `TERMDAG_DIAG`. Returns `Ok(None)` when unset.
    pub fn from_env() -> Result<Option<Self>, ConfigError> {
        match std::env::var(DIAG_ENV_VAR) {
            Ok(text) => Self::from_json(&text).map(Some),
            Err(std::env::VarError::NotPresent) => Ok(None),
            Err(std::env::VarError::NotUnicode(_)) => Err(ConfigError::NotUnicode),
        }
    }

    pub fn is_enabled(&self, tag: &str) -> bool {
        self.enabled_tags.contains(tag)
    }

    /// True when `tag` is enabled and verbosity is at least `level`.
    pub fn wants(&self, tag: &str, level: u8) -> bool {
        self.verbosity >= level && self.is_enabled(tag)
    }

    fn base_level(&self) -> &'static str {
        match self.verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }

    /// `EnvFilter` directives: the base level, then one `trace` override
    /// per enabled tag.
    pub fn filter_directives(&self) -> String {
        let mut out = String::from(self.base_level());
        for tag in &self.enabled_tags {
            out.push_str(",termdag::");
            out.push_str(tag);
            out.push_str("=trace");
        }
        out
    }
}

#[derive(Debug)]
pub enum ConfigError {
    /// The config text is not valid JSON for a `DiagnosticsConfig`.
    Json(serde_json::Error),
    /// The environment variable holds non-UTF-8 data.
    NotUnicode,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Json(e) => write!(f, "invalid diagnostics config: {}", e),
            ConfigError::NotUnicode => write!(f, "{} is not valid unicode", DIAG_ENV_VAR),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Json(e) => Some(e),
            ConfigError::NotUnicode => None,
        }
    }
}
