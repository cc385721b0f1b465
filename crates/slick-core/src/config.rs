//! Configuration types consumed by the analysis core.
//!
//! Config-file discovery and merging are external collaborators; this module
//! only defines the already-loaded shape the core consumes: per-name global
//! visibility settings and per-rule settings.

use crate::types::Severity;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Raw per-name global setting as it appears in configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GlobalValue {
    /// `true`, `false`, or `null`.
    Flag(Option<bool>),
    /// A named setting: `"writable"`, `"readonly"`, `"off"`, and their
    /// accepted aliases.
    Name(String),
}

/// Normalized global visibility setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlobalSetting {
    /// Global exists and may be reassigned.
    Writable,
    /// Global exists but must not be reassigned.
    Readonly,
    /// Treat the name as not a global at all.
    Off,
}

impl GlobalSetting {
    /// Whether a binding with this setting is writeable.
    #[must_use]
    pub fn is_writable(self) -> bool {
        matches!(self, Self::Writable)
    }
}

/// Configuration errors surfaced to the caller.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A global setting value outside the recognized vocabulary.
    #[error(
        "'{value}' is not a valid setting for global '{name}' \
         (use \"writable\", \"readonly\", or \"off\")"
    )]
    InvalidGlobal {
        /// The configured name.
        name: String,
        /// The offending value, rendered as text.
        value: String,
    },
}

/// Normalizes a raw configured value to a [`GlobalSetting`].
///
/// Accepts the legacy aliases (`true`/`"writeable"` for writable,
/// `false`/`null`/`"readable"` for readonly) alongside the canonical names.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidGlobal`] identifying the offending name and
/// value for anything outside the vocabulary.
pub fn normalize_global_setting(
    name: &str,
    value: &GlobalValue,
) -> Result<GlobalSetting, ConfigError> {
    match value {
        GlobalValue::Flag(Some(true)) => Ok(GlobalSetting::Writable),
        GlobalValue::Flag(Some(false) | None) => Ok(GlobalSetting::Readonly),
        GlobalValue::Name(s) => match s.as_str() {
            "writable" | "writeable" | "true" => Ok(GlobalSetting::Writable),
            "readonly" | "readable" | "false" => Ok(GlobalSetting::Readonly),
            "off" => Ok(GlobalSetting::Off),
            other => Err(ConfigError::InvalidGlobal {
                name: name.to_string(),
                value: other.to_string(),
            }),
        },
    }
}

/// Per-rule configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleSettings {
    /// Whether this rule is enabled.
    #[serde(default)]
    pub enabled: Option<bool>,

    /// Severity override for this rule.
    #[serde(default)]
    pub severity: Option<Severity>,

    /// Rule-specific options, passed to the rule on creation.
    #[serde(default)]
    pub options: Option<serde_json::Value>,
}

/// Configuration consumed by one lint pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinterConfig {
    /// Per-name global visibility settings.
    #[serde(default)]
    pub globals: HashMap<String, GlobalValue>,

    /// Per-rule settings keyed by rule name.
    #[serde(default)]
    pub rules: HashMap<String, RuleSettings>,
}

impl LinterConfig {
    /// Creates an empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks if a rule is enabled.
    #[must_use]
    pub fn is_rule_enabled(&self, rule_name: &str) -> bool {
        self.rules
            .get(rule_name)
            .map_or(true, |s| s.enabled.unwrap_or(true))
    }

    /// Gets the severity override for a rule.
    #[must_use]
    pub fn rule_severity(&self, rule_name: &str) -> Option<Severity> {
        self.rules.get(rule_name).and_then(|s| s.severity)
    }

    /// Gets the configured options for a rule.
    #[must_use]
    pub fn rule_options(&self, rule_name: &str) -> Option<&serde_json::Value> {
        self.rules.get(rule_name).and_then(|s| s.options.as_ref())
    }

    /// Normalizes all configured globals, failing on the first invalid value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidGlobal`] for the first unrecognized
    /// value. Names resolved to [`GlobalSetting::Off`] are kept; the scope
    /// binding service skips them during augmentation.
    pub fn normalized_globals(&self) -> Result<Vec<(String, GlobalSetting)>, ConfigError> {
        let mut entries: Vec<(String, GlobalSetting)> = Vec::with_capacity(self.globals.len());
        for (name, value) in &self.globals {
            entries.push((name.clone(), normalize_global_setting(name, value)?));
        }
        // Deterministic order regardless of map iteration
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(entries)
    }
}
