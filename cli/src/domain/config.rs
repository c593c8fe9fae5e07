//! Domain types and validators for jdig configuration.
//!
//! Pure functions only: no I/O, no async, no filesystem access.

use std::path::Path;

use anyhow::Result;
use jdig_common::ContextLocator;
use serde::{Deserialize, Serialize};

use crate::domain::error::ConfigError;

// ── Constants ────────────────────────────────────────────────────────────────

pub const VALID_CONFIG_KEYS: &[&str] = &[
    "attach.port",
    "attach.ctx",
    "attach.env_key",
    "bundle.agent",
    "bundle.starter",
];

/// File name of the agent bundle under the default bundle directory.
pub const DEFAULT_AGENT_BUNDLE: &str = "jdig-agent.jar";

/// File name of the service starter under the default bundle directory.
pub const DEFAULT_STARTER_BUNDLE: &str = "jdig-starter.jar";

// ── Config schema ────────────────────────────────────────────────────────────

/// Top-level configuration stored in `~/.jdig/config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JdigConfig {
    /// Attach presets.
    pub attach: AttachConfig,
    /// Artifact locations.
    pub bundle: BundleConfig,
}

/// Attach presets. Unset values fall back to flags or prompts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttachConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ctx: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env_key: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BundleConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starter: Option<String>,
}

impl JdigConfig {
    /// Set a whitelisted key after validating its value.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value is invalid.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        validate_config_key(key)?;
        validate_config_value(key, value)?;
        let value = value.trim().to_string();
        match key {
            "attach.port" => self.attach.port = value.parse().ok(),
            "attach.ctx" => self.attach.ctx = Some(value),
            "attach.env_key" => self.attach.env_key = Some(value),
            "bundle.agent" => self.bundle.agent = Some(value),
            "bundle.starter" => self.bundle.starter = Some(value),
            _ => anyhow::bail!("Unknown setting: {key}"),
        }
        Ok(())
    }

    /// Current value of a key, if set.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "attach.port" => self.attach.port.map(|p| p.to_string()),
            "attach.ctx" => self.attach.ctx.clone(),
            "attach.env_key" => self.attach.env_key.clone(),
            "bundle.agent" => self.bundle.agent.clone(),
            "bundle.starter" => self.bundle.starter.clone(),
            _ => None,
        }
    }
}

// ── Validators ───────────────────────────────────────────────────────────────

/// Validates a configuration key against the whitelist.
///
/// # Errors
///
/// Returns an error if the key is not in the allowed list.
pub fn validate_config_key(key: &str) -> Result<()> {
    if !VALID_CONFIG_KEYS.contains(&key) {
        return Err(ConfigError::UnknownKey {
            key: key.to_string(),
            valid: VALID_CONFIG_KEYS.join(", "),
        }
        .into());
    }
    Ok(())
}

/// Validates a configuration value for the given key.
///
/// # Errors
///
/// Returns an error if the value is not valid for the key.
pub fn validate_config_value(key: &str, value: &str) -> Result<()> {
    let value = value.trim();
    let hint = match key {
        "attach.port" => match value.parse::<u16>() {
            Ok(port) if port > 0 => None,
            _ => Some("Port must be a number between 1 and 65535".to_string()),
        },
        "attach.ctx" => ContextLocator::parse(value)
            .err()
            .map(|e| format!("{e} (eg: com.hook.SpringContextUtil#context)")),
        "attach.env_key" => {
            if value.is_empty() || value.contains('&') || value.contains(char::is_whitespace) {
                Some("Property key must be non-empty without '&' or whitespace".to_string())
            } else {
                None
            }
        }
        "bundle.agent" | "bundle.starter" => {
            if Path::new(value).is_absolute() && !value.contains('&') {
                None
            } else {
                Some("Bundle path must be absolute and cannot contain '&'".to_string())
            }
        }
        _ => None,
    };
    match hint {
        Some(hint) => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            hint,
        }
        .into()),
        None => Ok(()),
    }
}

// ── Unit tests ───────────────────────────────────────────────────────────────
