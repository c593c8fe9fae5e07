//! JSON output helpers.
//!
//! Every `--json` code path prints exactly one pretty-printed document on
//! stdout; failures use the error object from [`format_error`].

use std::path::Path;

use anyhow::{Context, Result};
use jdig_common::AttachParameters;
use serde_json::json;

use crate::domain::config::{JdigConfig, VALID_CONFIG_KEYS};
use crate::domain::error::{
    Aborted, AttachError, BundleError, ConfigError, InputValidationError, SelectionError,
    ServiceError,
};
use crate::domain::process::HostProcessDescriptor;
use crate::domain::service::AppMeta;

/// Format a JSON error object.
///
/// Output (pretty-printed):
/// ```json
/// {
///   "error": true,
///   "message": "...",
///   "code": "..."
/// }
/// ```
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_error(message: &str, code: &str) -> Result<String> {
    let obj = json!({
        "error": true,
        "message": message,
        "code": code,
    });
    serde_json::to_string_pretty(&obj).context("JSON serialization failed")
}

/// Stable `code` for the error object, from the typed error in the chain.
#[must_use]
pub fn error_code(error: &anyhow::Error) -> &'static str {
    if error.downcast_ref::<SelectionError>().is_some() {
        "SELECTION_FAILED"
    } else if error.downcast_ref::<InputValidationError>().is_some() {
        "INVALID_INPUT"
    } else if error.downcast_ref::<Aborted>().is_some() {
        "ABORTED"
    } else if error.downcast_ref::<AttachError>().is_some() {
        "ATTACH_FAILED"
    } else if error.downcast_ref::<ServiceError>().is_some() {
        "SERVICE_ERROR"
    } else if error.downcast_ref::<BundleError>().is_some() {
        "BUNDLE_MISSING"
    } else if error.downcast_ref::<ConfigError>().is_some() {
        "INVALID_CONFIG"
    } else {
        "ERROR"
    }
}

/// Stateless JSON renderer.
pub struct JsonRenderer;

impl JsonRenderer {
    fn print(value: &serde_json::Value) -> Result<()> {
        println!(
            "{}",
            serde_json::to_string_pretty(value).context("JSON serialization failed")?
        );
        Ok(())
    }

    /// `{"processes": [{"pid": .., "display_name": ..}]}`
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_process_list(processes: &[HostProcessDescriptor]) -> Result<()> {
        Self::print(&json!({ "processes": processes }))
    }

    /// Every whitelisted key, `null` when unset.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_config(config: &JdigConfig, path: &Path) -> Result<()> {
        let values: serde_json::Map<_, _> = VALID_CONFIG_KEYS
            .iter()
            .map(|key| ((*key).to_string(), json!(config.get(key))))
            .collect();
        Self::print(&json!({
            "path": path.display().to_string(),
            "values": values,
        }))
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_version(version: &str) -> Result<()> {
        Self::print(&json!({ "version": version }))
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_app_meta(port: u16, meta: &AppMeta) -> Result<()> {
        Self::print(&json!({ "port": port, "service": meta }))
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_injection(pid: u32, params: &AttachParameters, payload: &str) -> Result<()> {
        Self::print(&injection_document(pid, params, payload))
    }
}

/// `{"pid", "parameters": {starter, ctx, env?, env_key?, port}, "payload"}`
#[must_use]
pub fn injection_document(pid: u32, params: &AttachParameters, payload: &str) -> serde_json::Value {
    json!({
        "pid": pid,
        "parameters": params,
        "payload": payload,
    })
}
