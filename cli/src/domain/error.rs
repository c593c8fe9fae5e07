//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use thiserror::Error;

// ── Selection errors ──────────────────────────────────────────────────────────

/// Errors raised while choosing the target JVM.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("No JVM process found. Is the target running as the same user?")]
    NoCandidates,

    #[error("{attempts} consecutive selection failures. Bye~")]
    TooManyAttempts { attempts: u32 },
}

// ── Input errors ──────────────────────────────────────────────────────────────

/// Errors raised while reading attach parameters from the operator.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputValidationError {
    #[error("Context locator was not entered correctly after {attempts} attempts. Bye~")]
    ContextLocator { attempts: u32 },

    #[error("Environment was not entered correctly after {attempts} attempts. Bye~")]
    Environment { attempts: u32 },

    #[error("Invalid context locator '{value}': {reason}")]
    InvalidPreset { value: String, reason: String },

    #[error("'local' cannot be used as the environment name")]
    ReservedEnvironment,

    #[error("Environment name cannot contain '&'")]
    EnvironmentDelimiter,
}

/// The operator typed `exit` or closed the input.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Bye~")]
pub struct Aborted;

// ── Attach errors ─────────────────────────────────────────────────────────────

/// Failures of the cross-process attach channel.
#[derive(Debug, Error)]
pub enum AttachError {
    #[error("Process {pid} no longer exists")]
    ProcessGone { pid: u32 },

    #[error("JVM {pid} did not open its attach socket within {secs}s")]
    Timeout { pid: u32, secs: u64 },

    #[error("JVM {pid} refused to load the agent (code {code}){}", detail_suffix(.detail))]
    Refused { pid: u32, code: i32, detail: String },

    #[error("Malformed attach reply from JVM {pid}: {reply:?}")]
    Protocol { pid: u32, reply: String },

    #[error("Attach I/O with JVM {pid} failed")]
    Io {
        pid: u32,
        #[source]
        source: std::io::Error,
    },
}

fn detail_suffix(detail: &str) -> String {
    if detail.is_empty() {
        String::new()
    } else {
        format!(": {detail}")
    }
}

// ── Service errors ────────────────────────────────────────────────────────────

/// Errors talking to the injected diagnostic service.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ServiceError {
    #[error(
        "Port {port} is occupied by another program. Pick another one with --port or JDIG_PORT."
    )]
    PortOccupied { port: u16 },

    #[error(
        "Service did not come up on port {port} within {secs}s. The bootstrap logs to the target JVM's output."
    )]
    NotReady { port: u16, secs: u64 },

    #[error("Service rejected the request: {0}")]
    Rejected(String),
}

// ── Bundle errors ─────────────────────────────────────────────────────────────

/// Errors locating the artifacts that are shipped into the target.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BundleError {
    #[error("{role} bundle not found at {path}. Set it with --{flag} or 'jdig config set bundle.{role} <path>'.")]
    Missing {
        role: &'static str,
        flag: &'static str,
        path: String,
    },
}

// ── Config errors ─────────────────────────────────────────────────────────────

/// Errors related to configuration key/value validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unknown setting: {key}\n\nValid settings: {valid}")]
    UnknownKey { key: String, valid: String },

    #[error("Invalid value for {key}: {value}\n\n{hint}")]
    InvalidValue {
        key: String,
        value: String,
        hint: String,
    },
}
