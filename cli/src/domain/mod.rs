//! Domain layer: pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod attach;
pub mod config;
pub mod error;
pub mod input;
pub mod process;
pub mod service;

pub use config::{JdigConfig, validate_config_key, validate_config_value};
pub use error::{
    Aborted, AttachError, BundleError, ConfigError, InputValidationError, SelectionError,
    ServiceError,
};
pub use process::HostProcessDescriptor;
pub use service::{AppMeta, ServiceReply};
