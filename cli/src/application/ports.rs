//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain`, never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::path::{Path, PathBuf};

use anyhow::Result;
use serde_json::Value;

use crate::domain::config::JdigConfig;
use crate::domain::error::AttachError;
use crate::domain::process::HostProcessDescriptor;
use crate::domain::service::ServiceReply;

// ── Process Discovery Port ────────────────────────────────────────────────────

/// Enumerates live JVMs. Sync trait; a scan reads a handful of small files.
pub trait ProcessSource {
    /// Every JVM currently visible, in no particular order.
    fn list(&self) -> Result<Vec<HostProcessDescriptor>>;
}

// ── Attach Port ───────────────────────────────────────────────────────────────

/// The host runtime's cross-process attach facility.
#[allow(async_fn_in_trait)]
pub trait AttachMechanism {
    /// An open attach channel to one JVM.
    type Session;

    /// Open the attach channel, triggering the JVM's listener if needed.
    async fn attach(&self, target: &HostProcessDescriptor) -> Result<Self::Session, AttachError>;

    /// Ask the JVM to load `bundle` as an agent with `payload` as its
    /// argument. Returns once the JVM has accepted the request; the agent's
    /// own bootstrap is not awaited.
    async fn deliver(
        &self,
        session: Self::Session,
        bundle: &Path,
        payload: &str,
    ) -> Result<(), AttachError>;
}

// ── Operator Port ─────────────────────────────────────────────────────────────

/// Line-oriented conversation with the operator.
pub trait Prompter {
    /// Show `prompt` and read one line. `Ok(None)` means end of input.
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>>;
    /// Show an informational line.
    fn notice(&mut self, message: &str);
}

// ── Network Probe Port ────────────────────────────────────────────────────────

/// Abstracts network connectivity checks so application services can be tested
/// without real network access.
#[allow(async_fn_in_trait)]
pub trait NetworkProbe {
    /// Check TCP connectivity to the given host and port.
    async fn check_tcp_connectivity(&self, host: &str, port: u16) -> Result<bool>;
}

// ── Service Client Port ───────────────────────────────────────────────────────

/// Request/reply channel to the injected diagnostic service.
pub trait ServiceClient {
    /// Send one request object and wait for its reply envelope.
    fn call(&self, request: &Value) -> Result<ServiceReply>;
}

/// `hello` against the service port without blocking the runtime.
#[allow(async_fn_in_trait)]
pub trait ServiceProbe {
    /// The reply envelope, or an error when nothing on the port speaks the
    /// service protocol.
    async fn hello(&self) -> Result<ServiceReply>;
}

// ── Signal Port ───────────────────────────────────────────────────────────────

/// Sends `SIGQUIT`, which makes a HotSpot JVM start its attach listener.
pub trait Signaller {
    /// Signal `pid`. A process that no longer exists is reported as
    /// `ErrorKind::NotFound`.
    fn quit(&self, pid: u32) -> std::io::Result<()>;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait; no async needed.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}

// ── Config Port ───────────────────────────────────────────────────────────────

/// Persistence of the user configuration file.
pub trait ConfigStore {
    /// Load the configuration, returning defaults when no file exists.
    fn load(&self) -> Result<JdigConfig>;
    /// Persist the configuration.
    fn save(&self, config: &JdigConfig) -> Result<()>;
    /// Location of the configuration file.
    fn path(&self) -> Result<PathBuf>;
}
