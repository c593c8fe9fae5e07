//! Application service: gathering attach parameters and injecting the agent.
//!
//! The flow is: resolve the context locator and environment (from presets or
//! the operator), check the service port, deliver the payload, then call
//! `hello` until the service answers.

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use jdig_common::{AttachParameters, ContextLocator, encode};

use crate::application::ports::{
    AttachMechanism, NetworkProbe, ProgressReporter, Prompter, ServiceProbe,
};
use crate::domain::error::{Aborted, InputValidationError, ServiceError};
use crate::domain::input::{MAX_INPUT_ATTEMPTS, is_exit, parse_environment};
use crate::domain::process::HostProcessDescriptor;
use crate::domain::service::{AppMeta, ServiceReply};

/// The service always binds the loopback interface of the host.
pub const LOOPBACK: &str = "127.0.0.1";

/// Default readiness deadline after delivery.
pub const DEFAULT_WAIT: Duration = Duration::from_secs(5);

const POLL_INTERVAL: Duration = Duration::from_millis(100);

const CTX_PROMPT: &str =
    "Enter a static field holding the ApplicationContext (eg: com.hook.SpringContextUtil#context): ";
const ENV_PROMPT: &str =
    "Please enter the current environment (empty means none, cannot be local): ";

/// How the environment name reaches the bootstrap.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvChoice {
    pub env: Option<String>,
    pub env_key: Option<String>,
}

/// What is listening on the service port before an attach.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortState {
    Free,
    /// A jdig service from an earlier attach answered `hello`.
    Service(AppMeta),
    /// Something else holds the port.
    Occupied,
}

/// The context locator from the preset, or asked for up to
/// [`MAX_INPUT_ATTEMPTS`] times.
pub fn resolve_context(prompter: &mut impl Prompter, preset: Option<&str>) -> Result<String> {
    if let Some(preset) = preset {
        let locator =
            ContextLocator::parse(preset).map_err(|e| InputValidationError::InvalidPreset {
                value: preset.to_string(),
                reason: e.to_string(),
            })?;
        return Ok(locator.to_string());
    }

    for attempt in 1..=MAX_INPUT_ATTEMPTS {
        let line = read_or_abort(prompter, CTX_PROMPT)?;
        match ContextLocator::parse(&line) {
            Ok(locator) => return Ok(locator.to_string()),
            Err(e) if attempt < MAX_INPUT_ATTEMPTS => {
                prompter.notice(&format!("{e}. Please enter the correct ctx."));
            }
            Err(_) => {}
        }
    }
    Err(InputValidationError::ContextLocator {
        attempts: MAX_INPUT_ATTEMPTS,
    }
    .into())
}

/// Use the presets when either is given; otherwise ask for a literal
/// environment name up to [`MAX_INPUT_ATTEMPTS`] times.
pub fn resolve_environment(
    prompter: &mut impl Prompter,
    env: Option<String>,
    env_key: Option<String>,
) -> Result<EnvChoice> {
    if env.is_some() || env_key.is_some() {
        return Ok(EnvChoice { env, env_key });
    }

    for attempt in 1..=MAX_INPUT_ATTEMPTS {
        let line = read_or_abort(prompter, ENV_PROMPT)?;
        match parse_environment(&line) {
            Ok(env) => return Ok(EnvChoice { env, env_key: None }),
            Err(e) if attempt < MAX_INPUT_ATTEMPTS => prompter.notice(&e.to_string()),
            Err(_) => {}
        }
    }
    Err(InputValidationError::Environment {
        attempts: MAX_INPUT_ATTEMPTS,
    }
    .into())
}

fn read_or_abort(prompter: &mut impl Prompter, prompt: &str) -> Result<String> {
    match prompter.read_line(prompt)? {
        Some(line) if !is_exit(&line) => Ok(line.trim().to_string()),
        _ => Err(Aborted.into()),
    }
}

#[must_use]
pub fn build_parameters(starter: &Path, ctx: String, choice: EnvChoice, port: u16) -> AttachParameters {
    AttachParameters {
        starter: starter.display().to_string(),
        ctx,
        env: choice.env,
        env_key: choice.env_key,
        port,
    }
}

/// Classify the service port before attaching.
pub async fn port_state(
    probe: &impl NetworkProbe,
    service: &impl ServiceProbe,
    port: u16,
) -> Result<PortState> {
    if !probe.check_tcp_connectivity(LOOPBACK, port).await? {
        return Ok(PortState::Free);
    }
    Ok(answered_hello(port, service.hello().await).map_or(PortState::Occupied, PortState::Service))
}

/// The service's metadata when `reply` is a successful `hello`.
fn answered_hello(port: u16, reply: Result<ServiceReply>) -> Option<AppMeta> {
    match reply {
        Ok(reply) if reply.success => Some(serde_json::from_value(reply.data).unwrap_or_default()),
        Ok(reply) => {
            tracing::debug!(port, message = reply.failure_message(), "hello rejected");
            None
        }
        Err(e) => {
            tracing::debug!(port, error = %e, "port does not speak the service protocol");
            None
        }
    }
}

/// Encode the payload and hand it to the target JVM. Returns the payload.
pub async fn inject<A: AttachMechanism>(
    mechanism: &A,
    reporter: &impl ProgressReporter,
    target: &HostProcessDescriptor,
    bundle: &Path,
    params: &AttachParameters,
) -> Result<String> {
    let payload = encode(params)?;

    reporter.step(&format!("Attaching to JVM {} ({})", target.pid, target.display_name));
    let session = mechanism.attach(target).await?;

    reporter.step("Loading agent");
    mechanism.deliver(session, bundle, &payload).await?;
    tracing::info!(pid = target.pid, %payload, "agent delivered");
    reporter.success(&format!("Agent delivered to JVM {}", target.pid));
    Ok(payload)
}

/// Call `hello` until the service answers it. Something else listening on
/// the port does not count. A zero deadline skips the wait.
pub async fn wait_until_ready(
    service: &impl ServiceProbe,
    port: u16,
    deadline: Duration,
) -> Result<()> {
    if deadline.is_zero() {
        return Ok(());
    }
    let started = tokio::time::Instant::now();
    loop {
        let remaining = deadline.saturating_sub(started.elapsed());
        let reply = tokio::time::timeout(remaining, service.hello())
            .await
            .unwrap_or_else(|_| Err(anyhow::anyhow!("hello timed out")));
        if answered_hello(port, reply).is_some() {
            tracing::debug!(elapsed = ?started.elapsed(), port, "service answered hello");
            return Ok(());
        }
        if started.elapsed() >= deadline {
            return Err(ServiceError::NotReady {
                port,
                secs: deadline.as_secs(),
            }
            .into());
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}
