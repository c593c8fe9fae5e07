//! jdig agent: the bootstrap that runs inside the host process.
//!
//! The host runtime hands a delivered payload to [`agent_main`]. The
//! bootstrap validates it, locates the host's application context, loads the
//! diagnostic service (reusing it when a previous attach already did) and
//! starts it. Nothing escapes [`agent_main`]: errors and adapter panics are
//! logged and reported as an [`InjectionResult`].
//!
//! The agent bundle's `agentmain` is the production [`HostRuntime`]
//! implementation. It wraps the JVM's reflection and instrumentation APIs and
//! calls [`agent_main`] with the payload it was given. That bundle is built
//! outside this workspace; the tests drive the bootstrap through an in-memory
//! host.

pub mod bootstrap;
pub mod classpath;
pub mod error;
pub mod runtime;

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

pub use bootstrap::{AgentBootstrap, AgentContract, LoadedService, ResolvedContext, Residency};
pub use classpath::{ExtendedClasspath, Extension, PROCESS_CLASSPATH};
pub use error::{BootstrapError, FailureKind, InvocationStage};
pub use runtime::{HostFault, HostRuntime, HostValue, InvocationFault, ParamType};

/// Outcome of one delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectionResult {
    Succeeded { service: Residency },
    Failed(FailureKind),
}

impl InjectionResult {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }
}

/// Entry point for a delivered payload, using the default contract and the
/// process-wide classpath ledger.
pub fn agent_main<R: HostRuntime>(runtime: &R, payload: &str) -> InjectionResult {
    run_guarded(runtime, &AgentContract::default(), &PROCESS_CLASSPATH, payload)
}

/// Run a bootstrap and contain every failure.
pub fn run_guarded<R: HostRuntime>(
    runtime: &R,
    contract: &AgentContract,
    classpath: &ExtendedClasspath,
    payload: &str,
) -> InjectionResult {
    tracing::info!(payload, "jdig agent accepted payload");
    let bootstrap = AgentBootstrap::new(runtime, contract, classpath);

    match panic::catch_unwind(AssertUnwindSafe(|| bootstrap.run(payload))) {
        Ok(Ok(service)) => {
            tracing::info!(residency = ?service, "jdig service started");
            InjectionResult::Succeeded { service }
        }
        Ok(Err(err)) => {
            tracing::error!(
                kind = ?err.kind(),
                error = %err.chain(),
                detail = ?err,
                "jdig agent bootstrap aborted"
            );
            InjectionResult::Failed(err.kind())
        }
        Err(panic) => {
            tracing::error!(
                panic = panic_message(panic.as_ref()),
                "jdig agent bootstrap panicked"
            );
            InjectionResult::Failed(FailureKind::Panic)
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        *msg
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "non-string panic payload"
    }
}
