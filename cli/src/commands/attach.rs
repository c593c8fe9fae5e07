//! `jdig attach`: pick a JVM, inject the agent, then open the console.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use clap::Args;
use jdig_common::DEFAULT_PORT;

use crate::app::AppContext;
use crate::application::ports::ProgressReporter;
use crate::application::services::attach_session::{
    self, DEFAULT_WAIT, LOOPBACK, PortState,
};
use crate::application::services::{config_service, locator};
use crate::domain::attach::DEFAULT_ATTACH_TIMEOUT;
use crate::domain::config::{DEFAULT_AGENT_BUNDLE, DEFAULT_STARTER_BUNDLE, JdigConfig};
use crate::domain::error::{BundleError, ServiceError};
use crate::infra::config::default_bundle_dir;
use crate::infra::hotspot::HotSpotAttach;
use crate::infra::hsperf::HsperfProcessSource;
use crate::infra::network::TokioNetworkProbe;
use crate::infra::prompt::LinePrompter;
use crate::infra::service_client::UreqServiceClient;
use crate::infra::signal::NixSignaller;
use crate::output::progress;
use crate::output::reporter::TerminalReporter;

/// Arguments for the attach command.
#[derive(Args)]
pub struct AttachArgs {
    /// Target JVM pid (asked for when absent or not a candidate)
    #[arg(long, env = "JDIG_PID")]
    pub pid: Option<String>,

    /// Static field holding the application context, as `class#field`
    #[arg(long, env = "JDIG_CTX")]
    pub ctx: Option<String>,

    /// Environment name handed to the service
    #[arg(long, env = "JDIG_ENV", conflicts_with = "env_key")]
    pub env: Option<String>,

    /// Property key the host resolves the environment name from
    #[arg(long, env = "JDIG_ENV_KEY")]
    pub env_key: Option<String>,

    /// Port the service listens on
    #[arg(long, env = "JDIG_PORT")]
    pub port: Option<u16>,

    /// Agent bundle loaded into the target
    #[arg(long, env = "JDIG_AGENT_JAR")]
    pub agent_jar: Option<PathBuf>,

    /// Starter bundle appended to the target's classpath
    #[arg(long, env = "JDIG_STARTER_JAR")]
    pub starter_jar: Option<PathBuf>,

    /// Seconds to wait for the service after delivery (0 skips the wait)
    #[arg(long, default_value_t = DEFAULT_WAIT.as_secs())]
    pub wait_secs: u64,

    /// Seconds allowed for the attach handshake
    #[arg(long, default_value_t = DEFAULT_ATTACH_TIMEOUT.as_secs())]
    pub attach_timeout: u64,

    /// Inject even when the port is already in use
    #[arg(long)]
    pub force: bool,

    /// Exit after the service is up instead of opening the console
    #[arg(long)]
    pub no_console: bool,
}

/// Run the attach command.
///
/// # Errors
///
/// Returns an error if selection, input, attach or the readiness wait fails.
pub async fn run(app: &AppContext, args: AttachArgs) -> Result<()> {
    let config = config_service::load_config(&app.config_store)?;
    let port = args.port.or(config.attach.port).unwrap_or(DEFAULT_PORT);
    let agent = resolve_bundle(args.agent_jar.as_deref(), &config, Bundle::Agent)?;
    let starter = resolve_bundle(args.starter_jar.as_deref(), &config, Bundle::Starter)?;

    let source = HsperfProcessSource::default();
    let candidates = locator::list(&source, std::process::id())?;
    let mut prompter = LinePrompter::stdio();
    let target = locator::select(&candidates, args.pid.as_deref(), &mut prompter)?;

    let probe = TokioNetworkProbe::default();
    let client = UreqServiceClient::new(LOOPBACK, port);
    let reporter = TerminalReporter::new(&app.output);

    match attach_session::port_state(&probe, &client, port).await? {
        PortState::Free => {}
        PortState::Service(meta) if !args.force => {
            app.output.info(&format!(
                "A service is already running on port {port}; skipping injection"
            ));
            app.renderer().render_app_meta(port, &meta)?;
            drop(prompter);
            return open_console_unless(app, &client, args.no_console);
        }
        PortState::Service(_) => {
            reporter.warn(&format!(
                "Re-injecting although a service answers on port {port}"
            ));
        }
        PortState::Occupied => {
            let proceed = args.force
                || app.confirm(
                    &format!("Port {port} is in use by another program. Inject anyway?"),
                    false,
                )?;
            if !proceed {
                return Err(ServiceError::PortOccupied { port }.into());
            }
            reporter.warn(&format!("Port {port} is in use; the service may fail to bind"));
        }
    }

    let ctx_preset = args.ctx.or(config.attach.ctx);
    let ctx = attach_session::resolve_context(&mut prompter, ctx_preset.as_deref())?;
    let env_key = args.env_key.or(config.attach.env_key);
    let choice = attach_session::resolve_environment(&mut prompter, args.env, env_key)?;
    drop(prompter);

    let params = attach_session::build_parameters(&starter, ctx, choice, port);
    let mechanism = HotSpotAttach::new(NixSignaller)
        .with_timeout(Duration::from_secs(args.attach_timeout));
    let payload = attach_session::inject(&mechanism, &reporter, &target, &agent, &params).await?;
    app.renderer().render_injection(target.pid, &params, &payload)?;

    wait_for_service(app, &client, port, Duration::from_secs(args.wait_secs)).await?;
    if args.wait_secs == 0 {
        // Nothing says the service is up yet.
        return Ok(());
    }
    open_console_unless(app, &client, args.no_console)
}

async fn wait_for_service(
    app: &AppContext,
    client: &UreqServiceClient,
    port: u16,
    deadline: Duration,
) -> Result<()> {
    if deadline.is_zero() {
        return Ok(());
    }
    let spinner = app
        .output
        .show_progress()
        .then(|| progress::spinner(&format!("Waiting for the service on port {port}")));
    let outcome = attach_session::wait_until_ready(client, port, deadline).await;
    if let Some(pb) = spinner {
        match &outcome {
            Ok(()) => progress::finish_ok(&pb, &format!("Service is up on port {port}")),
            Err(_) => progress::abandon(&pb),
        }
    }
    outcome
}

/// The console is line-oriented text, so `--json` never opens it.
fn open_console_unless(app: &AppContext, client: &UreqServiceClient, skip: bool) -> Result<()> {
    if skip || app.is_json() {
        return Ok(());
    }
    super::console::open(app, client)
}

// ── Bundles ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
enum Bundle {
    Agent,
    Starter,
}

impl Bundle {
    fn role(self) -> &'static str {
        match self {
            Self::Agent => "agent",
            Self::Starter => "starter",
        }
    }

    fn flag(self) -> &'static str {
        match self {
            Self::Agent => "agent-jar",
            Self::Starter => "starter-jar",
        }
    }

    fn default_name(self) -> &'static str {
        match self {
            Self::Agent => DEFAULT_AGENT_BUNDLE,
            Self::Starter => DEFAULT_STARTER_BUNDLE,
        }
    }

    fn configured(self, config: &JdigConfig) -> Option<&str> {
        match self {
            Self::Agent => config.bundle.agent.as_deref(),
            Self::Starter => config.bundle.starter.as_deref(),
        }
    }
}

/// Flag/env var, then config file, then `~/.jdig/lib/<default name>`.
/// The target resolves the path itself, so it is made absolute here.
fn resolve_bundle(flag: Option<&Path>, config: &JdigConfig, bundle: Bundle) -> Result<PathBuf> {
    let path = match (flag, bundle.configured(config)) {
        (Some(path), _) => path.to_path_buf(),
        (None, Some(path)) => PathBuf::from(path),
        (None, None) => default_bundle_dir()?.join(bundle.default_name()),
    };
    if !path.is_file() {
        return Err(BundleError::Missing {
            role: bundle.role(),
            flag: bundle.flag(),
            path: path.display().to_string(),
        }
        .into());
    }
    Ok(std::path::absolute(&path)?)
}
