//! `jdig console`: talk to a service that is already running.

use anyhow::{Context, Result};
use clap::Args;
use jdig_common::DEFAULT_PORT;

use crate::app::AppContext;
use crate::application::ports::ServiceClient;
use crate::application::services::attach_session::LOOPBACK;
use crate::application::services::config_service;
use crate::application::services::console::{CommandRegistry, run_console};
use crate::application::services::dig_commands::{fetch_app_meta, register_dig_commands};
use crate::infra::service_client::UreqServiceClient;

const PROMPT: &str = "jdig> ";

/// Arguments for the console command.
#[derive(Args)]
pub struct ConsoleArgs {
    /// Host the service listens on
    #[arg(long, default_value = LOOPBACK)]
    pub host: String,

    /// Service port (default: attach.port from config, then 30999)
    #[arg(long, env = "JDIG_PORT")]
    pub port: Option<u16>,
}

/// Run the console command.
///
/// # Errors
///
/// Returns an error if no service answers `hello` or the terminal fails.
pub fn run(app: &AppContext, args: &ConsoleArgs) -> Result<()> {
    let config = config_service::load_config(&app.config_store)?;
    let port = args.port.or(config.attach.port).unwrap_or(DEFAULT_PORT);
    let client = UreqServiceClient::new(&args.host, port);
    let meta = fetch_app_meta(&client)
        .with_context(|| format!("no jdig service on {}:{port}", args.host))?;
    app.renderer().render_app_meta(port, &meta)?;
    open(app, &client)
}

/// Run the read-eval loop on stdin until `exit`.
pub(crate) fn open(app: &AppContext, client: &impl ServiceClient) -> Result<()> {
    let mut registry = CommandRegistry::new();
    register_dig_commands(&mut registry, client);
    if !app.output.quiet {
        println!("Type 'help' for commands, 'exit' to leave.");
    }

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let summary = run_console(&registry, stdin.lock(), stdout.lock(), PROMPT)?;
    tracing::debug!(?summary, "console closed");
    Ok(())
}
