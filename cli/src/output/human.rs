//! Human-readable terminal renderer.

use std::path::Path;

use jdig_common::AttachParameters;
use owo_colors::OwoColorize as _;

use crate::domain::config::{JdigConfig, VALID_CONFIG_KEYS};
use crate::domain::process::HostProcessDescriptor;
use crate::domain::service::AppMeta;
use crate::infra::config::CONFIG_ENV;
use crate::output::OutputContext;

/// Renders domain types as human-readable terminal output using `OutputContext`.
pub struct HumanRenderer<'a> {
    ctx: &'a OutputContext,
}

impl<'a> HumanRenderer<'a> {
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx }
    }

    /// Render the CLI version information.
    pub fn render_version(&self, version: &str) {
        if self.ctx.quiet {
            return;
        }
        println!("jdig {version}");
    }

    /// One line per candidate JVM, `jps` style.
    pub fn render_process_list(&self, processes: &[HostProcessDescriptor]) {
        if processes.is_empty() {
            if !self.ctx.quiet {
                println!("No JVM processes found.");
            }
            return;
        }
        for p in processes {
            let name = if p.display_name.is_empty() {
                "<unknown>"
            } else {
                p.display_name.as_str()
            };
            println!("{:>7} {name}", p.pid.style(self.ctx.styles.pid));
        }
    }

    /// Render the current jdig configuration.
    pub fn render_config(&self, config: &JdigConfig, path: &Path) {
        println!();
        println!(
            "  {}",
            format!("Configuration ({})", path.display()).style(self.ctx.styles.header)
        );
        println!();
        for key in VALID_CONFIG_KEYS {
            let value = config.get(key).unwrap_or_else(|| "(not set)".to_string());
            println!("  {:<20} {value}", format!("{key}:"));
        }
        println!();
        println!("  {}", "Environment:".style(self.ctx.styles.bold));
        for var in [CONFIG_ENV, "NO_COLOR"] {
            println!(
                "    {:<18} {}",
                format!("{var}:"),
                std::env::var(var).unwrap_or_else(|_| "(not set)".to_string())
            );
        }
        println!();
    }

    /// What `hello` reported.
    pub fn render_app_meta(&self, port: u16, meta: &AppMeta) {
        self.ctx
            .success(&format!("Connected to the service on port {port}"));
        self.ctx.kv("App:", meta.app.as_deref().unwrap_or("unknown"));
        self.ctx.kv("Env:", meta.env.as_deref().unwrap_or("none"));
        self.ctx.kv("IP:", meta.ip.as_deref().unwrap_or("?"));
        self.ctx
            .kv("Trace:", if meta.enable_trace { "on" } else { "off" });
    }

    /// What was handed to the target JVM.
    pub fn render_injection(&self, params: &AttachParameters) {
        self.ctx.kv("Context:", &params.ctx);
        let env = match (params.env.as_deref(), params.env_key.as_deref()) {
            (Some(env), _) => env.to_string(),
            (None, Some(key)) => format!("from property {key}"),
            (None, None) => "none".to_string(),
        };
        self.ctx.kv("Env:", &env);
        self.ctx.kv("Port:", &params.port.to_string());
    }
}
