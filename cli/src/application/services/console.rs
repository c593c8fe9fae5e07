//! Application service: the interactive console loop.
//!
//! Commands are looked up by prefix in a [`CommandRegistry`] the caller
//! builds; the loop itself only knows `help` and `exit`.

use std::io::{BufRead, Write};

use anyhow::Result;

use crate::domain::input::is_exit;

/// A console command body. Receives the text after the command name.
pub type Handler<'a> = Box<dyn Fn(&str) -> Result<String> + 'a>;

struct Entry<'a> {
    name: &'static str,
    usage: &'static str,
    handler: Handler<'a>,
}

/// Explicitly constructed set of console commands.
#[derive(Default)]
pub struct CommandRegistry<'a> {
    entries: Vec<Entry<'a>>,
}

impl<'a> CommandRegistry<'a> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a command. A later registration with the same name replaces the
    /// earlier one.
    pub fn register(
        &mut self,
        name: &'static str,
        usage: &'static str,
        handler: impl Fn(&str) -> Result<String> + 'a,
    ) -> &mut Self {
        self.entries.retain(|e| e.name != name);
        self.entries.push(Entry {
            name,
            usage,
            handler: Box::new(handler),
        });
        self
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|e| e.name)
    }

    /// Run the command `line` names. `None` when no command matches.
    ///
    /// A bare name matches case-insensitively; a name followed by a space
    /// passes the rest of the line as arguments.
    pub fn dispatch(&self, line: &str) -> Option<Result<String>> {
        let line = line.trim();
        self.entries.iter().find_map(|entry| {
            let args = if line.eq_ignore_ascii_case(entry.name) {
                ""
            } else {
                line.strip_prefix(entry.name)?.strip_prefix(' ')?
            };
            Some((entry.handler)(args.trim()))
        })
    }

    #[must_use]
    pub fn help(&self) -> String {
        std::iter::once("Commands:")
            .chain(self.entries.iter().map(|e| e.usage))
            .chain(["help", "exit"])
            .collect::<Vec<_>>()
            .join("\n  ")
    }
}

/// Tallies of one console session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsoleSummary {
    pub handled: usize,
    pub failed: usize,
    pub unknown: usize,
}

/// Read commands until `exit` or end of input. One blocking read per
/// iteration; handler errors are printed and the loop continues.
pub fn run_console<R: BufRead, W: Write>(
    registry: &CommandRegistry<'_>,
    mut input: R,
    mut output: W,
    prompt: &str,
) -> Result<ConsoleSummary> {
    let mut summary = ConsoleSummary::default();
    loop {
        write!(output, "{prompt}")?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            writeln!(output)?;
            break;
        }
        let command = line.trim();
        if command.is_empty() {
            continue;
        }
        if is_exit(command) {
            break;
        }
        if command.eq_ignore_ascii_case("help") {
            writeln!(output, "{}", registry.help())?;
            continue;
        }

        tracing::debug!(command, "console dispatch");
        match registry.dispatch(command) {
            Some(Ok(reply)) => {
                summary.handled += 1;
                writeln!(output, "{reply}")?;
            }
            Some(Err(e)) => {
                summary.failed += 1;
                writeln!(output, "error: {e:#}")?;
            }
            None => {
                summary.unknown += 1;
                writeln!(output, "unknown command: {command} (type 'help')")?;
            }
        }
    }
    Ok(summary)
}
