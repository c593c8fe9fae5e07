//! `Prompter` over any line reader and writer.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};

use crate::application::ports::Prompter;

pub struct LinePrompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> LinePrompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl LinePrompter<std::io::StdinLock<'static>, std::io::Stderr> {
    /// Prompts on stderr so stdout stays clean for `--json`.
    #[must_use]
    pub fn stdio() -> Self {
        Self::new(std::io::stdin().lock(), std::io::stderr())
    }
}

impl<R: BufRead, W: Write> Prompter for LinePrompter<R, W> {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        write!(self.output, "{prompt}").context("cannot write prompt")?;
        self.output.flush().context("cannot flush prompt")?;
        let mut line = String::new();
        let read = self.input.read_line(&mut line).context("cannot read input")?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    fn notice(&mut self, message: &str) {
        let _ = writeln!(self.output, "{message}");
    }
}
