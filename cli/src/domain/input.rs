//! Interpretation of operator input at the interactive prompts.

use crate::domain::error::InputValidationError;
use crate::domain::process::HostProcessDescriptor;

/// Selection attempts before the locator gives up.
pub const MAX_SELECTION_ATTEMPTS: u32 = 3;

/// Attempts for the context-locator and environment prompts.
pub const MAX_INPUT_ATTEMPTS: u32 = 5;

/// Typed at any prompt to abort.
pub const EXIT_COMMAND: &str = "exit";

/// Environment name the service refuses to run under.
pub const RESERVED_ENVIRONMENT: &str = "local";

#[must_use]
pub fn is_exit(line: &str) -> bool {
    line.trim().eq_ignore_ascii_case(EXIT_COMMAND)
}

/// The entry whose pid equals the trimmed preset.
#[must_use]
pub fn find_preset<'a>(
    candidates: &'a [HostProcessDescriptor],
    preset: &str,
) -> Option<&'a HostProcessDescriptor> {
    let preset = preset.trim();
    candidates.iter().find(|c| c.pid.to_string() == preset)
}

/// Parse a 1-based list index. `None` on anything that is not a valid index.
#[must_use]
pub fn parse_selection(line: &str, count: usize) -> Option<usize> {
    match line.trim().parse::<usize>() {
        Ok(n) if (1..=count).contains(&n) => Some(n - 1),
        _ => None,
    }
}

/// Interpret an answer to the environment prompt.
///
/// Empty input and the literal `null` mean "no environment".
pub fn parse_environment(line: &str) -> Result<Option<String>, InputValidationError> {
    let env = line.trim();
    if env.is_empty() || env == "null" {
        return Ok(None);
    }
    if env == RESERVED_ENVIRONMENT {
        return Err(InputValidationError::ReservedEnvironment);
    }
    if env.contains('&') {
        return Err(InputValidationError::EnvironmentDelimiter);
    }
    Ok(Some(env.to_string()))
}
