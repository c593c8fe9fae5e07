//! Application service: choosing the JVM to attach to.

use anyhow::Result;

use crate::application::ports::{ProcessSource, Prompter};
use crate::domain::error::{Aborted, SelectionError};
use crate::domain::input::{MAX_SELECTION_ATTEMPTS, find_preset, is_exit, parse_selection};
use crate::domain::process::HostProcessDescriptor;

/// Candidate JVMs, excluding the guide itself and IDE launchers, by pid.
pub fn list(source: &impl ProcessSource, own_pid: u32) -> Result<Vec<HostProcessDescriptor>> {
    let mut candidates: Vec<_> = source
        .list()?
        .into_iter()
        .filter(|p| p.is_candidate(own_pid))
        .collect();
    candidates.sort_by_key(|p| p.pid);
    tracing::debug!(count = candidates.len(), "candidate JVMs");
    Ok(candidates)
}

/// Pick the target: the preset pid when it is in the list, otherwise ask.
///
/// At most [`MAX_SELECTION_ATTEMPTS`] lines are read.
pub fn select(
    candidates: &[HostProcessDescriptor],
    preset: Option<&str>,
    prompter: &mut impl Prompter,
) -> Result<HostProcessDescriptor> {
    if candidates.is_empty() {
        return Err(SelectionError::NoCandidates.into());
    }
    if let Some(chosen) = preset.and_then(|p| find_preset(candidates, p)) {
        prompter.notice(&format!("Automatically selected the preset pid: {}", chosen.pid));
        return Ok(chosen.clone());
    }
    if let Some(preset) = preset {
        tracing::warn!(preset, "preset pid is not a candidate JVM");
    }

    for (i, candidate) in candidates.iter().enumerate() {
        prompter.notice(&format!(
            "{:2}. {:6} {}",
            i + 1,
            candidate.pid,
            candidate.display_name
        ));
    }

    for attempt in 1..=MAX_SELECTION_ATTEMPTS {
        let Some(line) = prompter.read_line("Please select a JVM: ")? else {
            return Err(Aborted.into());
        };
        if is_exit(&line) {
            return Err(Aborted.into());
        }
        if let Some(index) = parse_selection(&line, candidates.len()) {
            return Ok(candidates[index].clone());
        }
        if attempt < MAX_SELECTION_ATTEMPTS {
            prompter.notice("Your choice is wrong! Please re-select.");
        }
    }
    Err(SelectionError::TooManyAttempts {
        attempts: MAX_SELECTION_ATTEMPTS,
    }
    .into())
}
