//! Append-only record of artifacts added to the host's primary classpath.
//!
//! Appending to a live classpath cannot be undone, so the ledger has no
//! removal operation. An artifact is appended at most once per process.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Ledger shared by every bootstrap that runs in this process.
pub static PROCESS_CLASSPATH: ExtendedClasspath = ExtendedClasspath::new();

/// Result of asking the ledger to extend the classpath.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extension {
    /// The artifact was handed to the host just now.
    Appended,
    /// An earlier bootstrap already appended it; nothing was done.
    AlreadyPresent,
}

/// Monotonic set of classpath extensions.
#[derive(Debug, Default)]
pub struct ExtendedClasspath {
    entries: Mutex<Vec<PathBuf>>,
}

impl ExtendedClasspath {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Append `artifact` via `append` unless it was appended before.
    ///
    /// The lock is held across `append`, so two concurrent bootstraps cannot
    /// both extend the classpath with the same artifact. The artifact is only
    /// recorded once `append` succeeds.
    pub fn extend_with<E>(
        &self,
        artifact: &Path,
        append: impl FnOnce(&Path) -> Result<(), E>,
    ) -> Result<Extension, E> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if entries.iter().any(|known| known == artifact) {
            return Ok(Extension::AlreadyPresent);
        }
        append(artifact)?;
        entries.push(artifact.to_path_buf());
        Ok(Extension::Appended)
    }

    #[must_use]
    pub fn contains(&self, artifact: &Path) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|known| known == artifact)
    }

    /// Snapshot of the recorded artifacts, oldest first.
    #[must_use]
    pub fn entries(&self) -> Vec<PathBuf> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
