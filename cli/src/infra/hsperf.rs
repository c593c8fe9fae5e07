//! `ProcessSource` backed by HotSpot performance-data files.
//!
//! Every HotSpot JVM with perf data enabled (the default) writes
//! `<tmp>/hsperfdata_<user>/<pid>`. That is the list `jps` shows; the display
//! name comes from `/proc/<pid>/cmdline`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::application::ports::ProcessSource;
use crate::domain::attach::JVM_TMP_DIR;
use crate::domain::process::{HostProcessDescriptor, display_name_from_cmdline, parse_cmdline};

const HSPERF_PREFIX: &str = "hsperfdata_";

pub struct HsperfProcessSource {
    tmp_dir: PathBuf,
    proc_root: PathBuf,
}

impl HsperfProcessSource {
    #[must_use]
    pub fn new(tmp_dir: impl Into<PathBuf>, proc_root: impl Into<PathBuf>) -> Self {
        Self {
            tmp_dir: tmp_dir.into(),
            proc_root: proc_root.into(),
        }
    }

    /// The directory scanned for `hsperfdata_*`.
    #[must_use]
    pub fn tmp_dir(&self) -> &Path {
        &self.tmp_dir
    }

    fn perf_dirs(&self) -> Result<Vec<PathBuf>> {
        let entries = std::fs::read_dir(&self.tmp_dir)
            .with_context(|| format!("cannot read {}", self.tmp_dir.display()))?;
        Ok(entries
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().starts_with(HSPERF_PREFIX))
            .map(|e| e.path())
            .filter(|p| p.is_dir())
            .collect())
    }

    fn describe(&self, pid: u32) -> Option<HostProcessDescriptor> {
        let proc_dir = self.proc_root.join(pid.to_string());
        if !proc_dir.is_dir() {
            tracing::debug!(pid, "stale perf data file");
            return None;
        }
        let display_name = match std::fs::read(proc_dir.join("cmdline")) {
            Ok(raw) => display_name_from_cmdline(&parse_cmdline(&raw)),
            Err(e) => {
                tracing::debug!(pid, error = %e, "cmdline unreadable");
                String::new()
            }
        };
        Some(HostProcessDescriptor::new(pid, display_name))
    }
}

impl Default for HsperfProcessSource {
    fn default() -> Self {
        Self::new(JVM_TMP_DIR, "/proc")
    }
}

impl ProcessSource for HsperfProcessSource {
    fn list(&self) -> Result<Vec<HostProcessDescriptor>> {
        let mut found = BTreeMap::new();
        for dir in self.perf_dirs()? {
            let Ok(entries) = std::fs::read_dir(&dir) else {
                tracing::debug!(dir = %dir.display(), "perf data directory unreadable");
                continue;
            };
            for pid in entries
                .filter_map(Result::ok)
                .filter_map(|e| e.file_name().to_str().and_then(|n| n.parse::<u32>().ok()))
            {
                if let Some(descriptor) = self.describe(pid) {
                    found.insert(pid, descriptor);
                }
            }
        }
        Ok(found.into_values().collect())
    }
}

/// `true` when `path` looks like a perf data root, for diagnostics.
#[must_use]
pub fn has_perf_data(tmp_dir: &Path) -> bool {
    std::fs::read_dir(tmp_dir).is_ok_and(|entries| {
        entries
            .filter_map(Result::ok)
            .any(|e| e.file_name().to_string_lossy().starts_with(HSPERF_PREFIX))
    })
}
