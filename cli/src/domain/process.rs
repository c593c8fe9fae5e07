//! Host process descriptors and display names.
//!
//! Pure functions only. Command lines arrive as raw `/proc/<pid>/cmdline`
//! bytes and are turned into the same display names `jps -m` shows.

use serde::Serialize;

/// Display-name fragments that identify the guide itself.
pub const SELF_MARKERS: &[&str] = &["jdig"];

/// Display-name fragments of IDE launchers that are never attach targets.
pub const IDE_MARKERS: &[&str] = &["IntelliJ IDEA.app", "com.intellij.idea.Main"];

/// JVM launcher options that consume the following argument.
const OPTIONS_WITH_VALUE: &[&str] = &[
    "-cp",
    "-classpath",
    "--class-path",
    "-p",
    "--module-path",
    "--upgrade-module-path",
    "--add-modules",
    "--limit-modules",
    "--add-reads",
    "--add-exports",
    "--add-opens",
    "--patch-module",
];

/// One candidate JVM, produced by a single enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostProcessDescriptor {
    pub pid: u32,
    pub display_name: String,
}

impl HostProcessDescriptor {
    #[must_use]
    pub fn new(pid: u32, display_name: impl Into<String>) -> Self {
        Self {
            pid,
            display_name: display_name.into(),
        }
    }

    /// Whether this process may be offered as an attach target.
    #[must_use]
    pub fn is_candidate(&self, own_pid: u32) -> bool {
        self.pid != own_pid
            && !SELF_MARKERS
                .iter()
                .chain(IDE_MARKERS)
                .any(|marker| self.display_name.contains(marker))
    }
}

/// Split a NUL-separated `/proc/<pid>/cmdline` into arguments.
#[must_use]
pub fn parse_cmdline(raw: &[u8]) -> Vec<String> {
    raw.split(|b| *b == 0)
        .filter(|arg| !arg.is_empty())
        .map(|arg| String::from_utf8_lossy(arg).into_owned())
        .collect()
}

/// Main class (or `-jar` artifact, or `-m` module) followed by program args.
///
/// Returns an empty string when the command line names no entry point,
/// which is what `jps` prints for such processes too.
#[must_use]
pub fn display_name_from_cmdline(args: &[String]) -> String {
    let mut rest = args.iter().skip(1);
    while let Some(arg) = rest.next() {
        match arg.as_str() {
            "-jar" | "-m" | "--module" => {
                return rest.map(String::as_str).collect::<Vec<_>>().join(" ");
            }
            option if OPTIONS_WITH_VALUE.contains(&option) => {
                rest.next();
            }
            option if option.starts_with('-') => {}
            _ => {
                return std::iter::once(arg)
                    .chain(rest)
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join(" ");
            }
        }
    }
    String::new()
}
