//! Structural tests for the layer boundaries.
//!
//! These scan the source tree so a stray import fails the build's tests
//! rather than a review.

use std::path::{Path, PathBuf};

fn src_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("src")
}

/// Collect all `.rs` files under a directory recursively.
fn collect_rs_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                files.extend(collect_rs_files(&path));
            } else if path.extension().and_then(|e| e.to_str()) == Some("rs") {
                files.push(path);
            }
        }
    }
    files
}

/// Track brace depth and report whether a line is inside a `#[cfg(test)]` block.
struct CfgTestTracker {
    in_test_block: bool,
    brace_depth: i32,
    test_block_start_depth: i32,
}

impl CfgTestTracker {
    fn new() -> Self {
        Self {
            in_test_block: false,
            brace_depth: 0,
            test_block_start_depth: 0,
        }
    }

    fn process_line(&mut self, line: &str) -> bool {
        if line.trim().contains("#[cfg(test)]") {
            self.in_test_block = true;
            self.test_block_start_depth = self.brace_depth;
        }
        for ch in line.chars() {
            match ch {
                '{' => self.brace_depth += 1,
                '}' => {
                    self.brace_depth -= 1;
                    if self.in_test_block && self.brace_depth <= self.test_block_start_depth {
                        self.in_test_block = false;
                    }
                }
                _ => {}
            }
        }
        self.in_test_block
    }
}

/// `(file, line number, line)` for every non-test, non-comment line under
/// `dir` that contains one of `needles`.
fn find_in_code(dir: &Path, needles: &[&str]) -> Vec<String> {
    let mut hits = Vec::new();
    for file in collect_rs_files(dir) {
        let Ok(content) = std::fs::read_to_string(&file) else {
            continue;
        };
        let rel = file
            .strip_prefix(env!("CARGO_MANIFEST_DIR"))
            .unwrap_or(&file)
            .display()
            .to_string();
        let mut tracker = CfgTestTracker::new();
        for (i, line) in content.lines().enumerate() {
            let in_test = tracker.process_line(line);
            if in_test || line.trim_start().starts_with("//") {
                continue;
            }
            if needles.iter().any(|n| line.contains(n)) {
                hits.push(format!("{rel}:{}: {}", i + 1, line.trim()));
            }
        }
    }
    hits
}

#[test]
fn domain_is_pure() {
    let hits = find_in_code(
        &src_dir().join("domain"),
        &[
            "crate::infra",
            "crate::application",
            "crate::commands",
            "crate::output",
            "tokio::",
            "std::fs",
            "std::net",
            "std::process",
        ],
    );
    assert!(hits.is_empty(), "domain/ must stay free of I/O:\n{}", hits.join("\n"));
}

#[test]
fn application_does_not_reach_outward() {
    let hits = find_in_code(
        &src_dir().join("application"),
        &["crate::infra", "crate::commands", "crate::output"],
    );
    assert!(
        hits.is_empty(),
        "application/ may only depend on domain/:\n{}",
        hits.join("\n")
    );
}

#[test]
fn infra_has_no_imports_from_commands_or_output() {
    let hits = find_in_code(&src_dir().join("infra"), &["crate::commands", "crate::output"]);
    assert!(
        hits.is_empty(),
        "infra/ must not import from commands/ or output/:\n{}",
        hits.join("\n")
    );
}

#[test]
fn infra_and_services_do_not_print() {
    let mut hits = find_in_code(&src_dir().join("infra"), &["println!", "eprintln!"]);
    hits.extend(find_in_code(
        &src_dir().join("application"),
        &["println!", "eprintln!"],
    ));
    assert!(
        hits.is_empty(),
        "only commands/ and output/ print:\n{}",
        hits.join("\n")
    );
}

#[test]
fn commands_render_through_the_renderer() {
    let hits = find_in_code(&src_dir().join("commands"), &["json: bool", "if json", "if !json"]);
    assert!(
        hits.is_empty(),
        "Found inline JSON branching in commands/: use app.renderer() instead:\n{}",
        hits.join("\n")
    );
}
