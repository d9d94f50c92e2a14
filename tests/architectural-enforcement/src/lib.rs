//! Architectural Enforcement Integration Tests
//!
//! This package contains integration tests that enforce architectural principles
//! of the reader workspace:
//! - No sleep() calls in production code
//! - No retry loops around the remote services
//! - No unwrap()/expect() in production code
//! - The core crate stays free of UI framework dependencies
//!
//! The helpers here locate production sources and strip test modules and
//! comments so the rules only see shipped code.

use std::fs;
use std::path::{Path, PathBuf};

/// Root of the cargo workspace
#[must_use]
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
}

/// Every `.rs` file under `dir` (relative to the workspace root)
#[must_use]
pub fn rust_sources(dir: &str) -> Vec<PathBuf> {
    let path = workspace_root().join(dir);
    if !path.exists() {
        return Vec::new();
    }

    walkdir::WalkDir::new(path)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("rs"))
        .map(|e| e.into_path())
        .collect()
}

/// Production lines of a source file as `(line_number, code)`
///
/// Stops at the first `#[cfg(test)]` and drops line comments, so doc
/// examples and test modules never count as violations.
#[must_use]
pub fn production_lines(path: &Path) -> Vec<(usize, String)> {
    let Ok(content) = fs::read_to_string(path) else {
        return Vec::new();
    };

    content
        .lines()
        .enumerate()
        .take_while(|(_, line)| !line.trim_start().starts_with("#[cfg(test)]"))
        .map(|(idx, line)| (idx + 1, line.split("//").next().unwrap_or(line).to_string()))
        .filter(|(_, code)| !code.trim().is_empty())
        .collect()
}

/// Scan `dirs` for production lines matching `is_violation`
#[must_use]
pub fn find_violations(dirs: &[&str], is_violation: impl Fn(&str) -> bool) -> Vec<String> {
    let mut violations = Vec::new();
    for dir in dirs {
        for path in rust_sources(dir) {
            for (line_number, code) in production_lines(&path) {
                if is_violation(&code) {
                    violations.push(format!(
                        "{}:{} - {}",
                        path.display(),
                        line_number,
                        code.trim()
                    ));
                }
            }
        }
    }
    violations
}
