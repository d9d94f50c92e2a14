//! Integration Test: Reader Core Rules
//!
//! **Policy**:
//! - Production code never sleeps; it waits on channels and I/O.
//! - Remote calls are single-attempt. Retrying is the user's decision.
//! - Production code propagates errors instead of unwrapping.
//! - `reader-core` does not depend on any UI framework.

use std::fs;

use architectural_enforcement::{find_violations, rust_sources, workspace_root};

const PRODUCTION_DIRS: &[&str] = &["reader/core/src", "reader/cli/src"];

fn report(rule: &str, violations: &[String]) {
    if violations.is_empty() {
        return;
    }
    eprintln!("\n❌ {rule}\n");
    for violation in violations {
        eprintln!("  ❌ {violation}");
    }
    panic!("\nFound {} violation(s): {rule}", violations.len());
}

#[test]
fn test_sources_are_found() {
    assert!(
        !rust_sources("reader/core/src").is_empty(),
        "reader/core/src not found under {}",
        workspace_root().display()
    );
}

#[test]
fn test_no_sleep_in_production_code() {
    let violations = find_violations(PRODUCTION_DIRS, |code| {
        code.contains("::sleep(") || code.contains(".sleep(")
    });
    report("Sleep calls found in production code", &violations);
}

#[test]
fn test_no_retry_around_services() {
    let violations = find_violations(&["reader/core/src/backend"], |code| {
        let lower = code.to_lowercase();
        lower.contains("retry")
            || lower.contains("backoff")
            || lower.contains("attempt")
            || code.trim_start().starts_with("loop ")
    });
    report("Retry logic found around remote services", &violations);
}

#[test]
fn test_no_unwrap_in_production_code() {
    let violations = find_violations(PRODUCTION_DIRS, |code| {
        code.contains(".unwrap()") || code.contains(".expect(")
    });
    report("unwrap()/expect() found in production code", &violations);
}

#[test]
fn test_core_has_no_ui_dependencies() {
    let manifest = fs::read_to_string(workspace_root().join("reader/core/Cargo.toml"))
        .unwrap_or_default();
    assert!(!manifest.is_empty(), "reader/core/Cargo.toml not readable");

    let violations: Vec<String> = ["ratatui", "crossterm", "egui", "iced", "tauri", "gtk"]
        .iter()
        .filter(|ui| {
            manifest.lines().any(|line| {
                let line = line.trim_start();
                line.starts_with(&format!("{ui} ")) || line.starts_with(&format!("{ui}="))
            })
        })
        .map(|ui| format!("reader/core/Cargo.toml depends on {ui}"))
        .collect();
    report("UI framework dependency in reader-core", &violations);
}
