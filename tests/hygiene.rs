//! Hygiene: enforces coding standards at test time
//!
//! These tests scan the kymograph source tree for antipatterns that violate
//! project standards. Each has a budget (ideally zero). If you must add one,
//! you have to fix an existing one first. The budget never grows.

use std::fs;
use std::path::Path;

// Panics crash the host.
const MAX_UNWRAP: usize = 0;
const MAX_EXPECT: usize = 0;
const MAX_PANIC: usize = 0;
const MAX_UNREACHABLE: usize = 0;
const MAX_TODO: usize = 0;
const MAX_UNIMPLEMENTED: usize = 0;

// Silent loss: errors discarded without inspection.
const MAX_SILENT_DISCARD: usize = 0;
// color::channel: a non-hex digit means "not a color", and the caller falls back to paper white.
const MAX_DOT_OK: usize = 1;

// Logs go through tracing, never straight to the terminal.
const MAX_PRINT: usize = 0;

// Time only enters through EngineCore::tick(now_ms).
const MAX_WALL_CLOCK: usize = 0;

// Style / structure.
const MAX_ALLOW_DEAD_CODE: usize = 0;
const MAX_ALLOW_TOO_MANY_ARGS: usize = 0;

struct SourceFile {
    path: String,
    content: String,
}

/// Collect production `.rs` files from `src/`, excluding test files.
fn source_files() -> Vec<SourceFile> {
    let mut files = Vec::new();
    collect_rs_files(Path::new("src"), &mut files);
    files
}

fn collect_rs_files(dir: &Path, out: &mut Vec<SourceFile>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            let name = path.file_name().unwrap_or_default().to_string_lossy();
            if name == "target" || name == "tests" {
                continue;
            }
            collect_rs_files(&path, out);
        } else if path.extension().is_some_and(|e| e == "rs") {
            let path_str = path.to_string_lossy().to_string();
            // Skip test files
            if path_str.ends_with("_test.rs") {
                continue;
            }
            if let Ok(content) = fs::read_to_string(&path) {
                out.push(SourceFile { path: path_str, content });
            }
        }
    }
}

fn count_in_source(files: &[SourceFile], pattern: &str) -> Vec<(String, usize)> {
    files
        .iter()
        .filter_map(|file| {
            let count = file
                .content
                .lines()
                .filter(|line| line.contains(pattern))
                .count();
            if count > 0 {
                Some((file.path.clone(), count))
            } else {
                None
            }
        })
        .collect()
}

fn total(hits: &[(String, usize)]) -> usize {
    hits.iter().map(|(_, c)| c).sum()
}

fn format_hits(hits: &[(String, usize)]) -> String {
    hits.iter()
        .map(|(path, count)| format!("  {path}: {count}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Count every pattern across `src/` and fail when the sum exceeds `max`.
fn check_budget(patterns: &[&str], max: usize, label: &str) {
    let files = source_files();
    let hits: Vec<(String, usize)> = patterns.iter().flat_map(|p| count_in_source(&files, p)).collect();
    let count = total(&hits);
    assert!(count <= max, "{label} budget exceeded: found {count}, max {max}.\n{}", format_hits(&hits));
}

#[test]
fn unwrap_budget() {
    check_budget(&[".unwrap()"], MAX_UNWRAP, ".unwrap()");
}

#[test]
fn expect_budget() {
    check_budget(&[".expect("], MAX_EXPECT, ".expect()");
}

#[test]
fn panic_budget() {
    check_budget(&["panic!("], MAX_PANIC, "panic!()");
}

#[test]
fn unreachable_budget() {
    check_budget(&["unreachable!("], MAX_UNREACHABLE, "unreachable!()");
}

#[test]
fn todo_budget() {
    check_budget(&["todo!("], MAX_TODO, "todo!()");
}

#[test]
fn unimplemented_budget() {
    check_budget(&["unimplemented!("], MAX_UNIMPLEMENTED, "unimplemented!()");
}

#[test]
fn silent_discard_budget() {
    check_budget(&["let _ ="], MAX_SILENT_DISCARD, "let _ =");
}

#[test]
fn dot_ok_budget() {
    check_budget(&[".ok()"], MAX_DOT_OK, ".ok()");
}

#[test]
fn print_budget() {
    check_budget(&["println!(", "eprintln!(", "dbg!("], MAX_PRINT, "println!/eprintln!/dbg!");
}

#[test]
fn wall_clock_budget() {
    check_budget(&["Instant::now(", "SystemTime::now(", "thread::sleep("], MAX_WALL_CLOCK, "wall clock");
}

#[test]
fn allow_dead_code_budget() {
    check_budget(&["#[allow(dead_code)]"], MAX_ALLOW_DEAD_CODE, "#[allow(dead_code)]");
}

#[test]
fn allow_too_many_arguments_budget() {
    check_budget(&["allow(clippy::too_many_arguments)"], MAX_ALLOW_TOO_MANY_ARGS, "too_many_arguments allow");
}
