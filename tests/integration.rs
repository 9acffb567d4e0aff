#![allow(clippy::unwrap_used, clippy::indexing_slicing, reason = "tests")]

use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn noteref_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_noteref"));
    cmd.current_dir(dir);
    return cmd;
}

fn run(dir: &Path, args: &[&str]) -> Output {
    return noteref_cmd(dir).args(args).output().unwrap();
}

fn workspace(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (path, text) in files {
        let path = dir.path().join(path);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, text).unwrap();
    }
    return dir;
}

fn read(dir: &TempDir, path: &str) -> String {
    return std::fs::read_to_string(dir.path().join(path)).unwrap();
}

fn stdout(output: &Output) -> String {
    return String::from_utf8_lossy(&output.stdout).into_owned();
}

fn stderr(output: &Output) -> String {
    return String::from_utf8_lossy(&output.stderr).into_owned();
}

#[test]
fn check_reports_missing_targets_and_unknown_labels() {
    let dir = workspace(&[
        ("labels.tree", "- Lang\n  - Rust\n"),
        ("notes/a.md", "# Intro\n<attr labels=\"Rust; Nope\"></attr>\n[b](b.md) [gone](missing.md)\n"),
        ("notes/b.md", "# B\n"),
    ]);

    let check = run(dir.path(), &["check"]);
    assert_eq!(check.status.code(), Some(1), "stderr: {}", stderr(&check));
    let out = stdout(&check);
    assert!(out.contains("notes/a.md:2:21: warning: invalid label: Nope"), "{out}");
    assert!(out.contains("notes/a.md:3:18: warning: path not exists: missing.md"), "{out}");
    assert!(out.contains("2 warnings in 1 documents"), "{out}");
}

#[test]
fn check_json_lists_diagnostics() {
    let dir = workspace(&[("a.md", "[x](nowhere.md#top)\n")]);

    let check = run(dir.path(), &["check", "--format", "json"]);
    assert_eq!(check.status.code(), Some(1));
    let value: serde_json::Value = serde_json::from_slice(&check.stdout).unwrap();
    let diagnostics = value["diagnostics"].as_array().unwrap();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0]["message"], "path not exists: nowhere.md");
    assert_eq!(diagnostics[0]["severity"], "warning");
    assert_eq!(diagnostics[0]["range"]["start"], 4);
}

#[test]
fn clean_workspace_passes_check() {
    let dir = workspace(&[("a.md", "[b](b.md)\n"), ("b.md", "# B\n")]);

    let check = run(dir.path(), &["check"]);
    assert!(check.status.success(), "stderr: {}", stderr(&check));
    assert!(stdout(&check).contains("All 2 documents clean"));
}

#[test]
fn moving_a_directory_rewrites_outside_links_only() {
    let dir = workspace(&[
        ("docs/old/a.md", "[b](b.md#h) [n](../n.md)\n"),
        ("docs/old/b.md", "# H\n"),
        ("docs/n.md", "[x](old/b.md#h)\n"),
    ]);

    let mv = run(dir.path(), &["mv", "docs/old", "docs/new"]);
    assert!(mv.status.success(), "stderr: {}", stderr(&mv));
    assert!(!dir.path().join("docs/old").exists());
    assert_eq!(read(&dir, "docs/new/a.md"), "[b](b.md#h) [n](../n.md)\n");
    assert_eq!(read(&dir, "docs/n.md"), "[x](new/b.md#h)\n");
}

#[test]
fn moving_a_file_rewrites_links_in_and_out() {
    let dir = workspace(&[
        ("notes/a.md", "[t](../topics/t.md#sec)\n"),
        ("topics/t.md", "# Sec\n"),
        ("index.md", "[a](notes/a.md)\n"),
    ]);

    let mv = run(dir.path(), &["mv", "notes/a.md", "archive/2024/a.md"]);
    assert!(mv.status.success(), "stderr: {}", stderr(&mv));
    assert_eq!(read(&dir, "archive/2024/a.md"), "[t](../../topics/t.md#sec)\n");
    assert_eq!(read(&dir, "index.md"), "[a](archive/2024/a.md)\n");
}

#[test]
fn moving_a_missing_file_fails() {
    let dir = workspace(&[("a.md", "")]);

    let mv = run(dir.path(), &["mv", "nope.md", "b.md"]);
    assert!(!mv.status.success());
    assert!(stderr(&mv).contains("File Not Found"));
}

#[test]
fn heading_rename_updates_anchors() {
    let dir = workspace(&[
        ("guide.md", "# Intro\n\n## Old Name\n\nsee [above](#old-name)\n"),
        ("other.md", "[g](guide.md#old-name)\n"),
    ]);

    let heading = run(dir.path(), &["heading", "guide.md", "Old Name", "New Name"]);
    assert!(heading.status.success(), "stderr: {}", stderr(&heading));
    assert_eq!(read(&dir, "guide.md"), "# Intro\n\n## New Name\n\nsee [above](#new-name)\n");
    assert_eq!(read(&dir, "other.md"), "[g](guide.md#new-name)\n");
}

#[test]
fn label_rename_migrates_annotations_and_config() {
    let dir = workspace(&[
        ("labels.tree", "- A\n  - X\n- B\n  - Y\n"),
        ("n.md", "# H\n<attr labels=\"X; Y\"></attr>\n"),
    ]);

    let rename = run(dir.path(), &["labels", "rename", "Y", "X"]);
    assert!(rename.status.success(), "stderr: {}", stderr(&rename));
    assert_eq!(read(&dir, "n.md"), "# H\n<attr labels=\"A.X; B.X\"></attr>\n");
    assert_eq!(read(&dir, "labels.tree"), "- A\n  - X\n- B\n  - X\n");
}

#[test]
fn label_rename_rejects_reserved_characters() {
    let dir = workspace(&[("labels.tree", "- A\n")]);

    let rename = run(dir.path(), &["labels", "rename", "A", "a.b"]);
    assert!(!rename.status.success());
    assert!(stderr(&rename).contains("Invalid Label Name"));
    assert_eq!(read(&dir, "labels.tree"), "- A\n");
}

#[test]
fn label_report_is_written_to_report_dir() {
    let dir = workspace(&[
        ("labels.tree", "- A\n  - X\n- B\n  - Y\n"),
        ("n.md", "# H\n<attr labels=\"X; Y\"></attr>\n"),
        ("m.md", "# Other\n<attr labels=\"Y\"></attr>\n"),
    ]);

    let report = run(dir.path(), &["labels", "report", "A"]);
    assert!(report.status.success(), "stderr: {}", stderr(&report));
    assert_eq!(
        read(&dir, ".report/select_by_labels_results.md"),
        "# Select By Labels (Union)\n\nLabels:\n- A\n\n---\n\nRelated Sections:\n- [n.md#H](../n.md#h): X | Y\n\n"
    );
}

#[test]
fn label_tree_prints_config_and_shortest_paths() {
    let dir = workspace(&[("labels.tree", "- Alpha\n    - One\n- Beta\n    - One\n")]);

    let tree = run(dir.path(), &["labels", "tree"]);
    assert!(tree.status.success());
    assert_eq!(stdout(&tree), "- Alpha\n  - One\n- Beta\n  - One\n");

    let paths = run(dir.path(), &["labels", "tree", "--paths"]);
    assert_eq!(stdout(&paths), "Alpha\tAlpha\nAlpha.One\tAlpha.One\nBeta\tBeta\nBeta.One\tBeta.One\n");
}

#[test]
fn malformed_label_tree_is_reported() {
    let dir = workspace(&[("labels.tree", "- A\n   - B\n  - C\n")]);

    let tree = run(dir.path(), &["labels", "tree"]);
    assert!(!tree.status.success());
    assert!(stderr(&tree).contains("Label Tree Parse Failed"));
}

#[test]
fn malformed_config_is_an_error() {
    let dir = workspace(&[(".noteref.toml", "unknown_key = 1\n"), ("a.md", "")]);

    let check = run(dir.path(), &["check"]);
    assert!(!check.status.success());
    assert!(stderr(&check).contains("Invalid Config"));
}

#[test]
fn refs_lists_references_to_a_target() {
    let dir = workspace(&[
        ("a.md", "[b](b.md#one)\n\n[b again](b.md)\n"),
        ("b.md", "# One\n"),
    ]);

    let refs = run(dir.path(), &["refs", "b.md", "--fragment", "one"]);
    assert!(refs.status.success());
    assert_eq!(stdout(&refs), "a.md:1:5  b.md#one\n");
}
