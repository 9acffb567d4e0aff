//! CLI commands for noteref: check, refs, mv, heading and the label commands.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use serde::Serialize;

use crate::diagnostics;
use crate::edit::EditSet;
use crate::error::Error;
use crate::paths;
use crate::types::{Diagnostic, with_fragment};
use crate::workspace::Workspace;

/// How `check` prints its findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Pretty JSON on stdout.
    Json,
    /// One `path:line:col` row per finding.
    Text,
}

/// JSON shape of `check` output.
#[derive(Serialize)]
struct CheckOutput<'a> {
    /// Findings for indexed documents.
    diagnostics: &'a [Diagnostic],
    /// Documents that could not be indexed.
    failures: Vec<Failure>,
}

/// A document that could not be indexed, for JSON output.
#[derive(Serialize)]
struct Failure {
    /// Rendered error.
    error: String,
    /// Document path.
    path: PathBuf,
}

/// Index the workspace, load the label tree and report every missing
/// reference target and unresolved label.
///
/// # Errors
///
/// Returns `Error::Serialize` if JSON output cannot be produced.
pub async fn check(workspace: &Workspace, format: OutputFormat) -> Result<ExitCode, Error> {
    let failures = workspace.scan().await;
    if let Err(e) = workspace.load_labels().await {
        diagnostics::print_error(&e);
    }
    let found = workspace.diagnostics();

    match format {
        OutputFormat::Json => {
            let output = CheckOutput {
                diagnostics: &found,
                failures: failures
                    .iter()
                    .map(|(path, e)| {
                        return Failure {
                            error: e.to_string(),
                            path: path.clone(),
                        };
                    })
                    .collect(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        },
        OutputFormat::Text => {
            print!("{}", diagnostics::render_text(&found, &|path| return workspace.read_text(path)));
            for (_, e) in &failures {
                diagnostics::print_error(e);
            }
            let documents: BTreeSet<&Path> = found.iter().map(|d| return d.document.as_path()).collect();
            if found.is_empty() {
                let total = workspace.manager.len();
                println!("All {total} documents clean");
            } else {
                println!();
                println!("{} warnings in {} documents", found.len(), documents.len());
            }
        },
    }

    // Exit code priority: unindexable documents (2) > warnings (1) > clean (0).
    if !failures.is_empty() {
        return Ok(ExitCode::from(2));
    } else if !found.is_empty() {
        return Ok(ExitCode::from(1));
    }
    return Ok(ExitCode::SUCCESS);
}

/// Rename a heading and every reference to its anchor.
///
/// # Errors
///
/// Returns `Error::HeadingNotFound` or the read error for `file`.
pub async fn heading(workspace: &Workspace, file: &Path, old: &str, new: &str) -> Result<ExitCode, Error> {
    workspace.scan().await;
    let edits = workspace.rewriter.rename_heading(file, old, new).await?;
    let failures = workspace.apply(&edits).await;
    return Ok(report_applied(&edits, &failures));
}

/// Rewrite the label paths of one document to their shortest unique form.
///
/// # Errors
///
/// Returns label tree errors or the indexing error for `file`.
pub async fn labels_minimize(workspace: &Workspace, file: &Path) -> Result<ExitCode, Error> {
    workspace.load_labels().await?;
    let edits = workspace.taxonomy.minimize(&workspace.manager, file).await?;
    let failures = workspace.apply(&edits).await;
    return Ok(report_applied(&edits, &failures));
}

/// Rename a label in the tree config and migrate every annotation using it.
///
/// # Errors
///
/// Returns label tree errors or the rename's validation errors.
pub async fn labels_rename(workspace: &Workspace, path: &str, new_name: &str) -> Result<ExitCode, Error> {
    workspace.scan().await;
    workspace.load_labels().await?;
    let edits = workspace.taxonomy.rename(&workspace.manager, path, new_name)?;
    let failures = workspace.apply(&edits).await;
    return Ok(report_applied(&edits, &failures));
}

/// Select sections by labels, write the markdown report and optionally print JSON.
///
/// # Errors
///
/// Returns `Error::LabelNotFound` for an unknown label, or write errors.
pub async fn labels_report(
    workspace: &Workspace,
    selection: &[String],
    intersection: bool,
    json: bool,
) -> Result<ExitCode, Error> {
    workspace.scan().await;
    workspace.load_labels().await?;
    let report = workspace.taxonomy.report(&workspace.manager, selection, intersection)?;
    let path = workspace.write_report(&report).await?;
    if json {
        println!("{}", report.to_json()?);
    }
    eprintln!("Wrote {} sections to {}", report.sections.len(), path.display());
    return Ok(ExitCode::SUCCESS);
}

/// Print the label tree in config form, or each label's full and shortest path.
///
/// # Errors
///
/// Returns `Error::LabelParse` for a malformed tree.
pub async fn labels_tree(workspace: &Workspace, show_paths: bool) -> Result<ExitCode, Error> {
    workspace.load_labels().await?;
    let tree = workspace.taxonomy.tree();
    if show_paths {
        for (id, _) in tree.preorder() {
            println!("{}\t{}", tree.full_path(id), tree.shortest_unique_path(id));
        }
    } else if !tree.is_empty() {
        println!("{}", tree.render());
    }
    return Ok(ExitCode::SUCCESS);
}

/// Move a file or directory and rewrite references inside and outside it.
///
/// # Errors
///
/// Returns `Error::FileNotFound` when `old` does not exist, or the I/O
/// error of the move itself.
pub async fn mv(workspace: &Workspace, old: &Path, new: &Path) -> Result<ExitCode, Error> {
    let old = paths::normalize_path(old);
    let new = paths::normalize_path(new);
    if !workspace.exists(&old) {
        return Err(Error::FileNotFound { path: old });
    }
    workspace.scan().await;

    let destination = workspace.source.absolute(&new);
    if let Some(parent) = destination.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::rename(workspace.source.absolute(&old), &destination).await?;
    eprintln!("Moved {} -> {}", old.display(), new.display());

    let outcome = workspace.rewriter.on_move(&old, &new).await;
    for (_, e) in &outcome.failures {
        diagnostics::print_error(e);
    }
    // Inner and outer edits are applied independently.
    let inner_failures = workspace.apply(&outcome.inner).await;
    let outer_failures = workspace.apply(&outcome.outer).await;

    report_applied(&outcome.inner, &inner_failures);
    report_applied(&outcome.outer, &outer_failures);
    if inner_failures.is_empty() && outer_failures.is_empty() && outcome.failures.is_empty() {
        return Ok(ExitCode::SUCCESS);
    }
    return Ok(ExitCode::FAILURE);
}

/// List every reference to `target`, optionally only those with `fragment`.
pub async fn refs(workspace: &Workspace, target: &Path, fragment: Option<&str>) -> ExitCode {
    workspace.scan().await;
    let target = paths::normalize_path(target);
    let mut count: usize = 0;
    for index in workspace.manager.snapshot() {
        let text = workspace.read_text(&index.path).unwrap_or_default();
        for reference in index.references_under(&target, fragment) {
            let (line, column) = diagnostics::line_col(&text, reference.offset);
            println!(
                "{}:{line}:{column}  {}",
                index.path.display(),
                with_fragment(&reference.relpath, reference.fragment.as_deref())
            );
            count = count.saturating_add(1);
        }
    }
    eprintln!("{count} references to {}", target.display());
    return ExitCode::SUCCESS;
}

/// Print what an edit batch changed and any per-document failures.
/// Returns failure when any document could not be written.
fn report_applied(edits: &EditSet, failures: &[(PathBuf, Error)]) -> ExitCode {
    let documents = edits.documents().count().saturating_sub(failures.len());
    eprintln!("Rewrote {} references in {documents} documents", edits.len());
    for (_, e) in failures {
        diagnostics::print_error(e);
    }
    if failures.is_empty() {
        return ExitCode::SUCCESS;
    }
    return ExitCode::FAILURE;
}
