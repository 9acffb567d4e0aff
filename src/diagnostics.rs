use std::fmt::Write as _;
use std::path::Path;

use crate::document::DocumentIndex;
use crate::error::Error;
use crate::labels::LabelTree;
use crate::source::DocumentSource;
use crate::types::{Diagnostic, Severity};

/// ANSI bold, used for markdown headings on a terminal.
const BOLD: &str = "\x1b[1m";
/// ANSI reset.
const RESET: &str = "\x1b[0m";

/// Warnings for one cached document: references to missing targets and
/// label tokens the tree cannot resolve. Ranges cover the exact token.
pub fn diagnose(index: &DocumentIndex, tree: &LabelTree, source: &dyn DocumentSource) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    for reference in &index.references {
        if !source.exists(&reference.target) {
            diagnostics.push(Diagnostic {
                document: index.path.clone(),
                message: format!("path not exists: {}", reference.relpath),
                range: reference.span(),
                severity: Severity::Warning,
            });
        }
    }
    for annotation in &index.annotations {
        for label in &annotation.labels {
            if tree.resolve(&label.path).is_none() {
                diagnostics.push(Diagnostic {
                    document: index.path.clone(),
                    message: format!("invalid label: {}", label.path),
                    range: annotation.span_of(label),
                    severity: Severity::Warning,
                });
            }
        }
    }
    diagnostics.sort_by_key(|diagnostic| return diagnostic.range.start);
    return diagnostics;
}

/// One-based line and column (in characters) of a byte offset.
pub fn line_col(text: &str, offset: usize) -> (usize, usize) {
    let before = text.get(..offset).unwrap_or(text);
    let line = before.matches('\n').count().saturating_add(1);
    let line_start = before.rfind('\n').map_or(0, |i| return i.saturating_add(1));
    let column = before.get(line_start..).map_or(0, |rest| return rest.chars().count()).saturating_add(1);
    return (line, column);
}

/// Render an error as valid markdown with bold headings and print to stderr.
pub fn print_error(e: &Error) {
    let md = render_error(e);
    for line in md.lines() {
        if line.starts_with('#') {
            eprintln!("{BOLD}{line}{RESET}");
        } else {
            eprintln!("{line}");
        }
    }
}

/// Markdown block explaining a config problem.
fn render_config_invalid(path: &Path, reason: &str) -> String {
    return format!(
        "\
# Error: Invalid Config

`{}`: {reason}

## Fix

Keys allowed in `.noteref.toml`: `labels`, `include`, `exclude`,
`report_dir`, `max_index_attempts`, `index_batch_size`.
",
        path.display()
    );
}

/// Markdown block for a name declared twice under one parent.
fn render_duplicate_label(name: &str, parent: &str) -> String {
    let parent = if parent.is_empty() { "the root" } else { parent };
    return format!(
        "\
# Error: Duplicate Label

`{name}` is already a child of `{parent}`.

## Fix

Pick a name that is not taken under `{parent}`.
"
    );
}

/// Render an error as a structured markdown diagnostic.
///
/// Each variant produces a block with what happened and, where there is one,
/// how to fix it.
pub fn render_error(e: &Error) -> String {
    return match e {
        Error::ConfigInvalid { path, reason } => render_config_invalid(path, reason),
        Error::DuplicateLabel { name, parent } => render_duplicate_label(name, parent),
        Error::HeadingNotFound { heading, path } => format!(
            "\
# Error: Heading Not Found

No heading `{heading}` in `{}`.
",
            path.display()
        ),
        Error::InvalidLabelName { name } => format!(
            "\
# Error: Invalid Label Name

`{name}` is empty, has surrounding whitespace, or contains one of
`.` `&` `\"` `'` `<` `>` `;`.
"
        ),
        Error::LabelNotFound { path } => format!(
            "\
# Error: Label Not Found

`{path}` does not resolve in the label tree.

## Fix

List the labels and their shortest paths:

    noteref labels tree
"
        ),
        Error::LabelParse { line, reason } => render_label_parse(*line, reason),
        Error::RetryExhausted { attempts, path } => format!(
            "\
# Error: Document Kept Changing

`{}` changed during each of {attempts} index attempts.

## Fix

Run the command again once the document stops changing.
",
            path.display()
        ),
        _ => render_generic(e),
    };
}

/// Markdown block for variants without dedicated advice.
fn render_generic(e: &Error) -> String {
    return match e {
        Error::FileNotFound { path } => format!(
            "\
# Error: File Not Found

`{}` does not exist.
",
            path.display()
        ),
        Error::Io(e) => format!(
            "\
# Error: I/O

{e}
"
        ),
        _ => format!(
            "\
# Error

{e}
"
        ),
    };
}

/// Markdown block for a malformed label tree, with the config format.
fn render_label_parse(line: usize, reason: &str) -> String {
    let mut out = format!(
        "\
# Error: Label Tree Parse Failed

Line {line}: {reason}
"
    );
    out.push_str(
        "\
\n## Format

One label per line, nested with a consistent indent:

    - Parent
      - Child ; optional comment
",
    );
    return out;
}

/// Check output as text: one `path:line:col: severity: message` row per diagnostic.
pub fn render_text(diagnostics: &[Diagnostic], texts: &dyn Fn(&Path) -> Option<String>) -> String {
    let mut out = String::new();
    let mut current: Option<(&Path, Option<String>)> = None;
    for diagnostic in diagnostics {
        if current.as_ref().is_none_or(|(path, _)| return *path != diagnostic.document.as_path()) {
            current = Some((diagnostic.document.as_path(), texts(&diagnostic.document)));
        }
        let (line, column) = current
            .as_ref()
            .and_then(|(_, text)| return text.as_deref())
            .map_or((0, 0), |text| return line_col(text, diagnostic.range.start));
        let severity = match diagnostic.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        let _ = writeln!(
            out,
            "{}:{line}:{column}: {severity}: {}",
            diagnostic.document.display(),
            diagnostic.message
        );
    }
    return out;
}
