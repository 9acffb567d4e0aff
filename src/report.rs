/// Label selection reports: which sections carry which labels.
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::Error;
use crate::labels::{LabelId, LabelTree};
use crate::paths;
use crate::types::LabelAnnotation;

/// File name reports are written to inside the report directory.
pub const REPORT_FILE: &str = "select_by_labels_results.md";

/// Result of selecting sections by labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    /// Every selected label had to match, rather than any.
    pub intersection: bool,
    /// Full paths of the collapsed selection.
    pub labels: Vec<String>,
    /// Matching sections in document order.
    pub sections: Vec<ReportEntry>,
}

/// One matching section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportEntry {
    /// Heading anchor.
    pub anchor: String,
    /// Document holding the section.
    pub document: PathBuf,
    /// Heading text.
    pub heading: String,
    /// Label paths as written on the section.
    pub labels: Vec<String>,
}

impl Report {
    /// Assemble a report from a collapsed selection and its matches.
    pub fn new(tree: &LabelTree, selection: &[LabelId], intersection: bool, matches: &[LabelAnnotation]) -> Self {
        let sections = matches
            .iter()
            .map(|annotation| {
                return ReportEntry {
                    anchor: annotation.anchor(),
                    document: annotation.source.clone(),
                    heading: annotation.heading.clone(),
                    labels: annotation.label_paths().map(str::to_string).collect(),
                };
            })
            .collect();
        return Self {
            intersection,
            labels: selection.iter().map(|&id| return tree.full_path(id)).collect(),
            sections,
        };
    }

    /// Markdown report with links relative to `report_dir`.
    pub fn render_markdown(&self, report_dir: &Path) -> String {
        let mode = if self.intersection { "Intersection" } else { "Union" };
        let mut out = format!("# Select By Labels ({mode})\n\n");
        out.push_str("Labels:\n");
        for label in &self.labels {
            let _ = writeln!(out, "- {label}");
        }
        out.push_str("\n---\n\nRelated Sections:\n");
        for section in &self.sections {
            let relpath = paths::encode_path(&paths::relative_path(report_dir, &section.document));
            let file_name = section
                .document
                .file_name()
                .map_or_else(String::new, |name| return name.to_string_lossy().into_owned());
            let _ = writeln!(
                out,
                "- [{file_name}#{}]({relpath}#{}): {}",
                section.heading,
                section.anchor,
                section.labels.join(" | ")
            );
        }
        out.push('\n');
        return out;
    }

    /// Pretty JSON form of the report.
    ///
    /// # Errors
    ///
    /// Returns `Error::Serialize` if serialization fails.
    pub fn to_json(&self) -> Result<String, Error> {
        return Ok(serde_json::to_string_pretty(self)?);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "tests")]
mod tests {
    use super::*;
    use crate::types::LabelPathSpan;

    fn annotation(source: &str, heading: &str, labels: &[&str]) -> LabelAnnotation {
        return LabelAnnotation {
            heading: heading.to_string(),
            labels: labels
                .iter()
                .map(|path| {
                    return LabelPathSpan {
                        offset: 0,
                        path: (*path).to_string(),
                    };
                })
                .collect(),
            offset: 0,
            raw: String::new(),
            source: PathBuf::from(source),
        };
    }

    #[test]
    fn markdown_lists_labels_and_linked_sections() {
        let tree = LabelTree::parse("- Lang\n  - Rust\n").unwrap();
        let rust = tree.resolve("Rust").unwrap();
        let matches = vec![annotation("notes/my notes.md", "Getting Started", &["Rust", "Lang"])];
        let report = Report::new(&tree, &[rust], false, &matches);

        let text = report.render_markdown(Path::new(".report"));
        let expected = "# Select By Labels (Union)\n\nLabels:\n- Lang.Rust\n\n---\n\nRelated Sections:\n\
                        - [my notes.md#Getting Started](../notes/my%20notes.md#getting-started): Rust | Lang\n\n";
        assert_eq!(text, expected);
    }

    #[test]
    fn json_carries_mode_and_sections() {
        let tree = LabelTree::parse("- A\n").unwrap();
        let a = tree.resolve("A").unwrap();
        let report = Report::new(&tree, &[a], true, &[annotation("x.md", "H", &["A"])]);
        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(value["intersection"], true);
        assert_eq!(value["sections"][0]["anchor"], "h");
        assert_eq!(value["labels"][0], "A");
    }
}
