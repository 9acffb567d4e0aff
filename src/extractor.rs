use std::path::Path;

use regex::{Captures, Regex};

use crate::error::Error;
use crate::paths;
use crate::types::{LabelAnnotation, LabelPathSpan, Reference};

/// Path separators accepted inside reference text.
const SEP: &str = r"[/\\]";

/// Characters allowed in a path segment, excluding `.`.
const CHAR: &str = r"\w%\-\x{80}-\x{D7FF}\x{E000}-\x{10FFFF}";

/// Scanned records for one document snapshot, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    /// Heading label blocks.
    pub annotations: Vec<LabelAnnotation>,
    /// Local references.
    pub references: Vec<Reference>,
}

/// Lexical scanner for references and label annotations.
/// Patterns are compiled once and shared by every extraction.
#[derive(Debug, Clone)]
pub struct Extractor {
    /// Heading followed by an inline `<attr>` block.
    annotation: Regex,
    /// The `labels="..."` attribute inside an annotation.
    labels: Regex,
    /// `src="path"` and `[text](path)` markers.
    reference: Regex,
}

impl Extractor {
    /// Scan `text`, the content of document `source`.
    /// Bad matches are logged and skipped; extraction never aborts on one record.
    pub fn extract(&self, source: &Path, text: &str) -> Extraction {
        let references = self
            .reference
            .captures_iter(text)
            .filter_map(|cap| return reference_from_capture(&cap, source))
            .collect();
        let annotations = self
            .annotation
            .captures_iter(text)
            .filter_map(|cap| return self.annotation_from_capture(&cap, source))
            .collect();
        return Extraction {
            annotations,
            references,
        };
    }

    /// Compile the fixed patterns.
    ///
    /// # Errors
    ///
    /// Returns `Error::Pattern` if a pattern fails to compile.
    pub fn new() -> Result<Self, Error> {
        let dotchar = format!(r"{CHAR}\.");
        let name = format!(r"(?:[{dotchar}]*[{CHAR}]+|\.{{1,2}})");
        let reference = format!(
            r#"(?:src=['"]|\[[^\[\]]*\]\()((?:(?:\.{{1,2}}|{name}){SEP})*(?:{name}(?:\.\w+|{SEP})?))(?:#([{dotchar}]+))?['")]"#
        );
        return Ok(Self {
            annotation: Regex::new(r"(?im)^#+[ \t]+([^\r\n]+)\r?\n(?:\r?\n)*(<attr\b([^>]*)>.*?</attr>)")?,
            labels: Regex::new(r#"labels="([^"]*)""#)?,
            reference: Regex::new(&reference)?,
        });
    }

    /// Build one annotation record from a heading/attr match.
    fn annotation_from_capture(&self, cap: &Captures<'_>, source: &Path) -> Option<LabelAnnotation> {
        let heading = cap.get(1)?;
        let block = cap.get(2)?;
        let raw = block.as_str();
        return Some(LabelAnnotation {
            heading: heading.as_str().trim().to_string(),
            labels: self.label_paths(raw),
            offset: block.start(),
            raw: raw.to_string(),
            source: source.to_path_buf(),
        });
    }

    /// Split the `labels` attribute on `;`, keeping the exact offset of each
    /// trimmed, non-empty token relative to the annotation start.
    fn label_paths(&self, raw: &str) -> Vec<LabelPathSpan> {
        let Some(value) = self.labels.captures(raw).and_then(|cap| return cap.get(1)) else {
            return Vec::new();
        };
        let mut spans = Vec::new();
        let mut start = value.start();
        for token in value.as_str().split(';') {
            let trimmed = token.trim();
            if !trimmed.is_empty() {
                let leading = token.len().saturating_sub(token.trim_start().len());
                spans.push(LabelPathSpan {
                    offset: start.saturating_add(leading),
                    path: trimmed.to_string(),
                });
            }
            start = start.saturating_add(token.len()).saturating_add(1);
        }
        return spans;
    }
}

/// Build one reference from a path match, or `None` when the match names no
/// resolvable resource.
fn reference_from_capture(cap: &Captures<'_>, source: &Path) -> Option<Reference> {
    let path = cap.get(1)?;
    let fragment = cap.get(2);
    let raw = path.as_str();

    if raw.ends_with(['/', '\\']) {
        tracing::debug!(source = %source.display(), raw, "skipping reference ending in a separator");
        return None;
    }
    let Some(relpath) = paths::decode_path(raw) else {
        tracing::warn!(source = %source.display(), raw, "skipping reference with undecodable path");
        return None;
    };
    let Some(target) = paths::resolve_relpath(paths::parent_dir(source), &relpath.replace('\\', "/")) else {
        tracing::warn!(source = %source.display(), raw, "skipping absolute reference");
        return None;
    };

    let end = fragment.map_or(path.end(), |m| return m.end());
    return Some(Reference {
        fragment: fragment.map(|m| return m.as_str().to_string()),
        length: end.saturating_sub(path.start()),
        offset: path.start(),
        relpath,
        source: source.to_path_buf(),
        target,
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, reason = "tests")]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn extract(source: &str, text: &str) -> Extraction {
        return Extractor::new().unwrap().extract(Path::new(source), text);
    }

    #[test]
    fn link_reference_resolves_against_document_directory() {
        let text = "See [x](a/b.md#sec) here.";
        let found = extract("docs/n.md", text);
        assert_eq!(found.references.len(), 1);
        let reference = &found.references[0];
        assert_eq!(reference.target, PathBuf::from("docs/a/b.md"));
        assert_eq!(reference.fragment.as_deref(), Some("sec"));
        assert_eq!(&text[reference.span()], "a/b.md#sec");
        assert_eq!(reference.encoded_relpath_from(Path::new("docs/n.md"), &reference.target), "a/b.md#sec");
    }

    #[test]
    fn src_attribute_and_percent_decoding() {
        let text = r#"<img src="../img/my%20pic.png"> and ![p](pics/%E5%9B%BE.png)"#;
        let found = extract("docs/n.md", text);
        let targets: Vec<_> = found.references.iter().map(|r| return r.target.clone()).collect();
        assert_eq!(targets, vec![PathBuf::from("img/my pic.png"), PathBuf::from("docs/pics/图.png")]);
        assert_eq!(&text[found.references[0].span()], "../img/my%20pic.png");
    }

    #[test]
    fn astral_plane_characters_stay_in_paths() {
        let text = "[e](notes/\u{1F600}.md) [f](\u{20000}/b.md#k)";
        let found = extract("n.md", text);
        let targets: Vec<_> = found.references.iter().map(|r| return r.target.clone()).collect();
        assert_eq!(targets, vec![
            PathBuf::from("notes/\u{1F600}.md"),
            PathBuf::from("\u{20000}/b.md")
        ]);
    }

    #[test]
    fn skips_urls_absolute_paths_and_trailing_separators() {
        let text = "[a](https://example.com/x.md) [b](/etc/x.md) [c](dir/) [d](dir/ok.md)";
        let found = extract("n.md", text);
        assert_eq!(found.references.len(), 1);
        assert_eq!(found.references[0].relpath, "dir/ok.md");
    }

    #[test]
    fn annotation_offsets_point_at_each_token() {
        let text = "# Intro\n\n<attr labels=\"Alpha.One; Beta ;;Gamma\"></attr>\nbody\n";
        let found = extract("n.md", text);
        assert_eq!(found.annotations.len(), 1);
        let annotation = &found.annotations[0];
        assert_eq!(annotation.heading, "Intro");
        let paths: Vec<&str> = annotation.label_paths().collect();
        assert_eq!(paths, vec!["Alpha.One", "Beta", "Gamma"]);
        for label in &annotation.labels {
            assert_eq!(&text[annotation.span_of(label)], label.path);
        }
    }

    #[test]
    fn extraction_is_deterministic() {
        let text = "# H\n<attr labels=\"A\"></attr>\n[x](y.md) [z](../w.md#k)\n";
        assert_eq!(extract("d/n.md", text), extract("d/n.md", text));
    }
}
