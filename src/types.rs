/// Core domain types: references, label annotations, digests, and diagnostics.
use std::ops::Range;
use std::path::{Path, PathBuf};

use serde::Serialize;
use sha2::{Digest as _, Sha256};

use crate::paths;

/// SHA-256 of the text a document index was built from, 64 lowercase hex chars.
/// Newtype prevents mixing with arbitrary strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ContentDigest(
    /// The hex-encoded digest.
    pub String,
);

impl ContentDigest {
    /// Digest of a document's full text.
    pub fn of(text: &str) -> Self {
        let hash = Sha256::digest(text.as_bytes());
        return Self(format!("{hash:x}"));
    }
}

/// A problem found in one document, ready for an editor or the CLI to show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Document the diagnostic belongs to.
    pub document: PathBuf,
    /// Human-readable description.
    pub message: String,
    /// Byte range of the offending text.
    pub range: Range<usize>,
    /// How serious the problem is.
    pub severity: Severity,
}

/// A heading's inline `<attr labels="...">` block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelAnnotation {
    /// Text of the heading the block is attached to.
    pub heading: String,
    /// Label paths in the order they appear.
    pub labels: Vec<LabelPathSpan>,
    /// Byte offset of the block in the document.
    pub offset: usize,
    /// The whole `<attr ...>...</attr>` text.
    pub raw: String,
    /// Document containing the block.
    pub source: PathBuf,
}

impl LabelAnnotation {
    /// Heading anchor as used in `file.md#anchor` references.
    pub fn anchor(&self) -> String {
        return slugify(&self.heading);
    }

    /// The label path strings, without offsets.
    pub fn label_paths(&self) -> impl Iterator<Item = &str> {
        return self.labels.iter().map(|label| return label.path.as_str());
    }

    /// Byte range of one label path in the whole document.
    pub fn span_of(&self, label: &LabelPathSpan) -> Range<usize> {
        let start = self.offset.saturating_add(label.offset);
        return start..start.saturating_add(label.path.len());
    }
}

/// One label path inside an annotation and where it sits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelPathSpan {
    /// Byte offset of the path relative to the annotation start.
    pub offset: usize,
    /// The trimmed dotted label path.
    pub path: String,
}

/// A local reference parsed from `src="..."` or `[text](path)` syntax.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reference {
    /// Heading anchor after `#`, if any.
    pub fragment: Option<String>,
    /// Byte length of the rewritable text, including any `#fragment`.
    pub length: usize,
    /// Byte offset of the path text in the source document.
    pub offset: usize,
    /// Percent-decoded path text as written.
    pub relpath: String,
    /// Document containing this reference.
    pub source: PathBuf,
    /// Normalized identity the path resolves to.
    pub target: PathBuf,
}

impl Reference {
    /// Encoded reference text pointing at `target` as seen from `from_file`,
    /// keeping this reference's fragment.
    pub fn encoded_relpath_from(&self, from_file: &Path, target: &Path) -> String {
        let relpath = paths::relative_path_from_file(from_file, target);
        return paths::encode_path(&with_fragment(&relpath, self.fragment.as_deref()));
    }

    /// Byte range covering the full rewritable text.
    pub fn span(&self) -> Range<usize> {
        return self.offset..self.offset.saturating_add(self.length);
    }
}

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// The document is broken.
    Error,
    /// Something the author should look at.
    Warning,
}

/// Convert heading text to its anchor.
/// Trims, lowercases, turns whitespace into `-`, then drops punctuation and
/// non-letter characters outside ASCII. Idempotent.
pub fn slugify(text: &str) -> String {
    const DROPPED: &str = "\\`*+~.()'\"!?:@[]{}<>^$|#%&=";
    let mut result = String::with_capacity(text.len());
    for c in text.trim().to_lowercase().chars() {
        if c.is_whitespace() {
            result.push('-');
            continue;
        }
        if DROPPED.contains(c) {
            continue;
        }
        if !c.is_ascii() && !c.is_alphabetic() {
            continue;
        }
        result.push(c);
    }
    return result;
}

/// Append `#fragment` when present.
pub fn with_fragment(path: &str, fragment: Option<&str>) -> String {
    return match fragment {
        None => path.to_string(),
        Some(id) => format!("{path}#{id}"),
    };
}
