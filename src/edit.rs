/// Text edit batches produced by rewrites and applied per document.
use std::collections::BTreeMap;
use std::ops::Range;
use std::path::{Path, PathBuf};

use crate::error::Error;

/// Replace one byte range of a document with new text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    /// Byte range being replaced.
    pub range: Range<usize>,
    /// Text written in place of the range.
    pub replacement: String,
}

/// Edits grouped by document. Each document's edits are applied together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditSet {
    /// Edits keyed by document.
    edits: BTreeMap<PathBuf, Vec<TextEdit>>,
}

impl EditSet {
    /// Apply the edits for `path` to `text`, back to front so earlier
    /// offsets stay valid. Identical duplicate edits collapse into one.
    ///
    /// # Errors
    ///
    /// Returns `Error::EditConflict` when two distinct edits overlap or an
    /// edit falls outside `text` or off a character boundary.
    pub fn apply(&self, path: &Path, text: &str) -> Result<String, Error> {
        let mut edits: Vec<&TextEdit> = self.edits_for(path).iter().collect();
        edits.sort_by(|a, b| return b.range.start.cmp(&a.range.start).then(b.range.end.cmp(&a.range.end)));
        edits.dedup();

        let mut result = text.to_string();
        let mut floor = text.len();
        for edit in edits {
            let Range { start, end } = edit.range;
            let in_bounds = start <= end && end <= floor;
            if !in_bounds || !result.is_char_boundary(start) || !result.is_char_boundary(end) {
                return Err(Error::EditConflict {
                    offset: start,
                    path: path.to_path_buf(),
                });
            }
            result.replace_range(start..end, &edit.replacement);
            floor = start;
        }
        return Ok(result);
    }

    /// Documents with at least one edit, in path order.
    pub fn documents(&self) -> impl Iterator<Item = &Path> {
        return self.edits.keys().map(PathBuf::as_path);
    }

    /// Edits recorded for one document, in insertion order.
    pub fn edits_for(&self, path: &Path) -> &[TextEdit] {
        return self.edits.get(path).map_or(&[], Vec::as_slice);
    }

    /// Move every edit from `other` into this set.
    pub fn extend(&mut self, other: Self) {
        for (path, edits) in other.edits {
            self.edits.entry(path).or_default().extend(edits);
        }
    }

    /// True when no document has edits.
    pub fn is_empty(&self) -> bool {
        return self.edits.is_empty();
    }

    /// Total number of edits across documents.
    pub fn len(&self) -> usize {
        return self.edits.values().map(Vec::len).sum();
    }

    /// Record a replacement of `range` in `path`.
    pub fn replace(&mut self, path: &Path, range: Range<usize>, replacement: impl Into<String>) {
        self.edits.entry(path.to_path_buf()).or_default().push(TextEdit {
            range,
            replacement: replacement.into(),
        });
    }

    /// Move the edits for one document out of the set.
    pub fn take(&mut self, path: &Path) -> Vec<TextEdit> {
        return self.edits.remove(path).unwrap_or_default();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "tests")]
mod tests {
    use super::*;

    #[test]
    fn applies_back_to_front() {
        let path = Path::new("a.md");
        let mut edits = EditSet::default();
        edits.replace(path, 0..3, "one");
        edits.replace(path, 8..11, "three");
        assert_eq!(edits.apply(path, "aaa bbb ccc").unwrap(), "one bbb three");
    }

    #[test]
    fn rejects_overlapping_edits() {
        let path = Path::new("a.md");
        let mut edits = EditSet::default();
        edits.replace(path, 0..5, "x");
        edits.replace(path, 3..7, "y");
        assert!(matches!(edits.apply(path, "0123456789"), Err(Error::EditConflict { .. })));
    }

    #[test]
    fn identical_edits_collapse() {
        let path = Path::new("a.md");
        let mut edits = EditSet::default();
        edits.replace(path, 2..4, "zz");
        edits.replace(path, 2..4, "zz");
        assert_eq!(edits.apply(path, "abcdef").unwrap(), "abzzef");
    }

    #[test]
    fn merged_sets_keep_both_documents() {
        let mut first = EditSet::default();
        first.replace(Path::new("a.md"), 0..1, "x");
        let mut second = EditSet::default();
        second.replace(Path::new("b.md"), 0..1, "y");
        first.extend(second);
        assert_eq!(first.len(), 2);
        assert_eq!(first.documents().count(), 2);
        assert!(first.edits_for(Path::new("c.md")).is_empty());
        assert_eq!(first.take(Path::new("a.md")).len(), 1);
        assert_eq!(first.documents().collect::<Vec<_>>(), vec![Path::new("b.md")]);
    }
}
