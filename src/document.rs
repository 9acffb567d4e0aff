//! Per-document index: the references and label annotations of one snapshot.

use std::path::{Path, PathBuf};

use crate::edit::EditSet;
use crate::extractor::Extractor;
use crate::paths;
use crate::types::{ContentDigest, LabelAnnotation, Reference, with_fragment};

/// Records extracted from exactly one document as of one extraction pass.
/// Read-only after construction; cross-document lookups compare resolved
/// targets by value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentIndex {
    /// Heading label blocks in document order.
    pub annotations: Vec<LabelAnnotation>,
    /// Digest of the text the index was built from.
    pub digest: ContentDigest,
    /// Normalized identity of the document.
    pub path: PathBuf,
    /// Local references in document order.
    pub references: Vec<Reference>,
}

impl DocumentIndex {
    /// Annotation whose block covers byte `offset`, if any.
    pub fn annotation_at(&self, offset: usize) -> Option<&LabelAnnotation> {
        return self.annotations.iter().find(|annotation| {
            let end = annotation.offset.saturating_add(annotation.raw.len());
            return (annotation.offset..end).contains(&offset);
        });
    }

    /// Extract `text` as the content of `path`.
    pub fn build(path: &Path, text: &str, extractor: &Extractor) -> Self {
        let extraction = extractor.extract(path, text);
        return Self {
            annotations: extraction.annotations,
            digest: ContentDigest::of(text),
            path: path.to_path_buf(),
            references: extraction.references,
        };
    }

    /// Reference whose rewritable span covers byte `offset`, if any.
    pub fn reference_at(&self, offset: usize) -> Option<&Reference> {
        return self.references.iter().find(|reference| return reference.span().contains(&offset));
    }

    /// References whose resolved target is exactly `target`.
    pub fn references_to<'a>(&'a self, target: &'a Path) -> impl Iterator<Item = &'a Reference> {
        return self.references.iter().filter(move |reference| return reference.target == target);
    }

    /// References to `target` or to anything inside it when it is a directory.
    /// With a fragment filter only references carrying exactly that fragment
    /// match; without one any fragment matches, including none.
    pub fn references_under<'a>(
        &'a self,
        target: &'a Path,
        fragment: Option<&'a str>,
    ) -> impl Iterator<Item = &'a Reference> {
        return self.references.iter().filter(move |reference| {
            let in_target = reference.target == target || paths::is_within(&reference.target, target);
            let fragment_matches = fragment.is_none_or(|id| return reference.fragment.as_deref() == Some(id));
            return in_target && fragment_matches;
        });
    }

    /// Emit edits retargeting every reference under `old_target` to `new_target`.
    ///
    /// References inside a moved directory follow the directory mapping.
    /// `new_fragment` replaces the fragment when given, otherwise each
    /// reference keeps its own. Returns how many references were rewritten.
    pub fn rewrite_references_to(
        &self,
        edits: &mut EditSet,
        old_target: &Path,
        old_fragment: Option<&str>,
        new_target: &Path,
        new_fragment: Option<&str>,
    ) -> usize {
        let mut rewritten: usize = 0;
        for reference in self.references_under(old_target, old_fragment) {
            let target = paths::remap_after_dir_move(&reference.target, old_target, new_target)
                .unwrap_or_else(|| return new_target.to_path_buf());
            let relpath = paths::relative_path_from_file(&reference.source, &target);
            let fragment = new_fragment.or(reference.fragment.as_deref());
            let text = paths::encode_path(&with_fragment(&relpath, fragment));
            tracing::debug!(source = %reference.source.display(), %text, "rewriting reference");
            edits.replace(&reference.source, reference.span(), text);
            rewritten = rewritten.saturating_add(1);
        }
        return rewritten;
    }
}
