//! Keeps references intact when documents move or headings are renamed.

use std::path::{Path, PathBuf};

use regex::Regex;

use crate::document::DocumentIndex;
use crate::edit::EditSet;
use crate::error::Error;
use crate::manager::IndexManager;
use crate::paths;
use crate::types::{slugify, with_fragment};

/// Edits produced by one move.
#[derive(Debug, Default)]
pub struct MoveOutcome {
    /// Documents that could not be re-indexed at their new location.
    pub failures: Vec<(PathBuf, Error)>,
    /// Rewrites of references inside the moved documents.
    pub inner: EditSet,
    /// Moved documents at their new location.
    pub moved: Vec<PathBuf>,
    /// Rewrites of references elsewhere that pointed at the old location.
    pub outer: EditSet,
}

/// Reacts to moves and heading renames with reference rewrites.
pub struct ReferenceRewriter {
    /// ATX heading lines.
    heading: Regex,
    /// Shared index.
    manager: IndexManager,
}

impl ReferenceRewriter {
    /// Rewriter over `manager`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Pattern` if the heading pattern fails to compile.
    pub fn new(manager: IndexManager) -> Result<Self, Error> {
        return Ok(Self {
            heading: Regex::new(r"(?m)^#+[ \t]+([^\r\n]*?)[ \t]*\r?$")?,
            manager,
        });
    }

    /// Handle a file or directory that moved from `old` to `new`.
    ///
    /// The move has already happened in the source. Stale entries are purged,
    /// the moved documents re-indexed, and two independent edit sets built:
    /// one for references inside the moved documents and one for references
    /// elsewhere.
    pub async fn on_move(&self, old: &Path, new: &Path) -> MoveOutcome {
        let old = paths::normalize_path(old);
        let new = paths::normalize_path(new);
        let is_dir = self.manager.source().is_dir(&new);

        let mut outcome = MoveOutcome::default();
        if is_dir {
            self.manager.remove_under(&old);
            outcome.failures = self.manager.index_under(&new).await;
            outcome.moved = self.manager.source().documents_under(&new);
        } else {
            self.manager.remove(&old);
            if self.manager.source().is_document(&new) {
                if let Err(e) = self.manager.index(&new).await {
                    outcome.failures.push((new.clone(), e));
                }
                outcome.moved.push(new.clone());
            }
        }
        for (path, e) in &outcome.failures {
            tracing::warn!(path = %path.display(), error = %e, "moved document could not be indexed");
        }

        for document in &outcome.moved {
            if let Some(index) = self.manager.cached(document) {
                rewrite_moved_document(&index, &mut outcome.inner, &old, &new, is_dir);
            }
        }

        outcome.outer = self.manager.rewrite_after_move(&old, None, &new, None);
        for document in &outcome.moved {
            outcome.outer.take(document);
        }

        tracing::info!(
            from = %old.display(),
            to = %new.display(),
            moved = outcome.moved.len(),
            inner = outcome.inner.len(),
            outer = outcome.outer.len(),
            "processed move"
        );
        return outcome;
    }

    /// Rename a heading of `document`, along with every reference to its anchor.
    ///
    /// # Errors
    ///
    /// Returns `Error::HeadingNotFound` when no heading has the text `old`,
    /// or the read error for the document.
    pub async fn rename_heading(&self, document: &Path, old: &str, new: &str) -> Result<EditSet, Error> {
        let document = paths::normalize_path(document);
        let text = self.manager.source().read(&document).await?;

        let heading = self
            .heading
            .captures_iter(&text)
            .filter_map(|cap| return cap.get(1))
            .find(|m| return m.as_str().trim() == old.trim())
            .ok_or_else(|| {
                return Error::HeadingNotFound {
                    heading: old.to_string(),
                    path: document.clone(),
                };
            })?;

        let mut edits = EditSet::default();
        edits.replace(&document, heading.range(), new.trim());

        let old_id = slugify(old);
        let new_id = slugify(new);
        if old_id != new_id {
            edits.extend(self.manager.rewrite_after_move(&document, Some(&old_id), &document, Some(&new_id)));
            let local = Regex::new(&format!(r"\[[^\[\]]*\]\(#({})\)", regex::escape(&old_id)))?;
            for cap in local.captures_iter(&text) {
                if let Some(id) = cap.get(1) {
                    edits.replace(&document, id.range(), new_id.clone());
                }
            }
        }
        tracing::info!(path = %document.display(), from = old, to = new, edits = edits.len(), "renamed heading");
        return Ok(edits);
    }
}

/// Rewrite the references of one moved document as seen from its new place.
///
/// Each reference is resolved against the document's old directory. Targets
/// that moved along with a directory keep their relative text; everything
/// else gets a fresh relative path from the new location.
fn rewrite_moved_document(index: &DocumentIndex, edits: &mut EditSet, old: &Path, new: &Path, is_dir: bool) {
    let document = &index.path;
    let old_document = paths::remap_after_dir_move(document, new, old).unwrap_or_else(|| return old.to_path_buf());
    for reference in &index.references {
        let relpath = reference.relpath.replace('\\', "/");
        let Some(old_target) = paths::resolve_relpath(paths::parent_dir(&old_document), &relpath) else {
            continue;
        };
        let text = if is_dir && (old_target == old || paths::is_within(&old_target, old)) {
            paths::encode_path(&with_fragment(&reference.relpath, reference.fragment.as_deref()))
        } else {
            let target = paths::remap_after_dir_move(&old_target, old, new).unwrap_or(old_target);
            reference.encoded_relpath_from(document, &target)
        };
        edits.replace(document, reference.span(), text);
    }
}
