//! Owner of the live label tree and the operations that keep annotations
//! consistent with it: reload, rename, minimize and reports.

use std::path::{Path, PathBuf};

use parking_lot::RwLock;

use crate::edit::EditSet;
use crate::error::Error;
use crate::labels::{LabelId, LabelTree, validate_name};
use crate::manager::{IndexManager, rewrite_document_labels};
use crate::report::Report;

/// The live label tree plus the config text it was parsed from.
pub struct Taxonomy {
    /// Label tree config file, workspace-relative.
    config_path: PathBuf,
    /// Current text and tree, swapped together.
    state: RwLock<Loaded>,
}

/// A tree and its source text.
#[derive(Default)]
struct Loaded {
    /// Config text the tree came from.
    text: String,
    /// Parsed tree.
    tree: LabelTree,
}

impl Taxonomy {
    /// Workspace-relative path of the label tree config.
    pub fn config_path(&self) -> &Path {
        return &self.config_path;
    }

    /// Rewrite each label token of one document to its shortest unique path.
    ///
    /// # Errors
    ///
    /// Returns the indexing error for the document, or `Error::FileNotFound`
    /// when it vanished while being indexed.
    pub async fn minimize(&self, manager: &IndexManager, document: &Path) -> Result<EditSet, Error> {
        let index = manager.get(document).await?.ok_or_else(|| {
            return Error::FileNotFound {
                path: document.to_path_buf(),
            };
        })?;
        let tree = self.tree();
        let mut edits = EditSet::default();
        rewrite_document_labels(&index, &mut edits, &mut |token: &str| {
            return tree.resolve(token).map(|id| return tree.shortest_unique_path(id));
        });
        return Ok(edits);
    }

    /// Empty taxonomy whose config lives at `config_path`.
    pub fn new(config_path: PathBuf) -> Self {
        return Self {
            config_path,
            state: RwLock::new(Loaded::default()),
        };
    }

    /// Parse new config text and make it live.
    ///
    /// When both the old and the new tree have labels, every cached token that
    /// stops resolving to the same label is migrated to its shortest unique
    /// path in the new tree. Tokens whose label was deleted are left alone.
    ///
    /// # Errors
    ///
    /// Returns `Error::LabelParse` for malformed text. The live tree is cleared.
    pub fn reload(&self, manager: &IndexManager, text: &str) -> Result<EditSet, Error> {
        let tree = match LabelTree::parse(text) {
            Ok(tree) => tree,
            Err(e) => {
                *self.state.write() = Loaded::default();
                tracing::warn!(config = %self.config_path.display(), error = %e, "label tree cleared");
                return Err(e);
            },
        };

        let old = self.tree();
        let edits = if old.is_empty() || tree.is_empty() {
            EditSet::default()
        } else {
            manager.rewrite_labels(|token| return migrate_token(&old, &tree, token))
        };
        tracing::info!(labels = tree.len(), migrated = edits.len(), "label tree loaded");
        *self.state.write() = Loaded {
            text: text.to_string(),
            tree,
        };
        return Ok(edits);
    }

    /// Rename one label. Returns the edits for annotations and for the
    /// config line declaring the label; the live tree is updated immediately.
    ///
    /// Every cached token that would stop resolving to its label (tokens
    /// through the renamed label, tokens starting at a unique name the new
    /// name now shadows) is rewritten to its shortest unique path.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidLabelName`, `Error::LabelNotFound` or
    /// `Error::DuplicateLabel` from the rename itself.
    pub fn rename(&self, manager: &IndexManager, path: &str, new_name: &str) -> Result<EditSet, Error> {
        validate_name(new_name)?;
        let (old, text) = {
            let loaded = self.state.read();
            (loaded.tree.clone(), loaded.text.clone())
        };
        let id = old.resolve(path).ok_or_else(|| {
            return Error::LabelNotFound { path: path.to_string() };
        })?;
        let span = old
            .origin(id)
            .map(|origin| return origin.span.clone())
            .ok_or_else(|| return Error::LabelNotFound { path: path.to_string() })?;

        let mut renamed = old.clone();
        renamed.rename(path, new_name)?;

        // Arena ids survive an in-place rename, so old and new trees share them.
        let mut edits = manager.rewrite_labels(|token| {
            let target = old.resolve(token)?;
            if renamed.resolve(token) == Some(target) {
                return None;
            }
            return Some(renamed.shortest_unique_path(target));
        });

        let mut config_edit = EditSet::default();
        config_edit.replace(&self.config_path, span, new_name);
        let new_text = config_edit.apply(&self.config_path, &text)?;
        let tree = LabelTree::parse(&new_text)?;
        edits.extend(config_edit);

        tracing::info!(from = path, to = new_name, edits = edits.len(), "renamed label");
        *self.state.write() = Loaded { text: new_text, tree };
        return Ok(edits);
    }

    /// Select cached sections by dotted label paths.
    ///
    /// # Errors
    ///
    /// Returns `Error::LabelNotFound` for a path that does not resolve.
    pub fn report(&self, manager: &IndexManager, selection: &[String], intersection: bool) -> Result<Report, Error> {
        let tree = self.tree();
        let ids = selection
            .iter()
            .map(|path| {
                return tree.resolve(path).ok_or_else(|| return Error::LabelNotFound { path: path.clone() });
            })
            .collect::<Result<Vec<LabelId>, Error>>()?;
        let collapsed = tree.collapse_selection(&ids, intersection);
        let matches = manager.find_by_labels(&tree, &collapsed, intersection);
        return Ok(Report::new(&tree, &collapsed, intersection, &matches));
    }

    /// Copy of the live tree.
    pub fn tree(&self) -> LabelTree {
        return self.state.read().tree.clone();
    }
}

/// New text for a token after a reload, or `None` to keep it.
fn migrate_token(old: &LabelTree, new: &LabelTree, token: &str) -> Option<String> {
    let target = old.resolve(token)?;
    let full_path = old.full_path(target);
    let counterpart = new.resolve(&full_path)?;
    if new.resolve(token) == Some(counterpart) {
        return None;
    }
    return Some(new.shortest_unique_path(counterpart));
}
