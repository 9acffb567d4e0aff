//! One workspace on disk: config, index, label tree and rewriter wired
//! together, plus writing edit sets back to files.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::Config;
use crate::diagnostics;
use crate::edit::EditSet;
use crate::error::Error;
use crate::manager::IndexManager;
use crate::paths;
use crate::report::{REPORT_FILE, Report};
use crate::rewriter::ReferenceRewriter;
use crate::source::{DocumentSource as _, FsSource};
use crate::taxonomy::Taxonomy;
use crate::types::Diagnostic;

/// Services for one workspace root, created once and shared by commands.
pub struct Workspace {
    /// Loaded `.noteref.toml`.
    pub config: Config,
    /// Document index.
    pub manager: IndexManager,
    /// Move and heading-rename handling.
    pub rewriter: ReferenceRewriter,
    /// Disk access below the root.
    pub source: Arc<FsSource>,
    /// Live label tree.
    pub taxonomy: Taxonomy,
}

impl Workspace {
    /// Write every document in `edits` back to disk and re-index the
    /// markdown ones. Each document is applied on its own; a failure is
    /// reported and the rest still written.
    pub async fn apply(&self, edits: &EditSet) -> Vec<(PathBuf, Error)> {
        let mut failures = Vec::new();
        let mut reindex = Vec::new();
        for document in edits.documents() {
            match self.apply_document(edits, document).await {
                Ok(()) => {
                    if self.source.is_document(document) {
                        reindex.push(self.manager.invalidate(document));
                    }
                },
                Err(e) => {
                    tracing::warn!(path = %document.display(), error = %e, "could not apply edits");
                    failures.push((document.to_path_buf(), e));
                },
            }
        }
        for handle in reindex {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "re-index task failed");
            }
        }
        tracing::info!(documents = edits.documents().count(), edits = edits.len(), "applied edits");
        return failures;
    }

    /// Read, edit and write one document.
    async fn apply_document(&self, edits: &EditSet, document: &Path) -> Result<(), Error> {
        let absolute = self.source.absolute(document);
        let text = tokio::fs::read_to_string(&absolute).await?;
        let updated = edits.apply(document, &text)?;
        if updated != text {
            tokio::fs::write(&absolute, updated).await?;
        }
        return Ok(());
    }

    /// Diagnostics for every cached document, in document order.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        let tree = self.taxonomy.tree();
        return self
            .manager
            .snapshot()
            .iter()
            .flat_map(|index| return diagnostics::diagnose(index, &tree, self.source.as_ref()))
            .collect();
    }

    /// Whether `path` exists below the root.
    pub fn exists(&self, path: &Path) -> bool {
        return self.source.exists(path);
    }

    /// Load the label tree config into the taxonomy. A missing file yields
    /// an empty tree. Returns the migration edits of the reload.
    ///
    /// # Errors
    ///
    /// Returns `Error::LabelParse` for a malformed tree or the read error.
    pub async fn load_labels(&self) -> Result<EditSet, Error> {
        let path = self.source.absolute(self.taxonomy.config_path());
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no label tree config");
                String::new()
            },
            Err(e) => return Err(e.into()),
        };
        return self.taxonomy.reload(&self.manager, &text);
    }

    /// Wire up the services for the workspace at `root`.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigInvalid` for a malformed `.noteref.toml`, or
    /// `Error::Pattern` if a fixed pattern fails to compile.
    pub fn open(root: &Path) -> Result<Self, Error> {
        let config = Config::load(root)?;
        let source = Arc::new(FsSource::new(root.to_path_buf(), config.clone()));
        let manager = IndexManager::new(source.clone(), &config)?;
        let rewriter = ReferenceRewriter::new(manager.clone())?;
        let taxonomy = Taxonomy::new(paths::normalize_path(&config.labels));
        return Ok(Self {
            config,
            manager,
            rewriter,
            source,
            taxonomy,
        });
    }

    /// Current text of a workspace file, if readable.
    pub fn read_text(&self, path: &Path) -> Option<String> {
        return std::fs::read_to_string(self.source.absolute(path)).ok();
    }

    /// Index every markdown document. Returns per-document failures.
    pub async fn scan(&self) -> Vec<(PathBuf, Error)> {
        let failures = self.manager.index_under(Path::new("")).await;
        for (path, e) in &failures {
            tracing::warn!(path = %path.display(), error = %e, "document not indexed");
        }
        return failures;
    }

    /// Write the markdown form of `report` into the report directory.
    /// Returns the workspace-relative path written.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the directory or file cannot be written.
    pub async fn write_report(&self, report: &Report) -> Result<PathBuf, Error> {
        let dir = paths::normalize_path(&self.config.report_dir);
        tokio::fs::create_dir_all(self.source.absolute(&dir)).await?;
        let path = dir.join(REPORT_FILE);
        tokio::fs::write(self.source.absolute(&path), report.render_markdown(&dir)).await?;
        tracing::info!(path = %path.display(), sections = report.sections.len(), "wrote label report");
        return Ok(path);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, reason = "tests")]
mod tests {
    use super::*;

    fn write(root: &Path, path: &str, text: &str) {
        let path = root.join(path);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, text).unwrap();
    }

    #[tokio::test]
    async fn applied_edits_reach_disk_and_the_index() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.md", "[b](b.md)\n");
        write(dir.path(), "b.md", "# B\n");
        let workspace = Workspace::open(dir.path()).unwrap();
        assert!(workspace.scan().await.is_empty());

        let edits = workspace
            .manager
            .rewrite_after_move(Path::new("b.md"), None, Path::new("c.md"), None);
        assert!(workspace.apply(&edits).await.is_empty());

        assert_eq!(std::fs::read_to_string(dir.path().join("a.md")).unwrap(), "[b](c.md)\n");
        let index = workspace.manager.cached(Path::new("a.md")).unwrap();
        assert_eq!(index.references[0].target, PathBuf::from("c.md"));
    }

    #[tokio::test]
    async fn missing_label_config_leaves_an_empty_tree() {
        let dir = tempfile::tempdir().unwrap();
        let workspace = Workspace::open(dir.path()).unwrap();
        assert!(workspace.load_labels().await.unwrap().is_empty());
        assert!(workspace.taxonomy.tree().is_empty());
    }

    #[tokio::test]
    async fn report_lands_in_report_dir() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "labels.tree", "- Topic\n");
        write(dir.path(), "n.md", "# Sec\n<attr labels=\"Topic\"></attr>\n");
        let workspace = Workspace::open(dir.path()).unwrap();
        workspace.scan().await;
        workspace.load_labels().await.unwrap();

        let report = workspace.taxonomy.report(&workspace.manager, &["Topic".to_string()], false).unwrap();
        let written = workspace.write_report(&report).await.unwrap();
        assert_eq!(written, PathBuf::from(".report/select_by_labels_results.md"));
        let text = std::fs::read_to_string(dir.path().join(written)).unwrap();
        assert!(text.contains("- [n.md#Sec](../n.md#sec): Topic"));
    }
}
