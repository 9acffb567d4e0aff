//! Where document text comes from.
//!
//! The index never touches the filesystem directly. It reads through a
//! [`DocumentSource`], so the same engine runs over a real workspace
//! ([`FsSource`]) or over text held in memory ([`MemorySource`]).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use futures::FutureExt as _;
use futures::future::BoxFuture;
use parking_lot::RwLock;
use walkdir::WalkDir;

use crate::config::Config;
use crate::error::Error;
use crate::paths;

/// Supplies document text and answers existence questions.
/// Paths are workspace-relative and normalized.
pub trait DocumentSource: Send + Sync {
    /// Markdown documents at or below `dir`, sorted. An empty path means the whole workspace.
    fn documents_under(&self, dir: &Path) -> Vec<PathBuf>;

    /// Whether a file or directory exists at `path`.
    fn exists(&self, path: &Path) -> bool;

    /// Whether `path` names a directory.
    fn is_dir(&self, path: &Path) -> bool;

    /// Whether `path` is a markdown document this source indexes.
    fn is_document(&self, path: &Path) -> bool;

    /// Read the full text of one document.
    ///
    /// # Errors
    ///
    /// Returns `Error::FileNotFound` for a missing document and `Error::Io`
    /// for other read failures.
    fn read(&self, path: &Path) -> BoxFuture<'_, Result<String, Error>>;
}

/// Documents on disk below a workspace root.
#[derive(Debug, Clone)]
pub struct FsSource {
    /// Include/exclude filters for directory listings.
    config: Config,
    /// Workspace root every relative path is joined to.
    root: PathBuf,
}

impl FsSource {
    /// Absolute location of a workspace-relative path.
    pub fn absolute(&self, path: &Path) -> PathBuf {
        return self.root.join(path);
    }

    /// Source over `root`, listing only documents the config allows.
    pub fn new(root: PathBuf, config: Config) -> Self {
        return Self { config, root };
    }

    /// Workspace root.
    pub fn root(&self) -> &Path {
        return &self.root;
    }
}

impl DocumentSource for FsSource {
    fn documents_under(&self, dir: &Path) -> Vec<PathBuf> {
        let start = self.absolute(dir);
        let mut documents: Vec<PathBuf> = WalkDir::new(&start)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| return entry.file_type().is_file())
            .filter_map(|entry| return entry.path().strip_prefix(&self.root).ok().map(paths::normalize_path))
            .filter(|relative| return self.is_document(relative))
            .collect();
        documents.sort();
        return documents;
    }

    fn exists(&self, path: &Path) -> bool {
        return self.absolute(path).exists();
    }

    fn is_dir(&self, path: &Path) -> bool {
        return self.absolute(path).is_dir();
    }

    fn is_document(&self, path: &Path) -> bool {
        return paths::is_markdown(path) && self.config.should_scan(&path.to_string_lossy());
    }

    fn read(&self, path: &Path) -> BoxFuture<'_, Result<String, Error>> {
        let absolute = self.absolute(path);
        let relative = path.to_path_buf();
        return async move {
            return match tokio::fs::read_to_string(&absolute).await {
                Ok(text) => Ok(text),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(Error::FileNotFound { path: relative }),
                Err(e) => Err(e.into()),
            };
        }
        .boxed();
    }
}

/// Documents held in memory. Used by tests and by callers that own their buffers.
#[derive(Debug, Default)]
pub struct MemorySource {
    /// Document text keyed by path.
    files: RwLock<BTreeMap<PathBuf, String>>,
}

impl MemorySource {
    /// Add or replace a document.
    pub fn insert(&self, path: impl Into<PathBuf>, text: impl Into<String>) {
        self.files.write().insert(path.into(), text.into());
    }

    /// Drop a document. Returns its text if it existed.
    pub fn remove(&self, path: &Path) -> Option<String> {
        return self.files.write().remove(path);
    }

    /// Move every document at or below `old` to the same place below `new`.
    /// Works for a single file and for a directory. Returns how many documents moved.
    pub fn rename(&self, old: &Path, new: &Path) -> usize {
        let mut files = self.files.write();
        let moved: Vec<PathBuf> = files
            .keys()
            .filter(|path| return paths::remap_after_dir_move(path, old, new).is_some())
            .cloned()
            .collect();
        for path in &moved {
            if let Some(text) = files.remove(path)
                && let Some(target) = paths::remap_after_dir_move(path, old, new)
            {
                files.insert(target, text);
            }
        }
        return moved.len();
    }

    /// Current text of a document.
    pub fn text(&self, path: &Path) -> Option<String> {
        return self.files.read().get(path).cloned();
    }
}

impl DocumentSource for MemorySource {
    fn documents_under(&self, dir: &Path) -> Vec<PathBuf> {
        return self
            .files
            .read()
            .keys()
            .filter(|path| return self.is_document(path) && (dir.as_os_str().is_empty() || path.starts_with(dir)))
            .cloned()
            .collect();
    }

    fn exists(&self, path: &Path) -> bool {
        return self.files.read().contains_key(path) || self.is_dir(path);
    }

    fn is_dir(&self, path: &Path) -> bool {
        return self.files.read().keys().any(|file| return paths::is_within(file, path));
    }

    fn is_document(&self, path: &Path) -> bool {
        return paths::is_markdown(path);
    }

    fn read(&self, path: &Path) -> BoxFuture<'_, Result<String, Error>> {
        let result = self.text(path).ok_or_else(|| {
            return Error::FileNotFound {
                path: path.to_path_buf(),
            };
        });
        return futures::future::ready(result).boxed();
    }
}
