//! Workspace-wide registry of document indexes.
//!
//! Each document moves through Absent, Pending and Cached. One recompute per
//! document runs at a time; late callers await the in-flight computation
//! through a [`Shared`] future instead of starting another. A per-document
//! change counter detects edits that land while extraction runs: the stale
//! result is discarded and extraction retried, up to a fixed attempt budget.
//!
//! The state lock is never held across an await.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::FutureExt as _;
use futures::future::{BoxFuture, Shared, join_all};
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::document::DocumentIndex;
use crate::edit::EditSet;
use crate::error::Error;
use crate::extractor::Extractor;
use crate::labels::{LabelId, LabelTree};
use crate::paths;
use crate::source::DocumentSource;
use crate::types::LabelAnnotation;

/// Capacity of the index event channel. Slow subscribers see `Lagged`.
const EVENT_CAPACITY: usize = 256;

/// Outcome of one index call. `Ok(None)` means the document was removed
/// while it was being indexed.
pub type IndexResult = Result<Option<Arc<DocumentIndex>>, Error>;

/// In-flight recompute shared by every caller awaiting it.
type PendingIndex = Shared<BoxFuture<'static, IndexResult>>;

/// Announced whenever the set of cached documents changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexEvent {
    /// A fresh index was stored for the document.
    Cached(PathBuf),
    /// The document's entry was dropped.
    Removed(PathBuf),
}

/// Cheap-to-clone handle to the shared registry.
#[derive(Clone)]
pub struct IndexManager {
    /// Shared state and collaborators.
    inner: Arc<Inner>,
}

/// Everything the handle and its spawned tasks share.
struct Inner {
    /// Documents indexed concurrently per batch.
    batch_size: usize,
    /// Cache change notifications.
    events: broadcast::Sender<IndexEvent>,
    /// Compiled patterns.
    extractor: Extractor,
    /// Attempt budget for one `index()` call.
    max_attempts: u32,
    /// Where document text comes from.
    source: Arc<dyn DocumentSource>,
    /// The only mutable shared state.
    state: Mutex<State>,
}

/// Bookkeeping for one in-flight recompute.
struct Pending {
    /// The shared computation.
    task: PendingIndex,
    /// Identifies which recompute owns the entry.
    ticket: u64,
}

/// Maps keyed by normalized document identity.
#[derive(Default)]
struct State {
    /// Cached indexes.
    caches: HashMap<PathBuf, Arc<DocumentIndex>>,
    /// Change counters, bumped on every change notification.
    counters: HashMap<PathBuf, u64>,
    /// Ticket handed to the next recompute.
    next_ticket: u64,
    /// In-flight recomputes.
    pending: HashMap<PathBuf, Pending>,
}

impl State {
    /// Whether the recompute holding `ticket` still owns the pending entry.
    fn owns(&self, path: &Path, ticket: u64) -> bool {
        return self.pending.get(path).is_some_and(|pending| return pending.ticket == ticket);
    }

    /// Drop every trace of a document.
    fn purge(&mut self, path: &Path) -> bool {
        let cached = self.caches.remove(path).is_some();
        let counted = self.counters.remove(path).is_some();
        let pending = self.pending.remove(path).is_some();
        return cached || counted || pending;
    }
}

/// What one extraction attempt decided.
enum Settled {
    /// The call is finished with this result.
    Done(IndexResult),
    /// The document changed during extraction; try again.
    Stale,
}

impl IndexManager {
    /// Cached index for a document without waiting on any computation.
    pub fn cached(&self, path: &Path) -> Option<Arc<DocumentIndex>> {
        return self.inner.state.lock().caches.get(&paths::normalize_path(path)).cloned();
    }

    /// Join the in-flight recompute for `path`, or start a new one.
    fn claim(&self, path: &Path) -> PendingIndex {
        let mut state = self.inner.state.lock();
        if let Some(pending) = state.pending.get(path) {
            tracing::debug!(path = %path.display(), "joining in-flight index");
            return pending.task.clone();
        }
        state.caches.remove(path);
        state.counters.entry(path.to_path_buf()).or_insert(0);
        let ticket = state.next_ticket;
        state.next_ticket = ticket.wrapping_add(1);
        let task = recompute(Arc::clone(&self.inner), path.to_path_buf(), ticket)
            .boxed()
            .shared();
        state.pending.insert(path.to_path_buf(), Pending {
            task: task.clone(),
            ticket,
        });
        return task;
    }

    /// Index of every cached document whose annotations match a label selection.
    ///
    /// Tokens are resolved through `tree`. In union mode an annotation matches
    /// when any token lies under any selected label; in intersection mode every
    /// selected label must have a token under it. The selection is collapsed first.
    pub fn find_by_labels(&self, tree: &LabelTree, selection: &[LabelId], intersection: bool) -> Vec<LabelAnnotation> {
        let selected = tree.collapse_selection(selection, intersection);
        if selected.is_empty() {
            return Vec::new();
        }
        let mut found = Vec::new();
        for index in self.snapshot() {
            for annotation in &index.annotations {
                let resolved: Vec<LabelId> = annotation.label_paths().filter_map(|path| return tree.resolve(path)).collect();
                let under = |label: LabelId| return resolved.iter().any(|&token| return tree.is_descendant_of(token, label));
                let matches = if intersection {
                    selected.iter().all(|&label| return under(label))
                } else {
                    selected.iter().any(|&label| return under(label))
                };
                if matches {
                    found.push(annotation.clone());
                }
            }
        }
        return found;
    }

    /// Index for a document: await the in-flight computation if there is one,
    /// else return the cached entry, else index it now.
    ///
    /// # Errors
    ///
    /// Propagates the indexing failure for this document.
    pub async fn get(&self, path: &Path) -> IndexResult {
        let path = paths::normalize_path(path);
        let pending = {
            let state = self.inner.state.lock();
            if let Some(pending) = state.pending.get(&path) {
                Some(pending.task.clone())
            } else if let Some(index) = state.caches.get(&path) {
                return Ok(Some(Arc::clone(index)));
            } else {
                None
            }
        };
        return match pending {
            Some(task) => task.await,
            None => self.index(&path).await,
        };
    }

    /// (Re)index one document, de-duplicated against any in-flight run.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotADocument` for paths the source does not index
    /// (non-markdown or filtered out by config), the read error
    /// when the document cannot be read, or `Error::RetryExhausted` when it
    /// kept changing for the whole attempt budget. The cache entry is dropped
    /// on every failure.
    pub async fn index(&self, path: &Path) -> IndexResult {
        let path = paths::normalize_path(path);
        let task = self.claim(&path);
        return task.await;
    }

    /// Index many documents in fixed-size concurrent batches.
    /// Failures are logged and returned; they never stop the remaining documents.
    pub async fn index_all(&self, documents: &[PathBuf]) -> Vec<(PathBuf, Error)> {
        let mut failures = Vec::new();
        for batch in documents.chunks(self.inner.batch_size.max(1)) {
            let results = join_all(batch.iter().map(|path| return self.index(path))).await;
            for (path, result) in batch.iter().zip(results) {
                if let Err(e) = result {
                    tracing::warn!(path = %path.display(), error = %e, "indexing failed");
                    failures.push((path.clone(), e));
                }
            }
        }
        tracing::info!(documents = documents.len(), failed = failures.len(), "indexed documents");
        return failures;
    }

    /// Index every document at or below `dir` (the whole workspace for an empty path).
    pub async fn index_under(&self, dir: &Path) -> Vec<(PathBuf, Error)> {
        let documents = self.inner.source.documents_under(dir);
        return self.index_all(&documents).await;
    }

    /// Record a change to a document and schedule re-indexing.
    /// Used for both "changed" and "created" notifications.
    pub fn invalidate(&self, path: &Path) -> JoinHandle<()> {
        let path = paths::normalize_path(path);
        {
            let mut state = self.inner.state.lock();
            let counter = state.counters.entry(path.clone()).or_insert(0);
            *counter = counter.wrapping_add(1);
        }
        let manager = self.clone();
        return tokio::spawn(async move {
            if let Err(e) = manager.index(&path).await {
                tracing::warn!(path = %path.display(), error = %e, "re-index after change failed");
            }
        });
    }

    /// True when no document is cached.
    pub fn is_empty(&self) -> bool {
        return self.inner.state.lock().caches.is_empty();
    }

    /// Number of cached documents.
    pub fn len(&self) -> usize {
        return self.inner.state.lock().caches.len();
    }

    /// Registry reading through `source`, with limits from `config`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Pattern` if the extraction patterns fail to compile.
    pub fn new(source: Arc<dyn DocumentSource>, config: &Config) -> Result<Self, Error> {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        return Ok(Self {
            inner: Arc::new(Inner {
                batch_size: config.index_batch_size,
                events,
                extractor: Extractor::new()?,
                max_attempts: config.max_index_attempts,
                source,
                state: Mutex::new(State::default()),
            }),
        });
    }

    /// Forget a deleted document: cache entry, counter and any in-flight run.
    /// The document is not re-indexed.
    pub fn remove(&self, path: &Path) {
        let path = paths::normalize_path(path);
        let removed = self.inner.state.lock().purge(&path);
        if removed {
            tracing::debug!(path = %path.display(), "removed from index");
            let _ = self.inner.events.send(IndexEvent::Removed(path));
        }
    }

    /// Forget every document below `dir`. Returns the removed identities.
    pub fn remove_under(&self, dir: &Path) -> Vec<PathBuf> {
        let dir = paths::normalize_path(dir);
        let doomed: Vec<PathBuf> = {
            let state = self.inner.state.lock();
            let mut doomed: Vec<PathBuf> = state
                .caches
                .keys()
                .chain(state.counters.keys())
                .chain(state.pending.keys())
                .filter(|path| return paths::is_within(path, &dir))
                .cloned()
                .collect();
            doomed.sort();
            doomed.dedup();
            doomed
        };
        for path in &doomed {
            self.remove(path);
        }
        return doomed;
    }

    /// Retarget every cached reference to `old` (or below it) at `new`,
    /// merging the edits of all documents into one set.
    pub fn rewrite_after_move(
        &self,
        old: &Path,
        old_fragment: Option<&str>,
        new: &Path,
        new_fragment: Option<&str>,
    ) -> EditSet {
        let mut edits = EditSet::default();
        let mut rewritten: usize = 0;
        for index in self.snapshot() {
            let count = index.rewrite_references_to(&mut edits, old, old_fragment, new, new_fragment);
            rewritten = rewritten.saturating_add(count);
        }
        tracing::debug!(from = %old.display(), to = %new.display(), rewritten, "collected reference rewrites");
        return edits;
    }

    /// Rewrite label tokens across every cached document.
    /// `rewrite` receives each token and returns its replacement, or `None` to keep it.
    pub fn rewrite_labels(&self, mut rewrite: impl FnMut(&str) -> Option<String>) -> EditSet {
        let mut edits = EditSet::default();
        for index in self.snapshot() {
            rewrite_document_labels(&index, &mut edits, &mut rewrite);
        }
        return edits;
    }

    /// All cached indexes, ordered by document path.
    pub fn snapshot(&self) -> Vec<Arc<DocumentIndex>> {
        let mut indexes: Vec<Arc<DocumentIndex>> = self.inner.state.lock().caches.values().cloned().collect();
        indexes.sort_by(|a, b| return a.path.cmp(&b.path));
        return indexes;
    }

    /// The source documents are read from.
    pub fn source(&self) -> &Arc<dyn DocumentSource> {
        return &self.inner.source;
    }

    /// Receive [`IndexEvent`]s from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<IndexEvent> {
        return self.inner.events.subscribe();
    }
}

/// Give up on a recompute that never settled.
fn abandon(inner: &Inner, path: &Path, ticket: u64) {
    let mut state = inner.state.lock();
    if state.owns(path, ticket) {
        state.caches.remove(path);
        state.counters.remove(path);
        state.pending.remove(path);
    }
}

/// Read and scan one document.
async fn extract(inner: &Inner, path: &Path) -> Result<DocumentIndex, Error> {
    if !inner.source.is_document(path) {
        return Err(Error::NotADocument { path: path.to_path_buf() });
    }
    let text = inner.source.read(path).await.map_err(|e| {
        return match e {
            Error::Io(io) => Error::ExtractionFailed {
                path: path.to_path_buf(),
                reason: io.to_string(),
            },
            other => other,
        };
    })?;
    return Ok(DocumentIndex::build(path, &text, &inner.extractor));
}

/// The extraction loop behind one pending entry.
async fn recompute(inner: Arc<Inner>, path: PathBuf, ticket: u64) -> IndexResult {
    for attempt in 1..=inner.max_attempts {
        let observed = inner.state.lock().counters.get(&path).copied();
        let extracted = extract(&inner, &path).await;
        match settle(&inner, &path, ticket, observed, extracted) {
            Settled::Done(result) => return result,
            Settled::Stale => {
                tracing::debug!(path = %path.display(), attempt, "document changed during extraction, retrying");
            },
        }
    }
    abandon(&inner, &path, ticket);
    tracing::error!(path = %path.display(), attempts = inner.max_attempts, "index retries exhausted");
    return Err(Error::RetryExhausted {
        attempts: inner.max_attempts,
        path,
    });
}

/// Rewrite label tokens of one document.
pub(crate) fn rewrite_document_labels(
    index: &DocumentIndex,
    edits: &mut EditSet,
    rewrite: &mut impl FnMut(&str) -> Option<String>,
) {
    for annotation in &index.annotations {
        for label in &annotation.labels {
            if let Some(replacement) = rewrite(&label.path)
                && replacement != label.path
            {
                edits.replace(&index.path, annotation.span_of(label), replacement);
            }
        }
    }
}

/// Decide what to do with one extraction attempt, under the state lock.
fn settle(
    inner: &Inner,
    path: &Path,
    ticket: u64,
    observed: Option<u64>,
    extracted: Result<DocumentIndex, Error>,
) -> Settled {
    let mut state = inner.state.lock();
    if !state.owns(path, ticket) {
        tracing::debug!(path = %path.display(), "index superseded by removal");
        return Settled::Done(Ok(None));
    }
    let index = match extracted {
        Ok(index) => index,
        Err(e) => {
            state.purge(path);
            tracing::warn!(path = %path.display(), error = %e, "extraction failed");
            return Settled::Done(Err(e));
        },
    };
    let current = state.counters.get(path).copied();
    if current.is_none() {
        state.caches.remove(path);
        state.pending.remove(path);
        return Settled::Done(Ok(None));
    }
    if current != observed {
        return Settled::Stale;
    }
    let index = Arc::new(index);
    state.caches.insert(path.to_path_buf(), Arc::clone(&index));
    state.pending.remove(path);
    drop(state);
    tracing::debug!(path = %path.display(), "cached");
    let _ = inner.events.send(IndexEvent::Cached(path.to_path_buf()));
    return Settled::Done(Ok(Some(index)));
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, reason = "tests")]
mod tests {
    use std::sync::OnceLock;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio::sync::Semaphore;

    use super::*;
    use crate::source::MemorySource;

    fn manager_over(source: Arc<dyn DocumentSource>, max_attempts: u32) -> IndexManager {
        let mut config = Config::default();
        config.max_index_attempts = max_attempts;
        return IndexManager::new(source, &config).unwrap();
    }

    async fn settle_tasks() {
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
    }

    /// Counts reads and holds each one until a permit is released.
    struct GatedSource {
        gate: Semaphore,
        inner: MemorySource,
        reads: AtomicUsize,
    }

    impl GatedSource {
        fn closed() -> Self {
            return Self {
                gate: Semaphore::new(0),
                inner: MemorySource::default(),
                reads: AtomicUsize::new(0),
            };
        }
    }

    impl DocumentSource for GatedSource {
        fn documents_under(&self, dir: &Path) -> Vec<PathBuf> {
            return self.inner.documents_under(dir);
        }

        fn exists(&self, path: &Path) -> bool {
            return self.inner.exists(path);
        }

        fn is_dir(&self, path: &Path) -> bool {
            return self.inner.is_dir(path);
        }

        fn is_document(&self, path: &Path) -> bool {
            return self.inner.is_document(path);
        }

        fn read(&self, path: &Path) -> BoxFuture<'_, Result<String, Error>> {
            let path = path.to_path_buf();
            return async move {
                self.reads.fetch_add(1, Ordering::SeqCst);
                let permit = self.gate.acquire().await.unwrap();
                permit.forget();
                return self.inner.read(&path).await;
            }
            .boxed();
        }
    }

    /// Reports a change on every read, so extraction never settles.
    #[derive(Default)]
    struct ChurningSource {
        inner: MemorySource,
        manager: OnceLock<IndexManager>,
    }

    impl DocumentSource for ChurningSource {
        fn documents_under(&self, dir: &Path) -> Vec<PathBuf> {
            return self.inner.documents_under(dir);
        }

        fn exists(&self, path: &Path) -> bool {
            return self.inner.exists(path);
        }

        fn is_dir(&self, path: &Path) -> bool {
            return self.inner.is_dir(path);
        }

        fn is_document(&self, path: &Path) -> bool {
            return self.inner.is_document(path);
        }

        fn read(&self, path: &Path) -> BoxFuture<'_, Result<String, Error>> {
            if let Some(manager) = self.manager.get() {
                let mut state = manager.inner.state.lock();
                let counter = state.counters.entry(path.to_path_buf()).or_insert(0);
                *counter = counter.wrapping_add(1);
            }
            return self.inner.read(path);
        }
    }

    #[tokio::test]
    async fn invalidations_during_pending_index_commit_latest_content_once() {
        let source = Arc::new(GatedSource::closed());
        source.inner.insert("n.md", "[v](one.md)");
        let manager = manager_over(source.clone(), 10);
        let mut events = manager.subscribe();

        let first = tokio::spawn({
            let manager = manager.clone();
            async move { return manager.index(Path::new("n.md")).await }
        });
        while source.reads.load(Ordering::SeqCst) < 1 {
            tokio::task::yield_now().await;
        }

        source.inner.insert("n.md", "[v](two.md)");
        let second = manager.invalidate(Path::new("n.md"));
        source.inner.insert("n.md", "[v](three.md)");
        let third = manager.invalidate(Path::new("n.md"));
        source.inner.insert("n.md", "[v](four.md)");
        let fourth = manager.invalidate(Path::new("n.md"));
        settle_tasks().await;

        source.gate.add_permits(16);
        let index = first.await.unwrap().unwrap().unwrap();
        second.await.unwrap();
        third.await.unwrap();
        fourth.await.unwrap();

        assert_eq!(index.references[0].target, PathBuf::from("four.md"));
        assert_eq!(source.reads.load(Ordering::SeqCst), 2);
        assert_eq!(events.try_recv().unwrap(), IndexEvent::Cached(PathBuf::from("n.md")));
        assert!(events.try_recv().is_err());
        let cached = manager.cached(Path::new("n.md")).unwrap();
        assert!(Arc::ptr_eq(&cached, &index));
    }

    #[tokio::test]
    async fn concurrent_index_calls_share_one_extraction() {
        let source = Arc::new(GatedSource::closed());
        source.inner.insert("n.md", "text");
        let manager = manager_over(source.clone(), 10);

        let a = tokio::spawn({
            let manager = manager.clone();
            async move { return manager.index(Path::new("n.md")).await }
        });
        let b = tokio::spawn({
            let manager = manager.clone();
            async move { return manager.get(Path::new("./n.md")).await }
        });
        settle_tasks().await;
        source.gate.add_permits(4);

        let a = a.await.unwrap().unwrap().unwrap();
        let b = b.await.unwrap().unwrap().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(source.reads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn endless_churn_exhausts_the_attempt_budget() {
        let source = Arc::new(ChurningSource::default());
        source.inner.insert("n.md", "text");
        let manager = manager_over(source.clone(), 3);
        assert!(source.manager.set(manager.clone()).is_ok());

        let result = manager.index(Path::new("n.md")).await;
        assert!(matches!(result, Err(Error::RetryExhausted { attempts: 3, .. })));
        assert!(manager.cached(Path::new("n.md")).is_none());
        assert!(manager.inner.state.lock().pending.is_empty());
    }

    #[tokio::test]
    async fn failed_extraction_drops_the_entry() {
        let source = Arc::new(MemorySource::default());
        source.insert("n.md", "text");
        let manager = manager_over(source.clone(), 10);
        manager.index(Path::new("n.md")).await.unwrap();
        assert_eq!(manager.len(), 1);

        source.remove(Path::new("n.md"));
        let result = manager.index(Path::new("n.md")).await;
        assert!(matches!(result, Err(Error::FileNotFound { .. })));
        assert!(manager.is_empty());

        let not_markdown = manager.index(Path::new("n.txt")).await;
        assert!(matches!(not_markdown, Err(Error::NotADocument { .. })));
    }

    #[tokio::test]
    async fn removal_during_index_discards_the_result() {
        let source = Arc::new(GatedSource::closed());
        source.inner.insert("d/n.md", "text");
        let manager = manager_over(source.clone(), 10);
        let mut events = manager.subscribe();

        let pending = tokio::spawn({
            let manager = manager.clone();
            async move { return manager.index(Path::new("d/n.md")).await }
        });
        while source.reads.load(Ordering::SeqCst) < 1 {
            tokio::task::yield_now().await;
        }
        assert_eq!(manager.remove_under(Path::new("d")), vec![PathBuf::from("d/n.md")]);
        source.gate.add_permits(4);

        assert!(pending.await.unwrap().unwrap().is_none());
        assert!(manager.is_empty());
        assert_eq!(events.try_recv().unwrap(), IndexEvent::Removed(PathBuf::from("d/n.md")));
    }

    #[tokio::test]
    async fn bulk_index_reports_failures_without_stopping() {
        let source = Arc::new(MemorySource::default());
        for i in 0..40 {
            source.insert(format!("notes/{i}.md"), format!("[x](../{i}.md)"));
        }
        let manager = manager_over(source.clone(), 10);
        let mut documents = source.documents_under(Path::new("notes"));
        documents.push(PathBuf::from("notes/missing.md"));

        let failures = manager.index_all(&documents).await;
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, PathBuf::from("notes/missing.md"));
        assert_eq!(manager.len(), 40);
    }

    #[tokio::test]
    async fn finds_annotations_by_label_selection() {
        let source = Arc::new(MemorySource::default());
        source.insert(
            "a.md",
            "# Intro\n<attr labels=\"Rust.Async\"></attr>\n# Other\n<attr labels=\"Design; Rust\"></attr>\n",
        );
        source.insert("b.md", "# Plain\n<attr labels=\"Design\"></attr>\n");
        let manager = manager_over(source.clone(), 10);
        manager.index_under(Path::new("")).await;

        let tree = LabelTree::parse("- Rust\n  - Async\n- Design\n").unwrap();
        let rust = tree.resolve("Rust").unwrap();
        let design = tree.resolve("Design").unwrap();

        let union = manager.find_by_labels(&tree, &[rust], false);
        let headings: Vec<&str> = union.iter().map(|a| return a.heading.as_str()).collect();
        assert_eq!(headings, vec!["Intro", "Other"]);

        let both = manager.find_by_labels(&tree, &[rust, design], true);
        assert_eq!(both.len(), 1);
        assert_eq!(both[0].heading, "Other");
    }

    #[tokio::test]
    async fn rewrite_after_move_merges_all_documents() {
        let source = Arc::new(MemorySource::default());
        source.insert("a.md", "[x](docs/old/b.md#h)");
        source.insert("docs/c.md", "[y](old/b.md)");
        let manager = manager_over(source.clone(), 10);
        manager.index_under(Path::new("")).await;

        let edits = manager.rewrite_after_move(Path::new("docs/old"), None, Path::new("docs/new"), None);
        assert_eq!(edits.len(), 2);
        assert_eq!(edits.apply(Path::new("a.md"), "[x](docs/old/b.md#h)").unwrap(), "[x](docs/new/b.md#h)");
        assert_eq!(edits.apply(Path::new("docs/c.md"), "[y](old/b.md)").unwrap(), "[y](new/b.md)");
    }
}
