//! File watcher: indexes the workspace on startup, then keeps the index,
//! the label tree and references current as files change on disk.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use notify::event::{ModifyKind, RenameMode};
use notify::{EventKind, RecursiveMode, Watcher as _};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::TryRecvError;

use crate::diagnostics;
use crate::edit::EditSet;
use crate::error::Error;
use crate::manager::IndexEvent;
use crate::paths;
use crate::source::DocumentSource as _;
use crate::types::ContentDigest;
use crate::workspace::Workspace;

/// Debounce delay between filesystem events and processing.
const DEBOUNCE_MS: u64 = 100;

/// A filesystem event reduced to what the index cares about.
/// Paths are workspace-relative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    /// A document's content changed.
    Changed(PathBuf),
    /// A file or directory appeared.
    Created(PathBuf),
    /// A file or directory disappeared.
    Deleted(PathBuf),
    /// The label tree config changed.
    LabelsChanged,
    /// A file or directory was renamed.
    Moved {
        /// Old location.
        from: PathBuf,
        /// New location.
        to: PathBuf,
    },
}

/// Apply an edit set and log what could not be written.
async fn apply_logged(workspace: &Workspace, edits: &EditSet) {
    for (path, e) in workspace.apply(edits).await {
        tracing::warn!(path = %path.display(), error = %e, "edit not applied");
    }
}

/// Reduce one notify event to index changes. `root` must be the canonical
/// workspace root, since notify reports absolute paths.
pub fn classify(event: &notify::Event, root: &Path, labels: &Path) -> Vec<Change> {
    let relative: Vec<PathBuf> = event
        .paths
        .iter()
        .filter_map(|path| return path.strip_prefix(root).ok().map(paths::normalize_path))
        .collect();
    let single = |make: fn(PathBuf) -> Change| {
        return relative
            .iter()
            .map(|path| {
                if path == labels {
                    return Change::LabelsChanged;
                }
                return make(path.clone());
            })
            .collect::<Vec<Change>>();
    };

    return match event.kind {
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => match relative.as_slice() {
            [from, to] if from == labels || to == labels => vec![Change::LabelsChanged],
            [from, to] => vec![Change::Moved {
                from: from.clone(),
                to: to.clone(),
            }],
            _ => Vec::new(),
        },
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) | EventKind::Remove(_) => single(Change::Deleted),
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) | EventKind::Create(_) => single(Change::Created),
        EventKind::Modify(_) => single(Change::Changed)
            .into_iter()
            .filter(|change| {
                return match change {
                    Change::Changed(path) => paths::is_markdown(path),
                    _ => true,
                };
            })
            .collect(),
        _ => Vec::new(),
    };
}

/// Create a filesystem watcher that forwards events on the given channel.
///
/// # Errors
///
/// Returns `Error::Watch` if the watcher cannot be created.
fn create_watcher(tx: crossbeam_channel::Sender<notify::Event>) -> Result<notify::RecommendedWatcher, Error> {
    return notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| match res {
        Ok(event) => {
            let _ = tx.send(event);
        },
        Err(e) => tracing::warn!(error = %e, "watch error"),
    })
    .map_err(|e| return watch_error(&e));
}

/// Route one change to the index, the rewriter or the taxonomy.
async fn dispatch(workspace: &Workspace, change: Change) {
    tracing::debug!(?change, "dispatching change");
    match change {
        Change::Changed(path) | Change::Created(path) => refresh(workspace, &path).await,
        Change::Deleted(path) => {
            workspace.manager.remove(&path);
            workspace.manager.remove_under(&path);
        },
        Change::LabelsChanged => match workspace.load_labels().await {
            Ok(edits) => apply_logged(workspace, &edits).await,
            Err(e) => diagnostics::print_error(&e),
        },
        Change::Moved { from, to } => {
            let outcome = workspace.rewriter.on_move(&from, &to).await;
            apply_logged(workspace, &outcome.inner).await;
            apply_logged(workspace, &outcome.outer).await;
        },
    }
}

/// Drain pending index events. True when anything was cached or removed.
fn drain(events: &mut broadcast::Receiver<IndexEvent>) -> bool {
    let mut changed = false;
    loop {
        match events.try_recv() {
            Ok(_) | Err(TryRecvError::Lagged(_)) => changed = true,
            Err(TryRecvError::Empty | TryRecvError::Closed) => return changed,
        }
    }
}

/// Wait for the next event, then collect everything that follows within the
/// debounce window. `None` once the watcher is gone.
async fn next_batch(rx: crossbeam_channel::Receiver<notify::Event>) -> Option<Vec<notify::Event>> {
    let batch = tokio::task::spawn_blocking(move || {
        let first = rx.recv().ok()?;
        let mut batch = vec![first];
        let debounce = Duration::from_millis(DEBOUNCE_MS);
        while let Ok(event) = rx.recv_timeout(debounce) {
            batch.push(event);
        }
        return Some(batch);
    })
    .await;
    return batch.ok().flatten();
}

/// Print the diagnostics of every cached document.
fn print_diagnostics(workspace: &Workspace) {
    let found = workspace.diagnostics();
    print!("{}", diagnostics::render_text(&found, &|path| return workspace.read_text(path)));
    eprintln!("watch: {} warnings in {} documents", found.len(), workspace.manager.len());
}

/// Re-index a document or directory unless its content is unchanged.
async fn refresh(workspace: &Workspace, path: &Path) {
    if workspace.source.is_dir(path) {
        workspace.manager.index_under(path).await;
        return;
    }
    if !workspace.source.is_document(path) {
        tracing::debug!(path = %path.display(), "not an indexed document");
        return;
    }
    if let Some(cached) = workspace.manager.cached(path)
        && let Ok(text) = tokio::fs::read_to_string(workspace.source.absolute(path)).await
        && ContentDigest::of(&text) == cached.digest
    {
        tracing::debug!(path = %path.display(), "content unchanged");
        return;
    }
    if let Err(e) = workspace.manager.invalidate(path).await {
        tracing::warn!(path = %path.display(), error = %e, "re-index task failed");
    }
}

/// Entry point for the watch command.
///
/// Indexes the workspace and prints diagnostics, then follows filesystem
/// events and prints fresh diagnostics whenever the index changes.
///
/// # Errors
///
/// Returns `Error::Watch` if the watcher cannot be set up, or `Error::Io`
/// if the root cannot be resolved.
pub async fn run(workspace: &Workspace) -> Result<ExitCode, Error> {
    eprintln!("watch: initial scan");
    workspace.scan().await;
    if let Err(e) = workspace.load_labels().await {
        diagnostics::print_error(&e);
    }
    let mut events = workspace.manager.subscribe();
    print_diagnostics(workspace);

    let root = std::fs::canonicalize(workspace.source.root())?;
    let (tx, rx) = crossbeam_channel::unbounded();
    let mut watcher = create_watcher(tx)?;
    watcher
        .watch(&root, RecursiveMode::Recursive)
        .map_err(|e| return watch_error(&e))?;
    eprintln!("watch: monitoring {}, press Ctrl+C to stop", root.display());

    while let Some(batch) = next_batch(rx.clone()).await {
        let mut changes: Vec<Change> = Vec::new();
        for event in &batch {
            for change in classify(event, &root, workspace.taxonomy.config_path()) {
                if !changes.contains(&change) {
                    changes.push(change);
                }
            }
        }
        let labels_changed = changes.contains(&Change::LabelsChanged);
        for change in changes {
            dispatch(workspace, change).await;
        }
        if drain(&mut events) || labels_changed {
            print_diagnostics(workspace);
        }
    }
    return Ok(ExitCode::SUCCESS);
}

/// Wrap a notify error.
fn watch_error(e: &notify::Error) -> Error {
    return Error::Watch { reason: e.to_string() };
}
