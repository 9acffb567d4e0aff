/// Crate-level error types for noteref.
use std::path::PathBuf;
use std::sync::Arc;

/// All errors in noteref carry enough context to produce a useful diagnostic
/// without a debugger. Each variant names the file, label path, or reason for failure.
///
/// The type is `Clone` because one in-flight index computation hands the same
/// outcome to every caller awaiting it.
#[allow(clippy::error_impl_error, reason = "crate-wide error type")]
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// `.noteref.toml` exists but cannot be parsed.
    #[error("config invalid: {}: {reason}", path.display())]
    ConfigInvalid {
        /// Path to the malformed config file.
        path: PathBuf,
        /// Description of the problem.
        reason: String,
    },

    /// Label tree config names a label twice under one parent.
    #[error("duplicate label `{name}` under `{parent}`")]
    DuplicateLabel {
        /// Label name that collided.
        name: String,
        /// Full path of the parent label, empty for the root.
        parent: String,
    },

    /// Two edits in one document overlap and cannot both be applied.
    #[error("overlapping edits in {} at byte {offset}", path.display())]
    EditConflict {
        /// Byte offset where the overlap starts.
        offset: usize,
        /// Document receiving the edits.
        path: PathBuf,
    },

    /// Reading or scanning one document failed.
    #[error("extraction failed: {}: {reason}", path.display())]
    ExtractionFailed {
        /// Document that could not be extracted.
        path: PathBuf,
        /// Description of the failure.
        reason: String,
    },

    /// A referenced document does not exist.
    #[error("file not found: {}", path.display())]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// No heading with the given text exists in the document.
    #[error("heading not found: `{heading}` in {}", path.display())]
    HeadingNotFound {
        /// Heading text that was searched for.
        heading: String,
        /// Document that was searched.
        path: PathBuf,
    },

    /// A label name contains a reserved character or is empty.
    #[error("invalid label name: `{name}`")]
    InvalidLabelName {
        /// The rejected name.
        name: String,
    },

    /// Underlying I/O error from the filesystem.
    #[error("io: {0}")]
    Io(
        /// The wrapped I/O error, shared so the error stays cloneable.
        Arc<std::io::Error>,
    ),

    /// A dotted label path does not resolve in the current tree.
    #[error("label not found: `{path}`")]
    LabelNotFound {
        /// The dotted path that failed to resolve.
        path: String,
    },

    /// The label tree config is malformed. Fatal to that load.
    #[error("label tree parse error at line {line}: {reason}")]
    LabelParse {
        /// One-based line number in the config.
        line: usize,
        /// Description of the problem.
        reason: String,
    },

    /// Only markdown documents the config includes can be indexed.
    #[error("not an indexed markdown document: {}", path.display())]
    NotADocument {
        /// The rejected path.
        path: PathBuf,
    },

    /// The fixed reference or annotation pattern failed to compile.
    #[error("pattern: {reason}")]
    Pattern {
        /// The regex engine's message.
        reason: String,
    },

    /// A document kept changing while it was being indexed.
    #[error("index retries exhausted after {attempts} attempts: {}", path.display())]
    RetryExhausted {
        /// How many extractions were attempted.
        attempts: u32,
        /// Document that never settled.
        path: PathBuf,
    },

    /// Report or diagnostics could not be serialized.
    #[error("serialize: {reason}")]
    Serialize {
        /// The serializer's message.
        reason: String,
    },

    /// The filesystem watcher could not be set up.
    #[error("watch: {reason}")]
    Watch {
        /// The watcher's message.
        reason: String,
    },
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        return Self::Io(Arc::new(e));
    }
}

impl From<regex::Error> for Error {
    fn from(e: regex::Error) -> Self {
        return Self::Pattern { reason: e.to_string() };
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        return Self::Serialize { reason: e.to_string() };
    }
}
