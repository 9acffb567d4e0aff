//! Live cross-reference and label index for a workspace of markdown notes.
//!
//! Documents are scanned for relative links and for heading label
//! annotations. The index stays consistent while documents change, move and
//! get renamed, and label paths are kept valid as the label tree evolves.

pub mod commands;
pub mod config;
pub mod diagnostics;
pub mod document;
pub mod edit;
pub mod error;
pub mod extractor;
pub mod labels;
pub mod manager;
pub mod paths;
pub mod report;
pub mod rewriter;
pub mod source;
pub mod taxonomy;
pub mod types;
pub mod watch;
pub mod workspace;
