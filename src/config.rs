use std::path::{Path, PathBuf};

use crate::error::Error;

/// Name of the workspace config file.
pub const CONFIG_FILE: &str = ".noteref.toml";

/// Default label tree location, relative to the workspace root.
const DEFAULT_LABELS: &str = "labels.tree";

/// Default report directory, relative to the workspace root.
const DEFAULT_REPORT_DIR: &str = ".report";

/// Default retry cap for one `index()` call.
const DEFAULT_MAX_INDEX_ATTEMPTS: u32 = 10;

/// Default number of documents indexed concurrently during a workspace scan.
const DEFAULT_INDEX_BATCH_SIZE: usize = 15;

/// Workspace configuration loaded from `.noteref.toml`.
/// Include/exclude patterns are path prefixes applied to markdown documents.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path prefixes that must never be indexed.
    exclude: Vec<String>,
    /// Path prefixes to index; empty means everything.
    include: Vec<String>,
    /// Documents indexed concurrently per batch.
    pub index_batch_size: usize,
    /// Label tree config file, relative to the workspace root.
    pub labels: PathBuf,
    /// Retry cap for one `index()` call.
    pub max_index_attempts: u32,
    /// Directory label reports are written to.
    pub report_dir: PathBuf,
}

/// Raw TOML structure for `.noteref.toml`.
#[derive(serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct NoterefTomlConfig {
    /// See [`Config`].
    #[serde(default)]
    exclude: Vec<String>,
    /// See [`Config`].
    #[serde(default)]
    include: Vec<String>,
    /// See [`Config`].
    index_batch_size: Option<usize>,
    /// See [`Config`].
    labels: Option<PathBuf>,
    /// See [`Config`].
    max_index_attempts: Option<u32>,
    /// See [`Config`].
    report_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        return Self {
            exclude: Vec::new(),
            include: Vec::new(),
            index_batch_size: DEFAULT_INDEX_BATCH_SIZE,
            labels: PathBuf::from(DEFAULT_LABELS),
            max_index_attempts: DEFAULT_MAX_INDEX_ATTEMPTS,
            report_dir: PathBuf::from(DEFAULT_REPORT_DIR),
        };
    }
}

impl Config {
    /// Load config from `.noteref.toml` in the given root directory.
    /// Returns defaults if the file doesn't exist.
    /// Returns an error if the file exists but is malformed; never silently
    /// falls back to defaults when the user wrote a config file.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if reading fails (other than not-found),
    /// or `Error::ConfigInvalid` if the TOML is malformed or a value is out of range.
    pub fn load(root: &Path) -> Result<Self, Error> {
        let path = root.join(CONFIG_FILE);
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e.into()),
        };
        return Self::parse(&path, &content);
    }

    /// Parse config text read from `path`.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigInvalid` if the TOML is malformed or a value is out of range.
    pub fn parse(path: &Path, content: &str) -> Result<Self, Error> {
        let raw: NoterefTomlConfig = toml::from_str(content).map_err(|e| {
            return Error::ConfigInvalid {
                path: path.to_path_buf(),
                reason: e.message().to_string(),
            };
        })?;

        let defaults = Self::default();
        let config = Self {
            exclude: raw.exclude,
            include: raw.include,
            index_batch_size: raw.index_batch_size.unwrap_or(defaults.index_batch_size),
            labels: raw.labels.unwrap_or(defaults.labels),
            max_index_attempts: raw.max_index_attempts.unwrap_or(defaults.max_index_attempts),
            report_dir: raw.report_dir.unwrap_or(defaults.report_dir),
        };
        if config.index_batch_size == 0 || config.max_index_attempts == 0 {
            return Err(Error::ConfigInvalid {
                path: path.to_path_buf(),
                reason: "index_batch_size and max_index_attempts must be at least 1".to_string(),
            });
        }
        return Ok(config);
    }

    /// Check whether a markdown document path should be indexed.
    ///
    /// A path is included if no include patterns are set (index everything),
    /// or if the path starts with at least one include pattern.
    /// An included path is then excluded if it starts with any exclude pattern.
    pub fn should_scan(&self, relative_path: &str) -> bool {
        let included = self.include.is_empty()
            || self.include.iter().any(|p| return relative_path.starts_with(p.as_str()));

        if !included {
            return false;
        }

        return !self.exclude.iter().any(|p| return relative_path.starts_with(p.as_str()));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "tests")]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let config = Config::parse(Path::new(CONFIG_FILE), "include = [\"notes/\"]\n").unwrap();
        assert_eq!(config.labels, PathBuf::from("labels.tree"));
        assert_eq!(config.max_index_attempts, 10);
        assert_eq!(config.index_batch_size, 15);
        assert!(config.should_scan("notes/a.md"));
        assert!(!config.should_scan("drafts/a.md"));
    }

    #[test]
    fn exclude_wins_over_include() {
        let text = "include = [\"notes/\"]\nexclude = [\"notes/private/\"]\n";
        let config = Config::parse(Path::new(CONFIG_FILE), text).unwrap();
        assert!(!config.should_scan("notes/private/a.md"));
    }

    #[test]
    fn malformed_or_out_of_range_config_is_an_error() {
        let bad = Config::parse(Path::new(CONFIG_FILE), "labels = [");
        assert!(matches!(bad, Err(Error::ConfigInvalid { .. })));
        let zero = Config::parse(Path::new(CONFIG_FILE), "max_index_attempts = 0");
        assert!(matches!(zero, Err(Error::ConfigInvalid { .. })));
        let unknown = Config::parse(Path::new(CONFIG_FILE), "colour = \"red\"");
        assert!(matches!(unknown, Err(Error::ConfigInvalid { .. })));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.report_dir, PathBuf::from(".report"));
    }
}
