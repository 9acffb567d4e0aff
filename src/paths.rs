//! Lexical path arithmetic: resolution, relative paths, and directory remapping.
//!
//! Nothing here touches the filesystem. Document identities are compared as
//! normalized paths, so every path entering the index goes through
//! [`normalize_path`] first.

use std::path::{Component, Path, PathBuf};

use percent_encoding::percent_decode_str;

/// Percent-decode reference text. Returns `None` when the decoded bytes are not UTF-8.
pub fn decode_path(raw: &str) -> Option<String> {
    return percent_decode_str(raw)
        .decode_utf8()
        .ok()
        .map(std::borrow::Cow::into_owned);
}

/// Encode a relative path for writing back into a document.
/// Only spaces are escaped; everything else passes through unchanged.
pub fn encode_path(path: &str) -> String {
    return path.replace(' ', "%20");
}

/// True for paths with a `.md` extension.
pub fn is_markdown(path: &Path) -> bool {
    return path.extension().is_some_and(|ext| return ext == "md");
}

/// True when `path` lies strictly below `dir`.
pub fn is_within(path: &Path, dir: &Path) -> bool {
    return path != dir && path.starts_with(dir);
}

/// Collapse `.` and `..` components in a path without touching the filesystem.
/// Preserves leading `..` when there is nothing left to pop.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut components: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        push_normalized_component(&mut components, component);
    }
    return components.iter().collect();
}

/// Directory containing a document, empty for a bare file name.
pub fn parent_dir(file: &Path) -> &Path {
    return file.parent().unwrap_or_else(|| return Path::new(""));
}

/// Handle a single path component during normalization.
/// Pops the last component for `..` when possible, preserves it otherwise.
fn push_normalized_component<'a>(components: &mut Vec<Component<'a>>, component: Component<'a>) {
    match component {
        Component::CurDir => {},
        Component::ParentDir => {
            let can_pop = matches!(
                components.last(),
                Some(c) if matches!(c, Component::Normal(_))
            );
            if can_pop {
                components.pop();
            } else if !matches!(components.last(), Some(Component::RootDir | Component::Prefix(_))) {
                components.push(component);
            }
        },
        other => components.push(other),
    }
}

/// Relative path from directory `from` to `target`, always `/`-separated.
/// Returns `.` when both name the same location.
pub fn relative_path(from: &Path, target: &Path) -> String {
    let from = normalize_path(from);
    let target = normalize_path(target);
    let from_parts: Vec<Component<'_>> = from.components().collect();
    let target_parts: Vec<Component<'_>> = target.components().collect();

    let common = from_parts
        .iter()
        .zip(target_parts.iter())
        .take_while(|(a, b)| return a == b)
        .count();

    let mut parts: Vec<String> = Vec::new();
    for _ in from_parts.iter().skip(common) {
        parts.push("..".to_string());
    }
    for component in target_parts.iter().skip(common) {
        parts.push(component.as_os_str().to_string_lossy().into_owned());
    }

    if parts.is_empty() {
        return ".".to_string();
    }
    return parts.join("/");
}

/// Relative path from the directory containing `from_file` to `target`.
pub fn relative_path_from_file(from_file: &Path, target: &Path) -> String {
    return relative_path(parent_dir(from_file), target);
}

/// Where `path` ends up after `old_dir` is moved to `new_dir`.
/// Returns `None` when `path` is not `old_dir` or below it.
pub fn remap_after_dir_move(path: &Path, old_dir: &Path, new_dir: &Path) -> Option<PathBuf> {
    if path == old_dir {
        return Some(new_dir.to_path_buf());
    }
    return path
        .strip_prefix(old_dir)
        .ok()
        .map(|rest| return new_dir.join(rest));
}

/// Resolve relative reference text against a directory.
/// Returns `None` for absolute paths, which are never local references.
pub fn resolve_relpath(dir: &Path, relpath: &str) -> Option<PathBuf> {
    let rel = Path::new(relpath);
    if rel.has_root() || rel.is_absolute() {
        return None;
    }
    return Some(normalize_path(&dir.join(rel)));
}
