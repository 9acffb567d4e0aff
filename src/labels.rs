//! Hierarchical label namespace parsed from an indented list config.
//!
//! Nodes live in an arena and refer to each other by [`LabelId`], so parent
//! links are plain indices rather than owning pointers. A name that occurs
//! exactly once in the whole tree is *unique* and may start a dotted path on
//! its own; any other path has to start from a direct child of the root.

use std::collections::HashMap;
use std::ops::Range;

use crate::error::Error;

/// Characters that may never appear in a label name.
const RESERVED: &[char] = &['.', '&', '"', '\'', '<', '>'];

/// Stable handle to a node of one [`LabelTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LabelId(usize);

impl LabelId {
    /// The unnamed root every tree has.
    pub const ROOT: Self = Self(0);
}

/// Where a label was declared in the config text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelOrigin {
    /// One-based line number.
    pub line: usize,
    /// Byte range of the name in the config text.
    pub span: Range<usize>,
}

/// One arena slot.
#[derive(Debug, Clone)]
struct LabelNode {
    /// Ordered children.
    children: Vec<LabelId>,
    /// Name, empty only for the root.
    name: String,
    /// Declaration site, absent for the root.
    origin: Option<LabelOrigin>,
    /// Back link, absent only for the root.
    parent: Option<LabelId>,
}

/// Rooted, ordered label tree with unique-name bookkeeping.
/// Cloning deep-copies nodes and uniqueness, so a clone can be edited to
/// preview the effect of a change without touching the live tree.
#[derive(Debug, Clone)]
pub struct LabelTree {
    /// Arena; index 0 is the root.
    nodes: Vec<LabelNode>,
    /// How many nodes carry each name.
    occurrences: HashMap<String, usize>,
    /// Names held by exactly one node, mapped to that node.
    unique: HashMap<String, LabelId>,
}

impl Default for LabelTree {
    fn default() -> Self {
        return Self {
            nodes: vec![LabelNode {
                children: Vec::new(),
                name: String::new(),
                origin: None,
                parent: None,
            }],
            occurrences: HashMap::new(),
            unique: HashMap::new(),
        };
    }
}

impl LabelTree {
    /// Append a node under `parent` and update uniqueness.
    fn add(&mut self, parent: LabelId, name: &str, origin: LabelOrigin) -> LabelId {
        let id = LabelId(self.nodes.len());
        self.nodes.push(LabelNode {
            children: Vec::new(),
            name: name.to_string(),
            origin: Some(origin),
            parent: Some(parent),
        });
        if let Some(node) = self.nodes.get_mut(parent.0) {
            node.children.push(id);
        }
        let count = self.occurrences.entry(name.to_string()).or_insert(0);
        *count = count.saturating_add(1);
        if *count == 1 {
            self.unique.insert(name.to_string(), id);
        } else {
            self.unique.remove(name);
        }
        return id;
    }

    /// Direct child of `parent` called `name`.
    pub fn child(&self, parent: LabelId, name: &str) -> Option<LabelId> {
        return self
            .children(parent)
            .iter()
            .copied()
            .find(|&child| return self.name(child) == name);
    }

    /// Ordered children of a node.
    pub fn children(&self, id: LabelId) -> &[LabelId] {
        return self.node(id).map_or(&[], |node| return node.children.as_slice());
    }

    /// Reduce a selection so related labels do not count twice.
    ///
    /// In union mode an ancestor absorbs its descendants; in intersection
    /// mode a descendant absorbs its ancestors. Order of first selection is kept.
    pub fn collapse_selection(&self, selection: &[LabelId], intersection: bool) -> Vec<LabelId> {
        let mut kept: Vec<LabelId> = Vec::new();
        for &candidate in selection {
            let absorbed = kept.iter().any(|&existing| {
                return if intersection {
                    self.is_descendant_of(existing, candidate)
                } else {
                    self.is_descendant_of(candidate, existing)
                };
            });
            if absorbed {
                continue;
            }
            kept.retain(|&existing| {
                return if intersection {
                    !self.is_descendant_of(candidate, existing)
                } else {
                    !self.is_descendant_of(existing, candidate)
                };
            });
            kept.push(candidate);
        }
        return kept;
    }

    /// Dotted path from the root, empty for the root itself.
    pub fn full_path(&self, id: LabelId) -> String {
        let mut names: Vec<&str> = Vec::new();
        let mut current = Some(id);
        while let Some(node_id) = current
            && node_id != LabelId::ROOT
        {
            names.push(self.name(node_id));
            current = self.parent(node_id);
        }
        names.reverse();
        return names.join(".");
    }

    /// Whether `id` is `ancestor` or lies below it.
    pub fn is_descendant_of(&self, id: LabelId, ancestor: LabelId) -> bool {
        let mut current = Some(id);
        while let Some(node_id) = current {
            if node_id == ancestor {
                return true;
            }
            current = self.parent(node_id);
        }
        return false;
    }

    /// True when the tree has no labels besides the root.
    pub fn is_empty(&self) -> bool {
        return self.children(LabelId::ROOT).is_empty();
    }

    /// Whether a path may start at this node: its name is unique and maps to
    /// it, or it is a direct child of the root.
    pub fn is_valid_start(&self, id: LabelId) -> bool {
        if id == LabelId::ROOT {
            return false;
        }
        return self.parent(id) == Some(LabelId::ROOT) || self.unique.get(self.name(id)) == Some(&id);
    }

    /// Number of labels, not counting the root.
    pub fn len(&self) -> usize {
        return self.nodes.len().saturating_sub(1);
    }

    /// Name of a node, empty for the root.
    pub fn name(&self, id: LabelId) -> &str {
        return self.node(id).map_or("", |node| return node.name.as_str());
    }

    /// Arena lookup.
    fn node(&self, id: LabelId) -> Option<&LabelNode> {
        return self.nodes.get(id.0);
    }

    /// Where a label was declared in the config it was parsed from.
    pub fn origin(&self, id: LabelId) -> Option<&LabelOrigin> {
        return self.node(id).and_then(|node| return node.origin.as_ref());
    }

    /// Parent of a node, `None` for the root.
    pub fn parent(&self, id: LabelId) -> Option<LabelId> {
        return self.node(id).and_then(|node| return node.parent);
    }

    /// Parse the indented list config.
    ///
    /// Each non-blank line is `<indent>- name[;comment]`. The first indented
    /// line fixes the indent unit; every deeper line must repeat it exactly.
    ///
    /// # Errors
    ///
    /// Returns `Error::LabelParse` for a missing `- ` marker, an empty or
    /// reserved-character name, inconsistent or skipped indentation, or a
    /// duplicate name among siblings. No partial tree is returned.
    pub fn parse(text: &str) -> Result<Self, Error> {
        let mut tree = Self::default();
        let mut unit: Option<&str> = None;
        let mut stack: Vec<LabelId> = vec![LabelId::ROOT];
        let mut line_start: usize = 0;

        for (index, raw_line) in text.split('\n').enumerate() {
            let line_number = index.saturating_add(1);
            let offset = line_start;
            line_start = line_start.saturating_add(raw_line.len()).saturating_add(1);

            let line = raw_line.strip_suffix('\r').unwrap_or(raw_line);
            if line.trim().is_empty() {
                continue;
            }
            let parse_error = |reason: String| return Error::LabelParse { line: line_number, reason };

            let indent_len = line.find(|c: char| return c != ' ' && c != '\t').unwrap_or(line.len());
            let (indent, rest) = line.split_at(indent_len);
            let Some(body) = rest.strip_prefix("- ") else {
                return Err(parse_error("missing \"- \"".to_string()));
            };
            let declared = body.split(';').next().unwrap_or_default();
            let name = declared.trim();
            if name.is_empty() || name.contains(RESERVED) {
                return Err(parse_error(format!("invalid label name \"{name}\"")));
            }

            let level = indent_level(indent, &mut unit).ok_or_else(|| return parse_error("inconsistent indent".to_string()))?;
            let parent = place_in_stack(&tree, &mut stack, level).map_err(parse_error)?;
            if tree.child(parent, name).is_some() {
                return Err(parse_error(format!("duplicate label \"{name}\"")));
            }

            let leading = declared.len().saturating_sub(declared.trim_start().len());
            let start = offset
                .saturating_add(indent_len)
                .saturating_add(2)
                .saturating_add(leading);
            tree.add(parent, name, LabelOrigin {
                line: line_number,
                span: start..start.saturating_add(name.len()),
            });
        }
        return Ok(tree);
    }

    /// Every label except the root in pre-order, with its depth (root children are 0).
    pub fn preorder(&self) -> Vec<(LabelId, usize)> {
        let mut order = Vec::with_capacity(self.len());
        let mut stack: Vec<(LabelId, usize)> = self
            .children(LabelId::ROOT)
            .iter()
            .rev()
            .map(|&child| return (child, 0))
            .collect();
        while let Some((id, depth)) = stack.pop() {
            order.push((id, depth));
            for &child in self.children(id).iter().rev() {
                stack.push((child, depth.saturating_add(1)));
            }
        }
        return order;
    }

    /// Re-derive the unique-map entry for one name from its occurrence count.
    fn refresh_unique(&mut self, name: &str) {
        if self.occurrences.get(name) == Some(&1) {
            let holder = self
                .nodes
                .iter()
                .enumerate()
                .skip(1)
                .find(|(_, node)| return node.name == name)
                .map(|(index, _)| return LabelId(index));
            if let Some(id) = holder {
                self.unique.insert(name.to_string(), id);
                return;
            }
        }
        self.unique.remove(name);
    }

    /// Print the tree back in config form with two-space indentation.
    pub fn render(&self) -> String {
        let lines: Vec<String> = self
            .preorder()
            .into_iter()
            .map(|(id, depth)| return format!("{}- {}", "  ".repeat(depth), self.name(id)))
            .collect();
        return lines.join("\n");
    }

    /// Rename the label at `path` in place and re-derive uniqueness for the
    /// old and new names. Returns the renamed label.
    ///
    /// A previously unique holder of `new_name` stops being unique; callers
    /// migrate paths that relied on it before swapping trees.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidLabelName` for an empty or reserved-character
    /// name, `Error::LabelNotFound` when `path` does not resolve, and
    /// `Error::DuplicateLabel` when a sibling already uses `new_name`.
    pub fn rename(&mut self, path: &str, new_name: &str) -> Result<LabelId, Error> {
        validate_name(new_name)?;
        let id = self.resolve(path).ok_or_else(|| {
            return Error::LabelNotFound { path: path.to_string() };
        })?;
        let old_name = self.name(id).to_string();
        if old_name == new_name {
            return Ok(id);
        }
        let parent = self.parent(id).unwrap_or(LabelId::ROOT);
        if self.child(parent, new_name).is_some() {
            return Err(Error::DuplicateLabel {
                name: new_name.to_string(),
                parent: self.full_path(parent),
            });
        }

        if let Some(node) = self.nodes.get_mut(id.0) {
            node.name = new_name.to_string();
        }
        if let Some(count) = self.occurrences.get_mut(&old_name) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.occurrences.remove(&old_name);
            }
        }
        let count = self.occurrences.entry(new_name.to_string()).or_insert(0);
        *count = count.saturating_add(1);
        self.refresh_unique(&old_name);
        self.refresh_unique(new_name);
        tracing::debug!(from = %old_name, to = new_name, "renamed label");
        return Ok(id);
    }

    /// Resolve a dotted path. The first segment must be a unique name or a
    /// direct child of the root; the rest are child lookups.
    pub fn resolve(&self, path: &str) -> Option<LabelId> {
        let segments: Vec<&str> = path.split('.').collect();
        return self.resolve_segments(&segments);
    }

    /// [`LabelTree::resolve`] over pre-split segments.
    pub fn resolve_segments(&self, segments: &[&str]) -> Option<LabelId> {
        let (first, rest) = segments.split_first()?;
        let mut current = self.start(first)?;
        for segment in rest {
            current = self.child(current, segment)?;
        }
        return Some(current);
    }

    /// Minimal dotted suffix of the full path that still resolves to `id`.
    /// Walks upward until the first segment is a valid start.
    pub fn shortest_unique_path(&self, id: LabelId) -> String {
        let mut names: Vec<&str> = vec![self.name(id)];
        let mut current = id;
        while !self.is_valid_start(current)
            && let Some(parent) = self.parent(current)
            && parent != LabelId::ROOT
        {
            names.push(self.name(parent));
            current = parent;
        }
        names.reverse();
        return names.join(".");
    }

    /// Node a path may start from: the unique holder of `name`, else the
    /// root child called `name`.
    pub fn start(&self, name: &str) -> Option<LabelId> {
        return self
            .unique
            .get(name)
            .copied()
            .or_else(|| return self.child(LabelId::ROOT, name));
    }
}

/// Depth implied by an indent string, fixing the unit on first use.
/// `None` when the indent is not a whole repetition of the unit.
fn indent_level<'a>(indent: &'a str, unit: &mut Option<&'a str>) -> Option<usize> {
    if indent.is_empty() {
        return Some(0);
    }
    let Some(token) = *unit else {
        *unit = Some(indent);
        return Some(1);
    };
    let repeats = indent.len().checked_div(token.len())?;
    if token.repeat(repeats) != indent {
        return None;
    }
    return Some(repeats);
}

/// Adjust the parent stack for a line at `level` and return its parent.
fn place_in_stack(tree: &LabelTree, stack: &mut Vec<LabelId>, level: usize) -> Result<LabelId, String> {
    let depth = stack.len();
    let top = stack.last().copied().unwrap_or(LabelId::ROOT);
    if depth == level.saturating_add(1) {
        return Ok(top);
    }
    if depth == level {
        let Some(&last) = tree.children(top).last() else {
            return Err("could not indent at the beginning".to_string());
        };
        stack.push(last);
        return Ok(last);
    }
    if depth > level.saturating_add(1) {
        stack.truncate(level.saturating_add(1));
        return Ok(stack.last().copied().unwrap_or(LabelId::ROOT));
    }
    return Err("unexpected indent increase".to_string());
}

/// Check a candidate label name.
///
/// # Errors
///
/// Returns `Error::InvalidLabelName` when the name is empty, padded, or
/// contains a reserved character.
pub fn validate_name(name: &str) -> Result<(), Error> {
    if name.is_empty() || name.trim() != name || name.contains(RESERVED) || name.contains(';') {
        return Err(Error::InvalidLabelName { name: name.to_string() });
    }
    return Ok(());
}
