//! The central `ASTNode` record.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::node_type::NodeType;
use super::position::Position;
use super::significance::SignificanceLevel;

/// Maximum length `source_text` is truncated to (spec §3).
pub const SOURCE_TEXT_MAX_LEN: usize = 500;

/// Per-node metadata bag.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeMetadata {
    /// Source language identifier (e.g. `"rust"`).
    pub language: String,
    /// Path from the file root to this node, e.g. `["MyClass", "my_method"]`.
    pub scope: Vec<String>,
    /// Modifiers such as `pub`, `async`, `static`.
    pub modifiers: Vec<String>,
    /// Imports visible at this node (populated on `file`/`module` nodes).
    pub imports: Vec<String>,
    /// Exports declared at this node.
    pub exports: Vec<String>,
    /// Attached doc comment, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docstring: Option<String>,
    /// Free-text annotations attached during C5.
    pub annotations: Vec<String>,
    /// Free-form, language-specific extra data.
    #[serde(default)]
    pub language_specific: HashMap<String, serde_json::Value>,
}

/// A single node in the semantic AST.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AstNode {
    /// 64-hex content hash, stable across unrelated edits elsewhere in the
    /// file (see [`compute_node_id`]).
    pub id: String,
    /// The node's classification.
    #[serde(rename = "type")]
    pub node_type: NodeType,
    /// The node's name, when it has one (functions, classes, variables...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Path of the source file this node belongs to, relative to the
    /// workspace root.
    pub file_path: String,
    /// Inclusive start position.
    pub start: Position,
    /// Inclusive end position (`start <= end`).
    pub end: Position,
    /// Ordered ids of this node's direct children.
    pub children: Vec<String>,
    /// Id of this node's parent, unless this is a `file`-type root.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// Attached metadata.
    pub metadata: NodeMetadata,
    /// How significant this node is, for ranking/annotation prioritization.
    pub significance: SignificanceLevel,
    /// Truncated source text, capped at [`SOURCE_TEXT_MAX_LEN`] chars.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_text: Option<String>,
    /// A rendered signature, when applicable (functions/methods/classes).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    /// Cyclomatic/cognitive complexity, when computed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complexity: Option<f64>,
}

impl AstNode {
    /// Returns `start <= end`, checking the ordering invariant from spec §3.
    #[must_use]
    pub fn has_valid_span(&self) -> bool {
        self.start <= self.end
    }

    /// Truncate (by Unicode scalar boundary, never splitting a code point)
    /// and store `text` as this node's `source_text`.
    pub fn set_source_text(&mut self, text: &str) {
        self.source_text = Some(truncate_source_text(text));
    }
}

/// Truncate `text` to at most [`SOURCE_TEXT_MAX_LEN`] chars, respecting
/// char boundaries.
#[must_use]
pub fn truncate_source_text(text: &str) -> String {
    if text.chars().count() <= SOURCE_TEXT_MAX_LEN {
        return text.to_string();
    }
    text.chars().take(SOURCE_TEXT_MAX_LEN).collect()
}

/// Compute the stable content-hash id for a node.
///
/// The hash covers `(file_path, node_type, start, end, name, normalized
/// source text)` so that re-parsing an unchanged node (even after
/// unrelated edits elsewhere in the file) yields the same id (spec §8,
/// property 1).
#[must_use]
pub fn compute_node_id(
    file_path: &str,
    node_type: NodeType,
    start: Position,
    end: Position,
    name: Option<&str>,
    normalized_source_text: &str,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(file_path.as_bytes());
    hasher.update(b"\0");
    let type_str: &'static str = node_type.into();
    hasher.update(type_str.as_bytes());
    hasher.update(b"\0");
    hasher.update(start.line.to_le_bytes());
    hasher.update(start.column.to_le_bytes());
    hasher.update(end.line.to_le_bytes());
    hasher.update(end.column.to_le_bytes());
    hasher.update(b"\0");
    hasher.update(name.unwrap_or_default().as_bytes());
    hasher.update(b"\0");
    hasher.update(normalize_source_text(normalized_source_text).as_bytes());
    hex::encode(hasher.finalize())
}

/// Normalize source text for hashing: collapse surrounding whitespace so
/// that reformatting-only diffs (indentation changes from an unrelated
/// edit upstream) don't change the node id.
#[must_use]
fn normalize_source_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(line: u32, col: u32) -> Position {
        Position::new(line, col, None)
    }

    #[test]
    fn node_id_is_stable_for_identical_input() {
        let a = compute_node_id(
            "src/lib.rs",
            NodeType::Function,
            pos(1, 0),
            pos(3, 1),
            Some("foo"),
            "fn foo() {}",
        );
        let b = compute_node_id(
            "src/lib.rs",
            NodeType::Function,
            pos(1, 0),
            pos(3, 1),
            Some("foo"),
            "fn foo() {}",
        );
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn node_id_changes_with_position() {
        let a = compute_node_id(
            "src/lib.rs",
            NodeType::Function,
            pos(1, 0),
            pos(3, 1),
            Some("foo"),
            "fn foo() {}",
        );
        let b = compute_node_id(
            "src/lib.rs",
            NodeType::Function,
            pos(2, 0),
            pos(4, 1),
            Some("foo"),
            "fn foo() {}",
        );
        assert_ne!(a, b);
    }

    #[test]
    fn source_text_truncates_at_char_boundary() {
        let long = "x".repeat(SOURCE_TEXT_MAX_LEN + 50);
        let truncated = truncate_source_text(&long);
        assert_eq!(truncated.chars().count(), SOURCE_TEXT_MAX_LEN);
    }

    #[test]
    fn valid_span_requires_start_le_end() {
        let node = AstNode {
            id: "x".into(),
            node_type: NodeType::File,
            name: None,
            file_path: "a.rs".into(),
            start: pos(5, 0),
            end: pos(1, 0),
            children: vec![],
            parent: None,
            metadata: NodeMetadata::default(),
            significance: SignificanceLevel::Low,
            source_text: None,
            signature: None,
            complexity: None,
        };
        assert!(!node.has_valid_span());
    }
}
