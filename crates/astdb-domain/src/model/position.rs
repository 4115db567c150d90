//! Source position.

use serde::{Deserialize, Serialize};

/// A location within a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// 1-based line number.
    pub line: u32,
    /// 0-based column number.
    pub column: u32,
    /// Absolute byte offset into the file, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub byte_offset: Option<u64>,
}

impl Position {
    /// Construct a position, asserting the 1-based line invariant.
    #[must_use]
    pub fn new(line: u32, column: u32, byte_offset: Option<u64>) -> Self {
        debug_assert!(line >= 1, "line numbers are 1-based");
        Self {
            line,
            column,
            byte_offset,
        }
    }
}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Position {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.line, self.column).cmp(&(other.line, other.column))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_order_by_line_then_column() {
        let a = Position::new(1, 5, None);
        let b = Position::new(2, 0, None);
        assert!(a < b);
    }
}
