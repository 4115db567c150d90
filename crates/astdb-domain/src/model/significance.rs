//! Ordered significance levels.

use serde::{Deserialize, Serialize};

/// How important a node is, used to prioritize annotation/embedding
/// effort and to bias search ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum SignificanceLevel {
    /// Minimal significance (e.g. a blank-line statement).
    Minimal = 1,
    /// Low significance.
    Low = 2,
    /// Medium significance.
    Medium = 3,
    /// High significance.
    High = 4,
    /// Critical significance (e.g. a public API entry point).
    Critical = 5,
}

impl SignificanceLevel {
    /// Construct from the raw spec-level integer, rejecting out-of-range
    /// values.
    #[must_use]
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Minimal),
            2 => Some(Self::Low),
            3 => Some(Self::Medium),
            4 => Some(Self::High),
            5 => Some(Self::Critical),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_is_ascending_by_importance() {
        assert!(SignificanceLevel::Minimal < SignificanceLevel::Critical);
    }

    #[test]
    fn rejects_out_of_range_values() {
        assert!(SignificanceLevel::from_u8(0).is_none());
        assert!(SignificanceLevel::from_u8(6).is_none());
        assert_eq!(SignificanceLevel::from_u8(3), Some(SignificanceLevel::Medium));
    }
}
