//! Small tagged-union value objects used at port boundaries, standing in
//! for dynamically-typed option bags in the pipeline's configuration
//! surface.

use serde::{Deserialize, Serialize};

/// Distance/similarity space a vector collection is configured for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VectorSpace {
    /// Cosine similarity; vectors are L2-normalized on insert.
    Cosine,
    /// Euclidean (L2) distance.
    L2,
    /// Raw inner product, no normalization.
    InnerProduct,
}

/// How the pipeline coordinator selects which files enter a batch.
/// Variants are mutually exclusive; `Changed`/`Staged` require a VCS
/// workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QuerySelection {
    /// Files with uncommitted working-tree changes relative to `base`.
    Changed {
        /// Base ref to diff against, e.g. `"HEAD"`.
        base: String,
    },
    /// Files staged in the VCS index.
    Staged,
    /// Files matching a glob pattern.
    Glob(String),
    /// Files listed in the workspace's persisted watch configuration.
    Config,
}

/// Where a snapshot archive lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SnapshotLocation {
    /// A path on the local filesystem.
    Local,
    /// A remote storage adapter, identified by snapshot id.
    Remote(String),
}

/// Depth of audit trail retained for an indexing run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditLevel {
    /// Only final success/failure per file.
    Basic,
    /// Plus per-stage timing and error detail.
    Comprehensive,
    /// Plus raw request/response payload capture.
    Enterprise,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_selection_round_trips_through_json() {
        let sel = QuerySelection::Glob("**/*.rs".into());
        let json = serde_json::to_string(&sel).unwrap();
        let back: QuerySelection = serde_json::from_str(&json).unwrap();
        assert_eq!(sel, back);
    }

    #[test]
    fn audit_level_orders_by_depth() {
        assert!(AuditLevel::Basic < AuditLevel::Enterprise);
    }
}
