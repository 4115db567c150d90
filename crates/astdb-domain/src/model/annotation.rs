//! Per-node generated annotations.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Default confidence threshold above which a signature/summary counts as
/// usable (spec §4.C5).
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.8;

/// Confidence scoring for a generated annotation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AnnotationQuality {
    /// Confidence in the generated signature, in `[0, 1]`.
    pub signature_confidence: f64,
    /// Confidence in the generated summary, in `[0, 1]`.
    pub summary_confidence: f64,
    /// True iff both confidences clear their threshold and the signature
    /// is non-empty.
    pub is_complete: bool,
}

impl AnnotationQuality {
    /// Compute quality from the two confidence scores and whether the
    /// generated signature string was non-empty, applying
    /// [`DEFAULT_CONFIDENCE_THRESHOLD`] to both.
    #[must_use]
    pub fn compute(
        signature_confidence: f64,
        summary_confidence: f64,
        signature_non_empty: bool,
    ) -> Self {
        Self::compute_with_threshold(
            signature_confidence,
            summary_confidence,
            signature_non_empty,
            DEFAULT_CONFIDENCE_THRESHOLD,
        )
    }

    /// As [`Self::compute`], with an explicit threshold.
    #[must_use]
    pub fn compute_with_threshold(
        signature_confidence: f64,
        summary_confidence: f64,
        signature_non_empty: bool,
        threshold: f64,
    ) -> Self {
        let is_complete = signature_non_empty
            && signature_confidence > threshold
            && summary_confidence > threshold;
        Self {
            signature_confidence: signature_confidence.clamp(0.0, 1.0),
            summary_confidence: summary_confidence.clamp(0.0, 1.0),
            is_complete,
        }
    }
}

/// A generated annotation for a single [`crate::model::AstNode`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Annotation {
    /// Id of the node this annotation describes.
    pub node_id: String,
    /// A rendered signature string.
    pub signature: String,
    /// A short natural-language summary.
    pub summary: String,
    /// Confidence/completeness scoring.
    pub quality: AnnotationQuality,
    /// Free-form, language-specific extra fields.
    #[serde(default)]
    pub language_specific: HashMap<String, serde_json::Value>,
}
