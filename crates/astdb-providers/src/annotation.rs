//! C5 Annotation Generator: deterministic signature/summary rendering from
//! an [`AstNode`]'s own metadata, no external model call.

use astdb_domain::error::Result;
use astdb_domain::model::{Annotation, AnnotationQuality, AstNode, NodeType};
use astdb_domain::ports::annotation_generator::{AnnotationContext, AnnotationGenerator};
use async_trait::async_trait;

fn render_signature(node: &AstNode) -> String {
    let name = node.name.as_deref().unwrap_or("<anonymous>");
    let scope = if node.metadata.scope.is_empty() {
        String::new()
    } else {
        format!("{}::", node.metadata.scope.join("::"))
    };

    match node.node_type {
        NodeType::Function | NodeType::Method | NodeType::Constructor | NodeType::ArrowFunction => {
            format!("{scope}{name}(...)")
        }
        NodeType::Class | NodeType::Interface | NodeType::Enum | NodeType::Module | NodeType::Namespace => {
            format!("{scope}{name}")
        }
        NodeType::Property | NodeType::Field | NodeType::Variable => format!("{scope}{name}"),
        _ => format!("{scope}{name}"),
    }
}

fn render_summary(node: &AstNode) -> String {
    if let Some(doc) = node.metadata.docstring.as_deref() {
        let first_line = doc.lines().next().unwrap_or(doc).trim();
        if !first_line.is_empty() {
            return first_line.to_string();
        }
    }

    let kind = node.node_type.hierarchy_level();
    let name = node.name.as_deref().unwrap_or("this node");
    match node.node_type {
        NodeType::Function | NodeType::Method => format!("Function {name}."),
        NodeType::Class => format!("Class {name}."),
        NodeType::Interface => format!("Interface {name}."),
        NodeType::Enum => format!("Enum {name}."),
        NodeType::Module | NodeType::Namespace => format!("Module {name}."),
        _ if kind <= 2 => format!("Top-level construct {name}."),
        _ => format!("{name}."),
    }
}

/// Confidence is high when the node has a name and a docstring, lower when
/// inferred purely from structure.
fn confidence_for(node: &AstNode) -> (f64, f64) {
    let has_name = node.name.is_some();
    let has_doc = node.metadata.docstring.is_some();

    let signature_confidence = if has_name { 0.95 } else { 0.4 };
    let summary_confidence = match (has_name, has_doc) {
        (true, true) => 0.95,
        (true, false) => 0.6,
        (false, _) => 0.3,
    };
    (signature_confidence, summary_confidence)
}

/// [`AnnotationGenerator`] that renders signatures and summaries straight
/// from an [`AstNode`]'s own fields, with no external model call.
#[derive(Debug, Default)]
pub struct HeuristicAnnotationGenerator;

impl HeuristicAnnotationGenerator {
    /// Construct a new generator. Stateless; cheap to call repeatedly.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AnnotationGenerator for HeuristicAnnotationGenerator {
    async fn annotate(&self, node: &AstNode, _context: &AnnotationContext) -> Result<Annotation> {
        let signature = render_signature(node);
        let summary = render_summary(node);
        let (signature_confidence, summary_confidence) = confidence_for(node);

        Ok(Annotation {
            node_id: node.id.clone(),
            quality: AnnotationQuality::compute(signature_confidence, summary_confidence, !signature.is_empty()),
            signature,
            summary,
            language_specific: std::collections::HashMap::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use astdb_domain::model::{NodeMetadata, Position, SignificanceLevel};

    fn sample_node(node_type: NodeType, name: Option<&str>, docstring: Option<&str>) -> AstNode {
        AstNode {
            id: "abc".into(),
            node_type,
            name: name.map(String::from),
            file_path: "src/lib.rs".into(),
            start: Position::new(1, 0, None),
            end: Position::new(2, 0, None),
            children: Vec::new(),
            parent: None,
            metadata: NodeMetadata {
                docstring: docstring.map(String::from),
                ..NodeMetadata::default()
            },
            significance: SignificanceLevel::Medium,
            source_text: None,
            signature: None,
            complexity: None,
        }
    }

    fn context() -> AnnotationContext {
        AnnotationContext {
            file_path: "src/lib.rs".into(),
            language: "rust".into(),
            source_text: String::new(),
            all_nodes: Vec::new(),
            imports: Vec::new(),
            exports: Vec::new(),
        }
    }

    #[tokio::test]
    async fn named_function_gets_high_confidence() {
        let node = sample_node(NodeType::Function, Some("add"), None);
        let generator = HeuristicAnnotationGenerator::new();
        let annotation = generator.annotate(&node, &context()).await.unwrap();
        assert_eq!(annotation.signature, "add(...)");
        assert!(annotation.quality.signature_confidence > 0.8);
    }

    #[tokio::test]
    async fn docstring_first_line_becomes_summary() {
        let node = sample_node(NodeType::Function, Some("add"), Some("Adds two numbers.\nMore detail."));
        let generator = HeuristicAnnotationGenerator::new();
        let annotation = generator.annotate(&node, &context()).await.unwrap();
        assert_eq!(annotation.summary, "Adds two numbers.");
        assert!(annotation.quality.is_complete);
    }

    #[tokio::test]
    async fn anonymous_node_gets_low_confidence() {
        let node = sample_node(NodeType::ArrowFunction, None, None);
        let generator = HeuristicAnnotationGenerator::new();
        let annotation = generator.annotate(&node, &context()).await.unwrap();
        assert!(!annotation.quality.is_complete);
    }
}
