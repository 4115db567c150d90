//! C4 Parser Orchestrator: language detection, tree-sitter native parse,
//! and C3 classification into [`AstNode`] records.

use std::sync::Arc;

use astdb_ast_utils::{language_mapping, LanguageMapping};
use astdb_domain::error::{Error, Result};
use astdb_domain::model::{compute_node_id, AstNode, NodeMetadata, NodeType, Position, SignificanceLevel};
use astdb_domain::ports::parser::{ParseError, ParseOptions, ParseOutcome, ParserOrchestrator};
use astdb_language_support::{LanguageDetector, LanguageId};
use async_trait::async_trait;
use rayon::prelude::*;
use tree_sitter::{Language, Node, Parser};

fn tree_sitter_language(language: LanguageId) -> Language {
    match language {
        LanguageId::Rust => tree_sitter_rust::LANGUAGE.into(),
        LanguageId::Python => tree_sitter_python::LANGUAGE.into(),
        LanguageId::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
        LanguageId::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
        LanguageId::Java => tree_sitter_java::LANGUAGE.into(),
        LanguageId::Cpp => tree_sitter_cpp::LANGUAGE.into(),
        LanguageId::Kotlin => tree_sitter_kotlin_ng::LANGUAGE.into(),
    }
}

/// Nodes below this hierarchy level are indexed even with a shallow
/// subtree; deeper, high-volume kinds (statements, literals) are kept only
/// when they carry a name, to bound index size on large files.
const HIERARCHY_LEVEL_ALWAYS_INDEXED: u8 = 4;

fn significance_for(node_type: NodeType, has_name: bool) -> SignificanceLevel {
    match node_type.hierarchy_level() {
        0..=2 => SignificanceLevel::Critical,
        3 => SignificanceLevel::High,
        4 => SignificanceLevel::High,
        5 => {
            if has_name {
                SignificanceLevel::Medium
            } else {
                SignificanceLevel::Low
            }
        }
        _ => SignificanceLevel::Minimal,
    }
}

fn extract_name(node: Node<'_>, source: &[u8]) -> Option<String> {
    for field in ["name", "declarator", "identifier"] {
        if let Some(name_node) = node.child_by_field_name(field) {
            if matches!(name_node.kind(), "function_declarator" | "declarator") {
                return extract_name(name_node, source);
            }
            if let Ok(text) = name_node.utf8_text(source) {
                return Some(text.to_string());
            }
        }
    }
    None
}

struct FileParseState<'a> {
    file_path: &'a str,
    source: &'a [u8],
    language: LanguageId,
    mapping: &'a LanguageMapping,
    nodes: Vec<AstNode>,
}

impl FileParseState<'_> {
    /// Depth-first walk, classifying every named node. Returns the id of
    /// the node just visited (or `None` for anonymous/unclassifiable
    /// nodes so they're skipped as parents too).
    fn visit(&mut self, node: Node<'_>, parent_id: Option<&str>) -> Option<String> {
        if !node.is_named() {
            return None;
        }

        let parent_kind = node.parent().map(|p| p.kind().to_string());
        let classification = self
            .mapping
            .classify(node.kind(), parent_kind.as_deref());

        let start = Position::new(node.start_position().row as u32 + 1, node.start_position().column as u32, Some(node.start_byte() as u64));
        let end = Position::new(node.end_position().row as u32 + 1, node.end_position().column as u32, Some(node.end_byte() as u64));
        let name = extract_name(node, self.source);
        let source_text = node.utf8_text(self.source).unwrap_or_default();

        let id = compute_node_id(
            self.file_path,
            classification.node_type,
            start,
            end,
            name.as_deref(),
            source_text,
        );

        let mut children_ids = Vec::new();
        let mut cursor = node.walk();
        if cursor.goto_first_child() {
            loop {
                if let Some(child_id) = self.visit(cursor.node(), Some(&id)) {
                    children_ids.push(child_id);
                }
                if !cursor.goto_next_sibling() {
                    break;
                }
            }
        }

        let is_shallow_noise = classification.node_type.hierarchy_level() > HIERARCHY_LEVEL_ALWAYS_INDEXED
            && name.is_none()
            && children_ids.is_empty();
        if is_shallow_noise {
            return None;
        }

        let mut ast_node = AstNode {
            id: id.clone(),
            node_type: classification.node_type,
            name: name.clone(),
            file_path: self.file_path.to_string(),
            start,
            end,
            children: children_ids,
            parent: parent_id.map(str::to_string),
            metadata: NodeMetadata {
                language: self.language.name().to_string(),
                ..NodeMetadata::default()
            },
            significance: significance_for(classification.node_type, name.is_some()),
            source_text: None,
            signature: None,
            complexity: None,
        };
        ast_node.set_source_text(source_text);
        self.nodes.push(ast_node);

        Some(id)
    }
}

fn parse_one_file(file_path: &str, detector: &LanguageDetector) -> ParseOutcome {
    let started = std::time::Instant::now();
    let source = match std::fs::read_to_string(file_path) {
        Ok(contents) => contents,
        Err(e) => {
            return ParseOutcome {
                nodes: Vec::new(),
                errors: vec![ParseError {
                    file_path: file_path.to_string(),
                    message: format!("failed to read file: {e}"),
                }],
                language: "unknown".to_string(),
                parse_time_ms: started.elapsed().as_millis() as u64,
            };
        }
    };

    let language = match detector.detect_opt(std::path::Path::new(file_path), Some(&source)) {
        Some(language) => language,
        None => {
            return ParseOutcome {
                nodes: Vec::new(),
                errors: vec![ParseError {
                    file_path: file_path.to_string(),
                    message: "unable to detect language".to_string(),
                }],
                language: "unknown".to_string(),
                parse_time_ms: started.elapsed().as_millis() as u64,
            };
        }
    };

    let mut parser = Parser::new();
    if let Err(e) = parser.set_language(&tree_sitter_language(language)) {
        return ParseOutcome {
            nodes: Vec::new(),
            errors: vec![ParseError {
                file_path: file_path.to_string(),
                message: format!("failed to load grammar: {e}"),
            }],
            language: language.name().to_string(),
            parse_time_ms: started.elapsed().as_millis() as u64,
        };
    }

    let Some(tree) = parser.parse(&source, None) else {
        return ParseOutcome {
            nodes: Vec::new(),
            errors: vec![ParseError {
                file_path: file_path.to_string(),
                message: "tree-sitter failed to produce a tree".to_string(),
            }],
            language: language.name().to_string(),
            parse_time_ms: started.elapsed().as_millis() as u64,
        };
    };

    let mapping = language_mapping(language);
    let mut state = FileParseState {
        file_path,
        source: source.as_bytes(),
        language,
        mapping: &mapping,
        nodes: Vec::new(),
    };
    state.visit(tree.root_node(), None);

    ParseOutcome {
        nodes: state.nodes,
        errors: Vec::new(),
        language: language.name().to_string(),
        parse_time_ms: started.elapsed().as_millis() as u64,
    }
}

/// [`ParserOrchestrator`] that detects each file's language, parses it with
/// the matching tree-sitter grammar and classifies the result with the
/// per-language [`LanguageMapping`].
pub struct TreeSitterParserOrchestrator {
    detector: Arc<LanguageDetector>,
}

impl TreeSitterParserOrchestrator {
    /// Build a new orchestrator with a fresh language detector.
    #[must_use]
    pub fn new() -> Self {
        Self {
            detector: Arc::new(LanguageDetector::new()),
        }
    }
}

impl Default for TreeSitterParserOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ParserOrchestrator for TreeSitterParserOrchestrator {
    async fn parse_batch(
        &self,
        files: &[String],
        options: ParseOptions,
    ) -> Result<Vec<ParseOutcome>> {
        if files.is_empty() {
            return Ok(Vec::new());
        }

        let detector = Arc::clone(&self.detector);
        let files = files.to_vec();
        let max_concurrency = options.max_concurrency.max(1);

        tokio::task::spawn_blocking(move || {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(max_concurrency)
                .build()
                .map_err(|e| Error::parser(format!("failed to build worker pool: {e}")))?;
            Ok(pool.install(|| {
                files
                    .par_iter()
                    .map(|file_path| parse_one_file(file_path, &detector))
                    .collect()
            }))
        })
        .await
        .map_err(|e| Error::parser(format!("parser worker pool panicked: {e}")))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn parses_a_simple_rust_file() {
        let mut file = tempfile::Builder::new().suffix(".rs").tempfile().unwrap();
        writeln!(file, "pub fn add(a: i32, b: i32) -> i32 {{ a + b }}").unwrap();
        let path = file.path().to_string_lossy().into_owned();

        let orchestrator = TreeSitterParserOrchestrator::new();
        let outcomes = orchestrator
            .parse_batch(&[path], ParseOptions::default())
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].errors.is_empty());
        assert_eq!(outcomes[0].language, "rust");
        assert!(outcomes[0].nodes.iter().any(|n| n.name.as_deref() == Some("add")));
    }

    #[tokio::test]
    async fn missing_file_reports_a_non_fatal_error() {
        let orchestrator = TreeSitterParserOrchestrator::new();
        let outcomes = orchestrator
            .parse_batch(
                &["/nonexistent/path/does/not/exist.rs".to_string()],
                ParseOptions::default(),
            )
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 1);
        assert!(!outcomes[0].errors.is_empty());
    }

    #[test]
    fn significance_ranks_files_above_statements() {
        assert!(significance_for(NodeType::File, false) > significance_for(NodeType::IfStatement, false));
    }
}
