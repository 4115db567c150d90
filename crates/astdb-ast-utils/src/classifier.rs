//! Per-language mapping from parser-native node kinds to the canonical
//! [`NodeType`] taxonomy.

use std::collections::HashMap;

use astdb_domain::model::NodeType;
use astdb_language_support::LanguageId;
use regex::Regex;

/// How a classification decision was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassificationReason {
    /// Matched `direct_mappings`.
    DirectMapping,
    /// Matched a `context_rules` predicate.
    ContextRule,
    /// Matched `pattern_mappings`.
    PatternMatch,
    /// Nothing matched; `default_fallback` was used.
    Fallback,
}

impl ClassificationReason {
    /// Human-readable label, as surfaced in diagnostics.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::DirectMapping => "Direct mapping",
            Self::ContextRule => "Context rule",
            Self::PatternMatch => "Pattern match",
            Self::Fallback => "Fallback",
        }
    }
}

/// Outcome of classifying one parser-native node.
#[derive(Debug, Clone)]
pub struct Classification {
    /// The resolved node type.
    pub node_type: NodeType,
    /// Confidence in `[0, 1]`.
    pub confidence: f64,
    /// Why this classification was reached.
    pub reason: ClassificationReason,
    /// Other candidate types that were considered, most to least likely.
    pub alternatives: Vec<NodeType>,
}

/// A priority-ordered regex rule matching a parser-native kind string.
pub struct PatternMapping {
    /// Pattern matched against the native kind string.
    pub regex: Regex,
    /// Node type assigned on match.
    pub node_type: NodeType,
    /// Higher priority wins when multiple patterns match the same kind.
    pub priority: i32,
    /// Confidence assigned on match (spec default is 0.7, but a mapping
    /// may override it).
    pub confidence: f64,
}

/// A predicate over `(node_kind, parent_kind)`, used to disambiguate
/// kinds the native grammar doesn't split on its own (e.g. Rust's
/// `function_item` as either a free function or a method, depending on
/// whether its parent is an `impl_item`).
pub struct ContextRule {
    /// Evaluates the rule against a node's native kind and its parent's
    /// native kind (`None` at the root).
    pub predicate: fn(node_kind: &str, parent_kind: Option<&str>) -> Option<NodeType>,
    /// Human-readable name, for diagnostics.
    pub name: &'static str,
}

/// Per-language classification rules (spec §4.C3).
pub struct LanguageMapping {
    /// Parser-native kind string → canonical type, confidence 0.85.
    pub direct_mappings: HashMap<&'static str, NodeType>,
    /// Ordered regex rules, confidence 0.7, highest priority wins.
    pub pattern_mappings: Vec<PatternMapping>,
    /// Context predicates, confidence 0.9 on match, evaluated in order.
    pub context_rules: Vec<ContextRule>,
    /// Returned with confidence 0.5 when nothing else matches.
    pub default_fallback: NodeType,
}

/// Direct-mapping confidence (spec §4.C3).
pub const DIRECT_MAPPING_CONFIDENCE: f64 = 0.85;
/// Context-rule confidence.
pub const CONTEXT_RULE_CONFIDENCE: f64 = 0.9;
/// Pattern-mapping confidence.
pub const PATTERN_MAPPING_CONFIDENCE: f64 = 0.7;
/// Fallback confidence.
pub const FALLBACK_CONFIDENCE: f64 = 0.5;

impl LanguageMapping {
    /// Classify a single native node kind, trying direct mappings, then
    /// context rules, then patterns in priority order, then the
    /// fallback.
    #[must_use]
    pub fn classify(&self, node_kind: &str, parent_kind: Option<&str>) -> Classification {
        if let Some(&node_type) = self.direct_mappings.get(node_kind) {
            return Classification {
                node_type,
                confidence: DIRECT_MAPPING_CONFIDENCE,
                reason: ClassificationReason::DirectMapping,
                alternatives: Vec::new(),
            };
        }

        for rule in &self.context_rules {
            if let Some(node_type) = (rule.predicate)(node_kind, parent_kind) {
                return Classification {
                    node_type,
                    confidence: CONTEXT_RULE_CONFIDENCE,
                    reason: ClassificationReason::ContextRule,
                    alternatives: Vec::new(),
                };
            }
        }

        let mut matches: Vec<&PatternMapping> = self
            .pattern_mappings
            .iter()
            .filter(|m| m.regex.is_match(node_kind))
            .collect();
        if !matches.is_empty() {
            matches.sort_by(|a, b| b.priority.cmp(&a.priority));
            let best = matches[0];
            let alternatives = matches[1..].iter().map(|m| m.node_type).collect();
            return Classification {
                node_type: best.node_type,
                confidence: best.confidence,
                reason: ClassificationReason::PatternMatch,
                alternatives,
            };
        }

        Classification {
            node_type: self.default_fallback,
            confidence: FALLBACK_CONFIDENCE,
            reason: ClassificationReason::Fallback,
            alternatives: Vec::new(),
        }
    }
}

/// Substring patterns shared by every language mapping, appended after a
/// language's own anchored patterns (e.g. `^arrow_function$`). These are
/// what let an unrecognized kind like `custom_function_like_thing` or
/// `custom_method_definition` still resolve to `Function`/`Method`
/// instead of falling all the way through to the fallback: `method`
/// outranks `function` so a kind naming both picks the more specific
/// type.
fn generic_function_like_patterns() -> Vec<PatternMapping> {
    vec![
        PatternMapping {
            regex: Regex::new(r"method").expect("static pattern is valid"),
            node_type: NodeType::Method,
            priority: 5,
            confidence: PATTERN_MAPPING_CONFIDENCE,
        },
        PatternMapping {
            regex: Regex::new(r"function").expect("static pattern is valid"),
            node_type: NodeType::Function,
            priority: 1,
            confidence: PATTERN_MAPPING_CONFIDENCE,
        },
    ]
}

/// Rust's `function_item` is a method when nested in an `impl_item`,
/// otherwise a free function.
fn rust_function_context(node_kind: &str, parent_kind: Option<&str>) -> Option<NodeType> {
    if node_kind != "function_item" {
        return None;
    }
    match parent_kind {
        Some("impl_item" | "declaration_list") => Some(NodeType::Method),
        _ => Some(NodeType::Function),
    }
}

/// Build the [`LanguageMapping`] for a supported language, grounded in
/// the native kind tables [`crate::symbols::SymbolExtractor`] already
/// carries per language.
#[must_use]
pub fn language_mapping(language: LanguageId) -> LanguageMapping {
    match language {
        LanguageId::Rust => LanguageMapping {
            direct_mappings: HashMap::from([
                ("source_file", NodeType::File),
                ("mod_item", NodeType::Module),
                ("struct_item", NodeType::Class),
                ("trait_item", NodeType::Interface),
                ("enum_item", NodeType::Enum),
                ("type_item", NodeType::TypeAlias),
                ("let_declaration", NodeType::Variable),
                ("parameter", NodeType::Parameter),
                ("field_declaration", NodeType::Field),
                ("if_expression", NodeType::IfStatement),
                ("for_expression", NodeType::ForLoop),
                ("while_expression", NodeType::WhileLoop),
                ("match_expression", NodeType::SwitchStatement),
                ("use_declaration", NodeType::Import),
                ("line_comment", NodeType::Comment),
                ("block_comment", NodeType::Comment),
                ("string_literal", NodeType::StringLiteral),
            ]),
            pattern_mappings: {
                let mut patterns = vec![PatternMapping {
                    regex: Regex::new(r"^closure_expression$").expect("static pattern is valid"),
                    node_type: NodeType::ArrowFunction,
                    priority: 10,
                    confidence: PATTERN_MAPPING_CONFIDENCE,
                }];
                patterns.extend(generic_function_like_patterns());
                patterns
            },
            context_rules: vec![ContextRule {
                predicate: rust_function_context,
                name: "rust_function_context",
            }],
            default_fallback: NodeType::Comment,
        },
        LanguageId::Python => LanguageMapping {
            direct_mappings: HashMap::from([
                ("module", NodeType::File),
                ("class_definition", NodeType::Class),
                ("function_definition", NodeType::Function),
                ("parameters", NodeType::Parameter),
                ("if_statement", NodeType::IfStatement),
                ("for_statement", NodeType::ForLoop),
                ("while_statement", NodeType::WhileLoop),
                ("try_statement", NodeType::TryCatch),
                ("import_statement", NodeType::Import),
                ("import_from_statement", NodeType::Import),
                ("comment", NodeType::Comment),
                ("string", NodeType::StringLiteral),
            ]),
            pattern_mappings: {
                let mut patterns = vec![PatternMapping {
                    regex: Regex::new(r"^lambda$").expect("static pattern is valid"),
                    node_type: NodeType::ArrowFunction,
                    priority: 10,
                    confidence: PATTERN_MAPPING_CONFIDENCE,
                }];
                patterns.extend(generic_function_like_patterns());
                patterns
            },
            context_rules: vec![ContextRule {
                predicate: |node_kind, parent_kind| {
                    if node_kind == "function_definition"
                        && matches!(parent_kind, Some("class_definition" | "block"))
                    {
                        Some(NodeType::Method)
                    } else {
                        None
                    }
                },
                name: "python_method_context",
            }],
            default_fallback: NodeType::Comment,
        },
        LanguageId::JavaScript | LanguageId::TypeScript => LanguageMapping {
            direct_mappings: HashMap::from([
                ("program", NodeType::File),
                ("class_declaration", NodeType::Class),
                ("function_declaration", NodeType::Function),
                ("method_definition", NodeType::Method),
                ("variable_declarator", NodeType::Variable),
                ("formal_parameters", NodeType::Parameter),
                ("if_statement", NodeType::IfStatement),
                ("for_statement", NodeType::ForLoop),
                ("while_statement", NodeType::WhileLoop),
                ("switch_statement", NodeType::SwitchStatement),
                ("try_statement", NodeType::TryCatch),
                ("import_statement", NodeType::Import),
                ("export_statement", NodeType::Export),
                ("comment", NodeType::Comment),
                ("string", NodeType::StringLiteral),
            ]),
            pattern_mappings: {
                let mut patterns = vec![PatternMapping {
                    regex: Regex::new(r"^arrow_function$").expect("static pattern is valid"),
                    node_type: NodeType::ArrowFunction,
                    priority: 10,
                    confidence: PATTERN_MAPPING_CONFIDENCE,
                }];
                patterns.extend(generic_function_like_patterns());
                patterns
            },
            context_rules: Vec::new(),
            default_fallback: NodeType::Comment,
        },
        LanguageId::Java | LanguageId::Kotlin => LanguageMapping {
            direct_mappings: HashMap::from([
                ("class_declaration", NodeType::Class),
                ("interface_declaration", NodeType::Interface),
                ("method_declaration", NodeType::Method),
                ("formal_parameter", NodeType::Parameter),
                ("field_declaration", NodeType::Field),
                ("if_statement", NodeType::IfStatement),
                ("for_statement", NodeType::ForLoop),
                ("while_statement", NodeType::WhileLoop),
                ("switch_expression", NodeType::SwitchStatement),
                ("try_statement", NodeType::TryCatch),
                ("import_declaration", NodeType::Import),
                ("line_comment", NodeType::Comment),
                ("block_comment", NodeType::Comment),
            ]),
            pattern_mappings: generic_function_like_patterns(),
            context_rules: Vec::new(),
            default_fallback: NodeType::Comment,
        },
        LanguageId::Cpp => LanguageMapping {
            direct_mappings: HashMap::from([
                ("translation_unit", NodeType::File),
                ("function_definition", NodeType::Function),
                ("class_specifier", NodeType::Class),
                ("struct_specifier", NodeType::Class),
                ("parameter_declaration", NodeType::Parameter),
                ("field_declaration", NodeType::Field),
                ("if_statement", NodeType::IfStatement),
                ("for_statement", NodeType::ForLoop),
                ("while_statement", NodeType::WhileLoop),
                ("switch_statement", NodeType::SwitchStatement),
                ("preproc_include", NodeType::Import),
                ("comment", NodeType::Comment),
                ("string_literal", NodeType::StringLiteral),
            ]),
            pattern_mappings: generic_function_like_patterns(),
            context_rules: Vec::new(),
            default_fallback: NodeType::Comment,
        },
    }
}

/// Running classification statistics, accumulated across a parse run.
#[derive(Debug, Clone, Default)]
pub struct ClassifierStats {
    /// Classifications per language.
    pub per_language: HashMap<String, u64>,
    /// Classifications per resolved node type.
    pub per_node_type: HashMap<&'static str, u64>,
    /// Running mean confidence.
    pub average_confidence: f64,
    /// How many classifications fell through to the fallback.
    pub fallback_count: u64,
    total: u64,
    confidence_sum: f64,
}

impl ClassifierStats {
    /// Fold one classification into the running statistics.
    pub fn record(&mut self, language: &str, result: &Classification) {
        *self.per_language.entry(language.to_string()).or_insert(0) += 1;
        let type_str: &'static str = result.node_type.into();
        *self.per_node_type.entry(type_str).or_insert(0) += 1;
        if result.reason == ClassificationReason::Fallback {
            self.fallback_count += 1;
        }
        self.total += 1;
        self.confidence_sum += result.confidence;
        self.average_confidence = self.confidence_sum / self.total as f64;
    }

    /// Zero every counter.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// A single labeled example for [`validate_accuracy`].
pub struct LabeledExample {
    /// Native node kind.
    pub node_kind: &'static str,
    /// Parent's native node kind, if any.
    pub parent_kind: Option<&'static str>,
    /// The type a human labeler assigned.
    pub expected: NodeType,
}

/// Accuracy report returned by [`validate_accuracy`].
#[derive(Debug, Clone, Copy)]
pub struct AccuracyReport {
    /// Number of examples evaluated.
    pub total: usize,
    /// Number classified correctly.
    pub correct: usize,
    /// `correct / total`, or `0.0` when `total == 0`.
    pub percentage: f64,
}

/// Classify every example in `test_set` against `mapping` and report
/// overall accuracy. Misclassifications are a property of the test
/// fixture being exercised, not a runtime policy decision this function
/// makes.
#[must_use]
pub fn validate_accuracy(mapping: &LanguageMapping, test_set: &[LabeledExample]) -> AccuracyReport {
    let total = test_set.len();
    let correct = test_set
        .iter()
        .filter(|example| {
            mapping.classify(example.node_kind, example.parent_kind).node_type == example.expected
        })
        .count();
    AccuracyReport {
        total,
        correct,
        percentage: if total == 0 {
            0.0
        } else {
            correct as f64 / total as f64
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_mapping_wins_over_pattern() {
        let mapping = language_mapping(LanguageId::Rust);
        let result = mapping.classify("struct_item", None);
        assert_eq!(result.node_type, NodeType::Class);
        assert_eq!(result.reason, ClassificationReason::DirectMapping);
        assert!((result.confidence - DIRECT_MAPPING_CONFIDENCE).abs() < f64::EPSILON);
    }

    #[test]
    fn context_rule_disambiguates_method_from_function() {
        let mapping = language_mapping(LanguageId::Rust);
        let method = mapping.classify("function_item", Some("impl_item"));
        assert_eq!(method.node_type, NodeType::Method);
        assert_eq!(method.reason, ClassificationReason::ContextRule);

        let function = mapping.classify("function_item", None);
        assert_eq!(function.node_type, NodeType::Function);
    }

    #[test]
    fn pattern_match_used_when_no_direct_or_context_rule_applies() {
        let mapping = language_mapping(LanguageId::Rust);
        let result = mapping.classify("closure_expression", None);
        assert_eq!(result.node_type, NodeType::ArrowFunction);
        assert_eq!(result.reason, ClassificationReason::PatternMatch);
    }

    #[test]
    fn unknown_function_like_kind_matches_the_generic_pattern() {
        let mapping = language_mapping(LanguageId::TypeScript);
        let result = mapping.classify("custom_function_like_thing", None);
        assert_eq!(result.node_type, NodeType::Function);
        assert_eq!(result.reason, ClassificationReason::PatternMatch);
        assert!((result.confidence - PATTERN_MAPPING_CONFIDENCE).abs() < f64::EPSILON);
    }

    #[test]
    fn unknown_method_like_kind_outranks_the_function_pattern() {
        let mapping = language_mapping(LanguageId::TypeScript);
        let result = mapping.classify("custom_method_definition", None);
        assert_eq!(result.node_type, NodeType::Method);
        assert_eq!(result.reason, ClassificationReason::PatternMatch);
    }

    #[test]
    fn unknown_kind_falls_back() {
        let mapping = language_mapping(LanguageId::Rust);
        let result = mapping.classify("totally_unknown_kind", None);
        assert_eq!(result.reason, ClassificationReason::Fallback);
        assert!((result.confidence - FALLBACK_CONFIDENCE).abs() < f64::EPSILON);
    }

    #[test]
    fn stats_track_fallback_and_average_confidence() {
        let mapping = language_mapping(LanguageId::Rust);
        let mut stats = ClassifierStats::default();
        stats.record("rust", &mapping.classify("struct_item", None));
        stats.record("rust", &mapping.classify("nonexistent_kind", None));
        assert_eq!(stats.fallback_count, 1);
        assert_eq!(stats.per_language.get("rust"), Some(&2));
        stats.reset();
        assert_eq!(stats.fallback_count, 0);
        assert!(stats.per_language.is_empty());
    }

    #[test]
    fn validate_accuracy_reports_percentage() {
        let mapping = language_mapping(LanguageId::Rust);
        let examples = vec![
            LabeledExample {
                node_kind: "struct_item",
                parent_kind: None,
                expected: NodeType::Class,
            },
            LabeledExample {
                node_kind: "function_item",
                parent_kind: Some("impl_item"),
                expected: NodeType::Function,
            },
        ];
        let report = validate_accuracy(&mapping, &examples);
        assert_eq!(report.total, 2);
        assert_eq!(report.correct, 1);
        assert!((report.percentage - 0.5).abs() < f64::EPSILON);
    }
}
