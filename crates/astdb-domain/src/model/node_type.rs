//! The closed set of AST node tags.

use serde::{Deserialize, Serialize};
use strum_macros::{EnumIter, IntoStaticStr};

/// Canonical node classification.
///
/// New tags may only be appended; existing ones are never renumbered
/// (spec §3). `#[non_exhaustive]` enforces that at the type level for
/// downstream crates outside this workspace.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum NodeType {
    /// A whole source file.
    File,
    /// A module / namespace-like grouping unit.
    Module,
    /// A namespace.
    Namespace,
    /// A class declaration.
    Class,
    /// An interface/trait declaration.
    Interface,
    /// An enum declaration.
    Enum,
    /// A type alias.
    TypeAlias,
    /// A free function.
    Function,
    /// A method on a class/struct/impl.
    Method,
    /// A constructor.
    Constructor,
    /// A property getter.
    Getter,
    /// A property setter.
    Setter,
    /// An arrow/lambda/closure function.
    ArrowFunction,
    /// A variable binding.
    Variable,
    /// A function/method parameter.
    Parameter,
    /// A class/interface property.
    Property,
    /// A struct/class field.
    Field,
    /// An `if` statement.
    IfStatement,
    /// A `for` loop.
    ForLoop,
    /// A `while` loop.
    WhileLoop,
    /// A `switch`/`match` statement.
    SwitchStatement,
    /// A `try`/`catch` construct.
    TryCatch,
    /// An import statement.
    Import,
    /// An export statement.
    Export,
    /// A decorator/attribute/annotation macro.
    Decorator,
    /// A comment.
    Comment,
    /// A string literal.
    StringLiteral,
}

impl NodeType {
    /// Whether this node type may contain other semantically meaningful
    /// children (spec §4.C3 `isContainerType`).
    #[must_use]
    pub fn is_container_type(self) -> bool {
        matches!(
            self,
            Self::File
                | Self::Module
                | Self::Namespace
                | Self::Class
                | Self::Interface
                | Self::Enum
                | Self::Function
                | Self::Method
                | Self::ForLoop
                | Self::WhileLoop
                | Self::TryCatch
        )
    }

    /// Whether this node type introduces a named declaration (spec
    /// §4.C3 `isDeclarationType`).
    #[must_use]
    pub fn is_declaration_type(self) -> bool {
        matches!(
            self,
            Self::Class
                | Self::Function
                | Self::Variable
                | Self::Interface
                | Self::Parameter
                | Self::Property
                | Self::Field
                | Self::Enum
                | Self::TypeAlias
        )
    }

    /// Depth in the canonical structural hierarchy (spec §4.C3
    /// `getHierarchyLevel`), used to order nodes for display and for
    /// annotation/quality heuristics that weight shallower nodes more.
    #[must_use]
    pub fn hierarchy_level(self) -> u8 {
        match self {
            Self::File => 0,
            Self::Module => 1,
            Self::Namespace => 2,
            Self::Class | Self::Interface | Self::Enum => 3,
            Self::Function | Self::Method | Self::Constructor => 4,
            Self::IfStatement
            | Self::ForLoop
            | Self::WhileLoop
            | Self::SwitchStatement
            | Self::TryCatch => 5,
            Self::Variable => 6,
            Self::Parameter => 7,
            _ => 8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn container_types_include_class_and_function() {
        assert!(NodeType::Class.is_container_type());
        assert!(NodeType::Function.is_container_type());
        assert!(!NodeType::Variable.is_container_type());
    }

    #[test]
    fn hierarchy_matches_spec_table() {
        assert_eq!(NodeType::File.hierarchy_level(), 0);
        assert_eq!(NodeType::Class.hierarchy_level(), 3);
        assert_eq!(NodeType::Parameter.hierarchy_level(), 7);
        assert_eq!(NodeType::Comment.hierarchy_level(), 8);
    }

    #[test]
    fn serializes_as_snake_case() {
        let json = serde_json::to_string(&NodeType::ArrowFunction).unwrap();
        assert_eq!(json, "\"arrow_function\"");
    }
}
