//! JSON interchange format for source units.
//!
//! ```json
//! {
//!   "path": "src/Main.java",
//!   "language_level": 11,
//!   "classes": [],
//!   "root": {
//!     "kind": { "node": "block" },
//!     "list": [
//!       { "kind": { "node": "return" },
//!         "slots": [ { "kind": { "node": "name", "name": "x" }, "ty": { "type": "primitive", "primitive": "int" } } ] }
//!     ]
//!   }
//! }
//! ```
//!
//! Loading builds every node through checked construction, so malformed
//! layouts are reported with the path of the offending node.

use std::path::Path;

use derive_more::{Display, Error, From};
use serde::{Deserialize, Serialize};

use crate::kind::NodeKind;
use crate::location::Span;
use crate::refs::NodeRef;
use crate::tree::{NodeBuilder, SyntaxTree, TreeError};
use crate::types::{ClassInfo, LanguageLevel, TypeDesc};

/// Errors raised while reading a source unit.
#[derive(Debug, Display, Error, From)]
pub enum LoadError {
    #[display("cannot read {path}: {source}")]
    #[from(ignore)]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[display("malformed unit: {_0}")]
    Json(#[error(source)] serde_json::Error),

    #[display("invalid node at {at}: {source}")]
    #[from(ignore)]
    Structure { at: String, source: TreeError },
}

/// Serialized form of one node and its subtree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeDocument {
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Span::is_empty")]
    pub span: Span,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<TypeDesc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub slots: Vec<Option<NodeDocument>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub list: Vec<NodeDocument>,
}

/// Serialized form of a source unit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnitDocument {
    pub path: String,
    #[serde(default)]
    pub language_level: LanguageLevel,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub classes: Vec<ClassInfo>,
    pub root: NodeDocument,
}

/// A loaded source unit: its tree plus the facts the front-end supplied.
#[derive(Clone, Debug)]
pub struct SourceUnit {
    pub path: String,
    pub language_level: LanguageLevel,
    /// Extra class table entries for the resolver.
    pub classes: Vec<ClassInfo>,
    pub tree: SyntaxTree,
}

impl SourceUnit {
    /// Parse and build a unit from JSON text.
    pub fn from_json(text: &str) -> Result<Self, LoadError> {
        let document: UnitDocument = serde_json::from_str(text)?;
        Self::from_document(document)
    }

    /// Read a unit from a JSON file.
    pub fn read(path: &Path) -> Result<Self, LoadError> {
        let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn from_document(document: UnitDocument) -> Result<Self, LoadError> {
        let mut tree = SyntaxTree::new();
        let root = build_node(&mut tree, &document.root, "$")?;
        tree.set_root(root).map_err(|source| LoadError::Structure {
            at: "$".to_owned(),
            source,
        })?;
        tracing::debug!(path = %document.path, nodes = tree.len(), "loaded source unit");
        Ok(SourceUnit {
            path: document.path,
            language_level: document.language_level,
            classes: document.classes,
            tree,
        })
    }

    /// Serializable snapshot of the current tree.
    ///
    /// # Panics
    ///
    /// Panics if the tree has no root; units built by [`SourceUnit::from_document`]
    /// always have one.
    pub fn to_document(&self) -> UnitDocument {
        let root = self
            .tree
            .root()
            .expect("source unit tree always has a root");
        UnitDocument {
            path: self.path.clone(),
            language_level: self.language_level,
            classes: self.classes.clone(),
            root: node_document(&self.tree, root),
        }
    }

    /// Pretty-printed JSON of the current tree.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.to_document())
    }
}

/// Build a detached subtree from its serialized form.
pub fn build_node(
    tree: &mut SyntaxTree,
    document: &NodeDocument,
    at: &str,
) -> Result<NodeRef, LoadError> {
    let mut builder = NodeBuilder::new(document.kind)
        .span(document.span)
        .opt_ty(document.ty.clone());
    for (index, slot) in document.slots.iter().enumerate() {
        let child = match slot {
            Some(child) => Some(build_node(tree, child, &format!("{at}.slots[{index}]"))?),
            None => None,
        };
        builder = builder.opt_slot(child);
    }
    for (index, item) in document.list.iter().enumerate() {
        builder = builder.item(build_node(tree, item, &format!("{at}.list[{index}]"))?);
    }
    tree.try_create(builder)
        .map_err(|source| LoadError::Structure {
            at: at.to_owned(),
            source,
        })
}

/// Serialized form of a subtree.
pub fn node_document(tree: &SyntaxTree, node: NodeRef) -> NodeDocument {
    let data = tree.node(node);
    let mut slots: Vec<Option<NodeDocument>> = data
        .slots()
        .iter()
        .map(|slot| slot.map(|child| node_document(tree, child)))
        .collect();
    // Trailing empty slots are implied by the layout.
    while matches!(slots.last(), Some(None)) {
        slots.pop();
    }
    NodeDocument {
        kind: *data.kind(),
        span: data.span(),
        ty: data.ty().cloned(),
        slots,
        list: data
            .list()
            .iter()
            .map(|&child| node_document(tree, child))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::printer::print_tree;
    use insta::assert_snapshot;

    const UNIT: &str = r#"{
        "path": "Demo.java",
        "language_level": 11,
        "root": {
            "kind": { "node": "block" },
            "list": [
                {
                    "kind": { "node": "return" },
                    "slots": [
                        {
                            "kind": { "node": "unary", "op": "not" },
                            "slots": [ { "kind": { "node": "name", "name": "done" } } ]
                        }
                    ]
                }
            ]
        }
    }"#;

    #[test]
    fn load_unit_from_json() {
        let unit = SourceUnit::from_json(UNIT).unwrap();
        assert_eq!(unit.language_level, LanguageLevel::V11);
        assert_snapshot!(print_tree(&unit.tree), @r"
        {
            return !done;
        }
        ");
    }

    #[test]
    fn dump_then_load_preserves_tree() {
        let unit = SourceUnit::from_json(UNIT).unwrap();
        let json = unit.to_json().unwrap();
        let again = SourceUnit::from_json(&json).unwrap();
        assert_eq!(print_tree(&again.tree), print_tree(&unit.tree));
    }

    #[test]
    fn layout_errors_name_the_node() {
        let text = r#"{
            "path": "Bad.java",
            "root": {
                "kind": { "node": "block" },
                "list": [ { "kind": { "node": "var_type" } } ]
            }
        }"#;
        let err = SourceUnit::from_json(text).unwrap_err();
        assert_snapshot!(err.to_string(), @"invalid node at $: block: list#0 does not accept a var_type node");
    }

    #[test]
    fn missing_required_slot_is_reported() {
        let text = r#"{
            "path": "Bad.java",
            "root": {
                "kind": { "node": "block" },
                "list": [ { "kind": { "node": "expr_stmt" } } ]
            }
        }"#;
        let err = SourceUnit::from_json(text).unwrap_err();
        assert_snapshot!(err.to_string(), @"invalid node at $.list[0]: expr_stmt: required slot #0 is empty");
    }
}
