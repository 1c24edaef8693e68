//! Source printer for syntax trees.
//!
//! Renders nodes in concrete Java-like syntax:
//!
//! ```text
//! class Greeter {
//!     String greet(String name) {
//!         if (name.isEmpty()) {
//!             return "hello";
//!         }
//!         return "hello " + name;
//!     }
//! }
//! ```
//!
//! The printer never inserts parentheses: grouping is whatever `Paren`
//! nodes the tree carries.

use std::fmt::{self, Write};

use crate::kind::{LiteralKind, NodeKind};
use crate::refs::NodeRef;
use crate::tree::SyntaxTree;

const INDENT: &str = "    ";

struct Printer<'a, W> {
    tree: &'a SyntaxTree,
    out: W,
    indent: usize,
}

// ============================================================================
// Public API
// ============================================================================

/// Print a node (and its subtree) as source text.
pub fn print_node(tree: &SyntaxTree, node: NodeRef) -> String {
    let mut printer = Printer {
        tree,
        out: String::new(),
        indent: 0,
    };
    printer
        .node(node)
        .expect("fmt::Write to String never fails");
    printer.out
}

/// Print the attached tree, or an empty string for a tree without root.
pub fn print_tree(tree: &SyntaxTree) -> String {
    tree.root()
        .map(|root| print_node(tree, root))
        .unwrap_or_default()
}

/// Escape literal content for a quoted string or character literal.
pub fn escape_literal(text: &str, quote: char) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out
}

// ============================================================================
// Printing
// ============================================================================

impl<W: Write> Printer<'_, W> {
    fn newline(&mut self) -> fmt::Result {
        self.out.write_char('\n')?;
        for _ in 0..self.indent {
            self.out.write_str(INDENT)?;
        }
        Ok(())
    }

    fn slot(&mut self, node: NodeRef, index: usize) -> fmt::Result {
        match self.tree.slot(node, index) {
            Some(child) => self.node(child),
            None => Ok(()),
        }
    }

    fn comma_list(&mut self, nodes: &[NodeRef]) -> fmt::Result {
        for (i, &n) in nodes.iter().enumerate() {
            if i > 0 {
                self.out.write_str(", ")?;
            }
            self.node(n)?;
        }
        Ok(())
    }

    /// Print members one per line inside braces, separated by blank lines.
    fn member_body(&mut self, members: &[NodeRef]) -> fmt::Result {
        if members.is_empty() {
            return self.out.write_str("{}");
        }
        self.out.write_char('{')?;
        self.indent += 1;
        for (i, &member) in members.iter().enumerate() {
            if i > 0 {
                self.out.write_char('\n')?;
            }
            self.newline()?;
            self.node(member)?;
        }
        self.indent -= 1;
        self.newline()?;
        self.out.write_char('}')
    }

    fn node(&mut self, node: NodeRef) -> fmt::Result {
        let tree = self.tree;
        let list = tree.list(node);
        match *tree.kind(node) {
            // === Declarations ===
            NodeKind::CompilationUnit { package } => {
                let mut first = true;
                if let Some(package) = package {
                    write!(self.out, "package {package};")?;
                    first = false;
                }
                if let Some(imports) = tree.slot(node, 0) {
                    if !tree.list(imports).is_empty() {
                        if !first {
                            self.out.write_str("\n\n")?;
                        }
                        self.node(imports)?;
                        first = false;
                    }
                }
                for &member in list {
                    if !first {
                        self.out.write_str("\n\n")?;
                    }
                    self.node(member)?;
                    first = false;
                }
                Ok(())
            }
            NodeKind::ImportList => {
                for (i, &import) in list.iter().enumerate() {
                    if i > 0 {
                        self.newline()?;
                    }
                    self.node(import)?;
                }
                Ok(())
            }
            NodeKind::Import {
                path,
                is_static,
                wildcard,
            } => {
                self.out.write_str("import ")?;
                if is_static {
                    self.out.write_str("static ")?;
                }
                write!(self.out, "{path}")?;
                if wildcard {
                    self.out.write_str(".*")?;
                }
                self.out.write_char(';')
            }
            NodeKind::ClassDecl { name, class_kind } => {
                self.slot(node, 0)?;
                write!(self.out, "{} {name} ", class_kind.keyword())?;
                self.member_body(list)
            }
            NodeKind::MethodDecl { name } => {
                self.slot(node, 0)?;
                self.slot(node, 1)?;
                write!(self.out, " {name}(")?;
                self.comma_list(list)?;
                self.out.write_char(')')?;
                match tree.slot(node, 2) {
                    Some(body) => {
                        self.out.write_char(' ')?;
                        self.node(body)
                    }
                    None => self.out.write_char(';'),
                }
            }
            NodeKind::ConstructorDecl { name } => {
                self.slot(node, 0)?;
                write!(self.out, "{name}(")?;
                self.comma_list(list)?;
                self.out.write_str(") ")?;
                self.slot(node, 1)
            }
            NodeKind::FieldDecl { name } => {
                self.slot(node, 0)?;
                self.slot(node, 1)?;
                write!(self.out, " {name}")?;
                if let Some(init) = tree.slot(node, 2) {
                    self.out.write_str(" = ")?;
                    self.node(init)?;
                }
                self.out.write_char(';')
            }
            NodeKind::Modifiers => {
                for &modifier in list {
                    self.node(modifier)?;
                    self.out.write_char(' ')?;
                }
                Ok(())
            }
            NodeKind::Modifier { keyword } => self.out.write_str(keyword.keyword()),
            NodeKind::Param { name } => {
                if let Some(ty) = tree.slot(node, 0) {
                    self.node(ty)?;
                    self.out.write_char(' ')?;
                }
                write!(self.out, "{name}")
            }

            // === Types ===
            NodeKind::PrimitiveType { primitive } => self.out.write_str(primitive.keyword()),
            NodeKind::ClassType { name, diamond } => {
                write!(self.out, "{name}")?;
                if !list.is_empty() {
                    self.out.write_char('<')?;
                    self.comma_list(list)?;
                    self.out.write_char('>')?;
                } else if diamond {
                    self.out.write_str("<>")?;
                }
                Ok(())
            }
            NodeKind::ArrayType => {
                self.slot(node, 0)?;
                self.out.write_str("[]")
            }
            NodeKind::VarType => self.out.write_str("var"),

            // === Statements ===
            NodeKind::Block => {
                if list.is_empty() {
                    return self.out.write_str("{}");
                }
                self.out.write_char('{')?;
                self.indent += 1;
                for &stmt in list {
                    self.newline()?;
                    self.node(stmt)?;
                }
                self.indent -= 1;
                self.newline()?;
                self.out.write_char('}')
            }
            NodeKind::ExprStmt => {
                self.slot(node, 0)?;
                self.out.write_char(';')
            }
            NodeKind::LocalVar { name } => {
                self.slot(node, 0)?;
                write!(self.out, " {name}")?;
                if let Some(init) = tree.slot(node, 1) {
                    self.out.write_str(" = ")?;
                    self.node(init)?;
                }
                self.out.write_char(';')
            }
            NodeKind::If => {
                self.out.write_str("if (")?;
                self.slot(node, 0)?;
                self.out.write_str(") ")?;
                self.slot(node, 1)?;
                if let Some(otherwise) = tree.slot(node, 2) {
                    self.out.write_str(" else ")?;
                    self.node(otherwise)?;
                }
                Ok(())
            }
            NodeKind::While => {
                self.out.write_str("while (")?;
                self.slot(node, 0)?;
                self.out.write_str(") ")?;
                self.slot(node, 1)
            }
            NodeKind::ForEach { name } => {
                self.out.write_str("for (")?;
                self.slot(node, 0)?;
                write!(self.out, " {name} : ")?;
                self.slot(node, 1)?;
                self.out.write_str(") ")?;
                self.slot(node, 2)
            }
            NodeKind::Return => match tree.slot(node, 0) {
                Some(value) => {
                    self.out.write_str("return ")?;
                    self.node(value)?;
                    self.out.write_char(';')
                }
                None => self.out.write_str("return;"),
            },
            NodeKind::Throw => {
                self.out.write_str("throw ")?;
                self.slot(node, 0)?;
                self.out.write_char(';')
            }
            NodeKind::Break => self.out.write_str("break;"),
            NodeKind::Continue => self.out.write_str("continue;"),
            NodeKind::Empty => self.out.write_char(';'),
            NodeKind::ExplicitConstructorCall { is_super } => {
                self.out.write_str(if is_super { "super(" } else { "this(" })?;
                self.comma_list(list)?;
                self.out.write_str(");")
            }

            // === Expressions ===
            NodeKind::Name { name } | NodeKind::TypeName { name } => write!(self.out, "{name}"),
            NodeKind::This => self.out.write_str("this"),
            NodeKind::Literal { literal, text } => match literal {
                LiteralKind::String => text.with_str(|s| {
                    write!(self.out, "\"{}\"", escape_literal(s, '"'))
                }),
                LiteralKind::Char => {
                    text.with_str(|s| write!(self.out, "'{}'", escape_literal(s, '\'')))
                }
                _ => write!(self.out, "{text}"),
            },
            NodeKind::Unary { op } => {
                if op.is_postfix() {
                    self.slot(node, 0)?;
                    self.out.write_str(op.token())
                } else {
                    self.out.write_str(op.token())?;
                    self.slot(node, 0)
                }
            }
            NodeKind::Binary { op } => {
                self.slot(node, 0)?;
                write!(self.out, " {} ", op.token())?;
                self.slot(node, 1)
            }
            NodeKind::Conditional => {
                self.slot(node, 0)?;
                self.out.write_str(" ? ")?;
                self.slot(node, 1)?;
                self.out.write_str(" : ")?;
                self.slot(node, 2)
            }
            NodeKind::Assign { op } => {
                self.slot(node, 0)?;
                write!(self.out, " {} ", op.token())?;
                self.slot(node, 1)
            }
            NodeKind::Paren => {
                self.out.write_char('(')?;
                self.slot(node, 0)?;
                self.out.write_char(')')
            }
            NodeKind::MethodCall { name } => {
                if let Some(receiver) = tree.slot(node, 0) {
                    self.node(receiver)?;
                    self.out.write_char('.')?;
                }
                write!(self.out, "{name}(")?;
                self.comma_list(list)?;
                self.out.write_char(')')
            }
            NodeKind::FieldAccess { name } => {
                self.slot(node, 0)?;
                write!(self.out, ".{name}")
            }
            NodeKind::New => {
                self.out.write_str("new ")?;
                self.slot(node, 0)?;
                self.out.write_char('(')?;
                self.comma_list(list)?;
                self.out.write_char(')')
            }
            NodeKind::InstanceOf => {
                self.slot(node, 0)?;
                self.out.write_str(" instanceof ")?;
                self.slot(node, 1)
            }
            NodeKind::Cast => {
                self.out.write_char('(')?;
                self.slot(node, 0)?;
                self.out.write_str(") ")?;
                self.slot(node, 1)
            }
            NodeKind::Lambda { parenthesized } => {
                let bare = list.len() == 1
                    && !parenthesized
                    && tree.slot(list[0], 0).is_none();
                if bare {
                    self.node(list[0])?;
                } else {
                    self.out.write_char('(')?;
                    self.comma_list(list)?;
                    self.out.write_char(')')?;
                }
                self.out.write_str(" -> ")?;
                self.slot(node, 0)
            }
            NodeKind::MethodRef { name } => {
                self.slot(node, 0)?;
                write!(self.out, "::{name}")
            }
            NodeKind::ArrayAccess => {
                self.slot(node, 0)?;
                self.out.write_char('[')?;
                self.slot(node, 1)?;
                self.out.write_char(']')
            }
        }
    }
}
