//! Node kinds, categories and structural layouts.
//!
//! Every node kind declares a [`Layout`]: a fixed sequence of slots followed
//! by an optional variadic list. The tree consults the layout whenever a
//! child is attached, replaced or removed, so structurally invalid trees
//! cannot be produced through the mutation primitives.

use serde::{Deserialize, Serialize};

use crate::Symbol;

// ============================================================================
// Leaf enums
// ============================================================================

/// Built-in primitive types (plus `void` for method return types).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimitiveKind {
    Boolean,
    Byte,
    Short,
    Char,
    Int,
    Long,
    Float,
    Double,
    Void,
}

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; 9] = [
        PrimitiveKind::Boolean,
        PrimitiveKind::Byte,
        PrimitiveKind::Short,
        PrimitiveKind::Char,
        PrimitiveKind::Int,
        PrimitiveKind::Long,
        PrimitiveKind::Float,
        PrimitiveKind::Double,
        PrimitiveKind::Void,
    ];

    pub fn keyword(self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Byte => "byte",
            PrimitiveKind::Short => "short",
            PrimitiveKind::Char => "char",
            PrimitiveKind::Int => "int",
            PrimitiveKind::Long => "long",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Double => "double",
            PrimitiveKind::Void => "void",
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.keyword() == keyword)
    }

    /// Integral types (including `char`), where `==` is exact value equality.
    pub fn is_integral(self) -> bool {
        matches!(
            self,
            PrimitiveKind::Byte
                | PrimitiveKind::Short
                | PrimitiveKind::Char
                | PrimitiveKind::Int
                | PrimitiveKind::Long
        )
    }

    pub fn is_numeric(self) -> bool {
        self.is_integral() || matches!(self, PrimitiveKind::Float | PrimitiveKind::Double)
    }

    /// Qualified name of the wrapper class, if any.
    pub fn boxed_class(self) -> Option<&'static str> {
        Some(match self {
            PrimitiveKind::Boolean => "java.lang.Boolean",
            PrimitiveKind::Byte => "java.lang.Byte",
            PrimitiveKind::Short => "java.lang.Short",
            PrimitiveKind::Char => "java.lang.Character",
            PrimitiveKind::Int => "java.lang.Integer",
            PrimitiveKind::Long => "java.lang.Long",
            PrimitiveKind::Float => "java.lang.Float",
            PrimitiveKind::Double => "java.lang.Double",
            PrimitiveKind::Void => return None,
        })
    }

    /// Inverse of [`PrimitiveKind::boxed_class`]; accepts simple or qualified names.
    pub fn from_boxed_class(name: &str) -> Option<Self> {
        let simple = name.rsplit('.').next().unwrap_or(name);
        if name.contains('.') && !name.starts_with("java.lang.") {
            return None;
        }
        Self::ALL.into_iter().find(|p| {
            p.boxed_class()
                .is_some_and(|boxed| boxed.rsplit('.').next() == Some(simple))
        })
    }
}

/// Declaration modifiers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifierKeyword {
    Public,
    Protected,
    Private,
    Abstract,
    Static,
    Final,
    Default,
    Synchronized,
    Native,
    Transient,
    Volatile,
    Strictfp,
}

impl ModifierKeyword {
    pub fn keyword(self) -> &'static str {
        match self {
            ModifierKeyword::Public => "public",
            ModifierKeyword::Protected => "protected",
            ModifierKeyword::Private => "private",
            ModifierKeyword::Abstract => "abstract",
            ModifierKeyword::Static => "static",
            ModifierKeyword::Final => "final",
            ModifierKeyword::Default => "default",
            ModifierKeyword::Synchronized => "synchronized",
            ModifierKeyword::Native => "native",
            ModifierKeyword::Transient => "transient",
            ModifierKeyword::Volatile => "volatile",
            ModifierKeyword::Strictfp => "strictfp",
        }
    }
}

/// Flavor of a class-like declaration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassKind {
    Class,
    Interface,
    Enum,
    Record,
}

impl ClassKind {
    pub fn keyword(self) -> &'static str {
        match self {
            ClassKind::Class => "class",
            ClassKind::Interface => "interface",
            ClassKind::Enum => "enum",
            ClassKind::Record => "record",
        }
    }
}

/// Literal token classes.
///
/// The accompanying text is the source token for numbers and booleans and
/// the unescaped content for strings and characters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiteralKind {
    Int,
    Long,
    Float,
    Double,
    Char,
    String,
    Boolean,
    Null,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    Not,
    Neg,
    Plus,
    BitNot,
    PreInc,
    PreDec,
    PostInc,
    PostDec,
}

impl UnaryOp {
    pub fn token(self) -> &'static str {
        match self {
            UnaryOp::Not => "!",
            UnaryOp::Neg => "-",
            UnaryOp::Plus => "+",
            UnaryOp::BitNot => "~",
            UnaryOp::PreInc | UnaryOp::PostInc => "++",
            UnaryOp::PreDec | UnaryOp::PostDec => "--",
        }
    }

    pub fn is_postfix(self) -> bool {
        matches!(self, UnaryOp::PostInc | UnaryOp::PostDec)
    }

    /// Operators that write to their operand.
    pub fn has_side_effect(self) -> bool {
        matches!(
            self,
            UnaryOp::PreInc | UnaryOp::PreDec | UnaryOp::PostInc | UnaryOp::PostDec
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    Or,
    And,
    BitOr,
    BitXor,
    BitAnd,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    Shl,
    Shr,
    UShr,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl BinaryOp {
    pub fn token(self) -> &'static str {
        match self {
            BinaryOp::Or => "||",
            BinaryOp::And => "&&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::BitAnd => "&",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Le => "<=",
            BinaryOp::Ge => ">=",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::UShr => ">>>",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
        }
    }

    pub fn is_equality(self) -> bool {
        matches!(self, BinaryOp::Eq | BinaryOp::Ne)
    }

    pub fn is_relational(self) -> bool {
        matches!(self, BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge)
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOp::Or | BinaryOp::And)
    }

    /// Binding strength; higher binds tighter. `instanceof` sits at the
    /// relational level.
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOp::Or => 1,
            BinaryOp::And => 2,
            BinaryOp::BitOr => 3,
            BinaryOp::BitXor => 4,
            BinaryOp::BitAnd => 5,
            BinaryOp::Eq | BinaryOp::Ne => 6,
            BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge => 7,
            BinaryOp::Shl | BinaryOp::Shr | BinaryOp::UShr => 8,
            BinaryOp::Add | BinaryOp::Sub => 9,
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => 10,
        }
    }

    /// The operator computing the boolean complement (`==` ↔ `!=`, `<` ↔ `>=`, ...).
    pub fn negated(self) -> Option<BinaryOp> {
        Some(match self {
            BinaryOp::Eq => BinaryOp::Ne,
            BinaryOp::Ne => BinaryOp::Eq,
            BinaryOp::Lt => BinaryOp::Ge,
            BinaryOp::Ge => BinaryOp::Lt,
            BinaryOp::Gt => BinaryOp::Le,
            BinaryOp::Le => BinaryOp::Gt,
            _ => return None,
        })
    }

    /// The operator to use once the operands are swapped (`a < b` ≡ `b > a`).
    pub fn mirrored(self) -> Option<BinaryOp> {
        Some(match self {
            BinaryOp::Eq => BinaryOp::Eq,
            BinaryOp::Ne => BinaryOp::Ne,
            BinaryOp::Lt => BinaryOp::Gt,
            BinaryOp::Gt => BinaryOp::Lt,
            BinaryOp::Le => BinaryOp::Ge,
            BinaryOp::Ge => BinaryOp::Le,
            _ => return None,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    UShr,
}

impl AssignOp {
    pub fn token(self) -> &'static str {
        match self {
            AssignOp::Assign => "=",
            AssignOp::Add => "+=",
            AssignOp::Sub => "-=",
            AssignOp::Mul => "*=",
            AssignOp::Div => "/=",
            AssignOp::Rem => "%=",
            AssignOp::And => "&=",
            AssignOp::Or => "|=",
            AssignOp::Xor => "^=",
            AssignOp::Shl => "<<=",
            AssignOp::Shr => ">>=",
            AssignOp::UShr => ">>>=",
        }
    }
}

// ============================================================================
// NodeKind
// ============================================================================

/// The tagged union of all node kinds.
///
/// Children are not part of the kind: they live in the node's slots and list,
/// as described by [`NodeKind::layout`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum NodeKind {
    // === Declarations ===
    /// `[import-list]` + members.
    CompilationUnit {
        #[serde(default)]
        package: Option<Symbol>,
    },
    /// Imports.
    ImportList,
    Import {
        path: Symbol,
        #[serde(default)]
        is_static: bool,
        #[serde(default)]
        wildcard: bool,
    },
    /// `[modifiers]` + members.
    ClassDecl { name: Symbol, class_kind: ClassKind },
    /// `[modifiers, return type, body?]` + parameters.
    MethodDecl { name: Symbol },
    /// `[modifiers, body]` + parameters.
    ConstructorDecl { name: Symbol },
    /// `[modifiers, type, initializer?]`.
    FieldDecl { name: Symbol },
    /// Modifier keywords.
    Modifiers,
    Modifier { keyword: ModifierKeyword },
    /// `[type?]`; lambda parameters may be untyped.
    Param { name: Symbol },

    // === Types ===
    PrimitiveType { primitive: PrimitiveKind },
    /// Type arguments in the list. `diamond` prints `<>` when the list is empty.
    ClassType {
        name: Symbol,
        #[serde(default)]
        diamond: bool,
    },
    /// `[element type]`.
    ArrayType,
    /// The inferred local variable type `var`.
    VarType,

    // === Statements ===
    /// Statements.
    Block,
    /// `[expr]`.
    ExprStmt,
    /// `[type, initializer?]`.
    LocalVar { name: Symbol },
    /// `[condition, then, else?]`.
    If,
    /// `[condition, body]`.
    While,
    /// `[variable type, iterable, body]`.
    ForEach { name: Symbol },
    /// `[value?]`.
    Return,
    /// `[exception]`.
    Throw,
    Break,
    Continue,
    /// A stray `;`.
    Empty,
    /// `this(...)` / `super(...)` with the arguments in the list.
    ExplicitConstructorCall { is_super: bool },

    // === Expressions ===
    Name { name: Symbol },
    /// A type used in expression position (`Integer` in `Integer.valueOf(1)`).
    TypeName { name: Symbol },
    This,
    Literal { literal: LiteralKind, text: Symbol },
    /// `[operand]`.
    Unary { op: UnaryOp },
    /// `[lhs, rhs]`.
    Binary { op: BinaryOp },
    /// `[condition, then, else]`.
    Conditional,
    /// `[target, value]`.
    Assign { op: AssignOp },
    /// `[inner]`.
    Paren,
    /// `[receiver?]` + arguments.
    MethodCall { name: Symbol },
    /// `[receiver]`.
    FieldAccess { name: Symbol },
    /// `[type]` + arguments.
    New,
    /// `[expr, type]`.
    InstanceOf,
    /// `[type, expr]`.
    Cast,
    /// `[body]` + parameters. `parenthesized` keeps `(x) -> ...` for one parameter.
    Lambda {
        #[serde(default)]
        parenthesized: bool,
    },
    /// `[qualifier]`.
    MethodRef { name: Symbol },
    /// `[array, index]`.
    ArrayAccess,
}

/// Coarse classification of node kinds, used by slot acceptance and by the
/// driver to decide which rule granularities see a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeCategory {
    Unit,
    ImportList,
    Import,
    Member,
    ModifierList,
    Modifier,
    Param,
    Type,
    Statement,
    Expression,
}

/// What a slot or list position admits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SlotClass {
    Expr,
    Stmt,
    /// Only a `Block` statement.
    Block,
    Type,
    Member,
    Modifier,
    Modifiers,
    Import,
    Imports,
    Param,
    /// An expression or a `Block`.
    LambdaBody,
    Any,
}

impl SlotClass {
    pub fn accepts(self, kind: &NodeKind) -> bool {
        let category = kind.category();
        match self {
            SlotClass::Expr => category == NodeCategory::Expression,
            SlotClass::Stmt => category == NodeCategory::Statement,
            SlotClass::Block => matches!(kind, NodeKind::Block),
            SlotClass::Type => category == NodeCategory::Type,
            SlotClass::Member => category == NodeCategory::Member,
            SlotClass::Modifier => category == NodeCategory::Modifier,
            SlotClass::Modifiers => category == NodeCategory::ModifierList,
            SlotClass::Import => category == NodeCategory::Import,
            SlotClass::Imports => category == NodeCategory::ImportList,
            SlotClass::Param => category == NodeCategory::Param,
            SlotClass::LambdaBody => {
                category == NodeCategory::Expression || matches!(kind, NodeKind::Block)
            }
            SlotClass::Any => true,
        }
    }
}

/// One fixed slot of a layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlotSpec {
    pub class: SlotClass,
    pub optional: bool,
}

/// The variadic tail of a layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ListSpec {
    pub class: SlotClass,
    pub min: usize,
}

/// Structural shape of a node kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Layout {
    pub slots: &'static [SlotSpec],
    pub list: Option<ListSpec>,
}

const fn req(class: SlotClass) -> SlotSpec {
    SlotSpec {
        class,
        optional: false,
    }
}

const fn opt(class: SlotClass) -> SlotSpec {
    SlotSpec {
        class,
        optional: true,
    }
}

const fn list(class: SlotClass) -> Option<ListSpec> {
    Some(ListSpec { class, min: 0 })
}

const LEAF: Layout = Layout {
    slots: &[],
    list: None,
};

impl NodeKind {
    pub fn category(&self) -> NodeCategory {
        use NodeKind::*;
        match self {
            CompilationUnit { .. } => NodeCategory::Unit,
            ImportList => NodeCategory::ImportList,
            Import { .. } => NodeCategory::Import,
            ClassDecl { .. } | MethodDecl { .. } | ConstructorDecl { .. } | FieldDecl { .. } => {
                NodeCategory::Member
            }
            Modifiers => NodeCategory::ModifierList,
            Modifier { .. } => NodeCategory::Modifier,
            Param { .. } => NodeCategory::Param,
            PrimitiveType { .. } | ClassType { .. } | ArrayType | VarType => NodeCategory::Type,
            Block
            | ExprStmt
            | LocalVar { .. }
            | If
            | While
            | ForEach { .. }
            | Return
            | Throw
            | Break
            | Continue
            | Empty
            | ExplicitConstructorCall { .. } => NodeCategory::Statement,
            Name { .. }
            | TypeName { .. }
            | This
            | Literal { .. }
            | Unary { .. }
            | Binary { .. }
            | Conditional
            | Assign { .. }
            | Paren
            | MethodCall { .. }
            | FieldAccess { .. }
            | New
            | InstanceOf
            | Cast
            | Lambda { .. }
            | MethodRef { .. }
            | ArrayAccess => NodeCategory::Expression,
        }
    }

    pub fn layout(&self) -> Layout {
        use NodeKind::*;
        use SlotClass as C;
        match self {
            CompilationUnit { .. } => Layout {
                slots: const { &[req(C::Imports)] },
                list: list(C::Member),
            },
            ImportList => Layout {
                slots: &[],
                list: list(C::Import),
            },
            ClassDecl { .. } => Layout {
                slots: const { &[req(C::Modifiers)] },
                list: list(C::Member),
            },
            MethodDecl { .. } => Layout {
                slots: const { &[req(C::Modifiers), req(C::Type), opt(C::Block)] },
                list: list(C::Param),
            },
            ConstructorDecl { .. } => Layout {
                slots: const { &[req(C::Modifiers), req(C::Block)] },
                list: list(C::Param),
            },
            FieldDecl { .. } => Layout {
                slots: const { &[req(C::Modifiers), req(C::Type), opt(C::Expr)] },
                list: None,
            },
            Modifiers => Layout {
                slots: &[],
                list: list(C::Modifier),
            },
            Param { .. } => Layout {
                slots: const { &[opt(C::Type)] },
                list: None,
            },
            ClassType { .. } => Layout {
                slots: &[],
                list: list(C::Type),
            },
            ArrayType => Layout {
                slots: const { &[req(C::Type)] },
                list: None,
            },
            Block => Layout {
                slots: &[],
                list: list(C::Stmt),
            },
            ExprStmt | Throw => Layout {
                slots: const { &[req(C::Expr)] },
                list: None,
            },
            LocalVar { .. } => Layout {
                slots: const { &[req(C::Type), opt(C::Expr)] },
                list: None,
            },
            If => Layout {
                slots: const { &[req(C::Expr), req(C::Stmt), opt(C::Stmt)] },
                list: None,
            },
            While => Layout {
                slots: const { &[req(C::Expr), req(C::Stmt)] },
                list: None,
            },
            ForEach { .. } => Layout {
                slots: const { &[req(C::Type), req(C::Expr), req(C::Stmt)] },
                list: None,
            },
            Return => Layout {
                slots: const { &[opt(C::Expr)] },
                list: None,
            },
            ExplicitConstructorCall { .. } => Layout {
                slots: &[],
                list: list(C::Expr),
            },
            Unary { .. } | Paren | FieldAccess { .. } | MethodRef { .. } => Layout {
                slots: const { &[req(C::Expr)] },
                list: None,
            },
            Binary { .. } | Assign { .. } | ArrayAccess => Layout {
                slots: const { &[req(C::Expr), req(C::Expr)] },
                list: None,
            },
            Conditional => Layout {
                slots: const { &[req(C::Expr), req(C::Expr), req(C::Expr)] },
                list: None,
            },
            MethodCall { .. } => Layout {
                slots: const { &[opt(C::Expr)] },
                list: list(C::Expr),
            },
            New => Layout {
                slots: const { &[req(C::Type)] },
                list: list(C::Expr),
            },
            InstanceOf => Layout {
                slots: const { &[req(C::Expr), req(C::Type)] },
                list: None,
            },
            Cast => Layout {
                slots: const { &[req(C::Type), req(C::Expr)] },
                list: None,
            },
            Lambda { .. } => Layout {
                slots: const { &[req(C::LambdaBody)] },
                list: list(C::Param),
            },
            Import { .. }
            | Modifier { .. }
            | PrimitiveType { .. }
            | VarType
            | Break
            | Continue
            | Empty
            | Name { .. }
            | TypeName { .. }
            | This
            | Literal { .. } => LEAF,
        }
    }

    /// Short kind name for diagnostics (`"method_call"`, `"if"`, ...).
    pub fn tag(&self) -> &'static str {
        use NodeKind::*;
        match self {
            CompilationUnit { .. } => "compilation_unit",
            ImportList => "import_list",
            Import { .. } => "import",
            ClassDecl { .. } => "class_decl",
            MethodDecl { .. } => "method_decl",
            ConstructorDecl { .. } => "constructor_decl",
            FieldDecl { .. } => "field_decl",
            Modifiers => "modifiers",
            Modifier { .. } => "modifier",
            Param { .. } => "param",
            PrimitiveType { .. } => "primitive_type",
            ClassType { .. } => "class_type",
            ArrayType => "array_type",
            VarType => "var_type",
            Block => "block",
            ExprStmt => "expr_stmt",
            LocalVar { .. } => "local_var",
            If => "if",
            While => "while",
            ForEach { .. } => "for_each",
            Return => "return",
            Throw => "throw",
            Break => "break",
            Continue => "continue",
            Empty => "empty",
            ExplicitConstructorCall { .. } => "explicit_constructor_call",
            Name { .. } => "name",
            TypeName { .. } => "type_name",
            This => "this",
            Literal { .. } => "literal",
            Unary { .. } => "unary",
            Binary { .. } => "binary",
            Conditional => "conditional",
            Assign { .. } => "assign",
            Paren => "paren",
            MethodCall { .. } => "method_call",
            FieldAccess { .. } => "field_access",
            New => "new",
            InstanceOf => "instance_of",
            Cast => "cast",
            Lambda { .. } => "lambda",
            MethodRef { .. } => "method_ref",
            ArrayAccess => "array_access",
        }
    }

    /// The declared or referenced name carried by the kind, if any.
    pub fn name(&self) -> Option<Symbol> {
        use NodeKind::*;
        match self {
            ClassDecl { name, .. }
            | MethodDecl { name }
            | ConstructorDecl { name }
            | FieldDecl { name }
            | Param { name }
            | ClassType { name, .. }
            | LocalVar { name }
            | ForEach { name }
            | Name { name }
            | TypeName { name }
            | MethodCall { name }
            | FieldAccess { name }
            | MethodRef { name } => Some(*name),
            Import { path, .. } => Some(*path),
            _ => None,
        }
    }

    pub fn is_expression(&self) -> bool {
        self.category() == NodeCategory::Expression
    }

    pub fn is_statement(&self) -> bool {
        self.category() == NodeCategory::Statement
    }
}
