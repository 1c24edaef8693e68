//! Static type descriptors and language levels.

use serde::{Deserialize, Serialize};

use crate::Symbol;
use crate::kind::PrimitiveKind;

// ============================================================================
// LanguageLevel
// ============================================================================

/// A language version, as the major release number (`8`, `11`, `17`, ...).
///
/// Rules declare the lowest level their output compiles under; projects
/// declare the level they target.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct LanguageLevel(pub u16);

impl LanguageLevel {
    pub const V5: LanguageLevel = LanguageLevel(5);
    pub const V6: LanguageLevel = LanguageLevel(6);
    pub const V7: LanguageLevel = LanguageLevel(7);
    pub const V8: LanguageLevel = LanguageLevel(8);
    pub const V10: LanguageLevel = LanguageLevel(10);
    pub const V11: LanguageLevel = LanguageLevel(11);
    pub const V17: LanguageLevel = LanguageLevel(17);
    pub const V21: LanguageLevel = LanguageLevel(21);

    /// The lowest level every rule is assumed to support.
    pub const BASELINE: LanguageLevel = LanguageLevel::V5;
    pub const LATEST: LanguageLevel = LanguageLevel::V21;
}

impl Default for LanguageLevel {
    fn default() -> Self {
        LanguageLevel::V8
    }
}

impl std::fmt::Display for LanguageLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// TypeDesc
// ============================================================================

/// A statically resolved type.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TypeDesc {
    Primitive {
        primitive: PrimitiveKind,
    },
    /// A class or interface type by qualified name, with type arguments.
    Class {
        name: Symbol,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        args: Vec<TypeDesc>,
    },
    Array {
        element: Box<TypeDesc>,
    },
    /// The type of the `null` literal.
    Null,
}

impl TypeDesc {
    pub fn primitive(primitive: PrimitiveKind) -> Self {
        TypeDesc::Primitive { primitive }
    }

    pub fn class(name: impl Into<Symbol>) -> Self {
        TypeDesc::Class {
            name: name.into(),
            args: Vec::new(),
        }
    }

    pub fn generic(name: impl Into<Symbol>, args: Vec<TypeDesc>) -> Self {
        TypeDesc::Class {
            name: name.into(),
            args,
        }
    }

    pub fn array(element: TypeDesc) -> Self {
        TypeDesc::Array {
            element: Box::new(element),
        }
    }

    pub fn string() -> Self {
        TypeDesc::class("java.lang.String")
    }

    pub fn boolean() -> Self {
        TypeDesc::primitive(PrimitiveKind::Boolean)
    }

    pub fn int() -> Self {
        TypeDesc::primitive(PrimitiveKind::Int)
    }

    pub fn as_primitive(&self) -> Option<PrimitiveKind> {
        match self {
            TypeDesc::Primitive { primitive } => Some(*primitive),
            _ => None,
        }
    }

    pub fn is_primitive(&self, kind: PrimitiveKind) -> bool {
        self.as_primitive() == Some(kind)
    }

    pub fn class_name(&self) -> Option<Symbol> {
        match self {
            TypeDesc::Class { name, .. } => Some(*name),
            _ => None,
        }
    }

    pub fn type_args(&self) -> &[TypeDesc] {
        match self {
            TypeDesc::Class { args, .. } => args,
            _ => &[],
        }
    }

    pub fn is_class(&self, qualified: &str) -> bool {
        self.class_name().is_some_and(|n| n == qualified)
    }

    pub fn is_string(&self) -> bool {
        self.is_class("java.lang.String")
    }

    /// The primitive this type denotes directly or through its wrapper class.
    pub fn unboxed(&self) -> Option<PrimitiveKind> {
        match self {
            TypeDesc::Primitive { primitive } => Some(*primitive),
            TypeDesc::Class { name, .. } => name.with_str(PrimitiveKind::from_boxed_class),
            _ => None,
        }
    }

    /// The wrapper class of a primitive, or the type itself.
    pub fn boxed(&self) -> TypeDesc {
        match self.as_primitive().and_then(PrimitiveKind::boxed_class) {
            Some(boxed) => TypeDesc::class(Symbol::from_dynamic(boxed)),
            None => self.clone(),
        }
    }
}

impl std::fmt::Display for TypeDesc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeDesc::Primitive { primitive } => f.write_str(primitive.keyword()),
            TypeDesc::Class { name, args } => {
                write!(f, "{name}")?;
                if !args.is_empty() {
                    f.write_str("<")?;
                    for (i, arg) in args.iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{arg}")?;
                    }
                    f.write_str(">")?;
                }
                Ok(())
            }
            TypeDesc::Array { element } => write!(f, "{element}[]"),
            TypeDesc::Null => f.write_str("null"),
        }
    }
}

// ============================================================================
// Class table entries
// ============================================================================

/// What the resolver knows about one class or interface.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassInfo {
    /// Qualified name.
    pub name: Symbol,
    #[serde(default)]
    pub interface: bool,
    /// Direct supertypes by qualified name.
    #[serde(default)]
    pub supertypes: Vec<Symbol>,
    /// Return types of methods by name (overloads sharing a return type).
    #[serde(default)]
    pub methods: Vec<MethodInfo>,
    /// Level the class first appeared in, when it is a library class.
    #[serde(default)]
    pub since: Option<LanguageLevel>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodInfo {
    pub name: Symbol,
    pub returns: TypeDesc,
    #[serde(default)]
    pub is_static: bool,
}

impl ClassInfo {
    pub fn new(name: impl Into<Symbol>) -> Self {
        Self {
            name: name.into(),
            interface: false,
            supertypes: Vec::new(),
            methods: Vec::new(),
            since: None,
        }
    }

    pub fn interface(mut self) -> Self {
        self.interface = true;
        self
    }

    pub fn extends(mut self, supertype: impl Into<Symbol>) -> Self {
        self.supertypes.push(supertype.into());
        self
    }

    pub fn method(mut self, name: impl Into<Symbol>, returns: TypeDesc) -> Self {
        self.methods.push(MethodInfo {
            name: name.into(),
            returns,
            is_static: false,
        });
        self
    }

    pub fn static_method(mut self, name: impl Into<Symbol>, returns: TypeDesc) -> Self {
        self.methods.push(MethodInfo {
            name: name.into(),
            returns,
            is_static: true,
        });
        self
    }

    pub fn since(mut self, level: LanguageLevel) -> Self {
        self.since = Some(level);
        self
    }

    pub fn find_method(&self, name: Symbol) -> Option<&MethodInfo> {
        self.methods.iter().find(|m| m.name == name)
    }
}
