//! Class table: what the resolver knows about library and unit classes.

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::Symbol;
use crate::kind::PrimitiveKind;
use crate::types::{ClassInfo, LanguageLevel, MethodInfo, TypeDesc};

static BUILTIN: LazyLock<ClassTable> = LazyLock::new(build_builtin);

/// Classes by qualified name.
#[derive(Clone, Debug, Default)]
pub struct ClassTable {
    classes: HashMap<Symbol, ClassInfo>,
}

impl ClassTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of the built-in library classes.
    pub fn builtin() -> Self {
        BUILTIN.clone()
    }

    /// Add or overwrite an entry.
    pub fn insert(&mut self, class: ClassInfo) {
        self.classes.insert(class.name, class);
    }

    pub fn extend(&mut self, classes: impl IntoIterator<Item = ClassInfo>) {
        for class in classes {
            self.insert(class);
        }
    }

    pub fn get(&self, name: Symbol) -> Option<&ClassInfo> {
        self.classes.get(&name)
    }

    pub fn contains(&self, name: Symbol) -> bool {
        self.classes.contains_key(&name)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Find a method on `class` or any of its known supertypes.
    pub fn find_method(&self, class: Symbol, method: Symbol) -> Option<&MethodInfo> {
        let mut pending = vec![class];
        let mut seen = Vec::new();
        while let Some(current) = pending.pop() {
            if seen.contains(&current) {
                continue;
            }
            seen.push(current);
            let Some(info) = self.get(current) else {
                continue;
            };
            if let Some(found) = info.find_method(method) {
                return Some(found);
            }
            // Depth-first in declaration order.
            pending.extend(info.supertypes.iter().rev().copied());
        }
        None
    }
}

fn build_builtin() -> ClassTable {
    let string = TypeDesc::string;
    let boolean = TypeDesc::boolean;
    let int = TypeDesc::int;
    let void = || TypeDesc::primitive(PrimitiveKind::Void);

    let mut table = ClassTable::new();
    table.insert(
        ClassInfo::new("java.lang.Object")
            .method("toString", string())
            .method("equals", boolean())
            .method("hashCode", int())
            .method("getClass", TypeDesc::class("java.lang.Class")),
    );
    table.insert(ClassInfo::new("java.lang.Class").extends("java.lang.Object"));
    table.insert(
        ClassInfo::new("java.lang.CharSequence")
            .interface()
            .method("length", int())
            .method("charAt", TypeDesc::primitive(PrimitiveKind::Char))
            .method("toString", string()),
    );
    table.insert(
        ClassInfo::new("java.lang.String")
            .extends("java.lang.Object")
            .extends("java.lang.CharSequence")
            .extends("java.lang.Comparable")
            .method("length", int())
            .method("isEmpty", boolean())
            .method("equals", boolean())
            .method("equalsIgnoreCase", boolean())
            .method("contains", boolean())
            .method("startsWith", boolean())
            .method("endsWith", boolean())
            .method("indexOf", int())
            .method("lastIndexOf", int())
            .method("charAt", TypeDesc::primitive(PrimitiveKind::Char))
            .method("substring", string())
            .method("trim", string())
            .method("toLowerCase", string())
            .method("toUpperCase", string())
            .method("replace", string())
            .method("replaceAll", string())
            .method("concat", string())
            .method("intern", string())
            .method("toString", string())
            .method("compareTo", int())
            .static_method("valueOf", string())
            .static_method("format", string())
            .static_method("join", string()),
    );
    table.insert(
        ClassInfo::new("java.lang.StringBuilder")
            .extends("java.lang.Object")
            .extends("java.lang.CharSequence")
            .method("append", TypeDesc::class("java.lang.StringBuilder"))
            .method("length", int())
            .method("toString", string()),
    );
    table.insert(
        ClassInfo::new("java.lang.Comparable")
            .interface()
            .method("compareTo", int()),
    );
    table.insert(
        ClassInfo::new("java.lang.Number")
            .extends("java.lang.Object")
            .method("intValue", int())
            .method("longValue", TypeDesc::primitive(PrimitiveKind::Long))
            .method("doubleValue", TypeDesc::primitive(PrimitiveKind::Double)),
    );
    for primitive in PrimitiveKind::ALL {
        let Some(boxed) = primitive.boxed_class() else {
            continue;
        };
        let numeric = primitive.is_numeric() && primitive != PrimitiveKind::Char;
        let mut info = ClassInfo::new(boxed)
            .extends(if numeric {
                "java.lang.Number"
            } else {
                "java.lang.Object"
            })
            .extends("java.lang.Comparable")
            .method("toString", string())
            .method("equals", boolean())
            .method("hashCode", int())
            .method(
                Symbol::from_dynamic(&format!("{}Value", primitive.keyword())),
                TypeDesc::primitive(primitive),
            )
            .static_method("valueOf", TypeDesc::class(boxed));
        if numeric || primitive == PrimitiveKind::Boolean {
            let parse = match primitive {
                PrimitiveKind::Int => "parseInt".to_owned(),
                other => {
                    let keyword = other.keyword();
                    let mut chars = keyword.chars();
                    let head = chars.next().map(|c| c.to_ascii_uppercase());
                    format!("parse{}{}", head.unwrap_or_default(), chars.as_str())
                }
            };
            info = info.static_method(Symbol::from(parse), TypeDesc::primitive(primitive));
        }
        table.insert(info);
    }
    table.insert(
        ClassInfo::new("java.lang.Iterable")
            .interface()
            .method("forEach", void())
            .method("iterator", TypeDesc::class("java.util.Iterator")),
    );
    table.insert(
        ClassInfo::new("java.util.Collection")
            .interface()
            .extends("java.lang.Iterable")
            .method("size", int())
            .method("isEmpty", boolean())
            .method("contains", boolean())
            .method("add", boolean())
            .method("remove", boolean())
            .method("clear", void())
            .method("stream", TypeDesc::class("java.util.stream.Stream")),
    );
    for (name, parent) in [
        ("java.util.List", "java.util.Collection"),
        ("java.util.Set", "java.util.Collection"),
        ("java.util.Queue", "java.util.Collection"),
        ("java.util.Deque", "java.util.Queue"),
    ] {
        table.insert(ClassInfo::new(name).interface().extends(parent));
    }
    for (name, parent) in [
        ("java.util.ArrayList", "java.util.List"),
        ("java.util.LinkedList", "java.util.List"),
        ("java.util.HashSet", "java.util.Set"),
        ("java.util.LinkedHashSet", "java.util.Set"),
        ("java.util.TreeSet", "java.util.Set"),
        ("java.util.ArrayDeque", "java.util.Deque"),
    ] {
        table.insert(ClassInfo::new(name).extends("java.lang.Object").extends(parent));
    }
    table.insert(
        ClassInfo::new("java.util.Map")
            .interface()
            .method("size", int())
            .method("isEmpty", boolean())
            .method("containsKey", boolean())
            .method("containsValue", boolean())
            .method("clear", void()),
    );
    for name in ["java.util.HashMap", "java.util.LinkedHashMap", "java.util.TreeMap"] {
        table.insert(
            ClassInfo::new(name)
                .extends("java.lang.Object")
                .extends("java.util.Map"),
        );
    }
    table.insert(
        ClassInfo::new("java.util.Objects")
            .extends("java.lang.Object")
            .since(LanguageLevel::V7)
            .static_method("equals", boolean())
            .static_method("hash", int())
            .static_method("hashCode", int())
            .static_method("isNull", boolean())
            .static_method("nonNull", boolean())
            .static_method("toString", string()),
    );
    table.insert(
        ClassInfo::new("java.util.Optional")
            .extends("java.lang.Object")
            .since(LanguageLevel::V8)
            .method("isPresent", boolean())
            .method("isEmpty", boolean())
            .method("ifPresent", void()),
    );
    table.insert(
        ClassInfo::new("java.util.stream.Stream")
            .interface()
            .since(LanguageLevel::V8)
            .method("forEach", void())
            .method("forEachOrdered", void())
            .method("map", TypeDesc::class("java.util.stream.Stream"))
            .method("filter", TypeDesc::class("java.util.stream.Stream"))
            .method("count", TypeDesc::primitive(PrimitiveKind::Long)),
    );
    table
}
