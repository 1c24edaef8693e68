//! Interned identifiers.

use std::borrow::Cow;
use std::sync::LazyLock;

use lasso::{Rodeo, Spur};
use parking_lot::{RwLock, RwLockUpgradableReadGuard};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Process-wide table behind every [`Symbol`].
static TABLE: LazyLock<RwLock<Rodeo>> = LazyLock::new(RwLock::default);

/// An interned name: identifier, qualified type name or literal text.
///
/// A 4-byte `lasso` key, so node kinds carrying names stay `Copy` and equal
/// names compare by key.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Symbol(Spur);

impl Symbol {
    pub fn new(text: &'static str) -> Self {
        Self::intern(text, |table| table.get_or_intern_static(text))
    }

    /// Interns a borrowed string, copying it on first sight.
    pub fn from_dynamic(text: &str) -> Self {
        Self::intern(text, |table| table.get_or_intern(text))
    }

    fn intern(text: &str, insert: impl FnOnce(&mut Rodeo) -> Spur) -> Self {
        let table = TABLE.upgradable_read();
        let existing = table.get(text);
        match existing {
            Some(key) => Symbol(key),
            None => {
                let mut table = RwLockUpgradableReadGuard::upgrade(table);
                Symbol(insert(&mut table))
            }
        }
    }

    /// Runs `f` on the text under a recursive read lock; `f` may itself
    /// read other symbols but must not intern.
    pub fn with_str<R>(&self, f: impl FnOnce(&str) -> R) -> R {
        f(TABLE.read_recursive().resolve(&self.0))
    }

    /// Copy the symbol's text into an owned string.
    pub fn to_text(&self) -> String {
        self.with_str(str::to_owned)
    }

    /// The last `.`-separated segment (`java.util.List` → `List`).
    pub fn simple_name(&self) -> Symbol {
        // Interning while the read guard is held would deadlock on upgrade.
        let last = self.with_str(|s| s.rsplit_once('.').map(|(_, last)| last.to_owned()));
        match last {
            Some(last) => Symbol::from_dynamic(&last),
            None => *self,
        }
    }

    /// Whether the symbol contains a `.` separator.
    pub fn is_qualified(&self) -> bool {
        self.with_str(|s| s.contains('.'))
    }
}

impl From<&'static str> for Symbol {
    fn from(text: &'static str) -> Self {
        Symbol::new(text)
    }
}

impl From<Cow<'_, str>> for Symbol {
    fn from(text: Cow<'_, str>) -> Self {
        Symbol::from_dynamic(&text)
    }
}

impl From<String> for Symbol {
    fn from(text: String) -> Self {
        Symbol::from_dynamic(&text)
    }
}

impl PartialEq<str> for Symbol {
    fn eq(&self, other: &str) -> bool {
        self.with_str(|s| s == other)
    }
}

impl PartialEq<&str> for Symbol {
    fn eq(&self, other: &&str) -> bool {
        self.with_str(|s| s == *other)
    }
}

impl PartialEq<Symbol> for str {
    fn eq(&self, other: &Symbol) -> bool {
        other.with_str(|s| s == self)
    }
}

impl PartialEq<Symbol> for &str {
    fn eq(&self, other: &Symbol) -> bool {
        other.with_str(|s| s == *self)
    }
}

// Ordering follows the text, not the interning order, so sorted output is stable.
impl PartialOrd for Symbol {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Symbol {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        if self.0 == other.0 {
            return std::cmp::Ordering::Equal;
        }
        self.with_str(|a| other.with_str(|b| a.cmp(b)))
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.with_str(|s| f.write_str(s))
    }
}

impl std::fmt::Debug for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.with_str(|s| write!(f, "{s:?}"))
    }
}

impl Serialize for Symbol {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.with_str(|s| serializer.serialize_str(s))
    }
}

impl<'de> Deserialize<'de> for Symbol {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = Cow::<'de, str>::deserialize(deserializer)?;
        Ok(Symbol::from(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_stable() {
        let a = Symbol::new("isEmpty");
        let b = Symbol::from_dynamic(&String::from("isEmpty"));
        assert_eq!(a, b);
        assert_eq!(a, "isEmpty");
    }

    #[test]
    fn simple_name_of_qualified() {
        assert_eq!(Symbol::new("java.util.List").simple_name(), "List");
        assert_eq!(Symbol::new("List").simple_name(), "List");
        assert!(Symbol::new("java.util.List").is_qualified());
    }

    #[test]
    fn ordering_follows_text() {
        // Intern in reverse order to make sure Spur order is not used.
        let z = Symbol::new("zeta_sym_order");
        let a = Symbol::new("alpha_sym_order");
        assert!(a < z);
    }
}
