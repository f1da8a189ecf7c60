//! Shader Feature Defines
//!
//! [`ShaderDefines`] is the set of feature flags a caller hands to the
//! compiler. Every stage of a `ProgramSource` starts preprocessing with these
//! macros already defined.
//!
//! Names and values are interned, and entries are kept sorted by symbol so two
//! sets holding the same macros compare and hash identically regardless of
//! insertion order.
//!
//! ```rust,ignore
//! use prism_core::ShaderDefines;
//!
//! let mut defines = ShaderDefines::new();
//! defines.define("USE_SHADOWS");
//! defines.set("MAX_LIGHTS", "8");
//! ```

use std::hash::{Hash, Hasher};

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::interner::{self, Symbol};

/// A set of `NAME -> value` macro definitions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShaderDefines {
    entries: Vec<(Symbol, Symbol)>,
}

impl ShaderDefines {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Defines `name` with an empty value, like `#define NAME`.
    pub fn define(&mut self, name: &str) {
        self.set(name, "");
    }

    /// Defines `name` as `value`, replacing any earlier value.
    pub fn set(&mut self, name: &str, value: &str) {
        let key = interner::intern(name);
        let value = interner::intern(value);
        match self.entries.binary_search_by_key(&key, |&(k, _)| k) {
            Ok(idx) => self.entries[idx].1 = value,
            Err(idx) => self.entries.insert(idx, (key, value)),
        }
    }

    /// Removes `name`. Returns `true` if it was defined.
    pub fn remove(&mut self, name: &str) -> bool {
        let Some(key) = interner::get(name) else {
            return false;
        };
        match self.entries.binary_search_by_key(&key, |&(k, _)| k) {
            Ok(idx) => {
                self.entries.remove(idx);
                true
            }
            Err(_) => false,
        }
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Returns the value of `name`, or `None` if it is not defined.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&'static str> {
        let key = interner::get(name)?;
        self.entries
            .binary_search_by_key(&key, |&(k, _)| k)
            .ok()
            .map(|idx| interner::resolve(self.entries[idx].1))
    }

    /// Copies every entry of `other` into `self`, `other` winning on conflicts.
    pub fn merge(&mut self, other: &ShaderDefines) {
        for &(key, value) in &other.entries {
            match self.entries.binary_search_by_key(&key, |&(k, _)| k) {
                Ok(idx) => self.entries[idx].1 = value,
                Err(idx) => self.entries.insert(idx, (key, value)),
            }
        }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates `(name, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
        self.entries
            .iter()
            .map(|&(k, v)| (interner::resolve(k), interner::resolve(v)))
    }
}

impl Hash for ShaderDefines {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.entries.hash(state);
    }
}

impl Serialize for ShaderDefines {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl From<&[(&str, &str)]> for ShaderDefines {
    fn from(defines: &[(&str, &str)]) -> Self {
        let mut result = Self::new();
        for (name, value) in defines {
            result.set(name, value);
        }
        result
    }
}
