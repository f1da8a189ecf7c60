//! Include Registry
//!
//! Name → source-provider map consulted by the preprocessor when it meets an
//! `#include` directive.
//!
//! The registry is an explicitly constructed value that callers pass into
//! compilation. It is typically populated while assets load (possibly from
//! several threads at once) and read many times afterwards, so every method
//! takes `&self` and synchronizes internally.
//!
//! ```rust,ignore
//! use prism_core::IncludeRegistry;
//!
//! let registry = IncludeRegistry::new();
//! registry.register_source("lighting", "vec3 light(vec3 n) { return n; }");
//! registry.register("time", || format!("#define BUILD_TIME {}", 42));
//!
//! assert!(registry.resolve("lighting").contains("light"));
//! assert_eq!(registry.resolve("missing"), "#error Unable to locate include: missing");
//! ```

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

/// Something that can produce the text of an include on demand.
pub trait IncludeSource: Send + Sync {
    fn source(&self) -> String;
}

impl IncludeSource for String {
    fn source(&self) -> String {
        self.clone()
    }
}

impl IncludeSource for &'static str {
    fn source(&self) -> String {
        (*self).to_string()
    }
}

impl<F> IncludeSource for F
where
    F: Fn() -> String + Send + Sync,
{
    fn source(&self) -> String {
        self()
    }
}

/// Builds the inline marker emitted in place of an include that cannot be found.
#[must_use]
pub fn missing_include_marker(name: &str) -> String {
    format!("#error Unable to locate include: {name}")
}

/// Thread-safe registry of named include sources.
#[derive(Default)]
pub struct IncludeRegistry {
    sources: RwLock<FxHashMap<String, Arc<dyn IncludeSource>>>,
}

impl IncludeRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            sources: RwLock::default(),
        }
    }

    /// [Write] Registers a source provider, replacing any previous one with the same name.
    pub fn register(&self, name: impl Into<String>, provider: impl IncludeSource + 'static) {
        let name = name.into();
        log::debug!("Registering include '{name}'");
        self.sources.write().insert(name, Arc::new(provider));
    }

    /// [Write] Registers fixed text under `name`.
    pub fn register_source(&self, name: impl Into<String>, text: impl Into<String>) {
        self.register(name, text.into());
    }

    /// [Write] Removes `name`. Returns `true` if it was registered.
    pub fn unregister(&self, name: &str) -> bool {
        self.sources.write().remove(name).is_some()
    }

    /// [Read] Returns `true` if a provider is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.sources.read().contains_key(name)
    }

    /// [Read] Fetches the text for `name`, or `None` if nothing is registered.
    ///
    /// The provider runs after the read lock is released, so a provider may
    /// itself consult the registry.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<String> {
        let provider = self.sources.read().get(name).cloned()?;
        Some(provider.source())
    }

    /// [Read] Fetches the text for `name`, falling back to an inline `#error` line.
    #[must_use]
    pub fn resolve(&self, name: &str) -> String {
        self.get(name).unwrap_or_else(|| {
            log::warn!("Include '{name}' is not registered");
            missing_include_marker(name)
        })
    }

    /// [Read] Registered names in sorted order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.sources.read().keys().cloned().collect();
        names.sort();
        names
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sources.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sources.read().is_empty()
    }
}

impl std::fmt::Debug for IncludeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IncludeRegistry")
            .field("names", &self.names())
            .finish()
    }
}
