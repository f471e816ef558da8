//! Transformation Registry - named, enable-gated transformation implementations
//!
//! The registry is shared between request handlers behind an `Arc`. Reads
//! (lookups, listings) take a shared lock; `register` and `enable` take the
//! write lock. Entries keep their registration order and are never removed.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::operations::{FilterRows, MapColumn, Transformation, UppercaseColumn};
use crate::error::RegistryError;

/// A registered transformation with its enabled flag
#[derive(Clone)]
pub struct TransformationEntry {
    /// Unique name used by pipeline steps
    pub name: String,
    /// The implementation
    pub implementation: Arc<dyn Transformation>,
    /// Whether steps may currently use it
    pub enabled: bool,
}

impl fmt::Debug for TransformationEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformationEntry")
            .field("name", &self.name)
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

/// Registry for looking up transformations by name
#[derive(Debug)]
pub struct TransformationRegistry {
    entries: RwLock<Vec<TransformationEntry>>,
}

impl TransformationRegistry {
    /// Create a registry holding the built-in transformations, all enabled
    pub fn new() -> Self {
        let registry = Self::empty();
        registry.register(FilterRows::NAME, FilterRows);
        registry.register(MapColumn::NAME, MapColumn);
        registry.register(UppercaseColumn::NAME, UppercaseColumn);
        registry
    }

    /// Create a registry without any transformation
    pub fn empty() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Register an enabled transformation. See [`Self::register_with_state`].
    pub fn register<T>(&self, name: impl Into<String>, implementation: T)
    where
        T: Transformation + 'static,
    {
        self.register_with_state(name, implementation, true);
    }

    /// Add or overwrite the entry for `name`.
    ///
    /// The last registration wins. An overwritten name keeps its position in
    /// registration order.
    pub fn register_with_state<T>(&self, name: impl Into<String>, implementation: T, enabled: bool)
    where
        T: Transformation + 'static,
    {
        let entry = TransformationEntry {
            name: name.into(),
            implementation: Arc::new(implementation),
            enabled,
        };

        let mut entries = self.write();
        match entries.iter_mut().find(|e| e.name == entry.name) {
            Some(existing) => *existing = entry,
            None => entries.push(entry),
        }
    }

    /// Set the enabled flag of `name`.
    ///
    /// Unknown names are ignored; the return value tells whether an entry was
    /// found.
    pub fn enable(&self, name: &str, enabled: bool) -> bool {
        let mut entries = self.write();
        match entries.iter_mut().find(|e| e.name == name) {
            Some(entry) => {
                entry.enabled = enabled;
                true
            }
            None => false,
        }
    }

    /// Resolve `name` to its implementation.
    pub fn get_transformation(&self, name: &str) -> Result<Arc<dyn Transformation>, RegistryError> {
        let entries = self.read();
        let entry = entries
            .iter()
            .find(|e| e.name == name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;

        if !entry.enabled {
            return Err(RegistryError::Disabled(name.to_string()));
        }

        Ok(Arc::clone(&entry.implementation))
    }

    /// Names currently enabled, in registration order.
    ///
    /// A snapshot for discovery: a listed name may be disabled before it is
    /// used.
    pub fn available_transformations(&self) -> Vec<String> {
        self.read()
            .iter()
            .filter(|e| e.enabled)
            .map(|e| e.name.clone())
            .collect()
    }

    /// All registered names, enabled or not, in registration order.
    pub fn registered_names(&self) -> Vec<String> {
        self.read().iter().map(|e| e.name.clone()).collect()
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.read().iter().any(|e| e.name == name)
    }

    /// `None` if `name` was never registered.
    pub fn is_enabled(&self, name: &str) -> Option<bool> {
        self.read().iter().find(|e| e.name == name).map(|e| e.enabled)
    }

    // Entries are replaced whole under the lock, so a poisoned lock still
    // guards a consistent list.
    fn read(&self) -> RwLockReadGuard<'_, Vec<TransformationEntry>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<TransformationEntry>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for TransformationRegistry {
    fn default() -> Self {
        Self::new()
    }
}
