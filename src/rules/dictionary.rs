//! Message dictionary access.
//!
//! The dictionary is owned by the host engine; this crate only reads it.
//! `MessageStore` is an in-memory implementation that keeps insertion order,
//! so "first match wins" is reproducible.

use std::ops::ControlFlow;
use std::sync::{Arc, RwLock};

use rustc_hash::FxHashMap;

use crate::core::CollaboratorError;

/// Read access to a key/value message dictionary.
pub trait MessageDictionary {
    /// Visit every `(key, value)` pair in enumeration order.
    ///
    /// Enumeration stops early when `visit` returns `ControlFlow::Break`.
    fn scan(
        &self,
        visit: &mut dyn FnMut(&str, &str) -> ControlFlow<()>,
    ) -> Result<(), CollaboratorError>;
}

impl<T: MessageDictionary + ?Sized> MessageDictionary for &T {
    fn scan(
        &self,
        visit: &mut dyn FnMut(&str, &str) -> ControlFlow<()>,
    ) -> Result<(), CollaboratorError> {
        (**self).scan(visit)
    }
}

impl<T: MessageDictionary + ?Sized> MessageDictionary for Arc<T> {
    fn scan(
        &self,
        visit: &mut dyn FnMut(&str, &str) -> ControlFlow<()>,
    ) -> Result<(), CollaboratorError> {
        (**self).scan(visit)
    }
}

impl<T: MessageDictionary> MessageDictionary for RwLock<T> {
    fn scan(
        &self,
        visit: &mut dyn FnMut(&str, &str) -> ControlFlow<()>,
    ) -> Result<(), CollaboratorError> {
        let guard = self
            .read()
            .map_err(|_| CollaboratorError::poisoned("message dictionary"))?;
        guard.scan(visit)
    }
}

/// Insertion-ordered message store.
///
/// ## Example
///
/// ```
/// use dice_query::rules::MessageStore;
///
/// let mut store = MessageStore::new();
/// store.insert("SAN check", "roll against SAN");
/// assert_eq!(store.get("SAN check"), Some("roll against SAN"));
/// ```
#[derive(Clone, Debug, Default)]
pub struct MessageStore {
    entries: Vec<(String, String)>,
    index: FxHashMap<String, usize>,
}

impl MessageStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a message. Re-inserting a key replaces its value in place.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.index.get(&key) {
            Some(&slot) => self.entries[slot].1 = value,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, value));
            }
        }
    }

    /// Remove a message, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        let slot = self.index.remove(key)?;
        let (_, value) = self.entries.remove(slot);
        for position in self.index.values_mut() {
            if *position > slot {
                *position -= 1;
            }
        }
        Some(value)
    }

    /// Exact lookup.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.index.get(key).map(|&slot| self.entries[slot].1.as_str())
    }

    /// Number of messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MessageStore {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut store = Self::new();
        for (key, value) in iter {
            store.insert(key, value);
        }
        store
    }
}

impl MessageDictionary for MessageStore {
    fn scan(
        &self,
        visit: &mut dyn FnMut(&str, &str) -> ControlFlow<()>,
    ) -> Result<(), CollaboratorError> {
        for (key, value) in &self.entries {
            if visit(key, value).is_break() {
                break;
            }
        }
        Ok(())
    }
}
