//! Deck registries.
//!
//! The host keeps two registries, primary and extended. This crate reads
//! them through `DeckRegistry`; `DeckTable` is the in-memory version used by
//! the reference engine and in tests.

use std::sync::{Arc, RwLock};

use im::{OrdMap, Vector};
use serde::{Deserialize, Serialize};

use crate::core::CollaboratorError;

/// Read access to a named deck collection.
pub trait DeckRegistry {
    /// Size of the named deck, or `None` if absent. Names are case-sensitive.
    fn deck_size(&self, name: &str) -> Result<Option<usize>, CollaboratorError>;

    /// Visit `(name, size)` for every deck in enumeration order.
    fn scan_decks(&self, visit: &mut dyn FnMut(&str, usize)) -> Result<(), CollaboratorError>;

    /// Is the named deck present?
    fn contains(&self, name: &str) -> Result<bool, CollaboratorError> {
        Ok(self.deck_size(name)?.is_some())
    }
}

impl<T: DeckRegistry + ?Sized> DeckRegistry for &T {
    fn deck_size(&self, name: &str) -> Result<Option<usize>, CollaboratorError> {
        (**self).deck_size(name)
    }

    fn scan_decks(&self, visit: &mut dyn FnMut(&str, usize)) -> Result<(), CollaboratorError> {
        (**self).scan_decks(visit)
    }
}

impl<T: DeckRegistry + ?Sized> DeckRegistry for Arc<T> {
    fn deck_size(&self, name: &str) -> Result<Option<usize>, CollaboratorError> {
        (**self).deck_size(name)
    }

    fn scan_decks(&self, visit: &mut dyn FnMut(&str, usize)) -> Result<(), CollaboratorError> {
        (**self).scan_decks(visit)
    }
}

impl<T: DeckRegistry> DeckRegistry for RwLock<T> {
    fn deck_size(&self, name: &str) -> Result<Option<usize>, CollaboratorError> {
        self.read()
            .map_err(|_| CollaboratorError::poisoned("deck registry"))?
            .deck_size(name)
    }

    fn scan_decks(&self, visit: &mut dyn FnMut(&str, usize)) -> Result<(), CollaboratorError> {
        self.read()
            .map_err(|_| CollaboratorError::poisoned("deck registry"))?
            .scan_decks(visit)
    }
}

/// A deck of card texts. Card contents are opaque to the orchestrator.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Deck {
    cards: Vector<String>,
}

impl Deck {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a card.
    pub fn push(&mut self, card: impl Into<String>) {
        self.cards.push_back(card.into());
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Card at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.cards.get(index).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.cards.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for Deck {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            cards: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Name-sorted deck table.
///
/// Backed by a persistent map, so cloning a table is O(1).
///
/// ## Example
///
/// ```
/// use dice_query::decks::{DeckRegistry, DeckTable};
///
/// let table = DeckTable::new().with_deck("coin", ["heads", "tails"]);
/// assert_eq!(table.deck_size("coin").unwrap(), Some(2));
/// assert_eq!(table.deck_size("Coin").unwrap(), None);
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeckTable {
    decks: OrdMap<String, Deck>,
}

impl DeckTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a deck.
    pub fn insert(&mut self, name: impl Into<String>, deck: Deck) {
        self.decks.insert(name.into(), deck);
    }

    /// Builder form of [`insert`](Self::insert).
    #[must_use]
    pub fn with_deck<I, S>(mut self, name: &str, cards: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert(name, cards.into_iter().collect());
        self
    }

    /// Parse a table from `{"name": ["card", ...]}`.
    pub fn from_json(json: &str) -> Result<Self, CollaboratorError> {
        serde_json::from_str(json).map_err(|e| CollaboratorError::new(format!("deck table: {e}")))
    }

    /// Remove a deck.
    pub fn remove(&mut self, name: &str) -> Option<Deck> {
        self.decks.remove(name)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Deck> {
        self.decks.get(name)
    }

    /// Position of `name` in sorted order.
    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.decks.keys().position(|k| k == name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.decks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.decks.is_empty()
    }

    /// Iterate `(name, deck)` in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Deck)> {
        self.decks.iter().map(|(k, d)| (k.as_str(), d))
    }
}

impl DeckRegistry for DeckTable {
    fn deck_size(&self, name: &str) -> Result<Option<usize>, CollaboratorError> {
        Ok(self.decks.get(name).map(Deck::len))
    }

    fn scan_decks(&self, visit: &mut dyn FnMut(&str, usize)) -> Result<(), CollaboratorError> {
        for (name, deck) in &self.decks {
            visit(name, deck.len());
        }
        Ok(())
    }
}
