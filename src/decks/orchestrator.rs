//! Draw orchestration over two deck registries.
//!
//! `draw_from_deck` runs three gates in order and stops at the first
//! failure:
//!
//! 1. count in `MIN_DRAW_COUNT..=MAX_DRAW_COUNT`
//! 2. deck present in the primary or extended registry
//! 3. `count` calls to the draw primitive, each of which must return a card
//!    that is neither empty nor the unchanged expression
//!
//! A successful result always carries exactly `count` cards; a failed one
//! carries none.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::{CollaboratorError, QueryError};

use super::engine::{draw_expression, CardDrawer, DeckLocator};
use super::registry::DeckRegistry;

/// Smallest number of cards per draw.
pub const MIN_DRAW_COUNT: i32 = 1;

/// Largest number of cards per draw.
pub const MAX_DRAW_COUNT: i32 = 10;

/// Returned by `list_decks` when neither registry has a deck.
pub const NO_DECKS: &str = "no decks available";

/// Returned by `list_decks` when a registry cannot be read.
pub const LIST_FAILED: &str = "failed to list decks";

/// Header line of a deck listing.
pub const LIST_HEADER: &str = "=== available decks ===";

/// Returned by `get_deck_size` for an unknown deck.
pub const DECK_NOT_FOUND: i64 = -1;

/// Boundary result of a draw.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawResult {
    pub success: bool,
    pub cards: Vec<String>,
    pub message: String,
}

impl DrawResult {
    /// Successful draw.
    #[must_use]
    pub fn drawn(cards: Vec<String>) -> Self {
        Self {
            success: true,
            cards,
            message: String::new(),
        }
    }

    /// Failed draw.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            cards: Vec::new(),
            message: message.into(),
        }
    }
}

impl From<Result<Vec<String>, QueryError>> for DrawResult {
    fn from(result: Result<Vec<String>, QueryError>) -> Self {
        match result {
            Ok(cards) => Self::drawn(cards),
            Err(e) => Self::failed(e.to_string()),
        }
    }
}

/// Orchestrates draws against a primary and an extended registry.
///
/// `E` supplies both host primitives: the card drawer and the deck locator.
///
/// ## Example
///
/// ```
/// use dice_query::decks::{DeckTable, DrawOrchestrator, TableEngine};
///
/// let primary = DeckTable::new().with_deck("tarot", (0..22).map(|i| format!("arcana {i}")));
/// let mut engine = TableEngine::new(primary.clone(), DeckTable::new());
/// let mut draws = DrawOrchestrator::new(&primary, DeckTable::new(), &mut engine);
///
/// assert_eq!(draws.draw_from_deck("tarot", 3).cards.len(), 3);
/// assert!(!draws.draw_from_deck("tarot", 11).success);
/// assert!(!draws.draw_from_deck("ghost", 1).success);
/// ```
#[derive(Debug)]
pub struct DrawOrchestrator<P, X, E> {
    primary: P,
    extended: X,
    engine: E,
}

impl<P, X, E> DrawOrchestrator<P, X, E>
where
    P: DeckRegistry,
    X: DeckRegistry,
    E: CardDrawer + DeckLocator,
{
    pub fn new(primary: P, extended: X, engine: E) -> Self {
        Self {
            primary,
            extended,
            engine,
        }
    }

    /// The engine supplying the draw primitives.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Mutable access to the engine.
    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    /// Give the engine back.
    pub fn into_engine(self) -> E {
        self.engine
    }

    /// Draw `count` cards from `deck`.
    pub fn try_draw(&mut self, deck: &str, count: i32) -> Result<Vec<String>, QueryError> {
        if !(MIN_DRAW_COUNT..=MAX_DRAW_COUNT).contains(&count) {
            return Err(QueryError::InvalidCount {
                count,
                min: MIN_DRAW_COUNT,
                max: MAX_DRAW_COUNT,
            });
        }

        if !self.registered(deck).map_err(QueryError::Engine)? {
            return Err(QueryError::DeckNotFound(deck.to_string()));
        }

        let expression = draw_expression(deck);
        let mut cards = Vec::with_capacity(count as usize);
        for attempt in 1..=count {
            let card = self.engine.draw(&expression).map_err(|e| {
                warn!(deck, attempt, error = %e, "draw primitive failed");
                QueryError::Engine(e)
            })?;
            if card.is_empty() || card == expression {
                warn!(deck, attempt, count, "draw returned no card");
                return Err(QueryError::DrawFailed(deck.to_string()));
            }
            cards.push(card);
        }

        debug!(deck, count, "drew cards");
        Ok(cards)
    }

    /// Draw `count` cards from `deck`. Never fails; errors are reported in
    /// the result.
    pub fn draw_from_deck(&mut self, deck: &str, count: i32) -> DrawResult {
        self.try_draw(deck, count).into()
    }

    /// Human-readable listing of both registries.
    pub fn list_decks(&self) -> String {
        match self.render_listing() {
            Ok(Some(listing)) => listing,
            Ok(None) => NO_DECKS.to_string(),
            Err(e) => {
                warn!(error = %e, "listing decks failed");
                LIST_FAILED.to_string()
            }
        }
    }

    fn render_listing(&self) -> Result<Option<String>, CollaboratorError> {
        let mut out = format!("{LIST_HEADER}\n");
        let mut any = false;

        self.primary.scan_decks(&mut |name, size| {
            any = true;
            out.push_str(&format!("- {name} ({size} cards)\n"));
        })?;
        self.extended.scan_decks(&mut |name, size| {
            any = true;
            out.push_str(&format!("- {name} [extended] ({size} cards)\n"));
        })?;

        Ok(any.then_some(out))
    }

    /// Size of a deck: primary first, then extended.
    pub fn deck_size(&self, deck: &str) -> Result<Option<usize>, QueryError> {
        if let Some(size) = self.primary.deck_size(deck).map_err(QueryError::Engine)? {
            return Ok(Some(size));
        }
        self.extended.deck_size(deck).map_err(QueryError::Engine)
    }

    /// Size of a deck, or `DECK_NOT_FOUND` when absent or unreadable.
    pub fn get_deck_size(&self, deck: &str) -> i64 {
        match self.deck_size(deck) {
            Ok(Some(size)) => i64::try_from(size).unwrap_or(i64::MAX),
            Ok(None) => DECK_NOT_FOUND,
            Err(e) => {
                warn!(deck, error = %e, "deck size lookup failed");
                DECK_NOT_FOUND
            }
        }
    }

    /// Does the host's deck locator know `deck`?
    ///
    /// This asks the locator, not the two registries `draw_from_deck`
    /// checks. The two answers can differ when the host's index and its
    /// registries disagree.
    pub fn deck_exists(&self, deck: &str) -> bool {
        match self.engine.find_deck(deck) {
            Ok(index) => index.is_some(),
            Err(e) => {
                warn!(deck, error = %e, "deck locator failed");
                false
            }
        }
    }

    fn registered(&self, deck: &str) -> Result<bool, CollaboratorError> {
        Ok(self.primary.contains(deck)? || self.extended.contains(deck)?)
    }
}
