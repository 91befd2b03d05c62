//! Draw primitives and the in-memory reference engine.
//!
//! The host engine exposes two primitives:
//!
//! - `CardDrawer::draw(expression)`: resolve `{deck}` tokens to cards.
//!   Returning the expression unchanged, or an empty string, signals that
//!   nothing could be drawn.
//! - `DeckLocator::find_deck(name)`: the host's own index of a deck.
//!
//! `TableEngine` implements both over a primary and an extended `DeckTable`.

use rustc_hash::FxHashMap;
use tracing::trace;

use crate::core::config::{DrawMode, EngineConfig};
use crate::core::{CollaboratorError, DrawRng, DrawRngState};

use super::registry::{Deck, DeckTable};

/// Opening delimiter of a draw expression.
pub const EXPR_OPEN: char = '{';

/// Closing delimiter of a draw expression.
pub const EXPR_CLOSE: char = '}';

/// The draw expression for one card from `deck`.
///
/// ```
/// assert_eq!(dice_query::decks::draw_expression("tarot"), "{tarot}");
/// ```
#[must_use]
pub fn draw_expression(deck: &str) -> String {
    format!("{EXPR_OPEN}{deck}{EXPR_CLOSE}")
}

/// Single-card draw primitive.
pub trait CardDrawer {
    /// Resolve a draw expression.
    fn draw(&mut self, expression: &str) -> Result<String, CollaboratorError>;
}

impl<T: CardDrawer + ?Sized> CardDrawer for &mut T {
    fn draw(&mut self, expression: &str) -> Result<String, CollaboratorError> {
        (**self).draw(expression)
    }
}

impl<T: CardDrawer + ?Sized> CardDrawer for Box<T> {
    fn draw(&mut self, expression: &str) -> Result<String, CollaboratorError> {
        (**self).draw(expression)
    }
}

/// Deck locator primitive.
pub trait DeckLocator {
    /// The host's index for `name`, or `None` when the host reports a
    /// negative index.
    fn find_deck(&self, name: &str) -> Result<Option<usize>, CollaboratorError>;
}

impl<T: DeckLocator + ?Sized> DeckLocator for &T {
    fn find_deck(&self, name: &str) -> Result<Option<usize>, CollaboratorError> {
        (**self).find_deck(name)
    }
}

impl<T: DeckLocator + ?Sized> DeckLocator for &mut T {
    fn find_deck(&self, name: &str) -> Result<Option<usize>, CollaboratorError> {
        (**self).find_deck(name)
    }
}

impl<T: DeckLocator + ?Sized> DeckLocator for Box<T> {
    fn find_deck(&self, name: &str) -> Result<Option<usize>, CollaboratorError> {
        (**self).find_deck(name)
    }
}

/// Reference engine over two deck tables.
///
/// Every `{name}` token naming a deck is replaced by a card from it (primary
/// table first). Cards may themselves contain tokens, which are resolved up
/// to `max_depth` levels. Tokens that name no deck, or whose deck has
/// nothing left to deal, are left as they are.
///
/// ## Example
///
/// ```
/// use dice_query::decks::{CardDrawer, DeckTable, TableEngine};
///
/// let primary = DeckTable::new().with_deck("coin", ["heads", "tails"]);
/// let mut engine = TableEngine::new(primary, DeckTable::new());
///
/// let card = engine.draw("{coin}").unwrap();
/// assert!(card == "heads" || card == "tails");
/// assert_eq!(engine.draw("{ghost}").unwrap(), "{ghost}");
/// ```
#[derive(Clone, Debug)]
pub struct TableEngine {
    primary: DeckTable,
    extended: DeckTable,
    rng: DrawRng,
    mode: DrawMode,
    max_depth: usize,
    /// Remaining card indices per deck, dealt from the back. Exhaust mode only.
    piles: FxHashMap<String, Vec<usize>>,
}

impl TableEngine {
    /// Engine with default settings.
    #[must_use]
    pub fn new(primary: DeckTable, extended: DeckTable) -> Self {
        Self::with_config(primary, extended, &EngineConfig::default())
    }

    /// Engine with explicit settings.
    #[must_use]
    pub fn with_config(primary: DeckTable, extended: DeckTable, config: &EngineConfig) -> Self {
        Self {
            primary,
            extended,
            rng: DrawRng::new(config.seed),
            mode: config.mode,
            max_depth: config.max_depth,
            piles: FxHashMap::default(),
        }
    }

    /// Primary deck table.
    #[must_use]
    pub fn primary(&self) -> &DeckTable {
        &self.primary
    }

    /// Extended deck table.
    #[must_use]
    pub fn extended(&self) -> &DeckTable {
        &self.extended
    }

    #[must_use]
    pub fn mode(&self) -> DrawMode {
        self.mode
    }

    /// Cards left to deal from `name` in exhaust mode.
    ///
    /// `None` if the deck does not exist. In replace mode this is always the
    /// deck size.
    #[must_use]
    pub fn remaining(&self, name: &str) -> Option<usize> {
        let size = self.lookup(name)?.len();
        match self.mode {
            DrawMode::Replace => Some(size),
            DrawMode::Exhaust => Some(self.piles.get(name).map_or(size, Vec::len)),
        }
    }

    /// Return every dealt card to its deck.
    pub fn reset(&mut self) {
        self.piles.clear();
    }

    /// Capture the RNG state.
    #[must_use]
    pub fn rng_state(&self) -> DrawRngState {
        self.rng.state()
    }

    /// Restore a previously captured RNG state.
    pub fn restore_rng(&mut self, state: &DrawRngState) {
        self.rng = DrawRng::from_state(state);
    }

    fn lookup(&self, name: &str) -> Option<&Deck> {
        self.primary.get(name).or_else(|| self.extended.get(name))
    }

    /// Deal one card from `name`.
    fn deal(&mut self, name: &str) -> Option<String> {
        let deck = self.primary.get(name).or_else(|| self.extended.get(name))?;
        if deck.is_empty() {
            return None;
        }

        let index = match self.mode {
            DrawMode::Replace => self.rng.pick(deck.len()),
            DrawMode::Exhaust => {
                let rng = &mut self.rng;
                let pile = self.piles.entry(name.to_string()).or_insert_with(|| {
                    let mut order: Vec<usize> = (0..deck.len()).collect();
                    rng.shuffle(&mut order);
                    order
                });
                pile.pop()?
            }
        };
        deck.get(index).map(str::to_string)
    }

    fn resolve(&mut self, text: &str, depth: usize) -> String {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;

        while let Some(open) = rest.find(EXPR_OPEN) {
            out.push_str(&rest[..open]);
            let after = &rest[open + EXPR_OPEN.len_utf8()..];
            let Some(close) = after.find(EXPR_CLOSE) else {
                out.push_str(&rest[open..]);
                return out;
            };

            let name = &after[..close];
            match self.deal(name) {
                Some(card) if depth < self.max_depth => {
                    let resolved = self.resolve(&card, depth + 1);
                    out.push_str(&resolved);
                }
                Some(card) => out.push_str(&card),
                None => {
                    out.push(EXPR_OPEN);
                    out.push_str(name);
                    out.push(EXPR_CLOSE);
                }
            }
            rest = &after[close + EXPR_CLOSE.len_utf8()..];
        }

        out.push_str(rest);
        out
    }
}

impl CardDrawer for TableEngine {
    fn draw(&mut self, expression: &str) -> Result<String, CollaboratorError> {
        let card = self.resolve(expression, 0);
        trace!(expression, card = %card, "engine draw");
        Ok(card)
    }
}

impl DeckLocator for TableEngine {
    fn find_deck(&self, name: &str) -> Result<Option<usize>, CollaboratorError> {
        Ok(self
            .primary
            .position(name)
            .or_else(|| self.extended.position(name).map(|p| self.primary.len() + p)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tables() -> (DeckTable, DeckTable) {
        let primary = DeckTable::new()
            .with_deck("coin", ["heads", "tails"])
            .with_deck("single", ["only"])
            .with_deck("empty", Vec::<String>::new())
            .with_deck("hand", ["{single} and {coin}"]);
        let extended = DeckTable::new()
            .with_deck("coin", ["never drawn"])
            .with_deck("runes", ["fehu", "uruz"]);
        (primary, extended)
    }

    #[test]
    fn test_draw_expression() {
        assert_eq!(draw_expression("tarot"), "{tarot}");
        assert_eq!(draw_expression(""), "{}");
    }

    #[test]
    fn test_primary_shadows_extended() {
        let (primary, extended) = tables();
        let mut engine = TableEngine::new(primary, extended);

        for _ in 0..20 {
            let card = engine.draw("{coin}").unwrap();
            assert!(card == "heads" || card == "tails");
        }
        let rune = engine.draw("{runes}").unwrap();
        assert!(rune == "fehu" || rune == "uruz");
    }

    #[test]
    fn test_unresolved_tokens_left_alone() {
        let (primary, extended) = tables();
        let mut engine = TableEngine::new(primary, extended);

        assert_eq!(engine.draw("{ghost}").unwrap(), "{ghost}");
        assert_eq!(engine.draw("{empty}").unwrap(), "{empty}");
        assert_eq!(engine.draw("no tokens").unwrap(), "no tokens");
        assert_eq!(engine.draw("open {single").unwrap(), "open {single");
        assert_eq!(engine.draw("").unwrap(), "");
    }

    #[test]
    fn test_embedded_and_nested_tokens() {
        let (primary, extended) = tables();
        let mut engine = TableEngine::new(primary, extended);

        assert_eq!(engine.draw("draw: {single}!").unwrap(), "draw: only!");

        let hand = engine.draw("{hand}").unwrap();
        assert!(hand == "only and heads" || hand == "only and tails");
    }

    #[test]
    fn test_max_depth_stops_nesting() {
        let primary = DeckTable::new().with_deck("loop", ["<{loop}>"]);
        let config = EngineConfig::default().with_max_depth(2);
        let mut engine = TableEngine::with_config(primary, DeckTable::new(), &config);

        assert_eq!(engine.draw("{loop}").unwrap(), "<<<{loop}>>>");
    }

    #[test]
    fn test_exhaust_mode_runs_out() {
        let (primary, extended) = tables();
        let config = EngineConfig::default().with_seed(5).exhaust();
        let mut engine = TableEngine::with_config(primary, extended, &config);

        assert_eq!(engine.remaining("coin"), Some(2));
        let mut dealt = vec![engine.draw("{coin}").unwrap(), engine.draw("{coin}").unwrap()];
        dealt.sort();

        assert_eq!(dealt, vec!["heads", "tails"]);
        assert_eq!(engine.remaining("coin"), Some(0));
        assert_eq!(engine.draw("{coin}").unwrap(), "{coin}");

        engine.reset();
        assert_eq!(engine.remaining("coin"), Some(2));
        assert_ne!(engine.draw("{coin}").unwrap(), "{coin}");
    }

    #[test]
    fn test_remaining() {
        let (primary, extended) = tables();
        let engine = TableEngine::new(primary, extended);

        assert_eq!(engine.mode(), DrawMode::Replace);
        assert_eq!(engine.remaining("runes"), Some(2));
        assert_eq!(engine.remaining("ghost"), None);
    }

    #[test]
    fn test_seeded_draws_repeat() {
        let (primary, extended) = tables();
        let config = EngineConfig::default().with_seed(11);
        let mut a = TableEngine::with_config(primary.clone(), extended.clone(), &config);
        let mut b = TableEngine::with_config(primary, extended, &config);

        for _ in 0..10 {
            assert_eq!(a.draw("{coin}").unwrap(), b.draw("{coin}").unwrap());
        }
    }

    #[test]
    fn test_rng_checkpoint() {
        let (primary, extended) = tables();
        let mut engine = TableEngine::new(primary, extended);
        engine.draw("{coin}").unwrap();

        let state = engine.rng_state();
        let expected: Vec<_> = (0..5).map(|_| engine.draw("{coin}").unwrap()).collect();

        engine.restore_rng(&state);
        let replay: Vec<_> = (0..5).map(|_| engine.draw("{coin}").unwrap()).collect();

        assert_eq!(expected, replay);
    }

    #[test]
    fn test_find_deck_indexes() {
        let (primary, extended) = tables();
        let engine = TableEngine::new(primary, extended);

        // primary sorted: coin, empty, hand, single
        assert_eq!(engine.find_deck("coin").unwrap(), Some(0));
        assert_eq!(engine.find_deck("single").unwrap(), Some(3));
        // extended sorted: coin, runes
        assert_eq!(engine.find_deck("runes").unwrap(), Some(5));
        assert_eq!(engine.find_deck("ghost").unwrap(), None);
    }
}
