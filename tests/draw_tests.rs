//! Deck draw integration tests.
//!
//! These tests run the orchestrator against the reference engine and against
//! hosts whose locator disagrees with their registries.

use std::sync::{Arc, RwLock};

use dice_query::core::{CollaboratorError, EngineConfig};
use dice_query::decks::{
    CardDrawer, DeckLocator, DeckTable, DrawOrchestrator, TableEngine, DECK_NOT_FOUND, NO_DECKS,
};

fn tarot() -> DeckTable {
    DeckTable::new().with_deck(
        "tarot",
        [
            "fool", "magician", "priestess", "empress", "emperor", "hierophant", "lovers",
            "chariot", "strength", "hermit", "wheel", "justice",
        ],
    )
}

/// Engine whose locator only knows an explicit list of names.
struct SplitHost {
    inner: TableEngine,
    indexed: Vec<&'static str>,
}

impl CardDrawer for SplitHost {
    fn draw(&mut self, expression: &str) -> Result<String, CollaboratorError> {
        self.inner.draw(expression)
    }
}

impl DeckLocator for SplitHost {
    fn find_deck(&self, name: &str) -> Result<Option<usize>, CollaboratorError> {
        Ok(self.indexed.iter().position(|n| *n == name))
    }
}

/// Test the documented draw examples.
#[test]
fn test_documented_examples() {
    let primary = tarot();
    let extended = DeckTable::new();
    let engine = TableEngine::new(primary.clone(), extended.clone());
    let mut draws = DrawOrchestrator::new(&primary, &extended, engine);

    let three = draws.draw_from_deck("tarot", 3);
    assert!(three.success);
    assert_eq!(three.cards.len(), 3);
    assert!(three.message.is_empty());

    let eleven = draws.draw_from_deck("tarot", 11);
    assert!(!eleven.success);
    assert!(eleven.cards.is_empty());

    let ghost = draws.draw_from_deck("ghost", 1);
    assert!(!ghost.success);
    assert_eq!(ghost.message, "deck ghost does not exist");
}

/// Test that an exhausted pile fails the whole batch.
#[test]
fn test_exhausted_deck_fails_batch() {
    let primary = DeckTable::new().with_deck("coin", ["heads", "tails"]);
    let extended = DeckTable::new();
    let config = EngineConfig::default().with_seed(3).exhaust();
    let engine = TableEngine::with_config(primary.clone(), extended.clone(), &config);
    let mut draws = DrawOrchestrator::new(&primary, &extended, engine);

    let result = draws.draw_from_deck("coin", 3);
    assert!(!result.success);
    assert!(result.cards.is_empty());
    assert_eq!(result.message, "draw from deck coin failed");

    // Both cards were dealt before the failure; the pile stays empty.
    assert!(!draws.draw_from_deck("coin", 1).success);

    draws.engine_mut().reset();
    let result = draws.draw_from_deck("coin", 2);
    assert!(result.success);
    let mut cards = result.cards;
    cards.sort();
    assert_eq!(cards, vec!["heads", "tails"]);
}

/// Test that a deck in the registries but not in the engine fails at the
/// draw step, not the existence gate.
#[test]
fn test_registry_only_deck_fails_at_draw() {
    let primary = tarot().with_deck("phantom", ["boo"]);
    let extended = DeckTable::new();
    let engine = TableEngine::new(tarot(), DeckTable::new());
    let mut draws = DrawOrchestrator::new(&primary, &extended, engine);

    let result = draws.draw_from_deck("phantom", 1);
    assert_eq!(result.message, "draw from deck phantom failed");
}

/// Test that locator-based existence and registry-based existence diverge.
#[test]
fn test_deck_exists_can_diverge_from_draw_gate() {
    let primary = tarot();
    let extended = DeckTable::new().with_deck("runes", ["fehu", "uruz"]);
    let host = SplitHost {
        inner: TableEngine::new(primary.clone(), extended.clone()),
        indexed: vec!["tarot", "unlisted"],
    };
    let mut draws = DrawOrchestrator::new(&primary, &extended, host);

    // Registered and drawable, but unknown to the locator.
    assert!(!draws.deck_exists("runes"));
    assert!(draws.draw_from_deck("runes", 2).success);

    // Known to the locator, absent from both registries.
    assert!(draws.deck_exists("unlisted"));
    let result = draws.draw_from_deck("unlisted", 1);
    assert!(!result.success);
    assert_eq!(result.message, "deck unlisted does not exist");
    assert_eq!(draws.get_deck_size("unlisted"), DECK_NOT_FOUND);

    // Both agree.
    assert!(draws.deck_exists("tarot"));
    assert_eq!(draws.get_deck_size("tarot"), 12);
}

/// Test listing both registries and the empty sentinel.
#[test]
fn test_list_decks() {
    let primary = tarot();
    let extended = DeckTable::new()
        .with_deck("runes", ["fehu", "uruz"])
        .with_deck("coin", ["heads", "tails"]);
    let engine = TableEngine::new(DeckTable::new(), DeckTable::new());
    let draws = DrawOrchestrator::new(&primary, &extended, engine);

    let listing = draws.list_decks();
    let lines: Vec<&str> = listing.lines().collect();
    assert_eq!(
        lines,
        vec![
            "=== available decks ===",
            "- tarot (12 cards)",
            "- coin [extended] (2 cards)",
            "- runes [extended] (2 cards)",
        ]
    );

    let empty = DrawOrchestrator::new(
        DeckTable::new(),
        DeckTable::new(),
        TableEngine::new(DeckTable::new(), DeckTable::new()),
    );
    assert_eq!(empty.list_decks(), NO_DECKS);
}

/// Test registries shared with an owner that mutates them between calls.
#[test]
fn test_shared_registries() {
    let primary = Arc::new(RwLock::new(DeckTable::new()));
    let extended = DeckTable::new();
    let engine = TableEngine::new(tarot(), DeckTable::new());
    let mut draws = DrawOrchestrator::new(Arc::clone(&primary), &extended, engine);

    assert!(!draws.draw_from_deck("tarot", 1).success);
    assert_eq!(draws.get_deck_size("tarot"), DECK_NOT_FOUND);

    primary.write().unwrap().insert("tarot", tarot().get("tarot").unwrap().clone());
    assert!(draws.draw_from_deck("tarot", 1).success);
    assert_eq!(draws.get_deck_size("tarot"), 12);
}

/// Test that a poisoned registry degrades to failure results.
#[test]
fn test_poisoned_registry_is_total() {
    let primary = Arc::new(RwLock::new(tarot()));
    let writer = Arc::clone(&primary);
    let _ = std::thread::spawn(move || {
        let _guard = writer.write().unwrap();
        panic!("owner crashed mid-update");
    })
    .join();

    let extended = DeckTable::new();
    let mut draws = DrawOrchestrator::new(
        Arc::clone(&primary),
        &extended,
        TableEngine::new(tarot(), DeckTable::new()),
    );

    let result = draws.draw_from_deck("tarot", 1);
    assert!(!result.success);
    assert!(result.message.starts_with("draw exception"));
    assert_eq!(draws.get_deck_size("tarot"), DECK_NOT_FOUND);
    assert_eq!(draws.list_decks(), "failed to list decks");
}
