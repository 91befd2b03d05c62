//! Deck draws: registries, host primitives and the draw orchestrator.
//!
//! ## Key Types
//!
//! - `DeckRegistry`: read access to a named deck collection
//! - `DeckTable` / `Deck`: in-memory registry
//! - `CardDrawer` / `DeckLocator`: the host engine's draw and index primitives
//! - `TableEngine`: reference engine over two `DeckTable`s
//! - `DrawOrchestrator`: validated multi-card draws and deck reporting

pub mod engine;
pub mod orchestrator;
pub mod registry;

pub use engine::{draw_expression, CardDrawer, DeckLocator, TableEngine};
pub use orchestrator::{
    DrawOrchestrator, DrawResult, DECK_NOT_FOUND, MAX_DRAW_COUNT, MIN_DRAW_COUNT, NO_DECKS,
};
pub use registry::{Deck, DeckRegistry, DeckTable};
