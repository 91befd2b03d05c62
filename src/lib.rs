//! # dice-query
//!
//! Rule lookup and deck draw orchestration for a tabletop dice engine.
//!
//! The host engine owns the data: a message dictionary of rule texts, and a
//! primary and an extended deck registry. This crate reads them through
//! traits and adds the query logic on top.
//!
//! ## Design Principles
//!
//! 1. **Explicit context**: dictionaries, registries and primitives are
//!    passed in. There is no global state.
//!
//! 2. **Total boundary**: `query_rule`, `draw_from_deck` and friends always
//!    return a value. The `Result` forms (`resolve`, `try_draw`, `deck_size`)
//!    are there for Rust callers.
//!
//! 3. **Configurable systems**: per-system rule listing is driven by a
//!    registry of key filters, not hardcoded branches.
//!
//! ## Modules
//!
//! - `core`: errors, configuration, RNG
//! - `rules`: message dictionary, query parsing, resolver, local rule library
//! - `decks`: deck registries, draw primitives, reference engine, orchestrator

pub mod core;
pub mod decks;
pub mod rules;

// Re-export commonly used types
pub use crate::core::{
    CollaboratorError, DrawMode, DrawRng, DrawRngState, EngineConfig, ErrorKind, QueryConfig,
    QueryError,
};

pub use crate::rules::{
    KeyFilter, MessageDictionary, MessageStore, RuleAnswer, RuleBook, RuleCache, RuleEntry,
    RuleLibrary, RuleLookup, RuleQuery, RuleQueryResult, RuleResolver, SystemFilters,
};

pub use crate::decks::{
    draw_expression, CardDrawer, Deck, DeckLocator, DeckRegistry, DeckTable, DrawOrchestrator,
    DrawResult, TableEngine,
};
