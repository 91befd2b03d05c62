//! Rule lookup over a message dictionary.
//!
//! ## Key Types
//!
//! - `MessageDictionary`: read access to the host's key/value messages
//! - `MessageStore`: insertion-ordered in-memory dictionary
//! - `RuleQuery`: parsed `system:keyword` query
//! - `SystemFilters`: system name -> key predicate registry
//! - `RuleResolver`: query, list and filter rules
//! - `RuleLibrary` / `RuleCache` / `RuleLookup`: local rule books and the cached
//!   rule set, searched after the dictionary

pub mod dictionary;
pub mod library;
pub mod lookup;
pub mod query;
pub mod resolver;
pub mod systems;

pub use dictionary::{MessageDictionary, MessageStore};
pub use library::{RuleBook, RuleCache, RuleEntry, RuleLibrary, RULES_CACHE_FILE};
pub use lookup::{RuleAnswer, RuleLookup};
pub use query::{RuleQuery, SYSTEM_SEPARATOR};
pub use resolver::{RuleQueryResult, RuleResolver, RESERVED_KEY_PREFIX};
pub use systems::{KeyFilter, SystemFilters};
