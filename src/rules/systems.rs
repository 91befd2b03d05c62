//! Game-system key filters.
//!
//! `list_rules_by_system` decides membership with a predicate over the
//! lowercased dictionary key. Predicates are registered per system name;
//! unknown systems match nothing.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::core::config::{builtin_systems, QueryConfig};

/// Predicate deciding whether a lowercased key belongs to a system.
#[derive(Clone)]
pub enum KeyFilter {
    /// Key contains any of the terms. Terms are stored lowercased.
    ContainsAny(Vec<String>),

    /// Custom predicate over the lowercased key.
    Custom(Arc<dyn Fn(&str) -> bool + Send + Sync>),

    /// Never matches.
    Nothing,
}

impl KeyFilter {
    /// Substring filter over any of `terms`.
    pub fn contains_any<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::ContainsAny(terms.into_iter().map(|t| t.as_ref().to_lowercase()).collect())
    }

    /// Custom predicate.
    pub fn custom(predicate: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        Self::Custom(Arc::new(predicate))
    }

    /// Evaluate against a lowercased key.
    #[must_use]
    pub fn matches(&self, key_lower: &str) -> bool {
        match self {
            Self::ContainsAny(terms) => terms.iter().any(|t| key_lower.contains(t.as_str())),
            Self::Custom(predicate) => predicate(key_lower),
            Self::Nothing => false,
        }
    }
}

impl fmt::Debug for KeyFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ContainsAny(terms) => f.debug_tuple("ContainsAny").field(terms).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
            Self::Nothing => f.write_str("Nothing"),
        }
    }
}

/// Registry of system name -> key filter.
///
/// ## Example
///
/// ```
/// use dice_query::rules::{KeyFilter, SystemFilters};
///
/// let filters = SystemFilters::builtin()
///     .with_system("wod", KeyFilter::contains_any(["wod", "willpower"]));
///
/// assert!(filters.matches("COC", "coc rules"));
/// assert!(filters.matches("wod", "willpower roll"));
/// assert!(!filters.matches("gurps", "gurps basics"));
/// ```
#[derive(Clone, Debug, Default)]
pub struct SystemFilters {
    filters: FxHashMap<String, KeyFilter>,
}

impl SystemFilters {
    /// Empty registry; every system matches nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in `coc` and `dnd` table.
    #[must_use]
    pub fn builtin() -> Self {
        Self::from_terms(&builtin_systems())
    }

    /// Build from a system -> terms table.
    #[must_use]
    pub fn from_terms(table: &BTreeMap<String, Vec<String>>) -> Self {
        let mut filters = Self::new();
        for (system, terms) in table {
            filters.register(system, KeyFilter::contains_any(terms));
        }
        filters
    }

    /// Build from the `systems` section of a configuration.
    #[must_use]
    pub fn from_config(config: &QueryConfig) -> Self {
        Self::from_terms(&config.systems)
    }

    /// Register or replace a system's filter. System names are case-insensitive.
    pub fn register(&mut self, system: &str, filter: KeyFilter) {
        self.filters.insert(system.to_lowercase(), filter);
    }

    /// Builder form of [`register`](Self::register).
    #[must_use]
    pub fn with_system(mut self, system: &str, filter: KeyFilter) -> Self {
        self.register(system, filter);
        self
    }

    /// Filter for a system, if registered.
    #[must_use]
    pub fn get(&self, system: &str) -> Option<&KeyFilter> {
        self.filters.get(&system.to_lowercase())
    }

    /// Does `key_lower` belong to `system`? Unknown systems never match.
    #[must_use]
    pub fn matches(&self, system: &str, key_lower: &str) -> bool {
        self.get(system).is_some_and(|filter| filter.matches(key_lower))
    }

    /// Registered system names, sorted.
    #[must_use]
    pub fn systems(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.filters.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
