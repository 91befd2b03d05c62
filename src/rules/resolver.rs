//! Rule resolution over a message dictionary.
//!
//! Matching is case-insensitive and substring-tolerant: the first entry, in
//! dictionary enumeration order, whose lowercased key equals or contains the
//! lowercased keyword wins. A `system:` prefix is parsed but does not narrow
//! this search.

use std::ops::ControlFlow;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::QueryError;

use super::dictionary::MessageDictionary;
use super::query::RuleQuery;
use super::systems::SystemFilters;

/// Keys with this prefix are system messages, not rules.
pub const RESERVED_KEY_PREFIX: &str = "str";

/// Boundary result of a rule query.
///
/// Exactly one of `content` / `error` is meaningful, per `success`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleQueryResult {
    pub success: bool,
    pub content: String,
    pub error: String,
}

impl RuleQueryResult {
    /// Successful result.
    pub fn found(content: impl Into<String>) -> Self {
        Self {
            success: true,
            content: content.into(),
            error: String::new(),
        }
    }

    /// Failed result.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            content: String::new(),
            error: error.into(),
        }
    }
}

impl From<Result<String, QueryError>> for RuleQueryResult {
    fn from(result: Result<String, QueryError>) -> Self {
        match result {
            Ok(content) => Self::found(content),
            Err(e) => Self::failed(e.to_string()),
        }
    }
}

/// Resolves rule queries against a message dictionary.
///
/// ## Example
///
/// ```
/// use dice_query::rules::{MessageStore, RuleResolver};
///
/// let store: MessageStore = [("SAN check", "roll against SAN")].into_iter().collect();
/// let resolver = RuleResolver::new(&store);
///
/// let found = resolver.query_rule("san");
/// assert!(found.success);
/// assert_eq!(found.content, "roll against SAN");
///
/// let missing = resolver.query_rule("nonexistent:xyz");
/// assert!(!missing.success);
/// assert!(missing.error.contains("xyz"));
/// ```
#[derive(Clone, Debug)]
pub struct RuleResolver<D> {
    dictionary: D,
    systems: SystemFilters,
}

impl<D: MessageDictionary> RuleResolver<D> {
    /// Resolver with the built-in system table.
    pub fn new(dictionary: D) -> Self {
        Self {
            dictionary,
            systems: SystemFilters::builtin(),
        }
    }

    /// Replace the system filter registry.
    #[must_use]
    pub fn with_systems(mut self, systems: SystemFilters) -> Self {
        self.systems = systems;
        self
    }

    /// The dictionary being searched.
    pub fn dictionary(&self) -> &D {
        &self.dictionary
    }

    /// The system filter registry.
    pub fn systems(&self) -> &SystemFilters {
        &self.systems
    }

    /// Resolve a query to the matching rule text.
    pub fn resolve(&self, query: &str) -> Result<String, QueryError> {
        self.resolve_parsed(&RuleQuery::parse(query))
    }

    /// Resolve an already parsed query.
    pub fn resolve_parsed(&self, query: &RuleQuery) -> Result<String, QueryError> {
        let mut found = None;
        self.dictionary
            .scan(&mut |key, value| {
                if query.matches_lowered(&key.to_lowercase()) {
                    found = Some((key.to_string(), value.to_string()));
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            })
            .map_err(|e| {
                warn!(error = %e, "message dictionary read failed");
                QueryError::Lookup(e)
            })?;

        match found {
            Some((key, content)) => {
                debug!(keyword = %query.keyword, system = %query.system, key = %key, "rule matched");
                Ok(content)
            }
            None => {
                debug!(keyword = %query.keyword, system = %query.system, "rule not found");
                Err(QueryError::RuleNotFound(query.keyword.clone()))
            }
        }
    }

    /// Query a rule. Accepts `keyword` or `system:keyword`.
    pub fn query_rule(&self, query: &str) -> RuleQueryResult {
        self.resolve(query).into()
    }

    /// Same as `query_rule(system + ":" + keyword)`.
    pub fn query_rule_by_system(&self, system: &str, keyword: &str) -> RuleQueryResult {
        self.resolve_parsed(&RuleQuery::scoped(system, keyword)).into()
    }

    /// All rule keys, skipping reserved `str*` system messages.
    pub fn try_list_rule_keys(&self) -> Result<Vec<String>, QueryError> {
        let mut keys = Vec::new();
        self.dictionary
            .scan(&mut |key, _| {
                if !key.starts_with(RESERVED_KEY_PREFIX) {
                    keys.push(key.to_string());
                }
                ControlFlow::Continue(())
            })
            .map_err(QueryError::Lookup)?;
        Ok(keys)
    }

    /// All rule keys. A dictionary failure yields an empty list.
    pub fn list_rule_keys(&self) -> Vec<String> {
        self.try_list_rule_keys().unwrap_or_else(|e| {
            warn!(error = %e, "listing rule keys failed");
            Vec::new()
        })
    }

    /// Keys belonging to a system, per the filter registry.
    pub fn try_list_rules_by_system(&self, system: &str) -> Result<Vec<String>, QueryError> {
        let Some(filter) = self.systems.get(system) else {
            return Ok(Vec::new());
        };

        let mut keys = Vec::new();
        self.dictionary
            .scan(&mut |key, _| {
                if filter.matches(&key.to_lowercase()) {
                    keys.push(key.to_string());
                }
                ControlFlow::Continue(())
            })
            .map_err(QueryError::Lookup)?;
        Ok(keys)
    }

    /// Keys belonging to a system. Unknown systems and dictionary failures
    /// yield an empty list.
    pub fn list_rules_by_system(&self, system: &str) -> Vec<String> {
        self.try_list_rules_by_system(system).unwrap_or_else(|e| {
            warn!(system, error = %e, "listing rules by system failed");
            Vec::new()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::CollaboratorError;
    use crate::rules::{KeyFilter, MessageStore};

    struct BrokenDictionary;

    impl MessageDictionary for BrokenDictionary {
        fn scan(
            &self,
            _visit: &mut dyn FnMut(&str, &str) -> ControlFlow<()>,
        ) -> Result<(), CollaboratorError> {
            Err(CollaboratorError::new("store offline"))
        }
    }

    fn sample_store() -> MessageStore {
        [
            ("strHelp", "system help text"),
            ("SAN check", "roll against SAN"),
            ("COC creation", "3d6 x5"),
            ("技能检定", "roll d100"),
            ("临时疯狂", "1d10 rounds"),
            ("DND advantage", "roll 2d20 keep high"),
            ("Critical", "a natural 01"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_exact_and_substring_match() {
        let store = sample_store();
        let resolver = RuleResolver::new(&store);

        assert_eq!(resolver.resolve("critical").unwrap(), "a natural 01");
        assert_eq!(resolver.resolve("SAN").unwrap(), "roll against SAN");
        assert_eq!(resolver.resolve("检定").unwrap(), "roll d100");
    }

    #[test]
    fn test_first_match_wins() {
        let store: MessageStore = [("fire bolt", "first"), ("fire", "second")]
            .into_iter()
            .collect();
        let resolver = RuleResolver::new(&store);

        // "fire" is an exact match for the second entry, but the first entry
        // contains it and comes first.
        assert_eq!(resolver.resolve("fire").unwrap(), "first");
    }

    #[test]
    fn test_system_does_not_filter_match() {
        let store = sample_store();
        let resolver = RuleResolver::new(&store);

        let result = resolver.query_rule("dnd:san");
        assert!(result.success);
        assert_eq!(result.content, "roll against SAN");
    }

    #[test]
    fn test_not_found_keeps_original_case() {
        let store = sample_store();
        let resolver = RuleResolver::new(&store);

        let result = resolver.query_rule("coc:NoSuchRule");
        assert!(!result.success);
        assert_eq!(result.error, "rule not found: NoSuchRule");
        assert!(result.content.is_empty());
    }

    #[test]
    fn test_by_system_equals_joined_query() {
        let store = sample_store();
        let resolver = RuleResolver::new(&store);

        assert_eq!(
            resolver.query_rule_by_system("COC", "creation"),
            resolver.query_rule("COC:creation")
        );
        assert_eq!(
            resolver.query_rule_by_system("coc", "missing"),
            resolver.query_rule("coc:missing")
        );
    }

    #[test]
    fn test_reserved_prefix_is_still_searchable() {
        let store = sample_store();
        let resolver = RuleResolver::new(&store);

        assert_eq!(resolver.resolve("strhelp").unwrap(), "system help text");
    }

    #[test]
    fn test_list_rule_keys_skips_reserved() {
        let store = sample_store();
        let resolver = RuleResolver::new(&store);

        let keys = resolver.list_rule_keys();
        assert_eq!(keys.len(), 6);
        assert!(keys.iter().all(|k| !k.starts_with("str")));
        assert_eq!(keys[0], "SAN check");
    }

    #[test]
    fn test_list_rules_by_system() {
        let store = sample_store();
        let resolver = RuleResolver::new(&store);

        assert_eq!(
            resolver.list_rules_by_system("CoC"),
            vec!["COC creation", "技能检定", "临时疯狂"]
        );
        assert_eq!(resolver.list_rules_by_system("dnd"), vec!["DND advantage"]);
        assert!(resolver.list_rules_by_system("gurps").is_empty());
    }

    #[test]
    fn test_custom_system_filters() {
        let store = sample_store();
        let resolver = RuleResolver::new(&store).with_systems(
            SystemFilters::new().with_system("dice", KeyFilter::contains_any(["check", "critical"])),
        );

        assert_eq!(resolver.list_rules_by_system("dice"), vec!["SAN check", "Critical"]);
        assert!(resolver.list_rules_by_system("coc").is_empty());
    }

    #[test]
    fn test_broken_dictionary_is_total() {
        let resolver = RuleResolver::new(BrokenDictionary);

        let result = resolver.query_rule("san");
        assert!(!result.success);
        assert_eq!(result.error, "lookup exception: store offline");

        assert!(matches!(resolver.resolve("san"), Err(QueryError::Lookup(_))));
        assert!(resolver.list_rule_keys().is_empty());
        assert!(resolver.list_rules_by_system("coc").is_empty());
        assert!(resolver.try_list_rule_keys().is_err());
    }

    #[test]
    fn test_unknown_system_skips_scan() {
        let resolver = RuleResolver::new(BrokenDictionary);
        assert_eq!(resolver.try_list_rules_by_system("gurps"), Ok(Vec::new()));
    }

    #[test]
    fn test_result_serializes() {
        let result = RuleQueryResult::found("text");
        let json = serde_json::to_string(&result).unwrap();
        assert_eq!(json, r#"{"success":true,"content":"text","error":""}"#);
    }
}
