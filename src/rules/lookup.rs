//! Layered rule lookup: message dictionary first, then the local library.

use std::fmt;

use tracing::{debug, warn};

use crate::core::QueryError;

use super::dictionary::MessageDictionary;
use super::library::RuleLibrary;
use super::query::{RuleQuery, SYSTEM_SEPARATOR};
use super::resolver::RuleResolver;

/// A resolved rule ready for display.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuleAnswer {
    pub title: String,
    pub content: String,
}

impl fmt::Display for RuleAnswer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "【{}】\n{}", self.title, self.content)
    }
}

/// Chains a dictionary resolver with an optional rule library.
///
/// Unlike [`RuleResolver::resolve`], the query is trimmed, anything after a
/// second colon is dropped, and both halves of `system:keyword` are trimmed
/// before searching.
pub struct RuleLookup<'a, D> {
    resolver: &'a RuleResolver<D>,
    library: Option<&'a RuleLibrary>,
}

impl<'a, D: MessageDictionary> RuleLookup<'a, D> {
    pub fn new(resolver: &'a RuleResolver<D>) -> Self {
        Self {
            resolver,
            library: None,
        }
    }

    /// Fall back to `library` when the dictionary has no match.
    #[must_use]
    pub fn with_library(mut self, library: &'a RuleLibrary) -> Self {
        self.library = Some(library);
        self
    }

    /// Look up a rule.
    pub fn lookup(&self, query: &str) -> Result<RuleAnswer, QueryError> {
        let query = query.trim();
        let mut parts = query.splitn(3, SYSTEM_SEPARATOR);
        let (system, keyword) = match (parts.next(), parts.next()) {
            (Some(system), Some(keyword)) => (system.trim(), keyword.trim()),
            _ => ("", query),
        };

        let from_dictionary = if system.is_empty() {
            self.resolver.resolve(keyword)
        } else {
            self.resolver
                .resolve_parsed(&RuleQuery::scoped(system, keyword))
        };

        match from_dictionary {
            Ok(content) if !content.is_empty() => {
                return Ok(RuleAnswer {
                    title: keyword.to_string(),
                    content,
                });
            }
            Err(QueryError::Lookup(e)) => {
                warn!(error = %e, "dictionary unavailable, trying rule library");
            }
            _ => {}
        }

        if let Some(entry) = self.library.and_then(|lib| lib.find(system, keyword)) {
            debug!(system, keyword, name = %entry.name, "rule found in library");
            return Ok(RuleAnswer {
                title: entry.name.clone(),
                content: entry.content.clone(),
            });
        }

        Err(QueryError::RuleNotFound(keyword.to_string()))
    }

    /// Human-readable overview of what can be searched.
    pub fn summary(&self) -> String {
        let mut out = format!("rules: {}\n", self.resolver.list_rule_keys().len());
        let Some(library) = self.library else {
            return out;
        };

        if library.books().next().is_some() {
            out.push_str("library:\n");
            for book in library.books() {
                out.push_str(&format!("- {}: {}\n", book.system(), book.len()));
            }
        }
        if let Some(cache) = library.cache() {
            let systems: Vec<&str> = cache.systems().collect();
            out.push_str(&format!("cache: version {}\n", cache.version()));
            out.push_str(&format!("systems: {}\n", systems.join(", ")));
        }
        out
    }
}
