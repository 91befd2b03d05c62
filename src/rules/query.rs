//! Rule query parsing.

/// Separator between the system scope and the keyword.
pub const SYSTEM_SEPARATOR: char = ':';

/// A parsed rule query.
///
/// `system` is lowercased, `keyword` keeps the caller's casing for messages,
/// `needle` is the lowercased keyword used for matching.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuleQuery {
    pub system: String,
    pub keyword: String,
    pub needle: String,
}

impl RuleQuery {
    /// Split on the first colon.
    ///
    /// ```
    /// use dice_query::rules::RuleQuery;
    ///
    /// let q = RuleQuery::parse("CoC:Sanity:Loss");
    /// assert_eq!(q.system, "coc");
    /// assert_eq!(q.keyword, "Sanity:Loss");
    /// assert_eq!(q.needle, "sanity:loss");
    /// ```
    #[must_use]
    pub fn parse(query: &str) -> Self {
        match query.split_once(SYSTEM_SEPARATOR) {
            Some((system, keyword)) => Self::new(system.to_lowercase(), keyword),
            None => Self::new(String::new(), query),
        }
    }

    /// Build the query string `system:keyword` and parse it.
    #[must_use]
    pub fn scoped(system: &str, keyword: &str) -> Self {
        Self::parse(&format!("{system}{SYSTEM_SEPARATOR}{keyword}"))
    }

    fn new(system: String, keyword: &str) -> Self {
        Self {
            system,
            keyword: keyword.to_string(),
            needle: keyword.to_lowercase(),
        }
    }

    /// Whether a system scope was given.
    #[must_use]
    pub fn has_system(&self) -> bool {
        !self.system.is_empty()
    }

    /// Exact or substring match against an already lowercased key.
    #[must_use]
    pub fn matches_lowered(&self, key_lower: &str) -> bool {
        key_lower == self.needle || key_lower.contains(&self.needle)
    }
}
