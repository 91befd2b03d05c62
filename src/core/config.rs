//! Query configuration.
//!
//! - `systems`: system name -> substring terms for `list_rules_by_system`
//! - `engine`: settings for the reference `TableEngine`
//!
//! The draw count bounds and the reserved `str` key prefix are fixed and not
//! configurable.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::CollaboratorError;

/// Environment variable prefix read by [`QueryConfig::load`].
pub const ENV_PREFIX: &str = "DICE_QUERY";

/// Built-in Call of Cthulhu terms: system tag, "check", "madness".
pub const COC_TERMS: &[&str] = &["coc", "检定", "疯狂"];

/// Built-in Dungeons & Dragons terms.
pub const DND_TERMS: &[&str] = &["dnd"];

/// Default nesting depth for resolving `{deck}` tokens inside cards.
pub const DEFAULT_MAX_DEPTH: usize = 8;

/// How the reference engine deals cards.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrawMode {
    /// Every draw picks from the full deck.
    #[default]
    Replace,
    /// Deal from a shuffled pile; an empty pile fails the draw.
    Exhaust,
}

/// Reference engine settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// RNG seed.
    pub seed: u64,

    /// Dealing mode.
    pub mode: DrawMode,

    /// Maximum nesting depth for `{deck}` tokens inside drawn cards.
    pub max_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            mode: DrawMode::Replace,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl EngineConfig {
    /// Set the seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Deal from exhaustible piles.
    #[must_use]
    pub fn exhaust(mut self) -> Self {
        self.mode = DrawMode::Exhaust;
        self
    }

    /// Set the nesting depth.
    #[must_use]
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }
}

/// Complete configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Per-system key terms. A key belongs to a system when its lowercased
    /// form contains any of the terms.
    pub systems: BTreeMap<String, Vec<String>>,

    /// Reference engine settings.
    pub engine: EngineConfig,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            systems: builtin_systems(),
            engine: EngineConfig::default(),
        }
    }
}

impl QueryConfig {
    /// Load from an optional file plus `DICE_QUERY_*` environment variables.
    ///
    /// Nested keys use `__`, e.g. `DICE_QUERY_ENGINE__SEED=7`. Anything not
    /// set keeps its default, including the built-in systems.
    pub fn load(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );
        builder.build()?.try_deserialize()
    }

    /// Parse from inline JSON.
    pub fn from_json(json: &str) -> Result<Self, CollaboratorError> {
        serde_json::from_str(json).map_err(|e| CollaboratorError::new(e.to_string()))
    }

    /// Add or replace a system's terms.
    #[must_use]
    pub fn with_system<I, S>(mut self, system: &str, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.systems.insert(
            system.to_lowercase(),
            terms.into_iter().map(Into::into).collect(),
        );
        self
    }

    /// Set the engine settings.
    #[must_use]
    pub fn with_engine(mut self, engine: EngineConfig) -> Self {
        self.engine = engine;
        self
    }
}

/// The built-in `coc` / `dnd` system table.
#[must_use]
pub fn builtin_systems() -> BTreeMap<String, Vec<String>> {
    let mut systems = BTreeMap::new();
    systems.insert("coc".to_string(), COC_TERMS.iter().map(|t| t.to_string()).collect());
    systems.insert("dnd".to_string(), DND_TERMS.iter().map(|t| t.to_string()).collect());
    systems
}
