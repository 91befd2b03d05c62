//! Local rule library.
//!
//! Rule books grouped by game system, searched after the message dictionary.
//! Books are loaded from a rules directory, one book per `*.json`, `*.yaml`
//! or `*.yml` file named after the file stem. A cached rule set
//! (`rules_cache.json`) may be attached and is searched after every local
//! book.
//!
//! Lookup order for `find(system, keyword)`, run over the local books and
//! then over the cache:
//!
//! 1. The named system's book: exact key/name match, then substring match
//! 2. Every book: exact match
//! 3. Every book: substring match
//!
//! All comparisons are case-insensitive. Entries keep their file order.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::core::CollaboratorError;

/// File name of the cached rule set.
pub const RULES_CACHE_FILE: &str = "rules_cache.json";

/// Extensions picked up by [`RuleLibrary::load_dir`].
const BOOK_EXTENSIONS: &[&str] = &["json", "yaml", "yml"];

/// A single rule with its display name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleEntry {
    pub name: String,
    pub content: String,
}

impl RuleEntry {
    /// Create an entry.
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    fn matches_exact(&self, key: &str, needle: &str) -> bool {
        key.to_lowercase() == needle || self.name.to_lowercase() == needle
    }

    fn matches_fuzzy(&self, key: &str, needle: &str) -> bool {
        key.to_lowercase().contains(needle) || self.name.to_lowercase().contains(needle)
    }
}

/// Rules for one game system, in insertion order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RuleBook {
    system: String,
    entries: Vec<(String, RuleEntry)>,
}

impl RuleBook {
    /// Empty book. The system name is stored lowercased.
    pub fn new(system: &str) -> Self {
        Self {
            system: system.to_lowercase(),
            entries: Vec::new(),
        }
    }

    /// Parse a book from JSON.
    ///
    /// Each entry is either `"key": "content"` or
    /// `"key": {"name": "Display", "content": "..."}`. Entries of any other
    /// shape are skipped.
    pub fn from_json(system: &str, json: &str) -> Result<Self, CollaboratorError> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| CollaboratorError::new(format!("rule book {system}: {e}")))?;
        Ok(Self::from_entries(system, expect_object(system, &value)?))
    }

    /// Parse a book from YAML.
    ///
    /// Accepts the JSON entry shapes, plus the manual shape
    /// `{rule: <system>, manual: {key: content}}` whose `rule` overrides
    /// `system`.
    pub fn from_yaml(system: &str, yaml: &str) -> Result<Self, CollaboratorError> {
        let value: Value = serde_yaml::from_str(yaml)
            .map_err(|e| CollaboratorError::new(format!("rule book {system}: {e}")))?;
        let root = expect_object(system, &value)?;

        match (non_empty_str(root.get("rule")), root.get("manual")) {
            (Some(rule), Some(Value::Object(manual))) => Ok(Self::from_manual(rule, manual)),
            _ => Ok(Self::from_entries(system, root)),
        }
    }

    /// Load a book from a `.json`, `.yaml` or `.yml` file named after its
    /// system.
    pub fn from_path(path: &Path) -> Result<Self, CollaboratorError> {
        let system = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| file_error(path, "no file name"))?;
        let ext = extension(path).ok_or_else(|| file_error(path, "unsupported rule file"))?;
        let text = fs::read_to_string(path).map_err(|e| file_error(path, e))?;

        if ext == "json" {
            Self::from_json(system, &text)
        } else {
            Self::from_yaml(system, &text)
        }
    }

    fn from_entries(system: &str, root: &Map<String, Value>) -> Self {
        let mut book = Self::new(system);
        for (key, value) in root {
            match value {
                Value::String(content) => {
                    book.insert(key.clone(), RuleEntry::new(key.clone(), content.clone()));
                }
                Value::Object(fields) => {
                    let name = non_empty_str(fields.get("name")).unwrap_or(key.as_str());
                    let content = non_empty_str(fields.get("content"))
                        .map_or_else(|| value.to_string(), str::to_string);
                    book.insert(key.clone(), RuleEntry::new(name, content));
                }
                _ => {}
            }
        }
        book
    }

    fn from_manual(system: &str, manual: &Map<String, Value>) -> Self {
        let mut book = Self::new(system);
        for (key, value) in manual {
            if let Value::String(content) = value {
                book.insert(key.clone(), RuleEntry::new(key.clone(), content.clone()));
            }
        }
        book
    }

    /// Insert an entry. Re-inserting a key replaces it in place.
    pub fn insert(&mut self, key: impl Into<String>, entry: RuleEntry) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = entry,
            None => self.entries.push((key, entry)),
        }
    }

    /// Builder form of [`insert`](Self::insert) where the key is the name.
    #[must_use]
    pub fn with_rule(mut self, name: &str, content: &str) -> Self {
        self.insert(name, RuleEntry::new(name, content));
        self
    }

    #[must_use]
    pub fn system(&self) -> &str {
        &self.system
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate `(key, entry)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RuleEntry)> {
        self.entries.iter().map(|(k, e)| (k.as_str(), e))
    }

    fn find_exact(&self, needle: &str) -> Option<&RuleEntry> {
        self.iter().find(|(k, e)| e.matches_exact(k, needle)).map(|(_, e)| e)
    }

    fn find_fuzzy(&self, needle: &str) -> Option<&RuleEntry> {
        self.iter().find(|(k, e)| e.matches_fuzzy(k, needle)).map(|(_, e)| e)
    }
}

fn expect_object<'a>(
    system: &str,
    value: &'a Value,
) -> Result<&'a Map<String, Value>, CollaboratorError> {
    match value {
        Value::Object(root) => Ok(root),
        _ => Err(CollaboratorError::new(format!(
            "rule book {system}: expected a mapping"
        ))),
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    match value {
        Some(Value::String(s)) if !s.is_empty() => Some(s.as_str()),
        _ => None,
    }
}

fn file_error(path: &Path, msg: impl fmt::Display) -> CollaboratorError {
    CollaboratorError::new(format!("{}: {msg}", path.display()))
}

/// Lowercased extension of a rule file, if it is one we read.
fn extension(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    BOOK_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

/// On-disk layout of the rule cache.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CacheFile {
    version: String,
    #[serde(default)]
    rules: Map<String, Value>,
    #[serde(default)]
    last_update: i64,
}

/// A previously fetched rule set, searched after the local books.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RuleCache {
    version: String,
    last_update: i64,
    books: Vec<RuleBook>,
}

impl RuleCache {
    /// Parse `{"version": .., "rules": {system: {key: entry}}, "lastUpdate": ms}`.
    pub fn from_json(json: &str) -> Result<Self, CollaboratorError> {
        let file: CacheFile = serde_json::from_str(json)
            .map_err(|e| CollaboratorError::new(format!("rule cache: {e}")))?;

        let books = file
            .rules
            .iter()
            .filter_map(|(system, rules)| match rules {
                Value::Object(entries) => Some(RuleBook::from_entries(system, entries)),
                _ => None,
            })
            .collect();

        Ok(Self {
            version: file.version,
            last_update: file.last_update,
            books,
        })
    }

    /// Read a cache file. A missing file is `None`; an unreadable one is
    /// logged and also `None`.
    #[must_use]
    pub fn load(path: &Path) -> Option<Self> {
        if !path.is_file() {
            debug!(path = %path.display(), "no rule cache");
            return None;
        }

        let loaded = fs::read_to_string(path)
            .map_err(|e| CollaboratorError::new(e.to_string()))
            .and_then(|text| Self::from_json(&text));
        match loaded {
            Ok(cache) => {
                debug!(version = %cache.version, systems = cache.books.len(), "rule cache loaded");
                Some(cache)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load rule cache");
                None
            }
        }
    }

    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Last update time in milliseconds since the Unix epoch.
    #[must_use]
    pub fn last_update(&self) -> i64 {
        self.last_update
    }

    /// Cached systems in file order.
    pub fn systems(&self) -> impl Iterator<Item = &str> {
        self.books.iter().map(RuleBook::system)
    }

    pub fn books(&self) -> impl Iterator<Item = &RuleBook> {
        self.books.iter()
    }
}

/// Collection of rule books plus an optional cache.
#[derive(Clone, Debug, Default)]
pub struct RuleLibrary {
    books: Vec<RuleBook>,
    cache: Option<RuleCache>,
}

impl RuleLibrary {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Library loaded from a rules directory.
    #[must_use]
    pub fn from_dir(dir: &Path) -> Self {
        let mut library = Self::new();
        library.load_dir(dir);
        library
    }

    /// Load every rule file in `dir`, in file name order, and return how
    /// many were loaded.
    ///
    /// Files that fail to parse are logged and skipped. A missing directory
    /// loads nothing.
    pub fn load_dir(&mut self, dir: &Path) -> usize {
        if !dir.is_dir() {
            debug!(dir = %dir.display(), "rules directory missing, skipping");
            return 0;
        }

        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "cannot read rules directory");
                return 0;
            }
        };
        let mut paths: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && extension(path).is_some())
            .collect();
        paths.sort();

        let mut loaded = 0;
        for path in paths {
            match RuleBook::from_path(&path) {
                Ok(book) => {
                    debug!(file = %path.display(), system = book.system(), rules = book.len(), "rule file loaded");
                    self.add(book);
                    loaded += 1;
                }
                Err(e) => warn!(file = %path.display(), error = %e, "skipping rule file"),
            }
        }

        if loaded > 0 {
            info!(dir = %dir.display(), loaded, "local rule files loaded");
        }
        loaded
    }

    /// Add a book, replacing any book for the same system.
    pub fn add(&mut self, book: RuleBook) {
        match self.books.iter_mut().find(|b| b.system == book.system) {
            Some(slot) => *slot = book,
            None => self.books.push(book),
        }
    }

    /// Builder form of [`add`](Self::add).
    #[must_use]
    pub fn with_book(mut self, book: RuleBook) -> Self {
        self.add(book);
        self
    }

    /// Attach a rule cache, replacing any previous one.
    pub fn set_cache(&mut self, cache: RuleCache) {
        self.cache = Some(cache);
    }

    /// Builder form of [`set_cache`](Self::set_cache).
    #[must_use]
    pub fn with_cache(mut self, cache: RuleCache) -> Self {
        self.set_cache(cache);
        self
    }

    #[must_use]
    pub fn cache(&self) -> Option<&RuleCache> {
        self.cache.as_ref()
    }

    /// Local book for a system, case-insensitive.
    #[must_use]
    pub fn book(&self, system: &str) -> Option<&RuleBook> {
        let system = system.to_lowercase();
        self.books.iter().find(|b| b.system == system)
    }

    /// Iterate local books in insertion order.
    pub fn books(&self) -> impl Iterator<Item = &RuleBook> {
        self.books.iter()
    }

    /// No local books and no cache.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.books.is_empty() && self.cache.is_none()
    }

    /// Find a rule; see the module docs for the search order.
    #[must_use]
    pub fn find(&self, system: &str, keyword: &str) -> Option<&RuleEntry> {
        let system = system.to_lowercase();
        let needle = keyword.to_lowercase();

        search(&self.books, &system, &needle)
            .or_else(|| self.cache.as_ref().and_then(|c| search(&c.books, &system, &needle)))
    }
}

fn search<'a>(books: &'a [RuleBook], system: &str, needle: &str) -> Option<&'a RuleEntry> {
    if !system.is_empty() {
        if let Some(book) = books.iter().find(|b| b.system == system) {
            if let Some(entry) = book.find_exact(needle).or_else(|| book.find_fuzzy(needle)) {
                return Some(entry);
            }
        }
    }

    books
        .iter()
        .find_map(|b| b.find_exact(needle))
        .or_else(|| books.iter().find_map(|b| b.find_fuzzy(needle)))
}
