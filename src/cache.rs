//! Per-session prepared statement cache.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use crate::statement::{CacheMode, Query, QueryId};

/// Cache key: identity token for reference-cached queries, SQL text for statement-cached ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Reference(QueryId),
    Statement(String),
}

impl CacheKey {
    /// Key for a query, or `None` if the query is not cacheable.
    pub fn of(query: &Query) -> Option<Self> {
        if !query.is_cacheable() {
            return None;
        }
        match query.cache() {
            CacheMode::Reference => Some(CacheKey::Reference(query.id())),
            CacheMode::Statement => Some(CacheKey::Statement(query.statement().to_string())),
            CacheMode::None => None,
        }
    }
}

/// What the cache holds for a key.
#[derive(Debug, Clone)]
enum CacheEntry {
    /// Server handle of a reference-cached query and the name it was prepared under
    Handle {
        statement_id: u32,
        num_params: u16,
        name: String,
    },
    /// The full prepared query of a statement-cached entry
    Query(Query),
}

/// Maps queries to server statements prepared earlier on the same connection.
#[derive(Debug, Default)]
pub struct StatementCache {
    entries: HashMap<CacheKey, CacheEntry>,
}

impl StatementCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a query to its cached binding.
    ///
    /// For reference entries the returned query is `query` with the cached
    /// handle and prepared name applied. For statement entries it is the cached query itself,
    /// which may have a different identity.
    pub fn get(&self, query: &Query) -> Option<Query> {
        let key = CacheKey::of(query)?;
        match self.entries.get(&key)? {
            CacheEntry::Handle {
                statement_id,
                num_params,
                name,
            } => {
                let mut resolved = query.clone();
                resolved.set_name(name.clone());
                resolved.bind(*statement_id, *num_params);
                Some(resolved)
            }
            CacheEntry::Query(cached) => Some(cached.clone()),
        }
    }

    /// Insert a prepared query. Uncacheable or unprepared queries and keys
    /// already present are skipped.
    pub fn put(&mut self, query: &Query) {
        let (Some(key), Some(statement_id)) = (CacheKey::of(query), query.statement_id()) else {
            return;
        };
        let entry = match key {
            CacheKey::Reference(_) => CacheEntry::Handle {
                statement_id,
                num_params: query.num_params(),
                name: query.name().to_string(),
            },
            CacheKey::Statement(_) => CacheEntry::Query(query.clone()),
        };
        match self.entries.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(entry);
            }
            Entry::Occupied(_) => {
                tracing::trace!(statement = query.statement(), "statement already cached");
            }
        }
    }

    /// Remove the entry for a query. Returns true if one was present.
    pub fn delete(&mut self, query: &Query) -> bool {
        CacheKey::of(query).is_some_and(|key| self.entries.remove(&key).is_some())
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the cache has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
