//! Prepared query definitions.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_QUERY_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identity token, unique per [`Query`] construction.
///
/// Clones of a query share its identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueryId(u64);

impl QueryId {
    fn next() -> Self {
        Self(NEXT_QUERY_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// How a prepared query is looked up in the session's statement cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheMode {
    /// Cached under the query's identity token
    #[default]
    Reference,
    /// Cached under the statement text; textually identical queries share one statement
    Statement,
    /// Never cached
    None,
}

/// A statement that may or may not be prepared on the server yet.
///
/// The server binding (`statement_id`, `num_params`) is only changed by the
/// session when it (re-)prepares the query.
#[derive(Debug, Clone)]
pub struct Query {
    id: QueryId,
    name: String,
    statement: Arc<str>,
    cache: CacheMode,
    statement_id: Option<u32>,
    num_params: u16,
}

impl Query {
    /// Create a query. An empty `name` makes the statement anonymous.
    pub fn new(name: impl Into<String>, statement: impl Into<Arc<str>>) -> Self {
        Self {
            id: QueryId::next(),
            name: name.into(),
            statement: statement.into(),
            cache: CacheMode::Reference,
            statement_id: None,
            num_params: 0,
        }
    }

    /// Create an anonymous query.
    pub fn unnamed(statement: impl Into<Arc<str>>) -> Self {
        Self::new("", statement)
    }

    /// Set the cache mode.
    pub fn with_cache(mut self, cache: CacheMode) -> Self {
        self.cache = cache;
        self
    }

    /// Identity token.
    pub fn id(&self) -> QueryId {
        self.id
    }

    /// Statement name (empty when anonymous).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// SQL text.
    pub fn statement(&self) -> &str {
        &self.statement
    }

    pub(crate) fn statement_arc(&self) -> Arc<str> {
        Arc::clone(&self.statement)
    }

    /// Cache mode.
    pub fn cache(&self) -> CacheMode {
        self.cache
    }

    /// Server statement handle, if prepared.
    pub fn statement_id(&self) -> Option<u32> {
        self.statement_id
    }

    /// Number of parameter placeholders reported by the server.
    pub fn num_params(&self) -> u16 {
        self.num_params
    }

    /// Returns true if the query has a server binding.
    pub fn is_prepared(&self) -> bool {
        self.statement_id.is_some()
    }

    /// Returns true if the query is anonymous on the server.
    pub fn is_unnamed(&self) -> bool {
        self.name.is_empty()
    }

    /// Returns true if the query may be inserted into the statement cache.
    pub fn is_cacheable(&self) -> bool {
        !self.is_unnamed() && self.cache != CacheMode::None
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub(crate) fn bind(&mut self, statement_id: u32, num_params: u16) {
        self.statement_id = Some(statement_id);
        self.num_params = num_params;
    }

    pub(crate) fn unbind(&mut self) {
        self.statement_id = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_is_per_construction() {
        let a = Query::new("q", "SELECT 1");
        let b = Query::new("q", "SELECT 1");
        assert_ne!(a.id(), b.id());
        assert_eq!(a.clone().id(), a.id());
    }

    #[test]
    fn test_cacheable() {
        assert!(Query::new("q", "SELECT 1").is_cacheable());
        assert!(!Query::unnamed("SELECT 1").is_cacheable());
        assert!(!Query::new("q", "SELECT 1").with_cache(CacheMode::None).is_cacheable());
    }

    #[test]
    fn test_bind() {
        let mut query = Query::new("q", "SELECT ?");
        assert!(!query.is_prepared());
        query.bind(7, 1);
        assert_eq!(query.statement_id(), Some(7));
        assert_eq!(query.num_params(), 1);
        query.unbind();
        assert!(!query.is_prepared());
    }
}
