use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

// =============================================================================
// PAGINATION
// =============================================================================

/// Standard pagination parameters for all list operations.
#[derive(Debug, Clone, Deserialize)]
pub struct PaginationQuery {
    /// Page number (1-indexed, default: 1)
    #[serde(default = "default_page")]
    pub page: i64,

    /// Number of items per page (default: 10, max: 100)
    #[serde(default = "default_page_size")]
    pub page_size: i64,
}

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

impl Default for PaginationQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PaginationQuery {
    pub fn new(page: i64, page_size: i64) -> Self {
        Self { page, page_size }
    }

    /// Calculate SQL OFFSET from page number
    pub fn offset(&self) -> i64 {
        (self.page.max(1) - 1) * self.limit()
    }

    /// Get clamped page_size (respects MAX_PAGE_SIZE)
    pub fn limit(&self) -> i64 {
        self.page_size.clamp(1, MAX_PAGE_SIZE)
    }
}

/// Raw offset/limit window used by internal batch jobs, not clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub offset: i64,
    pub limit: i64,
}

impl From<&PaginationQuery> for Window {
    fn from(p: &PaginationQuery) -> Self {
        Self {
            offset: p.offset(),
            limit: p.limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, query: &PaginationQuery) -> Self {
        Self {
            items,
            total,
            page: query.page.max(1),
            page_size: query.limit(),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            page_size: self.page_size,
        }
    }
}

// =============================================================================
// VISIBILITY
// =============================================================================

/// Row visibility applied by list operations.
///
/// `All` performs no filtering at all and must only be used by trusted
/// internal callers (background sweeps, admin tooling). The transport layer
/// derives the caller's scope from their role before calling a service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryScope {
    All,
    /// Rows attached to tickets of these filiales
    Filiales(Vec<Uuid>),
    /// Rows owned by (or assigned to) this user
    User(Uuid),
}

impl QueryScope {
    pub fn allows_filiale(&self, filiale_id: Option<Uuid>) -> bool {
        match self {
            QueryScope::All => true,
            QueryScope::Filiales(ids) => filiale_id.is_some_and(|f| ids.contains(&f)),
            QueryScope::User(_) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_offset_and_clamp() {
        let q = PaginationQuery::new(3, 20);
        assert_eq!(q.offset(), 40);
        assert_eq!(q.limit(), 20);

        let q = PaginationQuery::new(0, 1000);
        assert_eq!(q.offset(), 0);
        assert_eq!(q.limit(), MAX_PAGE_SIZE);
    }

    #[test]
    fn test_scope_filiale_filter() {
        let f = Uuid::new_v4();
        let scope = QueryScope::Filiales(vec![f]);
        assert!(scope.allows_filiale(Some(f)));
        assert!(!scope.allows_filiale(Some(Uuid::new_v4())));
        assert!(!scope.allows_filiale(None));
        assert!(QueryScope::All.allows_filiale(None));
    }
}
