//! Content backend client
//!
//! A thin client for a Prismic-style document API: query by type and
//! ordering, fetch by uid, follow opaque pagination cursors. The client is
//! constructed once and passed to whoever needs it; there is no ambient
//! global instance.

mod client;
mod pagination;

pub use client::{ApiError, Client, QueryOptions, QueryResponse};
pub use pagination::{LoadMore, PaginateError, Paginator};

/// Build an `at(path, "value")` predicate for the search endpoint
pub fn at(path: &str, value: &str) -> String {
    format!(r#"at({}, "{}")"#, path, value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_at_predicate() {
        assert_eq!(at("document.type", "post"), r#"at(document.type, "post")"#);
    }
}
