//! Page-number mode: counted pages, skipped by offset.

use crate::{
    links::{remove_query_param, replace_query_param},
    params::{CURSOR, PAGE},
};
use model::pagination::{Ordering, PaginationError};
use planner::QueryPlan;
use url::Url;

const LAST_PAGE: &str = "last";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageRequest {
    Number(u64),
    Last,
}

impl PageRequest {
    /// Reads the `page` parameter; absent means the first page.
    pub fn parse(raw: Option<&str>) -> Result<Self, PaginationError> {
        let Some(raw) = raw else {
            return Ok(PageRequest::Number(1));
        };
        if raw == LAST_PAGE {
            return Ok(PageRequest::Last);
        }
        match raw.parse::<u64>() {
            Ok(0) => Err(PaginationError::InvalidPage(
                "That page number is less than 1".to_string(),
            )),
            Ok(n) => Ok(PageRequest::Number(n)),
            Err(_) => Err(PaginationError::InvalidPage(format!(
                "'{raw}' is not a page number"
            ))),
        }
    }

    /// The page number once the row count is known. Page 1 always exists,
    /// even when there are no rows.
    pub fn resolve(self, count: u64, page_size: u64) -> Result<u64, PaginationError> {
        let pages = num_pages(count, page_size);
        match self {
            PageRequest::Last => Ok(pages),
            PageRequest::Number(n) if n <= pages => Ok(n),
            PageRequest::Number(n) => Err(PaginationError::InvalidPage(format!(
                "Page {n} contains no results"
            ))),
        }
    }
}

pub fn num_pages(count: u64, page_size: u64) -> u64 {
    if page_size == 0 {
        return 1;
    }
    count.div_ceil(page_size).max(1)
}

/// The query for page `page` (1-based).
pub fn plan(base: &QueryPlan, ordering: &Ordering, page: u64, page_size: u64) -> QueryPlan {
    let offset = page.saturating_sub(1).saturating_mul(page_size);
    base.clone()
        .with_ordering(ordering.clone())
        .with_window(Some(page_size), offset)
}

/// Absolute `next` and `previous` links. Both drop any `cursor`
/// parameter; the link back to page 1 names the page explicitly.
pub fn links(page: u64, pages: u64, url: &Url) -> (Option<Url>, Option<Url>) {
    let link = |number: u64| {
        remove_query_param(
            &replace_query_param(url, PAGE, &number.to_string()),
            CURSOR,
        )
    };

    let next = (page < pages).then(|| link(page + 1));
    let previous = (page > 1).then(|| link(page - 1));
    (next, previous)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_page_parameter() {
        assert_eq!(PageRequest::parse(None), Ok(PageRequest::Number(1)));
        assert_eq!(PageRequest::parse(Some("3")), Ok(PageRequest::Number(3)));
        assert_eq!(PageRequest::parse(Some("last")), Ok(PageRequest::Last));
        assert!(PageRequest::parse(Some("0")).is_err());
        assert!(PageRequest::parse(Some("-1")).is_err());
        assert!(PageRequest::parse(Some("two")).is_err());
    }

    #[test]
    fn test_resolve_against_count() {
        assert_eq!(PageRequest::Number(1).resolve(0, 10), Ok(1));
        assert_eq!(PageRequest::Last.resolve(25, 10), Ok(3));
        assert_eq!(PageRequest::Number(3).resolve(25, 10), Ok(3));
        assert!(matches!(
            PageRequest::Number(4).resolve(25, 10),
            Err(PaginationError::InvalidPage(_))
        ));
    }

    #[test]
    fn test_links_strip_cursor_and_name_page_one() {
        let url =
            Url::parse("https://api.test/observations/?page=2&cursor=abc&page_size=10").unwrap();
        let (next, previous) = links(2, 3, &url);

        assert_eq!(
            next.unwrap().as_str(),
            "https://api.test/observations/?page=3&page_size=10"
        );
        assert_eq!(
            previous.unwrap().as_str(),
            "https://api.test/observations/?page=1&page_size=10"
        );
        assert_eq!(links(3, 3, &url).0, None);
        assert_eq!(links(1, 3, &url).1, None);
    }

    #[test]
    fn test_plan_window() {
        let base = QueryPlan::new(planner::Source::View(model::core::schema::ViewSchema::new(
            "vw_counters",
            vec![],
        )));
        let plan = plan(&base, &Ordering::from_tokens(&["id"]), 3, 100);
        assert_eq!(plan.limit, Some(100));
        assert_eq!(plan.offset, 200);
    }
}
