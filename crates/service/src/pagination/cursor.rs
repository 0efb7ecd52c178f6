//! Keyset cursor mode.

use crate::{
    error::ServiceError,
    links::{remove_query_param, replace_query_param},
    pagination::assembler::{assemble, next_cursor, previous_cursor},
    params::{CURSOR, PAGE},
};
use connectors::RowStore;
use model::{
    core::schema::ViewSchema,
    pagination::{Cursor, Ordering, Page, PaginationError},
    records::row::RowData,
};
use planner::{QueryPlan, query::ast::expr::Expr, query::keyset};
use service_config::InvalidCursorPolicy;
use tracing::warn;
use url::Url;

/// A decoded cursor and the seek predicate it stands for.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CursorRequest {
    pub cursor: Cursor,
    pub seek: Option<Expr>,
}

impl CursorRequest {
    /// Decodes `token` against `ordering`.
    ///
    /// No token means the first page. A token that does not decode, was
    /// issued for another ordering, or holds values that do not fit
    /// `schema` is handled per `policy`.
    pub fn read(
        token: Option<&str>,
        ordering: &Ordering,
        schema: &ViewSchema,
        policy: InvalidCursorPolicy,
    ) -> Result<Self, PaginationError> {
        let Some(token) = token else {
            return Ok(CursorRequest::default());
        };

        let decoded = Cursor::decode_bound(token, ordering)
            .map_err(PaginationError::from)
            .and_then(|cursor| {
                let seek = keyset::build(
                    ordering,
                    cursor.position.as_deref(),
                    cursor.reverse,
                    schema,
                )?;
                Ok(CursorRequest { cursor, seek })
            });

        match decoded {
            Err(PaginationError::InvalidCursor(err))
                if policy == InvalidCursorPolicy::FirstPage =>
            {
                warn!(error = %err, "Ignoring invalid cursor, serving the first page");
                Ok(CursorRequest::default())
            }
            other => other,
        }
    }

    /// The query for this page: seek, ordering (reversed when travelling
    /// backward) and a window of one row more than the page.
    pub fn plan(&self, base: &QueryPlan, ordering: &Ordering, page_size: u64) -> QueryPlan {
        let query_ordering = if self.cursor.reverse {
            ordering.reversed()
        } else {
            ordering.clone()
        };

        base.clone()
            .with_seek(self.seek.clone())
            .with_ordering(query_ordering)
            .with_window(Some(page_size.saturating_add(1)), self.cursor.offset)
    }

    pub async fn fetch(
        &self,
        store: &dyn RowStore,
        base: &QueryPlan,
        ordering: &Ordering,
        page_size: u64,
    ) -> Result<Page<RowData>, ServiceError> {
        let rows = store.fetch(&self.plan(base, ordering, page_size)).await?;
        let page_size = usize::try_from(page_size).unwrap_or(usize::MAX);
        Ok(assemble(rows, page_size, &self.cursor, ordering))
    }

    /// Absolute `next` and `previous` links for `page`.
    pub fn links(
        &self,
        page: &Page<RowData>,
        ordering: &Ordering,
        page_size: u64,
        url: &Url,
    ) -> (Option<Url>, Option<Url>) {
        let link = |cursor: Cursor| {
            let token = cursor.encode_bound(ordering);
            remove_query_param(&replace_query_param(url, CURSOR, &token), PAGE)
        };

        let next = next_cursor(page, ordering, &self.cursor, page_size).map(link);
        let previous = previous_cursor(page, ordering, &self.cursor, page_size).map(link);
        (next, previous)
    }
}
