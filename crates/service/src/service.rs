//! List and retrieve over the reporting endpoints.

use crate::{
    context::RequestContext,
    error::ServiceError,
    filters::{self, Selection},
    pagination::{CursorRequest, PageRequest, page_number},
    params::{self, CURSOR, PAGE, QueryParams},
    present::{self, JsonObject},
    response::{ListResponse, PageBody},
};
use connectors::RowStore;
use model::{
    core::value::Value,
    pagination::{Ordering, PaginationError},
    records::row::RowData,
};
use planner::{
    QueryPlan,
    query::{dialect::Postgres, filter},
};
use serde::Serialize;
use service_config::{EndpointConfig, Endpoints, PageLimits, PaginationStyle, ServiceSettings};
use std::sync::Arc;
use tracing::debug;
use url::Url;

/// How one request pages through its rows.
#[derive(Debug, Clone, PartialEq)]
pub enum PageMode {
    Cursor {
        request: CursorRequest,
        page_size: u64,
    },
    PageNumber {
        page: PageRequest,
        page_size: u64,
    },
    Unpaginated,
}

/// A list request resolved against its endpoint but not yet executed.
#[derive(Debug, Clone)]
pub struct ListPlan<'a> {
    pub endpoint: &'a EndpointConfig,
    /// Source and filter; ordering and window are added per mode.
    pub base: QueryPlan,
    pub ordering: Ordering,
    pub mode: PageMode,
    /// URL the `next` and `previous` links are derived from.
    pub link_url: Url,
}

/// SQL a list request runs, rendered for Postgres.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Explain {
    pub endpoint: String,
    pub ordering: Vec<String>,
    pub sql: String,
    pub params: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count_sql: Option<String>,
}

#[derive(Clone)]
pub struct ReportService {
    store: Arc<dyn RowStore>,
    settings: Arc<ServiceSettings>,
    endpoints: Arc<Endpoints>,
}

impl ReportService {
    pub fn new(store: Arc<dyn RowStore>, settings: Arc<ServiceSettings>) -> Self {
        Self::with_endpoints(store, settings, Arc::new(Endpoints::standard()))
    }

    pub fn with_endpoints(
        store: Arc<dyn RowStore>,
        settings: Arc<ServiceSettings>,
        endpoints: Arc<Endpoints>,
    ) -> Self {
        ReportService {
            store,
            settings,
            endpoints,
        }
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn endpoint(&self, path: &str) -> Result<&EndpointConfig, ServiceError> {
        self.endpoints
            .get(path)
            .ok_or_else(|| ServiceError::UnknownEndpoint(path.to_string()))
    }

    /// Absolute URL of an endpoint's collection.
    pub fn endpoint_url(&self, endpoint: &EndpointConfig) -> Result<Url, ServiceError> {
        present::endpoint_url(&self.settings.base_url, endpoint.path).ok_or_else(|| {
            ServiceError::InvalidUrl(format!(
                "cannot join '{}' onto {}",
                endpoint.path, self.settings.base_url
            ))
        })
    }

    /// Resolves filters, ordering and pagination mode for a list request.
    pub fn prepare(&self, path: &str, ctx: &RequestContext) -> Result<ListPlan<'_>, ServiceError> {
        let endpoint = self.endpoint(path)?;
        let params = ctx.params();
        let Selection { source, filter } = filters::select(endpoint, params, &self.settings)?;
        let base = QueryPlan::new(source).with_filter(filter);

        let requested = match params {
            Some(params) if endpoint.ordering.accepts_requests() => params.order_tokens(),
            _ => Vec::new(),
        };
        let ordering = endpoint.ordering.resolve(&requested)?;

        let empty = QueryParams::default();
        let params = params.unwrap_or(&empty);
        let max = self.settings.max_page_size;

        let numbered = |limits: PageLimits| -> Result<PageMode, PaginationError> {
            Ok(PageMode::PageNumber {
                page: PageRequest::parse(params.get(PAGE))?,
                page_size: params::page_size(params, limits, max),
            })
        };

        let mode = match endpoint.pagination {
            // A page number wins over a cursor.
            PaginationStyle::Cursor { page_number: limits, .. } if params.contains(PAGE) => {
                numbered(limits)?
            }
            PaginationStyle::Cursor { cursor: limits, .. } => {
                let output = base.output_schema()?;
                let request = CursorRequest::read(
                    params.get(CURSOR),
                    &ordering,
                    &output,
                    self.settings.invalid_cursor,
                )?;
                PageMode::Cursor {
                    request,
                    page_size: params::page_size(params, limits, max),
                }
            }
            PaginationStyle::PageNumber(limits) => numbered(limits)?,
            PaginationStyle::Unpaginated => PageMode::Unpaginated,
        };

        let link_url = match ctx.url() {
            Some(url) => url.clone(),
            None => self.endpoint_url(endpoint)?,
        };

        Ok(ListPlan {
            endpoint,
            base,
            ordering,
            mode,
            link_url,
        })
    }

    pub async fn list(
        &self,
        path: &str,
        ctx: &RequestContext,
    ) -> Result<ListResponse, ServiceError> {
        let plan = self.prepare(path, ctx)?;
        let render_rows = |rows: &[RowData]| self.present_all(plan.endpoint, rows);

        let response = match &plan.mode {
            PageMode::Cursor { request, page_size } => {
                let page = request
                    .fetch(self.store.as_ref(), &plan.base, &plan.ordering, *page_size)
                    .await?;
                let (next, previous) =
                    request.links(&page, &plan.ordering, *page_size, &plan.link_url);

                ListResponse::Page(PageBody {
                    count: None,
                    next: next.map(String::from),
                    previous: previous.map(String::from),
                    results: render_rows(&page.items),
                })
            }
            PageMode::PageNumber { page, page_size } => {
                let count = self.store.count(&plan.base).await?;
                let number = page.resolve(count, *page_size)?;
                let rows = self
                    .store
                    .fetch(&page_number::plan(
                        &plan.base,
                        &plan.ordering,
                        number,
                        *page_size,
                    ))
                    .await?;
                let pages = page_number::num_pages(count, *page_size);
                let (next, previous) = page_number::links(number, pages, &plan.link_url);

                ListResponse::Page(PageBody {
                    count: Some(count),
                    next: next.map(String::from),
                    previous: previous.map(String::from),
                    results: render_rows(&rows),
                })
            }
            PageMode::Unpaginated => {
                let rows = self
                    .store
                    .fetch(&plan.base.clone().with_ordering(plan.ordering.clone()))
                    .await?;
                ListResponse::Rows(render_rows(&rows))
            }
        };

        debug!(
            endpoint = plan.endpoint.path,
            rows = response.results().len(),
            "Listed rows"
        );
        Ok(response)
    }

    /// One row by its lookup field, e.g. a counter by id.
    pub async fn retrieve(
        &self,
        path: &str,
        key: &str,
        ctx: &RequestContext,
    ) -> Result<JsonObject, ServiceError> {
        let endpoint = self.endpoint(path)?;
        let lookup = endpoint
            .lookup_field
            .ok_or_else(|| ServiceError::RetrieveUnsupported(endpoint.path.to_string()))?;
        let not_found = || ServiceError::NotFound {
            endpoint: endpoint.path.to_string(),
            key: key.to_string(),
        };

        let data_type = endpoint
            .schema
            .field(lookup)
            .map(|f| f.data_type)
            .ok_or_else(|| {
                PaginationError::Configuration(format!("lookup field '{lookup}' is not declared"))
            })?;
        let value = Value::parse_as(data_type, key.trim()).map_err(|_| not_found())?;
        if value.is_null() {
            return Err(not_found());
        }

        let Selection {
            source,
            filter: selected,
        } = filters::select(endpoint, ctx.params(), &self.settings)?;
        let filter = filter::all(
            selected
                .into_iter()
                .chain(Some(filter::eq(lookup, value)))
                .collect(),
        );
        let plan = QueryPlan::new(source)
            .with_filter(filter)
            .with_window(Some(1), 0);

        let row = self
            .store
            .fetch(&plan)
            .await?
            .into_iter()
            .next()
            .ok_or_else(not_found)?;
        Ok(present::present(
            &row,
            &endpoint.results,
            &self.settings.base_url,
        ))
    }

    /// Renders the SQL a list request would run without touching the store.
    pub fn explain(&self, path: &str, ctx: &RequestContext) -> Result<Explain, ServiceError> {
        let plan = self.prepare(path, ctx)?;

        let (page_plan, count_sql) = match &plan.mode {
            PageMode::Cursor { request, page_size } => {
                (request.plan(&plan.base, &plan.ordering, *page_size), None)
            }
            PageMode::PageNumber { page, page_size } => {
                let number = match page {
                    PageRequest::Number(n) => *n,
                    PageRequest::Last => {
                        return Err(PaginationError::InvalidPage(
                            "the last page depends on the row count".to_string(),
                        )
                        .into());
                    }
                };
                let (count_sql, _) = plan.base.render_count(&Postgres)?;
                (
                    page_number::plan(&plan.base, &plan.ordering, number, *page_size),
                    Some(count_sql),
                )
            }
            PageMode::Unpaginated => (plan.base.clone().with_ordering(plan.ordering.clone()), None),
        };

        let (sql, params) = page_plan.render(&Postgres)?;
        Ok(Explain {
            endpoint: plan.endpoint.path.to_string(),
            ordering: plan.ordering.tokens(),
            sql,
            params,
            count_sql,
        })
    }

    pub async fn ping(&self) -> Result<(), ServiceError> {
        self.store.ping().await.map_err(ServiceError::from)
    }

    fn present_all(&self, endpoint: &EndpointConfig, rows: &[RowData]) -> Vec<JsonObject> {
        rows.iter()
            .map(|row| present::present(row, &endpoint.results, &self.settings.base_url))
            .collect()
    }
}
