use crate::{error::ServiceError, params::QueryParams};
use url::Url;

/// Who is asking for a query.
///
/// Live requests carry their URL and parameters. Documentation callers
/// (schema generation, `explain` without parameters) get the endpoint's
/// base query: no filters, the default ordering and the first page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestContext {
    Live { url: Url, params: QueryParams },
    Documentation,
}

impl RequestContext {
    pub fn live(url: Url) -> Self {
        let params = QueryParams::from_url(&url);
        RequestContext::Live { url, params }
    }

    /// Parses an absolute request URL.
    pub fn from_url(raw: &str) -> Result<Self, ServiceError> {
        let url = Url::parse(raw).map_err(|e| ServiceError::InvalidUrl(format!("{raw}: {e}")))?;
        Ok(Self::live(url))
    }

    pub fn params(&self) -> Option<&QueryParams> {
        match self {
            RequestContext::Live { params, .. } => Some(params),
            RequestContext::Documentation => None,
        }
    }

    pub fn url(&self) -> Option<&Url> {
        match self {
            RequestContext::Live { url, .. } => Some(url),
            RequestContext::Documentation => None,
        }
    }

    pub fn is_documentation(&self) -> bool {
        matches!(self, RequestContext::Documentation)
    }
}
