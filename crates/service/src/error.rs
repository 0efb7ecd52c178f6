use connectors::StoreError;
use model::pagination::PaginationError;
use planner::PlanError;
use thiserror::Error;

/// Errors surfaced to the HTTP layer.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Pagination(#[from] PaginationError),

    #[error("Invalid value for '{param}': {reason}")]
    InvalidFilter { param: String, reason: String },

    #[error("Invalid request URL: {0}")]
    InvalidUrl(String),

    #[error("Unknown endpoint: {0}")]
    UnknownEndpoint(String),

    #[error("No {endpoint} entry for '{key}'")]
    NotFound { endpoint: String, key: String },

    #[error("Endpoint '{0}' does not support retrieve")]
    RetrieveUnsupported(String),

    #[error("Query plan error: {0}")]
    Plan(#[from] PlanError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl ServiceError {
    pub fn invalid_filter(param: &str, reason: impl Into<String>) -> Self {
        ServiceError::InvalidFilter {
            param: param.to_string(),
            reason: reason.into(),
        }
    }

    pub fn required(param: &str) -> Self {
        Self::invalid_filter(param, "This field is required.")
    }

    /// HTTP status class the error maps onto.
    pub fn status_code(&self) -> u16 {
        match self {
            ServiceError::Pagination(err) => match err {
                PaginationError::Configuration(_) => 500,
                PaginationError::InvalidPage(_) => 404,
                PaginationError::InvalidCursor(_)
                | PaginationError::InvalidOrderingField(_)
                | PaginationError::PageSizeOutOfRange { .. } => 400,
            },
            ServiceError::InvalidFilter { .. } | ServiceError::InvalidUrl(_) => 400,
            ServiceError::UnknownEndpoint(_) | ServiceError::NotFound { .. } => 404,
            ServiceError::RetrieveUnsupported(_) => 405,
            ServiceError::Plan(_) | ServiceError::Store(_) => 500,
        }
    }
}
