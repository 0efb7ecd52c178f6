use model::pagination::PaginationError;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PlanError {
    #[error(transparent)]
    Pagination(#[from] PaginationError),

    #[error("Unknown field '{field}' for {view}")]
    UnknownField { field: String, view: String },

    #[error("Unsupported aggregation period: {0}")]
    UnsupportedPeriod(String),
}
