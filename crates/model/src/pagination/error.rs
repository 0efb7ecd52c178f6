use crate::pagination::cursor::CursorError;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PaginationError {
    #[error("pagination misconfigured: {0}")]
    Configuration(String),

    #[error("Invalid cursor: {0}")]
    InvalidCursor(#[from] CursorError),

    #[error("Invalid ordering field: {0}")]
    InvalidOrderingField(String),

    #[error("page size {requested} is outside 1..={max}")]
    PageSizeOutOfRange { requested: i64, max: u64 },

    #[error("Invalid page: {0}")]
    InvalidPage(String),
}
