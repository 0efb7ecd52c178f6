use planner::PlanError;
use thiserror::Error;

/// Errors raised while fetching rows from a store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The connection URL could not be parsed.
    #[error("Invalid connection URL: {0}")]
    InvalidUrl(String),

    /// TLS setup failed before connecting.
    #[error("TLS error: {0}")]
    Tls(#[from] native_tls::Error),

    /// Any Postgres driver error.
    #[error("Postgres error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    /// The query plan could not be turned into a query.
    #[error("Query plan error: {0}")]
    Plan(#[from] PlanError),

    /// The store holds no rows for the requested view.
    #[error("Unknown view: {0}")]
    UnknownView(String),

    /// An expression the store cannot evaluate.
    #[error("Unsupported expression: {0}")]
    Unsupported(String),

    /// A returned row did not match the view's declared types.
    #[error("Row conversion error: {0}")]
    Conversion(String),
}
