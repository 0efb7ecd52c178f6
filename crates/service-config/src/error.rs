use model::pagination::PaginationError;
use planner::PlanError;
use thiserror::Error;

/// Errors raised while loading service settings or the endpoint table.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An env file could not be read or parsed.
    #[error("Env file error: {0}")]
    EnvFile(String),

    /// A setting holds a value that cannot be used.
    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    /// An endpoint declaration is inconsistent with its view.
    #[error("Endpoint '{endpoint}' is misconfigured: {source}")]
    Endpoint {
        endpoint: String,
        #[source]
        source: PaginationError,
    },

    /// An aggregate endpoint references fields its view does not have.
    #[error("Aggregate endpoint is misconfigured: {0}")]
    Aggregate(#[from] PlanError),
}

impl ConfigError {
    pub fn invalid(key: &str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}
