use connectors::StoreError;
use model::pagination::CursorError;
use service::ServiceError;
use service_config::ConfigError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Failed to load the configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Service(#[from] ServiceError),

    #[error("Database error: {0}")]
    Store(#[from] StoreError),

    #[error("Invalid cursor: {0}")]
    Cursor(#[from] CursorError),

    #[error("Failed to write the output file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize data to JSON: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    #[error("DATABASE_URL is not set and no connection string was given")]
    MissingDatabaseUrl,
}

impl CliError {
    /// Process exit code: 2 for requests the service refused, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Service(err) if err.status_code() < 500 => 2,
            CliError::Cursor(_) => 2,
            _ => 1,
        }
    }
}
