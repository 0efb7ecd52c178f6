use crate::error::CliError;
use connectors::{PgStore, RowStore};
use tracing::{error, info};

/// Connects to Postgres and runs a trivial query.
pub async fn ping(conn_str: &str, redacted: &str) -> Result<PgStore, CliError> {
    info!("Pinging Postgres at '{}'", redacted);

    let store = PgStore::connect(conn_str).await.map_err(|e| {
        error!("Postgres connection to '{}' failed: {}", redacted, e);
        CliError::Store(e)
    })?;

    store.ping().await.map_err(|e| {
        error!("Postgres ping query on '{}' failed: {}", redacted, e);
        CliError::Store(e)
    })?;

    info!("Postgres ping to '{}' succeeded", redacted);
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use connectors::StoreError;

    #[tokio::test]
    async fn test_ping_rejects_unparsable_url() {
        let result = ping("not a url", "not a url").await;
        assert!(matches!(
            result,
            Err(CliError::Store(StoreError::InvalidUrl(_)))
        ));
    }
}
