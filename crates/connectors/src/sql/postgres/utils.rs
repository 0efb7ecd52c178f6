//! Opening a client, honouring `sslmode` from the connection URL.

use crate::error::StoreError;
use native_tls::TlsConnector;
use postgres_native_tls::MakeTlsConnector;
use tokio_postgres::{Client, Config, NoTls, config::SslMode};
use tracing::{debug, error, warn};

pub(crate) async fn connect_client(url: &str) -> Result<Client, StoreError> {
    let config = url
        .parse::<Config>()
        .map_err(|e| StoreError::InvalidUrl(e.to_string()))?;

    match config.get_ssl_mode() {
        SslMode::Disable => plain(&config).await,
        SslMode::Prefer => match tls(&config).await {
            Ok(client) => Ok(client),
            Err(error) => {
                warn!(%error, "TLS connection to Postgres failed, falling back to plain TCP");
                plain(&config).await
            }
        },
        _ => tls(&config).await,
    }
}

async fn tls(config: &Config) -> Result<Client, StoreError> {
    let connector = MakeTlsConnector::new(TlsConnector::builder().build()?);
    let (client, connection) = config.connect(connector).await?;
    drive(connection);
    debug!("Connected to Postgres over TLS");
    Ok(client)
}

async fn plain(config: &Config) -> Result<Client, StoreError> {
    let (client, connection) = config.connect(NoTls).await?;
    drive(connection);
    debug!("Connected to Postgres");
    Ok(client)
}

/// Polls the connection's socket IO on its own task.
fn drive<F>(connection: F)
where
    F: Future<Output = Result<(), tokio_postgres::Error>> + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(error) = connection.await {
            error!(%error, "Postgres connection closed with an error");
        }
    });
}
