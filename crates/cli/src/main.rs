use crate::error::CliError;
use clap::Parser;
use commands::Commands;
use connectors::{MemoryStore, RowStore};
use model::pagination::Cursor;
use serde_json::json;
use service::{ReportService, RequestContext, ServiceError};
use service_config::{EnvManager, Endpoints, ServiceSettings};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod commands;
mod conn;
mod error;
mod output;

#[derive(Parser)]
#[command(
    name = "sensorapi",
    version = "0.1.0",
    about = "Traffic sensor reporting API"
)]
struct Cli {
    #[arg(long, global = true, help = "Env file to load instead of ./.env")]
    env_file: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    // Logs go to stderr so JSON on stdout stays clean
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        error!("{err}");
        std::process::exit(err.exit_code());
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let settings = load_settings(cli.env_file.as_deref())?;
    Endpoints::global().validate()?;

    match cli.command {
        Commands::List {
            endpoint,
            query,
            output,
        } => {
            let service = connect(settings).await?;
            let ctx = request_context(&service, &endpoint, query.as_deref())?;
            let response = service.list(&endpoint, &ctx).await?;
            info!(
                endpoint = %endpoint,
                rows = response.results().len(),
                "Listed {}",
                endpoint
            );
            output::write_json(&response, output.as_deref()).await?;
        }
        Commands::Retrieve {
            endpoint,
            key,
            query,
        } => {
            let service = connect(settings).await?;
            let ctx = request_context(&service, &endpoint, query.as_deref())?;
            let row = service.retrieve(&endpoint, &key, &ctx).await?;
            output::write_json(&row, None).await?;
        }
        Commands::Explain { endpoint, query } => {
            // Rendering SQL never touches the store.
            let service = ReportService::new(Arc::new(MemoryStore::new()), Arc::new(settings));
            let ctx = match query.as_deref() {
                Some(query) => request_context(&service, &endpoint, Some(query))?,
                None => RequestContext::Documentation,
            };
            let explain = service.explain(&endpoint, &ctx)?;
            output::write_json(&explain, None).await?;
        }
        Commands::DecodeCursor {
            token,
            endpoint,
            order,
        } => {
            let decoded = decode_cursor(&token, endpoint.as_deref(), order.as_deref())?;
            output::write_json(&decoded, None).await?;
        }
        Commands::TestConn { conn_str } => {
            let mut settings = settings;
            if conn_str.is_some() {
                settings.database_url = conn_str;
            }
            let url = settings
                .database_url
                .as_deref()
                .ok_or(CliError::MissingDatabaseUrl)?;
            let redacted = settings.redacted_database_url().unwrap_or_default();
            let store = conn::ping(url, &redacted).await?;
            info!("Store kind: {}", store.kind());
        }
    }

    Ok(())
}

fn load_settings(env_file: Option<&str>) -> Result<ServiceSettings, CliError> {
    let mut env = EnvManager::from_process();
    match env_file {
        Some(path) => env.load_from_file(path)?,
        None => {
            if env.load_optional(".env")? {
                info!("Loaded settings from .env");
            }
        }
    }
    Ok(ServiceSettings::from_env(&env)?)
}

async fn connect(settings: ServiceSettings) -> Result<ReportService, CliError> {
    let url = settings
        .database_url
        .clone()
        .ok_or(CliError::MissingDatabaseUrl)?;
    let redacted = settings.redacted_database_url().unwrap_or_default();
    let store = conn::ping(&url, &redacted).await?;
    Ok(ReportService::new(Arc::new(store), Arc::new(settings)))
}

/// A live request for `endpoint`. `query` is either a query string or a
/// full request URL.
fn request_context(
    service: &ReportService,
    endpoint: &str,
    query: Option<&str>,
) -> Result<RequestContext, CliError> {
    if let Some(url) = query.filter(|q| q.starts_with("http://") || q.starts_with("https://")) {
        return Ok(RequestContext::from_url(url)?);
    }

    let mut url = service.endpoint_url(service.endpoint(endpoint)?)?;
    let query = query.map(|q| q.trim_start_matches('?')).filter(|q| !q.is_empty());
    url.set_query(query);
    Ok(RequestContext::live(url))
}

fn decode_cursor(
    token: &str,
    endpoint: Option<&str>,
    order: Option<&str>,
) -> Result<serde_json::Value, CliError> {
    let Some(path) = endpoint else {
        let cursor = Cursor::decode(token)?;
        return Ok(json!({
            "offset": cursor.offset,
            "reverse": cursor.reverse,
            "position": cursor.position,
        }));
    };

    let endpoint = Endpoints::global()
        .get(path)
        .ok_or_else(|| ServiceError::UnknownEndpoint(path.to_string()))?;
    let requested: Vec<&str> = order
        .map(|o| o.split(',').map(str::trim).filter(|t| !t.is_empty()).collect())
        .unwrap_or_default();
    let ordering = endpoint
        .ordering
        .resolve(&requested)
        .map_err(ServiceError::from)?;
    let cursor = Cursor::decode_bound(token, &ordering)?;

    let position = cursor.position.map(|values| {
        ordering
            .tokens()
            .into_iter()
            .zip(values)
            .map(|(field, value)| (field, serde_json::Value::String(value)))
            .collect::<serde_json::Map<_, _>>()
    });
    Ok(json!({
        "endpoint": endpoint.path,
        "ordering": ordering.tokens(),
        "offset": cursor.offset,
        "reverse": cursor.reverse,
        "position": position,
    }))
}
