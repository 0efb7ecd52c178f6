use crate::{
    adapter::RowStore,
    error::StoreError,
    sql::postgres::{params::PgParams, row::DbRow, utils::connect_client},
};
use async_trait::async_trait;
use model::records::row::RowData;
use planner::{QueryPlan, query::dialect};
use std::sync::Arc;
use tokio_postgres::Client;
use tracing::debug;

#[derive(Clone)]
pub struct PgStore {
    client: Arc<Client>,
    dialect: dialect::Postgres,
}

impl PgStore {
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client = Arc::new(connect_client(url).await?);
        Ok(PgStore {
            client,
            dialect: dialect::Postgres,
        })
    }
}

#[async_trait]
impl RowStore for PgStore {
    async fn fetch(&self, plan: &QueryPlan) -> Result<Vec<RowData>, StoreError> {
        let (sql, params) = plan.render(&self.dialect)?;
        let schema = plan.output_schema()?;

        let params = PgParams::new(params);
        let rows = self.client.query(&sql, &params.refs()).await?;
        debug!(rows = rows.len(), "Fetched rows from Postgres");

        rows.iter()
            .map(|row| DbRow(row).to_row_data(&schema))
            .collect()
    }

    async fn count(&self, plan: &QueryPlan) -> Result<u64, StoreError> {
        let (sql, params) = plan.render_count(&self.dialect)?;
        let params = PgParams::new(params);
        let row = self.client.query_one(&sql, &params.refs()).await?;
        let count: i64 = row.try_get(0)?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.client.simple_query("SELECT 1").await?;
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "postgres"
    }
}
