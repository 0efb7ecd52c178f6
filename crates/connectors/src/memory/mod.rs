//! A [`RowStore`] over rows held in memory.
//!
//! It evaluates the same plans the Postgres store renders to SQL, which
//! makes it the store of choice for fixtures and tests.

pub mod aggregate;
pub mod eval;

use crate::{adapter::RowStore, error::StoreError};
use async_trait::async_trait;
use model::{pagination::Ordering, records::row::RowData};
use planner::{QueryPlan, Source};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Clone, Default)]
pub struct MemoryStore {
    views: Arc<RwLock<HashMap<String, Vec<RowData>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the rows of `view`.
    pub async fn insert_view(&self, view: &str, rows: Vec<RowData>) {
        self.views.write().await.insert(view.to_string(), rows);
    }

    pub async fn with_view(self, view: &str, rows: Vec<RowData>) -> Self {
        self.insert_view(view, rows).await;
        self
    }

    async fn source_rows(&self, plan: &QueryPlan) -> Result<Vec<RowData>, StoreError> {
        let views = self.views.read().await;
        let table = &plan.input_schema().table;
        let base = views
            .get(table)
            .ok_or_else(|| StoreError::UnknownView(table.clone()))?;

        match &plan.source {
            Source::View(_) => base
                .iter()
                .filter_map(|row| match eval::matches(plan.filter.as_ref(), row) {
                    Ok(true) => Some(Ok(row.clone())),
                    Ok(false) => None,
                    Err(e) => Some(Err(e)),
                })
                .collect(),
            Source::Aggregate(spec) => aggregate::aggregate(spec, base, plan.filter.as_ref()),
        }
    }
}

/// Sorts rows by `ordering`; NULL sorts last ascending and first descending.
pub fn sort_rows(rows: &mut [RowData], ordering: &Ordering) {
    rows.sort_by(|a, b| {
        ordering
            .fields()
            .iter()
            .map(|order| {
                let cmp = a
                    .get_value(&order.field)
                    .sort_cmp(&b.get_value(&order.field));
                if order.direction.is_desc() {
                    cmp.reverse()
                } else {
                    cmp
                }
            })
            .find(|cmp| cmp.is_ne())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

#[async_trait]
impl RowStore for MemoryStore {
    async fn fetch(&self, plan: &QueryPlan) -> Result<Vec<RowData>, StoreError> {
        // Validates field references the same way the SQL store would.
        plan.select()?;

        let mut rows = Vec::new();
        for row in self.source_rows(plan).await? {
            if eval::matches(plan.seek.as_ref(), &row)? {
                rows.push(row);
            }
        }
        sort_rows(&mut rows, &plan.ordering);

        let offset = usize::try_from(plan.offset).unwrap_or(usize::MAX);
        let limit = plan
            .limit
            .map(|l| usize::try_from(l).unwrap_or(usize::MAX))
            .unwrap_or(usize::MAX);
        let page: Vec<RowData> = rows.into_iter().skip(offset).take(limit).collect();

        debug!(rows = page.len(), "Fetched rows from memory");
        Ok(page)
    }

    async fn count(&self, plan: &QueryPlan) -> Result<u64, StoreError> {
        plan.count_select()?;
        Ok(self.source_rows(plan).await?.len() as u64)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "memory"
    }
}
