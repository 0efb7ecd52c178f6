use crate::error::StoreError;
use async_trait::async_trait;
use model::records::row::RowData;
use planner::QueryPlan;

/// Read access to the reporting views.
///
/// Implementations execute a [`QueryPlan`] as one ordered range scan and
/// must honour its filter, seek predicate, ordering, limit and offset
/// exactly; the page assembler relies on the order of the returned rows.
#[async_trait]
pub trait RowStore: Send + Sync {
    async fn fetch(&self, plan: &QueryPlan) -> Result<Vec<RowData>, StoreError>;

    /// Number of rows matching the plan's filter; seek and window are ignored.
    async fn count(&self, plan: &QueryPlan) -> Result<u64, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;

    fn kind(&self) -> &'static str;
}
