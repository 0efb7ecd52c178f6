pub mod aggregate;
pub mod error;
pub mod ordering;
pub mod plan;
pub mod query;

pub use error::PlanError;
pub use ordering::OrderingPolicy;
pub use plan::{QueryPlan, Source};
