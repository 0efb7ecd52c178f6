//! The reporting API: filters, ordering and pagination over the views,
//! independent of any HTTP framework.

pub mod context;
pub mod error;
pub mod filters;
pub mod links;
pub mod pagination;
pub mod params;
pub mod present;
pub mod response;
pub mod service;

pub use context::RequestContext;
pub use error::ServiceError;
pub use params::QueryParams;
pub use response::{ListResponse, PageBody};
pub use service::{Explain, ReportService};
