pub mod endpoints;
pub mod env;
pub mod error;
pub mod settings;

pub use endpoints::{EndpointConfig, EndpointKind, Endpoints, PageLimits, PaginationStyle};
pub use env::EnvManager;
pub use error::ConfigError;
pub use settings::{InvalidCursorPolicy, ServiceSettings};
