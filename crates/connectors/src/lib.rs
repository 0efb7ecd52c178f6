pub mod adapter;
pub mod error;
pub mod memory;
pub mod sql;

pub use adapter::RowStore;
pub use error::StoreError;
pub use memory::MemoryStore;
pub use sql::postgres::store::PgStore;
