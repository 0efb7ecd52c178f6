pub mod params;
pub mod row;
pub mod store;
pub mod utils;
