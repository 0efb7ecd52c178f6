pub mod cursor;
pub mod error;
pub mod ordering;
pub mod page;

pub use cursor::{Cursor, CursorError, OFFSET_CUTOFF};
pub use error::PaginationError;
pub use ordering::{OrderField, Ordering, SortDirection};
pub use page::Page;
