pub mod assembler;
pub mod cursor;
pub mod page_number;

pub use assembler::{assemble, next_cursor, position_of, previous_cursor};
pub use cursor::CursorRequest;
pub use page_number::PageRequest;
