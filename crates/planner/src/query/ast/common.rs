//! Defines common, reusable AST nodes for building SQL queries.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub schema: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDir {
    Asc,
    Desc,
}

impl From<model::pagination::SortDirection> for OrderDir {
    fn from(direction: model::pagination::SortDirection) -> Self {
        match direction {
            model::pagination::SortDirection::Asc => OrderDir::Asc,
            model::pagination::SortDirection::Desc => OrderDir::Desc,
        }
    }
}
