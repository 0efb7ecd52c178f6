/// Builds a `TableRef`, optionally schema-qualified.
#[macro_export]
macro_rules! table_ref {
    ($name:expr) => {
        $crate::query::ast::common::TableRef {
            schema: None,
            name: $name.to_string(),
        }
    };
    ($schema:expr, $name:expr) => {
        $crate::query::ast::common::TableRef {
            schema: $schema.map(|s: &str| s.to_string()),
            name: $name.to_string(),
        }
    };
}
