//! Defines the `Dialect` trait for database-specific SQL syntax.

use model::core::data_type::DataType;

pub trait Dialect: Send + Sync {
    /// Wraps an identifier (like a table or column name) in the correct
    /// quotation marks for the dialect.
    fn quote_identifier(&self, ident: &str) -> String;

    /// Returns the placeholder for a parameterized query.
    fn get_placeholder(&self, index: usize) -> String;

    /// Placeholder carrying an explicit type, so the server never has to
    /// infer a parameter type from context.
    fn get_typed_placeholder(&self, index: usize, data_type: Option<DataType>) -> String {
        let _ = data_type;
        self.get_placeholder(index)
    }

    /// Renders a generic `DataType` into a database-specific SQL type string.
    fn render_data_type(&self, data_type: &DataType) -> String;

    /// Returns the name of the dialect (e.g., "PostgreSQL").
    fn name(&self) -> String;
}

#[derive(Debug, Clone)]
pub struct Postgres;

impl Dialect for Postgres {
    fn quote_identifier(&self, ident: &str) -> String {
        format!(r#""{}""#, ident.replace('"', "\"\""))
    }

    fn get_placeholder(&self, index: usize) -> String {
        // PostgreSQL uses $1, $2, etc.
        format!("${}", index + 1)
    }

    fn get_typed_placeholder(&self, index: usize, data_type: Option<DataType>) -> String {
        match data_type {
            Some(data_type) => format!(
                "{}::{}",
                self.get_placeholder(index),
                self.render_data_type(&data_type)
            ),
            None => self.get_placeholder(index),
        }
    }

    fn render_data_type(&self, data_type: &DataType) -> String {
        data_type.postgres_name().to_string()
    }

    fn name(&self) -> String {
        "PostgreSQL".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_postgres_placeholders() {
        let dialect = Postgres;
        assert_eq!(dialect.get_placeholder(0), "$1");
        assert_eq!(
            dialect.get_typed_placeholder(2, Some(DataType::Timestamp)),
            "$3::TIMESTAMPTZ"
        );
        assert_eq!(dialect.get_typed_placeholder(0, None), "$1");
        assert_eq!(dialect.quote_identifier(r#"we"ird"#), r#""we""ird""#);
    }
}
