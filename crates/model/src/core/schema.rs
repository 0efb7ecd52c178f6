use crate::core::data_type::DataType;
use serde::{Deserialize, Serialize};

/// A public field of a reporting view and the storage column behind it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    pub column: String,
    pub data_type: DataType,
    /// Selected as `column::text` (e.g. `ctid`), so the value reaches the
    /// API as an opaque string.
    pub text_cast: bool,
}

impl FieldSpec {
    pub fn new(name: &str, column: &str, data_type: DataType) -> Self {
        FieldSpec {
            name: name.to_string(),
            column: column.to_string(),
            data_type,
            text_cast: false,
        }
    }

    pub fn text(name: &str, column: &str) -> Self {
        FieldSpec {
            name: name.to_string(),
            column: column.to_string(),
            data_type: DataType::String,
            text_cast: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ViewSchema {
    pub schema: Option<String>,
    pub table: String,
    pub fields: Vec<FieldSpec>,
}

impl ViewSchema {
    pub fn new(table: &str, fields: Vec<FieldSpec>) -> Self {
        ViewSchema {
            schema: None,
            table: table.to_string(),
            fields,
        }
    }

    pub fn with_schema(mut self, schema: &str) -> Self {
        self.schema = Some(schema.to_string());
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn qualified_name(&self) -> String {
        match &self.schema {
            Some(schema) => format!("{schema}.{}", self.table),
            None => self.table.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_lookup_and_qualified_name() {
        let schema = ViewSchema::new(
            "vw_observations",
            vec![
                FieldSpec::text("id", "ctid"),
                FieldSpec::new("counter_id", "id", DataType::Int),
            ],
        )
        .with_schema("public");

        assert_eq!(schema.qualified_name(), "public.vw_observations");
        assert_eq!(schema.field("counter_id").unwrap().column, "id");
        assert!(schema.field("id").unwrap().text_cast);
        assert!(schema.field("geom").is_none());
    }
}
