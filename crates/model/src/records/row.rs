use crate::core::value::{FieldValue, Value};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RowData {
    pub entity: String,
    pub field_values: Vec<FieldValue>,
}

impl RowData {
    pub fn new(entity: &str, field_values: Vec<FieldValue>) -> Self {
        RowData {
            entity: entity.to_string(),
            field_values,
        }
    }

    pub fn from_pairs<I, S>(entity: &str, pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, Value)>,
        S: AsRef<str>,
    {
        let field_values = pairs
            .into_iter()
            .map(|(name, value)| FieldValue::new(name.as_ref(), value))
            .collect();
        RowData::new(entity, field_values)
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.field_values
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(field))
    }

    pub fn get_value(&self, field: &str) -> Value {
        self.get(field)
            .and_then(|f| f.value.clone())
            .unwrap_or(Value::Null)
    }

    pub fn set(&mut self, field: &str, value: Value) {
        match self
            .field_values
            .iter_mut()
            .find(|f| f.name.eq_ignore_ascii_case(field))
        {
            Some(existing) => *existing = FieldValue::new(field, value),
            None => self.field_values.push(FieldValue::new(field, value)),
        }
    }

    /// JSON object in field order, as rendered in a response's `results`.
    pub fn to_json_object(&self) -> serde_json::Map<String, serde_json::Value> {
        self.field_values
            .iter()
            .map(|f| {
                let value = f
                    .value
                    .as_ref()
                    .map(Value::to_json)
                    .unwrap_or(serde_json::Value::Null);
                (f.name.clone(), value)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_value_defaults_to_null() {
        let row = RowData::from_pairs(
            "vw_counters",
            [("id", Value::Int(7)), ("name", Value::String("A".into()))],
        );

        assert_eq!(row.get_value("ID"), Value::Int(7));
        assert_eq!(row.get_value("missing"), Value::Null);
    }

    #[test]
    fn test_json_object_keeps_nulls() {
        let mut row = RowData::from_pairs("vw_counters", [("id", Value::Int(1))]);
        row.set("source", Value::Null);
        let json = row.to_json_object();

        assert_eq!(json["id"], serde_json::json!(1));
        assert_eq!(json["source"], serde_json::Value::Null);
    }
}
