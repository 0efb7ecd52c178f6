use crate::error::StoreError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use model::{
    core::{
        data_type::DataType,
        schema::ViewSchema,
        value::{FieldValue, Value},
    },
    records::row::RowData,
};
use tokio_postgres::{Row as PgRow, types::FromSql};
use tracing::warn;

/// Reads a Postgres row using the declared field types of a view.
pub struct DbRow<'a>(pub &'a PgRow);

impl DbRow<'_> {
    pub fn to_row_data(&self, schema: &ViewSchema) -> Result<RowData, StoreError> {
        let field_values = schema
            .fields
            .iter()
            .map(|field| {
                let value = self.get_value(&field.name, field.data_type)?;
                Ok(FieldValue::new(&field.name, value))
            })
            .collect::<Result<Vec<_>, StoreError>>()?;

        Ok(RowData::new(&schema.table, field_values))
    }

    pub fn get_value(&self, name: &str, data_type: DataType) -> Result<Value, StoreError> {
        let column_type = self.column_type(name)?;
        let actual = DataType::from_postgres_type(&column_type).unwrap_or_else(|_| {
            warn!("Unknown column type: {column_type}");
            data_type
        });
        if actual != data_type {
            warn!(
                column = name,
                declared = %data_type,
                actual = %actual,
                "Column type differs from view declaration"
            );
        }

        let value = match actual {
            DataType::Int => match column_type.as_str() {
                "int2" => self.try_get::<i16>(name)?.map(|v| Value::Int(v.into())),
                "int4" => self.try_get::<i32>(name)?.map(|v| Value::Int(v.into())),
                _ => self.try_get::<i64>(name)?.map(Value::Int),
            },
            DataType::Float => match column_type.as_str() {
                "float4" => self.try_get::<f32>(name)?.map(|v| Value::Float(v.into())),
                _ => self.try_get::<f64>(name)?.map(Value::Float),
            },
            DataType::String => self.try_get::<String>(name)?.map(Value::String),
            DataType::Boolean => self.try_get::<bool>(name)?.map(Value::Boolean),
            DataType::Date => self.try_get::<NaiveDate>(name)?.map(Value::Date),
            DataType::Timestamp => match column_type.as_str() {
                "timestamp" => self
                    .try_get::<NaiveDateTime>(name)?
                    .map(|naive| Value::Timestamp(DateTime::from_naive_utc_and_offset(naive, Utc))),
                _ => self.try_get::<DateTime<Utc>>(name)?.map(Value::Timestamp),
            },
        };

        Ok(value.unwrap_or(Value::Null))
    }

    fn column_type(&self, name: &str) -> Result<String, StoreError> {
        self.0
            .columns()
            .iter()
            .find(|c| c.name() == name)
            .map(|c| c.type_().name().to_string())
            .ok_or_else(|| StoreError::Conversion(format!("column '{name}' missing from result")))
    }

    fn try_get<'r, T>(&'r self, name: &str) -> Result<Option<T>, StoreError>
    where
        T: FromSql<'r>,
    {
        self.0
            .try_get::<_, Option<T>>(name)
            .map_err(|e| StoreError::Conversion(format!("column '{name}': {e}")))
    }
}
