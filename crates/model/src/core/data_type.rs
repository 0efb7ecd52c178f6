use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt};

/// Column types exposed by the reporting views.
///
/// The views only surface a handful of scalar kinds, so the API keeps the
/// type set small; every storage type is folded into one of these.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum DataType {
    Int,
    Float,
    String,
    Boolean,
    Date,
    Timestamp,
}

lazy_static! {
    static ref POSTGRES_TYPE_MAP: HashMap<&'static str, DataType> = build_postgres_type_map();
}

impl DataType {
    pub fn from_postgres_type(type_name: &str) -> Result<Self, String> {
        let normalized = type_name.trim().to_uppercase();
        POSTGRES_TYPE_MAP
            .get(normalized.as_str())
            .copied()
            .ok_or_else(|| format!("Unknown Postgres column type: {type_name}"))
    }

    /// Type used for explicitly typed placeholders, e.g. `$1::BIGINT`.
    pub fn postgres_name(&self) -> &'static str {
        match self {
            DataType::Int => "BIGINT",
            DataType::Float => "DOUBLE PRECISION",
            DataType::String => "TEXT",
            DataType::Boolean => "BOOLEAN",
            DataType::Date => "DATE",
            DataType::Timestamp => "TIMESTAMPTZ",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, DataType::Int | DataType::Float)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Int => "int",
            DataType::Float => "float",
            DataType::String => "string",
            DataType::Boolean => "boolean",
            DataType::Date => "date",
            DataType::Timestamp => "timestamp",
        };
        write!(f, "{name}")
    }
}

fn build_postgres_type_map() -> HashMap<&'static str, DataType> {
    use DataType::*;

    let entries = [
        ("BOOLEAN", Boolean),
        ("BOOL", Boolean),
        ("SMALLINT", Int),
        ("INT2", Int),
        ("INTEGER", Int),
        ("INT", Int),
        ("INT4", Int),
        ("INT8", Int),
        ("BIGINT", Int),
        ("FLOAT4", Float),
        ("REAL", Float),
        ("FLOAT8", Float),
        ("DOUBLE PRECISION", Float),
        ("TEXT", String),
        ("NAME", String),
        ("CHARACTER VARYING", String),
        ("VARCHAR", String),
        ("CHARACTER", String),
        ("CHAR", String),
        ("BPCHAR", String),
        ("DATE", Date),
        ("TIMESTAMP", Timestamp),
        ("TIMESTAMP WITHOUT TIME ZONE", Timestamp),
        ("TIMESTAMP WITH TIME ZONE", Timestamp),
        ("TIMESTAMPTZ", Timestamp),
    ];

    let mut map = HashMap::new();
    for (name, data_type) in entries {
        map.insert(name, data_type);
    }
    map
}
