use model::core::value::Value;
use tokio_postgres::types::ToSql;

type Param = Box<dyn ToSql + Sync + Send>;

/// The bound parameters of one query.
pub struct PgParams(Vec<Param>);

impl PgParams {
    pub fn new(values: Vec<Value>) -> Self {
        PgParams(values.into_iter().map(boxed).collect())
    }

    pub fn refs(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.0
            .iter()
            .map(|param| &**param as &(dyn ToSql + Sync))
            .collect()
    }
}

// Each Rust type matches the cast on the placeholder the renderer emits
// for the value (`BIGINT`, `DOUBLE PRECISION`, `TEXT`, ...).
fn boxed(value: Value) -> Param {
    match value {
        Value::Int(v) => Box::new(v),
        Value::Float(v) => Box::new(v),
        Value::String(v) => Box::new(v),
        Value::Boolean(v) => Box::new(v),
        Value::Date(v) => Box::new(v),
        Value::Timestamp(v) => Box::new(v),
        Value::Null => Box::new(None::<String>),
    }
}
