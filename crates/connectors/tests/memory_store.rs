use chrono::{DateTime, Utc};
use connectors::{MemoryStore, RowStore, StoreError};
use model::{
    core::{
        data_type::DataType,
        schema::{FieldSpec, ViewSchema},
        value::Value,
    },
    pagination::Ordering,
    records::row::RowData,
};
use planner::{
    QueryPlan, Source,
    aggregate::{AggregateFn, AggregateSpec, Period},
    query::{filter, keyset},
};

fn schema() -> ViewSchema {
    ViewSchema::new(
        "vw_observations",
        vec![
            FieldSpec::text("id", "ctid"),
            FieldSpec::new("counter_id", "id", DataType::Int),
            FieldSpec::new("direction", "direction", DataType::String),
            FieldSpec::new("unit", "unit", DataType::String),
            FieldSpec::new("value", "value", DataType::Int),
            FieldSpec::new("datetime", "datetime", DataType::Timestamp),
        ],
    )
}

fn ts(s: &str) -> Value {
    Value::Timestamp(DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc))
}

fn observation(id: &str, counter: i64, value: i64, at: &str) -> RowData {
    RowData::from_pairs(
        "vw_observations",
        [
            ("id", Value::from(id)),
            ("counter_id", Value::Int(counter)),
            ("direction", Value::from("P")),
            ("unit", Value::from("kpl")),
            ("value", Value::Int(value)),
            ("datetime", ts(at)),
        ],
    )
}

async fn store() -> MemoryStore {
    MemoryStore::new()
        .with_view(
            "vw_observations",
            vec![
                observation("(0,1)", 1, 10, "2024-01-01T10:00:00Z"),
                observation("(0,2)", 1, 20, "2024-01-01T11:00:00Z"),
                observation("(0,3)", 2, 5, "2024-01-01T11:00:00Z"),
                observation("(0,4)", 1, 7, "2024-01-02T09:00:00Z"),
            ],
        )
        .await
}

fn ids(rows: &[RowData]) -> Vec<String> {
    rows.iter()
        .map(|r| r.get_value("id").to_position_string())
        .collect()
}

#[tokio::test]
async fn test_fetch_applies_filter_ordering_and_window() {
    let store = store().await;
    let plan = QueryPlan::new(Source::View(schema()))
        .with_filter(Some(filter::eq("counter_id", Value::Int(1))))
        .with_ordering(Ordering::from_tokens(&["-datetime", "id"]))
        .with_window(Some(2), 1);

    let rows = store.fetch(&plan).await.unwrap();
    assert_eq!(ids(&rows), vec!["(0,2)", "(0,1)"]);
    assert_eq!(store.count(&plan).await.unwrap(), 3);
}

#[tokio::test]
async fn test_fetch_applies_seek_predicate() {
    let store = store().await;
    let ordering = Ordering::from_tokens(&["-datetime", "id"]);
    let position = vec!["2024-01-01T11:00:00.000000Z".to_string(), "(0,2)".to_string()];
    let seek = keyset::build(&ordering, Some(&position), false, &schema()).unwrap();

    let plan = QueryPlan::new(Source::View(schema()))
        .with_seek(seek)
        .with_ordering(ordering);

    let rows = store.fetch(&plan).await.unwrap();
    assert_eq!(ids(&rows), vec!["(0,3)", "(0,1)"]);
}

#[tokio::test]
async fn test_aggregate_sums_per_day_and_counter() {
    let store = store().await;
    let spec = AggregateSpec {
        base: schema(),
        period: Period::Day,
        function: AggregateFn::Sum,
        timezone: "UTC".to_string(),
        time_field: "datetime".to_string(),
        value_field: "value".to_string(),
        group_fields: vec!["counter_id".into(), "direction".into(), "unit".into()],
    };
    let plan = QueryPlan::new(Source::Aggregate(spec))
        .with_filter(Some(filter::eq("counter_id", Value::Int(1))))
        .with_ordering(Ordering::from_tokens(&["-start_time", "counter_id"]));

    let rows = store.fetch(&plan).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get_value("start_time"), ts("2024-01-02T00:00:00Z"));
    assert_eq!(rows[0].get_value("aggregated_value"), Value::Int(7));
    assert_eq!(rows[1].get_value("aggregated_value"), Value::Int(30));
    assert_eq!(rows[1].get_value("period"), Value::from("day"));
    assert_eq!(store.count(&plan).await.unwrap(), 2);
}

#[tokio::test]
async fn test_unknown_view_is_an_error() {
    let store = MemoryStore::new();
    let plan = QueryPlan::new(Source::View(schema()));

    assert!(matches!(
        store.fetch(&plan).await,
        Err(StoreError::UnknownView(view)) if view == "vw_observations"
    ));
}
