//! Period bucketing and grouping for the in-memory store, matching what
//! `date_trunc` does in local time on the database side.

use crate::{error::StoreError, memory::eval};
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use model::{
    core::{data_type::DataType, value::Value},
    records::row::RowData,
};
use planner::{
    aggregate::{AGGREGATED_VALUE, AggregateFn, AggregateSpec, PERIOD, Period, START_TIME},
    query::ast::expr::Expr,
};
use std::collections::HashMap;

/// Start of the period containing `instant`, in local time of `tz`.
pub fn truncate(instant: DateTime<Utc>, period: Period, tz: Tz) -> DateTime<Utc> {
    let local = instant.with_timezone(&tz).naive_local();
    let date = local.date();

    let start: NaiveDateTime = match period {
        Period::Hour => date.and_hms_opt(local.hour(), 0, 0).unwrap_or(local),
        Period::Day => date.and_time(Default::default()),
        Period::Week => {
            let monday = date - Duration::days(date.weekday().num_days_from_monday() as i64);
            monday.and_time(Default::default())
        }
        Period::Month => first_of(date.year(), date.month()).and_time(Default::default()),
        Period::Year => first_of(date.year(), 1).and_time(Default::default()),
    };

    tz.from_local_datetime(&start)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&start))
}

fn first_of(year: i32, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN)
}

#[derive(Default)]
struct Accumulator {
    sum_int: i64,
    sum_float: f64,
    count: u64,
}

/// Groups the rows of `base` matching `filter` into aggregated output rows.
pub fn aggregate(
    spec: &AggregateSpec,
    base: &[RowData],
    filter: Option<&Expr>,
) -> Result<Vec<RowData>, StoreError> {
    let tz: Tz = spec
        .timezone
        .parse()
        .map_err(|_| StoreError::Unsupported(format!("timezone {}", spec.timezone)))?;
    let value_type = spec.value_type()?;

    let mut order: Vec<Vec<Value>> = Vec::new();
    let mut groups: HashMap<Vec<Value>, Accumulator> = HashMap::new();

    for row in base {
        if !eval::matches(filter, row)? {
            continue;
        }
        let Value::Timestamp(instant) = row.get_value(&spec.time_field) else {
            continue;
        };

        let mut key = vec![Value::Timestamp(truncate(instant, spec.period, tz))];
        key.extend(spec.group_fields.iter().map(|f| row.get_value(f)));

        let acc = groups.entry(key.clone()).or_insert_with(|| {
            order.push(key);
            Accumulator::default()
        });

        match row.get_value(&spec.value_field) {
            Value::Int(v) => {
                acc.sum_int = acc.sum_int.saturating_add(v);
                acc.sum_float += v as f64;
                acc.count += 1;
            }
            Value::Float(v) => {
                acc.sum_float += v;
                acc.count += 1;
            }
            _ => {}
        }
    }

    let rows = order
        .into_iter()
        .map(|key| {
            let acc = groups.remove(&key).unwrap_or_default();
            let aggregated = if acc.count == 0 {
                Value::Null
            } else {
                match (spec.function, value_type) {
                    (AggregateFn::Sum, DataType::Int) => Value::Int(acc.sum_int),
                    (AggregateFn::Sum, _) => Value::Float(acc.sum_float),
                    (AggregateFn::Avg, _) => Value::Float(acc.sum_float / acc.count as f64),
                }
            };

            let mut values = key.into_iter();
            let mut pairs = vec![(START_TIME.to_string(), values.next().unwrap_or(Value::Null))];
            pairs.extend(spec.group_fields.iter().cloned().zip(values));
            pairs.push((AGGREGATED_VALUE.to_string(), aggregated));
            pairs.push((PERIOD.to_string(), Value::from(spec.period.as_str())));
            RowData::from_pairs(&spec.base.table, pairs)
        })
        .collect();

    Ok(rows)
}
