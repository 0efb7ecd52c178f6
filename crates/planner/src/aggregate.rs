//! Time-bucketed aggregation over an observation view.

use crate::{
    error::PlanError,
    plan::column_expr,
    query::{
        ast::{
            expr::{Expr, FunctionCall},
            select::Select,
        },
        builder::select::SelectBuilder,
    },
    table_ref,
};
use model::core::{
    data_type::DataType,
    schema::{FieldSpec, ViewSchema},
    value::Value,
};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

pub const START_TIME: &str = "start_time";
pub const AGGREGATED_VALUE: &str = "aggregated_value";
pub const PERIOD: &str = "period";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Period {
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Hour => "hour",
            Period::Day => "day",
            Period::Week => "week",
            Period::Month => "month",
            Period::Year => "year",
        }
    }
}

impl FromStr for Period {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hour" => Ok(Period::Hour),
            "day" => Ok(Period::Day),
            "week" => Ok(Period::Week),
            "month" => Ok(Period::Month),
            "year" => Ok(Period::Year),
            other => Err(PlanError::UnsupportedPeriod(other.to_string())),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AggregateFn {
    Sum,
    Avg,
}

impl AggregateFn {
    /// Speeds are averaged; everything else (counts) is summed.
    pub fn for_measurement(measurement_type: &str) -> Self {
        if measurement_type.eq_ignore_ascii_case("speed") {
            AggregateFn::Avg
        } else {
            AggregateFn::Sum
        }
    }

    pub fn sql_name(&self) -> &'static str {
        match self {
            AggregateFn::Sum => "SUM",
            AggregateFn::Avg => "AVG",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateSpec {
    pub base: ViewSchema,
    pub period: Period,
    pub function: AggregateFn,
    /// Buckets are aligned to local time in this zone.
    pub timezone: String,
    pub time_field: String,
    pub value_field: String,
    pub group_fields: Vec<String>,
}

impl AggregateSpec {
    /// Fields of each aggregated row: bucket start, the group fields, the
    /// aggregated value and the period name.
    pub fn output_schema(&self) -> Result<ViewSchema, PlanError> {
        let mut fields = vec![FieldSpec::new(START_TIME, START_TIME, DataType::Timestamp)];
        for name in &self.group_fields {
            let spec = self.base_field(name)?;
            fields.push(FieldSpec::new(name, name, spec.data_type));
        }
        fields.push(FieldSpec::new(
            AGGREGATED_VALUE,
            AGGREGATED_VALUE,
            self.value_type()?,
        ));
        fields.push(FieldSpec::new(PERIOD, PERIOD, DataType::String));

        Ok(ViewSchema {
            schema: self.base.schema.clone(),
            table: self.base.table.clone(),
            fields,
        })
    }

    /// Sums of integers stay integers; averages are always floating point.
    pub fn value_type(&self) -> Result<DataType, PlanError> {
        let base = self.base_field(&self.value_field)?.data_type;
        Ok(match (self.function, base) {
            (AggregateFn::Sum, DataType::Int) => DataType::Int,
            _ => DataType::Float,
        })
    }

    /// The grouped query over the base view. `filter` is already mapped onto
    /// storage columns.
    pub fn grouped_select(&self, filter: Option<Expr>) -> Result<Select, PlanError> {
        let bucket = self.bucket_expr()?;

        let mut columns = vec![bucket.clone().alias(START_TIME)];
        let mut group_by = vec![bucket];
        for name in &self.group_fields {
            let column = column_expr(self.base_field(name)?);
            columns.push(column.clone().alias(name));
            group_by.push(column);
        }

        let value_column = column_expr(self.base_field(&self.value_field)?);
        let value_type = self.value_type()?;
        columns.push(
            Expr::FunctionCall(FunctionCall {
                name: self.function.sql_name().to_string(),
                args: vec![value_column],
                wildcard: false,
            })
            .cast(value_type.postgres_name())
            .alias(AGGREGATED_VALUE),
        );
        columns.push(Expr::Literal(Value::from(self.period.as_str())).alias(PERIOD));

        let mut builder = SelectBuilder::new()
            .select(columns)
            .from(
                table_ref!(self.base.schema.as_deref(), &self.base.table),
                None,
            )
            .where_opt(filter);
        for expr in group_by {
            builder = builder.group_by(expr);
        }
        Ok(builder.build())
    }

    // date_trunc in local time, converted back to an instant.
    fn bucket_expr(&self) -> Result<Expr, PlanError> {
        let time_column = column_expr(self.base_field(&self.time_field)?);
        let local = Expr::AtTimeZone {
            expr: Box::new(time_column),
            zone: self.timezone.clone(),
        };
        let truncated = Expr::FunctionCall(FunctionCall {
            name: "date_trunc".to_string(),
            args: vec![Expr::Literal(Value::from(self.period.as_str())), local],
            wildcard: false,
        });
        Ok(Expr::AtTimeZone {
            expr: Box::new(truncated),
            zone: self.timezone.clone(),
        })
    }

    fn base_field(&self, name: &str) -> Result<&FieldSpec, PlanError> {
        self.base.field(name).ok_or_else(|| PlanError::UnknownField {
            field: name.to_string(),
            view: self.base.table.clone(),
        })
    }
}
