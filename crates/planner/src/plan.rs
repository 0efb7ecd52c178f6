//! Query plans: what a store has to fetch for one page.

use crate::{
    aggregate::AggregateSpec,
    error::PlanError,
    query::{
        ast::{
            expr::{Expr, FunctionCall, Ident},
            select::Select,
        },
        builder::select::{FromState, SelectBuilder},
        dialect::Dialect,
        ident,
        renderer::render_sql,
        value,
    },
    table_ref,
};
use model::{
    core::{
        schema::{FieldSpec, ViewSchema},
        value::Value,
    },
    pagination::Ordering,
};
use std::borrow::Cow;
use tracing::debug;

const GROUPS_ALIAS: &str = "groups";

#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    View(ViewSchema),
    Aggregate(AggregateSpec),
}

/// Everything a store needs to produce one window of rows.
///
/// `filter` is written against the source's input fields (the view, or the
/// view being aggregated). `seek` and `ordering` are written against the
/// output fields.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    pub source: Source,
    pub filter: Option<Expr>,
    pub seek: Option<Expr>,
    pub ordering: Ordering,
    pub limit: Option<u64>,
    pub offset: u64,
}

impl QueryPlan {
    pub fn new(source: Source) -> Self {
        QueryPlan {
            source,
            filter: None,
            seek: None,
            ordering: Ordering::default(),
            limit: None,
            offset: 0,
        }
    }

    pub fn with_filter(mut self, filter: Option<Expr>) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_seek(mut self, seek: Option<Expr>) -> Self {
        self.seek = seek;
        self
    }

    pub fn with_ordering(mut self, ordering: Ordering) -> Self {
        self.ordering = ordering;
        self
    }

    pub fn with_window(mut self, limit: Option<u64>, offset: u64) -> Self {
        self.limit = limit;
        self.offset = offset;
        self
    }

    pub fn output_schema(&self) -> Result<Cow<'_, ViewSchema>, PlanError> {
        match &self.source {
            Source::View(schema) => Ok(Cow::Borrowed(schema)),
            Source::Aggregate(spec) => spec.output_schema().map(Cow::Owned),
        }
    }

    /// Fields the `filter` expression may reference.
    pub fn input_schema(&self) -> &ViewSchema {
        match &self.source {
            Source::View(schema) => schema,
            Source::Aggregate(spec) => &spec.base,
        }
    }

    /// The SELECT producing the requested window.
    pub fn select(&self) -> Result<Select, PlanError> {
        let (builder, output) = match &self.source {
            Source::View(schema) => {
                let columns = schema.fields.iter().map(select_column).collect();
                let builder = SelectBuilder::new()
                    .select(columns)
                    .from(table_ref!(schema.schema.as_deref(), &schema.table), None)
                    .where_opt(map_columns(self.filter.clone(), schema)?)
                    .where_opt(map_columns(self.seek.clone(), schema)?);
                (builder, Cow::Borrowed(schema))
            }
            Source::Aggregate(spec) => {
                let output = spec.output_schema()?;
                let inner = spec.grouped_select(map_columns(self.filter.clone(), &spec.base)?)?;
                let columns = output.fields.iter().map(|f| ident(&f.name)).collect();
                let builder = SelectBuilder::new()
                    .select(columns)
                    .from_subquery(inner, GROUPS_ALIAS)
                    .where_opt(check_fields(self.seek.clone(), &output)?);
                (builder, Cow::Owned(output))
            }
        };

        let builder = self.apply_ordering(builder, &output)?;
        Ok(self.apply_window(builder).build())
    }

    /// SELECT COUNT(*) over the filtered source, ignoring seek and window.
    pub fn count_select(&self) -> Result<Select, PlanError> {
        let count = Expr::FunctionCall(FunctionCall {
            name: "COUNT".to_string(),
            args: vec![],
            wildcard: true,
        });

        let select = match &self.source {
            Source::View(schema) => SelectBuilder::new()
                .select(vec![count])
                .from(table_ref!(schema.schema.as_deref(), &schema.table), None)
                .where_opt(map_columns(self.filter.clone(), schema)?)
                .build(),
            Source::Aggregate(spec) => {
                let inner = spec.grouped_select(map_columns(self.filter.clone(), &spec.base)?)?;
                SelectBuilder::new()
                    .select(vec![count])
                    .from_subquery(inner, GROUPS_ALIAS)
                    .build()
            }
        };
        Ok(select)
    }

    pub fn render(&self, dialect: &dyn Dialect) -> Result<(String, Vec<Value>), PlanError> {
        let (sql, params) = render_sql(&self.select()?, dialect);
        debug!(sql = %sql, params = params.len(), "Rendered page query");
        Ok((sql, params))
    }

    pub fn render_count(&self, dialect: &dyn Dialect) -> Result<(String, Vec<Value>), PlanError> {
        let (sql, params) = render_sql(&self.count_select()?, dialect);
        debug!(sql = %sql, params = params.len(), "Rendered count query");
        Ok((sql, params))
    }

    fn apply_ordering(
        &self,
        mut builder: SelectBuilder<FromState>,
        output: &ViewSchema,
    ) -> Result<SelectBuilder<FromState>, PlanError> {
        let is_view = matches!(self.source, Source::View(_));
        for order in self.ordering.fields() {
            let field = output
                .field(&order.field)
                .ok_or_else(|| unknown(&order.field, output))?;
            let expr = if is_view {
                column_expr(field)
            } else {
                ident(&field.name)
            };
            builder = builder.order_by(expr, Some(order.direction.into()));
        }
        Ok(builder)
    }

    fn apply_window(&self, mut builder: SelectBuilder<FromState>) -> SelectBuilder<FromState> {
        if let Some(limit) = self.limit {
            builder = builder.limit(value(Value::Int(clamp_i64(limit))));
        }
        if self.offset > 0 {
            builder = builder.offset(value(Value::Int(clamp_i64(self.offset))));
        }
        builder
    }
}

/// The storage expression behind a public field.
pub fn column_expr(field: &FieldSpec) -> Expr {
    let column = ident(&field.column);
    if field.text_cast {
        column.cast("TEXT")
    } else {
        column
    }
}

fn select_column(field: &FieldSpec) -> Expr {
    if field.text_cast || field.column != field.name {
        column_expr(field).alias(&field.name)
    } else {
        column_expr(field)
    }
}

/// Maps public field identifiers in `expr` onto storage columns.
pub fn map_columns(expr: Option<Expr>, schema: &ViewSchema) -> Result<Option<Expr>, PlanError> {
    expr.map(|expr| {
        expr.try_map_identifiers(&mut |Ident { name, .. }: Ident| {
            schema
                .field(&name)
                .map(column_expr)
                .ok_or_else(|| unknown(&name, schema))
        })
    })
    .transpose()
}

fn check_fields(expr: Option<Expr>, schema: &ViewSchema) -> Result<Option<Expr>, PlanError> {
    expr.map(|expr| {
        expr.try_map_identifiers(&mut |ident: Ident| {
            if schema.field(&ident.name).is_some() {
                Ok(Expr::Identifier(ident))
            } else {
                Err(unknown(&ident.name, schema))
            }
        })
    })
    .transpose()
}

fn unknown(field: &str, schema: &ViewSchema) -> PlanError {
    PlanError::UnknownField {
        field: field.to_string(),
        view: schema.table.clone(),
    }
}

fn clamp_i64(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        aggregate::{AggregateFn, Period},
        query::{dialect::Postgres, filter, keyset},
    };
    use model::core::data_type::DataType;

    fn observations() -> ViewSchema {
        ViewSchema::new(
            "vw_observations",
            vec![
                FieldSpec::text("id", "ctid"),
                FieldSpec::new("counter_id", "id", DataType::Int),
                FieldSpec::new("value", "value", DataType::Int),
                FieldSpec::new("unit", "unit", DataType::String),
                FieldSpec::new("direction", "direction", DataType::String),
                FieldSpec::new("datetime", "datetime", DataType::Timestamp),
                FieldSpec::new("source", "source", DataType::String),
            ],
        )
        .with_schema("lido")
    }

    #[test]
    fn test_view_plan_maps_fields_to_columns() {
        let schema = observations();
        let ordering = Ordering::from_tokens(&["-datetime", "id"]);
        let position = vec!["2024-01-01T00:00:00Z".to_string(), "(0,1)".to_string()];
        let seek = keyset::build(&ordering, Some(&position), false, &schema).unwrap();

        let plan = QueryPlan::new(Source::View(schema))
            .with_filter(filter::all(vec![filter::in_list(
                "counter_id",
                vec![Value::Int(1), Value::Int(2)],
            )]))
            .with_seek(seek)
            .with_ordering(ordering)
            .with_window(Some(11), 0);

        let (sql, params) = plan.render(&Postgres).unwrap();
        assert_eq!(
            sql,
            concat!(
                r#"SELECT CAST("ctid" AS TEXT) AS "id", "id" AS "counter_id", "value", "unit", "direction", "datetime", "source" FROM "lido"."vw_observations""#,
                r#" WHERE ("id" IN ($1::BIGINT, $2::BIGINT) AND (("datetime" < $3::TIMESTAMPTZ) OR (("datetime" = $4::TIMESTAMPTZ) AND (CAST("ctid" AS TEXT) > $5::TEXT))))"#,
                r#" ORDER BY "datetime" DESC, CAST("ctid" AS TEXT) ASC LIMIT $6::BIGINT"#
            )
        );
        assert_eq!(params.len(), 6);
        assert_eq!(params[5], Value::Int(11));
    }

    #[test]
    fn test_unknown_filter_field_is_rejected() {
        let plan = QueryPlan::new(Source::View(observations()))
            .with_filter(Some(filter::eq("geom", Value::Null)));

        assert_eq!(
            plan.select(),
            Err(PlanError::UnknownField {
                field: "geom".to_string(),
                view: "vw_observations".to_string()
            })
        );
    }

    #[test]
    fn test_count_ignores_seek_and_window() {
        let plan = QueryPlan::new(Source::View(observations()))
            .with_filter(Some(filter::eq_ci("source", "lam")))
            .with_seek(Some(filter::eq("id", Value::from("(0,1)"))))
            .with_window(Some(10), 20);

        let (sql, params) = plan.render_count(&Postgres).unwrap();
        assert_eq!(
            sql,
            r#"SELECT COUNT(*) FROM "lido"."vw_observations" WHERE (UPPER("source") = UPPER($1::TEXT))"#
        );
        assert_eq!(params, vec![Value::from("lam")]);
    }

    #[test]
    fn test_aggregate_plan_orders_outer_query() {
        let spec = AggregateSpec {
            base: observations(),
            period: Period::Month,
            function: AggregateFn::Sum,
            timezone: "UTC".to_string(),
            time_field: "datetime".to_string(),
            value_field: "value".to_string(),
            group_fields: vec!["counter_id".into(), "direction".into(), "unit".into()],
        };
        let plan = QueryPlan::new(Source::Aggregate(spec))
            .with_filter(Some(filter::eq("counter_id", Value::Int(4))))
            .with_ordering(Ordering::from_tokens(&["-start_time", "counter_id"]))
            .with_window(Some(5), 10);

        let (sql, params) = plan.render(&Postgres).unwrap();
        assert!(sql.starts_with(
            r#"SELECT "start_time", "counter_id", "direction", "unit", "aggregated_value", "period" FROM (SELECT "#
        ));
        assert!(
            sql.contains(r#"FROM "lido"."vw_observations" WHERE ("id" = $1::BIGINT) GROUP BY"#)
        );
        assert!(sql.contains(r#"CAST(SUM("value") AS BIGINT) AS "aggregated_value""#));
        assert!(sql.ends_with(
            r#") AS "groups" ORDER BY "start_time" DESC, "counter_id" ASC LIMIT $2::BIGINT OFFSET $3::BIGINT"#
        ));
        assert_eq!(params, vec![Value::Int(4), Value::Int(5), Value::Int(10)]);
    }
}
