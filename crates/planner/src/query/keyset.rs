//! Keyset (seek) predicates for compound orderings.
//!
//! For an ordering `f0, f1, ..., fn` and a cursor position `v0, v1, ..., vn`
//! the predicate selects the rows strictly beyond the position:
//!
//! ```text
//! (f0 > v0)
//! OR (f0 = v0 AND f1 > v1)
//! OR ...
//! OR (f0 = v0 AND ... AND fn > vn)
//! ```
//!
//! The comparison for `fi` is `>` when the field is ascending and the page is
//! read forward (or descending and read backward), `<` otherwise.

use crate::query::{
    ast::expr::{BinaryOperator, Expr},
    filter, ident, value,
};
use model::{
    core::{schema::ViewSchema, value::Value},
    pagination::{CursorError, Ordering, PaginationError, SortDirection},
};

/// Builds the seek predicate for `position` under `ordering`.
///
/// Returns `Ok(None)` when there is no position (first page). Position
/// strings are read back with the field types of `schema`; a value that does
/// not parse is an invalid cursor.
pub fn build(
    ordering: &Ordering,
    position: Option<&[String]>,
    reverse: bool,
    schema: &ViewSchema,
) -> Result<Option<Expr>, PaginationError> {
    let Some(position) = position else {
        return Ok(None);
    };

    if position.len() != ordering.len() {
        return Err(CursorError::ArityMismatch {
            expected: ordering.len(),
            found: position.len(),
        }
        .into());
    }

    let keys = ordering
        .fields()
        .iter()
        .zip(position)
        .map(|(order, raw)| {
            let spec = schema.field(&order.field).ok_or_else(|| {
                PaginationError::Configuration(format!(
                    "ordering field '{}' is not part of {}",
                    order.field, schema.table
                ))
            })?;
            let parsed = Value::parse_as(spec.data_type, raw).map_err(|e| {
                CursorError::InvalidValue {
                    field: order.field.clone(),
                    reason: e.to_string(),
                }
            })?;
            Ok((order.field.as_str(), order.direction, parsed))
        })
        .collect::<Result<Vec<_>, PaginationError>>()?;

    let mut disjuncts = Vec::with_capacity(keys.len());
    for i in 0..keys.len() {
        let (field, direction, val) = &keys[i];
        let op = seek_operator(*direction, reverse);

        let Some(beyond) = beyond(field, op, val) else {
            continue;
        };

        let mut terms: Vec<Expr> = keys[..i]
            .iter()
            .map(|(field, _, val)| equal(field, val))
            .collect();
        terms.push(beyond);

        disjuncts.extend(filter::all(terms));
    }

    // Every key was NULL at the end of its range: nothing lies beyond.
    if disjuncts.is_empty() {
        return Ok(Some(Expr::Literal(Value::Boolean(false))));
    }

    Ok(filter::any(disjuncts))
}

/// `>` iff (ascending XOR reverse).
pub fn seek_operator(direction: SortDirection, reverse: bool) -> BinaryOperator {
    if (direction == SortDirection::Asc) != reverse {
        BinaryOperator::Gt
    } else {
        BinaryOperator::Lt
    }
}

fn equal(field: &str, val: &Value) -> Expr {
    if val.is_null() {
        Expr::IsNull {
            expr: Box::new(ident(field)),
            negated: false,
        }
    } else {
        Expr::binary(ident(field), BinaryOperator::Eq, value(val.clone()))
    }
}

// NULL sorts after every value, so nothing is greater than it and every
// non-null value is smaller.
fn beyond(field: &str, op: BinaryOperator, val: &Value) -> Option<Expr> {
    if val.is_null() {
        return match op {
            BinaryOperator::Gt => None,
            _ => Some(Expr::IsNull {
                expr: Box::new(ident(field)),
                negated: true,
            }),
        };
    }
    Some(Expr::binary(ident(field), op, value(val.clone())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{dialect::Postgres, renderer::render_sql};
    use chrono::{TimeZone, Utc};
    use model::core::{data_type::DataType, schema::FieldSpec};

    fn schema() -> ViewSchema {
        ViewSchema::new(
            "vw_observations",
            vec![
                FieldSpec::text("id", "ctid"),
                FieldSpec::new("counter_id", "id", DataType::Int),
                FieldSpec::new("datetime", "datetime", DataType::Timestamp),
            ],
        )
    }

    fn position(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_no_position_means_no_predicate() {
        let ordering = Ordering::from_tokens(&["-datetime", "id"]);
        assert_eq!(build(&ordering, None, false, &schema()), Ok(None));
    }

    #[test]
    fn test_seek_operator_table() {
        assert_eq!(seek_operator(SortDirection::Asc, false), BinaryOperator::Gt);
        assert_eq!(seek_operator(SortDirection::Asc, true), BinaryOperator::Lt);
        assert_eq!(seek_operator(SortDirection::Desc, false), BinaryOperator::Lt);
        assert_eq!(seek_operator(SortDirection::Desc, true), BinaryOperator::Gt);
    }

    #[test]
    fn test_compound_predicate_forward() {
        let ordering = Ordering::from_tokens(&["-datetime", "counter_id", "id"]);
        let pos = position(&["2024-01-01T00:00:00.000000Z", "7", "(0,3)"]);

        let expr = build(&ordering, Some(&pos), false, &schema())
            .unwrap()
            .unwrap();
        let (sql, params) = render_sql(&expr, &Postgres);

        assert_eq!(
            sql,
            concat!(
                r#"((("datetime" < $1::TIMESTAMPTZ) OR (("datetime" = $2::TIMESTAMPTZ) AND ("counter_id" > $3::BIGINT)))"#,
                r#" OR ((("datetime" = $4::TIMESTAMPTZ) AND ("counter_id" = $5::BIGINT)) AND ("id" > $6::TEXT)))"#
            )
        );
        let ts = Value::Timestamp(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(params[0], ts);
        assert_eq!(params[2], Value::Int(7));
        assert_eq!(params[5], Value::from("(0,3)"));
    }

    #[test]
    fn test_reverse_flips_every_operator() {
        let ordering = Ordering::from_tokens(&["-datetime", "id"]);
        let pos = position(&["2024-01-01T00:00:00Z", "(0,3)"]);

        let expr = build(&ordering, Some(&pos), true, &schema())
            .unwrap()
            .unwrap();
        let (sql, _) = render_sql(&expr, &Postgres);

        assert_eq!(
            sql,
            r#"(("datetime" > $1::TIMESTAMPTZ) OR (("datetime" = $2::TIMESTAMPTZ) AND ("id" < $3::TEXT)))"#
        );
    }

    #[test]
    fn test_unparsable_position_is_invalid_cursor() {
        let ordering = Ordering::from_tokens(&["counter_id", "id"]);
        let pos = position(&["seven", "(0,3)"]);

        let err = build(&ordering, Some(&pos), false, &schema()).unwrap_err();
        assert!(matches!(
            err,
            PaginationError::InvalidCursor(CursorError::InvalidValue { ref field, .. })
                if field == "counter_id"
        ));
    }

    #[test]
    fn test_arity_mismatch_is_invalid_cursor() {
        let ordering = Ordering::from_tokens(&["counter_id", "id"]);
        let pos = position(&["7"]);

        assert_eq!(
            build(&ordering, Some(&pos), false, &schema()),
            Err(PaginationError::InvalidCursor(CursorError::ArityMismatch {
                expected: 2,
                found: 1
            }))
        );
    }

    #[test]
    fn test_unknown_field_is_configuration_error() {
        let ordering = Ordering::from_tokens(&["vehicletype", "id"]);
        let pos = position(&["car", "(0,1)"]);

        assert!(matches!(
            build(&ordering, Some(&pos), false, &schema()),
            Err(PaginationError::Configuration(_))
        ));
    }
}
