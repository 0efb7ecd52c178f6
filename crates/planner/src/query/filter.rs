//! Small constructors for the filter expressions the endpoints use.
//!
//! Expressions name public view fields; the query plan maps them onto
//! storage columns.

use crate::query::{
    ast::expr::{BinaryOperator, Expr, FunctionCall},
    ident, value,
};
use model::core::value::Value;

pub fn compare(field: &str, op: BinaryOperator, val: Value) -> Expr {
    Expr::binary(ident(field), op, value(val))
}

pub fn eq(field: &str, val: Value) -> Expr {
    compare(field, BinaryOperator::Eq, val)
}

pub fn gte(field: &str, val: Value) -> Expr {
    compare(field, BinaryOperator::GtEq, val)
}

pub fn lt(field: &str, val: Value) -> Expr {
    compare(field, BinaryOperator::Lt, val)
}

/// Case-insensitive equality: `UPPER(field) = UPPER(value)`.
pub fn eq_ci(field: &str, text: &str) -> Expr {
    Expr::binary(
        upper(ident(field)),
        BinaryOperator::Eq,
        upper(value(Value::from(text))),
    )
}

pub fn in_list(field: &str, values: Vec<Value>) -> Expr {
    Expr::InList {
        expr: Box::new(ident(field)),
        list: values.into_iter().map(value).collect(),
        negated: false,
    }
}

/// Joins `exprs` with `AND`; `None` when there is nothing to join.
pub fn all(exprs: Vec<Expr>) -> Option<Expr> {
    exprs.into_iter().reduce(Expr::and)
}

/// Joins `exprs` with `OR`; `None` when there is nothing to join.
pub fn any(exprs: Vec<Expr>) -> Option<Expr> {
    exprs.into_iter().reduce(Expr::or)
}

fn upper(expr: Expr) -> Expr {
    Expr::FunctionCall(FunctionCall {
        name: "UPPER".to_string(),
        args: vec![expr],
        wildcard: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{dialect::Postgres, renderer::render_sql};

    #[test]
    fn test_eq_ci_renders_upper_on_both_sides() {
        let (sql, params) = render_sql(&eq_ci("source", "LAM"), &Postgres);
        assert_eq!(sql, r#"(UPPER("source") = UPPER($1::TEXT))"#);
        assert_eq!(params, vec![Value::from("LAM")]);
    }

    #[test]
    fn test_all_and_any() {
        assert!(all(vec![]).is_none());
        let single = eq("id", Value::Int(1));
        assert_eq!(all(vec![single.clone()]), Some(single.clone()));

        let (sql, _) = render_sql(
            &any(vec![single.clone(), eq("id", Value::Int(2))]).unwrap(),
            &Postgres,
        );
        assert_eq!(sql, r#"(("id" = $1::BIGINT) OR ("id" = $2::BIGINT))"#);
    }
}
