//! Evaluates filter and seek expressions against in-memory rows with SQL
//! three-valued logic: a comparison involving NULL is NULL, and only rows
//! whose predicate is TRUE match.

use crate::error::StoreError;
use model::{
    core::{data_type::DataType, value::Value},
    records::row::RowData,
};
use planner::query::ast::expr::{BinaryOp, BinaryOperator, Expr, FunctionCall};
use std::cmp::Ordering;

pub fn matches(expr: Option<&Expr>, row: &RowData) -> Result<bool, StoreError> {
    match expr {
        Some(expr) => Ok(eval(expr, row)? == Value::Boolean(true)),
        None => Ok(true),
    }
}

pub fn eval(expr: &Expr, row: &RowData) -> Result<Value, StoreError> {
    match expr {
        Expr::Identifier(ident) => Ok(row.get_value(&ident.name)),
        Expr::Value(v) | Expr::Literal(v) => Ok(v.clone()),
        Expr::BinaryOp(op) => eval_binary(op, row),
        Expr::FunctionCall(call) => eval_call(call, row),
        Expr::Alias { expr, .. } => eval(expr, row),
        Expr::Cast { expr, data_type } => {
            let value = eval(expr, row)?;
            if value.is_null() {
                return Ok(Value::Null);
            }
            let target = DataType::from_postgres_type(data_type).map_err(StoreError::Unsupported)?;
            Value::parse_as(target, &value.to_position_string())
                .map_err(|e| StoreError::Conversion(e.to_string()))
        }
        Expr::InList { expr, list, negated } => {
            let value = eval(expr, row)?;
            if value.is_null() {
                return Ok(Value::Null);
            }
            let mut found = false;
            for item in list {
                if value.equal(&eval(item, row)?) {
                    found = true;
                    break;
                }
            }
            Ok(Value::Boolean(found != *negated))
        }
        Expr::IsNull { expr, negated } => {
            let is_null = eval(expr, row)?.is_null();
            Ok(Value::Boolean(is_null != *negated))
        }
        Expr::AtTimeZone { .. } => Err(StoreError::Unsupported(
            "AT TIME ZONE outside of aggregation".to_string(),
        )),
    }
}

fn eval_binary(op: &BinaryOp, row: &RowData) -> Result<Value, StoreError> {
    let left = eval(&op.left, row)?;
    let right = eval(&op.right, row)?;

    match op.op {
        BinaryOperator::And => Ok(and(&left, &right)),
        BinaryOperator::Or => Ok(or(&left, &right)),
        cmp => Ok(match left.compare(&right) {
            Some(ordering) => Value::Boolean(holds(cmp, ordering)),
            None => Value::Null,
        }),
    }
}

fn holds(op: BinaryOperator, ordering: Ordering) -> bool {
    match op {
        BinaryOperator::Eq => ordering == Ordering::Equal,
        BinaryOperator::NotEq => ordering != Ordering::Equal,
        BinaryOperator::Lt => ordering == Ordering::Less,
        BinaryOperator::LtEq => ordering != Ordering::Greater,
        BinaryOperator::Gt => ordering == Ordering::Greater,
        BinaryOperator::GtEq => ordering != Ordering::Less,
        BinaryOperator::And | BinaryOperator::Or => false,
    }
}

fn and(left: &Value, right: &Value) -> Value {
    match (left, right) {
        (Value::Boolean(false), _) | (_, Value::Boolean(false)) => Value::Boolean(false),
        (Value::Boolean(true), Value::Boolean(true)) => Value::Boolean(true),
        _ => Value::Null,
    }
}

fn or(left: &Value, right: &Value) -> Value {
    match (left, right) {
        (Value::Boolean(true), _) | (_, Value::Boolean(true)) => Value::Boolean(true),
        (Value::Boolean(false), Value::Boolean(false)) => Value::Boolean(false),
        _ => Value::Null,
    }
}

fn eval_call(call: &FunctionCall, row: &RowData) -> Result<Value, StoreError> {
    let args = call
        .args
        .iter()
        .map(|arg| eval(arg, row))
        .collect::<Result<Vec<_>, _>>()?;

    match (call.name.to_ascii_uppercase().as_str(), args.as_slice()) {
        ("UPPER", [Value::String(s)]) => Ok(Value::String(s.to_uppercase())),
        ("LOWER", [Value::String(s)]) => Ok(Value::String(s.to_lowercase())),
        ("UPPER" | "LOWER", [Value::Null]) => Ok(Value::Null),
        (name, _) => Err(StoreError::Unsupported(format!("function {name}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use planner::query::{filter, ident};

    fn row() -> RowData {
        RowData::from_pairs(
            "vw_counters",
            [
                ("id", Value::Int(5)),
                ("source", Value::from("Lam")),
                ("name", Value::Null),
            ],
        )
    }

    #[test]
    fn test_case_insensitive_equality() {
        assert!(matches(Some(&filter::eq_ci("source", "LAM")), &row()).unwrap());
        assert!(!matches(Some(&filter::eq_ci("source", "other")), &row()).unwrap());
    }

    #[test]
    fn test_null_comparisons_never_match() {
        let expr = filter::eq("name", Value::from("x"));
        assert_eq!(eval(&expr, &row()).unwrap(), Value::Null);

        let either = expr.or(filter::eq("id", Value::Int(5)));
        assert!(matches(Some(&either), &row()).unwrap());
    }

    #[test]
    fn test_in_list_and_cast() {
        let expr = filter::in_list("id", vec![Value::Int(1), Value::Int(5)]);
        assert!(matches(Some(&expr), &row()).unwrap());

        let cast = ident("id").cast("TEXT");
        assert_eq!(eval(&cast, &row()).unwrap(), Value::from("5"));
    }

    #[test]
    fn test_unsupported_function_is_an_error() {
        let expr = Expr::FunctionCall(FunctionCall {
            name: "md5".into(),
            args: vec![ident("source")],
            wildcard: false,
        });
        assert!(matches!(
            eval(&expr, &row()),
            Err(StoreError::Unsupported(_))
        ));
    }
}
