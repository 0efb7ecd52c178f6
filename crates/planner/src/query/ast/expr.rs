//! Defines the AST for SQL expressions.
//!
//! Filter and keyset expressions are written against a view's public field
//! names; the query plan maps identifiers to storage columns before
//! rendering.

use model::core::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A column or table identifier, e.g., `observations` or `o.datetime`.
    Identifier(Ident),

    /// A bound value, rendered as a typed placeholder.
    Value(Value),

    /// A constant rendered inline as a SQL literal. Only used for values the
    /// service controls (truncation units, timezone names), so that grouped
    /// expressions render identically in SELECT and GROUP BY.
    Literal(Value),

    /// A binary operation, e.g., `column = 'value'` or `a AND b`.
    BinaryOp(Box<BinaryOp>),

    /// A function call, e.g., `COUNT(*)` or `UPPER(source)`.
    FunctionCall(FunctionCall),

    /// An aliased expression, e.g. `SUM(value) AS aggregated_value`
    Alias { expr: Box<Expr>, alias: String },

    /// `CAST(expr AS type)`
    Cast { expr: Box<Expr>, data_type: String },

    /// `expr [NOT] IN (a, b, ...)`
    InList {
        expr: Box<Expr>,
        list: Vec<Expr>,
        negated: bool,
    },

    /// `expr IS [NOT] NULL`
    IsNull { expr: Box<Expr>, negated: bool },

    /// `expr AT TIME ZONE 'zone'`
    AtTimeZone { expr: Box<Expr>, zone: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub qualifier: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryOp {
    pub left: Expr,
    pub op: BinaryOperator,
    pub right: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    pub args: Vec<Expr>,
    pub wildcard: bool, // represents the '*' in 'COUNT(*)'
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    // Comparison
    Eq,    // =
    NotEq, // <>
    Lt,    // <
    LtEq,  // <=
    Gt,    // >
    GtEq,  // >=

    // Logical
    And,
    Or,
}

impl BinaryOperator {
    pub fn is_comparison(&self) -> bool {
        !matches!(self, BinaryOperator::And | BinaryOperator::Or)
    }
}

impl Expr {
    pub fn binary(left: Expr, op: BinaryOperator, right: Expr) -> Expr {
        Expr::BinaryOp(Box::new(BinaryOp { left, op, right }))
    }

    pub fn and(self, other: Expr) -> Expr {
        Expr::binary(self, BinaryOperator::And, other)
    }

    pub fn or(self, other: Expr) -> Expr {
        Expr::binary(self, BinaryOperator::Or, other)
    }

    pub fn alias(self, alias: &str) -> Expr {
        Expr::Alias {
            expr: Box::new(self),
            alias: alias.to_string(),
        }
    }

    pub fn cast(self, data_type: &str) -> Expr {
        Expr::Cast {
            expr: Box::new(self),
            data_type: data_type.to_string(),
        }
    }

    /// Rewrites every identifier with `f`, leaving the rest of the tree as is.
    pub fn try_map_identifiers<E, F>(self, f: &mut F) -> Result<Expr, E>
    where
        F: FnMut(Ident) -> Result<Expr, E>,
    {
        Ok(match self {
            Expr::Identifier(ident) => f(ident)?,
            Expr::Value(_) | Expr::Literal(_) => self,
            Expr::BinaryOp(op) => {
                let BinaryOp { left, op, right } = *op;
                Expr::binary(
                    left.try_map_identifiers(f)?,
                    op,
                    right.try_map_identifiers(f)?,
                )
            }
            Expr::FunctionCall(call) => Expr::FunctionCall(FunctionCall {
                name: call.name,
                args: call
                    .args
                    .into_iter()
                    .map(|arg| arg.try_map_identifiers(f))
                    .collect::<Result<_, _>>()?,
                wildcard: call.wildcard,
            }),
            Expr::Alias { expr, alias } => Expr::Alias {
                expr: Box::new(expr.try_map_identifiers(f)?),
                alias,
            },
            Expr::Cast { expr, data_type } => Expr::Cast {
                expr: Box::new(expr.try_map_identifiers(f)?),
                data_type,
            },
            Expr::InList {
                expr,
                list,
                negated,
            } => Expr::InList {
                expr: Box::new(expr.try_map_identifiers(f)?),
                list: list
                    .into_iter()
                    .map(|item| item.try_map_identifiers(f))
                    .collect::<Result<_, _>>()?,
                negated,
            },
            Expr::IsNull { expr, negated } => Expr::IsNull {
                expr: Box::new(expr.try_map_identifiers(f)?),
                negated,
            },
            Expr::AtTimeZone { expr, zone } => Expr::AtTimeZone {
                expr: Box::new(expr.try_map_identifiers(f)?),
                zone,
            },
        })
    }
}
