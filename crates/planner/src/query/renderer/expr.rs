use crate::query::{
    ast::expr::{BinaryOp, BinaryOperator, Expr, FunctionCall, Ident},
    renderer::{Render, Renderer},
};

impl Render for Expr {
    fn render(&self, r: &mut Renderer) {
        match self {
            Expr::Identifier(ident) => ident.render(r),
            Expr::Value(val) => r.add_param(val.clone()),
            // Display yields an escaped SQL literal.
            Expr::Literal(val) => r.sql.push_str(&val.to_string()),
            Expr::BinaryOp(op) => op.render(r),
            Expr::FunctionCall(func) => func.render(r),
            Expr::Alias { expr, alias } => {
                expr.render(r);
                r.sql.push_str(" AS ");
                r.sql.push_str(&r.dialect.quote_identifier(alias));
            }
            Expr::Cast { expr, data_type } => {
                r.sql.push_str("CAST(");
                expr.render(r);
                r.sql.push_str(" AS ");
                r.sql.push_str(data_type);
                r.sql.push(')');
            }
            Expr::InList {
                expr,
                list,
                negated,
            } => {
                expr.render(r);
                r.sql
                    .push_str(if *negated { " NOT IN (" } else { " IN (" });
                for (i, item) in list.iter().enumerate() {
                    if i > 0 {
                        r.sql.push_str(", ");
                    }
                    item.render(r);
                }
                r.sql.push(')');
            }
            Expr::IsNull { expr, negated } => {
                expr.render(r);
                r.sql
                    .push_str(if *negated { " IS NOT NULL" } else { " IS NULL" });
            }
            Expr::AtTimeZone { expr, zone } => {
                r.sql.push('(');
                expr.render(r);
                r.sql.push_str(" AT TIME ZONE ");
                r.sql.push_str(&format!("'{}'", zone.replace('\'', "''")));
                r.sql.push(')');
            }
        }
    }
}

impl Render for Ident {
    fn render(&self, r: &mut Renderer) {
        if let Some(qualifier) = &self.qualifier {
            r.sql.push_str(&r.dialect.quote_identifier(qualifier));
            r.sql.push('.');
        }
        r.sql.push_str(&r.dialect.quote_identifier(&self.name));
    }
}

impl Render for BinaryOp {
    fn render(&self, r: &mut Renderer) {
        r.sql.push('(');
        self.left.render(r);

        let op_str = match self.op {
            BinaryOperator::Eq => " = ",
            BinaryOperator::NotEq => " <> ",
            BinaryOperator::Lt => " < ",
            BinaryOperator::LtEq => " <= ",
            BinaryOperator::Gt => " > ",
            BinaryOperator::GtEq => " >= ",
            BinaryOperator::And => " AND ",
            BinaryOperator::Or => " OR ",
        };
        r.sql.push_str(op_str);

        self.right.render(r);
        r.sql.push(')');
    }
}

impl Render for FunctionCall {
    fn render(&self, r: &mut Renderer) {
        r.sql.push_str(&self.name);
        r.sql.push('(');
        if self.wildcard {
            r.sql.push('*');
        } else {
            for (i, arg) in self.args.iter().enumerate() {
                if i > 0 {
                    r.sql.push_str(", ");
                }
                arg.render(r);
            }
        }
        r.sql.push(')');
    }
}

#[cfg(test)]
mod tests {
    use crate::query::{
        ast::expr::Expr,
        dialect::Postgres,
        ident,
        renderer::render_sql,
        value,
    };
    use model::core::value::Value;

    #[test]
    fn test_in_list_uses_one_placeholder_per_item() {
        let expr = Expr::InList {
            expr: Box::new(ident("counter_id")),
            list: vec![value(Value::Int(1)), value(Value::Int(2))],
            negated: false,
        };

        let (sql, params) = render_sql(&expr, &Postgres);
        assert_eq!(sql, r#""counter_id" IN ($1::BIGINT, $2::BIGINT)"#);
        assert_eq!(params, vec![Value::Int(1), Value::Int(2)]);
    }

    #[test]
    fn test_literals_are_inlined_and_escaped() {
        let expr = Expr::AtTimeZone {
            expr: Box::new(ident("datetime")),
            zone: "Europe/Helsinki".into(),
        };
        let (sql, params) = render_sql(&expr, &Postgres);
        assert_eq!(sql, r#"("datetime" AT TIME ZONE 'Europe/Helsinki')"#);
        assert!(params.is_empty());

        let (sql, _) = render_sql(&Expr::Literal(Value::from("o'clock")), &Postgres);
        assert_eq!(sql, "'o''clock'");
    }
}
