use crate::query::{
    ast::{
        common::OrderDir,
        select::{FromClause, FromSource, OrderByExpr, Select},
    },
    renderer::{Render, Renderer},
};

impl Render for Select {
    fn render(&self, r: &mut Renderer) {
        // 1. SELECT clause
        r.sql.push_str("SELECT ");
        for (i, col) in self.columns.iter().enumerate() {
            if i > 0 {
                r.sql.push_str(", ");
            }
            col.render(r);
        }

        // 2. FROM
        if let Some(from) = &self.from {
            r.sql.push(' ');
            from.render(r);
        }

        // 3. WHERE
        if let Some(where_clause) = &self.where_clause {
            r.sql.push_str(" WHERE ");
            where_clause.render(r);
        }

        // 4. GROUP BY
        if !self.group_by.is_empty() {
            r.sql.push_str(" GROUP BY ");
            for (i, expr) in self.group_by.iter().enumerate() {
                if i > 0 {
                    r.sql.push_str(", ");
                }
                expr.render(r);
            }
        }

        // 5. ORDER BY
        if !self.order_by.is_empty() {
            r.sql.push_str(" ORDER BY ");
            for (i, order) in self.order_by.iter().enumerate() {
                if i > 0 {
                    r.sql.push_str(", ");
                }
                order.render(r);
            }
        }

        // 6. LIMIT
        if let Some(limit) = &self.limit {
            r.sql.push_str(" LIMIT ");
            limit.render(r);
        }

        // 7. OFFSET
        if let Some(offset) = &self.offset {
            r.sql.push_str(" OFFSET ");
            offset.render(r);
        }
    }
}

impl Render for FromClause {
    fn render(&self, r: &mut Renderer) {
        r.sql.push_str("FROM ");
        match &self.source {
            FromSource::Table(table) => {
                if let Some(schema) = &table.schema {
                    r.sql.push_str(&r.dialect.quote_identifier(schema));
                    r.sql.push('.');
                }
                r.sql.push_str(&r.dialect.quote_identifier(&table.name));
            }
            FromSource::Subquery(inner) => {
                r.sql.push('(');
                inner.render(r);
                r.sql.push(')');
            }
        }
        if let Some(alias) = &self.alias {
            r.sql.push_str(" AS ");
            r.sql.push_str(&r.dialect.quote_identifier(alias));
        }
    }
}

impl Render for OrderByExpr {
    fn render(&self, r: &mut Renderer) {
        self.expr.render(r);
        if let Some(dir) = &self.direction {
            let dir_str = match dir {
                OrderDir::Asc => "ASC",
                OrderDir::Desc => "DESC",
            };
            r.sql.push(' ');
            r.sql.push_str(dir_str);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::query::{
        ast::{
            common::{OrderDir, TableRef},
            expr::{BinaryOperator, Expr, FunctionCall},
        },
        builder::select::SelectBuilder,
        dialect::Postgres,
        ident, qual_ident,
        renderer::render_sql,
        value,
    };
    use model::core::value::Value;

    fn table(schema: Option<&str>, name: &str) -> TableRef {
        TableRef {
            schema: schema.map(String::from),
            name: name.to_string(),
        }
    }

    #[test]
    fn test_simple_select_postgres() {
        let ast = SelectBuilder::new()
            .select(vec![ident("id"), ident("name")])
            .from(table(None, "vw_counters"), None)
            .where_clause(Expr::binary(
                ident("id"),
                BinaryOperator::Eq,
                value(Value::Int(123)),
            ))
            .build();

        let (sql, params) = render_sql(&ast, &Postgres);

        assert_eq!(
            sql,
            r#"SELECT "id", "name" FROM "vw_counters" WHERE ("id" = $1::BIGINT)"#
        );
        assert_eq!(params, vec![Value::Int(123)]);
    }

    #[test]
    fn test_complex_select_postgres() {
        let ast = SelectBuilder::new()
            .select(vec![
                qual_ident("o", "direction"),
                Expr::FunctionCall(FunctionCall {
                    name: "SUM".to_string(),
                    args: vec![qual_ident("o", "value")],
                    wildcard: false,
                })
                .alias("total"),
            ])
            .from(table(Some("public"), "vw_observations"), Some("o"))
            .where_clause(Expr::binary(
                qual_ident("o", "source"),
                BinaryOperator::NotEq,
                value(Value::from("inactive")),
            ))
            .group_by(qual_ident("o", "direction"))
            .order_by(qual_ident("o", "direction"), Some(OrderDir::Desc))
            .limit(value(Value::Int(10)))
            .offset(value(Value::Int(20)))
            .build();

        let (sql, params) = render_sql(&ast, &Postgres);

        let expected_sql = r#"SELECT "o"."direction", SUM("o"."value") AS "total" FROM "public"."vw_observations" AS "o" WHERE ("o"."source" <> $1::TEXT) GROUP BY "o"."direction" ORDER BY "o"."direction" DESC LIMIT $2::BIGINT OFFSET $3::BIGINT"#;
        assert_eq!(sql, expected_sql);
        assert_eq!(
            params,
            vec![Value::from("inactive"), Value::Int(10), Value::Int(20)]
        );
    }

    #[test]
    fn test_count_over_subquery() {
        let inner = SelectBuilder::new()
            .select(vec![ident("id")])
            .from(table(None, "vw_counters"), None)
            .build();
        let ast = SelectBuilder::new()
            .select(vec![Expr::FunctionCall(FunctionCall {
                name: "COUNT".to_string(),
                args: vec![],
                wildcard: true,
            })])
            .from_subquery(inner, "rows")
            .build();

        let (sql, _) = render_sql(&ast, &Postgres);
        assert_eq!(
            sql,
            r#"SELECT COUNT(*) FROM (SELECT "id" FROM "vw_counters") AS "rows""#
        );
    }
}
