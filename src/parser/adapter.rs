use sqlparser::ast as sql_ast;
use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::parser::Parser;

use crate::core::{DbError, Result, Value};
use crate::parser::ast::*;

/// Translates the SQL text arriving at the in-memory backend into the
/// internal statement forms. Anything outside the supported shapes is
/// rejected with `UnsupportedOperation` rather than silently mangled.
pub struct SqlParserAdapter {
    dialect: PostgreSqlDialect,
}

impl SqlParserAdapter {
    pub fn new() -> Self {
        Self {
            dialect: PostgreSqlDialect {},
        }
    }

    pub fn parse(&self, sql: &str) -> Result<Statement> {
        let mut stmts = Parser::parse_sql(&self.dialect, sql)
            .map_err(|e| DbError::ParseError(e.to_string()))?;
        if stmts.len() != 1 {
            return Err(DbError::UnsupportedOperation(
                "Exactly one statement per execution".into(),
            ));
        }
        self.convert_statement(stmts.remove(0))
    }

    fn convert_statement(&self, stmt: sql_ast::Statement) -> Result<Statement> {
        match stmt {
            sql_ast::Statement::Insert(insert) => {
                Ok(Statement::Insert(self.convert_insert(insert)?))
            }
            sql_ast::Statement::Update {
                table,
                assignments,
                selection,
                ..
            } => Ok(Statement::Update(
                self.convert_update(table, assignments, selection)?,
            )),
            sql_ast::Statement::Query(query) => Ok(Statement::Select(self.convert_query(*query)?)),
            _ => Err(DbError::UnsupportedOperation(format!(
                "Statement type not supported: {:?}",
                stmt
            ))),
        }
    }

    fn convert_insert(&self, insert: sql_ast::Insert) -> Result<InsertStmt> {
        let table_name = match &insert.table {
            sql_ast::TableObject::TableName(name) => extract_table_name(name)?,
            _ => {
                return Err(DbError::UnsupportedOperation(
                    "Table functions not supported in INSERT".into(),
                ));
            }
        };

        let columns: Vec<String> = insert.columns.into_iter().map(|id| id.value).collect();

        // A missing source is the DEFAULT VALUES form.
        let values = match insert.source {
            None => None,
            Some(source) => {
                let sql_ast::SetExpr::Values(vals) = *source.body else {
                    return Err(DbError::UnsupportedOperation(
                        "Only VALUES clause supported in INSERT".into(),
                    ));
                };
                let mut rows = vals.rows;
                if rows.len() != 1 {
                    return Err(DbError::UnsupportedOperation(
                        "Only single-row VALUES supported".into(),
                    ));
                }
                Some(
                    rows.remove(0)
                        .into_iter()
                        .map(|expr| self.convert_expr(expr))
                        .collect::<Result<Vec<_>>>()?,
                )
            }
        };

        let on_conflict = match insert.on {
            None => None,
            Some(sql_ast::OnInsert::OnConflict(oc)) => Some(self.convert_on_conflict(oc)?),
            Some(_) => {
                return Err(DbError::UnsupportedOperation(
                    "Only ON CONFLICT insert handling supported".into(),
                ));
            }
        };

        let returning = match insert.returning {
            None => false,
            Some(items) => {
                let wildcard = items.len() == 1
                    && matches!(items[0], sql_ast::SelectItem::Wildcard(_));
                if !wildcard {
                    return Err(DbError::UnsupportedOperation(
                        "Only RETURNING * supported".into(),
                    ));
                }
                true
            }
        };

        Ok(InsertStmt {
            table_name,
            columns,
            values,
            on_conflict,
            returning,
        })
    }

    fn convert_on_conflict(&self, oc: sql_ast::OnConflict) -> Result<OnConflictClause> {
        let target = match oc.conflict_target {
            Some(sql_ast::ConflictTarget::Columns(cols)) => {
                cols.into_iter().map(|id| id.value).collect()
            }
            Some(_) => {
                return Err(DbError::UnsupportedOperation(
                    "ON CONFLICT ON CONSTRAINT not supported".into(),
                ));
            }
            None => Vec::new(),
        };

        let action = match oc.action {
            sql_ast::OnConflictAction::DoNothing => ConflictAction::DoNothing,
            sql_ast::OnConflictAction::DoUpdate(update) => {
                if update.selection.is_some() {
                    return Err(DbError::UnsupportedOperation(
                        "DO UPDATE ... WHERE not supported".into(),
                    ));
                }
                ConflictAction::DoUpdate(
                    update
                        .assignments
                        .into_iter()
                        .map(|assign| self.convert_assignment(assign))
                        .collect::<Result<Vec<_>>>()?,
                )
            }
            other => {
                return Err(DbError::UnsupportedOperation(format!(
                    "Conflict action not supported: {:?}",
                    other
                )));
            }
        };

        Ok(OnConflictClause { target, action })
    }

    fn convert_update(
        &self,
        table: sql_ast::TableWithJoins,
        assignments: Vec<sql_ast::Assignment>,
        selection: Option<sql_ast::Expr>,
    ) -> Result<UpdateStmt> {
        let table_name = match table.relation {
            sql_ast::TableFactor::Table { name, .. } => extract_table_name(&name)?,
            _ => {
                return Err(DbError::UnsupportedOperation(
                    "Complex table references not supported in UPDATE".into(),
                ));
            }
        };

        let assignments = assignments
            .into_iter()
            .map(|assign| self.convert_assignment(assign))
            .collect::<Result<Vec<_>>>()?;

        let selection = selection
            .map(|expr| self.convert_predicate(expr))
            .transpose()?;

        Ok(UpdateStmt {
            table_name,
            assignments,
            selection,
        })
    }

    fn convert_query(&self, query: sql_ast::Query) -> Result<SelectStmt> {
        let sql_ast::SetExpr::Select(select) = *query.body else {
            return Err(DbError::UnsupportedOperation(
                "Only SELECT queries supported".into(),
            ));
        };

        let mut projection = Vec::new();
        for item in select.projection {
            match item {
                sql_ast::SelectItem::Wildcard(_) => {}
                sql_ast::SelectItem::UnnamedExpr(sql_ast::Expr::Identifier(ident)) => {
                    projection.push(ident.value);
                }
                other => {
                    return Err(DbError::UnsupportedOperation(format!(
                        "Projection not supported: {:?}",
                        other
                    )));
                }
            }
        }

        if select.from.len() != 1 || !select.from[0].joins.is_empty() {
            return Err(DbError::UnsupportedOperation(
                "Exactly one table without joins supported in SELECT".into(),
            ));
        }
        let table_name = match &select.from[0].relation {
            sql_ast::TableFactor::Table { name, .. } => extract_table_name(name)?,
            _ => {
                return Err(DbError::UnsupportedOperation(
                    "Complex table references not supported in SELECT".into(),
                ));
            }
        };

        let selection = select
            .selection
            .map(|expr| self.convert_predicate(expr))
            .transpose()?;

        Ok(SelectStmt {
            table_name,
            projection,
            selection,
        })
    }

    fn convert_assignment(&self, assign: sql_ast::Assignment) -> Result<Assignment> {
        let column = match assign.target {
            sql_ast::AssignmentTarget::ColumnName(name) => single_ident(&name)?,
            _ => {
                return Err(DbError::UnsupportedOperation(
                    "Only simple column names supported in assignments".into(),
                ));
            }
        };
        let value = self.convert_expr(assign.value)?;
        Ok(Assignment { column, value })
    }

    fn convert_predicate(&self, expr: sql_ast::Expr) -> Result<Predicate> {
        let sql_ast::Expr::BinaryOp { left, op, right } = expr else {
            return Err(DbError::UnsupportedOperation(
                "Only single comparisons supported in WHERE".into(),
            ));
        };
        if !matches!(op, sql_ast::BinaryOperator::Eq) {
            return Err(DbError::UnsupportedOperation(
                "Only equality supported in WHERE".into(),
            ));
        }
        let column = match *left {
            sql_ast::Expr::Identifier(ident) => ident.value,
            other => {
                return Err(DbError::UnsupportedOperation(format!(
                    "WHERE left side not supported: {:?}",
                    other
                )));
            }
        };
        let value = self.convert_expr(*right)?;
        Ok(Predicate { column, value })
    }

    fn convert_expr(&self, expr: sql_ast::Expr) -> Result<Expr> {
        match expr {
            sql_ast::Expr::Value(val) => {
                if let sql_ast::Value::Placeholder(p) = &val.value {
                    let index = p
                        .trim_start_matches('$')
                        .parse::<usize>()
                        .map_err(|_| DbError::ParseError(format!("Invalid placeholder: {p}")))?;
                    if index == 0 {
                        return Err(DbError::ParseError("Placeholders are 1-based".into()));
                    }
                    return Ok(Expr::Placeholder(index));
                }
                Ok(Expr::Literal(self.convert_value(&val.value)?))
            }
            sql_ast::Expr::CompoundIdentifier(parts) => {
                if parts.len() == 2 && parts[0].value.eq_ignore_ascii_case("excluded") {
                    Ok(Expr::Excluded(parts[1].value.clone()))
                } else {
                    Err(DbError::UnsupportedOperation(
                        "Only EXCLUDED.<col> compound identifiers supported".into(),
                    ))
                }
            }
            other => Err(DbError::UnsupportedOperation(format!(
                "Expression not supported: {:?}",
                other
            ))),
        }
    }

    fn convert_value(&self, val: &sql_ast::Value) -> Result<Value> {
        match val {
            sql_ast::Value::Number(n, _) => {
                if let Ok(i) = n.parse::<i64>() {
                    Ok(Value::Integer(i))
                } else if let Ok(f) = n.parse::<f64>() {
                    Ok(Value::Float(f))
                } else {
                    Err(DbError::TypeMismatch(format!("Invalid number: {}", n)))
                }
            }
            sql_ast::Value::SingleQuotedString(s) | sql_ast::Value::DoubleQuotedString(s) => {
                Ok(Value::Text(s.clone()))
            }
            sql_ast::Value::Boolean(b) => Ok(Value::Boolean(*b)),
            sql_ast::Value::Null => Ok(Value::Null),
            _ => Err(DbError::UnsupportedOperation(format!(
                "Unsupported value: {:?}",
                val
            ))),
        }
    }
}

impl Default for SqlParserAdapter {
    fn default() -> Self {
        Self::new()
    }
}

fn extract_table_name(name: &sql_ast::ObjectName) -> Result<String> {
    match name.0.last() {
        Some(sql_ast::ObjectNamePart::Identifier(ident)) => Ok(ident.value.clone()),
        _ => Err(DbError::ParseError("Invalid table name".into())),
    }
}

fn single_ident(name: &sql_ast::ObjectName) -> Result<String> {
    if name.0.len() != 1 {
        return Err(DbError::UnsupportedOperation(
            "Qualified column names not supported".into(),
        ));
    }
    match &name.0[0] {
        sql_ast::ObjectNamePart::Identifier(ident) => Ok(ident.value.clone()),
        _ => Err(DbError::ParseError("Invalid column name".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_parameterized_insert() {
        let adapter = SqlParserAdapter::new();
        let stmt = adapter
            .parse("INSERT INTO \"fakes\" (\"id\", \"name\") VALUES ($1, $2)")
            .unwrap();

        let Statement::Insert(insert) = stmt else {
            panic!("expected insert");
        };
        assert_eq!(insert.table_name, "fakes");
        assert_eq!(insert.columns, vec!["id", "name"]);
        let values = insert.values.unwrap();
        assert!(matches!(values[0], Expr::Placeholder(1)));
        assert!(matches!(values[1], Expr::Placeholder(2)));
        assert!(insert.on_conflict.is_none());
        assert!(!insert.returning);
    }

    #[test]
    fn test_parse_default_values_insert() {
        let adapter = SqlParserAdapter::new();
        let stmt = adapter.parse("INSERT INTO \"fakes\" DEFAULT VALUES").unwrap();

        let Statement::Insert(insert) = stmt else {
            panic!("expected insert");
        };
        assert!(insert.values.is_none());
        assert!(insert.columns.is_empty());
    }

    #[test]
    fn test_parse_upsert() {
        let adapter = SqlParserAdapter::new();
        let stmt = adapter
            .parse(
                "INSERT INTO \"users\" (\"email\", \"name\") VALUES ($1, $2) \
                 ON CONFLICT (\"email\") DO UPDATE SET \"name\" = EXCLUDED.\"name\" RETURNING *",
            )
            .unwrap();

        let Statement::Insert(insert) = stmt else {
            panic!("expected insert");
        };
        let clause = insert.on_conflict.unwrap();
        assert_eq!(clause.target, vec!["email"]);
        let ConflictAction::DoUpdate(assignments) = clause.action else {
            panic!("expected do-update");
        };
        assert_eq!(assignments[0].column, "name");
        assert!(matches!(&assignments[0].value, Expr::Excluded(c) if c == "name"));
        assert!(insert.returning);
    }

    #[test]
    fn test_parse_update_with_placeholder_predicate() {
        let adapter = SqlParserAdapter::new();
        let stmt = adapter
            .parse("UPDATE \"fakes\" SET \"name\" = $1 WHERE \"id\" = $2")
            .unwrap();

        let Statement::Update(update) = stmt else {
            panic!("expected update");
        };
        assert_eq!(update.table_name, "fakes");
        assert_eq!(update.assignments[0].column, "name");
        let predicate = update.selection.unwrap();
        assert_eq!(predicate.column, "id");
        assert!(matches!(predicate.value, Expr::Placeholder(2)));
    }

    #[test]
    fn test_parse_select_star() {
        let adapter = SqlParserAdapter::new();
        let stmt = adapter
            .parse("SELECT * FROM \"fakes\" WHERE \"id\" = 1")
            .unwrap();

        let Statement::Select(select) = stmt else {
            panic!("expected select");
        };
        assert_eq!(select.table_name, "fakes");
        assert!(select.projection.is_empty());
        assert!(select.selection.is_some());
    }

    #[test]
    fn test_rejects_multi_statement_input() {
        let adapter = SqlParserAdapter::new();
        let err = adapter
            .parse("SELECT * FROM a; SELECT * FROM b")
            .unwrap_err();
        assert!(matches!(err, DbError::UnsupportedOperation(_)));
    }
}
