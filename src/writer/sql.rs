//! Statement assembly for the writer. Identifiers are always quoted;
//! values always travel as positional bind parameters, never inlined.

use crate::core::Value;
use crate::record::ConflictPolicy;

pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// `INSERT INTO "t" ("a", "b") VALUES ($1, $2)` with an optional
/// `ON CONFLICT (..) [WHERE ..] DO UPDATE SET .. RETURNING *` tail.
///
/// The DO UPDATE assignments use `EXCLUDED.<col>`, the idiomatic
/// equivalent of re-binding the placeholder tuple a second time.
pub fn build_insert(table: &str, columns: &[String], conflict: Option<&ConflictPolicy>) -> String {
    let col_list = columns
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = (1..=columns.len())
        .map(|i| format!("${}", i))
        .collect::<Vec<_>>()
        .join(", ");

    let mut stmt = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_ident(table),
        col_list,
        placeholders
    );

    if let Some(policy) = conflict {
        let target = policy
            .columns
            .iter()
            .map(|c| quote_ident(c))
            .collect::<Vec<_>>()
            .join(", ");
        stmt.push_str(&format!(" ON CONFLICT ({})", target));
        if let Some(filter) = &policy.filter {
            stmt.push_str(&format!(" WHERE {}", filter));
        }

        let updates: Vec<String> = columns
            .iter()
            .filter(|c| !policy.columns.contains(c))
            .map(|c| format!("{} = EXCLUDED.{}", quote_ident(c), quote_ident(c)))
            .collect();
        if updates.is_empty() {
            stmt.push_str(" DO NOTHING");
        } else {
            stmt.push_str(&format!(" DO UPDATE SET {}", updates.join(", ")));
        }
        stmt.push_str(" RETURNING *");
    }

    stmt
}

/// `UPDATE "t" SET "a" = $1, "b" = $2 WHERE "id" = $3` — the key
/// predicate always binds last.
pub fn build_update(table: &str, columns: &[String], primary_key: &str) -> String {
    let assignments = columns
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{} = ${}", quote_ident(c), i + 1))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "UPDATE {} SET {} WHERE {} = ${}",
        quote_ident(table),
        assignments,
        quote_ident(primary_key),
        columns.len() + 1
    )
}

/// Force range values into their single scalar literal before binding.
/// A generic sanitizer that sees a two-endpoint range as an iterable
/// would expand it into two values; the text literal cannot be
/// misread, and range-typed columns parse it back into one interval.
pub fn scalarize(value: &Value) -> Value {
    match value {
        Value::Range(r) => Value::Text(r.to_literal()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::RangeValue;

    #[test]
    fn test_build_insert_plain() {
        let stmt = build_insert("fakes", &["id".into(), "name".into()], None);
        assert_eq!(stmt, "INSERT INTO \"fakes\" (\"id\", \"name\") VALUES ($1, $2)");
    }

    #[test]
    fn test_build_insert_upsert() {
        let policy = ConflictPolicy::on(["email"]);
        let stmt = build_insert("users", &["email".into(), "name".into()], Some(&policy));
        assert_eq!(
            stmt,
            "INSERT INTO \"users\" (\"email\", \"name\") VALUES ($1, $2) \
             ON CONFLICT (\"email\") DO UPDATE SET \"name\" = EXCLUDED.\"name\" RETURNING *"
        );
    }

    #[test]
    fn test_build_insert_upsert_with_filter() {
        let policy = ConflictPolicy::on(["email"]).with_filter("deleted_at IS NULL");
        let stmt = build_insert("users", &["email".into()], Some(&policy));
        assert!(stmt.contains("ON CONFLICT (\"email\") WHERE deleted_at IS NULL"));
        assert!(stmt.ends_with("DO NOTHING RETURNING *"));
    }

    #[test]
    fn test_build_update() {
        let stmt = build_update("fakes", &["name".into()], "id");
        assert_eq!(stmt, "UPDATE \"fakes\" SET \"name\" = $1 WHERE \"id\" = $2");
    }

    #[test]
    fn test_scalarize_range() {
        let range = Value::from(RangeValue::half_open(1i64, 5i64));
        assert_eq!(scalarize(&range), Value::Text("[1,5)".into()));
        assert_eq!(scalarize(&Value::Integer(3)), Value::Integer(3));
    }

    #[test]
    fn test_quote_ident_escapes_quotes() {
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }
}
