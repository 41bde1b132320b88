use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;

use crate::store::{Condition, Filter, Record, StoreError};

/// ===============================
/// SQL bindable value enum
/// ===============================
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    String(String),
    I64(i64),
    U64(u64),
    F64(f64),
    Bool(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Null,
}

/// ===============================
/// SQL statement container
/// ===============================
#[derive(Debug, PartialEq)]
pub struct SqlStatement {
    pub sql: String,
    pub values: Vec<SqlValue>,
}

/// Table and column names are spliced into SQL text, so only plain
/// identifiers are accepted.
pub fn checked_ident(name: &str) -> Result<&str, StoreError> {
    let mut chars = name.chars();
    let valid = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && name.len() <= 64;

    if valid {
        Ok(name)
    } else {
        Err(StoreError::InvalidIdentifier(name.to_string()))
    }
}

/// Convert JSON values → SqlValue
pub fn to_sql_value(value: &Value) -> Result<SqlValue, StoreError> {
    Ok(match value {
        Value::String(s) => {
            if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                SqlValue::Date(d)
            } else if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
                SqlValue::DateTime(dt)
            } else if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
                SqlValue::DateTime(dt.naive_utc())
            } else {
                SqlValue::String(s.clone())
            }
        }
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                SqlValue::U64(u)
            } else if let Some(i) = n.as_i64() {
                SqlValue::I64(i)
            } else if let Some(f) = n.as_f64() {
                SqlValue::F64(f)
            } else {
                return Err(StoreError::Decode(format!("unsupported number {n}")));
            }
        }
        Value::Bool(b) => SqlValue::Bool(*b),
        Value::Null => SqlValue::Null,
        _ => return Err(StoreError::Decode("Unsupported JSON value type".into())),
    })
}

fn where_clause(filter: &Filter, values: &mut Vec<SqlValue>) -> Result<String, StoreError> {
    if filter.conditions().is_empty() {
        return Ok(String::new());
    }

    let mut terms = Vec::with_capacity(filter.conditions().len());
    for condition in filter.conditions() {
        let column = checked_ident(condition.field())?;
        match condition {
            Condition::Eq(_, value) => {
                terms.push(format!("{column} = ?"));
                values.push(to_sql_value(value)?);
            }
            // `IN ()` is not valid SQL; an empty candidate list matches nothing
            Condition::In(_, candidates) if candidates.is_empty() => {
                terms.push("1 = 0".to_string());
            }
            Condition::In(_, candidates) => {
                let marks = vec!["?"; candidates.len()].join(", ");
                terms.push(format!("{column} IN ({marks})"));
                for candidate in candidates {
                    values.push(to_sql_value(candidate)?);
                }
            }
        }
    }

    Ok(format!(" WHERE {}", terms.join(" AND ")))
}

/// ===============================
/// Build SELECT / DELETE
/// ===============================
pub fn build_select_sql(
    table: &str,
    filter: &Filter,
    limit: Option<u32>,
) -> Result<SqlStatement, StoreError> {
    let table = checked_ident(table)?;
    let mut values = Vec::new();
    let mut sql = format!("SELECT * FROM {table}{}", where_clause(filter, &mut values)?);
    sql.push_str(" ORDER BY id");
    if let Some(limit) = limit {
        sql.push_str(&format!(" LIMIT {limit}"));
    }
    Ok(SqlStatement { sql, values })
}

pub fn build_delete_sql(table: &str, filter: &Filter) -> Result<SqlStatement, StoreError> {
    let table = checked_ident(table)?;
    let mut values = Vec::new();
    let sql = format!("DELETE FROM {table}{}", where_clause(filter, &mut values)?);
    Ok(SqlStatement { sql, values })
}

/// ===============================
/// Build dynamic UPDATE SQL
/// ===============================
pub fn build_update_sql(
    table: &str,
    payload: &Record,
    id_column: &str,
    id_value: u64,
) -> Result<SqlStatement, StoreError> {
    let table = checked_ident(table)?;
    let id_column = checked_ident(id_column)?;

    let mut assignments = Vec::with_capacity(payload.len());
    let mut values = Vec::with_capacity(payload.len() + 1);
    for (column, value) in payload {
        // store-managed columns
        if matches!(column.as_str(), "id" | "created_at" | "updated_at") {
            continue;
        }
        assignments.push(format!("{} = ?", checked_ident(column)?));
        values.push(to_sql_value(value)?);
    }

    if assignments.is_empty() {
        return Err(StoreError::Decode("No fields provided for update".into()));
    }

    let sql = format!(
        "UPDATE {} SET {} WHERE {} = ?",
        table,
        assignments.join(", "),
        id_column
    );

    // WHERE id = ?
    values.push(SqlValue::U64(id_value));

    Ok(SqlStatement { sql, values })
}

/// ===============================
/// Build multi-row INSERT
/// ===============================
/// Every record must carry the same columns as the first one.
pub fn build_insert_sql(table: &str, records: &[Record]) -> Result<SqlStatement, StoreError> {
    let table = checked_ident(table)?;
    let Some(first) = records.first() else {
        return Err(StoreError::Decode("No records provided for insert".into()));
    };

    let columns = first
        .keys()
        .map(|c| checked_ident(c))
        .collect::<Result<Vec<_>, _>>()?;
    let row_marks = format!("({})", vec!["?"; columns.len()].join(", "));

    let mut values = Vec::with_capacity(columns.len() * records.len());
    for record in records {
        if record.len() != columns.len() {
            return Err(StoreError::Decode(
                "records in one insert must share their columns".into(),
            ));
        }
        for column in &columns {
            let value = record.get(*column).ok_or_else(|| {
                StoreError::Decode(format!("record is missing column `{column}`"))
            })?;
            values.push(to_sql_value(value)?);
        }
    }

    let sql = format!(
        "INSERT INTO {} ({}) VALUES {}",
        table,
        columns.join(", "),
        vec![row_marks.as_str(); records.len()].join(", ")
    );

    Ok(SqlStatement { sql, values })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().cloned().expect("object literal")
    }

    #[test]
    fn select_with_eq_and_in_terms() {
        let filter = Filter::all()
            .eq("provider_id", 4)
            .any_of("condominium_id", [1, 2]);

        let stmt = build_select_sql("provider_condominiums", &filter, None).unwrap();

        assert_eq!(
            stmt.sql,
            "SELECT * FROM provider_condominiums WHERE provider_id = ? AND condominium_id IN (?, ?) ORDER BY id"
        );
        assert_eq!(
            stmt.values,
            vec![SqlValue::U64(4), SqlValue::U64(1), SqlValue::U64(2)]
        );
    }

    #[test]
    fn empty_in_list_matches_nothing() {
        let filter = Filter::all().any_of("id", Vec::<u64>::new());
        let stmt = build_delete_sql("employee_payments", &filter).unwrap();
        assert_eq!(stmt.sql, "DELETE FROM employee_payments WHERE 1 = 0");
        assert!(stmt.values.is_empty());
    }

    #[test]
    fn update_skips_store_managed_columns() {
        let payload = record(json!({
            "id": 9,
            "total_compensation": "2400.00",
            "updated_at": "2024-03-01T00:00:00Z",
        }));

        let stmt = build_update_sql("employee_compensations", &payload, "id", 9).unwrap();

        assert_eq!(
            stmt.sql,
            "UPDATE employee_compensations SET total_compensation = ? WHERE id = ?"
        );
        assert_eq!(
            stmt.values,
            vec![SqlValue::String("2400.00".into()), SqlValue::U64(9)]
        );
    }

    #[test]
    fn insert_many_rows_share_one_statement() {
        let rows = vec![
            record(json!({ "condominium_id": 1, "employee_id": 3 })),
            record(json!({ "condominium_id": 2, "employee_id": 3 })),
        ];

        let stmt = build_insert_sql("employee_condominiums", &rows).unwrap();

        assert_eq!(
            stmt.sql,
            "INSERT INTO employee_condominiums (condominium_id, employee_id) VALUES (?, ?), (?, ?)"
        );
        assert_eq!(stmt.values.len(), 4);
    }

    #[test]
    fn rejects_unsafe_identifiers() {
        assert!(matches!(
            build_select_sql("users; DROP TABLE x", &Filter::all(), None),
            Err(StoreError::InvalidIdentifier(_))
        ));
        assert!(matches!(
            build_select_sql("t", &Filter::all().eq("a = 1 OR 1", 1), Some(1)),
            Err(StoreError::InvalidIdentifier(_))
        ));
    }

    #[test]
    fn date_strings_bind_as_dates() {
        assert_eq!(
            to_sql_value(&json!("2024-03-31")).unwrap(),
            SqlValue::Date(NaiveDate::from_ymd_opt(2024, 3, 31).unwrap())
        );
        assert_eq!(
            to_sql_value(&json!("1180.56")).unwrap(),
            SqlValue::String("1180.56".into())
        );
    }
}
