use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::mysql::{MySqlArguments, MySqlRow};
use sqlx::query::Query;
use sqlx::{Column, MySql, MySqlPool, Row, TypeInfo};
use tracing::debug;

use super::{Filter, Record, RecordStore, StoreError, record_id};
use crate::utils::db_utils::{
    SqlStatement, SqlValue, build_delete_sql, build_insert_sql, build_select_sql,
    build_update_sql,
};

/// MySQL-backed record store. Collections map one-to-one onto tables that
/// have an `id BIGINT UNSIGNED AUTO_INCREMENT` primary key.
#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn fetch(&self, stmt: SqlStatement) -> Result<Vec<Record>, StoreError> {
        debug!(sql = %stmt.sql, bindings = ?stmt.values, "Fetching records");
        let rows = bind_values(&stmt.sql, stmt.values)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_to_record).collect()
    }

    async fn execute(&self, stmt: SqlStatement) -> Result<sqlx::mysql::MySqlQueryResult, StoreError> {
        debug!(sql = %stmt.sql, bindings = ?stmt.values, "Executing statement");
        Ok(bind_values(&stmt.sql, stmt.values)
            .execute(&self.pool)
            .await?)
    }

    async fn fetch_by_id(&self, table: &str, id: u64) -> Result<Record, StoreError> {
        let stmt = build_select_sql(table, &Filter::all().eq("id", id), Some(1))?;
        self.fetch(stmt)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Decode(format!("{table}/{id} vanished after write")))
    }
}

#[async_trait]
impl RecordStore for MySqlStore {
    async fn find_one(
        &self,
        collection: &str,
        filter: &Filter,
    ) -> Result<Option<Record>, StoreError> {
        let stmt = build_select_sql(collection, filter, Some(1))?;
        Ok(self.fetch(stmt).await?.into_iter().next())
    }

    async fn find_many(&self, collection: &str, filter: &Filter) -> Result<Vec<Record>, StoreError> {
        self.fetch(build_select_sql(collection, filter, None)?).await
    }

    async fn upsert(
        &self,
        collection: &str,
        key: &Record,
        fields: Record,
    ) -> Result<Record, StoreError> {
        let existing = self
            .find_one(collection, &Filter::from_key(key))
            .await?;

        let id = match existing {
            Some(row) => {
                let id = record_id(&row, "id")?;
                self.execute(build_update_sql(collection, &fields, "id", id)?)
                    .await?;
                id
            }
            None => {
                let mut record = key.clone();
                record.extend(fields);
                let explicit_id = record.get("id").and_then(Value::as_u64);
                let result = self
                    .execute(build_insert_sql(collection, &[record])?)
                    .await?;
                explicit_id.unwrap_or_else(|| result.last_insert_id())
            }
        };

        self.fetch_by_id(collection, id).await
    }

    async fn delete_where(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError> {
        let result = self.execute(build_delete_sql(collection, filter)?).await?;
        Ok(result.rows_affected())
    }

    async fn insert_many(&self, collection: &str, records: Vec<Record>) -> Result<(), StoreError> {
        if records.is_empty() {
            return Ok(());
        }
        self.execute(build_insert_sql(collection, &records)?).await?;
        Ok(())
    }
}

/// ===============================
/// Bind SqlValue list onto a query
/// ===============================
fn bind_values(sql: &str, values: Vec<SqlValue>) -> Query<'_, MySql, MySqlArguments> {
    let mut query = sqlx::query(sql);

    for value in values {
        query = match value {
            SqlValue::String(v) => query.bind(v),
            SqlValue::I64(v) => query.bind(v),
            SqlValue::U64(v) => query.bind(v),
            SqlValue::F64(v) => query.bind(v),
            SqlValue::Bool(v) => query.bind(v),
            SqlValue::Date(v) => query.bind(v),
            SqlValue::DateTime(v) => query.bind(v),
            SqlValue::Null => query.bind(None::<String>),
        };
    }

    query
}

/// Decodes a row into a JSON record, picking the Rust type from the column
/// type. Decimals become strings so no precision is lost.
fn row_to_record(row: &MySqlRow) -> Result<Record, StoreError> {
    let mut record = Record::new();

    for column in row.columns() {
        let idx = column.ordinal();
        let type_name = column.type_info().name();

        let value = if type_name.ends_with("UNSIGNED") {
            row.try_get::<Option<u64>, _>(idx)?.map(Value::from)
        } else if type_name == "BOOLEAN" {
            row.try_get::<Option<bool>, _>(idx)?.map(Value::from)
        } else if matches!(type_name, "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT") {
            row.try_get::<Option<i64>, _>(idx)?.map(Value::from)
        } else if type_name == "DECIMAL" {
            row.try_get::<Option<Decimal>, _>(idx)?
                .map(|d| Value::String(d.to_string()))
        } else if type_name == "DATE" {
            row.try_get::<Option<NaiveDate>, _>(idx)?
                .map(|d| Value::String(d.format("%Y-%m-%d").to_string()))
        } else if type_name == "DATETIME" {
            row.try_get::<Option<NaiveDateTime>, _>(idx)?
                .map(|dt| Value::String(dt.and_utc().to_rfc3339()))
        } else if type_name == "TIMESTAMP" {
            row.try_get::<Option<DateTime<Utc>>, _>(idx)?
                .map(|dt| Value::String(dt.to_rfc3339()))
        } else {
            row.try_get::<Option<String>, _>(idx)?.map(Value::String)
        };

        record.insert(column.name().to_string(), value.unwrap_or(Value::Null));
    }

    Ok(record)
}
