use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::RwLock;

use super::{Filter, Record, RecordStore, StoreError};
use crate::error::StoreOperation;

/// In-memory record store, used by tests and by `STORE_BACKEND=memory`.
///
/// Collections are created on first write. Ids come from one counter shared
/// by all collections.
#[derive(Debug)]
pub struct InMemoryStore {
    collections: RwLock<HashMap<String, Vec<Record>>>,
    next_id: AtomicU64,
    failures: RwLock<Vec<(String, StoreOperation)>>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            failures: RwLock::new(Vec::new()),
        }
    }

    /// Makes the next `operation` on `collection` fail with
    /// [`StoreError::Unavailable`]. Each injected failure fires once.
    pub async fn fail_next(&self, collection: &str, operation: StoreOperation) {
        self.failures
            .write()
            .await
            .push((collection.to_string(), operation));
    }

    /// Raw contents of a collection, in insertion order.
    pub async fn snapshot(&self, collection: &str) -> Vec<Record> {
        self.collections
            .read()
            .await
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    async fn check_failure(
        &self,
        collection: &str,
        operation: StoreOperation,
    ) -> Result<(), StoreError> {
        let mut failures = self.failures.write().await;
        if let Some(pos) = failures
            .iter()
            .position(|(c, op)| c == collection && *op == operation)
        {
            failures.remove(pos);
            return Err(StoreError::Unavailable(format!(
                "injected failure: {operation} on {collection}"
            )));
        }
        Ok(())
    }

    fn stamp_insert(&self, record: &mut Record) {
        let now = Value::String(Utc::now().to_rfc3339());
        record
            .entry("id")
            .or_insert_with(|| Value::from(self.next_id.fetch_add(1, Ordering::SeqCst)));
        record.insert("created_at".to_string(), now.clone());
        record.insert("updated_at".to_string(), now);
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn find_one(
        &self,
        collection: &str,
        filter: &Filter,
    ) -> Result<Option<Record>, StoreError> {
        self.check_failure(collection, StoreOperation::FindOne).await?;
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|rows| rows.iter().find(|r| filter.matches(r)).cloned()))
    }

    async fn find_many(&self, collection: &str, filter: &Filter) -> Result<Vec<Record>, StoreError> {
        self.check_failure(collection, StoreOperation::FindMany)
            .await?;
        let collections = self.collections.read().await;
        // ids are handed out in increasing order, so insertion order is id order
        Ok(collections
            .get(collection)
            .map(|rows| rows.iter().filter(|r| filter.matches(r)).cloned().collect())
            .unwrap_or_default())
    }

    async fn upsert(
        &self,
        collection: &str,
        key: &Record,
        fields: Record,
    ) -> Result<Record, StoreError> {
        self.check_failure(collection, StoreOperation::Upsert).await?;
        let filter = Filter::from_key(key);
        let mut collections = self.collections.write().await;
        let rows = collections.entry(collection.to_string()).or_default();

        if let Some(existing) = rows.iter_mut().find(|r| filter.matches(r)) {
            for (field, value) in fields {
                if matches!(field.as_str(), "id" | "created_at") {
                    continue;
                }
                existing.insert(field, value);
            }
            existing.insert(
                "updated_at".to_string(),
                Value::String(Utc::now().to_rfc3339()),
            );
            return Ok(existing.clone());
        }

        let mut record = key.clone();
        record.extend(fields);
        self.stamp_insert(&mut record);
        rows.push(record.clone());
        Ok(record)
    }

    async fn delete_where(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError> {
        self.check_failure(collection, StoreOperation::DeleteWhere)
            .await?;
        let mut collections = self.collections.write().await;
        let Some(rows) = collections.get_mut(collection) else {
            return Ok(0);
        };
        let before = rows.len();
        rows.retain(|r| !filter.matches(r));
        Ok((before - rows.len()) as u64)
    }

    async fn insert_many(&self, collection: &str, records: Vec<Record>) -> Result<(), StoreError> {
        self.check_failure(collection, StoreOperation::InsertMany)
            .await?;
        let mut collections = self.collections.write().await;
        let rows = collections.entry(collection.to_string()).or_default();
        for mut record in records {
            self.stamp_insert(&mut record);
            rows.push(record);
        }
        Ok(())
    }
}
