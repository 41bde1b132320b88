use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};
use utoipa::ToSchema;

use crate::error::{PersistenceContext, Result, StoreOperation};
use crate::model::{Association, OwnerKind};
use crate::store::{Filter, Record, RecordStore, record_id};

/// What one reconcile call changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct ReconcileOutcome {
    #[schema(example = json!([3]))]
    pub added: BTreeSet<u64>,
    #[schema(example = json!([7]))]
    pub removed: BTreeSet<u64>,
}

impl ReconcileOutcome {
    pub fn is_noop(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Keeps the membership set of one owner kind in line with a desired set,
/// touching only the rows that differ.
#[derive(Clone)]
pub struct AssociationReconciler {
    store: Arc<dyn RecordStore>,
    association: Association,
}

impl AssociationReconciler {
    pub fn new(store: Arc<dyn RecordStore>, association: Association) -> Self {
        Self { store, association }
    }

    pub fn condominiums_of(store: Arc<dyn RecordStore>, owner: OwnerKind) -> Self {
        Self::new(store, Association::condominiums_of(owner))
    }

    pub fn association(&self) -> Association {
        self.association
    }

    /// Current membership set of `owner_id`.
    pub async fn members(&self, owner_id: u64) -> Result<BTreeSet<u64>> {
        linked_targets(self.store.as_ref(), &self.association, owner_id).await
    }

    pub async fn reconcile(
        &self,
        owner_id: u64,
        desired: &BTreeSet<u64>,
    ) -> Result<ReconcileOutcome> {
        let Association {
            collection,
            owner_key,
            target_key,
            ..
        } = self.association;

        let current = self.members(owner_id).await?;
        let outcome = ReconcileOutcome {
            added: desired.difference(&current).copied().collect(),
            removed: current.difference(desired).copied().collect(),
        };

        if outcome.is_noop() {
            debug!(owner = %self.association.owner, owner_id, "Membership already up to date");
            return Ok(outcome);
        }

        if !outcome.removed.is_empty() {
            let filter = Filter::all()
                .eq(owner_key, owner_id)
                .any_of(target_key, outcome.removed.iter().copied());
            self.store
                .delete_where(collection, &filter)
                .await
                .persistence(collection, StoreOperation::DeleteWhere)?;
        }

        if !outcome.added.is_empty() {
            let rows = outcome
                .added
                .iter()
                .map(|target| {
                    let mut row = Record::new();
                    row.insert(owner_key.to_string(), Value::from(owner_id));
                    row.insert(target_key.to_string(), Value::from(*target));
                    row
                })
                .collect();
            self.store
                .insert_many(collection, rows)
                .await
                .persistence(collection, StoreOperation::InsertMany)?;
        }

        info!(
            owner = %self.association.owner,
            owner_id,
            added = ?outcome.added,
            removed = ?outcome.removed,
            "Membership reconciled"
        );

        Ok(outcome)
    }
}

/// Target ids linked to `owner_id`. Duplicate rows collapse into one id.
pub(crate) async fn linked_targets(
    store: &dyn RecordStore,
    association: &Association,
    owner_id: u64,
) -> Result<BTreeSet<u64>> {
    let rows = store
        .find_many(
            association.collection,
            &Filter::all().eq(association.owner_key, owner_id),
        )
        .await
        .persistence(association.collection, StoreOperation::FindMany)?;

    rows.iter()
        .map(|row| record_id(row, association.target_key))
        .collect::<std::result::Result<BTreeSet<_>, _>>()
        .persistence(association.collection, StoreOperation::FindMany)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BillingError;
    use crate::model::membership::{EMPLOYEE_CONDOMINIUMS, PROVIDER_CONDOMINIUMS};
    use crate::store::InMemoryStore;
    use serde_json::json;

    fn ids(values: &[u64]) -> BTreeSet<u64> {
        values.iter().copied().collect()
    }

    async fn seed(
        store: &InMemoryStore,
        collection: &str,
        owner_key: &str,
        owner: u64,
        targets: &[u64],
    ) {
        let rows = targets
            .iter()
            .map(|t| {
                let mut row = Record::new();
                row.insert(owner_key.to_string(), json!(owner));
                row.insert("condominium_id".to_string(), json!(t));
                row
            })
            .collect();
        store.insert_many(collection, rows).await.unwrap();
    }

    #[tokio::test]
    async fn second_identical_reconcile_is_a_noop() {
        let store = Arc::new(InMemoryStore::new());
        let reconciler = AssociationReconciler::condominiums_of(store.clone(), OwnerKind::Employee);

        let first = reconciler.reconcile(5, &ids(&[1, 2, 3])).await.unwrap();
        let second = reconciler.reconcile(5, &ids(&[1, 2, 3])).await.unwrap();

        assert_eq!(first.added, ids(&[1, 2, 3]));
        assert!(second.is_noop());
        assert_eq!(store.snapshot(EMPLOYEE_CONDOMINIUMS).await.len(), 3);
    }

    #[tokio::test]
    async fn swaps_only_the_differing_ids() {
        let store = Arc::new(InMemoryStore::new());
        seed(&store, EMPLOYEE_CONDOMINIUMS, "employee_id", 5, &[1, 3]).await;
        let reconciler = AssociationReconciler::condominiums_of(store.clone(), OwnerKind::Employee);

        let outcome = reconciler.reconcile(5, &ids(&[1, 2])).await.unwrap();

        assert_eq!(outcome.added, ids(&[2]));
        assert_eq!(outcome.removed, ids(&[3]));
        assert_eq!(reconciler.members(5).await.unwrap(), ids(&[1, 2]));
    }

    #[tokio::test]
    async fn unchanged_rows_keep_their_identity() {
        let (x, y, z) = (10, 20, 30);
        let store = Arc::new(InMemoryStore::new());
        seed(&store, PROVIDER_CONDOMINIUMS, "provider_id", 9, &[x, y]).await;
        let y_row_id = store.snapshot(PROVIDER_CONDOMINIUMS).await[1]["id"].clone();
        let reconciler = AssociationReconciler::condominiums_of(store.clone(), OwnerKind::Provider);

        let outcome = reconciler.reconcile(9, &ids(&[y, z])).await.unwrap();

        assert_eq!(outcome, ReconcileOutcome { added: ids(&[z]), removed: ids(&[x]) });
        let rows = store.snapshot(PROVIDER_CONDOMINIUMS).await;
        assert_eq!(rows.len(), 2);
        let y_row = rows
            .iter()
            .find(|r| r["condominium_id"] == json!(y))
            .expect("y still linked");
        assert_eq!(y_row["id"], y_row_id);
    }

    #[tokio::test]
    async fn other_owners_are_left_alone() {
        let store = Arc::new(InMemoryStore::new());
        seed(&store, EMPLOYEE_CONDOMINIUMS, "employee_id", 1, &[4, 5]).await;
        seed(&store, EMPLOYEE_CONDOMINIUMS, "employee_id", 2, &[4, 5]).await;
        let reconciler = AssociationReconciler::condominiums_of(store.clone(), OwnerKind::Employee);

        let outcome = reconciler.reconcile(1, &BTreeSet::new()).await.unwrap();

        assert_eq!(outcome.removed, ids(&[4, 5]));
        assert!(reconciler.members(1).await.unwrap().is_empty());
        assert_eq!(reconciler.members(2).await.unwrap(), ids(&[4, 5]));
    }

    #[tokio::test]
    async fn failed_delete_changes_nothing_and_a_retry_converges() {
        let store = Arc::new(InMemoryStore::new());
        seed(&store, EMPLOYEE_CONDOMINIUMS, "employee_id", 5, &[1, 3]).await;
        store
            .fail_next(EMPLOYEE_CONDOMINIUMS, StoreOperation::DeleteWhere)
            .await;
        let reconciler = AssociationReconciler::condominiums_of(store.clone(), OwnerKind::Employee);

        let err = reconciler.reconcile(5, &ids(&[1, 2])).await.unwrap_err();
        assert!(matches!(
            err,
            BillingError::Persistence {
                collection: EMPLOYEE_CONDOMINIUMS,
                operation: StoreOperation::DeleteWhere,
                ..
            }
        ));
        assert_eq!(reconciler.members(5).await.unwrap(), ids(&[1, 3]));

        let retry = reconciler.reconcile(5, &ids(&[1, 2])).await.unwrap();
        assert_eq!(retry, ReconcileOutcome { added: ids(&[2]), removed: ids(&[3]) });
        assert_eq!(reconciler.members(5).await.unwrap(), ids(&[1, 2]));
    }

    #[tokio::test]
    async fn failed_insert_is_reported_and_a_retry_converges() {
        let store = Arc::new(InMemoryStore::new());
        seed(&store, EMPLOYEE_CONDOMINIUMS, "employee_id", 5, &[1]).await;
        store
            .fail_next(EMPLOYEE_CONDOMINIUMS, StoreOperation::InsertMany)
            .await;
        let reconciler = AssociationReconciler::condominiums_of(store.clone(), OwnerKind::Employee);

        let err = reconciler.reconcile(5, &ids(&[2])).await.unwrap_err();
        assert!(matches!(
            err,
            BillingError::Persistence {
                collection: EMPLOYEE_CONDOMINIUMS,
                operation: StoreOperation::InsertMany,
                ..
            }
        ));
        assert!(err.is_retryable());

        // the delete went through; the retry only has the insert left to do
        let retry = reconciler.reconcile(5, &ids(&[2])).await.unwrap();
        assert_eq!(retry, ReconcileOutcome { added: ids(&[2]), removed: BTreeSet::new() });
        assert_eq!(reconciler.members(5).await.unwrap(), ids(&[2]));
    }
}
