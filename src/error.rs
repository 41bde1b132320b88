use strum_macros::Display;

use crate::store::StoreError;

/// Store call that failed, reported alongside the collection it targeted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum StoreOperation {
    FindOne,
    FindMany,
    Upsert,
    DeleteWhere,
    InsertMany,
}

#[derive(Debug, thiserror::Error)]
pub enum BillingError {
    /// Caller-supplied data violates a precondition.
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("employee {employee_id} is not linked to any condominium")]
    UnassignedEmployee { employee_id: u64 },

    /// The employee is linked to several condominiums and none was named.
    #[error("employee {employee_id} is linked to several condominiums {candidates:?}; pick one")]
    AmbiguousAssociation {
        employee_id: u64,
        candidates: Vec<u64>,
    },

    #[error("{collection}/{id} not found")]
    NotFound { collection: &'static str, id: u64 },

    /// Wraps any store failure. Both `save` and `reconcile` can be replayed.
    #[error("{operation} on {collection} failed: {source}")]
    Persistence {
        collection: &'static str,
        operation: StoreOperation,
        #[source]
        source: StoreError,
    },
}

impl BillingError {
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Persistence { .. })
    }
}

pub type Result<T, E = BillingError> = std::result::Result<T, E>;

/// Annotates a store result with the collection and operation it came from.
pub(crate) trait PersistenceContext<T> {
    fn persistence(self, collection: &'static str, operation: StoreOperation) -> Result<T>;
}

impl<T> PersistenceContext<T> for std::result::Result<T, StoreError> {
    fn persistence(self, collection: &'static str, operation: StoreOperation) -> Result<T> {
        self.map_err(|source| {
            tracing::error!(error = %source, collection, %operation, "Store call failed");
            BillingError::Persistence {
                collection,
                operation,
                source,
            }
        })
    }
}
