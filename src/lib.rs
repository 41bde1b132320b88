pub mod api;
pub mod billing;
pub mod config;
pub mod db;
pub mod docs;
pub mod error;
pub mod model;
pub mod routes;
pub mod store;
pub mod utils;

pub use billing::{AssociationReconciler, CompensationLedger, ReconcileOutcome, SavedCompensation};
pub use error::{BillingError, StoreOperation};
pub use store::{InMemoryStore, MySqlStore, RecordStore, StoreError};
