//! Billing reconciliation core: compensation totals with their paired
//! payment records, and condominium membership reconciliation.

pub mod ledger;
pub mod money;
pub mod reconciler;

pub use ledger::{CompensationLedger, SavedCompensation};
pub use reconciler::{AssociationReconciler, ReconcileOutcome};
