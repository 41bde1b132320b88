pub mod compensation;
pub mod membership;
pub mod payment;

pub use compensation::{CompensationFields, CompensationForm, CompensationRecord, Period};
pub use membership::{Association, OwnerKind};
pub use payment::{PaymentRecord, PaymentStatus};
