use crate::api::MessageResponse;
use crate::api::compensation::{
    DeleteCompensationQuery, OrphanedPaymentsQuery, SaveCompensation, TotalResponse,
};
use crate::api::membership::{MembershipResponse, UpdateMembership};
use crate::billing::{ReconcileOutcome, SavedCompensation};
use crate::model::{
    CompensationForm, CompensationRecord, OwnerKind, PaymentRecord, PaymentStatus, Period,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Condominium Billing API",
        version = "0.1.0",
        description = r#"
## Condominium billing reconciliation

Backs the compensation and membership screens of the condominium console.

### 🔹 Compensation
- Preview a compensation total before saving
- Save a monthly compensation; its payment record is written alongside it
- Delete a compensation, optionally together with its payment
- List payment records left without a compensation

### 🔹 Membership
- Read or replace the condominiums an employee or provider is linked to
- Only the differing links are added or removed

### 🔁 Retries
Store failures answer `503` with `"retryable": true`. Both saving a
compensation and replacing a membership set can be repeated safely.
"#,
    ),
    paths(
        crate::api::compensation::preview_compensation,
        crate::api::compensation::create_compensation,
        crate::api::compensation::update_compensation,
        crate::api::compensation::get_compensation,
        crate::api::compensation::delete_compensation,
        crate::api::compensation::orphaned_payments,

        crate::api::membership::list_condominiums,
        crate::api::membership::reconcile_condominiums
    ),
    components(
        schemas(
            CompensationForm,
            CompensationRecord,
            PaymentRecord,
            PaymentStatus,
            Period,
            SaveCompensation,
            SavedCompensation,
            TotalResponse,
            DeleteCompensationQuery,
            OrphanedPaymentsQuery,
            MessageResponse,
            OwnerKind,
            UpdateMembership,
            MembershipResponse,
            ReconcileOutcome
        )
    ),
    tags(
        (name = "Compensation", description = "Compensation and payment APIs"),
        (name = "Membership", description = "Condominium membership APIs"),
    )
)]
pub struct ApiDoc;
