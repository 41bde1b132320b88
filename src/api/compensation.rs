use actix_web::{HttpResponse, Responder, web};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::MessageResponse;
use crate::billing::{CompensationLedger, SavedCompensation};
use crate::model::{CompensationForm, CompensationRecord, PaymentRecord};

#[derive(Deserialize, Serialize, ToSchema)]
pub struct SaveCompensation {
    #[schema(example = 1001)]
    pub employee_id: u64,

    #[serde(flatten)]
    pub form: CompensationForm,
}

#[derive(Serialize, ToSchema)]
pub struct TotalResponse {
    #[schema(value_type = String, example = "1180.56")]
    pub total: Decimal,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct DeleteCompensationQuery {
    /// Also delete the paired payment record
    #[schema(example = true)]
    pub with_payment: Option<bool>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct OrphanedPaymentsQuery {
    #[schema(example = 1001)]
    pub employee_id: Option<u64>,
}

/// Preview the total of a compensation form without saving it
#[utoipa::path(
    post,
    path = "/api/compensation/preview",
    request_body = CompensationForm,
    responses(
        (status = 200, body = TotalResponse),
        (status = 400, description = "Missing, negative or out-of-range field")
    ),
    tag = "Compensation"
)]
pub async fn preview_compensation(
    ledger: web::Data<CompensationLedger>,
    payload: web::Json<CompensationForm>,
) -> actix_web::Result<impl Responder> {
    let total = ledger.compute(&payload)?;
    Ok(HttpResponse::Ok().json(TotalResponse { total }))
}

#[utoipa::path(
    post,
    path = "/api/compensation",
    request_body = SaveCompensation,
    responses(
        (status = 201, description = "Compensation and payment saved", body = SavedCompensation),
        (status = 400, description = "Invalid form"),
        (status = 409, description = "Employee linked to several condominiums"),
        (status = 422, description = "Employee not linked to any condominium"),
        (status = 503, description = "Store failure, safe to retry")
    ),
    tag = "Compensation"
)]
pub async fn create_compensation(
    ledger: web::Data<CompensationLedger>,
    payload: web::Json<SaveCompensation>,
) -> actix_web::Result<impl Responder> {
    let saved = ledger.save(payload.employee_id, &payload.form, None).await?;
    Ok(HttpResponse::Created().json(saved))
}

#[utoipa::path(
    put,
    path = "/api/compensation/{compensation_id}",
    request_body = SaveCompensation,
    params(
        ("compensation_id", Path, description = "Compensation ID")
    ),
    responses(
        (status = 200, description = "Compensation and payment updated", body = SavedCompensation),
        (status = 400, description = "Invalid form, or the period/employee changed"),
        (status = 404, description = "Compensation not found"),
        (status = 503, description = "Store failure, safe to retry")
    ),
    tag = "Compensation"
)]
pub async fn update_compensation(
    ledger: web::Data<CompensationLedger>,
    path: web::Path<u64>,
    payload: web::Json<SaveCompensation>,
) -> actix_web::Result<impl Responder> {
    let compensation_id = path.into_inner();
    let saved = ledger
        .save(payload.employee_id, &payload.form, Some(compensation_id))
        .await?;
    Ok(HttpResponse::Ok().json(saved))
}

#[utoipa::path(
    get,
    path = "/api/compensation/{compensation_id}",
    params(
        ("compensation_id", Path, description = "Compensation ID")
    ),
    responses(
        (status = 200, body = CompensationRecord),
        (status = 404, description = "Compensation not found")
    ),
    tag = "Compensation"
)]
pub async fn get_compensation(
    ledger: web::Data<CompensationLedger>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let compensation = ledger.compensation(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(compensation))
}

#[utoipa::path(
    delete,
    path = "/api/compensation/{compensation_id}",
    params(
        ("compensation_id", Path, description = "Compensation ID"),
        DeleteCompensationQuery
    ),
    responses(
        (status = 200, body = MessageResponse),
        (status = 404, description = "Compensation not found")
    ),
    tag = "Compensation"
)]
pub async fn delete_compensation(
    ledger: web::Data<CompensationLedger>,
    path: web::Path<u64>,
    query: web::Query<DeleteCompensationQuery>,
) -> actix_web::Result<impl Responder> {
    let compensation_id = path.into_inner();

    let message = if query.with_payment.unwrap_or(false) {
        ledger.delete_with_payment(compensation_id).await?;
        "Compensation and payment deleted"
    } else {
        ledger.delete(compensation_id).await?;
        "Compensation deleted"
    };

    Ok(HttpResponse::Ok().json(MessageResponse {
        message: message.to_string(),
    }))
}

/// Payment records whose compensation record is gone
#[utoipa::path(
    get,
    path = "/api/compensation/orphaned-payments",
    params(OrphanedPaymentsQuery),
    responses(
        (status = 200, body = [PaymentRecord])
    ),
    tag = "Compensation"
)]
pub async fn orphaned_payments(
    ledger: web::Data<CompensationLedger>,
    query: web::Query<OrphanedPaymentsQuery>,
) -> actix_web::Result<impl Responder> {
    let orphans = ledger.orphaned_payments(query.employee_id).await?;
    Ok(HttpResponse::Ok().json(orphans))
}
