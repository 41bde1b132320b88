use std::collections::BTreeSet;
use std::sync::Arc;

use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::billing::{AssociationReconciler, ReconcileOutcome};
use crate::model::OwnerKind;
use crate::store::RecordStore;

/// One reconciler per owner kind, shared by the membership handlers.
#[derive(Clone)]
pub struct MembershipReconcilers {
    employee: AssociationReconciler,
    provider: AssociationReconciler,
}

impl MembershipReconcilers {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            employee: AssociationReconciler::condominiums_of(store.clone(), OwnerKind::Employee),
            provider: AssociationReconciler::condominiums_of(store, OwnerKind::Provider),
        }
    }

    pub fn for_owner(&self, owner: OwnerKind) -> &AssociationReconciler {
        match owner {
            OwnerKind::Employee => &self.employee,
            OwnerKind::Provider => &self.provider,
        }
    }
}

#[derive(Deserialize, Serialize, ToSchema)]
pub struct UpdateMembership {
    /// Full desired set of condominiums; anything not listed is unlinked
    #[schema(example = json!([1, 2, 3]))]
    pub condominium_ids: BTreeSet<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct MembershipResponse {
    pub owner: OwnerKind,
    #[schema(example = 1001)]
    pub owner_id: u64,
    #[schema(example = json!([1, 2, 3]))]
    pub condominium_ids: BTreeSet<u64>,
}

#[utoipa::path(
    get,
    path = "/api/{owner}/{owner_id}/condominiums",
    params(
        ("owner" = OwnerKind, Path, description = "employee or provider"),
        ("owner_id", Path, description = "Employee or provider ID")
    ),
    responses(
        (status = 200, body = MembershipResponse),
        (status = 503, description = "Store failure, safe to retry")
    ),
    tag = "Membership"
)]
pub async fn list_condominiums(
    reconcilers: web::Data<MembershipReconcilers>,
    path: web::Path<(OwnerKind, u64)>,
) -> actix_web::Result<impl Responder> {
    let (owner, owner_id) = path.into_inner();
    let condominium_ids = reconcilers.for_owner(owner).members(owner_id).await?;

    Ok(HttpResponse::Ok().json(MembershipResponse {
        owner,
        owner_id,
        condominium_ids,
    }))
}

/// Replace the condominium checklist of an employee or provider
#[utoipa::path(
    put,
    path = "/api/{owner}/{owner_id}/condominiums",
    request_body = UpdateMembership,
    params(
        ("owner" = OwnerKind, Path, description = "employee or provider"),
        ("owner_id", Path, description = "Employee or provider ID")
    ),
    responses(
        (status = 200, description = "Ids added and removed", body = ReconcileOutcome),
        (status = 503, description = "Store failure, safe to retry")
    ),
    tag = "Membership"
)]
pub async fn reconcile_condominiums(
    reconcilers: web::Data<MembershipReconcilers>,
    path: web::Path<(OwnerKind, u64)>,
    payload: web::Json<UpdateMembership>,
) -> actix_web::Result<impl Responder> {
    let (owner, owner_id) = path.into_inner();
    let outcome = reconcilers
        .for_owner(owner)
        .reconcile(owner_id, &payload.condominium_ids)
        .await?;

    Ok(HttpResponse::Ok().json(outcome))
}
