use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

pub const EMPLOYEE_CONDOMINIUMS: &str = "employee_condominiums";
pub const PROVIDER_CONDOMINIUMS: &str = "provider_condominiums";

/// Entity kinds that can be linked to condominiums.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OwnerKind {
    Employee,
    Provider,
}

/// Where a membership set lives: the join collection and its two key columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Association {
    pub owner: OwnerKind,
    pub collection: &'static str,
    pub owner_key: &'static str,
    pub target_key: &'static str,
}

impl Association {
    pub const fn condominiums_of(owner: OwnerKind) -> Self {
        match owner {
            OwnerKind::Employee => Self {
                owner,
                collection: EMPLOYEE_CONDOMINIUMS,
                owner_key: "employee_id",
                target_key: "condominium_id",
            },
            OwnerKind::Provider => Self {
                owner,
                collection: PROVIDER_CONDOMINIUMS,
                owner_key: "provider_id",
                target_key: "condominium_id",
            },
        }
    }
}
