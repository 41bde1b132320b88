use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const COMPENSATIONS: &str = "employee_compensations";

/// A (month, year) payroll cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct Period {
    #[schema(example = 3)]
    pub month: u32,
    #[schema(example = 2024)]
    pub year: i32,
}

/// Raw compensation form as submitted by the caller. Every field is optional
/// here so that missing values surface as validation errors, not parse errors.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "net_salary": "2000.00",
    "social_security": "300.00",
    "union_contribution": "100.00",
    "other_deductions": "0",
    "month": 3,
    "year": 2024
}))]
pub struct CompensationForm {
    #[schema(value_type = Option<String>, example = "2000.00")]
    pub net_salary: Option<Decimal>,

    #[schema(value_type = Option<String>, example = "300.00")]
    pub social_security: Option<Decimal>,

    #[schema(value_type = Option<String>, example = "100.00")]
    pub union_contribution: Option<Decimal>,

    #[schema(value_type = Option<String>, example = "0")]
    pub other_deductions: Option<Decimal>,

    #[schema(example = 3)]
    pub month: Option<u32>,

    #[schema(example = 2024)]
    pub year: Option<i32>,

    /// Required only when the employee is linked to several condominiums.
    #[schema(example = 12, nullable = true)]
    pub condominium_id: Option<u64>,
}

/// A form that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct CompensationFields {
    pub net_salary: Decimal,
    pub social_security: Decimal,
    pub union_contribution: Decimal,
    pub other_deductions: Decimal,
    pub period: Period,
    pub condominium_id: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CompensationRecord {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = 1001)]
    pub employee_id: u64,

    #[schema(value_type = String, example = "2000.00")]
    pub net_salary: Decimal,

    #[schema(value_type = String, example = "300.00")]
    pub social_security: Decimal,

    #[schema(value_type = String, example = "100.00")]
    pub union_contribution: Decimal,

    #[schema(value_type = String, example = "0.00")]
    pub other_deductions: Decimal,

    #[schema(value_type = String, example = "2400.00")]
    pub total_compensation: Decimal,

    #[schema(example = 3)]
    pub month: u32,

    #[schema(example = 2024)]
    pub year: i32,

    #[schema(value_type = Option<String>, format = "date-time")]
    pub created_at: Option<DateTime<Utc>>,

    #[schema(value_type = Option<String>, format = "date-time")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl CompensationRecord {
    pub fn period(&self) -> Period {
        Period {
            month: self.month,
            year: self.year,
        }
    }
}
