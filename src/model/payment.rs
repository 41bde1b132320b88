use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

use super::compensation::Period;

pub const PAYMENTS: &str = "employee_payments";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
}

/// Payment projection of a compensation: same period, same amounts, plus the
/// condominium that pays it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PaymentRecord {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = 1001)]
    pub employee_id: u64,

    #[schema(example = 12)]
    pub condominium_id: u64,

    #[schema(example = 3)]
    pub month: u32,

    #[schema(example = 2024)]
    pub year: i32,

    #[schema(value_type = String, example = "2000.00")]
    pub base_salary: Decimal,

    #[schema(value_type = String, example = "300.00")]
    pub social_security: Decimal,

    #[schema(value_type = String, example = "100.00")]
    pub union_fee: Decimal,

    #[schema(value_type = String, example = "0.00")]
    pub deductions: Decimal,

    #[schema(value_type = String, example = "2400.00")]
    pub total_amount: Decimal,

    #[schema(value_type = String, format = "date", example = "2024-03-31")]
    pub payment_date: NaiveDate,

    pub status: PaymentStatus,
}

impl PaymentRecord {
    pub fn period(&self) -> Period {
        Period {
            month: self.month,
            year: self.year,
        }
    }
}
