use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{info, warn};
use utoipa::ToSchema;

use super::money::{self, round_currency};
use super::reconciler::linked_targets;
use crate::error::{BillingError, PersistenceContext, Result, StoreOperation};
use crate::model::compensation::COMPENSATIONS;
use crate::model::payment::PAYMENTS;
use crate::model::{
    Association, CompensationFields, CompensationForm, CompensationRecord, OwnerKind,
    PaymentRecord, PaymentStatus, Period,
};
use crate::store::{Filter, Record, RecordStore, decode_record};

impl CompensationFields {
    pub fn from_form(form: &CompensationForm) -> Result<Self> {
        Ok(Self {
            net_salary: money::non_negative_amount("net_salary", form.net_salary)?,
            social_security: money::non_negative_amount("social_security", form.social_security)?,
            union_contribution: money::non_negative_amount(
                "union_contribution",
                form.union_contribution,
            )?,
            other_deductions: money::non_negative_amount(
                "other_deductions",
                form.other_deductions,
            )?,
            period: Period {
                month: money::month(form.month)?,
                year: money::year(form.year)?,
            },
            condominium_id: form.condominium_id,
        })
    }

    /// Credits minus deductions, rounded once at the end. May be negative.
    pub fn total(&self) -> Result<Decimal> {
        let sum = self
            .net_salary
            .checked_add(self.social_security)
            .and_then(|sum| sum.checked_add(self.union_contribution))
            .and_then(|sum| sum.checked_sub(self.other_deductions))
            .ok_or_else(|| BillingError::validation("net_salary", "total is out of range"))?;
        Ok(round_currency(sum))
    }
}

/// Both halves of one monthly compensation event.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SavedCompensation {
    pub compensation: CompensationRecord,
    pub payment: PaymentRecord,
}

/// Computes compensation totals and keeps each compensation record paired
/// with its payment record.
///
/// Writes always go compensation first, then payment. Both are keyed upserts,
/// so a save that failed halfway is repaired by calling [`save`] again with
/// the same arguments.
///
/// [`save`]: CompensationLedger::save
#[derive(Clone)]
pub struct CompensationLedger {
    store: Arc<dyn RecordStore>,
}

impl CompensationLedger {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub fn compute(&self, form: &CompensationForm) -> Result<Decimal> {
        CompensationFields::from_form(form)?.total()
    }

    pub async fn compensation(&self, id: u64) -> Result<CompensationRecord> {
        let record = self
            .store
            .find_one(COMPENSATIONS, &Filter::all().eq("id", id))
            .await
            .persistence(COMPENSATIONS, StoreOperation::FindOne)?
            .ok_or(BillingError::NotFound {
                collection: COMPENSATIONS,
                id,
            })?;

        decode_record(record).persistence(COMPENSATIONS, StoreOperation::FindOne)
    }

    pub async fn save(
        &self,
        employee_id: u64,
        form: &CompensationForm,
        existing_compensation_id: Option<u64>,
    ) -> Result<SavedCompensation> {
        let fields = CompensationFields::from_form(form)?;
        let period = fields.period;
        let total = fields.total()?;

        // 1️⃣ an update must stay on its employee and period
        if let Some(id) = existing_compensation_id {
            let current = self.compensation(id).await?;
            if current.employee_id != employee_id {
                return Err(BillingError::validation(
                    "employee_id",
                    format!("compensation {id} belongs to employee {}", current.employee_id),
                ));
            }
            if current.period() != period {
                return Err(BillingError::validation(
                    "month",
                    format!(
                        "compensation {id} covers {}/{}; delete it and save a new one to change the period",
                        current.month, current.year
                    ),
                ));
            }
        }

        // 2️⃣ resolve who pays before writing anything
        let condominium_id = self
            .resolve_condominium(employee_id, fields.condominium_id)
            .await?;

        // 3️⃣ compensation
        let compensation_key = match existing_compensation_id {
            Some(id) => object(json!({ "id": id })),
            None => period_key(employee_id, period),
        };
        let compensation = object(json!({
            "employee_id": employee_id,
            "net_salary": fields.net_salary,
            "social_security": fields.social_security,
            "union_contribution": fields.union_contribution,
            "other_deductions": fields.other_deductions,
            "total_compensation": total,
            "month": period.month,
            "year": period.year,
        }));
        let compensation: CompensationRecord = self
            .upsert(COMPENSATIONS, &compensation_key, compensation)
            .await?;

        // 4️⃣ payment
        let payment = object(json!({
            "condominium_id": condominium_id,
            "base_salary": fields.net_salary,
            "social_security": fields.social_security,
            "union_fee": fields.union_contribution,
            "deductions": fields.other_deductions,
            "total_amount": total,
            "payment_date": Utc::now().date_naive(),
            "status": PaymentStatus::Paid,
        }));
        let payment: PaymentRecord = self
            .upsert(PAYMENTS, &period_key(employee_id, period), payment)
            .await
            .inspect_err(|_| {
                warn!(
                    employee_id,
                    compensation_id = compensation.id,
                    month = period.month,
                    year = period.year,
                    "Compensation written without its payment; save must be retried"
                );
            })?;

        info!(
            employee_id,
            compensation_id = compensation.id,
            payment_id = payment.id,
            condominium_id,
            total = %total,
            "Compensation saved"
        );

        Ok(SavedCompensation {
            compensation,
            payment,
        })
    }

    /// Deletes the compensation record only; its payment record stays.
    /// Use [`delete_with_payment`](Self::delete_with_payment) to remove both.
    pub async fn delete(&self, compensation_id: u64) -> Result<()> {
        let deleted = self
            .store
            .delete_where(COMPENSATIONS, &Filter::all().eq("id", compensation_id))
            .await
            .persistence(COMPENSATIONS, StoreOperation::DeleteWhere)?;

        if deleted == 0 {
            return Err(BillingError::NotFound {
                collection: COMPENSATIONS,
                id: compensation_id,
            });
        }

        info!(compensation_id, "Compensation deleted");
        Ok(())
    }

    /// Deletes the payment record and then the compensation record. If the
    /// second delete fails, calling this again finishes the job.
    pub async fn delete_with_payment(&self, compensation_id: u64) -> Result<()> {
        let current = self.compensation(compensation_id).await?;
        let key = Filter::from_key(&period_key(current.employee_id, current.period()));

        let payments = self
            .store
            .delete_where(PAYMENTS, &key)
            .await
            .persistence(PAYMENTS, StoreOperation::DeleteWhere)?;
        self.delete(compensation_id).await?;

        info!(
            compensation_id,
            employee_id = current.employee_id,
            payments,
            "Compensation deleted with its payment"
        );
        Ok(())
    }

    /// Payment records with no compensation record for the same employee and
    /// period.
    pub async fn orphaned_payments(&self, employee_id: Option<u64>) -> Result<Vec<PaymentRecord>> {
        let filter = match employee_id {
            Some(id) => Filter::all().eq("employee_id", id),
            None => Filter::all(),
        };

        let compensations: HashSet<(u64, Period)> = self
            .find_all::<CompensationRecord>(COMPENSATIONS, &filter)
            .await?
            .into_iter()
            .map(|c| (c.employee_id, c.period()))
            .collect();

        let orphans: Vec<PaymentRecord> = self
            .find_all::<PaymentRecord>(PAYMENTS, &filter)
            .await?
            .into_iter()
            .filter(|p| !compensations.contains(&(p.employee_id, p.period())))
            .collect();

        if !orphans.is_empty() {
            warn!(count = orphans.len(), ?employee_id, "Orphaned payment records found");
        }
        Ok(orphans)
    }

    async fn resolve_condominium(&self, employee_id: u64, requested: Option<u64>) -> Result<u64> {
        let association = Association::condominiums_of(OwnerKind::Employee);
        let linked = linked_targets(self.store.as_ref(), &association, employee_id).await?;

        match requested {
            _ if linked.is_empty() => Err(BillingError::UnassignedEmployee { employee_id }),
            Some(id) if linked.contains(&id) => Ok(id),
            Some(id) => Err(BillingError::validation(
                "condominium_id",
                format!("employee {employee_id} is not linked to condominium {id}"),
            )),
            None if linked.len() == 1 => Ok(linked.into_iter().next().unwrap_or_default()),
            None => Err(BillingError::AmbiguousAssociation {
                employee_id,
                candidates: linked.into_iter().collect(),
            }),
        }
    }

    async fn upsert<T: serde::de::DeserializeOwned>(
        &self,
        collection: &'static str,
        key: &Record,
        fields: Record,
    ) -> Result<T> {
        let record = self
            .store
            .upsert(collection, key, fields)
            .await
            .persistence(collection, StoreOperation::Upsert)?;
        decode_record(record).persistence(collection, StoreOperation::Upsert)
    }

    async fn find_all<T: serde::de::DeserializeOwned>(
        &self,
        collection: &'static str,
        filter: &Filter,
    ) -> Result<Vec<T>> {
        self.store
            .find_many(collection, filter)
            .await
            .persistence(collection, StoreOperation::FindMany)?
            .into_iter()
            .map(|record| decode_record(record).persistence(collection, StoreOperation::FindMany))
            .collect()
    }
}

fn period_key(employee_id: u64, period: Period) -> Record {
    object(json!({
        "employee_id": employee_id,
        "month": period.month,
        "year": period.year,
    }))
}

fn object(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        _ => Record::new(),
    }
}
