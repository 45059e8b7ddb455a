// src/services/ledger.rs

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::{
    errors::{EngineError, EngineResult},
    models::{
        CommissionRecord, CommissionStatus, EmployeeTotals, LedgerSummary, RecordQuery,
        SortDirection, SortKey,
    },
    store::{CommissionRepository, RepositoryError},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::info;

/// Commission records: append-only creation, Pending → Paid/Cancelled transitions, and
/// read-only reporting queries. Nothing here recomputes an amount.
pub struct CommissionLedger;

impl CommissionLedger {
    pub fn append<R: CommissionRepository>(
        store: &mut R,
        record: CommissionRecord,
    ) -> EngineResult<CommissionRecord> {
        if store.record(&record.id)?.is_some() {
            return Err(RepositoryError::Conflict(format!("commission record {}", record.id)).into());
        }
        store.put_record(record.clone())?;
        Ok(record)
    }

    pub fn get<R: CommissionRepository>(store: &R, id: &str) -> EngineResult<CommissionRecord> {
        store
            .record(id)?
            .ok_or_else(|| EngineError::NotFound(format!("commission record {}", id)))
    }

    pub fn mark_paid<R: CommissionRepository>(
        store: &mut R,
        id: &str,
    ) -> EngineResult<CommissionRecord> {
        Self::transition(store, id, CommissionStatus::Paid)
    }

    pub fn cancel<R: CommissionRepository>(
        store: &mut R,
        id: &str,
    ) -> EngineResult<CommissionRecord> {
        Self::transition(store, id, CommissionStatus::Cancelled)
    }

    /// Move a pending record to a terminal status. Paid and Cancelled records never change.
    pub fn transition<R: CommissionRepository>(
        store: &mut R,
        id: &str,
        target: CommissionStatus,
    ) -> EngineResult<CommissionRecord> {
        let mut record = Self::get(&*store, id)?;
        if record.status.is_terminal() {
            return Err(EngineError::RecordClosed {
                id: record.id,
                status: record.status,
            });
        }
        if !target.is_terminal() {
            return Err(EngineError::Validation(format!(
                "record {} is already {:?}",
                id, record.status
            )));
        }

        record.status = target;
        store.put_record(record.clone())?;
        info!("Commission record {} marked {:?}", id, target);
        Ok(record)
    }

    pub fn by_employee<R: CommissionRepository>(
        store: &R,
        employee_id: &str,
    ) -> EngineResult<Vec<CommissionRecord>> {
        Self::query(
            store,
            &RecordQuery {
                employee_id: Some(employee_id.to_string()),
                ..RecordQuery::default()
            },
        )
    }

    /// Records dated within `[from, to]`.
    pub fn by_period<R: CommissionRepository>(
        store: &R,
        from: NaiveDate,
        to: NaiveDate,
    ) -> EngineResult<Vec<CommissionRecord>> {
        Self::query(
            store,
            &RecordQuery {
                from: Some(from),
                to: Some(to),
                ..RecordQuery::default()
            },
        )
    }

    pub fn by_status<R: CommissionRepository>(
        store: &R,
        status: CommissionStatus,
    ) -> EngineResult<Vec<CommissionRecord>> {
        Self::query(
            store,
            &RecordQuery {
                status: Some(status),
                ..RecordQuery::default()
            },
        )
    }

    pub fn query<R: CommissionRepository>(
        store: &R,
        query: &RecordQuery,
    ) -> EngineResult<Vec<CommissionRecord>> {
        if let (Some(from), Some(to)) = (query.from, query.to) {
            if from > to {
                return Err(EngineError::Validation(format!(
                    "date range starts ({}) after it ends ({})",
                    from, to
                )));
            }
        }

        let mut records: Vec<CommissionRecord> = store
            .records()?
            .into_iter()
            .filter(|r| query.employee_id.as_ref().is_none_or(|id| &r.employee_id == id))
            .filter(|r| query.from.is_none_or(|from| r.date >= from))
            .filter(|r| query.to.is_none_or(|to| r.date <= to))
            .filter(|r| query.status.is_none_or(|status| r.status == status))
            .collect();

        let key = query.sort_by.unwrap_or_default();
        let direction = query.direction.unwrap_or_default();
        records.sort_by(|a, b| {
            let ordering = compare(a, b, key).then_with(|| a.id.cmp(&b.id));
            match direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });
        Ok(records)
    }

    /// Totals per status, overall and per employee.
    pub fn summarize(records: &[CommissionRecord]) -> LedgerSummary {
        let mut employees: BTreeMap<&str, EmployeeTotals> = BTreeMap::new();
        let mut pending_total = Decimal::ZERO;
        let mut paid_total = Decimal::ZERO;
        let mut cancelled_total = Decimal::ZERO;

        for record in records {
            let totals = employees
                .entry(record.employee_id.as_str())
                .or_insert_with(|| EmployeeTotals {
                    employee_id: record.employee_id.clone(),
                    employee_name: record.employee_name.clone(),
                    pending: Decimal::ZERO,
                    paid: Decimal::ZERO,
                    cancelled: Decimal::ZERO,
                });
            match record.status {
                CommissionStatus::Pending => {
                    totals.pending += record.calculated_amount;
                    pending_total += record.calculated_amount;
                }
                CommissionStatus::Paid => {
                    totals.paid += record.calculated_amount;
                    paid_total += record.calculated_amount;
                }
                CommissionStatus::Cancelled => {
                    totals.cancelled += record.calculated_amount;
                    cancelled_total += record.calculated_amount;
                }
            }
        }

        LedgerSummary {
            record_count: records.len(),
            pending_total,
            paid_total,
            cancelled_total,
            employees: employees.into_values().collect(),
        }
    }
}

fn status_rank(status: CommissionStatus) -> u8 {
    match status {
        CommissionStatus::Pending => 0,
        CommissionStatus::Paid => 1,
        CommissionStatus::Cancelled => 2,
    }
}

fn compare(a: &CommissionRecord, b: &CommissionRecord, key: SortKey) -> Ordering {
    match key {
        SortKey::Date => a.date.cmp(&b.date),
        SortKey::EmployeeName => a.employee_name.cmp(&b.employee_name),
        SortKey::StructureName => a.structure_name.cmp(&b.structure_name),
        SortKey::JobIdentifier => a.job_identifier.cmp(&b.job_identifier),
        SortKey::InputValue => a.input_value.cmp(&b.input_value),
        SortKey::CalculatedAmount => a.calculated_amount.cmp(&b.calculated_amount),
        SortKey::Status => status_rank(a.status).cmp(&status_rank(b.status)),
    }
}
