// src/services/lifecycle.rs

use std::collections::BTreeSet;

use crate::{
    errors::{ClawbackReason, EngineError, EngineResult},
    models::{
        CalcType, CommissionRecord, CommissionStatus, CommissionStructure, CorrectionOutcome,
        CorrectionRequest, Eligibility, Employee, FinalizeItem, FinalizeItemResult,
        LogSaleRequest, PendingGpRecord, SaleLogged,
    },
    services::{
        formula::{BasisValue, FormulaEvaluator, percent_of},
        ledger::CommissionLedger,
        resolver::{JobParticipant, RuleResolver},
    },
    store::CommissionRepository,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{info, warn};
use uuid::Uuid;

/// Drives a sale from logging through GP finalization and later corrections.
pub struct GpLifecycle;

/// Largest revenue a sale or correction may carry.
pub const MAX_REVENUE: Decimal = dec!(1000000000000);

/// What one structure produces for one sale, before anything is written.
struct SaleInputs<'a> {
    employee: &'a Employee,
    structure: &'a CommissionStructure,
    share: Decimal,
    job_identifier: &'a str,
    date: NaiveDate,
    revenue: Decimal,
    gp_percent: Option<Decimal>,
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Basis for a structure plus the value recorded as the record's `inputValue`.
fn basis_for(
    structure: &CommissionStructure,
    revenue: Decimal,
    gp_percent: Option<Decimal>,
) -> EngineResult<(BasisValue, Decimal)> {
    let gp_required = || {
        gp_percent.ok_or_else(|| {
            EngineError::Validation(format!(
                "structure '{}' needs a gross profit percentage",
                structure.name
            ))
        })
    };

    match structure.calc_type {
        CalcType::TieredGp => {
            let gp = gp_required()?;
            Ok((BasisValue::tiered(gp, revenue), gp))
        }
        CalcType::PercentOfGp => {
            let gp_dollars = percent_of(revenue, gp_required()?)?;
            Ok((BasisValue::amount(gp_dollars), gp_dollars))
        }
        CalcType::PercentOfRevenue | CalcType::Flat => Ok((BasisValue::amount(revenue), revenue)),
    }
}

fn compute_record(inputs: &SaleInputs<'_>) -> EngineResult<CommissionRecord> {
    let (basis, input_value) = basis_for(inputs.structure, inputs.revenue, inputs.gp_percent)?;
    let assessed = FormulaEvaluator::assess_structure(inputs.structure, inputs.share, basis)?;

    Ok(CommissionRecord {
        id: new_id(),
        employee_id: inputs.employee.id.clone(),
        employee_name: inputs.employee.name.clone(),
        structure_id: Some(inputs.structure.id.clone()),
        structure_name: inputs.structure.name.clone(),
        job_identifier: inputs.job_identifier.to_string(),
        date: inputs.date,
        input_value,
        calculated_amount: assessed.evaluation.amount,
        status: CommissionStatus::Pending,
        commission_rate: assessed.evaluation.rate,
        total_revenue: Some(inputs.revenue),
        split_share: inputs.share,
        corrects_record_id: None,
        conditions: assessed.condition.into_iter().collect(),
    })
}

fn validate_revenue(revenue: Decimal) -> EngineResult<()> {
    if revenue < Decimal::ZERO {
        return Err(EngineError::Validation("revenue cannot be negative".to_string()));
    }
    if revenue > MAX_REVENUE {
        return Err(EngineError::Validation(format!(
            "revenue {} exceeds the maximum of {}",
            revenue, MAX_REVENUE
        )));
    }
    Ok(())
}

fn validate_gp_percent(gp: Decimal) -> EngineResult<()> {
    if gp > dec!(100) {
        return Err(EngineError::Validation(format!(
            "gross profit percentage {} exceeds 100",
            gp
        )));
    }
    Ok(())
}

fn load_employee<R: CommissionRepository>(store: &R, id: &str) -> EngineResult<Employee> {
    store
        .employee(id)?
        .ok_or_else(|| EngineError::NotFound(format!("employee {}", id)))
}

fn find_structure<'a>(
    employee: &'a Employee,
    structure_id: &str,
) -> EngineResult<&'a CommissionStructure> {
    employee.structure(structure_id).ok_or_else(|| {
        EngineError::NotFound(format!(
            "structure {} on employee {}",
            structure_id, employee.id
        ))
    })
}

enum Planned {
    Pending(PendingGpRecord),
    Record(CommissionRecord),
}

impl GpLifecycle {
    /// Record a sale. GP-based structures on a final basis become pending GP records,
    /// everything else is computed now. Every formula is checked before the first write,
    /// so a misconfigured structure fails the whole sale and touches nothing.
    pub fn log_sale<R: CommissionRepository>(
        store: &mut R,
        request: &LogSaleRequest,
    ) -> EngineResult<SaleLogged> {
        if request.job_identifier.trim().is_empty() {
            return Err(EngineError::Validation("job identifier is required".to_string()));
        }
        if request.participants.is_empty() {
            return Err(EngineError::Validation(
                "a sale needs at least one participant".to_string(),
            ));
        }
        validate_revenue(request.total_revenue)?;
        if let Some(upsell_revenue) = request.upsell_revenue {
            validate_revenue(upsell_revenue)?;
        }
        if let Some(gp) = request.estimated_gp_percent {
            validate_gp_percent(gp)?;
        }

        let mut unique = BTreeSet::new();
        let mut employees = Vec::with_capacity(request.participants.len());
        for participant in &request.participants {
            if !unique.insert(participant.employee_id.as_str()) {
                return Err(EngineError::Validation(format!(
                    "employee {} is listed twice on job {}",
                    participant.employee_id, request.job_identifier
                )));
            }
            employees.push(load_employee(&*store, &participant.employee_id)?);
        }

        let participants: Vec<JobParticipant<'_>> = request
            .participants
            .iter()
            .zip(&employees)
            .map(|(p, employee)| JobParticipant {
                employee,
                self_generated_lead: p.self_generated_lead,
                upsell: p.upsell,
                structure_ids: p
                    .structure_ids
                    .as_ref()
                    .map(|ids| ids.iter().cloned().collect()),
            })
            .collect();
        let resolved = RuleResolver::resolve_job(&request.job_identifier, &participants);

        let mut planned = Vec::new();
        for (shares, employee) in resolved.iter().zip(&employees) {
            for applicable in &shares.applicable {
                let structure = &applicable.structure;
                FormulaEvaluator::validate(structure)?;

                let revenue = match structure.eligibility {
                    Eligibility::Upsell => request.upsell_revenue.unwrap_or(request.total_revenue),
                    _ => request.total_revenue,
                };

                if structure.is_deferred() {
                    planned.push(Planned::Pending(PendingGpRecord {
                        id: new_id(),
                        employee_id: employee.id.clone(),
                        employee_name: employee.name.clone(),
                        structure_id: structure.id.clone(),
                        structure_name: structure.name.clone(),
                        job_identifier: request.job_identifier.clone(),
                        date: request.date_sold,
                        total_revenue: revenue,
                        split_share: applicable.share,
                    }));
                } else {
                    planned.push(Planned::Record(compute_record(&SaleInputs {
                        employee,
                        structure,
                        share: applicable.share,
                        job_identifier: &request.job_identifier,
                        date: request.date_sold,
                        revenue,
                        gp_percent: request.estimated_gp_percent,
                    })?));
                }
            }
        }

        let mut logged = SaleLogged::default();
        for item in planned {
            let written = match &item {
                Planned::Pending(pending) => store.put_pending(pending.clone()).map_err(EngineError::from),
                Planned::Record(record) => CommissionLedger::append(store, record.clone()).map(|_| ()),
            };
            if let Err(err) = written {
                rollback_sale(store, &logged);
                return Err(err);
            }
            match item {
                Planned::Pending(pending) => logged.pending.push(pending),
                Planned::Record(record) => logged.records.push(record),
            }
        }

        info!(
            "Sale logged for job {}: {} pending GP, {} commission records",
            request.job_identifier,
            logged.pending.len(),
            logged.records.len()
        );
        Ok(logged)
    }

    /// Supply the true GP for a pending record. Creates the commission record and removes
    /// the pending one as a single step; a second call for the same id reports `NotFound`.
    pub fn finalize<R: CommissionRepository>(
        store: &mut R,
        pending_id: &str,
        final_gp_percent: Decimal,
    ) -> EngineResult<CommissionRecord> {
        validate_gp_percent(final_gp_percent)?;

        let pending = store
            .pending(pending_id)?
            .ok_or_else(|| EngineError::NotFound(format!("pending GP record {}", pending_id)))?;
        let employee = load_employee(&*store, &pending.employee_id)?;
        let structure = find_structure(&employee, &pending.structure_id)?;

        let record = compute_record(&SaleInputs {
            employee: &employee,
            structure,
            share: pending.split_share,
            job_identifier: &pending.job_identifier,
            date: pending.date,
            revenue: pending.total_revenue,
            gp_percent: Some(final_gp_percent),
        })?;

        CommissionLedger::append(store, record.clone())?;
        match store.delete_pending(pending_id) {
            Ok(Some(_)) => {}
            Ok(None) => {
                store.delete_record(&record.id)?;
                return Err(EngineError::NotFound(format!("pending GP record {}", pending_id)));
            }
            Err(err) => {
                store.delete_record(&record.id)?;
                return Err(err.into());
            }
        }

        info!(
            "Finalized job {} for {} at {}% GP: {}",
            record.job_identifier, record.employee_name, final_gp_percent, record.calculated_amount
        );
        Ok(record)
    }

    /// Finalize several pending records. Each item succeeds or fails on its own.
    pub fn finalize_batch<R: CommissionRepository>(
        store: &mut R,
        items: &[FinalizeItem],
    ) -> Vec<FinalizeItemResult> {
        items
            .iter()
            .map(|item| match Self::finalize(store, &item.pending_id, item.final_gp_percent) {
                Ok(record) => FinalizeItemResult {
                    pending_id: item.pending_id.clone(),
                    record: Some(record),
                    error: None,
                },
                Err(err) => {
                    warn!("Finalize failed for pending record {}: {}", item.pending_id, err);
                    FinalizeItemResult {
                        pending_id: item.pending_id.clone(),
                        record: None,
                        error: Some(err.to_string()),
                    }
                }
            })
            .collect()
    }

    /// Re-finalize an already finalized record with new GP data. Increases always apply;
    /// decreases apply only inside the employee's clawback window. A rejected correction
    /// leaves every record untouched.
    pub fn correct<R: CommissionRepository>(
        store: &mut R,
        record_id: &str,
        request: &CorrectionRequest,
        today: NaiveDate,
    ) -> EngineResult<CorrectionOutcome> {
        validate_gp_percent(request.final_gp_percent)?;
        if let Some(revenue) = request.total_revenue {
            validate_revenue(revenue)?;
        }

        let original = store
            .record(record_id)?
            .ok_or_else(|| EngineError::NotFound(format!("commission record {}", record_id)))?;
        if original.corrects_record_id.is_some() {
            return Err(EngineError::Validation(format!(
                "record {} is a correction; correct the original record instead",
                record_id
            )));
        }
        if original.status == CommissionStatus::Cancelled {
            return Err(EngineError::RecordClosed {
                id: original.id,
                status: original.status,
            });
        }

        let structure_id = original.structure_id.as_deref().ok_or_else(|| {
            EngineError::Validation(format!("record {} has no structure reference", record_id))
        })?;
        let revenue = request
            .total_revenue
            .or(original.total_revenue)
            .ok_or_else(|| {
                EngineError::Validation(format!("record {} has no recorded revenue", record_id))
            })?;
        let employee = load_employee(&*store, &original.employee_id)?;
        let structure = find_structure(&employee, structure_id)?;
        if !structure.calc_type.uses_gross_profit() {
            return Err(EngineError::Validation(format!(
                "record {} is a {:?} commission computed at sale time; it has no GP to correct",
                record_id, structure.calc_type
            )));
        }

        let recomputed = compute_record(&SaleInputs {
            employee: &employee,
            structure,
            share: original.split_share,
            job_identifier: &original.job_identifier,
            date: original.date,
            revenue,
            gp_percent: Some(request.final_gp_percent),
        })?;

        let corrections: Vec<CommissionRecord> = store
            .records()?
            .into_iter()
            .filter(|r| r.corrects_record_id.as_deref() == Some(record_id))
            .filter(|r| r.status != CommissionStatus::Cancelled)
            .collect();
        let net: Decimal = original.calculated_amount
            + corrections.iter().map(|r| r.calculated_amount).sum::<Decimal>();
        let delta = recomputed.calculated_amount - net;

        if delta == Decimal::ZERO {
            return Ok(CorrectionOutcome::Unchanged { record: original });
        }
        if delta < Decimal::ZERO {
            check_clawback(&employee, &original, delta, today)?;
        }

        if original.status == CommissionStatus::Pending {
            let mut adjusted = original;
            adjusted.calculated_amount += delta;
            adjusted.input_value = recomputed.input_value;
            adjusted.commission_rate = recomputed.commission_rate;
            adjusted.total_revenue = recomputed.total_revenue;
            adjusted.conditions = recomputed.conditions;
            store.put_record(adjusted.clone())?;

            info!("Adjusted record {} by {}", adjusted.id, delta);
            return Ok(CorrectionOutcome::Adjusted {
                record: adjusted,
                delta,
            });
        }

        let correction = CommissionRecord {
            date: today,
            calculated_amount: delta,
            corrects_record_id: Some(original.id.clone()),
            ..recomputed
        };
        CommissionLedger::append(store, correction.clone())?;

        info!(
            "Paid record {} corrected by {} in record {}",
            original.id, delta, correction.id
        );
        Ok(CorrectionOutcome::Corrected {
            original,
            correction,
            delta,
        })
    }
}

fn check_clawback(
    employee: &Employee,
    original: &CommissionRecord,
    delta: Decimal,
    today: NaiveDate,
) -> EngineResult<()> {
    let reason = match employee.clawback {
        None => Some(ClawbackReason::NoPolicy),
        Some(policy) if !policy.allow_negative_deltas => {
            Some(ClawbackReason::NegativeDeltasDisallowed)
        }
        Some(policy) => {
            let age_days = (today - original.date).num_days();
            (age_days > i64::from(policy.max_age_days)).then_some(ClawbackReason::OutsideWindow {
                age_days,
                max_age_days: policy.max_age_days,
            })
        }
    };

    match reason {
        None => Ok(()),
        Some(reason) => {
            warn!(
                "Clawback of {} on record {} rejected: {}",
                delta, original.id, reason
            );
            Err(EngineError::ClawbackRejected {
                record_id: original.id.clone(),
                delta,
                sold_on: original.date,
                reason,
            })
        }
    }
}

fn rollback_sale<R: CommissionRepository>(store: &mut R, logged: &SaleLogged) {
    for pending in &logged.pending {
        if let Err(err) = store.delete_pending(&pending.id) {
            warn!("Rollback could not remove pending record {}: {}", pending.id, err);
        }
    }
    for record in &logged.records {
        if let Err(err) = store.delete_record(&record.id) {
            warn!("Rollback could not remove record {}: {}", record.id, err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        initial::demo_employees,
        models::{ClawbackPolicy, FormulaDetails, SaleParticipant},
        store::InMemoryStore,
    };

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn sale(job: &str, participants: Vec<SaleParticipant>) -> LogSaleRequest {
        LogSaleRequest {
            job_identifier: job.to_string(),
            date_sold: date(2025, 1, 10),
            total_revenue: dec!(1000),
            upsell_revenue: None,
            estimated_gp_percent: None,
            participants,
        }
    }

    fn seller(employee_id: &str) -> SaleParticipant {
        SaleParticipant {
            employee_id: employee_id.to_string(),
            self_generated_lead: false,
            upsell: false,
            structure_ids: None,
        }
    }

    fn logged_mason_pending(store: &mut InMemoryStore) -> PendingGpRecord {
        let logged = GpLifecycle::log_sale(store, &sale("J-1", vec![seller("emp-1")])).expect("logged");
        assert!(logged.records.is_empty());
        assert_eq!(logged.pending.len(), 1);
        logged.pending[0].clone()
    }

    #[test]
    fn tiered_structure_waits_for_gp() {
        let mut store = InMemoryStore::with_employees(demo_employees());
        let pending = logged_mason_pending(&mut store);
        assert_eq!(pending.structure_id, "cs-1-1");
        assert_eq!(store.pending_records().expect("list").len(), 1);
        assert!(store.records().expect("list").is_empty());
    }

    #[test]
    fn revenue_structures_compute_immediately() {
        let mut store = InMemoryStore::with_employees(demo_employees());
        let mut participant = seller("emp-1");
        participant.self_generated_lead = true;

        let logged = GpLifecycle::log_sale(&mut store, &sale("J-2", vec![participant])).expect("logged");

        assert_eq!(logged.pending.len(), 1);
        assert_eq!(logged.records.len(), 1);
        let bonus = &logged.records[0];
        assert_eq!(bonus.structure_name, "Self-Generated Lead Bonus");
        assert_eq!(bonus.calculated_amount, dec!(25));
        assert_eq!(bonus.commission_rate, Some(dec!(2.5)));
        assert_eq!(bonus.status, CommissionStatus::Pending);
    }

    #[test]
    fn finalize_creates_record_and_removes_pending() {
        let mut store = InMemoryStore::with_employees(demo_employees());
        let pending = logged_mason_pending(&mut store);

        let record = GpLifecycle::finalize(&mut store, &pending.id, dec!(57.3)).expect("finalized");

        assert_eq!(record.input_value, dec!(57.3));
        assert_eq!(record.commission_rate, Some(dec!(20)));
        assert_eq!(record.calculated_amount, dec!(200));
        assert_eq!(record.date, pending.date);
        assert!(store.pending(&pending.id).expect("read").is_none());
    }

    #[test]
    fn finalize_twice_reports_not_found() {
        let mut store = InMemoryStore::with_employees(demo_employees());
        let pending = logged_mason_pending(&mut store);

        GpLifecycle::finalize(&mut store, &pending.id, dec!(52)).expect("first finalize");
        let err = GpLifecycle::finalize(&mut store, &pending.id, dec!(52)).unwrap_err();

        assert!(matches!(err, EngineError::NotFound(_)));
        assert_eq!(store.records().expect("list").len(), 1);
    }

    #[test]
    fn unmatched_gp_finalizes_at_zero_with_condition() {
        let mut store = InMemoryStore::with_employees(demo_employees());
        let pending = logged_mason_pending(&mut store);

        let record = GpLifecycle::finalize(&mut store, &pending.id, dec!(30)).expect("finalized");

        assert_eq!(record.calculated_amount, Decimal::ZERO);
        assert_eq!(
            record.conditions,
            vec![crate::models::EngineCondition::NoMatchingTier { value: dec!(30) }]
        );
    }

    #[test]
    fn invalid_structure_fails_sale_without_writes() {
        let mut roster = demo_employees();
        roster[0].commission_structures[1].formula_details =
            crate::models::FormulaDetails::Flat { amount: dec!(10) };
        let mut store = InMemoryStore::with_employees(roster);
        let mut participant = seller("emp-1");
        participant.self_generated_lead = true;

        let err = GpLifecycle::log_sale(&mut store, &sale("J-3", vec![participant])).unwrap_err();

        assert!(matches!(err, EngineError::InvalidFormula { .. }));
        assert!(store.pending_records().expect("list").is_empty());
        assert!(store.records().expect("list").is_empty());
    }

    #[test]
    fn negative_correction_inside_window_adjusts_pending_record() {
        let mut store = InMemoryStore::with_employees(demo_employees());
        let pending = logged_mason_pending(&mut store);
        let record = GpLifecycle::finalize(&mut store, &pending.id, dec!(57)).expect("finalized");
        assert_eq!(record.calculated_amount, dec!(200));

        let today = pending.date + chrono::Duration::days(89);
        let request = CorrectionRequest {
            final_gp_percent: dec!(52),
            total_revenue: None,
        };
        let outcome = GpLifecycle::correct(&mut store, &record.id, &request, today).expect("applied");

        match outcome {
            CorrectionOutcome::Adjusted { record: adjusted, delta } => {
                assert_eq!(delta, dec!(-50));
                assert_eq!(adjusted.calculated_amount, dec!(150));
                assert_eq!(adjusted.commission_rate, Some(dec!(15)));
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn negative_correction_outside_window_is_rejected_untouched() {
        let mut store = InMemoryStore::with_employees(demo_employees());
        let pending = logged_mason_pending(&mut store);
        let record = GpLifecycle::finalize(&mut store, &pending.id, dec!(57)).expect("finalized");

        let today = pending.date + chrono::Duration::days(91);
        let request = CorrectionRequest {
            final_gp_percent: dec!(52),
            total_revenue: None,
        };
        let err = GpLifecycle::correct(&mut store, &record.id, &request, today).unwrap_err();

        assert!(matches!(
            err,
            EngineError::ClawbackRejected {
                reason: ClawbackReason::OutsideWindow { age_days: 91, max_age_days: 90 },
                ..
            }
        ));
        assert_eq!(store.record(&record.id).expect("read"), Some(record));
    }

    #[test]
    fn negative_correction_without_policy_is_rejected() {
        let mut roster = demo_employees();
        roster[0].clawback = None;
        let mut store = InMemoryStore::with_employees(roster);
        let pending = logged_mason_pending(&mut store);
        let record = GpLifecycle::finalize(&mut store, &pending.id, dec!(57)).expect("finalized");

        let request = CorrectionRequest {
            final_gp_percent: dec!(52),
            total_revenue: None,
        };
        let err = GpLifecycle::correct(&mut store, &record.id, &request, pending.date).unwrap_err();
        assert!(matches!(
            err,
            EngineError::ClawbackRejected { reason: ClawbackReason::NoPolicy, .. }
        ));
    }

    #[test]
    fn negative_correction_disallowed_by_policy() {
        let mut roster = demo_employees();
        roster[0].clawback = Some(ClawbackPolicy {
            allow_negative_deltas: false,
            max_age_days: 365,
        });
        let mut store = InMemoryStore::with_employees(roster);
        let pending = logged_mason_pending(&mut store);
        let record = GpLifecycle::finalize(&mut store, &pending.id, dec!(57)).expect("finalized");

        let request = CorrectionRequest {
            final_gp_percent: dec!(45),
            total_revenue: None,
        };
        let err = GpLifecycle::correct(&mut store, &record.id, &request, pending.date).unwrap_err();
        assert!(matches!(
            err,
            EngineError::ClawbackRejected {
                reason: ClawbackReason::NegativeDeltasDisallowed,
                ..
            }
        ));
    }

    #[test]
    fn paid_record_gets_correcting_record() {
        let mut store = InMemoryStore::with_employees(demo_employees());
        let pending = logged_mason_pending(&mut store);
        let record = GpLifecycle::finalize(&mut store, &pending.id, dec!(52)).expect("finalized");
        CommissionLedger::mark_paid(&mut store, &record.id).expect("paid");

        let today = date(2025, 2, 1);
        let request = CorrectionRequest {
            final_gp_percent: dec!(61),
            total_revenue: None,
        };
        let outcome = GpLifecycle::correct(&mut store, &record.id, &request, today).expect("applied");

        let CorrectionOutcome::Corrected { original, correction, delta } = outcome else {
            panic!("expected a correcting record");
        };
        assert_eq!(delta, dec!(50));
        assert_eq!(original.status, CommissionStatus::Paid);
        assert_eq!(original.calculated_amount, dec!(150));
        assert_eq!(correction.calculated_amount, dec!(50));
        assert_eq!(correction.corrects_record_id.as_deref(), Some(record.id.as_str()));
        assert_eq!(correction.status, CommissionStatus::Pending);
        assert_eq!(correction.date, today);

        // the net amount now matches the new GP, so re-applying is a no-op
        let again = GpLifecycle::correct(&mut store, &record.id, &request, today).expect("applied");
        assert!(matches!(again, CorrectionOutcome::Unchanged { .. }));
    }

    #[test]
    fn cancelled_record_cannot_be_corrected() {
        let mut store = InMemoryStore::with_employees(demo_employees());
        let pending = logged_mason_pending(&mut store);
        let record = GpLifecycle::finalize(&mut store, &pending.id, dec!(52)).expect("finalized");
        CommissionLedger::cancel(&mut store, &record.id).expect("cancelled");

        let request = CorrectionRequest {
            final_gp_percent: dec!(61),
            total_revenue: None,
        };
        let err = GpLifecycle::correct(&mut store, &record.id, &request, pending.date).unwrap_err();
        assert!(matches!(err, EngineError::RecordClosed { .. }));
    }

    #[test]
    fn duplicate_participants_are_rejected() {
        let mut store = InMemoryStore::with_employees(demo_employees());
        let err = GpLifecycle::log_sale(&mut store, &sale("J-4", vec![seller("emp-1"), seller("emp-1")]))
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[test]
    fn batch_reports_each_item() {
        let mut store = InMemoryStore::with_employees(demo_employees());
        let pending = logged_mason_pending(&mut store);

        let results = GpLifecycle::finalize_batch(
            &mut store,
            &[
                FinalizeItem {
                    pending_id: pending.id.clone(),
                    final_gp_percent: dec!(55),
                },
                FinalizeItem {
                    pending_id: pending.id.clone(),
                    final_gp_percent: dec!(55),
                },
            ],
        );

        assert!(results[0].record.is_some());
        assert!(results[1].record.is_none());
        assert!(results[1].error.is_some());
    }

    #[test]
    fn negative_correction_on_paid_record_books_a_clawback() {
        let mut store = InMemoryStore::with_employees(demo_employees());
        let pending = logged_mason_pending(&mut store);
        let record = GpLifecycle::finalize(&mut store, &pending.id, dec!(57)).expect("finalized");
        let paid = CommissionLedger::mark_paid(&mut store, &record.id).expect("paid");

        let today = pending.date + chrono::Duration::days(60);
        let request = CorrectionRequest {
            final_gp_percent: dec!(52),
            total_revenue: None,
        };
        let outcome = GpLifecycle::correct(&mut store, &record.id, &request, today).expect("applied");

        let CorrectionOutcome::Corrected { correction, delta, .. } = outcome else {
            panic!("expected a correcting record");
        };
        assert_eq!(delta, dec!(-50));
        assert_eq!(correction.calculated_amount, dec!(-50));
        assert_eq!(correction.date, today);
        assert_eq!(store.record(&record.id).expect("read"), Some(paid));

        let net: Decimal = CommissionLedger::by_employee(&store, "emp-1")
            .expect("query")
            .iter()
            .map(|r| r.calculated_amount)
            .sum();
        assert_eq!(net, dec!(150));
    }

    #[test]
    fn clawback_window_includes_its_last_day() {
        let mut store = InMemoryStore::with_employees(demo_employees());
        let pending = logged_mason_pending(&mut store);
        let record = GpLifecycle::finalize(&mut store, &pending.id, dec!(57)).expect("finalized");

        let today = pending.date + chrono::Duration::days(90);
        let request = CorrectionRequest {
            final_gp_percent: dec!(52),
            total_revenue: None,
        };
        let outcome = GpLifecycle::correct(&mut store, &record.id, &request, today).expect("applied");
        assert!(matches!(outcome, CorrectionOutcome::Adjusted { delta, .. } if delta == dec!(-50)));
    }

    #[test]
    fn batch_item_with_broken_structure_leaves_others_intact() {
        let mut store = InMemoryStore::with_employees(demo_employees());
        let mut bonus_seller = seller("emp-1");
        bonus_seller.self_generated_lead = true;
        let logged = GpLifecycle::log_sale(&mut store, &sale("J-5", vec![bonus_seller, seller("emp-2")]))
            .expect("logged");
        let mason = logged.pending.iter().find(|p| p.employee_id == "emp-1").expect("pending");
        let malakai = logged.pending.iter().find(|p| p.employee_id == "emp-2").expect("pending");
        let bonus = logged.records[0].clone();

        // the structure was edited after the sale was logged
        let mut employee = store.employee("emp-2").expect("read").expect("present");
        employee.commission_structures[0].formula_details = FormulaDetails::Percent { rate: dec!(5) };
        store.put_employee(employee).expect("saved");

        let results = GpLifecycle::finalize_batch(
            &mut store,
            &[
                FinalizeItem {
                    pending_id: malakai.id.clone(),
                    final_gp_percent: dec!(56),
                },
                FinalizeItem {
                    pending_id: mason.id.clone(),
                    final_gp_percent: dec!(56),
                },
            ],
        );

        assert!(results[0].error.as_deref().is_some_and(|e| e.contains("Invalid formula")));
        assert_eq!(results[1].record.as_ref().map(|r| r.calculated_amount), Some(dec!(200)));
        assert_eq!(store.pending(&malakai.id).expect("read").as_ref(), Some(malakai));
        assert!(store.pending(&mason.id).expect("read").is_none());
        assert_eq!(store.record(&bonus.id).expect("read"), Some(bonus));
        assert_eq!(store.records().expect("list").len(), 2);
    }

    #[test]
    fn sale_time_record_cannot_be_corrected() {
        let mut store = InMemoryStore::with_employees(demo_employees());
        let mut participant = seller("emp-1");
        participant.self_generated_lead = true;
        let logged = GpLifecycle::log_sale(&mut store, &sale("J-6", vec![participant])).expect("logged");
        let bonus = &logged.records[0];

        let request = CorrectionRequest {
            final_gp_percent: dec!(40),
            total_revenue: Some(dec!(500)),
        };
        let err = GpLifecycle::correct(&mut store, &bonus.id, &request, date(2025, 1, 20)).unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
        assert_eq!(store.record(&bonus.id).expect("read").as_ref(), Some(bonus));
    }

    #[test]
    fn oversized_revenue_is_rejected_before_any_write() {
        let mut store = InMemoryStore::with_employees(demo_employees());
        let mut participant = seller("emp-1");
        participant.self_generated_lead = true;
        let mut request = sale("J-7", vec![participant]);
        request.total_revenue = Decimal::MAX;

        let err = GpLifecycle::log_sale(&mut store, &request).unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
        assert!(store.records().expect("list").is_empty());
        assert!(store.pending_records().expect("list").is_empty());
    }
}
