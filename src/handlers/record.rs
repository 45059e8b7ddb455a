use crate::{
    errors::AppResult,
    models::{CommissionRecord, CorrectionOutcome, CorrectionRequest, LedgerSummary, RecordQuery},
    services::{ledger::CommissionLedger, lifecycle::GpLifecycle},
    state::AppState,
};
use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::Utc;

/// List commission records, filtered and sorted
#[utoipa::path(
    get,
    path = "/api/v1/records",
    params(RecordQuery),
    responses(
        (status = 200, description = "Commission records", body = Vec<CommissionRecord>),
        (status = 400, description = "Invalid date range"),
    ),
    tag = "Commission Records"
)]
pub async fn list_records(
    State(state): State<AppState>,
    Query(query): Query<RecordQuery>,
) -> AppResult<Json<Vec<CommissionRecord>>> {
    let store = state.store()?;
    Ok(Json(CommissionLedger::query(&*store, &query)?))
}

/// Totals by status and employee for the filtered records
#[utoipa::path(
    get,
    path = "/api/v1/records/summary",
    params(RecordQuery),
    responses((status = 200, description = "Ledger summary", body = LedgerSummary)),
    tag = "Commission Records"
)]
pub async fn records_summary(
    State(state): State<AppState>,
    Query(query): Query<RecordQuery>,
) -> AppResult<Json<LedgerSummary>> {
    let store = state.store()?;
    let records = CommissionLedger::query(&*store, &query)?;
    Ok(Json(CommissionLedger::summarize(&records)))
}

/// Get a single commission record
#[utoipa::path(
    get,
    path = "/api/v1/records/{record_id}",
    params(("record_id" = String, Path, description = "Commission record ID")),
    responses(
        (status = 200, description = "Commission record", body = CommissionRecord),
        (status = 404, description = "Record not found"),
    ),
    tag = "Commission Records"
)]
pub async fn get_record(
    State(state): State<AppState>,
    Path(record_id): Path<String>,
) -> AppResult<Json<CommissionRecord>> {
    let store = state.store()?;
    Ok(Json(CommissionLedger::get(&*store, &record_id)?))
}

/// Mark a pending commission record as paid
#[utoipa::path(
    post,
    path = "/api/v1/records/{record_id}/paid",
    params(("record_id" = String, Path, description = "Commission record ID")),
    responses(
        (status = 200, description = "Record paid", body = CommissionRecord),
        (status = 404, description = "Record not found"),
        (status = 409, description = "Record already paid or cancelled"),
    ),
    tag = "Commission Records"
)]
pub async fn mark_paid(
    State(state): State<AppState>,
    Path(record_id): Path<String>,
) -> AppResult<Json<CommissionRecord>> {
    let mut store = state.store()?;
    Ok(Json(CommissionLedger::mark_paid(&mut *store, &record_id)?))
}

/// Cancel a pending commission record
#[utoipa::path(
    post,
    path = "/api/v1/records/{record_id}/cancel",
    params(("record_id" = String, Path, description = "Commission record ID")),
    responses(
        (status = 200, description = "Record cancelled", body = CommissionRecord),
        (status = 404, description = "Record not found"),
        (status = 409, description = "Record already paid or cancelled"),
    ),
    tag = "Commission Records"
)]
pub async fn cancel_record(
    State(state): State<AppState>,
    Path(record_id): Path<String>,
) -> AppResult<Json<CommissionRecord>> {
    let mut store = state.store()?;
    Ok(Json(CommissionLedger::cancel(&mut *store, &record_id)?))
}

/// Re-finalize a record with new GP data, subject to the employee's clawback policy
#[utoipa::path(
    post,
    path = "/api/v1/records/{record_id}/correct",
    request_body = CorrectionRequest,
    params(("record_id" = String, Path, description = "Commission record ID")),
    responses(
        (status = 200, description = "Correction result", body = CorrectionOutcome),
        (status = 404, description = "Record not found"),
        (status = 409, description = "Clawback rejected or record cancelled; needs manual review"),
    ),
    tag = "Commission Records"
)]
pub async fn correct_record(
    State(state): State<AppState>,
    Path(record_id): Path<String>,
    Json(body): Json<CorrectionRequest>,
) -> AppResult<Json<CorrectionOutcome>> {
    let today = Utc::now().date_naive();
    let mut store = state.store()?;
    Ok(Json(GpLifecycle::correct(&mut *store, &record_id, &body, today)?))
}
