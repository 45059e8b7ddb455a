use crate::{
    errors::{AppError, AppResult},
    models::{
        CommissionRecord, FinalizeBatchRequest, FinalizeGpRequest, FinalizeItemResult,
        LogSaleRequest, PendingGpRecord, SaleLogged,
    },
    services::lifecycle::GpLifecycle,
    state::AppState,
    store::CommissionRepository,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

/// Log a sale. GP-based structures wait for final GP; the rest are computed immediately.
#[utoipa::path(
    post,
    path = "/api/v1/sales",
    request_body = LogSaleRequest,
    responses(
        (status = 201, description = "Sale logged", body = SaleLogged),
        (status = 400, description = "Invalid sale"),
        (status = 404, description = "Employee not found"),
        (status = 422, description = "Malformed commission structure"),
    ),
    tag = "Sales"
)]
pub async fn log_sale(
    State(state): State<AppState>,
    Json(body): Json<LogSaleRequest>,
) -> AppResult<(StatusCode, Json<SaleLogged>)> {
    let mut store = state.store()?;
    let logged = GpLifecycle::log_sale(&mut *store, &body)?;
    Ok((StatusCode::CREATED, Json(logged)))
}

/// List sales still waiting for final GP
#[utoipa::path(
    get,
    path = "/api/v1/pending-gp",
    responses((status = 200, description = "Pending GP records", body = Vec<PendingGpRecord>)),
    tag = "Finalize GP"
)]
pub async fn list_pending(State(state): State<AppState>) -> AppResult<Json<Vec<PendingGpRecord>>> {
    let store = state.store()?;
    Ok(Json(store.pending_records()?))
}

/// Post final GP for one pending sale
#[utoipa::path(
    post,
    path = "/api/v1/pending-gp/{pending_id}/finalize",
    request_body = FinalizeGpRequest,
    params(("pending_id" = String, Path, description = "Pending GP record ID")),
    responses(
        (status = 201, description = "Commission record created", body = CommissionRecord),
        (status = 404, description = "Pending record not found or already finalized"),
        (status = 422, description = "Malformed commission structure"),
    ),
    tag = "Finalize GP"
)]
pub async fn finalize_pending(
    State(state): State<AppState>,
    Path(pending_id): Path<String>,
    Json(body): Json<FinalizeGpRequest>,
) -> AppResult<(StatusCode, Json<CommissionRecord>)> {
    let mut store = state.store()?;
    let record = GpLifecycle::finalize(&mut *store, &pending_id, body.final_gp_percent)?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// Post final GP for several pending sales; each item reports its own result
#[utoipa::path(
    post,
    path = "/api/v1/pending-gp/finalize",
    request_body = FinalizeBatchRequest,
    responses(
        (status = 200, description = "Per-item results", body = Vec<FinalizeItemResult>),
        (status = 400, description = "Empty batch"),
    ),
    tag = "Finalize GP"
)]
pub async fn finalize_batch(
    State(state): State<AppState>,
    Json(body): Json<FinalizeBatchRequest>,
) -> AppResult<Json<Vec<FinalizeItemResult>>> {
    if body.items.is_empty() {
        return Err(AppError::BadRequest("batch has no items".to_string()));
    }
    let mut store = state.store()?;
    Ok(Json(GpLifecycle::finalize_batch(&mut *store, &body.items)))
}
