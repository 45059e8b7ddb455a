// src/routes/mod.rs

use crate::{
    handlers::{
        employee::{
            create_employee, delete_employee, get_employee, list_employees, replace_employee,
        },
        record::{
            cancel_record, correct_record, get_record, list_records, mark_paid, records_summary,
        },
        sale::{finalize_batch, finalize_pending, list_pending, log_sale},
    },
    state::AppState,
};
use axum::{
    Router,
    routing::{get, post},
};

pub fn api_routes() -> Router<AppState> {
    Router::new()
        // ─── Employees ────────────────────────────────────────
        .route("/employees", post(create_employee).get(list_employees))
        .route(
            "/employees/{employee_id}",
            get(get_employee)
                .put(replace_employee)
                .delete(delete_employee),
        )
        // ─── Sales ────────────────────────────────────────────
        .route("/sales", post(log_sale))
        // ─── Finalize GP ──────────────────────────────────────
        .route("/pending-gp", get(list_pending))
        .route("/pending-gp/finalize", post(finalize_batch))
        .route("/pending-gp/{pending_id}/finalize", post(finalize_pending))
        // ─── Commission Records ───────────────────────────────
        .route("/records", get(list_records))
        .route("/records/summary", get(records_summary))
        .route("/records/{record_id}", get(get_record))
        .route("/records/{record_id}/paid", post(mark_paid))
        .route("/records/{record_id}/cancel", post(cancel_record))
        .route("/records/{record_id}/correct", post(correct_record))
}
