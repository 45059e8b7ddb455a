// src/openapi.rs

use crate::models::{
    CalcType, ClawbackPolicy, CommissionRecord, CommissionStatus, CommissionStructure,
    CorrectionOutcome, CorrectionRequest, Eligibility, Employee, EmployeeTotals, EngineCondition,
    FinalizeBatchRequest, FinalizeGpRequest, FinalizeItem, FinalizeItemResult, FormulaDetails,
    LedgerSummary, LogSaleRequest, PendingGpRecord, SaleLogged, SaleParticipant, SortDirection,
    SortKey, Tier,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Commission Engine API",
        version = "1.0.0",
        description = "Commission calculation API built with Rust and Axum. \
            Evaluates tiered and percentage commission structures, defers GP-based \
            commissions until final gross profit is posted, and keeps an auditable \
            ledger of commission records with clawback-aware corrections.",
        license(name = "MIT")
    ),
    paths(
        // Employees
        crate::handlers::employee::create_employee,
        crate::handlers::employee::list_employees,
        crate::handlers::employee::get_employee,
        crate::handlers::employee::replace_employee,
        crate::handlers::employee::delete_employee,
        // Sales
        crate::handlers::sale::log_sale,
        // Finalize GP
        crate::handlers::sale::list_pending,
        crate::handlers::sale::finalize_pending,
        crate::handlers::sale::finalize_batch,
        // Commission records
        crate::handlers::record::list_records,
        crate::handlers::record::records_summary,
        crate::handlers::record::get_record,
        crate::handlers::record::mark_paid,
        crate::handlers::record::cancel_record,
        crate::handlers::record::correct_record,
    ),
    components(
        schemas(
            Employee, CommissionStructure, ClawbackPolicy, CalcType, Eligibility,
            FormulaDetails, Tier,
            SaleParticipant, LogSaleRequest, SaleLogged, PendingGpRecord,
            FinalizeGpRequest, FinalizeItem, FinalizeBatchRequest, FinalizeItemResult,
            CommissionRecord, CommissionStatus, EngineCondition,
            CorrectionRequest, CorrectionOutcome,
            SortKey, SortDirection, LedgerSummary, EmployeeTotals,
        )
    ),
    tags(
        (name = "Employees", description = "Employees and their commission structures"),
        (name = "Sales", description = "Log sales and compute immediate commissions"),
        (name = "Finalize GP", description = "Post final gross profit for deferred commissions"),
        (name = "Commission Records", description = "Pay, cancel, correct and report on commission records"),
    )
)]
pub struct ApiDoc;
