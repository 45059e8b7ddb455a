use crate::{
    errors::AppResult,
    models::Employee,
    services::roster::RosterService,
    state::AppState,
    store::CommissionRepository,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

/// Add an employee with their commission structures
#[utoipa::path(
    post,
    path = "/api/v1/employees",
    request_body = Employee,
    responses(
        (status = 201, description = "Employee created", body = Employee),
        (status = 400, description = "Invalid employee"),
        (status = 409, description = "Employee id already exists"),
        (status = 422, description = "Malformed commission structure"),
    ),
    tag = "Employees"
)]
pub async fn create_employee(
    State(state): State<AppState>,
    Json(body): Json<Employee>,
) -> AppResult<(StatusCode, Json<Employee>)> {
    let mut store = state.store()?;
    let employee = RosterService::create(&mut *store, body)?;
    Ok((StatusCode::CREATED, Json(employee)))
}

/// List all employees
#[utoipa::path(
    get,
    path = "/api/v1/employees",
    responses((status = 200, description = "List of employees", body = Vec<Employee>)),
    tag = "Employees"
)]
pub async fn list_employees(State(state): State<AppState>) -> AppResult<Json<Vec<Employee>>> {
    let store = state.store()?;
    Ok(Json(store.employees()?))
}

/// Get a single employee
#[utoipa::path(
    get,
    path = "/api/v1/employees/{employee_id}",
    params(("employee_id" = String, Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Employee detail", body = Employee),
        (status = 404, description = "Employee not found"),
    ),
    tag = "Employees"
)]
pub async fn get_employee(
    State(state): State<AppState>,
    Path(employee_id): Path<String>,
) -> AppResult<Json<Employee>> {
    let store = state.store()?;
    Ok(Json(RosterService::get(&*store, &employee_id)?))
}

/// Replace an employee's configuration, including their commission structures
#[utoipa::path(
    put,
    path = "/api/v1/employees/{employee_id}",
    request_body = Employee,
    params(("employee_id" = String, Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Employee updated", body = Employee),
        (status = 400, description = "Invalid employee"),
        (status = 404, description = "Employee not found"),
        (status = 422, description = "Malformed commission structure"),
    ),
    tag = "Employees"
)]
pub async fn replace_employee(
    State(state): State<AppState>,
    Path(employee_id): Path<String>,
    Json(body): Json<Employee>,
) -> AppResult<Json<Employee>> {
    let mut store = state.store()?;
    let employee = RosterService::replace(&mut *store, &employee_id, body)?;
    Ok(Json(employee))
}

/// Remove an employee. Their commission records stay in the ledger.
#[utoipa::path(
    delete,
    path = "/api/v1/employees/{employee_id}",
    params(("employee_id" = String, Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Employee removed", body = Employee),
        (status = 404, description = "Employee not found"),
        (status = 409, description = "Employee has sales waiting for final GP"),
    ),
    tag = "Employees"
)]
pub async fn delete_employee(
    State(state): State<AppState>,
    Path(employee_id): Path<String>,
) -> AppResult<Json<Employee>> {
    let mut store = state.store()?;
    Ok(Json(RosterService::remove(&mut *store, &employee_id)?))
}
