// src/services/roster.rs

use std::collections::BTreeSet;

use crate::{
    errors::{EngineError, EngineResult},
    models::Employee,
    services::formula::FormulaEvaluator,
    store::{CommissionRepository, RepositoryError},
};
use tracing::info;

/// Employees and the commission structures they own.
pub struct RosterService;

impl RosterService {
    /// Structure ids are unique per employee and every formula is well formed.
    pub fn validate(employee: &Employee) -> EngineResult<()> {
        if employee.id.trim().is_empty() {
            return Err(EngineError::Validation("employee id is required".to_string()));
        }
        if employee.name.trim().is_empty() {
            return Err(EngineError::Validation("employee name is required".to_string()));
        }

        let mut ids = BTreeSet::new();
        for structure in &employee.commission_structures {
            if !ids.insert(structure.id.as_str()) {
                return Err(EngineError::Validation(format!(
                    "structure id {} appears twice on employee {}",
                    structure.id, employee.id
                )));
            }
            FormulaEvaluator::validate(structure)?;
        }
        Ok(())
    }

    pub fn create<R: CommissionRepository>(
        store: &mut R,
        employee: Employee,
    ) -> EngineResult<Employee> {
        Self::validate(&employee)?;
        if store.employee(&employee.id)?.is_some() {
            return Err(RepositoryError::Conflict(format!("employee {}", employee.id)).into());
        }
        store.put_employee(employee.clone())?;
        info!(
            "Employee {} added with {} commission structures",
            employee.id,
            employee.commission_structures.len()
        );
        Ok(employee)
    }

    /// Replace an existing employee's configuration. Records already computed keep the
    /// values they were computed with.
    pub fn replace<R: CommissionRepository>(
        store: &mut R,
        employee_id: &str,
        employee: Employee,
    ) -> EngineResult<Employee> {
        if employee.id != employee_id {
            return Err(EngineError::Validation(format!(
                "body id {} does not match path id {}",
                employee.id, employee_id
            )));
        }
        Self::validate(&employee)?;
        if store.employee(employee_id)?.is_none() {
            return Err(EngineError::NotFound(format!("employee {}", employee_id)));
        }
        store.put_employee(employee.clone())?;
        info!("Employee {} configuration replaced", employee_id);
        Ok(employee)
    }

    /// Remove an employee. Commission records keep the employee's name; an employee with
    /// sales still waiting for final GP cannot be removed.
    pub fn remove<R: CommissionRepository>(store: &mut R, employee_id: &str) -> EngineResult<Employee> {
        let waiting = store
            .pending_records()?
            .iter()
            .filter(|p| p.employee_id == employee_id)
            .count();
        if waiting > 0 {
            return Err(RepositoryError::Conflict(format!(
                "employee {} has {} sales waiting for final GP",
                employee_id, waiting
            ))
            .into());
        }

        let removed = store
            .delete_employee(employee_id)?
            .ok_or_else(|| EngineError::NotFound(format!("employee {}", employee_id)))?;
        info!("Employee {} removed", employee_id);
        Ok(removed)
    }

    pub fn get<R: CommissionRepository>(store: &R, employee_id: &str) -> EngineResult<Employee> {
        store
            .employee(employee_id)?
            .ok_or_else(|| EngineError::NotFound(format!("employee {}", employee_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{initial::demo_employees, store::InMemoryStore};

    #[test]
    fn duplicate_structure_ids_are_rejected() {
        let mut employee = demo_employees().remove(0);
        let copy = employee.commission_structures[0].clone();
        employee.commission_structures.push(copy);

        let err = RosterService::validate(&employee).unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[test]
    fn create_rejects_existing_employee() {
        let mut store = InMemoryStore::with_employees(demo_employees());
        let err = RosterService::create(&mut store, demo_employees().remove(0)).unwrap_err();
        assert!(matches!(err, EngineError::Repository(RepositoryError::Conflict(_))));
    }

    #[test]
    fn replace_requires_matching_id() {
        let mut store = InMemoryStore::with_employees(demo_employees());
        let err = RosterService::replace(&mut store, "emp-2", demo_employees().remove(0)).unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[test]
    fn employee_with_no_structures_is_valid() {
        let mut employee = demo_employees().remove(0);
        employee.id = "emp-9".to_string();
        employee.commission_structures.clear();
        let mut store = InMemoryStore::new();
        RosterService::create(&mut store, employee).expect("created");
        assert!(RosterService::get(&store, "emp-9").expect("stored").commission_structures.is_empty());
    }

    #[test]
    fn remove_refuses_employee_with_pending_gp() {
        let mut store = InMemoryStore::with_employees(demo_employees());
        store
            .put_pending(crate::models::PendingGpRecord {
                id: "pgp-1".to_string(),
                employee_id: "emp-2".to_string(),
                employee_name: "Malakai".to_string(),
                structure_id: "cs-2-1".to_string(),
                structure_name: "Base GP Tier".to_string(),
                job_identifier: "J-1".to_string(),
                date: chrono::NaiveDate::from_ymd_opt(2025, 1, 10).expect("valid date"),
                total_revenue: rust_decimal_macros::dec!(1000),
                split_share: rust_decimal::Decimal::ONE,
            })
            .expect("saved");

        let err = RosterService::remove(&mut store, "emp-2").unwrap_err();
        assert!(matches!(err, EngineError::Repository(RepositoryError::Conflict(_))));
        assert!(RosterService::get(&store, "emp-2").is_ok());

        let removed = RosterService::remove(&mut store, "emp-1").expect("removed");
        assert_eq!(removed.name, "Mason Lenz");
        assert!(matches!(
            RosterService::remove(&mut store, "emp-1"),
            Err(EngineError::NotFound(_))
        ));
    }
}
