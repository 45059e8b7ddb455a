// src/store/memory.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{CommissionRepository, RepositoryError};
use crate::models::{CommissionRecord, Employee, PendingGpRecord};

/// Whole-state shape used to load or export the store as JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSnapshot {
    #[serde(default)]
    pub employees: Vec<Employee>,
    #[serde(default)]
    pub records: Vec<CommissionRecord>,
    #[serde(default)]
    pub pending_gp_records: Vec<PendingGpRecord>,
}

/// BTreeMap-backed repository. Iteration order is id order, which keeps listings stable.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    employees: BTreeMap<String, Employee>,
    pending: BTreeMap<String, PendingGpRecord>,
    records: BTreeMap<String, CommissionRecord>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_employees(employees: impl IntoIterator<Item = Employee>) -> Self {
        let mut store = Self::new();
        for employee in employees {
            store.employees.insert(employee.id.clone(), employee);
        }
        store
    }

    pub fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        let mut store = Self::with_employees(snapshot.employees);
        for record in snapshot.records {
            store.records.insert(record.id.clone(), record);
        }
        for pending in snapshot.pending_gp_records {
            store.pending.insert(pending.id.clone(), pending);
        }
        store
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            employees: self.employees.values().cloned().collect(),
            records: self.records.values().cloned().collect(),
            pending_gp_records: self.pending.values().cloned().collect(),
        }
    }
}

impl CommissionRepository for InMemoryStore {
    fn employee(&self, id: &str) -> Result<Option<Employee>, RepositoryError> {
        Ok(self.employees.get(id).cloned())
    }

    fn employees(&self) -> Result<Vec<Employee>, RepositoryError> {
        Ok(self.employees.values().cloned().collect())
    }

    fn put_employee(&mut self, employee: Employee) -> Result<(), RepositoryError> {
        self.employees.insert(employee.id.clone(), employee);
        Ok(())
    }

    fn delete_employee(&mut self, id: &str) -> Result<Option<Employee>, RepositoryError> {
        Ok(self.employees.remove(id))
    }

    fn pending(&self, id: &str) -> Result<Option<PendingGpRecord>, RepositoryError> {
        Ok(self.pending.get(id).cloned())
    }

    fn pending_records(&self) -> Result<Vec<PendingGpRecord>, RepositoryError> {
        Ok(self.pending.values().cloned().collect())
    }

    fn put_pending(&mut self, record: PendingGpRecord) -> Result<(), RepositoryError> {
        self.pending.insert(record.id.clone(), record);
        Ok(())
    }

    fn delete_pending(&mut self, id: &str) -> Result<Option<PendingGpRecord>, RepositoryError> {
        Ok(self.pending.remove(id))
    }

    fn record(&self, id: &str) -> Result<Option<CommissionRecord>, RepositoryError> {
        Ok(self.records.get(id).cloned())
    }

    fn records(&self) -> Result<Vec<CommissionRecord>, RepositoryError> {
        Ok(self.records.values().cloned().collect())
    }

    fn put_record(&mut self, record: CommissionRecord) -> Result<(), RepositoryError> {
        self.records.insert(record.id.clone(), record);
        Ok(())
    }

    fn delete_record(&mut self, id: &str) -> Result<Option<CommissionRecord>, RepositoryError> {
        Ok(self.records.remove(id))
    }
}
