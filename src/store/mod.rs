// src/store/mod.rs

//! Storage seam for the engine. Persistence mechanics live outside the crate; the engine
//! only sees get/put/delete per entity keyed by id.

mod memory;

pub use memory::{InMemoryStore, StoreSnapshot};

use crate::models::{CommissionRecord, Employee, PendingGpRecord};

/// Record store the lifecycle manager and ledger operate against. Reads borrow the store,
/// writes need exclusive access, so a caller holding `&mut` is the single writer.
pub trait CommissionRepository {
    fn employee(&self, id: &str) -> Result<Option<Employee>, RepositoryError>;
    fn employees(&self) -> Result<Vec<Employee>, RepositoryError>;
    fn put_employee(&mut self, employee: Employee) -> Result<(), RepositoryError>;
    fn delete_employee(&mut self, id: &str) -> Result<Option<Employee>, RepositoryError>;

    fn pending(&self, id: &str) -> Result<Option<PendingGpRecord>, RepositoryError>;
    fn pending_records(&self) -> Result<Vec<PendingGpRecord>, RepositoryError>;
    fn put_pending(&mut self, record: PendingGpRecord) -> Result<(), RepositoryError>;
    fn delete_pending(&mut self, id: &str) -> Result<Option<PendingGpRecord>, RepositoryError>;

    fn record(&self, id: &str) -> Result<Option<CommissionRecord>, RepositoryError>;
    fn records(&self) -> Result<Vec<CommissionRecord>, RepositoryError>;
    fn put_record(&mut self, record: CommissionRecord) -> Result<(), RepositoryError>;
    fn delete_record(&mut self, id: &str) -> Result<Option<CommissionRecord>, RepositoryError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists: {0}")]
    Conflict(String),
    #[error("record not found: {0}")]
    NotFound(String),
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
