use crate::{
    config::Config,
    errors::{AppError, AppResult},
    store::InMemoryStore,
};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Clone)]
pub struct AppState {
    store: Arc<Mutex<InMemoryStore>>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: InMemoryStore, config: Config) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            config: Arc::new(config),
        }
    }

    /// Exclusive access to the record store. Every engine call runs to completion while
    /// the guard is held, so a finalize can never interleave with another writer.
    pub fn store(&self) -> AppResult<MutexGuard<'_, InMemoryStore>> {
        self.store
            .lock()
            .map_err(|_| AppError::Internal("record store lock poisoned".to_string()))
    }
}
