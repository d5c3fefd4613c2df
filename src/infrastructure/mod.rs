pub mod in_memory;
pub mod models;
pub mod order_repo;

use std::sync::Arc;

use crate::domain::errors::DomainError;
use crate::domain::ports::{OrderStore, UnitOfWork};

pub use in_memory::InMemoryStore;
pub use order_repo::DieselOrderRepository;

/// The store the HTTP server runs against.
#[derive(Clone)]
pub enum OrderBackend {
    Postgres(DieselOrderRepository),
    InMemory(Arc<InMemoryStore>),
}

impl UnitOfWork for OrderBackend {
    fn atomically<T, F>(&self, work: F) -> Result<T, DomainError>
    where
        F: FnOnce(&mut dyn OrderStore) -> Result<T, DomainError>,
    {
        match self {
            OrderBackend::Postgres(repo) => repo.atomically(work),
            OrderBackend::InMemory(store) => store.atomically(work),
        }
    }
}
