use std::sync::Arc;

use uuid::Uuid;

use super::errors::DomainError;
use super::order::{Order, User};
use super::status::OrderStatus;

/// Resolves an authenticated principal to the user record it names.
pub trait UserDirectory {
    fn find_user_by_username(&mut self, username: &str) -> Result<Option<User>, DomainError>;
    /// Creates the user record for a new principal. A taken username is a
    /// [`DomainError::Conflict`].
    fn create_user(&mut self, username: &str) -> Result<User, DomainError>;
}

/// Persistence of whole order aggregates. Saving an order replaces every
/// previously stored item of that order.
pub trait OrderRepository {
    /// Inserts or updates `order`. A clashing order number is a
    /// [`DomainError::Conflict`].
    fn save(&mut self, order: &Order) -> Result<(), DomainError>;
    fn find_by_id(&mut self, id: Uuid) -> Result<Option<Order>, DomainError>;
    /// Like [`find_by_id`](Self::find_by_id), but the order stays locked
    /// against other units of work until this one ends. Used before a
    /// read-modify-save of the order.
    fn find_by_id_for_update(&mut self, id: Uuid) -> Result<Option<Order>, DomainError> {
        self.find_by_id(id)
    }
    /// Newest first.
    fn find_by_user(&mut self, user_id: Uuid) -> Result<Vec<Order>, DomainError>;
    /// Newest first.
    fn find_by_user_and_status(
        &mut self,
        user_id: Uuid,
        status: OrderStatus,
    ) -> Result<Vec<Order>, DomainError>;
    fn find_by_order_number(&mut self, order_number: &str) -> Result<Option<Order>, DomainError>;
    fn exists_by_order_number(&mut self, order_number: &str) -> Result<bool, DomainError>;
    fn count_by_user(&mut self, user_id: Uuid) -> Result<i64, DomainError>;
}

/// Everything a single unit of work can touch.
pub trait OrderStore: UserDirectory + OrderRepository {}

impl<T: UserDirectory + OrderRepository + ?Sized> OrderStore for T {}

/// Runs work atomically against the backing store: either every write made
/// through the handle is kept, or none is.
pub trait UnitOfWork: Send + Sync + 'static {
    fn atomically<T, F>(&self, work: F) -> Result<T, DomainError>
    where
        F: FnOnce(&mut dyn OrderStore) -> Result<T, DomainError>;
}

impl<U: UnitOfWork> UnitOfWork for Arc<U> {
    fn atomically<T, F>(&self, work: F) -> Result<T, DomainError>
    where
        F: FnOnce(&mut dyn OrderStore) -> Result<T, DomainError>,
    {
        (**self).atomically(work)
    }
}
