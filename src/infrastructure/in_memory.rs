use std::collections::HashMap;
use std::sync::Mutex;

use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::order::{Order, User};
use crate::domain::ports::{OrderRepository, OrderStore, UnitOfWork, UserDirectory};
use crate::domain::status::OrderStatus;

#[derive(Debug, Clone, Default)]
struct Snapshot {
    users: HashMap<Uuid, User>,
    orders: HashMap<Uuid, Order>,
}

/// Process-local store. Units of work are serialised behind a mutex and run
/// against a copy of the data that is only published when the work succeeds.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<Snapshot>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a user so it can act as a principal.
    pub fn add_user(&self, username: &str) -> Result<User, DomainError> {
        self.atomically(|store| store.create_user(username))
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Snapshot>, DomainError> {
        self.state
            .lock()
            .map_err(|_| DomainError::Internal("in-memory store lock poisoned".to_string()))
    }
}

impl UnitOfWork for InMemoryStore {
    fn atomically<T, F>(&self, work: F) -> Result<T, DomainError>
    where
        F: FnOnce(&mut dyn OrderStore) -> Result<T, DomainError>,
    {
        let mut committed = self.lock()?;
        let mut tx = committed.clone();
        let result = work(&mut tx)?;
        *committed = tx;
        Ok(result)
    }
}

impl Snapshot {
    fn newest_first(&self, mut keep: impl FnMut(&Order) -> bool) -> Vec<Order> {
        let mut orders: Vec<Order> = self
            .orders
            .values()
            .filter(|&o| keep(o))
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        orders
    }
}

impl UserDirectory for Snapshot {
    fn find_user_by_username(&mut self, username: &str) -> Result<Option<User>, DomainError> {
        Ok(self.users.values().find(|u| u.username == username).cloned())
    }

    fn create_user(&mut self, username: &str) -> Result<User, DomainError> {
        if self.users.values().any(|u| u.username == username) {
            return Err(DomainError::Conflict(format!(
                "Username '{}' is already taken",
                username
            )));
        }
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
        };
        self.users.insert(user.id, user.clone());
        Ok(user)
    }
}

impl OrderRepository for Snapshot {
    fn save(&mut self, order: &Order) -> Result<(), DomainError> {
        let clash = self
            .orders
            .values()
            .any(|o| o.order_number == order.order_number && o.id != order.id);
        if clash {
            return Err(DomainError::Conflict(format!(
                "Order number {} already exists",
                order.order_number
            )));
        }
        self.orders.insert(order.id, order.clone());
        Ok(())
    }

    fn find_by_id(&mut self, id: Uuid) -> Result<Option<Order>, DomainError> {
        Ok(self.orders.get(&id).cloned())
    }

    fn find_by_user(&mut self, user_id: Uuid) -> Result<Vec<Order>, DomainError> {
        Ok(self.newest_first(|o| o.owner.id == user_id))
    }

    fn find_by_user_and_status(
        &mut self,
        user_id: Uuid,
        status: OrderStatus,
    ) -> Result<Vec<Order>, DomainError> {
        Ok(self.newest_first(|o| o.owner.id == user_id && o.status == status))
    }

    fn find_by_order_number(&mut self, order_number: &str) -> Result<Option<Order>, DomainError> {
        Ok(self
            .orders
            .values()
            .find(|o| o.order_number == order_number)
            .cloned())
    }

    fn exists_by_order_number(&mut self, order_number: &str) -> Result<bool, DomainError> {
        Ok(self.orders.values().any(|o| o.order_number == order_number))
    }

    fn count_by_user(&mut self, user_id: Uuid) -> Result<i64, DomainError> {
        Ok(self.orders.values().filter(|o| o.owner.id == user_id).count() as i64)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    #[test]
    fn failed_work_discards_every_write() {
        let store = InMemoryStore::new();
        let user = store.add_user("alice").unwrap();
        let order = Order::new("ORD-1".to_string(), user.clone(), Utc::now());

        let result: Result<(), DomainError> = store.atomically(|tx| {
            tx.save(&order)?;
            Err(DomainError::Internal("boom".to_string()))
        });
        assert!(result.is_err());

        let count = store.atomically(|tx| tx.count_by_user(user.id)).unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn save_rejects_duplicate_order_number() {
        let store = InMemoryStore::new();
        let user = store.add_user("alice").unwrap();
        let first = Order::new("ORD-1".to_string(), user.clone(), Utc::now());
        let second = Order::new("ORD-1".to_string(), user, Utc::now());

        store.atomically(|tx| tx.save(&first)).unwrap();
        let err = store.atomically(|tx| tx.save(&second)).unwrap_err();

        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn duplicate_usernames_are_rejected() {
        let store = InMemoryStore::new();
        store.add_user("alice").unwrap();
        assert!(matches!(
            store.add_user("alice"),
            Err(DomainError::Conflict(_))
        ));
    }
}
