use crate::domain::errors::DomainError;
use crate::domain::order::User;
use crate::domain::ports::{UnitOfWork, UserDirectory};

/// Longest username the user directory accepts.
pub const MAX_USERNAME_LEN: usize = 100;

/// Creates the user records principals are resolved against. Credentials live
/// with the authentication layer; only the username is kept here.
pub struct UserService<U> {
    store: U,
}

impl<U: UnitOfWork> UserService<U> {
    pub fn new(store: U) -> Self {
        Self { store }
    }

    pub fn register(&self, username: &str) -> Result<User, DomainError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(DomainError::InvalidInput(
                "Username must not be blank".to_string(),
            ));
        }
        if username.chars().count() > MAX_USERNAME_LEN {
            return Err(DomainError::InvalidInput(format!(
                "Username must be at most {} characters",
                MAX_USERNAME_LEN
            )));
        }

        let user = self.store.atomically(|store| store.create_user(username))?;
        log::info!("Registered user: {}", user.username);
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::infrastructure::in_memory::InMemoryStore;

    fn setup() -> (Arc<InMemoryStore>, UserService<Arc<InMemoryStore>>) {
        let store = Arc::new(InMemoryStore::new());
        (Arc::clone(&store), UserService::new(store))
    }

    #[test]
    fn registered_user_can_be_resolved() {
        let (store, users) = setup();
        let user = users.register("  carol ").unwrap();
        assert_eq!(user.username, "carol");

        let found = store
            .atomically(|tx| tx.find_user_by_username("carol"))
            .unwrap();
        assert_eq!(found, Some(user));
    }

    #[test]
    fn duplicate_username_is_conflict() {
        let (_, users) = setup();
        users.register("carol").unwrap();
        assert!(matches!(
            users.register("carol"),
            Err(DomainError::Conflict(_))
        ));
    }

    #[test]
    fn blank_or_long_username_is_invalid() {
        let (_, users) = setup();
        assert!(matches!(
            users.register("   "),
            Err(DomainError::InvalidInput(_))
        ));
        assert!(matches!(
            users.register(&"x".repeat(MAX_USERNAME_LEN + 1)),
            Err(DomainError::InvalidInput(_))
        ));
    }
}
