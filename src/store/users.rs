use super::StoreError;
use crate::models::User;
use bcrypt::{hash, verify};
use dashmap::{DashMap, mapref::entry::Entry};
use std::sync::{
    Arc,
    atomic::{AtomicI64, Ordering},
};
use tracing::{error, info};

/// `users(id, email unique, password_hash)`
#[derive(Clone)]
pub struct CredentialStore {
    users: Arc<DashMap<i64, User>>,
    email_index: Arc<DashMap<String, i64>>, // Quick Lookup by Email
    next_id: Arc<AtomicI64>,
    bcrypt_cost: u32,
}

impl CredentialStore {
    pub fn new(bcrypt_cost: u32) -> Self {
        Self {
            users: Arc::new(DashMap::new()),
            email_index: Arc::new(DashMap::new()),
            next_id: Arc::new(AtomicI64::new(1)),
            bcrypt_cost,
        }
    }

    pub fn register(&self, email: &str, password: &str) -> Result<User, StoreError> {
        if self.email_index.contains_key(email) {
            return Err(StoreError::Conflict);
        }

        let password_hash = hash(password, self.bcrypt_cost)?;

        // Uniqueness is decided here, under the shard lock.
        let user = match self.email_index.entry(email.to_string()) {
            Entry::Occupied(_) => return Err(StoreError::Conflict),
            Entry::Vacant(slot) => {
                let user = User {
                    id: self.next_id.fetch_add(1, Ordering::Relaxed),
                    email: email.to_string(),
                    password_hash,
                };
                self.users.insert(user.id, user.clone());
                slot.insert(user.id);
                user
            }
        };

        info!(user_id = user.id, "User registered");
        Ok(user)
    }

    pub fn lookup(&self, email: &str) -> Option<User> {
        let id = *self.email_index.get(email)?;
        self.users.get(&id).map(|user| user.clone())
    }

    /// `None` both for an unknown email and for a wrong password.
    pub fn verify(&self, email: &str, password: &str) -> Option<User> {
        let user = self.lookup(email)?;

        match verify(password, &user.password_hash) {
            Ok(true) => Some(user),
            Ok(false) => None,
            Err(e) => {
                error!(user_id = user.id, "Stored password hash is unreadable: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> CredentialStore {
        CredentialStore::new(4)
    }

    #[test]
    fn register_stores_only_a_hash() {
        let users = store();
        let user = users.register("a@x.com", "pw").unwrap();

        assert_eq!(user.id, 1);
        assert_eq!(user.email, "a@x.com");
        assert_ne!(user.password_hash, "pw");
        assert!(user.password_hash.starts_with("$2"));
    }

    #[test]
    fn registering_the_same_email_twice_conflicts() {
        let users = store();
        users.register("a@x.com", "pw").unwrap();

        let second = users.register("a@x.com", "other");
        assert!(matches!(second, Err(StoreError::Conflict)));
    }

    #[test]
    fn ids_are_sequential() {
        let users = store();
        let first = users.register("a@x.com", "pw").unwrap();
        let second = users.register("b@x.com", "pw").unwrap();
        assert_eq!(second.id, first.id + 1);
    }

    #[test]
    fn lookup_finds_registered_users_only() {
        let users = store();
        let user = users.register("a@x.com", "pw").unwrap();

        assert_eq!(users.lookup("a@x.com").map(|u| u.id), Some(user.id));
        assert!(users.lookup("nobody@x.com").is_none());
    }

    #[test]
    fn verify_accepts_the_right_password() {
        let users = store();
        let user = users.register("a@x.com", "pw").unwrap();

        assert_eq!(users.verify("a@x.com", "pw").map(|u| u.id), Some(user.id));
    }

    #[test]
    fn verify_does_not_tell_unknown_email_from_wrong_password() {
        let users = store();
        users.register("a@x.com", "pw").unwrap();

        assert!(users.verify("a@x.com", "wrong").is_none());
        assert!(users.verify("nobody@x.com", "pw").is_none());
    }

    #[test]
    fn serialized_user_omits_the_hash() {
        let user = store().register("a@x.com", "pw").unwrap();
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
    }
}
