//! In-process tables for users and posts.
//!
//! Every access goes through a [`DbSession`] borrowed from the bounded
//! pool owned by [`Database`]. The session gives its slot back when it is
//! dropped, so early returns and panics release it as well.

mod posts;
mod users;

pub use posts::{MAX_POST_BYTES, PostStore};
pub use users::CredentialStore;

use crate::config::StoreConfig;
use std::{sync::Arc, time::Duration};
use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::warn;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("text is {size} bytes, limit is {limit}")]
    PayloadTooLarge { size: usize, limit: usize },
    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),
    #[error("no database session available within {0:?}")]
    SessionTimeout(Duration),
}

#[derive(Clone)]
pub struct Database {
    users: CredentialStore,
    posts: PostStore,
    pool: Arc<Semaphore>,
    acquire_timeout: Duration,
}

impl Database {
    pub fn new(config: &StoreConfig) -> Self {
        Self {
            users: CredentialStore::new(config.bcrypt_cost),
            posts: PostStore::new(),
            pool: Arc::new(Semaphore::new(config.max_connections)),
            acquire_timeout: config.acquire_timeout,
        }
    }

    /// Waits for a free slot, at most `acquire_timeout`.
    pub async fn session(&self) -> Result<DbSession, StoreError> {
        let permit = tokio::time::timeout(self.acquire_timeout, self.pool.clone().acquire_owned())
            .await
            .map_err(|_| {
                warn!("Database session pool exhausted");
                StoreError::SessionTimeout(self.acquire_timeout)
            })?
            // The semaphore is never closed.
            .map_err(|_| StoreError::SessionTimeout(self.acquire_timeout))?;

        Ok(DbSession {
            users: self.users.clone(),
            posts: self.posts.clone(),
            _permit: permit,
        })
    }

    pub fn available_sessions(&self) -> usize {
        self.pool.available_permits()
    }
}

/// A request-scoped handle on the tables.
pub struct DbSession {
    users: CredentialStore,
    posts: PostStore,
    _permit: OwnedSemaphorePermit,
}

impl DbSession {
    pub fn users(&self) -> &CredentialStore {
        &self.users
    }

    pub fn posts(&self) -> &PostStore {
        &self.posts
    }
}
