use super::StoreError;
use crate::models::Post;
use dashmap::DashMap;
use std::sync::{
    Arc,
    atomic::{AtomicI64, Ordering},
};

/// Upper bound on post text, in UTF-8 bytes (1 MiB).
pub const MAX_POST_BYTES: usize = 1_048_576;

/// `posts(id, text, user_id -> users.id)`
#[derive(Clone)]
pub struct PostStore {
    posts: Arc<DashMap<i64, Post>>,
    next_id: Arc<AtomicI64>,
}

impl Default for PostStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PostStore {
    pub fn new() -> Self {
        Self {
            posts: Arc::new(DashMap::new()),
            next_id: Arc::new(AtomicI64::new(1)),
        }
    }

    pub fn create(&self, text: String, owner_id: i64) -> Result<Post, StoreError> {
        if text.len() > MAX_POST_BYTES {
            return Err(StoreError::PayloadTooLarge {
                size: text.len(),
                limit: MAX_POST_BYTES,
            });
        }

        let post = Post {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            text,
            user_id: owner_id,
        };
        self.posts.insert(post.id, post.clone());

        Ok(post)
    }

    pub fn list_by_owner(&self, owner_id: i64) -> Vec<Post> {
        self.collect(|post| post.user_id == owner_id)
    }

    /// Every post of every user. Only the cache snapshot reads this.
    pub fn list_all(&self) -> Vec<Post> {
        self.collect(|_| true)
    }

    /// Missing and not-owned are both `NotFound`.
    pub fn delete_by_id(&self, post_id: i64, owner_id: i64) -> Result<(), StoreError> {
        self.posts
            .remove_if(&post_id, |_, post| post.user_id == owner_id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    fn collect(&self, keep: impl Fn(&Post) -> bool) -> Vec<Post> {
        let mut posts: Vec<Post> = self
            .posts
            .iter()
            .filter(|entry| keep(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();

        posts.sort_by_key(|post| post.id);
        posts
    }
}
