use crate::{
    auth::TokenService,
    cache::{PostSnapshotCache, TtlCache},
    config::Config,
    store::Database,
};
use std::sync::Arc;

// ============================================================================
// APPLICATION STATE - Shared data across all requests
// ============================================================================
/// Cloned into every handler. Everything inside is either immutable after
/// startup (`tokens`) or internally synchronized (`db`, `posts_cache`).
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub tokens: Arc<TokenService>,
    pub posts_cache: PostSnapshotCache,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self {
            db: Database::new(&config.store),
            tokens: Arc::new(TokenService::new(&config.auth)),
            posts_cache: PostSnapshotCache::new(TtlCache::new(), config.cache_ttl),
        }
    }
}
