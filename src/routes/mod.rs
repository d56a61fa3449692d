mod health;
mod post;
mod user;

pub use health::health_check;
pub use post::{add_post, delete_post, get_posts};
pub use user::{login, register};

use crate::{AppState, config::Config};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::StatusCode,
    routing::{delete, get, post},
};
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

/// Request bodies may be well over the post size limit once JSON-escaped;
/// the byte check happens in the post store.
const MAX_REQUEST_BYTES: usize = 8 * 1024 * 1024;

pub fn router(state: AppState, config: &Config) -> Router {
    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let users = Router::new()
        .route("/register", post(register))
        .route("/login", post(login));

    let posts = Router::new()
        .route("/add-post", post(add_post))
        .route("/get-posts", get(get_posts))
        .route("/delete-post/{post_id}", delete(delete_post));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1/users", users)
        .nest("/api/v1/posts", posts)
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BYTES))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            config.request_timeout,
        ))
        // One semaphore shared by every route.
        .layer(GlobalConcurrencyLimitLayer::new(config.max_concurrent_requests))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
