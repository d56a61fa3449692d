use crate::{
    AppState,
    auth::Identity,
    dto::{CreatePostRequest, PostCreatedResponse},
    errors::ApiError,
    models::Post,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::info;

/// POST /api/v1/posts/add-post
/// Headers: Authorization: Bearer <token>
/// Body: { "text": "..." }
pub async fn add_post(
    State(state): State<AppState>,
    identity: Identity,
    Json(payload): Json<CreatePostRequest>,
) -> Result<Json<PostCreatedResponse>, ApiError> {
    let session = state.db.session().await?;

    let post = session.posts().create(payload.text, identity.id)?;

    info!("Post created: {} by user {}", post.id, identity.id);

    Ok(Json(PostCreatedResponse {
        post_id: post.id,
        detail: "Post created",
    }))
}

/// GET /api/v1/posts/get-posts
/// Headers: Authorization: Bearer <token>
///
/// Refreshes the all-posts snapshot in the cache, then answers from the
/// store with the caller's own posts only.
pub async fn get_posts(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<Vec<Post>>, ApiError> {
    let session = state.db.session().await?;

    let _snapshot = state.posts_cache.read_through(identity.id, session.posts());

    Ok(Json(session.posts().list_by_owner(identity.id)))
}

/// DELETE /api/v1/posts/delete-post/{post_id}
/// Headers: Authorization: Bearer <token>
pub async fn delete_post(
    State(state): State<AppState>,
    identity: Identity,
    Path(post_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let session = state.db.session().await?;

    session.posts().delete_by_id(post_id, identity.id)?;

    info!("Post deleted: {} by user {}", post_id, identity.id);

    Ok(StatusCode::NO_CONTENT)
}
