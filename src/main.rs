use anyhow::Context;
use postbox::{AppState, Config, router};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("postbox=info,tower_http=info")),
        )
        .with_target(false)
        .compact()
        .init();

    let config = Config::from_env().context("failed to load configuration")?;

    let state = AppState::new(&config);
    let app = router(state, &config);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    info!("Server running on http://{}", config.bind_addr);
    info!("API Endpoints:");
    info!("  GET    /health                            - Health check");
    info!("  POST   /api/v1/users/register             - Create account");
    info!("  POST   /api/v1/users/login                - Login");
    info!("  POST   /api/v1/posts/add-post             - Create post (auth)");
    info!("  GET    /api/v1/posts/get-posts            - List own posts (auth)");
    info!("  DELETE /api/v1/posts/delete-post/:post_id - Delete post (auth, owner only)");

    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
