// Project Board Server

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use projectboard::{api::create_router, app_state::AppState, config::Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize application state
    let app_state = AppState::new(config.clone()).await?;
    let app = create_router(app_state);

    // Start server
    let addr = config.server_address();
    info!("Project board server starting on http://{}", addr);
    info!("  GET    /health");
    info!("  GET    /users, /users/{{username}}, /users/{{username}}/follows");
    info!("  POST   /projects, /posts, /comments/for-post/{{id}}");
    info!("  GET    /feed/posts?type=time|likes&start=N&count=M");

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
