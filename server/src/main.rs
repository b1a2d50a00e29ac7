mod db;
mod llm;
mod routes;
mod services;
mod state;

use std::path::PathBuf;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()
        .expect("invalid PORT");
    let media_dir = std::env::var("MEDIA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("./media"));

    let pool = db::init_pool(&database_url)
        .await
        .expect("database init failed");

    // Initialize the vision client (non-fatal: extraction falls back to the
    // built-in fixture when no provider is configured).
    let vision: Option<Arc<dyn llm::VisionExtract>> = match llm::VisionClient::from_env() {
        Ok(client) => {
            tracing::info!(model = client.model(), "vision client initialized");
            Some(Arc::new(client))
        }
        Err(e) => {
            tracing::warn!(error = %e, "vision client not configured — using fixture extraction");
            None
        }
    };

    let state = state::AppState::new(pool, vision, media_dir);

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "roofquote listening");
    axum::serve(listener, app).await.expect("server failed");
}
