pub mod error;
pub mod routes;
pub mod state;

use axum::routing::{get, post};
use axum::Router;
use sequence_core::Db;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Path prefix shared by every route.
pub const API_VERSION: &str = "/v1";

/// Build the axum Router with all API routes and middleware.
/// Used by `serve()` and available for integration testing.
///
/// There is no authentication on any route.
pub fn build_router(db: Db) -> Router {
    let app_state = state::AppState::new(db);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/v1", get(routes::index))
        .route("/v1/", get(routes::index))
        // Sequences
        .route(
            "/v1/sequences",
            post(routes::sequences::create_sequence),
        )
        .route(
            "/v1/sequences/{id}",
            get(routes::sequences::view_sequence_with_steps)
                .put(routes::sequences::update_sequence),
        )
        // Steps
        .route("/v1/sequence-steps", post(routes::steps::create_step))
        .route(
            "/v1/sequence-steps/{id}",
            get(routes::steps::view_step)
                .put(routes::steps::update_step)
                .delete(routes::steps::delete_step),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

/// Bind `addr` and serve until ctrl-c.
pub async fn serve(db: Db, addr: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    serve_on(db, listener).await
}

/// Serve on a pre-bound listener.
///
/// Unlike `serve`, this accepts a `TcpListener` that was already bound so the
/// caller can read the actual port before starting (useful when `port = 0` and
/// the OS picks a free port).
pub async fn serve_on(db: Db, listener: tokio::net::TcpListener) -> anyhow::Result<()> {
    let local = listener.local_addr()?;
    let app = build_router(db);

    tracing::info!("sequences API listening on http://{local}{API_VERSION}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
