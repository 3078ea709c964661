pub mod routes;
pub mod state;

use anyhow::Result;
use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(banner))
        .nest("/api", routes::api_router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(state: AppState, addr: &str) -> Result<()> {
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("nestmatch-server listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn banner(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "message": format!("{} API is running", state.app_name) }))
}
