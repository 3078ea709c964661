use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use nestmatch_core::EnrichError;
use serde_json::{json, Value};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(create_profile))
}

/// Accepts a guest profile carrying `sleep`, fills in the derived
/// lifestyle traits and returns the enriched profile.
pub async fn create_profile(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    let Json(profile) = match body {
        Ok(body) => body,
        Err(rejection) => return error_response(StatusCode::BAD_REQUEST, rejection.body_text()),
    };

    let enriched = {
        let Ok(mut engine) = state.engine.lock() else {
            tracing::error!("inference engine lock poisoned");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "inference unavailable");
        };
        engine.enrich_profile(profile)
    };

    match enriched {
        Ok(profile) => {
            let name = profile.get("name").and_then(Value::as_str).unwrap_or("-");
            tracing::info!(name, "profile enriched");
            (StatusCode::CREATED, Json(profile)).into_response()
        }
        Err(err @ EnrichError::InvalidProfile { .. }) => {
            error_response(StatusCode::BAD_REQUEST, err.to_string())
        }
        Err(err) => {
            tracing::error!(error = %err, "profile enrichment failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}
