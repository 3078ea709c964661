pub mod profile;
pub mod survey;

use axum::Router;

use crate::state::AppState;

pub fn api_router() -> Router<AppState> {
    Router::new()
        .nest("/profile", profile::router())
        .nest("/survey", survey::router())
}
