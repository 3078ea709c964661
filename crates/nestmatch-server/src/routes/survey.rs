use axum::{extract::State, routing::get, Json, Router};
use nestmatch_core::SurveyScript;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/questions", get(list_questions))
}

pub async fn list_questions(State(state): State<AppState>) -> Json<SurveyScript> {
    Json(state.script.as_ref().clone())
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        Router,
    };
    use nestmatch_core::{SurveyScript, TraitInferenceEngine};
    use serde_json::Value;
    use tower::util::ServiceExt;

    use crate::state::AppState;

    #[tokio::test]
    async fn test_list_questions() {
        let state = AppState::new(
            "nestmatch-test",
            SurveyScript::lifestyle(),
            TraitInferenceEngine::seeded(0),
        );
        let app = Router::new()
            .nest("/api/survey", super::router())
            .with_state(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/survey/questions")
                    .body(Body::empty())
                    .expect("build request"),
            )
            .await
            .expect("send request");
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        let body: Value = serde_json::from_slice(&bytes).expect("json body");
        let questions = body.as_array().expect("question list");
        assert_eq!(questions.len(), 5);
        assert_eq!(questions[0]["field"], "sleep");
        assert_eq!(questions[2]["options"][0]["value"], 5);
    }
}
