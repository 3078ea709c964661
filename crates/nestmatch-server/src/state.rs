use std::sync::{Arc, Mutex};

use nestmatch_core::{NestmatchConfig, SurveyScript, TraitInferenceEngine};

/// Shared application state accessible from all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub app_name: String,
    /// Script served to survey clients.
    pub script: Arc<SurveyScript>,
    /// Shared by every request. Draws are serialized through the lock.
    pub engine: Arc<Mutex<TraitInferenceEngine>>,
}

impl AppState {
    pub fn new(
        app_name: impl Into<String>,
        script: SurveyScript,
        engine: TraitInferenceEngine,
    ) -> Self {
        Self {
            app_name: app_name.into(),
            script: Arc::new(script),
            engine: Arc::new(Mutex::new(engine)),
        }
    }

    pub fn from_config(config: &NestmatchConfig) -> Self {
        Self::new(
            config.main.app.name.clone(),
            config.script.clone(),
            TraitInferenceEngine::from_seed_option(config.main.enrichment.seed),
        )
    }
}
