use std::{fs, net::SocketAddr, path::Path, time::Duration};

use anyhow::{anyhow, Context, Result};
use nestmatch_gateway::SubmissionConfig;
use serde::{Deserialize, Serialize};

use crate::runner::DEFAULT_PACING;
use crate::script::SurveyScript;
use crate::session::{SessionPrompts, DEFAULT_COMPLETION, DEFAULT_WELCOME};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub name: String,
    pub env: String,
}

fn default_server_addr() -> String {
    "127.0.0.1:8000".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_addr")]
    pub addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_server_addr(),
        }
    }
}

fn default_pacing_ms() -> u64 {
    DEFAULT_PACING.as_millis() as u64
}

fn default_welcome() -> String {
    DEFAULT_WELCOME.to_string()
}

fn default_completion() -> String {
    DEFAULT_COMPLETION.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurveyConfig {
    /// Delay between recording an answer and showing the next question.
    #[serde(default = "default_pacing_ms")]
    pub pacing_ms: u64,
    #[serde(default = "default_welcome")]
    pub welcome: String,
    #[serde(default = "default_completion")]
    pub completion: String,
}

impl Default for SurveyConfig {
    fn default() -> Self {
        Self {
            pacing_ms: default_pacing_ms(),
            welcome: default_welcome(),
            completion: default_completion(),
        }
    }
}

impl SurveyConfig {
    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }

    pub fn prompts(&self) -> SessionPrompts {
        SessionPrompts {
            welcome: self.welcome.clone(),
            completion: self.completion.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EnrichmentConfig {
    /// Fixed seed for reproducible inference. Unset means OS entropy.
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MainConfig {
    pub app: AppConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub survey: SurveyConfig,
    #[serde(default)]
    pub submission: SubmissionConfig,
    #[serde(default)]
    pub enrichment: EnrichmentConfig,
}

#[derive(Debug, Clone)]
pub struct NestmatchConfig {
    pub main: MainConfig,
    pub script: SurveyScript,
}

/// Expand `${NAME}` placeholders from the environment. Unset variables
/// expand to nothing; text after an unterminated `${` is left as written.
pub fn resolve_env_var(raw: &str) -> String {
    let mut resolved = String::with_capacity(raw.len());
    let mut remaining = raw;

    loop {
        let Some((literal, after_open)) = remaining.split_once("${") else {
            resolved.push_str(remaining);
            break;
        };
        let Some((name, after_close)) = after_open.split_once('}') else {
            resolved.push_str(remaining);
            break;
        };
        resolved.push_str(literal);
        resolved.push_str(&std::env::var(name).unwrap_or_default());
        remaining = after_close;
    }

    resolved
}

/// Load `main.yaml` and `survey.yaml` from `root`. A missing `survey.yaml`
/// falls back to the built-in lifestyle survey.
pub fn load_config(root: &Path) -> Result<NestmatchConfig> {
    let mut main: MainConfig = read_yaml_file(&root.join("main.yaml"))?;
    resolve_main_env(&mut main);

    let script_path = root.join("survey.yaml");
    let script = if script_path.exists() {
        read_yaml_file::<SurveyScript>(&script_path)?
    } else {
        tracing::debug!(path = %script_path.display(), "no survey.yaml, using built-in survey");
        SurveyScript::lifestyle()
    };

    let config = NestmatchConfig { main, script };
    validate_config(&config)?;
    Ok(config)
}

pub fn validate_config(config: &NestmatchConfig) -> Result<()> {
    config
        .main
        .server
        .addr
        .parse::<SocketAddr>()
        .with_context(|| format!("invalid server addr: {}", config.main.server.addr))?;

    let submission = &config.main.submission;
    if submission.enabled && submission.base_url.trim().is_empty() {
        return Err(anyhow!("submission is enabled but base_url is empty"));
    }
    if submission.timeout_secs == 0 {
        return Err(anyhow!("submission timeout_secs must be positive"));
    }

    if !config.script.questions().iter().any(|q| q.field == "sleep") {
        tracing::warn!("survey has no `sleep` field; trait inference will not run on its answers");
    }

    Ok(())
}

fn read_yaml_file<T>(path: &Path) -> Result<T>
where
    T: for<'de> Deserialize<'de>,
{
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;
    serde_yaml::from_str(&content)
        .with_context(|| format!("failed to parse yaml file: {}", path.display()))
}

fn resolve_main_env(main: &mut MainConfig) {
    main.app.name = resolve_env_var(&main.app.name);
    main.app.env = resolve_env_var(&main.app.env);
    main.server.addr = resolve_env_var(&main.server.addr);
    main.submission.base_url = resolve_env_var(&main.submission.base_url);
}
