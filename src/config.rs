use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow};
use jsonschema::{JSONSchema, ValidationError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::analysis::{DEFAULT_KEYWORDS_TOP_N, credentials::CredentialRef};

const SCHEMA_FILE_NAME: &str = "insight-flow.schema.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub worker: WorkerConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

fn default_enabled_true() -> bool {
    true
}

fn default_logging_dir() -> PathBuf {
    PathBuf::from("./logs")
}

fn default_logging_filter() -> String {
    "info".to_string()
}

fn default_logging_rotation() -> LoggingRotation {
    LoggingRotation::Daily
}

fn default_logging_retention_days() -> usize {
    14
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum LoggingRotation {
    Daily,
    Hourly,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_logging_filter")]
    pub filter: String,
    #[serde(default = "default_logging_rotation")]
    pub rotation: LoggingRotation,
    #[serde(default = "default_logging_retention_days")]
    pub retention_days: usize,
    #[serde(default = "default_enabled_true")]
    pub stderr_warn_enabled: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: default_logging_dir(),
            filter: default_logging_filter(),
            rotation: default_logging_rotation(),
            retention_days: default_logging_retention_days(),
            stderr_warn_enabled: true,
        }
    }
}

fn default_summarizer() -> String {
    "rule_based_summarizer".to_string()
}

fn default_sentiment_analyzer() -> String {
    "lexicon_sentiment_analyzer".to_string()
}

fn default_keyword_extractor() -> String {
    "lexicon_keyword_extractor".to_string()
}

fn default_intent_recognizer() -> String {
    "rule_based_intent_recognizer".to_string()
}

fn default_recommender() -> String {
    "rule_based_recommender".to_string()
}

fn default_keywords_top_n() -> usize {
    DEFAULT_KEYWORDS_TOP_N
}

/// Selects one implementation per capability plus the parameters those
/// implementations are built from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_summarizer")]
    pub summarizer: String,
    #[serde(default = "default_sentiment_analyzer")]
    pub sentiment_analyzer: String,
    #[serde(default = "default_keyword_extractor")]
    pub keyword_extractor: String,
    #[serde(default = "default_intent_recognizer")]
    pub intent_recognizer: String,
    #[serde(default = "default_recommender")]
    pub recommender: String,
    #[serde(default = "default_keywords_top_n")]
    pub keywords_top_n: usize,
    #[serde(default)]
    pub sentiment: SentimentStageConfig,
    #[serde(default)]
    pub openai: OpenAiStageConfig,
    #[serde(default)]
    pub recommender_data: RecommenderDataConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            summarizer: default_summarizer(),
            sentiment_analyzer: default_sentiment_analyzer(),
            keyword_extractor: default_keyword_extractor(),
            intent_recognizer: default_intent_recognizer(),
            recommender: default_recommender(),
            keywords_top_n: default_keywords_top_n(),
            sentiment: SentimentStageConfig::default(),
            openai: OpenAiStageConfig::default(),
            recommender_data: RecommenderDataConfig::default(),
        }
    }
}

fn default_sentiment_model_name() -> String {
    "distilbert-base-uncased-finetuned-sst2".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentStageConfig {
    #[serde(default = "default_sentiment_model_name")]
    pub model_name: String,
}

impl Default for SentimentStageConfig {
    fn default() -> Self {
        Self {
            model_name: default_sentiment_model_name(),
        }
    }
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_openai_timeout_ms() -> u64 {
    30_000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiStageConfig {
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
    #[serde(default = "default_openai_model")]
    pub model: String,
    #[serde(default)]
    pub credential: CredentialRef,
    #[serde(default = "default_openai_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for OpenAiStageConfig {
    fn default() -> Self {
        Self {
            base_url: default_openai_base_url(),
            model: default_openai_model(),
            credential: CredentialRef::default(),
            timeout_ms: default_openai_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecommenderDataConfig {
    #[serde(default)]
    pub product_catalog_path: Option<PathBuf>,
    #[serde(default)]
    pub customer_segments_path: Option<PathBuf>,
}

fn default_queue_capacity() -> usize {
    64
}

fn default_task_timeout_ms() -> u64 {
    120_000
}

fn default_socket_path() -> PathBuf {
    PathBuf::from("insight-flow.sock")
}

fn default_callback_timeout_ms() -> u64 {
    30_000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    #[serde(default = "default_enabled_true")]
    pub enabled: bool,
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    #[serde(default = "default_task_timeout_ms")]
    pub task_timeout_ms: u64,
    #[serde(default = "default_socket_path")]
    pub socket_path: PathBuf,
    /// Status callback endpoint. Reporting is disabled when unset.
    #[serde(default)]
    pub callback_url: Option<String>,
    #[serde(default = "default_callback_timeout_ms")]
    pub callback_timeout_ms: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            queue_capacity: default_queue_capacity(),
            task_timeout_ms: default_task_timeout_ms(),
            socket_path: default_socket_path(),
            callback_url: None,
            callback_timeout_ms: default_callback_timeout_ms(),
        }
    }
}

fn default_bind_addr() -> String {
    "127.0.0.1:8000".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_enabled_true")]
    pub enabled: bool,
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_addr: default_bind_addr(),
        }
    }
}

impl Config {
    pub fn load(config_path: &Path) -> Result<Self> {
        let config_content = fs::read_to_string(config_path)
            .with_context(|| format!("failed to read {}", config_path.display()))?;
        let config_value: Value = json5::from_str(&config_content)
            .with_context(|| format!("failed to parse {}", config_path.display()))?;

        let config_base = config_path.parent().unwrap_or_else(|| Path::new("."));
        let schema_path = resolve_schema_path(config_base, &config_value)?;
        validate_against_schema(&config_value, &schema_path)?;

        let mut config: Config =
            serde_json::from_value(config_value).context("failed to deserialize config")?;
        config.resolve_relative_paths(config_base);

        Ok(config)
    }

    /// Like [`Config::load`], but a missing file yields the built-in defaults.
    pub fn load_or_default(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            Self::load(config_path)
        } else {
            Ok(Self::default())
        }
    }

    fn resolve_relative_paths(&mut self, config_base: &Path) {
        resolve_against(config_base, &mut self.logging.dir);
        resolve_against(config_base, &mut self.worker.socket_path);
        let data = &mut self.pipeline.recommender_data;
        for path in [
            data.product_catalog_path.as_mut(),
            data.customer_segments_path.as_mut(),
        ]
        .into_iter()
        .flatten()
        {
            resolve_against(config_base, path);
        }
    }
}

fn resolve_against(base: &Path, path: &mut PathBuf) {
    if !path.is_absolute() {
        *path = base.join(&*path);
    }
}

fn resolve_schema_path(config_base: &Path, config_value: &Value) -> Result<PathBuf> {
    if let Some(path_text) = config_value.get("$schema").and_then(|value| value.as_str()) {
        let configured = PathBuf::from(path_text);
        if configured.is_absolute() {
            return Ok(configured);
        }
        return Ok(config_base.join(&configured));
    }

    let local_default = config_base.join(SCHEMA_FILE_NAME);
    if local_default.exists() {
        return Ok(local_default);
    }

    Err(anyhow!(
        "unable to resolve schema path: expected $schema in config or {SCHEMA_FILE_NAME} next to it"
    ))
}

fn validate_against_schema(config_value: &Value, schema_path: &Path) -> Result<()> {
    let schema_content = fs::read_to_string(schema_path)
        .with_context(|| format!("failed to read schema {}", schema_path.display()))?;
    let schema: Value = serde_json::from_str(&schema_content)
        .with_context(|| format!("failed to parse schema {}", schema_path.display()))?;

    let compiled =
        JSONSchema::compile(&schema).map_err(|e| anyhow!("failed to compile schema: {e}"))?;

    match compiled.validate(config_value) {
        Ok(()) => Ok(()),
        Err(errors_iter) => {
            let validation_errors: Vec<ValidationError> = errors_iter.collect();
            let messages: Vec<String> = validation_errors
                .into_iter()
                .map(|error| error.to_string())
                .collect();
            Err(anyhow!("config validation failed: {}", messages.join("; ")))
        }
    }
}
