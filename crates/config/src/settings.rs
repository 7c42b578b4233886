//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::constants::{classifier, enrichment, session};
use crate::{
    CoachingConfig, ConfigError, EngagementConfig, LeadConfig, NudgeConfig, StageConfig,
    VocabularyConfig,
};

/// Runtime environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    #[default]
    Development,
    Staging,
    Production,
}

impl RuntimeEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub classifier: ClassifierConfig,

    #[serde(default)]
    pub enrichment: EnrichmentConfig,

    #[serde(default)]
    pub stage: StageConfig,

    #[serde(default)]
    pub engagement: EngagementConfig,

    #[serde(default)]
    pub lead: LeadConfig,

    #[serde(default)]
    pub coaching: CoachingConfig,

    #[serde(default)]
    pub nudges: NudgeConfig,

    /// Optional YAML file overriding the keyword vocabulary
    #[serde(default)]
    pub vocabulary_path: Option<String>,

    /// JSON file with catalog records for the in-memory catalog
    #[serde(default = "default_catalog_path")]
    pub catalog_path: String,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

fn default_catalog_path() -> String {
    "config/catalog.json".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            environment: RuntimeEnvironment::default(),
            session: SessionConfig::default(),
            classifier: ClassifierConfig::default(),
            enrichment: EnrichmentConfig::default(),
            stage: StageConfig::default(),
            engagement: EngagementConfig::default(),
            lead: LeadConfig::default(),
            coaching: CoachingConfig::default(),
            nudges: NudgeConfig::default(),
            vocabulary_path: None,
            catalog_path: default_catalog_path(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_session()?;
        self.validate_classifier()?;
        self.lead.validate()?;

        if self.enrichment.vague_max_words == 0 {
            return Err(ConfigError::InvalidValue {
                field: "enrichment.vague_max_words".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }

        Ok(())
    }

    fn validate_session(&self) -> Result<(), ConfigError> {
        if self.session.history_limit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "session.history_limit".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }
        if self.session.affect_history_limit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "session.affect_history_limit".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }
        if self.session.timeout_secs < 60 {
            return Err(ConfigError::InvalidValue {
                field: "session.timeout_secs".to_string(),
                message: format!(
                    "Session timeout too low (minimum 60s), got {}",
                    self.session.timeout_secs
                ),
            });
        }
        Ok(())
    }

    fn validate_classifier(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.classifier.min_confidence) {
            return Err(ConfigError::InvalidValue {
                field: "classifier.min_confidence".to_string(),
                message: format!(
                    "Must be between 0.0 and 1.0, got {}",
                    self.classifier.min_confidence
                ),
            });
        }
        if self.classifier.timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "classifier.timeout_ms".to_string(),
                message: "Must be greater than 0".to_string(),
            });
        }
        Ok(())
    }

    /// Resolve the keyword vocabulary: the configured file, or the built-in lists
    pub fn load_vocabulary(&self) -> Result<VocabularyConfig, ConfigError> {
        match &self.vocabulary_path {
            Some(path) => {
                tracing::info!(path = %path, "Loading vocabulary");
                VocabularyConfig::load(path)
            },
            None => Ok(VocabularyConfig::default()),
        }
    }
}

/// Session lifetime and bounds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Idle seconds before a session is replaced
    #[serde(default = "default_session_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    #[serde(default = "default_affect_history_limit")]
    pub affect_history_limit: usize,
}

fn default_session_timeout() -> u64 {
    session::TIMEOUT_SECS
}

fn default_history_limit() -> usize {
    session::HISTORY_LIMIT
}

fn default_affect_history_limit() -> usize {
    session::AFFECT_HISTORY_LIMIT
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_session_timeout(),
            history_limit: default_history_limit(),
            affect_history_limit: default_affect_history_limit(),
        }
    }
}

/// Intent classifier contract
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f32,

    #[serde(default = "default_classifier_timeout")]
    pub timeout_ms: u64,
}

fn default_min_confidence() -> f32 {
    classifier::MIN_CONFIDENCE
}

fn default_classifier_timeout() -> u64 {
    classifier::TIMEOUT_MS
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            min_confidence: default_min_confidence(),
            timeout_ms: default_classifier_timeout(),
        }
    }
}

/// Context enrichment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentConfig {
    #[serde(default = "default_vague_max_words")]
    pub vague_max_words: usize,
}

fn default_vague_max_words() -> usize {
    enrichment::VAGUE_MAX_WORDS
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            vague_max_words: default_vague_max_words(),
        }
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub log_json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
        }
    }
}

/// Load settings from files and environment
///
/// Sources, later ones winning: `config/default.*`, `config/{env}.*`, then
/// `SALES_AGENT__SECTION__FIELD` environment variables.
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    builder = builder.add_source(File::with_name("config/default").required(false));

    if let Some(env_name) = env {
        builder =
            builder.add_source(File::with_name(&format!("config/{}", env_name)).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix("SALES_AGENT")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    Ok(settings)
}
