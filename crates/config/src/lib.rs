//! Configuration management for the sales dialogue engine
//!
//! Supports loading configuration from:
//! - YAML/TOML files under `config/`
//! - Environment variables (`SALES_AGENT__` prefix)
//! - An optional vocabulary YAML file with keyword lists
//!
//! Every heuristic threshold has a named default in [`constants`].

pub mod constants;
pub mod rules;
pub mod scoring;
pub mod settings;
pub mod vocabulary;

pub use rules::{CoachingConfig, NudgeConfig};
pub use scoring::{EngagementConfig, LeadConfig, StageConfig};
pub use settings::{
    load_settings, ClassifierConfig, EnrichmentConfig, ObservabilityConfig, RuntimeEnvironment,
    SessionConfig, Settings,
};
pub use vocabulary::VocabularyConfig;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
