//! Stage, engagement and lead scoring parameters

use serde::{Deserialize, Serialize};

use crate::constants::{engagement, lead, stage};
use crate::ConfigError;

/// Phase advancement thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StageConfig {
    pub evaluation_min_viewed: usize,
    pub negotiation_min_objections: u32,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            evaluation_min_viewed: stage::EVALUATION_MIN_VIEWED,
            negotiation_min_objections: stage::NEGOTIATION_MIN_OBJECTIONS,
        }
    }
}

/// Session engagement weights and caps
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngagementConfig {
    pub message_weight: f32,
    pub message_cap: f32,
    pub view_weight: f32,
    pub view_cap: f32,
    pub interest_weight: f32,
    pub interest_cap: f32,
    pub deep_query_bonus: f32,
    pub deep_query_min_details: u32,
}

impl Default for EngagementConfig {
    fn default() -> Self {
        Self {
            message_weight: engagement::MESSAGE_WEIGHT,
            message_cap: engagement::MESSAGE_CAP,
            view_weight: engagement::VIEW_WEIGHT,
            view_cap: engagement::VIEW_CAP,
            interest_weight: engagement::INTEREST_WEIGHT,
            interest_cap: engagement::INTEREST_CAP,
            deep_query_bonus: engagement::DEEP_QUERY_BONUS,
            deep_query_min_details: engagement::DEEP_QUERY_MIN_DETAILS,
        }
    }
}

/// Lead scoring weights, caps and temperature thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LeadConfig {
    pub session_weight: f32,
    pub session_cap: f32,
    pub view_weight: f32,
    pub view_cap: f32,
    pub interest_weight: f32,
    pub interest_cap: f32,
    pub sentiment_positive: f32,
    pub sentiment_neutral: f32,
    pub sentiment_negative: f32,

    pub intent_interest_weight: f32,
    pub intent_interest_cap: f32,
    pub site_visit_bonus: f32,
    pub callback_bonus: f32,
    pub intent_session_weight: f32,
    pub intent_session_cap: f32,

    pub hot_threshold: f32,
    pub warm_threshold: f32,
}

impl Default for LeadConfig {
    fn default() -> Self {
        Self {
            session_weight: lead::SESSION_WEIGHT,
            session_cap: lead::SESSION_CAP,
            view_weight: lead::VIEW_WEIGHT,
            view_cap: lead::VIEW_CAP,
            interest_weight: lead::INTEREST_WEIGHT,
            interest_cap: lead::INTEREST_CAP,
            sentiment_positive: lead::SENTIMENT_POSITIVE,
            sentiment_neutral: lead::SENTIMENT_NEUTRAL,
            sentiment_negative: lead::SENTIMENT_NEGATIVE,
            intent_interest_weight: lead::INTENT_INTEREST_WEIGHT,
            intent_interest_cap: lead::INTENT_INTEREST_CAP,
            site_visit_bonus: lead::SITE_VISIT_BONUS,
            callback_bonus: lead::CALLBACK_BONUS,
            intent_session_weight: lead::INTENT_SESSION_WEIGHT,
            intent_session_cap: lead::INTENT_SESSION_CAP,
            hot_threshold: lead::HOT_THRESHOLD,
            warm_threshold: lead::WARM_THRESHOLD,
        }
    }
}

impl LeadConfig {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.warm_threshold > self.hot_threshold {
            return Err(ConfigError::InvalidValue {
                field: "lead.warm_threshold".to_string(),
                message: format!(
                    "Must not exceed lead.hot_threshold ({}), got {}",
                    self.hot_threshold, self.warm_threshold
                ),
            });
        }
        if !(0.0..=20.0).contains(&self.hot_threshold) {
            return Err(ConfigError::InvalidValue {
                field: "lead.hot_threshold".to_string(),
                message: format!("Must be between 0 and 20, got {}", self.hot_threshold),
            });
        }
        let caps = [
            ("lead.session_cap", self.session_cap),
            ("lead.view_cap", self.view_cap),
            ("lead.interest_cap", self.interest_cap),
            ("lead.intent_interest_cap", self.intent_interest_cap),
            ("lead.intent_session_cap", self.intent_session_cap),
        ];
        for (field, cap) in caps {
            if cap < 0.0 {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    message: format!("Must not be negative, got {}", cap),
                });
            }
        }
        Ok(())
    }
}
