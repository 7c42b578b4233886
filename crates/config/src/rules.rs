//! Coaching and nudge rule parameters

use serde::{Deserialize, Serialize};

use crate::constants::{coaching, nudges};

/// Coaching rule engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoachingConfig {
    /// Disable to skip coaching evaluation entirely
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_coaching_cooldown")]
    pub cooldown_secs: u64,

    #[serde(default = "default_frustration_threshold")]
    pub frustration_threshold: u8,

    #[serde(default = "default_site_visit_min_viewed")]
    pub site_visit_min_viewed: usize,

    #[serde(default = "default_site_visit_min_messages")]
    pub site_visit_min_messages: u32,

    #[serde(default = "default_contact_capture_min_messages")]
    pub contact_capture_min_messages: u32,
}

fn default_true() -> bool {
    true
}

fn default_coaching_cooldown() -> u64 {
    coaching::COOLDOWN_SECS
}

fn default_frustration_threshold() -> u8 {
    coaching::FRUSTRATION_THRESHOLD
}

fn default_site_visit_min_viewed() -> usize {
    coaching::SITE_VISIT_MIN_VIEWED
}

fn default_site_visit_min_messages() -> u32 {
    coaching::SITE_VISIT_MIN_MESSAGES
}

fn default_contact_capture_min_messages() -> u32 {
    coaching::CONTACT_CAPTURE_MIN_MESSAGES
}

impl Default for CoachingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cooldown_secs: default_coaching_cooldown(),
            frustration_threshold: default_frustration_threshold(),
            site_visit_min_viewed: default_site_visit_min_viewed(),
            site_visit_min_messages: default_site_visit_min_messages(),
            contact_capture_min_messages: default_contact_capture_min_messages(),
        }
    }
}

/// Proactive nudge detector settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NudgeConfig {
    pub enabled: bool,
    pub cooldown_secs: u64,
    pub repeat_view_min: u32,
    pub many_items_min: usize,
    pub repeated_objection_min: u32,
    pub location_focus_min: u32,
    pub long_session_minutes: i64,
}

impl Default for NudgeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cooldown_secs: nudges::COOLDOWN_SECS,
            repeat_view_min: nudges::REPEAT_VIEW_MIN,
            many_items_min: nudges::MANY_ITEMS_MIN,
            repeated_objection_min: nudges::REPEATED_OBJECTION_MIN,
            location_focus_min: nudges::LOCATION_FOCUS_MIN,
            long_session_minutes: nudges::LONG_SESSION_MINUTES,
        }
    }
}
