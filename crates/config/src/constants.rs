//! Named defaults for every tunable threshold
//!
//! These values were picked empirically, not fitted. Each one is overridable
//! through `Settings` and should be treated as a starting point for tuning.

/// Session lifetime and history bounds
pub mod session {
    /// Idle time after which a session is replaced by a fresh one (4 hours)
    pub const TIMEOUT_SECS: u64 = 4 * 60 * 60;

    pub const HISTORY_LIMIT: usize = 10;

    pub const AFFECT_HISTORY_LIMIT: usize = 10;
}

/// Intent classifier contract
pub mod classifier {
    /// Verdicts below this confidence go down the conversation path
    pub const MIN_CONFIDENCE: f32 = 0.4;

    pub const TIMEOUT_MS: u64 = 3000;
}

/// Context enrichment
pub mod enrichment {
    /// Utterances of at most this many words count as vague
    pub const VAGUE_MAX_WORDS: usize = 4;
}

/// Sales-phase advancement
pub mod stage {
    /// Distinct viewed items that move a session into evaluation
    pub const EVALUATION_MIN_VIEWED: usize = 3;

    /// Objections that move a session into negotiation
    pub const NEGOTIATION_MIN_OBJECTIONS: u32 = 1;
}

/// Session engagement score (0-10)
pub mod engagement {
    pub const MESSAGE_WEIGHT: f32 = 0.5;
    pub const MESSAGE_CAP: f32 = 3.0;

    pub const VIEW_WEIGHT: f32 = 1.0;
    pub const VIEW_CAP: f32 = 3.0;

    pub const INTEREST_WEIGHT: f32 = 1.0;
    pub const INTEREST_CAP: f32 = 2.0;

    /// Added once some item has at least `DEEP_QUERY_MIN_DETAILS` detail requests
    pub const DEEP_QUERY_BONUS: f32 = 2.0;
    pub const DEEP_QUERY_MIN_DETAILS: u32 = 2;
}

/// Profile lead scoring
pub mod lead {
    // Engagement components
    pub const SESSION_WEIGHT: f32 = 1.0;
    pub const SESSION_CAP: f32 = 3.0;
    pub const VIEW_WEIGHT: f32 = 0.25;
    pub const VIEW_CAP: f32 = 3.0;
    pub const INTEREST_WEIGHT: f32 = 1.0;
    pub const INTEREST_CAP: f32 = 2.0;
    pub const SENTIMENT_POSITIVE: f32 = 2.0;
    pub const SENTIMENT_NEUTRAL: f32 = 1.0;
    pub const SENTIMENT_NEGATIVE: f32 = 0.0;

    // Intent-to-buy components
    pub const INTENT_INTEREST_WEIGHT: f32 = 1.5;
    pub const INTENT_INTEREST_CAP: f32 = 4.0;
    pub const SITE_VISIT_BONUS: f32 = 3.0;
    pub const CALLBACK_BONUS: f32 = 2.0;
    pub const INTENT_SESSION_WEIGHT: f32 = 0.5;
    pub const INTENT_SESSION_CAP: f32 = 1.0;

    /// engagement + intent at or above this is hot
    pub const HOT_THRESHOLD: f32 = 15.0;
    /// engagement + intent at or above this is warm
    pub const WARM_THRESHOLD: f32 = 10.0;
}

/// Coaching rule engine
pub mod coaching {
    pub const COOLDOWN_SECS: u64 = 10 * 60;

    /// Frustration score (0-10) that triggers de-escalation
    pub const FRUSTRATION_THRESHOLD: u8 = 6;

    pub const SITE_VISIT_MIN_VIEWED: usize = 3;
    pub const SITE_VISIT_MIN_MESSAGES: u32 = 5;

    /// Messages exchanged before asking for contact details
    pub const CONTACT_CAPTURE_MIN_MESSAGES: u32 = 4;
}

/// Proactive nudge detector
pub mod nudges {
    pub const COOLDOWN_SECS: u64 = 10 * 60;

    pub const REPEAT_VIEW_MIN: u32 = 3;
    pub const MANY_ITEMS_MIN: usize = 5;
    pub const REPEATED_OBJECTION_MIN: u32 = 2;
    pub const LOCATION_FOCUS_MIN: u32 = 3;
    pub const LONG_SESSION_MINUTES: i64 = 15;
}

/// Signal detection
pub mod signals {
    /// Frustration added per matched marker
    pub const FRUSTRATION_PER_MARKER: u8 = 3;

    /// Added when an utterance carries two or more exclamation marks
    pub const FRUSTRATION_EXCLAMATION: u8 = 2;

    /// Added when two or more words are shouted in capitals
    pub const FRUSTRATION_SHOUTING: u8 = 2;
}
