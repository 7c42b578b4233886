//! Lead scoring
//!
//! Two 0-10 scores computed from the user profile:
//!
//! - engagement: sessions, views, interested items, latest sentiment
//! - intent: interested items, site visits, callbacks, sessions
//!
//! Their sum decides the temperature (hot / warm / cold). Scores are always
//! recomputed from the profile counters, never adjusted incrementally.

use sales_agent_config::LeadConfig;
use sales_agent_core::{
    ConversationSession, InterestLevel, LeadScores, LeadTemperature, Sentiment, UserProfile,
};

/// Interested items named in a welcome-back note
const WELCOME_BACK_ITEMS: usize = 2;

pub struct LeadScorer {
    config: LeadConfig,
}

impl LeadScorer {
    pub fn new(config: LeadConfig) -> Self {
        Self { config }
    }

    pub fn score(&self, profile: &UserProfile) -> LeadScores {
        let c = &self.config;
        let sessions = profile.session_count as f32;
        let views = profile.total_views() as f32;
        let interested = profile.items_with_interest(InterestLevel::Medium).len() as f32;

        let sentiment = match profile.latest_sentiment().unwrap_or_default() {
            Sentiment::Positive => c.sentiment_positive,
            Sentiment::Neutral => c.sentiment_neutral,
            Sentiment::Negative => c.sentiment_negative,
        };
        let engagement = (sessions * c.session_weight).min(c.session_cap)
            + (views * c.view_weight).min(c.view_cap)
            + (interested * c.interest_weight).min(c.interest_cap)
            + sentiment;

        let mut intent = (interested * c.intent_interest_weight).min(c.intent_interest_cap)
            + (sessions * c.intent_session_weight).min(c.intent_session_cap);
        if profile.site_visits_scheduled > 0 {
            intent += c.site_visit_bonus;
        }
        if profile.callbacks_requested > 0 {
            intent += c.callback_bonus;
        }

        LeadScores::compute(engagement, intent, c.hot_threshold, c.warm_threshold)
    }

    /// Temperature for a pair of scores under the configured thresholds
    pub fn temperature_for(&self, engagement: f32, intent: f32) -> LeadTemperature {
        LeadScores::compute(
            engagement,
            intent,
            self.config.hot_threshold,
            self.config.warm_threshold,
        )
        .temperature()
    }

    /// Recompute and store the profile's scores
    pub fn rescore(&self, profile: &mut UserProfile) -> LeadScores {
        let previous = profile.temperature();
        let scores = self.score(profile);
        profile.set_scores(scores);
        if scores.temperature() != previous {
            tracing::info!(
                user_id = %profile.user_id,
                from = %previous,
                to = %scores.temperature(),
                engagement = scores.engagement(),
                intent = scores.intent(),
                "Lead temperature changed"
            );
        }
        scores
    }

    /// One-time greeting for a returning user
    ///
    /// Fires at most once per session; later calls return `None`.
    pub fn welcome_back(
        &self,
        profile: &UserProfile,
        session: &mut ConversationSession,
    ) -> Option<String> {
        if session.welcomed_back || !profile.is_returning() {
            return None;
        }
        session.welcomed_back = true;

        let recent: Vec<&str> = profile
            .last_interested
            .iter()
            .rev()
            .take(WELCOME_BACK_ITEMS)
            .map(|id| profile.label(id))
            .collect();

        let message = match recent.as_slice() {
            [] => "Welcome back! Good to see you again.".to_string(),
            [one] => format!("Welcome back! Last time you were looking at {}.", one),
            [first, second, ..] => format!(
                "Welcome back! Last time you were looking at {} and {}.",
                first, second
            ),
        };
        tracing::debug!(session_id = %session.id, user_id = %profile.user_id, "Welcome back");
        Some(message)
    }
}

impl Default for LeadScorer {
    fn default() -> Self {
        Self::new(LeadConfig::default())
    }
}
