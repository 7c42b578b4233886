//! Cross-session user profile and lead classification types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, VecDeque};

use crate::session::Sentiment;

/// Sentiment samples kept on the profile
const PROFILE_SENTIMENT_LIMIT: usize = 50;

/// Interest a user has shown in an item
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum InterestLevel {
    #[default]
    None,
    Low,
    Medium,
    High,
}

impl InterestLevel {
    /// Interest implied by a number of views
    pub fn from_views(views: u32) -> Self {
        match views {
            0 => InterestLevel::None,
            1 => InterestLevel::Low,
            2 => InterestLevel::Medium,
            _ => InterestLevel::High,
        }
    }
}

/// Lead temperature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LeadTemperature {
    Hot,
    Warm,
    #[default]
    Cold,
}

impl LeadTemperature {
    /// Threshold function over the combined score
    pub fn classify(engagement: f32, intent: f32, hot_at: f32, warm_at: f32) -> Self {
        let total = engagement + intent;
        if total >= hot_at {
            LeadTemperature::Hot
        } else if total >= warm_at {
            LeadTemperature::Warm
        } else {
            LeadTemperature::Cold
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LeadTemperature::Hot => "hot",
            LeadTemperature::Warm => "warm",
            LeadTemperature::Cold => "cold",
        }
    }
}

impl std::fmt::Display for LeadTemperature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derived lead scores
///
/// Only constructible through [`LeadScores::compute`], so the temperature
/// always agrees with the two scores it was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct LeadScores {
    engagement: f32,
    intent: f32,
    temperature: LeadTemperature,
}

impl LeadScores {
    /// Clamp both scores to 0-10 and derive the temperature
    pub fn compute(engagement: f32, intent: f32, hot_at: f32, warm_at: f32) -> Self {
        let engagement = engagement.clamp(0.0, 10.0);
        let intent = intent.clamp(0.0, 10.0);
        Self {
            engagement,
            intent,
            temperature: LeadTemperature::classify(engagement, intent, hot_at, warm_at),
        }
    }

    pub fn engagement(&self) -> f32 {
        self.engagement
    }

    pub fn intent(&self) -> f32 {
        self.intent
    }

    pub fn temperature(&self) -> LeadTemperature {
        self.temperature
    }
}

/// Actions completed outside the conversation (scheduler, CRM, downloads)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownstreamAction {
    SiteVisitScheduled,
    CallbackRequested,
    DocumentDownloaded,
}

/// Durable buying preferences; merged across sessions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_max: Option<f64>,
    #[serde(default)]
    pub configurations: BTreeSet<String>,
    #[serde(default)]
    pub locations: BTreeSet<String>,
}

impl Preferences {
    /// Widen the budget range to cover a new value
    pub fn merge_budget(&mut self, min: Option<f64>, max: Option<f64>) {
        if let Some(min) = min {
            self.budget_min = Some(self.budget_min.map_or(min, |m| m.min(min)));
        }
        if let Some(max) = max {
            self.budget_max = Some(self.budget_max.map_or(max, |m| m.max(max)));
        }
    }

    pub fn add_configuration(&mut self, configuration: &str) {
        let value = configuration.trim().to_uppercase();
        if !value.is_empty() {
            self.configurations.insert(value);
        }
    }

    pub fn add_location(&mut self, location: &str) {
        let value = location.trim();
        if !value.is_empty() {
            self.locations.insert(value.to_string());
        }
    }
}

/// One end user's long-lived record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default)]
    pub preferences: Preferences,

    view_counts: HashMap<String, u32>,
    interest: HashMap<String, InterestLevel>,
    /// Item id -> display name, recorded on view
    #[serde(default)]
    labels: HashMap<String, String>,
    pub objections: HashMap<String, u32>,
    sentiment_history: VecDeque<(Sentiment, DateTime<Utc>)>,

    pub session_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_session_id: Option<String>,
    /// Items the user was most recently interested in; most recent last
    #[serde(default)]
    pub last_interested: Vec<String>,

    pub site_visits_scheduled: u32,
    pub callbacks_requested: u32,
    pub documents_downloaded: u32,

    scores: LeadScores,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    pub fn new(user_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.into(),
            name: None,
            phone: None,
            email: None,
            preferences: Preferences::default(),
            view_counts: HashMap::new(),
            interest: HashMap::new(),
            labels: HashMap::new(),
            objections: HashMap::new(),
            sentiment_history: VecDeque::new(),
            session_count: 0,
            last_session_id: None,
            last_interested: Vec::new(),
            site_visits_scheduled: 0,
            callbacks_requested: 0,
            documents_downloaded: 0,
            scores: LeadScores::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Count a view; raises interest to what the view count implies
    pub fn record_view(&mut self, item_id: &str) -> InterestLevel {
        let views = self.view_counts.entry(item_id.to_string()).or_insert(0);
        *views = views.saturating_add(1);
        let implied = InterestLevel::from_views(*views);
        self.raise_interest(item_id, implied)
    }

    /// Raise interest in an item; never lowers it
    pub fn raise_interest(&mut self, item_id: &str, level: InterestLevel) -> InterestLevel {
        let current = self.interest.entry(item_id.to_string()).or_default();
        if level > *current {
            *current = level;
        }
        if *current >= InterestLevel::Medium {
            self.last_interested.retain(|i| i != item_id);
            self.last_interested.push(item_id.to_string());
        }
        *current
    }

    pub fn remember_label(&mut self, item_id: &str, label: &str) {
        if !label.is_empty() {
            self.labels.insert(item_id.to_string(), label.to_string());
        }
    }

    /// Display name for an item, falling back to its id
    pub fn label<'a>(&'a self, item_id: &'a str) -> &'a str {
        self.labels.get(item_id).map(String::as_str).unwrap_or(item_id)
    }

    pub fn views(&self, item_id: &str) -> u32 {
        self.view_counts.get(item_id).copied().unwrap_or(0)
    }

    pub fn total_views(&self) -> u32 {
        self.view_counts.values().sum()
    }

    pub fn view_counts(&self) -> &HashMap<String, u32> {
        &self.view_counts
    }

    pub fn interest(&self, item_id: &str) -> InterestLevel {
        self.interest.get(item_id).copied().unwrap_or_default()
    }

    /// Items at or above `level`
    pub fn items_with_interest(&self, level: InterestLevel) -> Vec<&str> {
        let mut items: Vec<&str> = self
            .interest
            .iter()
            .filter(|(_, l)| **l >= level)
            .map(|(id, _)| id.as_str())
            .collect();
        items.sort_unstable();
        items
    }

    pub fn record_objection(&mut self, objection_type: &str) {
        *self
            .objections
            .entry(objection_type.to_string())
            .or_insert(0) += 1;
    }

    pub fn record_sentiment(&mut self, sentiment: Sentiment, at: DateTime<Utc>) {
        self.sentiment_history.push_back((sentiment, at));
        while self.sentiment_history.len() > PROFILE_SENTIMENT_LIMIT {
            self.sentiment_history.pop_front();
        }
    }

    pub fn latest_sentiment(&self) -> Option<Sentiment> {
        self.sentiment_history.back().map(|(s, _)| *s)
    }

    pub fn record_action(&mut self, action: DownstreamAction) {
        match action {
            DownstreamAction::SiteVisitScheduled => self.site_visits_scheduled += 1,
            DownstreamAction::CallbackRequested => self.callbacks_requested += 1,
            DownstreamAction::DocumentDownloaded => self.documents_downloaded += 1,
        }
    }

    /// True from the second session on
    pub fn is_returning(&self) -> bool {
        self.session_count >= 2
    }

    pub fn scores(&self) -> LeadScores {
        self.scores
    }

    pub fn temperature(&self) -> LeadTemperature {
        self.scores.temperature()
    }

    /// Replace the derived scores with a freshly computed set
    pub fn set_scores(&mut self, scores: LeadScores) {
        self.scores = scores;
    }
}
