//! Flattened session view handed to external collaborators

use serde::{Deserialize, Serialize};

use crate::catalog::SearchFilters;
use crate::profile::{LeadTemperature, UserProfile};
use crate::session::{ConversationPhase, ConversationSession, HistoryTurn, Sentiment};

/// Read-only snapshot of what the engine knows about a conversation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub phase: ConversationPhase,
    pub filters: SearchFilters,
    pub interested_projects: Vec<String>,
    /// Names of the items shown most recently
    pub last_shown: Vec<String>,
    pub last_intent: Option<String>,
    pub last_topic: Option<String>,
    pub sentiment: Sentiment,
    pub frustration: u8,
    /// Objection types raised so far, sorted
    pub objections: Vec<String>,
    pub lead_temperature: Option<LeadTemperature>,
    /// Set on the turn a returning user is welcomed back
    pub welcome_back: Option<String>,
}

impl SessionSummary {
    pub fn from_session(session: &ConversationSession, profile: Option<&UserProfile>) -> Self {
        let mut objections: Vec<String> = session.objections.keys().cloned().collect();
        objections.sort();
        Self {
            session_id: session.id.clone(),
            phase: session.phase,
            filters: session.filters.clone(),
            interested_projects: session.interested_projects.clone(),
            last_shown: session
                .last_shown
                .iter()
                .map(|item| item.label().to_string())
                .collect(),
            last_intent: session.last_intent.clone(),
            last_topic: session.last_topic.clone(),
            sentiment: session.sentiment,
            frustration: session.frustration,
            objections,
            lead_temperature: profile.map(|p| p.temperature()),
            welcome_back: None,
        }
    }

    pub fn with_welcome_back(mut self, note: Option<String>) -> Self {
        self.welcome_back = note;
        self
    }

    /// Render as plain-text context lines for a prompt
    pub fn to_prompt_context(&self) -> String {
        let mut lines = vec![format!(
            "Stage: {} - {}",
            self.phase.display_name(),
            self.phase.guidance()
        )];

        if let Some(filters) = self.filters.describe() {
            lines.push(format!("Looking for: {}", filters));
        }
        if !self.interested_projects.is_empty() {
            lines.push(format!(
                "Interested in: {}",
                self.interested_projects.join(", ")
            ));
        }
        if !self.last_shown.is_empty() {
            lines.push(format!("Recently shown: {}", self.last_shown.join(", ")));
        }
        if let Some(topic) = &self.last_topic {
            lines.push(format!("Current topic: {}", topic));
        }
        if !self.objections.is_empty() {
            lines.push(format!("Concerns raised: {}", self.objections.join(", ")));
        }
        if self.frustration >= 5 {
            lines.push(format!(
                "User frustration: {}/10, keep replies short and direct",
                self.frustration
            ));
        }
        if let Some(temperature) = self.lead_temperature {
            lines.push(format!("Lead: {}", temperature));
        }
        if let Some(note) = &self.welcome_back {
            lines.push(format!("Returning user: {}", note));
        }

        lines.join("\n")
    }
}

/// Input to the language generator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// The (possibly enriched) utterance to answer
    pub utterance: String,
    pub history: Vec<HistoryTurn>,
    pub summary: SessionSummary,
    /// Catalog error text when this request is a fallback from the catalog path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
}
