//! Per-conversation state
//!
//! One `ConversationSession` exists per active conversation. It is owned by
//! the session store; the engine loads a copy, mutates it for exactly one
//! turn and writes it back.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, VecDeque};

use crate::catalog::{CatalogItem, SearchFilters};

/// Default number of turns kept in history
pub const DEFAULT_HISTORY_LIMIT: usize = 10;

/// Default number of affect samples kept
pub const DEFAULT_AFFECT_HISTORY_LIMIT: usize = 10;

/// Issue an id for a session that arrived without one
pub fn new_session_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Speaker of a history turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

/// One exchanged message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryTurn {
    pub role: TurnRole,
    pub text: String,
    pub at: DateTime<Utc>,
}

/// Sales-process phase
///
/// Ordered: a session only ever moves forward through these.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum ConversationPhase {
    #[default]
    Discovery,
    Evaluation,
    Negotiation,
    Closing,
}

impl ConversationPhase {
    pub fn display_name(&self) -> &'static str {
        match self {
            ConversationPhase::Discovery => "Discovery",
            ConversationPhase::Evaluation => "Evaluation",
            ConversationPhase::Negotiation => "Negotiation",
            ConversationPhase::Closing => "Closing",
        }
    }

    /// Generic guidance passed to the generator for this phase
    pub fn guidance(&self) -> &'static str {
        match self {
            ConversationPhase::Discovery => {
                "Understand what the buyer is looking for: configuration, location, budget."
            },
            ConversationPhase::Evaluation => {
                "Help the buyer compare shortlisted projects on facts they care about."
            },
            ConversationPhase::Negotiation => {
                "Address concerns with specifics. Do not be pushy about price."
            },
            ConversationPhase::Closing => {
                "Confirm next steps: site visit, callback or booking details."
            },
        }
    }
}

/// Coarse sentiment label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    #[default]
    Neutral,
    Negative,
}

/// Affect sample recorded once per user turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffectSample {
    pub sentiment: Sentiment,
    /// Frustration score 0-10
    pub frustration: u8,
    pub at: DateTime<Utc>,
}

/// Typed objection memory entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectionRecord {
    pub count: u32,
    pub last_seen: DateTime<Utc>,
}

/// Which directives have been shown and when
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShownMemory {
    pub last_shown_at: Option<DateTime<Utc>>,
    /// Directive id -> last time it was shown
    pub shown: HashMap<String, DateTime<Utc>>,
}

impl ShownMemory {
    /// True when `id` has not been shown within `cooldown` of `now`
    pub fn is_cool(&self, id: &str, now: DateTime<Utc>, cooldown: Duration) -> bool {
        match self.shown.get(id) {
            Some(at) => now.signed_duration_since(*at) >= cooldown,
            None => true,
        }
    }

    pub fn record(&mut self, id: &str, now: DateTime<Utc>) {
        self.last_shown_at = Some(now);
        self.shown.insert(id.to_string(), now);
    }

    pub fn has_shown(&self, id: &str) -> bool {
        self.shown.contains_key(id)
    }
}

/// Mutable state of one conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSession {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,

    history: VecDeque<HistoryTurn>,
    history_limit: usize,

    // Search state
    pub filters: SearchFilters,
    /// Projects the user showed interest in; most recent last
    pub interested_projects: Vec<String>,
    pub last_shown: Vec<CatalogItem>,

    // Routing memory
    pub last_intent: Option<String>,
    pub last_topic: Option<String>,

    // Sales-process state
    pub phase: ConversationPhase,
    pub objection_count: u32,
    pub objections: HashMap<String, ObjectionRecord>,
    pub viewed_items: BTreeSet<String>,
    pub item_views: HashMap<String, u32>,
    pub detail_requests: HashMap<String, u32>,
    pub location_mentions: HashMap<String, u32>,
    pub scheduling_requested: bool,
    /// User messages received in this session
    pub message_count: u32,
    pub engagement_score: f32,

    // Affect state
    pub sentiment: Sentiment,
    pub frustration: u8,
    affect_history: VecDeque<AffectSample>,
    affect_limit: usize,

    // Coaching / nudge memory
    pub coaching: ShownMemory,
    pub nudges: ShownMemory,
    pub welcomed_back: bool,

    /// Store-maintained write counter
    pub revision: u64,
}

impl ConversationSession {
    /// Create a fresh session
    pub fn new(id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self::with_limits(id, now, DEFAULT_HISTORY_LIMIT, DEFAULT_AFFECT_HISTORY_LIMIT)
    }

    /// Create a fresh session with explicit history bounds
    pub fn with_limits(
        id: impl Into<String>,
        now: DateTime<Utc>,
        history_limit: usize,
        affect_limit: usize,
    ) -> Self {
        Self {
            id: id.into(),
            user_id: None,
            created_at: now,
            last_activity: now,
            history: VecDeque::with_capacity(history_limit),
            history_limit: history_limit.max(1),
            filters: SearchFilters::default(),
            interested_projects: Vec::new(),
            last_shown: Vec::new(),
            last_intent: None,
            last_topic: None,
            phase: ConversationPhase::default(),
            objection_count: 0,
            objections: HashMap::new(),
            viewed_items: BTreeSet::new(),
            item_views: HashMap::new(),
            detail_requests: HashMap::new(),
            location_mentions: HashMap::new(),
            scheduling_requested: false,
            message_count: 0,
            engagement_score: 0.0,
            sentiment: Sentiment::Neutral,
            frustration: 0,
            affect_history: VecDeque::with_capacity(affect_limit),
            affect_limit: affect_limit.max(1),
            coaching: ShownMemory::default(),
            nudges: ShownMemory::default(),
            welcomed_back: false,
            revision: 0,
        }
    }

    /// Append a turn, dropping the oldest ones beyond the history limit
    pub fn push_turn(&mut self, role: TurnRole, text: impl Into<String>, at: DateTime<Utc>) {
        self.history.push_back(HistoryTurn {
            role,
            text: text.into(),
            at,
        });
        while self.history.len() > self.history_limit {
            self.history.pop_front();
        }
    }

    pub fn history(&self) -> impl Iterator<Item = &HistoryTurn> {
        self.history.iter()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn history_limit(&self) -> usize {
        self.history_limit
    }

    /// Record the latest affect reading
    pub fn record_affect(&mut self, sentiment: Sentiment, frustration: u8, at: DateTime<Utc>) {
        let frustration = frustration.min(10);
        self.sentiment = sentiment;
        self.frustration = frustration;
        self.affect_history.push_back(AffectSample {
            sentiment,
            frustration,
            at,
        });
        while self.affect_history.len() > self.affect_limit {
            self.affect_history.pop_front();
        }
    }

    pub fn affect_history(&self) -> impl Iterator<Item = &AffectSample> {
        self.affect_history.iter()
    }

    /// Record an objection of the given type
    pub fn record_objection(&mut self, objection_type: &str, at: DateTime<Utc>) {
        self.objection_count += 1;
        self.objections
            .entry(objection_type.to_string())
            .and_modify(|r| {
                r.count += 1;
                r.last_seen = at;
            })
            .or_insert(ObjectionRecord {
                count: 1,
                last_seen: at,
            });
    }

    /// Record that an item was viewed in detail
    pub fn record_view(&mut self, item_id: &str) {
        self.viewed_items.insert(item_id.to_string());
        *self.item_views.entry(item_id.to_string()).or_insert(0) += 1;
    }

    pub fn record_detail_request(&mut self, item_id: &str) {
        *self.detail_requests.entry(item_id.to_string()).or_insert(0) += 1;
    }

    pub fn record_location_mention(&mut self, location: &str) {
        let key = location.trim().to_lowercase();
        if !key.is_empty() {
            *self.location_mentions.entry(key).or_insert(0) += 1;
        }
    }

    /// Mark a project as the most recent interest (moved to the end)
    pub fn mark_interested(&mut self, project: &str) {
        self.interested_projects
            .retain(|p| !p.eq_ignore_ascii_case(project));
        self.interested_projects.push(project.to_string());
    }

    pub fn most_recent_interest(&self) -> Option<&str> {
        self.interested_projects.last().map(String::as_str)
    }

    pub fn distinct_items_viewed(&self) -> usize {
        self.viewed_items.len()
    }

    /// Move the phase forward; earlier phases are ignored
    pub fn advance_phase(&mut self, to: ConversationPhase) -> bool {
        if to > self.phase {
            self.phase = to;
            true
        } else {
            false
        }
    }

    /// Time since the session started
    pub fn duration(&self, now: DateTime<Utc>) -> Duration {
        now.signed_duration_since(self.created_at)
    }

    /// True when the session has been idle longer than `timeout`
    pub fn is_expired(&self, now: DateTime<Utc>, timeout: Duration) -> bool {
        now.signed_duration_since(self.last_activity) > timeout
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        if now > self.last_activity {
            self.last_activity = now;
        }
    }
}
