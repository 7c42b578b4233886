//! Two-path router
//!
//! Decides whether a turn is answered from the catalog (multi-result search
//! or single-fact lookup) or by the generator. The classifier proposes;
//! the router applies overrides in this order:
//!
//! 1. a bare continuation cue never starts a catalog search
//! 2. an explicit search verb forces a catalog search
//! 3. a missing or low-confidence verdict goes to conversation
//! 4. otherwise the verdict route, refined into search / lookup
//!
//! Every decision overwrites the session's last intent and topic.

use serde::{Deserialize, Serialize};

use sales_agent_config::VocabularyConfig;
use sales_agent_core::{
    intent_label, kinds, ClassifierVerdict, ConversationSession, ExtractedFields, FactType,
    IntentClass, Route, SearchFilters,
};

use crate::extraction::{correct_fields, FieldExtractor};
use crate::text::{is_one_of, mentions_any, normalize};

/// What to execute for this turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RouteAction {
    Search { filters: SearchFilters },
    Lookup { project: String, fact: FactType },
    Converse,
}

/// Why the router departed from the classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteOverride {
    ContinuationCue,
    SearchVerb,
    ClassifierUnavailable,
    LowConfidence,
    NonSchemaFact,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteDecision {
    pub route: Route,
    pub action: RouteAction,
    /// Normalized `"<route>:<kind>"` intent
    pub intent: String,
    pub fields: ExtractedFields,
    pub topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_applied: Option<RouteOverride>,
}

impl RouteDecision {
    fn converse(intent: String, fields: ExtractedFields) -> Self {
        Self {
            route: Route::Conversation,
            action: RouteAction::Converse,
            intent,
            fields,
            topic: None,
            override_applied: None,
        }
    }

    fn search(filters: SearchFilters, fields: ExtractedFields) -> Self {
        Self {
            route: Route::Catalog,
            action: RouteAction::Search { filters },
            intent: intent_label(Route::Catalog, kinds::SEARCH),
            fields,
            topic: None,
            override_applied: None,
        }
    }

    fn with_override(mut self, reason: RouteOverride) -> Self {
        self.override_applied = Some(reason);
        self
    }

    pub fn is_continuation(&self) -> bool {
        self.override_applied == Some(RouteOverride::ContinuationCue)
    }
}

pub struct Router {
    continuation_cues: Vec<String>,
    search_verbs: Vec<String>,
    min_confidence: f32,
    extractor: FieldExtractor,
}

impl Router {
    pub fn new(vocabulary: &VocabularyConfig, min_confidence: f32) -> Self {
        Self {
            continuation_cues: vocabulary.continuation_cues.clone(),
            search_verbs: vocabulary
                .search_verbs
                .iter()
                .map(|v| v.to_lowercase())
                .collect(),
            min_confidence,
            extractor: FieldExtractor::new(),
        }
    }

    /// Route one turn and record the intent/topic on the session
    ///
    /// Overrides look at the raw utterance, what the user actually said;
    /// field extraction reads the enriched text so carried-over context
    /// (a location, a configuration) is not lost.
    pub fn route(
        &self,
        verdict: Option<&ClassifierVerdict>,
        raw: &str,
        enriched: &str,
        session: &mut ConversationSession,
    ) -> RouteDecision {
        let normalized = normalize(raw);
        let local = self.extractor.extract(enriched);
        let fields = match verdict {
            Some(v) => correct_fields(&v.fields, &local),
            None => local,
        };

        let mut decision = self.decide(verdict, &normalized, fields, session);
        decision.topic = if decision.is_continuation() {
            session.last_topic.clone()
        } else {
            Some(derive_topic(&decision))
        };

        session.last_intent = Some(decision.intent.clone());
        session.last_topic = decision.topic.clone();
        if let RouteAction::Search { filters } = &decision.action {
            session.filters = filters.clone();
        }

        tracing::debug!(
            session_id = %session.id,
            route = %decision.route,
            intent = %decision.intent,
            topic = ?decision.topic,
            override_applied = ?decision.override_applied,
            "Routed turn"
        );

        decision
    }

    fn decide(
        &self,
        verdict: Option<&ClassifierVerdict>,
        normalized: &str,
        mut fields: ExtractedFields,
        session: &ConversationSession,
    ) -> RouteDecision {
        if is_one_of(normalized, &self.continuation_cues) {
            let intent = session
                .last_intent
                .clone()
                .filter(|i| IntentClass::of(i) == IntentClass::Conversational)
                .unwrap_or_else(|| intent_label(Route::Conversation, kinds::CONTINUATION));
            return RouteDecision::converse(intent, fields)
                .with_override(RouteOverride::ContinuationCue);
        }

        if mentions_any(normalized, &self.search_verbs) {
            fields.project_name = None;
            let filters = session.filters.merged_with(&fields.as_filters());
            return RouteDecision::search(filters, fields).with_override(RouteOverride::SearchVerb);
        }

        let verdict = match verdict {
            None => {
                return RouteDecision::converse(
                    intent_label(Route::Conversation, kinds::GENERAL),
                    fields,
                )
                .with_override(RouteOverride::ClassifierUnavailable);
            },
            Some(v) if v.confidence < self.min_confidence => {
                return RouteDecision::converse(
                    intent_label(Route::Conversation, kinds::GENERAL),
                    fields,
                )
                .with_override(RouteOverride::LowConfidence);
            },
            Some(v) => v,
        };

        match verdict.route {
            Route::Conversation => {
                RouteDecision::converse(intent_label(Route::Conversation, verdict.kind()), fields)
            },
            Route::Catalog => {
                let fact = fields
                    .fact_type
                    .as_deref()
                    .map(|label| (label, FactType::parse(label)));
                match (fields.project_name.clone(), fact) {
                    (_, Some((_, None))) => RouteDecision::converse(
                        intent_label(Route::Conversation, kinds::FACT),
                        fields,
                    )
                    .with_override(RouteOverride::NonSchemaFact),
                    (Some(project), Some((_, Some(fact)))) => RouteDecision {
                        route: Route::Catalog,
                        action: RouteAction::Lookup { project, fact },
                        intent: intent_label(Route::Catalog, kinds::FACT),
                        fields,
                        topic: None,
                        override_applied: None,
                    },
                    _ => {
                        let filters = session.filters.merged_with(&fields.as_filters());
                        RouteDecision::search(filters, fields)
                    },
                }
            },
        }
    }
}

/// project > fact > location > configuration > classifier topic > intent kind
fn derive_topic(decision: &RouteDecision) -> String {
    let fields = &decision.fields;
    fields
        .project_name
        .clone()
        .or_else(|| fields.fact_type.clone())
        .or_else(|| fields.location.clone())
        .or_else(|| fields.configuration.clone())
        .or_else(|| fields.topic.clone())
        .unwrap_or_else(|| {
            decision
                .intent
                .split_once(':')
                .map(|(_, kind)| kind.to_string())
                .unwrap_or_else(|| decision.intent.clone())
        })
}
