//! Context enrichment
//!
//! Rewrites a vague follow-up ("tell me more", "what about that") into a
//! self-contained utterance using what the session already knows. The
//! first matching step wins:
//!
//! ```text
//! 1. generic-knowledge question         -> unchanged
//! 2. names a catalog item or a location -> unchanged
//!    (not vague)                        -> unchanged
//! 3. conversational last intent + topic -> "<u> regarding <topic>"
//! 4. interested / last shown item       -> "<u> about <item>"
//! 5. last topic                         -> "<u> regarding <topic>"
//! 6. search filters                     -> "<u> for <filters>"
//! 7.                                    -> unchanged
//! ```
//!
//! Step 3 outranks step 4: after a pivot from a project to a financing
//! question, "more" continues the financing question.

use serde::{Deserialize, Serialize};

use sales_agent_config::VocabularyConfig;
use sales_agent_core::{ConversationSession, IntentClass};

use crate::extraction::FieldExtractor;
use crate::text::{
    is_one_of, mentions, mentions_any, normalize, trim_trailing_punctuation, word_count,
};

/// Which step decided the outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrichmentReason {
    GenericQuestion,
    ExplicitReference,
    NotVague,
    TopicContinuation,
    ItemContinuation,
    TopicFallback,
    FilterContext,
    NoContext,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enrichment {
    pub text: String,
    pub enriched: bool,
    pub reason: EnrichmentReason,
}

impl Enrichment {
    fn unchanged(utterance: &str, reason: EnrichmentReason) -> Self {
        Self {
            text: utterance.to_string(),
            enriched: false,
            reason,
        }
    }

    fn rewritten(utterance: &str, suffix: String, reason: EnrichmentReason) -> Self {
        Self {
            text: format!("{} {}", trim_trailing_punctuation(utterance), suffix),
            enriched: true,
            reason,
        }
    }
}

pub struct ContextEnricher {
    continuation_cues: Vec<String>,
    deictic_terms: Vec<String>,
    greetings: Vec<String>,
    generic_prefixes: Vec<String>,
    property_terms: Vec<String>,
    vague_max_words: usize,
    extractor: FieldExtractor,
}

impl ContextEnricher {
    pub fn new(vocabulary: &VocabularyConfig, vague_max_words: usize) -> Self {
        let lower =
            |terms: &[String]| -> Vec<String> { terms.iter().map(|t| t.to_lowercase()).collect() };
        Self {
            continuation_cues: vocabulary.continuation_cues.clone(),
            deictic_terms: lower(&vocabulary.deictic_terms),
            greetings: vocabulary.greetings.clone(),
            generic_prefixes: lower(&vocabulary.generic_question_prefixes),
            property_terms: lower(&vocabulary.property_terms),
            vague_max_words,
            extractor: FieldExtractor::new(),
        }
    }

    /// `known` holds lowercase catalog ids, names and locations
    pub fn enrich(
        &self,
        utterance: &str,
        session: &ConversationSession,
        known: &[String],
    ) -> Enrichment {
        let normalized = normalize(utterance);
        let explicit = names_session_item(&normalized, session) || mentions_any(&normalized, known);

        if self.is_generic_question(&normalized) && !explicit {
            return Enrichment::unchanged(utterance, EnrichmentReason::GenericQuestion);
        }

        if explicit || self.extractor.extract_location(utterance).is_some() {
            return Enrichment::unchanged(utterance, EnrichmentReason::ExplicitReference);
        }

        if !self.is_vague(&normalized) {
            return Enrichment::unchanged(utterance, EnrichmentReason::NotVague);
        }

        let conversational = session
            .last_intent
            .as_deref()
            .is_some_and(|intent| IntentClass::of(intent) == IntentClass::Conversational);
        if conversational {
            if let Some(topic) = &session.last_topic {
                return Enrichment::rewritten(
                    utterance,
                    format!("regarding {}", topic),
                    EnrichmentReason::TopicContinuation,
                );
            }
        }

        let focus = session
            .most_recent_interest()
            .or_else(|| session.last_shown.first().map(|item| item.label()));
        if let Some(item) = focus {
            return Enrichment::rewritten(
                utterance,
                format!("about {}", item),
                EnrichmentReason::ItemContinuation,
            );
        }

        if let Some(topic) = &session.last_topic {
            return Enrichment::rewritten(
                utterance,
                format!("regarding {}", topic),
                EnrichmentReason::TopicFallback,
            );
        }

        if let Some(filters) = session.filters.describe() {
            return Enrichment::rewritten(
                utterance,
                format!("for {}", filters),
                EnrichmentReason::FilterContext,
            );
        }

        Enrichment::unchanged(utterance, EnrichmentReason::NoContext)
    }

    /// Definitional or process question with no property-specific noun
    pub fn is_generic_question(&self, normalized: &str) -> bool {
        let opens_generic = self
            .generic_prefixes
            .iter()
            .any(|prefix| normalized.starts_with(prefix.as_str()) && mentions(normalized, prefix));
        opens_generic && !mentions_any(normalized, &self.property_terms)
    }

    pub fn is_continuation_cue(&self, normalized: &str) -> bool {
        is_one_of(normalized, &self.continuation_cues)
    }

    /// Short, deictic, or a bare continuation cue; greetings never are
    pub fn is_vague(&self, normalized: &str) -> bool {
        if normalized.is_empty() || is_one_of(normalized, &self.greetings) {
            return false;
        }
        if self.is_continuation_cue(normalized) {
            return true;
        }
        let words = word_count(normalized);
        if words <= self.vague_max_words {
            return true;
        }
        words <= self.vague_max_words * 2 && mentions_any(normalized, &self.deictic_terms)
    }
}

/// True when the utterance names a shown item, an interested project or a
/// location the session has seen
fn names_session_item(normalized: &str, session: &ConversationSession) -> bool {
    let item_named = session.last_shown.iter().any(|item| {
        mentions(normalized, &item.id.to_lowercase())
            || (!item.name.is_empty() && mentions(normalized, &item.name.to_lowercase()))
    });
    let interest_named = session
        .interested_projects
        .iter()
        .any(|p| mentions(normalized, &p.to_lowercase()));
    let location_named = session
        .filters
        .location
        .as_deref()
        .is_some_and(|l| mentions(normalized, &l.to_lowercase()))
        || session
            .location_mentions
            .keys()
            .any(|l| mentions(normalized, l));
    item_named || interest_named || location_named
}
