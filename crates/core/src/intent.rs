//! Classifier verdicts and intent naming
//!
//! Normalized intents are `"<route>:<kind>"` strings such as `catalog:search`
//! or `conversation:faq`. The engine never inspects how a verdict was
//! produced; it only reads these fields.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::catalog::SearchFilters;

/// The two execution paths a turn can take
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    /// Answered from structured catalog data
    Catalog,
    /// Answered by the language generator
    Conversation,
}

impl Route {
    pub fn as_str(&self) -> &'static str {
        match self {
            Route::Catalog => "catalog",
            Route::Conversation => "conversation",
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Intent kinds the engine gives meaning to
pub mod kinds {
    pub const SEARCH: &str = "search";
    pub const FACT: &str = "fact";
    pub const FAQ: &str = "faq";
    pub const OBJECTION: &str = "objection";
    pub const GREETING: &str = "greeting";
    pub const ADVICE: &str = "advice";
    pub const FINANCING: &str = "financing";
    pub const SMALLTALK: &str = "smalltalk";
    pub const COMPARISON: &str = "comparison";
    pub const DETAILS: &str = "details";
    pub const SCHEDULE_VISIT: &str = "schedule_visit";
    pub const CONTINUATION: &str = "continuation";
    pub const GENERAL: &str = "general";
}

/// Kinds that belong to the conversational class for topic continuation
const CONVERSATIONAL_KINDS: &[&str] = &[
    kinds::FAQ,
    kinds::OBJECTION,
    kinds::GREETING,
    kinds::ADVICE,
    kinds::FINANCING,
    kinds::SMALLTALK,
];

/// Build a normalized intent label
pub fn intent_label(route: Route, kind: &str) -> String {
    format!("{}:{}", route.as_str(), kind)
}

/// Split a normalized intent into its route prefix and kind
///
/// Labels without a prefix are treated as conversation kinds.
pub fn split_intent(intent: &str) -> (Route, &str) {
    match intent.split_once(':') {
        Some(("catalog", kind)) => (Route::Catalog, kind),
        Some((_, kind)) => (Route::Conversation, kind),
        None => (Route::Conversation, intent),
    }
}

/// Coarse intent class used by context enrichment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentClass {
    /// FAQ, objection, greeting, generic advice
    Conversational,
    /// Search or single-fact lookup
    CatalogLookup,
    /// Everything else (comparisons, scheduling, continuations, ...)
    Other,
}

impl IntentClass {
    pub fn of(intent: &str) -> Self {
        let (route, kind) = split_intent(intent);
        match route {
            Route::Catalog => IntentClass::CatalogLookup,
            Route::Conversation if CONVERSATIONAL_KINDS.contains(&kind) => {
                IntentClass::Conversational
            },
            Route::Conversation => IntentClass::Other,
        }
    }
}

/// Fields the classifier pulled out of the utterance
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fact_type: Option<String>,
    /// Discussion topic hint (e.g. "budget_stretch")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub extra: HashMap<String, String>,
}

impl ExtractedFields {
    /// The filter-shaped subset of these fields
    pub fn as_filters(&self) -> SearchFilters {
        SearchFilters {
            configuration: self.configuration.clone(),
            location: self.location.clone(),
            budget_min: self.budget_min,
            budget_max: self.budget_max,
        }
    }

    /// Fill any missing field from `other`, keeping values already present
    pub fn fill_from(&mut self, other: &ExtractedFields) {
        if self.project_name.is_none() {
            self.project_name = other.project_name.clone();
        }
        if self.location.is_none() {
            self.location = other.location.clone();
        }
        if self.configuration.is_none() {
            self.configuration = other.configuration.clone();
        }
        if self.budget_min.is_none() {
            self.budget_min = other.budget_min;
        }
        if self.budget_max.is_none() {
            self.budget_max = other.budget_max;
        }
        if self.fact_type.is_none() {
            self.fact_type = other.fact_type.clone();
        }
        if self.topic.is_none() {
            self.topic = other.topic.clone();
        }
        for (key, value) in &other.extra {
            self.extra.entry(key.clone()).or_insert_with(|| value.clone());
        }
    }
}

/// Structured verdict returned by the external intent classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierVerdict {
    pub intent: String,
    pub route: Route,
    /// Confidence in [0, 1]
    pub confidence: f32,
    #[serde(default, rename = "extracted_fields")]
    pub fields: ExtractedFields,
}

impl ClassifierVerdict {
    pub fn new(intent: impl Into<String>, route: Route, confidence: f32) -> Self {
        Self {
            intent: intent.into(),
            route,
            confidence: confidence.clamp(0.0, 1.0),
            fields: ExtractedFields::default(),
        }
    }

    pub fn with_fields(mut self, fields: ExtractedFields) -> Self {
        self.fields = fields;
        self
    }

    /// Intent kind with any route prefix removed
    pub fn kind(&self) -> &str {
        split_intent(&self.intent).1
    }
}
