//! Keyword vocabulary used by signal detection, enrichment and routing
//!
//! Defaults cover English plus common Hinglish phrasing. A deployment can
//! replace any list by pointing `vocabulary_path` at a YAML file; lists that
//! the file omits keep their defaults.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::ConfigError;

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn keyed(entries: &[(&str, &[&str])]) -> BTreeMap<String, Vec<String>> {
    entries
        .iter()
        .map(|(key, words)| (key.to_string(), strings(words)))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VocabularyConfig {
    /// Whole-utterance continuation cues ("more", "tell me more")
    pub continuation_cues: Vec<String>,
    /// Words pointing back at something already discussed
    pub deictic_terms: Vec<String>,
    /// Greetings and pleasantries; never treated as vague
    pub greetings: Vec<String>,
    /// Openers of definitional or process questions
    pub generic_question_prefixes: Vec<String>,
    /// Nouns that tie a question to a specific property
    pub property_terms: Vec<String>,
    /// Verbs that force a catalog search
    pub search_verbs: Vec<String>,

    pub positive_terms: Vec<String>,
    pub negative_terms: Vec<String>,
    pub frustration_markers: Vec<String>,

    /// Objection type -> trigger phrases
    pub objections: BTreeMap<String, Vec<String>>,
    /// Qualification topic (schools, investment) -> trigger phrases
    pub qualification: BTreeMap<String, Vec<String>>,

    pub interest_terms: Vec<String>,
    pub scheduling_terms: Vec<String>,
    pub callback_terms: Vec<String>,
    pub document_terms: Vec<String>,
    pub detail_terms: Vec<String>,
    pub comparison_terms: Vec<String>,
    pub financing_terms: Vec<String>,
    pub advice_terms: Vec<String>,
    /// Fact label -> trigger phrases
    pub fact_terms: BTreeMap<String, Vec<String>>,
}

impl Default for VocabularyConfig {
    fn default() -> Self {
        Self {
            continuation_cues: strings(&[
                "more",
                "tell me more",
                "show me more",
                "go on",
                "continue",
                "and",
                "what else",
                "anything else",
                "elaborate",
                "explain more",
                "more details",
                "more info",
                "aur batao",
                "aur",
            ]),
            deictic_terms: strings(&[
                "that", "this", "it", "those", "these", "there", "them", "one",
            ]),
            greetings: strings(&[
                "hi",
                "hello",
                "hey",
                "namaste",
                "good morning",
                "good afternoon",
                "good evening",
                "thanks",
                "thank you",
                "ok thanks",
                "bye",
            ]),
            generic_question_prefixes: strings(&[
                "what is",
                "what's",
                "what are",
                "what does",
                "how does",
                "how do",
                "how is",
                "how to",
                "how much tax",
                "explain",
                "define",
                "meaning of",
                "difference between",
                "kya hota hai",
            ]),
            property_terms: strings(&[
                "project",
                "property",
                "flat",
                "apartment",
                "unit",
                "tower",
                "villa",
                "plot",
                "price",
                "rera",
                "possession",
                "status",
                "amenities",
                "this",
                "that",
                "it",
                "there",
            ]),
            search_verbs: strings(&["show", "find", "list", "search for", "search", "dikhao"]),
            positive_terms: strings(&[
                "great",
                "good",
                "nice",
                "love",
                "like",
                "perfect",
                "excellent",
                "awesome",
                "sounds good",
                "accha",
                "badhiya",
            ]),
            negative_terms: strings(&[
                "bad",
                "not good",
                "not happy",
                "worst",
                "disappointed",
                "hate",
                "poor",
                "useless",
                "expensive",
                "not interested",
                "bekaar",
            ]),
            frustration_markers: strings(&[
                "already told",
                "told you",
                "again and again",
                "not helpful",
                "useless",
                "waste of time",
                "frustrated",
                "frustrating",
                "annoying",
                "ridiculous",
                "not listening",
            ]),
            objections: keyed(&[
                (
                    "price",
                    &[
                        "expensive",
                        "costly",
                        "overpriced",
                        "too much",
                        "out of budget",
                        "over budget",
                        "can't afford",
                        "cannot afford",
                        "mehenga",
                    ],
                ),
                (
                    "location",
                    &["too far", "far from", "commute", "traffic", "remote area"],
                ),
                (
                    "possession",
                    &["delay", "delayed", "late possession", "not ready", "under construction"],
                ),
                (
                    "trust",
                    &["builder reputation", "scam", "fraud", "not sure about the builder"],
                ),
                ("size", &["too small", "cramped", "carpet area is less"]),
            ]),
            qualification: keyed(&[
                ("schools", &["school", "schools", "education", "kids"]),
                (
                    "investment",
                    &["investment", "invest", "rental yield", "roi", "appreciation", "returns"],
                ),
            ]),
            interest_terms: strings(&[
                "interested",
                "i like",
                "love it",
                "looks good",
                "shortlist",
                "sounds good",
                "i want",
                "keen",
                "pasand",
            ]),
            scheduling_terms: strings(&[
                "site visit",
                "visit",
                "schedule",
                "book a visit",
                "see the property",
                "appointment",
            ]),
            callback_terms: strings(&["call me", "callback", "call back", "ring me"]),
            document_terms: strings(&["brochure", "floor plan", "document", "pdf", "send details"]),
            detail_terms: strings(&[
                "details",
                "tell me about",
                "more about",
                "amenities",
                "specifications",
                "floor plan",
            ]),
            comparison_terms: strings(&["compare", "comparison", "versus", "vs", "better than"]),
            financing_terms: strings(&["loan", "emi", "down payment", "interest rate", "bank"]),
            advice_terms: strings(&["should i", "is it worth", "suggest", "recommend", "advice"]),
            fact_terms: keyed(&[
                ("price", &["price", "cost", "rate", "kitne ka"]),
                ("registration_id", &["rera", "registration"]),
                ("possession_date", &["possession", "handover", "completion"]),
                ("status", &["status", "ready to move", "construction stage"]),
                ("distance", &["distance", "how far", "kitna door"]),
                ("travel_time", &["travel time", "how long to reach", "minutes from"]),
            ]),
        }
    }
}

impl VocabularyConfig {
    /// Load from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ConfigError::FileNotFound(format!("{}: {}", path.as_ref().display(), e))
        })?;

        serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}
