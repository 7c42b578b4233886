//! Per-utterance signal detection
//!
//! Keyword-driven: every list comes from [`VocabularyConfig`], so the
//! detector has no built-in notion of language.

use serde::{Deserialize, Serialize};

use sales_agent_config::constants::signals::{
    FRUSTRATION_EXCLAMATION, FRUSTRATION_PER_MARKER, FRUSTRATION_SHOUTING,
};
use sales_agent_config::VocabularyConfig;
use sales_agent_core::Sentiment;

use crate::text::{mentions, mentions_any, normalize};

/// What one utterance tells us about the user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TurnSignals {
    pub sentiment: Sentiment,
    /// 0-10
    pub frustration: u8,
    /// Objection types raised, in vocabulary order
    pub objections: Vec<String>,
    pub interest: bool,
    pub scheduling: bool,
    pub callback: bool,
    pub document: bool,
    pub detail_request: bool,
    /// Qualification topics mentioned (schools, investment)
    pub qualification: Vec<String>,
}

impl TurnSignals {
    pub fn has_objection(&self, objection_type: &str) -> bool {
        self.objections.iter().any(|o| o == objection_type)
    }

    pub fn mentions_qualification(&self, topic: &str) -> bool {
        self.qualification.iter().any(|q| q == topic)
    }
}

pub struct SignalDetector {
    vocabulary: VocabularyConfig,
}

impl SignalDetector {
    pub fn new(vocabulary: VocabularyConfig) -> Self {
        Self { vocabulary }
    }

    pub fn detect(&self, utterance: &str) -> TurnSignals {
        let text = normalize(utterance);
        let vocab = &self.vocabulary;

        let frustration = self.frustration(utterance, &text);
        let objections: Vec<String> = vocab
            .objections
            .iter()
            .filter(|(_, phrases)| mentions_any(&text, phrases))
            .map(|(kind, _)| kind.clone())
            .collect();

        let qualification = vocab
            .qualification
            .iter()
            .filter(|(_, phrases)| mentions_any(&text, phrases))
            .map(|(topic, _)| topic.clone())
            .collect();

        TurnSignals {
            sentiment: self.sentiment(&text, frustration),
            frustration,
            objections,
            interest: vocab
                .interest_terms
                .iter()
                .any(|term| affirmed(&text, &term.to_lowercase())),
            scheduling: mentions_any(&text, &vocab.scheduling_terms),
            callback: mentions_any(&text, &vocab.callback_terms),
            document: mentions_any(&text, &vocab.document_terms),
            detail_request: mentions_any(&text, &vocab.detail_terms),
            qualification,
        }
    }

    fn sentiment(&self, text: &str, frustration: u8) -> Sentiment {
        let count = |terms: &[String]| {
            terms
                .iter()
                .filter(|t| mentions(text, &t.to_lowercase()))
                .count()
        };
        let positive = count(&self.vocabulary.positive_terms);
        let negative = count(&self.vocabulary.negative_terms);

        if frustration >= 5 || (negative > 0 && negative >= positive) {
            Sentiment::Negative
        } else if positive > negative {
            Sentiment::Positive
        } else {
            Sentiment::Neutral
        }
    }

    fn frustration(&self, raw: &str, text: &str) -> u8 {
        let markers = self
            .vocabulary
            .frustration_markers
            .iter()
            .filter(|m| mentions(text, &m.to_lowercase()))
            .count();
        let mut score = (markers as u32) * u32::from(FRUSTRATION_PER_MARKER);

        if raw.matches('!').count() >= 2 {
            score += u32::from(FRUSTRATION_EXCLAMATION);
        }

        let shouted = raw
            .split_whitespace()
            .filter(|w| {
                let letters: Vec<char> = w.chars().filter(|c| c.is_alphabetic()).collect();
                letters.len() >= 3 && letters.iter().all(|c| c.is_uppercase())
            })
            .count();
        if shouted >= 2 {
            score += u32::from(FRUSTRATION_SHOUTING);
        }

        score.min(10) as u8
    }
}

/// Mentioned and not directly negated ("not interested")
fn affirmed(text: &str, term: &str) -> bool {
    mentions(text, term)
        && !mentions(text, &format!("not {}", term))
        && !mentions(text, &format!("don't {}", term))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> SignalDetector {
        SignalDetector::new(VocabularyConfig::default())
    }

    #[test]
    fn test_objection_detection() {
        let signals = detector().detect("This is too expensive and too far from my office");
        assert_eq!(signals.objections, vec!["location", "price"]);
        assert!(signals.has_objection("price"));
        assert_eq!(signals.sentiment, Sentiment::Negative);
    }

    #[test]
    fn test_frustration_score() {
        let d = detector();
        assert_eq!(d.detect("show me 2BHK in Area X").frustration, 0);

        let signals = d.detect("I ALREADY TOLD you this, useless!!");
        assert!(signals.frustration >= 8);
        assert_eq!(signals.sentiment, Sentiment::Negative);
    }

    #[test]
    fn test_interest_and_negation() {
        let d = detector();
        assert!(d.detect("I am interested in Skyline Towers").interest);
        assert!(!d.detect("not interested in this one").interest);
    }

    #[test]
    fn test_positive_sentiment() {
        assert_eq!(
            detector().detect("That looks great, nice amenities").sentiment,
            Sentiment::Positive
        );
        assert_eq!(detector().detect("not good").sentiment, Sentiment::Negative);
    }

    #[test]
    fn test_action_cues() {
        let signals = detector().detect("Can I schedule a site visit? Also send the brochure");
        assert!(signals.scheduling);
        assert!(signals.document);
        assert!(!signals.callback);
    }

    #[test]
    fn test_qualification_keywords() {
        let signals = detector().detect("Are there good schools nearby? It's also an investment");
        assert_eq!(signals.qualification, vec!["investment", "schools"]);
        assert!(signals.mentions_qualification("schools"));
    }
}
