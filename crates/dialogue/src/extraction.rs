//! Pattern-based field extraction
//!
//! Pulls configuration, budget and location out of an utterance. Used to
//! correct classifier fields and by the rule-based classifier itself.
//! Budgets are normalized to crores.

use once_cell::sync::Lazy;
use regex::Regex;

use sales_agent_core::ExtractedFields;

static CONFIGURATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b([1-9])\s*-?\s*(?:bhk|bedroom|bed\b)").expect("configuration regex")
});

const UNIT: &str = r"(crores?|cr|lakhs?|lacs?|l)\b";

static BUDGET_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)\b(?:between\s+)?(\d+(?:\.\d+)?)\s*{unit_opt}\s*(?:-|to|and)\s*(\d+(?:\.\d+)?)\s*{UNIT}",
        unit_opt = r"(crores?|cr|lakhs?|lacs?|l)?\b"
    ))
    .expect("budget range regex")
});

static BUDGET_MAX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)\b(?:under|below|within|upto|up to|less than|max(?:imum)?|budget(?:\s+(?:of|is))?)\s*(?:rs\.?|₹)?\s*(\d+(?:\.\d+)?)\s*{UNIT}"
    ))
    .expect("budget max regex")
});

static BUDGET_MIN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)\b(?:above|over|more than|at least|minimum|min|starting)\s*(?:rs\.?|₹)?\s*(\d+(?:\.\d+)?)\s*{UNIT}"
    ))
    .expect("budget min regex")
});

static BARE_AMOUNT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i)\b(\d+(?:\.\d+)?)\s*{UNIT}")).expect("amount regex")
});

static LOCATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:in|at|near|around)\s+([A-Z][A-Za-z]*(?:\s+[A-Z0-9][A-Za-z0-9]*)*)")
        .expect("location regex")
});

/// Words that start a capitalized run but are not places
const NOT_A_PLACE: &[&str] = &["I", "The", "A", "An", "My", "Your", "This", "That"];

/// Convert an amount with a unit to crores
fn to_crores(value: f64, unit: Option<&str>) -> f64 {
    match unit.map(|u| u.to_lowercase()) {
        Some(u) if u.starts_with('l') => value / 100.0,
        _ => value,
    }
}

fn is_unit(word: &str) -> bool {
    matches!(
        word.to_lowercase().as_str(),
        "cr" | "crore" | "crores" | "l" | "lakh" | "lakhs" | "lac" | "lacs" | "bhk"
    )
}

fn parse_amount(number: &str, unit: Option<&str>) -> Option<f64> {
    number
        .parse::<f64>()
        .ok()
        .map(|v| to_crores(v, unit))
        .filter(|v| *v > 0.0)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FieldExtractor;

impl FieldExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract every field that has a pattern
    pub fn extract(&self, utterance: &str) -> ExtractedFields {
        let (budget_min, budget_max) = self.extract_budget(utterance);
        ExtractedFields {
            configuration: self.extract_configuration(utterance),
            location: self.extract_location(utterance),
            budget_min,
            budget_max,
            ..Default::default()
        }
    }

    /// "2BHK", "3 bhk", "2 bedroom" -> "2BHK"
    pub fn extract_configuration(&self, utterance: &str) -> Option<String> {
        CONFIGURATION
            .captures(utterance)
            .and_then(|caps| caps.get(1))
            .map(|n| format!("{}BHK", n.as_str()))
    }

    /// Budget bounds in crores
    pub fn extract_budget(&self, utterance: &str) -> (Option<f64>, Option<f64>) {
        if let Some(caps) = BUDGET_RANGE.captures(utterance) {
            let upper_unit = caps.get(4).map(|m| m.as_str());
            let lower_unit = caps.get(2).map(|m| m.as_str()).or(upper_unit);
            let low = caps.get(1).and_then(|m| parse_amount(m.as_str(), lower_unit));
            let high = caps.get(3).and_then(|m| parse_amount(m.as_str(), upper_unit));
            if low.is_some() || high.is_some() {
                return (low, high);
            }
        }

        let max = BUDGET_MAX.captures(utterance).and_then(|caps| {
            parse_amount(caps.get(1)?.as_str(), caps.get(2).map(|m| m.as_str()))
        });
        let min = BUDGET_MIN.captures(utterance).and_then(|caps| {
            parse_amount(caps.get(1)?.as_str(), caps.get(2).map(|m| m.as_str()))
        });
        if max.is_some() || min.is_some() {
            return (min, max);
        }

        // A bare amount reads as a ceiling
        let bare = BARE_AMOUNT.captures(utterance).and_then(|caps| {
            parse_amount(caps.get(1)?.as_str(), caps.get(2).map(|m| m.as_str()))
        });
        (None, bare)
    }

    /// "in Area X" -> "Area X"
    pub fn extract_location(&self, utterance: &str) -> Option<String> {
        LOCATION.captures_iter(utterance).find_map(|caps| {
            // "in Area X 2 Cr": stop at an amount
            let mut words: Vec<&str> = caps
                .get(1)?
                .as_str()
                .split_whitespace()
                .take_while(|w| !is_unit(w))
                .collect();
            while words.last().is_some_and(|w| w.chars().all(|c| c.is_ascii_digit())) {
                words.pop();
            }
            let first = *words.first()?;
            let place = words.join(" ");
            if NOT_A_PLACE.contains(&first) || place.len() < 2 || place.len() > 40 {
                return None;
            }
            Some(place)
        })
    }
}

/// Overlay pattern-extracted fields on classifier fields
///
/// Configuration and budget follow the patterns when they match; they are
/// exact where a classifier may mis-scale. Location and everything else keep
/// the classifier's value and only fill gaps.
pub fn correct_fields(classifier: &ExtractedFields, local: &ExtractedFields) -> ExtractedFields {
    let mut fields = classifier.clone();
    if local.configuration.is_some() {
        fields.configuration = local.configuration.clone();
    }
    if local.budget_min.is_some() || local.budget_max.is_some() {
        fields.budget_min = local.budget_min;
        fields.budget_max = local.budget_max;
    }
    fields.fill_from(local);
    fields
}
