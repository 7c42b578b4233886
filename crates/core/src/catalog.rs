//! Catalog records and structured search filters
//!
//! The catalog itself is an external collaborator. These types only pin down
//! the fields the engine reads: an item's identity, name, location and a bag
//! of schema attributes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A listing returned by the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    /// Stable identifier (e.g. "P1")
    pub id: String,
    /// Project name
    pub name: String,
    /// Location / locality
    pub location: String,
    /// Remaining schema attributes (price, status, registration id, ...)
    #[serde(default)]
    pub attributes: BTreeMap<String, serde_json::Value>,
}

impl CatalogItem {
    /// Create an item with no attributes
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            location: location.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Builder-style attribute setter
    pub fn with_attribute(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    /// Display label: the name, falling back to the id
    pub fn label(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }

    /// True when `reference` names this item by id or name (case-insensitive)
    pub fn is_named(&self, reference: &str) -> bool {
        let reference = reference.trim();
        self.id.eq_ignore_ascii_case(reference) || self.name.eq_ignore_ascii_case(reference)
    }

    /// Read a single catalog fact as display text
    pub fn fact(&self, fact: FactType) -> Option<String> {
        match fact {
            FactType::Name => Some(self.name.clone()),
            FactType::Location => Some(self.location.clone()),
            other => other
                .attribute_keys()
                .iter()
                .find_map(|key| self.attributes.get(*key))
                .map(|value| match value {
                    serde_json::Value::String(s) => s.clone(),
                    v => v.to_string(),
                }),
        }
    }

    /// Price in crores, if the item carries one
    pub fn price_crores(&self) -> Option<f64> {
        self.attributes
            .get("price_cr")
            .or_else(|| self.attributes.get("price"))
            .and_then(|v| v.as_f64())
    }

    /// Configurations offered (e.g. ["2BHK", "3BHK"])
    pub fn configurations(&self) -> Vec<String> {
        match self.attributes.get("configurations") {
            Some(serde_json::Value::Array(values)) => values
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            Some(serde_json::Value::String(s)) => s
                .split(',')
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Attributes that exist verbatim in the catalog schema and can be answered
/// by a single-fact lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactType {
    Price,
    RegistrationId,
    PossessionDate,
    Status,
    Location,
    Name,
}

impl FactType {
    /// Parse a classifier-provided fact label; unknown labels (distance,
    /// travel time, ...) are not catalog facts
    pub fn parse(label: &str) -> Option<Self> {
        let normalized = label.trim().to_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "price" | "cost" | "rate" | "pricing" => Some(Self::Price),
            "registration_id" | "rera" | "rera_id" | "rera_number" | "registration" => {
                Some(Self::RegistrationId)
            },
            "possession_date" | "possession" | "handover" | "completion_date" => {
                Some(Self::PossessionDate)
            },
            "status" | "construction_status" | "availability" => Some(Self::Status),
            "location" | "address" | "locality" => Some(Self::Location),
            "name" | "project_name" => Some(Self::Name),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Price => "price",
            Self::RegistrationId => "registration_id",
            Self::PossessionDate => "possession_date",
            Self::Status => "status",
            Self::Location => "location",
            Self::Name => "name",
        }
    }

    fn attribute_keys(&self) -> &'static [&'static str] {
        match self {
            Self::Price => &["price_display", "price_cr", "price"],
            Self::RegistrationId => &["registration_id", "rera_id"],
            Self::PossessionDate => &["possession_date"],
            Self::Status => &["status"],
            Self::Location => &["location"],
            Self::Name => &["name"],
        }
    }
}

impl std::fmt::Display for FactType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured search filters carried in session state
///
/// Budgets are in crores.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configuration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget_min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget_max: Option<f64>,
}

impl SearchFilters {
    pub fn is_empty(&self) -> bool {
        self.configuration.is_none()
            && self.location.is_none()
            && self.budget_min.is_none()
            && self.budget_max.is_none()
    }

    /// Overlay `other` on top of `self`; fields present in `other` win
    pub fn merged_with(&self, other: &SearchFilters) -> SearchFilters {
        SearchFilters {
            configuration: other.configuration.clone().or_else(|| self.configuration.clone()),
            location: other.location.clone().or_else(|| self.location.clone()),
            budget_min: other.budget_min.or(self.budget_min),
            budget_max: other.budget_max.or(self.budget_max),
        }
    }

    /// Human-readable description used for enrichment and summaries,
    /// e.g. "2BHK properties in Area X"
    pub fn describe(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        let mut text = match &self.configuration {
            Some(config) => format!("{} properties", config),
            None => "properties".to_string(),
        };
        if let Some(location) = &self.location {
            text.push_str(&format!(" in {}", location));
        }
        if let Some(max) = self.budget_max {
            text.push_str(&format!(" under {} Cr", format_crores(max)));
        }
        Some(text)
    }

    /// True when `item` satisfies every filter present
    pub fn matches(&self, item: &CatalogItem) -> bool {
        if let Some(location) = &self.location {
            if !item
                .location
                .to_lowercase()
                .contains(&location.to_lowercase())
            {
                return false;
            }
        }
        if let Some(config) = &self.configuration {
            if !item
                .configurations()
                .iter()
                .any(|c| c.eq_ignore_ascii_case(config))
            {
                return false;
            }
        }
        match item.price_crores() {
            Some(price) => {
                if self.budget_max.is_some_and(|max| price > max) {
                    return false;
                }
                if self.budget_min.is_some_and(|min| price < min) {
                    return false;
                }
            },
            None => {
                if self.budget_max.is_some() || self.budget_min.is_some() {
                    return false;
                }
            },
        }
        true
    }
}

/// Format a crore amount without a trailing ".0"
pub fn format_crores(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}
