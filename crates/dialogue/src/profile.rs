//! Folding turns into the long-lived user profile

use chrono::{DateTime, Utc};

use sales_agent_core::{CatalogItem, InterestLevel, SearchFilters, UserProfile};

use crate::signals::TurnSignals;

/// What one turn contributes to the profile
#[derive(Debug, Clone)]
pub struct ProfileTurn<'a> {
    /// Item this turn was about, if any
    pub viewed: Option<&'a CatalogItem>,
    pub filters: &'a SearchFilters,
    pub signals: &'a TurnSignals,
    pub now: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ProfileUpdater;

impl ProfileUpdater {
    pub fn new() -> Self {
        Self
    }

    /// Count the first turn of a fresh session
    pub fn begin_session(&self, profile: &mut UserProfile, session_id: &str, now: DateTime<Utc>) {
        profile.session_count = profile.session_count.saturating_add(1);
        profile.last_session_id = Some(session_id.to_string());
        profile.updated_at = now;
        tracing::debug!(
            user_id = %profile.user_id,
            session_id = %session_id,
            session_count = profile.session_count,
            "Counted new session"
        );
    }

    pub fn apply(&self, profile: &mut UserProfile, turn: &ProfileTurn<'_>) {
        if let Some(item) = turn.viewed {
            profile.remember_label(&item.id, item.label());
            let mut level = profile.record_view(&item.id);
            if turn.signals.interest {
                level = profile.raise_interest(&item.id, InterestLevel::Medium);
            }
            tracing::debug!(
                user_id = %profile.user_id,
                item = %item.id,
                views = profile.views(&item.id),
                interest = ?level,
                "Recorded item view"
            );
        }

        let prefs = &mut profile.preferences;
        prefs.merge_budget(turn.filters.budget_min, turn.filters.budget_max);
        if let Some(configuration) = &turn.filters.configuration {
            prefs.add_configuration(configuration);
        }
        if let Some(location) = &turn.filters.location {
            prefs.add_location(location);
        }

        for objection in &turn.signals.objections {
            profile.record_objection(objection);
        }
        profile.record_sentiment(turn.signals.sentiment, turn.now);
        profile.updated_at = turn.now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sales_agent_core::Sentiment;

    fn turn<'a>(
        item: Option<&'a CatalogItem>,
        filters: &'a SearchFilters,
        signals: &'a TurnSignals,
    ) -> ProfileTurn<'a> {
        ProfileTurn {
            viewed: item,
            filters,
            signals,
            now: Utc::now(),
        }
    }

    #[test]
    fn test_begin_session() {
        let mut profile = UserProfile::new("u1", Utc::now());
        let updater = ProfileUpdater::new();

        updater.begin_session(&mut profile, "s1", Utc::now());
        updater.begin_session(&mut profile, "s2", Utc::now());
        assert_eq!(profile.session_count, 2);
        assert_eq!(profile.last_session_id.as_deref(), Some("s2"));
        assert!(profile.is_returning());
    }

    #[test]
    fn test_three_views_make_interest_high() {
        let mut profile = UserProfile::new("u1", Utc::now());
        let item = CatalogItem::new("P1", "Skyline Towers", "Area X");
        let filters = SearchFilters::default();
        let signals = TurnSignals::default();
        let updater = ProfileUpdater::new();

        for _ in 0..3 {
            updater.apply(&mut profile, &turn(Some(&item), &filters, &signals));
        }
        assert_eq!(profile.views("P1"), 3);
        assert_eq!(profile.interest("P1"), InterestLevel::High);
        assert_eq!(profile.label("P1"), "Skyline Towers");
    }

    #[test]
    fn test_explicit_interest_raises_to_medium() {
        let mut profile = UserProfile::new("u1", Utc::now());
        let item = CatalogItem::new("P2", "Green Meadows", "Area Y");
        let filters = SearchFilters::default();
        let signals = TurnSignals {
            interest: true,
            sentiment: Sentiment::Positive,
            ..Default::default()
        };

        ProfileUpdater::new().apply(&mut profile, &turn(Some(&item), &filters, &signals));
        assert_eq!(profile.views("P2"), 1);
        assert_eq!(profile.interest("P2"), InterestLevel::Medium);
        assert_eq!(profile.latest_sentiment(), Some(Sentiment::Positive));
    }

    #[test]
    fn test_preferences_and_objections_merged() {
        let mut profile = UserProfile::new("u1", Utc::now());
        let filters = SearchFilters {
            configuration: Some("2bhk".into()),
            location: Some("Area X".into()),
            budget_min: None,
            budget_max: Some(2.0),
        };
        let signals = TurnSignals {
            objections: vec!["price".into()],
            ..Default::default()
        };
        let updater = ProfileUpdater::new();
        updater.apply(&mut profile, &turn(None, &filters, &signals));
        updater.apply(&mut profile, &turn(None, &filters, &signals));

        assert!(profile.preferences.configurations.contains("2BHK"));
        assert!(profile.preferences.locations.contains("Area X"));
        assert_eq!(profile.preferences.budget_max, Some(2.0));
        assert_eq!(profile.objections.get("price"), Some(&2));
    }
}
