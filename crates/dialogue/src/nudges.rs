//! Proactive nudge detector
//!
//! User-facing suggestions driven by behavioral counters rather than by the
//! current utterance. Shares arbitration with coaching but keeps its own
//! cooldown memory, so both can fire in the same turn.

use sales_agent_config::NudgeConfig;
use sales_agent_core::{
    ConversationSession, Directive, DirectiveKind, Priority, Result, ShownMemory, UserProfile,
};

use crate::rules::{Rule, RuleContext, RuleTable};

/// Display name for an item id: profile label, then a shown item, then the id
fn item_label(id: &str, session: &ConversationSession, profile: Option<&UserProfile>) -> String {
    if let Some(label) = profile.map(|p| p.label(id)).filter(|l| *l != id) {
        return label.to_string();
    }
    session
        .last_shown
        .iter()
        .find(|item| item.id == id)
        .map(|item| item.label().to_string())
        .unwrap_or_else(|| id.to_string())
}

/// Item with the most views across session and profile counters
///
/// Ties go to the lexically smallest id so the choice is stable.
fn most_viewed(
    session: &ConversationSession,
    profile: Option<&UserProfile>,
) -> Option<(String, u32)> {
    let mut ids: Vec<&String> = session.item_views.keys().collect();
    if let Some(profile) = profile {
        ids.extend(profile.view_counts().keys());
    }
    ids.sort();
    ids.dedup();
    ids.into_iter()
        .map(|id| {
            let in_session = session.item_views.get(id).copied().unwrap_or(0);
            let overall = profile.map_or(0, |p| p.views(id));
            (id.clone(), in_session.max(overall))
        })
        .fold(None, |best: Option<(String, u32)>, (id, count)| match best {
            Some((_, top)) if top >= count => best,
            _ => Some((id, count)),
        })
}

/// Largest entry of a counter map, ties to the smallest key
fn top_entry<'a, I>(entries: I) -> Option<(&'a str, u32)>
where
    I: IntoIterator<Item = (&'a String, u32)>,
{
    let mut entries: Vec<(&str, u32)> = entries
        .into_iter()
        .map(|(key, count)| (key.as_str(), count))
        .collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    entries.into_iter().next()
}

pub struct NudgeDetector {
    enabled: bool,
    table: RuleTable,
}

impl NudgeDetector {
    pub fn new(config: &NudgeConfig) -> Self {
        let mut table = RuleTable::new(DirectiveKind::Nudge, config.cooldown_secs);

        let repeat_min = config.repeat_view_min;
        table.push(
            Rule::new(
                "repeat_view",
                Priority::High,
                "You have looked at {item} {count} times. Would you like me to arrange a site \
                 visit?",
                move |ctx: &RuleContext<'_>| {
                    let (id, count) = most_viewed(ctx.session, ctx.profile)?;
                    (count >= repeat_min).then(|| {
                        vec![
                            ("item", item_label(&id, ctx.session, ctx.profile)),
                            ("count", count.to_string()),
                        ]
                    })
                },
            )
            .with_action("offer_site_visit"),
        );

        table.push(
            Rule::new(
                "returning_unresolved",
                Priority::High,
                "Still thinking about {item}? I can set up a visit whenever suits you.",
                |ctx: &RuleContext<'_>| {
                    let profile = ctx.profile?;
                    if !profile.is_returning() || profile.site_visits_scheduled > 0 {
                        return None;
                    }
                    let id = profile.last_interested.last()?;
                    Some(vec![("item", item_label(id, ctx.session, Some(profile)))])
                },
            )
            .with_action("offer_site_visit"),
        );

        let objection_min = config.repeated_objection_min;
        table.push(
            Rule::new(
                "repeated_objection",
                Priority::Medium,
                "It sounds like {objection} keeps coming up. Shall I show options that fit better \
                 on that front?",
                move |ctx: &RuleContext<'_>| {
                    let (objection, count) = top_entry(
                        ctx.session
                            .objections
                            .iter()
                            .map(|(kind, record)| (kind, record.count)),
                    )?;
                    (count >= objection_min).then(|| vec![("objection", objection.to_string())])
                },
            )
            .with_action("show_alternatives"),
        );

        let many_min = config.many_items_min;
        table.push(
            Rule::new(
                "many_items",
                Priority::Medium,
                "You have explored {count} properties. Want a side-by-side comparison of the ones \
                 you liked?",
                move |ctx: &RuleContext<'_>| {
                    let viewed = ctx.session.distinct_items_viewed();
                    (viewed >= many_min).then(|| vec![("count", viewed.to_string())])
                },
            )
            .with_action("offer_comparison"),
        );

        let location_min = config.location_focus_min;
        table.push(
            Rule::new(
                "location_focus",
                Priority::Medium,
                "You keep coming back to {location}. Shall I list everything available there?",
                move |ctx: &RuleContext<'_>| {
                    let (key, count) = top_entry(
                        ctx.session
                            .location_mentions
                            .iter()
                            .map(|(location, count)| (location, *count)),
                    )?;
                    if count < location_min {
                        return None;
                    }
                    let location = ctx
                        .session
                        .filters
                        .location
                        .clone()
                        .filter(|l| l.eq_ignore_ascii_case(key))
                        .unwrap_or_else(|| key.to_string());
                    Some(vec![("location", location)])
                },
            )
            .with_action("search_location"),
        );

        let long_minutes = config.long_session_minutes;
        table.push(
            Rule::new(
                "long_session",
                Priority::Low,
                "We have been chatting for {minutes} minutes. Would a quick call with an advisor \
                 help?",
                move |ctx: &RuleContext<'_>| {
                    let minutes = ctx.session.duration(ctx.now).num_minutes();
                    (minutes >= long_minutes).then(|| vec![("minutes", minutes.to_string())])
                },
            )
            .with_action("offer_callback"),
        );

        Self {
            enabled: config.enabled,
            table,
        }
    }

    pub fn select(
        &self,
        ctx: &RuleContext<'_>,
        memory: &ShownMemory,
    ) -> Result<Option<Directive>> {
        if !self.enabled {
            return Ok(None);
        }
        self.table.select(ctx, memory)
    }

    pub fn rule_ids(&self) -> impl Iterator<Item = &str> {
        self.table.rule_ids()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::TurnSignals;
    use chrono::{Duration, Utc};
    use sales_agent_core::CatalogItem;

    fn detector() -> NudgeDetector {
        NudgeDetector::new(&NudgeConfig::default())
    }

    fn select(session: &ConversationSession, profile: Option<&UserProfile>) -> Option<Directive> {
        let signals = TurnSignals::default();
        let ctx = RuleContext {
            session,
            profile,
            signals: &signals,
            utterance: "",
            now: session.last_activity,
        };
        detector().select(&ctx, &session.nudges).unwrap()
    }

    #[test]
    fn test_repeat_view_from_session_counts() {
        let mut session = ConversationSession::new("s1", Utc::now());
        session.last_shown = vec![CatalogItem::new("P1", "Skyline Towers", "Area X")];
        for _ in 0..3 {
            session.record_view("P1");
        }
        let nudge = select(&session, None).unwrap();
        assert_eq!(nudge.id, "repeat_view");
        assert_eq!(
            nudge.message,
            "You have looked at Skyline Towers 3 times. Would you like me to arrange a site visit?"
        );
    }

    #[test]
    fn test_repeat_view_uses_profile_counts() {
        let now = Utc::now();
        let session = ConversationSession::new("s2", now);
        let mut profile = UserProfile::new("u1", now);
        profile.remember_label("P1", "Skyline Towers");
        for _ in 0..4 {
            profile.record_view("P1");
        }
        let nudge = select(&session, Some(&profile)).unwrap();
        assert_eq!(nudge.id, "repeat_view");
        assert!(nudge.message.contains("4 times"));
    }

    #[test]
    fn test_two_views_not_enough() {
        let mut session = ConversationSession::new("s1", Utc::now());
        session.record_view("P1");
        session.record_view("P1");
        assert!(select(&session, None).is_none());
    }

    #[test]
    fn test_returning_user_with_unresolved_interest() {
        let now = Utc::now();
        let session = ConversationSession::new("s2", now);
        let mut profile = UserProfile::new("u1", now);
        profile.session_count = 2;
        profile.remember_label("P2", "Green Meadows");
        profile.raise_interest("P2", sales_agent_core::InterestLevel::Medium);

        let nudge = select(&session, Some(&profile)).unwrap();
        assert_eq!(nudge.id, "returning_unresolved");
        assert!(nudge.message.contains("Green Meadows"));

        profile.record_action(sales_agent_core::DownstreamAction::SiteVisitScheduled);
        assert!(select(&session, Some(&profile)).is_none());
    }

    #[test]
    fn test_repeated_objection() {
        let now = Utc::now();
        let mut session = ConversationSession::new("s1", now);
        session.record_objection("price", now);
        assert!(select(&session, None).is_none());
        session.record_objection("price", now);
        let nudge = select(&session, None).unwrap();
        assert_eq!(nudge.id, "repeated_objection");
        assert_eq!(nudge.priority, Priority::Medium);
    }

    #[test]
    fn test_many_items_and_location_focus() {
        let mut session = ConversationSession::new("s1", Utc::now());
        for i in 1..=5 {
            session.record_view(&format!("P{}", i));
        }
        assert_eq!(select(&session, None).unwrap().id, "many_items");

        let mut session = ConversationSession::new("s1", Utc::now());
        session.filters.location = Some("Area X".into());
        for _ in 0..3 {
            session.record_location_mention("Area X");
        }
        let nudge = select(&session, None).unwrap();
        assert_eq!(nudge.id, "location_focus");
        assert!(nudge.message.contains("Area X"));
    }

    #[test]
    fn test_long_session() {
        let start = Utc::now();
        let mut session = ConversationSession::new("s1", start);
        session.touch(start + Duration::minutes(16));
        let nudge = select(&session, None).unwrap();
        assert_eq!(nudge.id, "long_session");
        assert_eq!(nudge.priority, Priority::Low);
    }

    #[test]
    fn test_independent_cooldown() {
        let mut session = ConversationSession::new("s1", Utc::now());
        for _ in 0..3 {
            session.record_view("P1");
        }
        session.nudges.record("repeat_view", session.last_activity);
        assert!(select(&session, None).is_none());
        // coaching memory does not affect nudges
        session.nudges = ShownMemory::default();
        session.coaching.record("repeat_view", session.last_activity);
        assert!(select(&session, None).is_some());
    }
}
