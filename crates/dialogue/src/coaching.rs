//! Coaching rule engine
//!
//! Agent-facing prompts: what the sales side should do next. One directive
//! at most per turn, chosen by [`RuleTable::select`].

use sales_agent_config::{CoachingConfig, VocabularyConfig};
use sales_agent_core::{Directive, DirectiveKind, LeadTemperature, Priority, Result, ShownMemory};

use crate::rules::{Rule, RuleContext, RuleTable};

fn objection_template(objection: &str) -> &'static str {
    match objection {
        "price" => {
            "Price concern raised. Explain the value, payment plans and any current offers \
             before quoting numbers again."
        },
        "location" => {
            "Location concern raised. Highlight connectivity, commute times and upcoming \
             infrastructure near {location}."
        },
        "possession" => {
            "Possession timeline concern. Share the construction status and the registered \
             completion date."
        },
        "trust" => {
            "Trust concern raised. Cite the builder's delivered projects and the registration \
             id of the project."
        },
        "size" => {
            "Size concern raised. Compare carpet area and layout efficiency with similar options."
        },
        _ => "{objection} concern raised. Acknowledge it and answer with specifics.",
    }
}

pub struct CoachingEngine {
    enabled: bool,
    table: RuleTable,
}

impl CoachingEngine {
    pub fn new(config: &CoachingConfig, vocabulary: &VocabularyConfig) -> Self {
        let mut table = RuleTable::new(DirectiveKind::Coaching, config.cooldown_secs);

        table.push(
            Rule::new(
                "hot_lead_close",
                Priority::High,
                "Hot lead (engagement {engagement}, intent {intent}). Move to close: propose a \
                 site visit or a booking slot.",
                |ctx: &RuleContext<'_>| {
                    let profile = ctx.profile?;
                    let scores = profile.scores();
                    (scores.temperature() == LeadTemperature::Hot
                        && profile.site_visits_scheduled == 0)
                        .then(|| {
                            vec![
                                ("engagement", format!("{:.1}", scores.engagement())),
                                ("intent", format!("{:.1}", scores.intent())),
                            ]
                        })
                },
            )
            .with_action("propose_booking"),
        );

        let threshold = config.frustration_threshold;
        table.push(
            Rule::new(
                "frustration_deescalate",
                Priority::High,
                "User frustration is {level}/10. Acknowledge the problem, keep the reply short \
                 and confirm what they need.",
                move |ctx: &RuleContext<'_>| {
                    (ctx.session.frustration >= threshold)
                        .then(|| vec![("level", ctx.session.frustration.to_string())])
                },
            )
            .with_action("deescalate"),
        );

        for objection in vocabulary.objections.keys() {
            let kind = objection.clone();
            table.push(
                Rule::new(
                    format!("objection_{}", objection),
                    Priority::High,
                    objection_template(objection),
                    move |ctx: &RuleContext<'_>| {
                        ctx.signals.has_objection(&kind).then(|| {
                            let location = ctx
                                .session
                                .filters
                                .location
                                .clone()
                                .unwrap_or_else(|| "the project".to_string());
                            vec![("objection", kind.clone()), ("location", location)]
                        })
                    },
                )
                .with_action("handle_objection"),
            );
        }

        let min_viewed = config.site_visit_min_viewed;
        let min_messages = config.site_visit_min_messages;
        table.push(
            Rule::new(
                "suggest_site_visit",
                Priority::High,
                "User has viewed {viewed} properties over {messages} messages. Suggest a site \
                 visit.",
                move |ctx: &RuleContext<'_>| {
                    let viewed = ctx.session.distinct_items_viewed();
                    let visited = ctx.profile.is_some_and(|p| p.site_visits_scheduled > 0);
                    (viewed >= min_viewed
                        && ctx.session.message_count >= min_messages
                        && !visited
                        && !ctx.session.scheduling_requested)
                        .then(|| {
                            vec![
                                ("viewed", viewed.to_string()),
                                ("messages", ctx.session.message_count.to_string()),
                            ]
                        })
                },
            )
            .with_action("offer_site_visit"),
        );

        table.push(
            Rule::new(
                "confirm_callback",
                Priority::High,
                "User asked for a call back. Confirm the number and a time slot that suits them.",
                |ctx: &RuleContext<'_>| ctx.signals.callback.then(Vec::new),
            )
            .with_action("schedule_callback"),
        );

        table.push(
            Rule::new(
                "share_documents",
                Priority::Medium,
                "User asked for documents. Share the brochure and floor plans for {project}.",
                |ctx: &RuleContext<'_>| {
                    ctx.signals.document.then(|| {
                        let project = ctx
                            .session
                            .most_recent_interest()
                            .or_else(|| ctx.session.last_shown.first().map(|item| item.label()))
                            .unwrap_or("the shortlisted projects")
                            .to_string();
                        vec![("project", project)]
                    })
                },
            )
            .with_action("send_documents"),
        );

        table.push(Rule::new(
            "qualify_schools",
            Priority::Medium,
            "Family buyer signal. Ask about school preferences and daily commute.",
            |ctx: &RuleContext<'_>| ctx.signals.mentions_qualification("schools").then(Vec::new),
        ));

        table.push(Rule::new(
            "qualify_investment",
            Priority::Medium,
            "Investor signal. Discuss rental yield, appreciation and exit options.",
            |ctx: &RuleContext<'_>| {
                ctx.signals
                    .mentions_qualification("investment")
                    .then(Vec::new)
            },
        ));

        let contact_min = config.contact_capture_min_messages;
        table.push(
            Rule::new(
                "capture_contact",
                Priority::Low,
                "Ask for a phone number or email so details can be shared after the chat.",
                move |ctx: &RuleContext<'_>| {
                    let has_contact = ctx
                        .profile
                        .is_some_and(|p| p.phone.is_some() || p.email.is_some());
                    (ctx.session.message_count >= contact_min && !has_contact).then(Vec::new)
                },
            )
            .with_action("capture_contact"),
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
