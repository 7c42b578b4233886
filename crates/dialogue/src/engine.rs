//! Turn processing
//!
//! `DialogueEngine::process_turn` runs one user utterance through the whole
//! pipeline:
//!
//! ```text
//! lock session (+ user) -> load copies -> signals -> enrichment
//!   -> classifier (timeout) -> router -> catalog | generator
//!   -> history / counters -> stage -> profile + lead score
//!   -> coaching + nudges -> save session -> save profile
//! ```
//!
//! Nothing is written until the very end, so a turn that fails before the
//! saves leaves both stores as they were.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use sales_agent_config::{Settings, VocabularyConfig};
use sales_agent_core::{
    format_crores, kinds, new_session_id, split_intent, Catalog, CatalogItem, ClassifierVerdict,
    ConversationPhase, ConversationSession, Directive, DownstreamAction, Error, FactType,
    GenerationRequest, Generator, IntentClassifier, LeadScores, LeadTemperature, ProfileStore,
    Result, Route, SearchFilters, SessionStore, SessionSummary, TurnRole, UserProfile,
};

use crate::coaching::CoachingEngine;
use crate::enrichment::ContextEnricher;
use crate::extraction::FieldExtractor;
use crate::lead_scoring::LeadScorer;
use crate::locks::KeyedLocks;
use crate::nudges::NudgeDetector;
use crate::profile::{ProfileTurn, ProfileUpdater};
use crate::router::{RouteAction, RouteDecision, Router};
use crate::rules::RuleContext;
use crate::signals::{SignalDetector, TurnSignals};
use crate::stage::StageScorer;

/// Search results listed in a catalog reply
const MAX_SHOWN_ITEMS: usize = 5;

/// External systems the engine talks to
#[derive(Clone)]
pub struct Collaborators {
    pub sessions: Arc<dyn SessionStore>,
    pub profiles: Arc<dyn ProfileStore>,
    pub classifier: Arc<dyn IntentClassifier>,
    pub catalog: Arc<dyn Catalog>,
    pub generator: Arc<dyn Generator>,
}

/// One inbound user message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnInput {
    /// Empty means "start a new session"
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub utterance: String,
    pub now: DateTime<Utc>,
}

impl TurnInput {
    pub fn new(
        session_id: impl Into<String>,
        utterance: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            user_id: None,
            utterance: utterance.into(),
            now,
        }
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }
}

/// Everything the caller needs to render the turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnOutcome {
    pub session_id: String,
    /// Path that produced the reply (after any catalog fallback)
    pub route_taken: Route,
    pub normalized_intent: String,
    pub enriched_utterance: String,
    pub reply: String,
    pub shown_items: Vec<CatalogItem>,
    pub coaching_directive: Option<Directive>,
    pub nudge: Option<Directive>,
    pub welcome_back: Option<String>,
    pub updated_stage: ConversationPhase,
    pub updated_engagement_score: f32,
    /// `None` for anonymous sessions
    pub updated_lead_temperature: Option<LeadTemperature>,
}

/// Result of the catalog / generator step
struct Execution {
    route_taken: Route,
    reply: String,
    shown: Vec<CatalogItem>,
    /// Specific item this turn was about
    focus: Option<CatalogItem>,
    /// Search results replace the session's last shown list
    replaces_shown: bool,
}

pub struct DialogueEngine {
    sessions: Arc<dyn SessionStore>,
    profiles: Arc<dyn ProfileStore>,
    classifier: Arc<dyn IntentClassifier>,
    catalog: Arc<dyn Catalog>,
    generator: Arc<dyn Generator>,

    session_locks: KeyedLocks,
    user_locks: KeyedLocks,
    classifier_timeout: Duration,

    signals: SignalDetector,
    enricher: ContextEnricher,
    extractor: FieldExtractor,
    router: Router,
    stage: StageScorer,
    profile_updater: ProfileUpdater,
    lead: LeadScorer,
    coaching: CoachingEngine,
    nudges: NudgeDetector,
}

impl DialogueEngine {
    pub fn new(
        settings: &Settings,
        vocabulary: VocabularyConfig,
        collaborators: Collaborators,
    ) -> Self {
        Self {
            sessions: collaborators.sessions,
            profiles: collaborators.profiles,
            classifier: collaborators.classifier,
            catalog: collaborators.catalog,
            generator: collaborators.generator,
            session_locks: KeyedLocks::new(),
            user_locks: KeyedLocks::new(),
            classifier_timeout: Duration::from_millis(settings.classifier.timeout_ms),
            enricher: ContextEnricher::new(&vocabulary, settings.enrichment.vague_max_words),
            extractor: FieldExtractor::new(),
            router: Router::new(&vocabulary, settings.classifier.min_confidence),
            stage: StageScorer::new(settings.stage.clone(), settings.engagement.clone()),
            profile_updater: ProfileUpdater::new(),
            lead: LeadScorer::new(settings.lead.clone()),
            coaching: CoachingEngine::new(&settings.coaching, &vocabulary),
            nudges: NudgeDetector::new(&settings.nudges),
            signals: SignalDetector::new(vocabulary),
        }
    }

    /// Process one user utterance
    pub async fn process_turn(&self, input: TurnInput) -> Result<TurnOutcome> {
        let utterance = input.utterance.trim();
        if utterance.is_empty() {
            return Err(Error::InvalidInput("empty utterance".to_string()));
        }
        let now = input.now;
        let session_id = match input.session_id.trim() {
            "" => new_session_id(),
            id => id.to_string(),
        };
        let user_id = input
            .user_id
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(str::to_string);

        // Session first, then user; the user lock is never taken first
        let _session_guard = self.session_locks.lock(&session_id).await;
        let _user_guard = match &user_id {
            Some(user_id) => Some(self.user_locks.lock(user_id).await),
            None => None,
        };

        let mut session = self.sessions.get_or_create(&session_id, now).await?;
        let mut profile = match &user_id {
            Some(user_id) => Some(self.profiles.get_or_create(user_id, now).await?),
            None => None,
        };
        let session_started = session.message_count == 0;
        if session.user_id.is_none() {
            session.user_id = user_id.clone();
        }

        let signals = self.signals.detect(utterance);
        let known = self.reference_terms(&session_id).await;
        let enrichment = self.enricher.enrich(utterance, &session, &known);
        if enrichment.enriched {
            tracing::debug!(
                session_id = %session_id,
                reason = ?enrichment.reason,
                enriched = %enrichment.text,
                "Enriched utterance"
            );
        }

        let summary = SessionSummary::from_session(&session, profile.as_ref());
        let verdict = self.classify(&session_id, &enrichment.text, &summary).await;
        let decision = self
            .router
            .route(verdict.as_ref(), utterance, &enrichment.text, &mut session);

        let mut welcome_back = None;
        if let Some(profile) = profile.as_mut() {
            if session_started {
                self.profile_updater.begin_session(profile, &session_id, now);
            }
            welcome_back = self.lead.welcome_back(profile, &mut session);
        }

        let summary = SessionSummary::from_session(&session, profile.as_ref())
            .with_welcome_back(welcome_back.clone());
        let execution = self
            .execute(&decision, &enrichment.text, &session, summary)
            .await?;

        tracing::info!(
            session_id = %session_id,
            route = %execution.route_taken,
            intent = %decision.intent,
            shown = execution.shown.len(),
            "Turn executed"
        );

        // Session bookkeeping
        session.push_turn(TurnRole::User, utterance, now);
        session.push_turn(TurnRole::Assistant, execution.reply.clone(), now);
        session.message_count = session.message_count.saturating_add(1);
        session.record_affect(signals.sentiment, signals.frustration, now);
        for objection in &signals.objections {
            session.record_objection(objection, now);
        }
        if signals.scheduling || split_intent(&decision.intent).1 == kinds::SCHEDULE_VISIT {
            session.scheduling_requested = true;
        }
        let mentioned_location = self
            .extractor
            .extract_location(utterance)
            .or_else(|| verdict.as_ref().and_then(|v| v.fields.location.clone()));
        if let Some(location) = &mentioned_location {
            session.record_location_mention(location);
        }
        if execution.replaces_shown {
            session.last_shown = execution.shown.clone();
        }
        if let Some(item) = &execution.focus {
            session.record_view(&item.id);
            session.mark_interested(item.label());
            if signals.detail_request {
                session.record_detail_request(&item.id);
            }
        }
        session.touch(now);
        let assessment = self.stage.apply(&mut session);

        let search_filters = match &decision.action {
            RouteAction::Search { filters } => filters.clone(),
            _ => SearchFilters::default(),
        };
        let lead_temperature = profile.as_mut().map(|profile| {
            self.profile_updater.apply(
                profile,
                &ProfileTurn {
                    viewed: execution.focus.as_ref(),
                    filters: &search_filters,
                    signals: &signals,
                    now,
                },
            );
            self.lead.rescore(profile).temperature()
        });

        let (coaching_directive, nudge) =
            self.advise(&session, profile.as_ref(), &signals, utterance, now);
        if let Some(directive) = &coaching_directive {
            session.coaching.record(&directive.id, now);
        }
        if let Some(directive) = &nudge {
            session.nudges.record(&directive.id, now);
        }

        let outcome = TurnOutcome {
            session_id: session_id.clone(),
            route_taken: execution.route_taken,
            normalized_intent: decision.intent.clone(),
            enriched_utterance: enrichment.text,
            reply: execution.reply,
            shown_items: execution.shown,
            coaching_directive,
            nudge,
            welcome_back,
            updated_stage: assessment.phase,
            updated_engagement_score: assessment.engagement,
            updated_lead_temperature: lead_temperature,
        };

        // Session then profile; a failed profile save leaves the session
        // already committed
        self.sessions.save(session).await?;
        if let Some(profile) = profile {
            let user_id = profile.user_id.clone();
            if let Err(e) = self.profiles.save(profile).await {
                tracing::error!(
                    session_id = %session_id,
                    user_id = %user_id,
                    error = %e,
                    "Profile save failed after session commit, turn partially written"
                );
                return Err(e);
            }
        }

        Ok(outcome)
    }

    /// Report an action completed outside the conversation
    ///
    /// The profile is re-scored immediately.
    pub async fn record_action(
        &self,
        user_id: &str,
        action: DownstreamAction,
        now: DateTime<Utc>,
    ) -> Result<LeadScores> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(Error::InvalidInput("empty user id".to_string()));
        }
        let _guard = self.user_locks.lock(user_id).await;

        let mut profile = self.profiles.get_or_create(user_id, now).await?;
        profile.record_action(action);
        profile.updated_at = now;
        let scores = self.lead.rescore(&mut profile);
        self.profiles.save(profile).await?;

        tracing::info!(
            user_id = %user_id,
            action = ?action,
            temperature = %scores.temperature(),
            "Recorded downstream action"
        );
        Ok(scores)
    }

    /// Catalog references for enrichment; a failure only weakens enrichment
    async fn reference_terms(&self, session_id: &str) -> Vec<String> {
        self.catalog.reference_terms().await.unwrap_or_else(|e| {
            tracing::debug!(session_id = %session_id, error = %e, "Reference terms unavailable");
            Vec::new()
        })
    }

    /// Classifier call bounded by the configured timeout
    ///
    /// Errors and timeouts are logged and reported as no verdict.
    async fn classify(
        &self,
        session_id: &str,
        text: &str,
        summary: &SessionSummary,
    ) -> Option<ClassifierVerdict> {
        let call = self.classifier.classify(text, summary);
        match tokio::time::timeout(self.classifier_timeout, call).await {
            Ok(Ok(verdict)) => Some(verdict),
            Ok(Err(e)) => {
                tracing::warn!(
                    session_id = %session_id,
                    classifier = self.classifier.name(),
                    error = %e,
                    "Classifier failed, routing to conversation"
                );
                None
            },
            Err(_) => {
                tracing::warn!(
                    session_id = %session_id,
                    classifier = self.classifier.name(),
                    timeout_ms = self.classifier_timeout.as_millis() as u64,
                    "Classifier timed out, routing to conversation"
                );
                None
            },
        }
    }

    async fn execute(
        &self,
        decision: &RouteDecision,
        text: &str,
        session: &ConversationSession,
        summary: SessionSummary,
    ) -> Result<Execution> {
        let fallback_reason = match &decision.action {
            RouteAction::Search { filters } => match self.catalog.search(filters).await {
                Ok(items) => return Ok(search_execution(filters, items)),
                Err(e) => {
                    tracing::warn!(
                        session_id = %session.id,
                        error = %e,
                        "Catalog search failed, falling back to generator"
                    );
                    e.to_string()
                },
            },
            RouteAction::Lookup { project, fact } => {
                match self.catalog.lookup(project, *fact).await {
                    Ok(Some((item, value))) => return Ok(lookup_execution(item, *fact, value)),
                    Ok(None) => {
                        tracing::debug!(
                            session_id = %session.id,
                            project = %project,
                            "Unknown project, falling back to generator"
                        );
                        format!("no catalog entry for {}", project)
                    },
                    Err(e) => {
                        tracing::warn!(
                            session_id = %session.id,
                            error = %e,
                            "Catalog lookup failed, falling back to generator"
                        );
                        e.to_string()
                    },
                }
            },
            RouteAction::Converse => {
                return self.converse(decision, text, session, summary, None).await;
            },
        };

        self.converse(decision, text, session, summary, Some(fallback_reason))
            .await
    }

    async fn converse(
        &self,
        decision: &RouteDecision,
        text: &str,
        session: &ConversationSession,
        summary: SessionSummary,
        fallback_reason: Option<String>,
    ) -> Result<Execution> {
        let request = GenerationRequest {
            utterance: text.to_string(),
            history: session.history().cloned().collect(),
            summary,
            fallback_reason,
        };
        let reply = self.generator.generate(&request).await.map_err(|e| {
            tracing::error!(
                session_id = %session.id,
                model = self.generator.model_name(),
                error = %e,
                "Generation failed"
            );
            e
        })?;

        Ok(Execution {
            route_taken: Route::Conversation,
            reply,
            shown: Vec::new(),
            focus: self.resolve_focus(decision, session).await,
            replaces_shown: false,
        })
    }

    /// Item a conversation turn is about: the project the router resolved,
    /// matched against what was shown, then against the catalog
    async fn resolve_focus(
        &self,
        decision: &RouteDecision,
        session: &ConversationSession,
    ) -> Option<CatalogItem> {
        let project = decision.fields.project_name.as_deref()?;
        if let Some(item) = session.last_shown.iter().find(|item| item.is_named(project)) {
            return Some(item.clone());
        }
        match self.catalog.lookup(project, FactType::Name).await {
            Ok(found) => found.map(|(item, _)| item),
            Err(e) => {
                tracing::debug!(project = %project, error = %e, "Focus lookup failed");
                None
            },
        }
    }

    /// Run both rule engines; neither may fail the turn
    fn advise(
        &self,
        session: &ConversationSession,
        profile: Option<&UserProfile>,
        signals: &TurnSignals,
        utterance: &str,
        now: DateTime<Utc>,
    ) -> (Option<Directive>, Option<Directive>) {
        let ctx = RuleContext {
            session,
            profile,
            signals,
            utterance,
            now,
        };
        let coaching = guarded("coaching", &session.id, || {
            self.coaching.select(&ctx, &session.coaching)
        });
        let nudge = guarded("nudge", &session.id, || {
            self.nudges.select(&ctx, &session.nudges)
        });
        (coaching, nudge)
    }
}

/// Evaluate an advisory rule engine, turning errors and panics into "nothing"
fn guarded<F>(engine: &str, session_id: &str, select: F) -> Option<Directive>
where
    F: FnOnce() -> Result<Option<Directive>>,
{
    match catch_unwind(AssertUnwindSafe(select)) {
        Ok(Ok(directive)) => directive,
        Ok(Err(e)) => {
            tracing::warn!(
                session_id = %session_id,
                engine = engine,
                error = %e,
                "Rule evaluation failed"
            );
            None
        },
        Err(_) => {
            tracing::warn!(
                session_id = %session_id,
                engine = engine,
                "Rule evaluation panicked"
            );
            None
        },
    }
}

fn search_execution(filters: &SearchFilters, items: Vec<CatalogItem>) -> Execution {
    let shown: Vec<CatalogItem> = items.into_iter().take(MAX_SHOWN_ITEMS).collect();
    let description = filters
        .describe()
        .unwrap_or_else(|| "your search".to_string());

    let reply = if shown.is_empty() {
        format!(
            "No properties match {}. Want me to widen the search?",
            description
        )
    } else {
        let mut lines = vec![format!(
            "Found {} {} for {}:",
            shown.len(),
            if shown.len() == 1 { "property" } else { "properties" },
            description
        )];
        for (i, item) in shown.iter().enumerate() {
            let price = item
                .price_crores()
                .map(|p| format!(" - {} Cr", format_crores(p)))
                .unwrap_or_default();
            lines.push(format!("{}. {} ({}){}", i + 1, item.label(), item.location, price));
        }
        lines.join("\n")
    };

    Execution {
        route_taken: Route::Catalog,
        reply,
        shown,
        focus: None,
        replaces_shown: true,
    }
}

fn lookup_execution(item: CatalogItem, fact: FactType, value: Option<String>) -> Execution {
    let label = fact.as_str().replace('_', " ");
    let reply = match value {
        Some(value) => format!("The {} of {} is {}.", label, item.label(), value),
        None => format!("I don't have the {} for {} on record yet.", label, item.label()),
    };
    Execution {
        route_taken: Route::Catalog,
        reply,
        shown: vec![item.clone()],
        focus: Some(item),
        replaces_shown: false,
    }
}
