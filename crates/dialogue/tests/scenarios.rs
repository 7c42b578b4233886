//! End-to-end turn scenarios against in-memory collaborators

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use std::sync::Arc;

use sales_agent_config::{Settings, VocabularyConfig};
use sales_agent_core::{
    Catalog, CatalogItem, ClassifierVerdict, ConversationPhase, ConversationSession,
    DirectiveKind, DownstreamAction, Error, ExtractedFields, FactType, GenerationRequest,
    Generator, IntentClassifier, InterestLevel, LeadScores, LeadTemperature, ProfileStore, Result,
    Route, SearchFilters, SessionStore, SessionSummary, UserProfile,
};
use sales_agent_dialogue::{
    Collaborators, DialogueEngine, InMemoryCatalog, InMemoryProfileStore, InMemorySessionStore,
    TurnInput,
};

const CATALOG: &str = r#"[
    {"id": "P1", "name": "Skyline Towers", "location": "Area X",
     "attributes": {"price_cr": 1.8, "configurations": ["2BHK", "3BHK"],
                    "registration_id": "RERA-001", "status": "Under construction"}},
    {"id": "P2", "name": "Green Meadows", "location": "Area X",
     "attributes": {"price_cr": 2.4, "configurations": ["3BHK"]}},
    {"id": "P3", "name": "Lake View", "location": "Area Y",
     "attributes": {"price_cr": 1.2, "configurations": "2BHK, 3BHK"}}
]"#;

// ---------------------------------------------------------------------------
// Collaborator doubles
// ---------------------------------------------------------------------------

/// Returns the same verdict for every utterance
struct FixedClassifier(ClassifierVerdict);

#[async_trait]
impl IntentClassifier for FixedClassifier {
    async fn classify(&self, _: &str, _: &SessionSummary) -> Result<ClassifierVerdict> {
        Ok(self.0.clone())
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

struct FailingClassifier;

#[async_trait]
impl IntentClassifier for FailingClassifier {
    async fn classify(&self, _: &str, _: &SessionSummary) -> Result<ClassifierVerdict> {
        Err(Error::Classifier("model offline".into()))
    }

    fn name(&self) -> &str {
        "failing"
    }
}

struct SlowClassifier(std::time::Duration);

#[async_trait]
impl IntentClassifier for SlowClassifier {
    async fn classify(&self, _: &str, _: &SessionSummary) -> Result<ClassifierVerdict> {
        tokio::time::sleep(self.0).await;
        Ok(ClassifierVerdict::new("catalog:search", Route::Catalog, 0.99))
    }

    fn name(&self) -> &str {
        "slow"
    }
}

/// Echoes the utterance and keeps every request
#[derive(Default)]
struct RecordingGenerator {
    requests: Mutex<Vec<GenerationRequest>>,
}

impl RecordingGenerator {
    fn last(&self) -> Option<GenerationRequest> {
        self.requests.lock().last().cloned()
    }
}

#[async_trait]
impl Generator for RecordingGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        self.requests.lock().push(request.clone());
        Ok(format!("reply to: {}", request.utterance))
    }

    fn model_name(&self) -> &str {
        "recording"
    }
}

struct FailingGenerator;

#[async_trait]
impl Generator for FailingGenerator {
    async fn generate(&self, _: &GenerationRequest) -> Result<String> {
        Err(Error::Generator("upstream 503".into()))
    }

    fn model_name(&self) -> &str {
        "failing"
    }
}

struct FailingCatalog;

#[async_trait]
impl Catalog for FailingCatalog {
    async fn search(&self, _: &SearchFilters) -> Result<Vec<CatalogItem>> {
        Err(Error::Catalog("connection refused".into()))
    }

    async fn lookup(
        &self,
        _: &str,
        _: FactType,
    ) -> Result<Option<(CatalogItem, Option<String>)>> {
        Err(Error::Catalog("connection refused".into()))
    }
}

/// Reads through to memory, rejects every write
struct ReadOnlyProfileStore(InMemoryProfileStore);

#[async_trait]
impl ProfileStore for ReadOnlyProfileStore {
    async fn get_or_create(&self, user_id: &str, now: DateTime<Utc>) -> Result<UserProfile> {
        self.0.get_or_create(user_id, now).await
    }

    async fn get(&self, user_id: &str) -> Result<Option<UserProfile>> {
        self.0.get(user_id).await
    }

    async fn save(&self, _: UserProfile) -> Result<()> {
        Err(Error::Store("profile store is read-only".into()))
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

struct Harness {
    settings: Settings,
    sessions: Arc<InMemorySessionStore>,
    profiles: Arc<InMemoryProfileStore>,
    catalog: Arc<InMemoryCatalog>,
    generator: Arc<RecordingGenerator>,
}

impl Harness {
    fn new() -> Self {
        Self::with_settings(Settings::default())
    }

    fn with_settings(settings: Settings) -> Self {
        Self {
            sessions: Arc::new(InMemorySessionStore::new(&settings.session)),
            profiles: Arc::new(InMemoryProfileStore::new()),
            catalog: Arc::new(InMemoryCatalog::from_json_str(CATALOG).unwrap()),
            generator: Arc::new(RecordingGenerator::default()),
            settings,
        }
    }

    fn engine(&self, classifier: impl IntentClassifier) -> DialogueEngine {
        self.engine_with(Arc::new(classifier), self.catalog.clone(), self.generator.clone())
    }

    fn engine_with(
        &self,
        classifier: Arc<dyn IntentClassifier>,
        catalog: Arc<dyn Catalog>,
        generator: Arc<dyn Generator>,
    ) -> DialogueEngine {
        DialogueEngine::new(
            &self.settings,
            VocabularyConfig::default(),
            Collaborators {
                sessions: self.sessions.clone(),
                profiles: self.profiles.clone(),
                classifier,
                catalog,
                generator,
            },
        )
    }

    fn item(&self, id: &str) -> CatalogItem {
        self.catalog
            .items()
            .iter()
            .find(|item| item.id == id)
            .cloned()
            .unwrap()
    }

    /// Seed a session through the store so revisions stay consistent
    async fn seed(
        &self,
        id: &str,
        now: DateTime<Utc>,
        f: impl FnOnce(&mut ConversationSession),
    ) {
        let mut session = self.sessions.get_or_create(id, now).await.unwrap();
        f(&mut session);
        self.sessions.save(session).await.unwrap();
    }
}

fn verdict(intent: &str, route: Route, confidence: f32) -> ClassifierVerdict {
    ClassifierVerdict::new(intent, route, confidence)
}

fn chat() -> FixedClassifier {
    FixedClassifier(verdict("conversation:smalltalk", Route::Conversation, 0.9))
}

fn price_of(project: &str) -> FixedClassifier {
    FixedClassifier(verdict("catalog:fact", Route::Catalog, 0.9).with_fields(ExtractedFields {
        project_name: Some(project.into()),
        fact_type: Some("price".into()),
        ..Default::default()
    }))
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_explicit_search_lists_matching_items() {
    let h = Harness::new();
    let classifier = FixedClassifier(
        verdict("catalog:search", Route::Catalog, 0.92).with_fields(ExtractedFields {
            configuration: Some("2BHK".into()),
            location: Some("Area X".into()),
            budget_max: Some(2.0),
            ..Default::default()
        }),
    );
    let engine = h.engine(classifier);

    let outcome = engine
        .process_turn(TurnInput::new("s1", "show me 2BHK in Area X under 2 Cr", Utc::now()))
        .await
        .unwrap();

    assert_eq!(outcome.route_taken, Route::Catalog);
    assert_eq!(outcome.normalized_intent, "catalog:search");
    let ids: Vec<&str> = outcome.shown_items.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, vec!["P1"]);
    assert_eq!(
        outcome.reply,
        "Found 1 property for 2BHK properties in Area X under 2 Cr:\n\
         1. Skyline Towers (Area X) - 1.8 Cr"
    );
    assert!(outcome.updated_lead_temperature.is_none());

    let session = h.sessions.get_or_create("s1", Utc::now()).await.unwrap();
    assert_eq!(
        session.filters,
        SearchFilters {
            configuration: Some("2BHK".into()),
            location: Some("Area X".into()),
            budget_min: None,
            budget_max: Some(2.0),
        }
    );
    assert_eq!(session.last_shown.len(), 1);
    assert_eq!(session.message_count, 1);
    assert_eq!(session.history_len(), 2);
}

#[tokio::test]
async fn test_more_continues_conversational_topic() {
    let h = Harness::new();
    let now = Utc::now();
    h.seed("s1", now, |s| {
        s.last_intent = Some("conversation:faq".into());
        s.last_topic = Some("budget_stretch".into());
        s.last_shown = vec![h.item("P1")];
    })
    .await;
    let engine = h.engine(FixedClassifier(verdict("catalog:search", Route::Catalog, 0.95)));

    let outcome = engine
        .process_turn(TurnInput::new("s1", "more", now))
        .await
        .unwrap();

    assert_eq!(outcome.enriched_utterance, "more regarding budget_stretch");
    assert_eq!(outcome.route_taken, Route::Conversation);
    assert_eq!(outcome.normalized_intent, "conversation:faq");
    let request = h.generator.last().unwrap();
    assert_eq!(request.utterance, "more regarding budget_stretch");
}

#[tokio::test]
async fn test_tell_me_more_after_search_refers_to_first_item() {
    let h = Harness::new();
    let now = Utc::now();
    h.seed("s1", now, |s| {
        s.last_intent = Some("catalog:search".into());
        s.last_shown = vec![h.item("P1"), h.item("P2")];
    })
    .await;
    let engine = h.engine(FixedClassifier(verdict("catalog:search", Route::Catalog, 0.95)));

    let outcome = engine
        .process_turn(TurnInput::new("s1", "tell me more", now))
        .await
        .unwrap();

    assert_eq!(outcome.enriched_utterance, "tell me more about Skyline Towers");
    assert_eq!(outcome.route_taken, Route::Conversation);
    assert!(outcome.shown_items.is_empty());

    // last shown survives a conversation turn
    let session = h.sessions.get_or_create("s1", now).await.unwrap();
    assert_eq!(session.last_shown.len(), 2);
}

#[tokio::test]
async fn test_unseen_project_named_explicitly_is_not_enriched() {
    let h = Harness::new();
    let now = Utc::now();
    h.seed("s1", now, |s| {
        s.last_intent = Some("catalog:fact".into());
        s.mark_interested("Green Meadows");
    })
    .await;
    let engine = h.engine(chat());

    let outcome = engine
        .process_turn(TurnInput::new("s1", "what about Lake View", now))
        .await
        .unwrap();
    assert_eq!(outcome.enriched_utterance, "what about Lake View");
    assert_eq!(h.generator.last().unwrap().utterance, "what about Lake View");

    let outcome = engine
        .process_turn(TurnInput::new("s1", "anything in area y", now))
        .await
        .unwrap();
    assert_eq!(outcome.enriched_utterance, "anything in area y");
}

#[tokio::test]
async fn test_continuation_cues_never_reach_catalog() {
    let h = Harness::new();
    let engine = h.engine(FixedClassifier(verdict("catalog:search", Route::Catalog, 0.99)));
    let now = Utc::now();

    engine
        .process_turn(TurnInput::new("s1", "show me 3BHK in Area X", now))
        .await
        .unwrap();
    for cue in ["more", "tell me more", "show me more", "go on"] {
        let outcome = engine
            .process_turn(TurnInput::new("s1", cue, now))
            .await
            .unwrap();
        assert_eq!(outcome.route_taken, Route::Conversation, "cue {:?}", cue);
        assert!(outcome.shown_items.is_empty());
    }
}

#[tokio::test]
async fn test_generic_question_is_not_enriched() {
    let h = Harness::new();
    let now = Utc::now();
    h.seed("s1", now, |s| {
        s.last_intent = Some("catalog:search".into());
        s.last_shown = vec![h.item("P1")];
        s.interested_projects = vec!["Skyline Towers".into()];
    })
    .await;
    let engine = h.engine(FixedClassifier(verdict("conversation:faq", Route::Conversation, 0.8)));

    let outcome = engine
        .process_turn(TurnInput::new("s1", "what is stamp duty", now))
        .await
        .unwrap();
    assert_eq!(outcome.enriched_utterance, "what is stamp duty");
    assert_eq!(outcome.normalized_intent, "conversation:faq");
}

#[tokio::test]
async fn test_three_views_across_sessions_make_interest_high() {
    let h = Harness::new();
    let engine = h.engine(price_of("Skyline Towers"));
    let start = Utc::now();

    let mut outcomes = Vec::new();
    for (i, session_id) in ["d1", "d2", "d3"].iter().enumerate() {
        let now = start + Duration::days(i as i64);
        let outcome = engine
            .process_turn(
                TurnInput::new(*session_id, "what is the price of Skyline Towers", now)
                    .with_user("u1"),
            )
            .await
            .unwrap();
        assert_eq!(outcome.route_taken, Route::Catalog);
        assert_eq!(outcome.shown_items[0].id, "P1");
        outcomes.push(outcome);
    }

    let profile = h.profiles.get("u1").await.unwrap().unwrap();
    assert_eq!(profile.session_count, 3);
    assert_eq!(profile.views("P1"), 3);
    assert_eq!(profile.interest("P1"), InterestLevel::High);

    let nudge = outcomes[2].nudge.as_ref().unwrap();
    assert_eq!(nudge.id, "repeat_view");
    assert_eq!(nudge.kind, DirectiveKind::Nudge);
    assert!(nudge.message.contains("Skyline Towers 3 times"));

    assert_eq!(outcomes[0].welcome_back, None);
    assert_eq!(
        outcomes[1].welcome_back.as_deref(),
        Some("Welcome back! Good to see you again.")
    );
    assert_eq!(
        outcomes[2].welcome_back.as_deref(),
        Some("Welcome back! Last time you were looking at Skyline Towers.")
    );
}

#[tokio::test]
async fn test_welcome_back_only_once_per_session() {
    let h = Harness::new();
    let engine = h.engine(chat());
    let start = Utc::now();

    engine
        .process_turn(TurnInput::new("w1", "hello", start).with_user("u1"))
        .await
        .unwrap();
    let later = start + Duration::days(1);
    let first = engine
        .process_turn(TurnInput::new("w2", "hello again", later).with_user("u1"))
        .await
        .unwrap();
    let second = engine
        .process_turn(TurnInput::new("w2", "any updates", later).with_user("u1"))
        .await
        .unwrap();

    assert!(first.welcome_back.is_some());
    assert!(second.welcome_back.is_none());
}

#[test]
fn test_lead_temperature_bands() {
    let lead = Settings::default().lead;
    let band = |e: f32, i: f32| {
        LeadScores::compute(e, i, lead.hot_threshold, lead.warm_threshold).temperature()
    };
    assert_eq!(band(8.0, 9.0), LeadTemperature::Hot);
    assert_eq!(band(6.0, 5.0), LeadTemperature::Warm);
    assert_eq!(band(2.0, 1.0), LeadTemperature::Cold);
}

// ---------------------------------------------------------------------------
// State bounds and stage
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_history_stays_bounded() {
    let mut settings = Settings::default();
    settings.session.history_limit = 4;
    let h = Harness::with_settings(settings);
    let engine = h.engine(chat());
    let now = Utc::now();

    for i in 0..5 {
        engine
            .process_turn(TurnInput::new("s1", format!("message number {}", i), now))
            .await
            .unwrap();
    }

    let session = h.sessions.get_or_create("s1", now).await.unwrap();
    assert_eq!(session.message_count, 5);
    assert_eq!(session.history_len(), 4);
    let last = session.history().last().unwrap();
    assert_eq!(last.text, "reply to: message number 4");
}

#[tokio::test]
async fn test_stage_never_moves_backwards() {
    let h = Harness::new();
    let engine = h.engine(chat());
    let now = Utc::now();

    let first = engine
        .process_turn(TurnInput::new("s1", "honestly it feels too expensive", now))
        .await
        .unwrap();
    assert_eq!(first.updated_stage, ConversationPhase::Negotiation);

    let second = engine
        .process_turn(TurnInput::new("s1", "what is stamp duty", now))
        .await
        .unwrap();
    assert_eq!(second.updated_stage, ConversationPhase::Negotiation);

    let third = engine
        .process_turn(TurnInput::new("s1", "can we schedule a site visit", now))
        .await
        .unwrap();
    assert_eq!(third.updated_stage, ConversationPhase::Closing);
}

#[tokio::test]
async fn test_classifier_scheduling_intent_moves_to_closing() {
    let h = Harness::new();
    let engine = h.engine(FixedClassifier(verdict(
        "conversation:schedule_visit",
        Route::Conversation,
        0.95,
    )));

    let outcome = engine
        .process_turn(TurnInput::new(
            "s1",
            "can I come and see it on Saturday morning",
            Utc::now(),
        ))
        .await
        .unwrap();
    assert_eq!(outcome.normalized_intent, "conversation:schedule_visit");
    assert_eq!(outcome.updated_stage, ConversationPhase::Closing);

    let session = h.sessions.get_or_create("s1", Utc::now()).await.unwrap();
    assert!(session.scheduling_requested);
}

#[tokio::test]
async fn test_callback_request_coaches_agent() {
    let h = Harness::new();
    let engine = h.engine(chat());

    let outcome = engine
        .process_turn(TurnInput::new("s1", "please call me back this evening", Utc::now()))
        .await
        .unwrap();
    let directive = outcome.coaching_directive.unwrap();
    assert_eq!(directive.id, "confirm_callback");
    assert_eq!(directive.suggested_action.as_deref(), Some("schedule_callback"));
}

#[tokio::test]
async fn test_coaching_cooldown() {
    let h = Harness::new();
    let engine = h.engine(chat());
    let start = Utc::now();

    let first = engine
        .process_turn(TurnInput::new("s1", "this is too expensive", start))
        .await
        .unwrap();
    let directive = first.coaching_directive.unwrap();
    assert_eq!(directive.id, "objection_price");
    assert_eq!(directive.kind, DirectiveKind::Coaching);

    let second = engine
        .process_turn(TurnInput::new(
            "s1",
            "still too expensive",
            start + Duration::minutes(2),
        ))
        .await
        .unwrap();
    assert!(second
        .coaching_directive
        .as_ref()
        .map_or(true, |d| d.id != "objection_price"));

    let third = engine
        .process_turn(TurnInput::new(
            "s1",
            "really too expensive",
            start + Duration::minutes(11),
        ))
        .await
        .unwrap();
    assert_eq!(third.coaching_directive.unwrap().id, "objection_price");
}

// ---------------------------------------------------------------------------
// Failure handling
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_classifier_failure_routes_to_conversation() {
    let h = Harness::new();
    let engine = h.engine(FailingClassifier);

    let outcome = engine
        .process_turn(TurnInput::new("s1", "is Skyline Towers ready", Utc::now()))
        .await
        .unwrap();
    assert_eq!(outcome.route_taken, Route::Conversation);
    assert_eq!(outcome.normalized_intent, "conversation:general");
}

#[tokio::test]
async fn test_classifier_timeout_routes_to_conversation() {
    let mut settings = Settings::default();
    settings.classifier.timeout_ms = 20;
    let h = Harness::with_settings(settings);
    let engine = h.engine(SlowClassifier(std::time::Duration::from_millis(500)));

    let outcome = engine
        .process_turn(TurnInput::new("s1", "is Skyline Towers ready", Utc::now()))
        .await
        .unwrap();
    assert_eq!(outcome.route_taken, Route::Conversation);
    assert_eq!(outcome.normalized_intent, "conversation:general");
}

#[tokio::test]
async fn test_search_verb_routes_to_catalog_without_classifier() {
    let h = Harness::new();
    let engine = h.engine(FailingClassifier);

    let outcome = engine
        .process_turn(TurnInput::new("s1", "show me 3BHK in Area X", Utc::now()))
        .await
        .unwrap();
    assert_eq!(outcome.route_taken, Route::Catalog);
    let ids: Vec<&str> = outcome.shown_items.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, vec!["P1", "P2"]);
}

#[tokio::test]
async fn test_catalog_failure_falls_back_to_generator() {
    let h = Harness::new();
    let engine = h.engine_with(
        Arc::new(FixedClassifier(verdict("catalog:search", Route::Catalog, 0.9))),
        Arc::new(FailingCatalog),
        h.generator.clone(),
    );

    let outcome = engine
        .process_turn(TurnInput::new("s1", "show me 2BHK in Area Y", Utc::now()))
        .await
        .unwrap();
    assert_eq!(outcome.route_taken, Route::Conversation);
    assert_eq!(outcome.normalized_intent, "catalog:search");
    assert!(outcome.shown_items.is_empty());
    let reason = h.generator.last().unwrap().fallback_reason.unwrap();
    assert!(reason.contains("connection refused"));
}

#[tokio::test]
async fn test_unknown_project_lookup_falls_back_to_generator() {
    let h = Harness::new();
    let engine = h.engine(price_of("Nowhere Heights"));

    let outcome = engine
        .process_turn(TurnInput::new("s1", "price of Nowhere Heights", Utc::now()))
        .await
        .unwrap();
    assert_eq!(outcome.route_taken, Route::Conversation);
    assert!(h.generator.last().unwrap().fallback_reason.is_some());
}

#[tokio::test]
async fn test_non_schema_fact_goes_to_conversation() {
    let h = Harness::new();
    let engine = h.engine(FixedClassifier(
        verdict("catalog:fact", Route::Catalog, 0.9).with_fields(ExtractedFields {
            project_name: Some("Skyline Towers".into()),
            fact_type: Some("distance".into()),
            ..Default::default()
        }),
    ));

    let outcome = engine
        .process_turn(
            TurnInput::new("s1", "how far is Skyline Towers from the airport", Utc::now())
                .with_user("u1"),
        )
        .await
        .unwrap();
    assert_eq!(outcome.route_taken, Route::Conversation);
    assert_eq!(outcome.normalized_intent, "conversation:fact");

    // the named project still counts as a view
    let profile = h.profiles.get("u1").await.unwrap().unwrap();
    assert_eq!(profile.views("P1"), 1);
}

#[tokio::test]
async fn test_generator_failure_leaves_state_untouched() {
    let h = Harness::new();
    let now = Utc::now();
    h.engine(chat())
        .process_turn(TurnInput::new("s1", "hello", now).with_user("u1"))
        .await
        .unwrap();

    let broken = h.engine_with(
        Arc::new(chat()),
        h.catalog.clone(),
        Arc::new(FailingGenerator),
    );
    let err = broken
        .process_turn(TurnInput::new("s1", "this is too expensive", now).with_user("u1"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Generator(_)));

    let session = h.sessions.get_or_create("s1", now).await.unwrap();
    assert_eq!(session.message_count, 1);
    assert_eq!(session.history_len(), 2);
    assert_eq!(session.objection_count, 0);

    let profile = h.profiles.get("u1").await.unwrap().unwrap();
    assert_eq!(profile.session_count, 1);
    assert!(profile.objections.is_empty());
}

#[tokio::test]
async fn test_profile_save_failure_fails_turn() {
    let h = Harness::new();
    let engine = DialogueEngine::new(
        &h.settings,
        VocabularyConfig::default(),
        Collaborators {
            sessions: h.sessions.clone(),
            profiles: Arc::new(ReadOnlyProfileStore(InMemoryProfileStore::new())),
            classifier: Arc::new(chat()),
            catalog: h.catalog.clone(),
            generator: h.generator.clone(),
        },
    );
    let now = Utc::now();

    let err = engine
        .process_turn(TurnInput::new("s1", "hello", now).with_user("u1"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Store(_)));

    // session is saved first and stays committed
    let session = h.sessions.get_or_create("s1", now).await.unwrap();
    assert_eq!(session.message_count, 1);

    // anonymous turns never touch the profile store
    engine
        .process_turn(TurnInput::new("s2", "hello", now))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_empty_utterance_rejected() {
    let h = Harness::new();
    let err = h
        .engine(chat())
        .process_turn(TurnInput::new("s1", "   ", Utc::now()))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
    assert_eq!(h.sessions.count().await, 0);
}

#[tokio::test]
async fn test_empty_session_id_starts_new_session() {
    let h = Harness::new();
    let outcome = h
        .engine(chat())
        .process_turn(TurnInput::new("", "hello", Utc::now()))
        .await
        .unwrap();
    assert!(!outcome.session_id.is_empty());
    assert_eq!(h.sessions.count().await, 1);
}

// ---------------------------------------------------------------------------
// Concurrency and downstream actions
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_turns_on_one_session_are_serialized() {
    let h = Harness::new();
    let engine = Arc::new(h.engine(chat()));
    let now = Utc::now();

    let turns = (0..20).map(|i| {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move {
            engine
                .process_turn(TurnInput::new("shared", format!("turn {}", i), now).with_user("u1"))
                .await
        })
    });
    for result in futures::future::join_all(turns).await {
        result.unwrap().unwrap();
    }

    let session = h.sessions.get_or_create("shared", now).await.unwrap();
    assert_eq!(session.message_count, 20);
    assert_eq!(session.revision, 20);
    let profile = h.profiles.get("u1").await.unwrap().unwrap();
    assert_eq!(profile.session_count, 1);
}

#[tokio::test]
async fn test_record_action_rescores_profile() {
    let h = Harness::new();
    let engine = h.engine(chat());
    let now = Utc::now();

    engine
        .process_turn(TurnInput::new("s1", "hello", now).with_user("u1"))
        .await
        .unwrap();
    let before = h.profiles.get("u1").await.unwrap().unwrap().scores();

    let after = engine
        .record_action("u1", DownstreamAction::SiteVisitScheduled, now)
        .await
        .unwrap();
    assert!(after.intent() > before.intent());

    let profile = h.profiles.get("u1").await.unwrap().unwrap();
    assert_eq!(profile.site_visits_scheduled, 1);
    assert_eq!(profile.scores(), after);

    let err = engine
        .record_action(" ", DownstreamAction::CallbackRequested, now)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
}
