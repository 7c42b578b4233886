//! Dialogue state and decision engine
//!
//! Features:
//! - Context enrichment of vague follow-ups
//! - Deterministic routing between catalog and conversation paths
//! - Conversation stage and engagement tracking
//! - Cross-session profiles with hot/warm/cold lead scoring
//! - Coaching directives and proactive nudges with per-rule cooldowns
//! - Per-session and per-user turn serialization

pub mod catalog;
pub mod classifier;
pub mod coaching;
pub mod engine;
pub mod enrichment;
pub mod extraction;
pub mod lead_scoring;
pub mod locks;
pub mod nudges;
pub mod profile;
pub mod router;
pub mod rules;
pub mod signals;
pub mod stage;
pub mod store;
mod text;

pub use catalog::InMemoryCatalog;
pub use classifier::RuleBasedClassifier;
pub use coaching::CoachingEngine;
pub use engine::{Collaborators, DialogueEngine, TurnInput, TurnOutcome};
pub use enrichment::{ContextEnricher, Enrichment, EnrichmentReason};
pub use extraction::FieldExtractor;
pub use lead_scoring::LeadScorer;
pub use locks::KeyedLocks;
pub use nudges::NudgeDetector;
pub use profile::{ProfileTurn, ProfileUpdater};
pub use router::{RouteAction, RouteDecision, RouteOverride, Router};
pub use rules::{Rule, RuleContext, RuleTable};
pub use signals::{SignalDetector, TurnSignals};
pub use stage::{StageAssessment, StageScorer};
pub use store::{InMemoryProfileStore, InMemorySessionStore};
