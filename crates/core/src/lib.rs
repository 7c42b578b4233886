//! Core types and traits for the sales dialogue engine
//!
//! This crate provides the foundational types shared by the other crates:
//! - Conversation session state and the cross-session user profile
//! - Classifier verdicts, catalog records and search filters
//! - Coaching / nudge directives
//! - Collaborator traits (classifier, catalog, generator, stores)
//! - Error types

pub mod catalog;
pub mod directive;
pub mod error;
pub mod intent;
pub mod profile;
pub mod session;
pub mod summary;
pub mod traits;

pub use catalog::{format_crores, CatalogItem, FactType, SearchFilters};
pub use directive::{Directive, DirectiveKind, Priority};
pub use error::{Error, Result};
pub use intent::{
    intent_label, kinds, split_intent, ClassifierVerdict, ExtractedFields, IntentClass, Route,
};
pub use profile::{
    DownstreamAction, InterestLevel, LeadScores, LeadTemperature, Preferences, UserProfile,
};
pub use session::{
    new_session_id, AffectSample, ConversationPhase, ConversationSession, HistoryTurn,
    ObjectionRecord, Sentiment, ShownMemory, TurnRole,
};
pub use summary::{GenerationRequest, SessionSummary};

pub use traits::{Catalog, Generator, IntentClassifier, ProfileStore, SessionStore};
