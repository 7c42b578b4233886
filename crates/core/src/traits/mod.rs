//! Collaborator traits
//!
//! The engine reaches every external system through one of these:
//!
//! ```text
//!   - IntentClassifier: utterance -> structured verdict (black-box NLU)
//!   - Catalog: structured search and single-fact lookup
//!   - Generator: free-form reply generation
//!   - SessionStore / ProfileStore: state persistence
//! ```

mod catalog;
mod classifier;
mod generator;
mod store;

pub use catalog::Catalog;
pub use classifier::IntentClassifier;
pub use generator::Generator;
pub use store::{ProfileStore, SessionStore};
