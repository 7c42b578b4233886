//! Intent classifier interface

use crate::intent::ClassifierVerdict;
use crate::summary::SessionSummary;
use crate::Result;
use async_trait::async_trait;

/// Black-box natural-language classifier
///
/// Implementations may be remote model calls or local rules. The engine
/// treats an error, a timeout and a low-confidence verdict alike: the turn
/// goes down the conversation path.
#[async_trait]
pub trait IntentClassifier: Send + Sync + 'static {
    /// Classify one (possibly enriched) utterance
    async fn classify(&self, utterance: &str, summary: &SessionSummary)
        -> Result<ClassifierVerdict>;

    /// Name for logging
    fn name(&self) -> &str;
}
