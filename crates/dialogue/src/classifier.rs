//! Keyword-driven intent classifier
//!
//! A deterministic stand-in for the external NLU service, built from the
//! same vocabulary as signal detection. Rules are checked in order and the
//! first hit decides the verdict:
//!
//! ```text
//! greeting -> generic question -> objection -> scheduling -> comparison
//!   -> catalog fact -> financing -> advice -> project details
//!   -> search fields -> smalltalk (below the routing threshold)
//! ```

use async_trait::async_trait;

use sales_agent_config::VocabularyConfig;
use sales_agent_core::{
    intent_label, kinds, CatalogItem, ClassifierVerdict, ExtractedFields, FactType,
    IntentClassifier, Result, Route, SessionSummary,
};

use crate::extraction::FieldExtractor;
use crate::text::{first_mention, is_one_of, mentions, mentions_any, normalize};

/// Known project reference: id and display name
#[derive(Debug, Clone)]
struct ProjectName {
    id: String,
    name: String,
}

pub struct RuleBasedClassifier {
    vocabulary: VocabularyConfig,
    projects: Vec<ProjectName>,
    extractor: FieldExtractor,
}

impl RuleBasedClassifier {
    pub fn new(vocabulary: VocabularyConfig) -> Self {
        Self {
            vocabulary,
            projects: Vec::new(),
            extractor: FieldExtractor::new(),
        }
    }

    /// Recognize these catalog items by id or name
    pub fn with_projects<'a>(mut self, items: impl IntoIterator<Item = &'a CatalogItem>) -> Self {
        self.projects.extend(items.into_iter().map(|item| ProjectName {
            id: item.id.to_lowercase(),
            name: item.label().to_string(),
        }));
        self
    }

    fn project_mentioned(&self, text: &str) -> Option<String> {
        self.projects
            .iter()
            .find(|p| mentions(text, &p.id) || mentions(text, &p.name.to_lowercase()))
            .map(|p| p.name.clone())
    }

    fn fact_mentioned(&self, text: &str) -> Option<String> {
        self.vocabulary
            .fact_terms
            .iter()
            .find(|(_, phrases)| mentions_any(text, phrases))
            .map(|(label, _)| label.clone())
    }

    fn is_generic(&self, text: &str) -> Option<String> {
        let prefix = self
            .vocabulary
            .generic_question_prefixes
            .iter()
            .map(|p| p.to_lowercase())
            .find(|p| text.starts_with(p.as_str()) && mentions(text, p))?;
        if mentions_any(text, &self.vocabulary.property_terms) {
            return None;
        }
        Some(slug(&text[prefix.len()..]))
    }

    fn verdict(&self, utterance: &str, summary: &SessionSummary) -> ClassifierVerdict {
        let text = normalize(utterance);
        let vocab = &self.vocabulary;
        let conversation = |kind: &str| intent_label(Route::Conversation, kind);

        let mut fields = self.extractor.extract(utterance);
        let named_project = self.project_mentioned(&text);
        fields.project_name = named_project.clone();

        if is_one_of(&text, &vocab.greetings) {
            return ClassifierVerdict::new(conversation(kinds::GREETING), Route::Conversation, 0.9)
                .with_fields(fields);
        }

        if named_project.is_none() {
            if let Some(topic) = self.is_generic(&text) {
                fields.topic = Some(topic).filter(|t| !t.is_empty());
                return ClassifierVerdict::new(conversation(kinds::FAQ), Route::Conversation, 0.8)
                    .with_fields(fields);
            }
        }

        if let Some((objection, _)) = vocab
            .objections
            .iter()
            .find(|(_, phrases)| mentions_any(&text, phrases))
        {
            fields.topic = Some(objection.clone());
            return ClassifierVerdict::new(
                conversation(kinds::OBJECTION),
                Route::Conversation,
                0.8,
            )
            .with_fields(fields);
        }

        if mentions_any(&text, &vocab.scheduling_terms) {
            return ClassifierVerdict::new(
                conversation(kinds::SCHEDULE_VISIT),
                Route::Conversation,
                0.85,
            )
            .with_fields(fields);
        }

        if mentions_any(&text, &vocab.comparison_terms) {
            return ClassifierVerdict::new(
                conversation(kinds::COMPARISON),
                Route::Conversation,
                0.75,
            )
            .with_fields(fields);
        }

        if let Some(fact) = self.fact_mentioned(&text) {
            let in_schema = FactType::parse(&fact).is_some();
            let project = named_project.clone().or_else(|| {
                summary
                    .interested_projects
                    .last()
                    .or_else(|| summary.last_shown.first())
                    .cloned()
            });
            if !in_schema || project.is_some() {
                fields.fact_type = Some(fact);
                fields.project_name = project;
                let confidence = if in_schema { 0.85 } else { 0.7 };
                return ClassifierVerdict::new(
                    intent_label(Route::Catalog, kinds::FACT),
                    Route::Catalog,
                    confidence,
                )
                .with_fields(fields);
            }
        }

        if let Some(term) = first_mention(&text, &vocab.financing_terms) {
            fields.topic = Some(slug(term));
            return ClassifierVerdict::new(
                conversation(kinds::FINANCING),
                Route::Conversation,
                0.8,
            )
            .with_fields(fields);
        }

        if mentions_any(&text, &vocab.advice_terms) {
            return ClassifierVerdict::new(conversation(kinds::ADVICE), Route::Conversation, 0.7)
                .with_fields(fields);
        }

        if named_project.is_some() {
            return ClassifierVerdict::new(conversation(kinds::DETAILS), Route::Conversation, 0.75)
                .with_fields(fields);
        }

        if !fields.as_filters().is_empty() {
            return ClassifierVerdict::new(
                intent_label(Route::Catalog, kinds::SEARCH),
                Route::Catalog,
                0.8,
            )
            .with_fields(fields);
        }

        ClassifierVerdict::new(conversation(kinds::SMALLTALK), Route::Conversation, 0.3)
            .with_fields(ExtractedFields::default())
    }
}

#[async_trait]
impl IntentClassifier for RuleBasedClassifier {
    async fn classify(
        &self,
        utterance: &str,
        summary: &SessionSummary,
    ) -> Result<ClassifierVerdict> {
        let verdict = self.verdict(utterance, summary);
        tracing::trace!(intent = %verdict.intent, confidence = verdict.confidence, "Classified");
        Ok(verdict)
    }

    fn name(&self) -> &str {
        "rule-based"
    }
}

/// "emi calculated" -> "emi_calculated"
fn slug(text: &str) -> String {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}
