//! Offline reply generator
//!
//! Stands in for a language model when none is wired up: replies are built
//! from the session summary so the console shows what context a model would
//! receive.

use async_trait::async_trait;

use sales_agent_core::{GenerationRequest, Generator, Result};

#[derive(Debug, Default)]
pub struct TemplateGenerator;

impl TemplateGenerator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Generator for TemplateGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let mut reply = String::new();
        if let Some(note) = &request.summary.welcome_back {
            reply.push_str(note);
            reply.push(' ');
        }
        reply.push_str(&format!("You asked: \"{}\".", request.utterance));
        if let Some(reason) = &request.fallback_reason {
            reply.push_str(&format!(" (catalog unavailable: {})", reason));
        }

        let context = request.summary.to_prompt_context();
        if !context.is_empty() {
            reply.push_str("\n[context]\n");
            reply.push_str(&context);
        }
        Ok(reply)
    }

    fn model_name(&self) -> &str {
        "template"
    }
}
