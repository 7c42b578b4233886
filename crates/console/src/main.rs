//! Sales Agent Console Entry Point
//!
//! Reads one utterance per line from stdin and prints each turn outcome as
//! JSON. Lines starting with `/` are commands:
//!
//! ```text
//! /user <id>        attach a user id to the following turns
//! /anon             drop the user id
//! /new              start a new session
//! /action <action>  site_visit_scheduled | callback_requested | document_downloaded
//! /quit
//! ```

mod generator;

use anyhow::Context;
use chrono::Utc;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use sales_agent_config::{load_settings, Settings};
use sales_agent_core::DownstreamAction;
use sales_agent_dialogue::{
    Collaborators, DialogueEngine, InMemoryCatalog, InMemoryProfileStore, InMemorySessionStore,
    RuleBasedClassifier, TurnInput,
};

use generator::TemplateGenerator;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Priority: env vars > config/{env}.yaml > config/default.yaml > defaults
    let env = std::env::var("SALES_AGENT_ENV").ok();
    let settings = match load_settings(env.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            // Tracing not yet initialized
            eprintln!("Warning: Failed to load config: {}. Using defaults.", e);
            Settings::default()
        },
    };

    init_tracing(&settings);
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = ?settings.environment,
        "Starting sales agent console"
    );

    let vocabulary = settings
        .load_vocabulary()
        .context("loading vocabulary")?;
    let catalog = InMemoryCatalog::load(&settings.catalog_path)
        .with_context(|| format!("loading catalog from {}", settings.catalog_path))?;
    let classifier = RuleBasedClassifier::new(vocabulary.clone()).with_projects(catalog.items());

    let engine = DialogueEngine::new(
        &settings,
        vocabulary,
        Collaborators {
            sessions: Arc::new(InMemorySessionStore::new(&settings.session)),
            profiles: Arc::new(InMemoryProfileStore::new()),
            classifier: Arc::new(classifier),
            catalog: Arc::new(catalog),
            generator: Arc::new(TemplateGenerator::new()),
        },
    );

    run(&engine).await
}

async fn run(engine: &DialogueEngine) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut session_id = String::new();
    let mut user_id: Option<String> = None;

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(command) = line.strip_prefix('/') {
            let (name, arg) = command
                .split_once(char::is_whitespace)
                .map(|(n, a)| (n, a.trim()))
                .unwrap_or((command, ""));
            match name {
                "quit" | "exit" => break,
                "new" => {
                    session_id.clear();
                    println!("new session");
                },
                "user" if !arg.is_empty() => {
                    user_id = Some(arg.to_string());
                    println!("user: {}", arg);
                },
                "anon" => {
                    user_id = None;
                    println!("anonymous");
                },
                "action" => match (&user_id, parse_action(arg)) {
                    (Some(user), Some(action)) => {
                        match engine.record_action(user, action, Utc::now()).await {
                            Ok(scores) => println!("{}", serde_json::to_string_pretty(&scores)?),
                            Err(e) => eprintln!("error: {}", e),
                        }
                    },
                    (None, _) => eprintln!("set a user with /user first"),
                    (_, None) => eprintln!("unknown action: {}", arg),
                },
                _ => eprintln!("unknown command: /{}", name),
            }
            continue;
        }

        let mut input = TurnInput::new(session_id.clone(), line, Utc::now());
        if let Some(user) = &user_id {
            input = input.with_user(user.clone());
        }
        match engine.process_turn(input).await {
            Ok(outcome) => {
                session_id = outcome.session_id.clone();
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            },
            Err(e) => {
                tracing::error!(session_id = %session_id, error = %e, "Turn failed");
                eprintln!("error: {}", e);
            },
        }
    }

    tracing::info!("Console closed");
    Ok(())
}

fn parse_action(name: &str) -> Option<DownstreamAction> {
    serde_json::from_value(serde_json::Value::String(name.to_string())).ok()
}

fn init_tracing(settings: &Settings) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = &settings.observability.log_level;
        format!("sales_agent={},sales_agent_dialogue={}", level, level).into()
    });

    // Logs go to stderr so stdout stays machine-readable
    let fmt_layer = if settings.observability.log_json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .boxed()
    };
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_action() {
        assert_eq!(
            parse_action("site_visit_scheduled"),
            Some(DownstreamAction::SiteVisitScheduled)
        );
        assert_eq!(parse_action("callback_requested"), Some(DownstreamAction::CallbackRequested));
        assert_eq!(parse_action("teleport"), None);
    }
}
