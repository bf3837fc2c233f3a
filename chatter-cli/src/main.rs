#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::missing_errors_doc, clippy::module_name_repetitions)]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chatter_common::events::{BroadcastSink, EventSink, InMemoryEventLog};
use chatter_common::logging::init_logging;
use chatter_common::Config;
use chatter_core::{IntentMatcher, RandomPicker, Responder};
use clap::{Parser, Subcommand};
use tracing::info;

mod repl;

/// `Chatter` - a rule-based conversational responder.
#[derive(Parser, Debug)]
#[command(name = "chatter")]
#[command(version = "0.1.0")]
#[command(about = "Session-scoped, pattern-matched canned replies.", long_about = None)]
struct Cli {
    /// Config file (default: ~/.chatter/config.json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start an interactive chat session
    Chat {
        /// Print every recorded event as JSON
        #[arg(long)]
        events: bool,
    },

    /// Send one utterance in a fresh session and print the reply
    Ask {
        /// Utterance text
        text: String,

        /// Also print the matched intent and recorded events
        #[arg(long)]
        explain: bool,
    },

    /// List intents in match order
    Intents,

    /// Load and validate the configuration
    Check,
}

fn build_responder(config: &Config, sink: Arc<dyn EventSink>) -> Result<Responder> {
    let matcher = IntentMatcher::with_builtin_rules(Arc::new(RandomPicker))
        .context("Failed to compile built-in rules")?;
    Ok(Responder::new(config, matcher, sink))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load_with_env(cli.config.as_deref())?;
    if cli.verbose {
        config.observability.log_level = "debug".to_string();
    }
    init_logging(&config.observability);

    match cli.command {
        Commands::Check => {
            config
                .validate()
                .map_err(|e| anyhow::anyhow!("{e}"))
                .context("Configuration is invalid")?;
            println!("Configuration OK");
            println!("- Realm: {}", config.realm.realm_id);
            println!("- Nodes: {}", config.realm.nodes.join(", "));
            println!("- Max sessions: {}", config.limits.max_sessions);
            Ok(())
        }

        Commands::Intents => {
            let responder = build_responder(&config, Arc::new(InMemoryEventLog::new()))?;
            for (i, intent) in responder.list_intents().iter().enumerate() {
                println!("{:>2}. {intent}", i + 1);
            }
            Ok(())
        }

        Commands::Ask { text, explain } => {
            let log = Arc::new(InMemoryEventLog::new());
            let responder = build_responder(&config, log.clone())?;

            let id = responder.open_session()?;
            let reply = responder.send_utterance(&id, &text)?;
            println!("{reply}");

            if explain {
                let matched = responder.match_intent(&text)?;
                println!("intent: {}", matched.intent_id);
                for event in log.events() {
                    println!("{}", serde_json::to_string(&event)?);
                }
            }
            responder.close_session(&id);
            Ok(())
        }

        Commands::Chat { events } => {
            config
                .validate()
                .map_err(|e| anyhow::anyhow!("{e}"))
                .context("Configuration is invalid")?;

            let sink = Arc::new(BroadcastSink::new());
            if events {
                repl::spawn_event_printer(sink.subscribe());
            }
            let responder = build_responder(&config, sink)?;

            info!(realm_id = %config.realm.realm_id, "Starting chat");
            repl::run(&responder).await
        }
    }
}
