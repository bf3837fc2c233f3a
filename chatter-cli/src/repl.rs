//! Interactive chat loop.

use anyhow::Result;
use chatter_common::events::Event;
use chatter_common::Error;
use chatter_core::{Responder, SessionId};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;

const PROMPT_HELP: &str = "Type a message. /history shows the transcript, /new starts over, /quit exits.";

/// Print events from the sink as JSON lines until the channel closes.
pub fn spawn_event_printer(mut rx: broadcast::Receiver<Event>) {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => match serde_json::to_string(&event) {
                    Ok(line) => eprintln!("[event] {line}"),
                    Err(e) => tracing::warn!(error = %e, "Failed to encode event"),
                },
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Event printer lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}

/// Run the REPL on stdin until EOF or `/quit`.
pub async fn run(responder: &Responder) -> Result<()> {
    let mut session = responder.open_session()?;
    println!("{PROMPT_HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "/quit" | "/exit" => break,
            "/history" => {
                for entry in responder.history(&session)? {
                    println!("  {entry}");
                }
                continue;
            }
            "/new" => {
                responder.close_session(&session);
                session = responder.open_session()?;
                println!("(new session)");
                continue;
            }
            _ => {}
        }

        match responder.send_utterance(&session, &line) {
            Ok(reply) => println!("static> {reply}"),
            Err(e) if e.is_session_expired() => {
                session = reopen(responder, &session)?;
                println!("(session expired, opened a new one; please repeat)");
            }
            Err(e @ (Error::UtteranceTooLong { .. } | Error::RateLimitExceeded { .. })) => {
                println!("(!) {e}");
            }
            Err(e) => return Err(e.into()),
        }
    }

    responder.close_session(&session);
    println!(
        "Bye. {} utterance(s) answered.",
        responder.processed_utterances()
    );
    Ok(())
}

fn reopen(responder: &Responder, old: &SessionId) -> Result<SessionId> {
    responder.close_session(old);
    Ok(responder.open_session()?)
}
