use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::Level;
use tracing_subscriber::fmt::time::ChronoLocal;

use parlance_realtime::bridge::{grounding_tool, ContextBridge, HttpContextStore};
use parlance_realtime::playback::CpalOutputGraph;
use parlance_realtime::types::audio::Voice;
use parlance_realtime::types::Session;
use parlance_realtime::{EngineConfig, SessionCommand, VoiceSession};

/// End-to-end voice demo against a running relay. Commands on stdin:
///
///   l      toggle listening (push-to-talk)
///   t ...  send typed text
///   p / r  pause / resume playback
///   i      interrupt (barge-in)
///   q      quit
#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv_override().ok();

    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_timer(ChronoLocal::rfc_3339())
        .init();

    let mut client = parlance_realtime::connect()
        .await
        .context("failed to connect to relay")?;
    let server_events = client.server_events().await?;
    let client_tx = client.sender()?;

    let graph = CpalOutputGraph::new(None).context("failed to open audio output")?;
    // Only advertise the grounding function when a context endpoint exists
    // to answer it.
    let context_url = std::env::var("PARLANCE_CONTEXT_URL").ok();
    let mut template = Session::new()
        .with_modalities_enable_audio()
        .with_voice(Voice::Shimmer);
    if context_url.is_some() {
        template = template.with_tools(vec![grounding_tool()]);
    }
    let mut session = VoiceSession::new(client_tx, Box::new(graph), EngineConfig::new())
        .with_session_template(template.build());
    if let Some(url) = context_url {
        let store = HttpContextStore::new(url);
        session = session.with_bridge(ContextBridge::new(Box::new(store), "demo".to_string()));
    }
    let mut snapshots = session.subscribe();

    let (command_tx, command_rx) = tokio::sync::mpsc::channel::<SessionCommand>(32);
    let engine = tokio::spawn(session.run(server_events, command_rx));

    let printer = tokio::spawn(async move {
        while snapshots.changed().await.is_ok() {
            let snapshot = snapshots.borrow().clone();
            println!(
                "[{:?}] {}{}",
                snapshot.status,
                snapshot.visible_text,
                snapshot
                    .error
                    .map(|e| format!("  (error: {e})"))
                    .unwrap_or_default()
            );
        }
    });

    let mut listening = false;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("l=talk  t <text>=type  p=pause  r=resume  i=interrupt  q=quit");
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let line = line.trim();
                let command = match line {
                    "l" => {
                        listening = !listening;
                        if listening {
                            Some(SessionCommand::StartListening)
                        } else {
                            Some(SessionCommand::StopListening)
                        }
                    }
                    "p" => Some(SessionCommand::Pause),
                    "r" => Some(SessionCommand::Resume),
                    "i" => Some(SessionCommand::Interrupt),
                    "q" => break,
                    _ if line.starts_with("t ") => {
                        Some(SessionCommand::SendText(line[2..].to_string()))
                    }
                    _ => None,
                };
                if let Some(command) = command {
                    command_tx.send(command).await.ok();
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!("Received Ctrl-C, shutting down...");
                break;
            }
        }
    }

    drop(command_tx);
    engine.abort();
    printer.abort();
    println!("Shutting down...");
    Ok(())
}
