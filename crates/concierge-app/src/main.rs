//! Concierge application binary, the composition root.
//!
//! 1. Parse CLI arguments and load configuration from TOML
//! 2. Install tracing on stderr so stdout stays the conversation
//! 3. Select desktop capabilities (platform or recording mock)
//! 4. Wire the action engine, fallback responder and session orchestrator
//! 5. Run the timer ticker and the interactive loop until exit

mod cli;

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use concierge_action::capability::mock::MockDesktop;
use concierge_action::{
    ActionRegistry, Capabilities, NoteBook, Orchestrator, Scheduler, TimerService,
};
use concierge_chat::{build_responder, ChatOrchestrator, Turn};
use concierge_core::config::ConciergeConfig;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use cli::CliArgs;

fn say(name: &str, text: &str) {
    let mut out = std::io::stdout().lock();
    let _ = writeln!(out, "{}: {}", name, text);
    let _ = out.flush();
}

fn prompt() {
    let mut out = std::io::stdout().lock();
    let _ = write!(out, "> ");
    let _ = out.flush();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let config = ConciergeConfig::load_or_default(&config_file);

    // Tracing.
    let level = args.resolve_log_level(&config.general.log_level);
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(&level))
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Starting Concierge v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration resolved");

    // Capabilities.
    let caps = if args.dry_run {
        tracing::info!("Dry run: desktop actions are recorded, not performed");
        MockDesktop::capabilities(&Arc::new(MockDesktop::new()))
    } else {
        Capabilities::for_current_platform()
    };

    // Action engine.
    let timers = Arc::new(TimerService::new());
    let mut registry = ActionRegistry::new();
    registry.register_defaults(&caps, Arc::clone(&timers), Arc::new(NoteBook::new()));
    tracing::info!(handlers = registry.len(), "Action handlers registered");
    let engine = Orchestrator::new(registry);

    // Session.
    let responder = build_responder(&config)?;
    let (chat, mut events) = ChatOrchestrator::new(&config, engine, responder);
    let name = chat.assistant_name().to_string();

    // Timer ticker.
    let scheduler = Arc::new(Scheduler::new(
        Arc::clone(&timers),
        chat.notification_sink(),
        Duration::from_millis(config.timers.tick_interval_ms),
    ));
    let ticker = {
        let scheduler = Arc::clone(&scheduler);
        tokio::spawn(async move { scheduler.run().await })
    };

    say(&name, &chat.greeting());
    prompt();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => {
                        tracing::info!("End of input");
                        break;
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to read input");
                        break;
                    }
                };
                match chat.handle_utterance(&line).await {
                    Turn::Ignored => {}
                    Turn::Exit(farewell) => {
                        say(&name, &farewell);
                        break;
                    }
                    Turn::Reply(text) => say(&name, &text),
                    Turn::Deferred { sequence_index } => {
                        tracing::debug!(sequence_index, "Awaiting fallback reply");
                    }
                }
                prompt();
            }
            Some(event) = events.recv() => {
                let text = chat.apply_event(event);
                say(&name, &text);
                prompt();
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted");
                break;
            }
        }
    }

    scheduler.shutdown();
    if let Err(e) = ticker.await {
        tracing::warn!(error = %e, "Timer ticker ended abnormally");
    }
    tracing::info!(active_timers = timers.active_count(), "Concierge stopped");

    Ok(())
}
