//! PsicoAdmin assistant binary - composition root.
//!
//! 1. Install tracing, then load configuration and apply CLI overrides
//! 2. Build the chat engine (built-in or file knowledge base)
//! 3. Open one conversation behind a delayed-reply scheduler
//! 4. Run the terminal transcript loop until /salir, EOF, or Ctrl-C

mod cli;
mod transcript;

use std::io::Write;

use clap::Parser;
use psico_chat::{decode_utterance, ChatEngine, ChatError, ReplyScheduler, ThinkingDelay, Turn};
use psico_core::GeneralConfig;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{reload, EnvFilter};

use crate::cli::CliArgs;
use crate::transcript::{render, render_actions, Command, Transcript, COMPOSING};

fn prompt() {
    print!("› ");
    let _ = std::io::stdout().flush();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Tracing first, so config loading is logged. RUST_LOG or --log-level
    // fix the filter; otherwise the configured level replaces the default
    // once the file has been read.
    let env_filter = EnvFilter::try_from_default_env().ok();
    let fixed_filter = env_filter.is_some() || args.log_level.is_some();
    let initial = env_filter.unwrap_or_else(|| {
        EnvFilter::new(
            args.log_level
                .clone()
                .unwrap_or_else(|| GeneralConfig::default().log_level),
        )
    });
    let (filter, filter_handle) = reload::Layer::new(initial);
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting PsicoAdmin assistant v{}", env!("CARGO_PKG_VERSION"));

    // Config.
    let (config, config_file) = match args.load_config() {
        Ok(loaded) => loaded,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };
    if !fixed_filter {
        filter_handle.reload(EnvFilter::new(&config.general.log_level))?;
    }
    tracing::info!(path = %config_file.display(), "Configuration resolved");

    // Engine and session.
    let engine = match ChatEngine::from_config(&config) {
        Ok(engine) => engine,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build chat engine");
            return Err(e.into());
        }
    };
    let mut scheduler = ReplyScheduler::new(
        engine.create_session(),
        ThinkingDelay::from_config(&config.delay),
    );
    tracing::info!(session_id = %scheduler.session_id(), "Conversation opened");

    let mut transcript = Transcript::new();
    for turn in transcript.messages() {
        println!("{}", render(turn));
    }
    println!("{}", render_actions());

    let mut reader = BufReader::new(tokio::io::stdin());
    let mut buf = Vec::new();

    loop {
        prompt();
        buf.clear();

        let read = tokio::select! {
            r = reader.read_until(b'\n', &mut buf) => r?,
            _ = tokio::signal::ctrl_c() => break,
        };
        if read == 0 {
            break;
        }

        let line = match decode_utterance(&buf) {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(error = %e, "Discarding unreadable input");
                println!("(No pude leer ese mensaje; intenta de nuevo.)");
                continue;
            }
        };

        let utterance = match Command::parse(line) {
            Command::Empty => continue,
            Command::Quit => break,
            Command::ShowActions => {
                println!("{}", render_actions());
                continue;
            }
            Command::ShowContext => {
                let context = scheduler.context()?;
                println!("{}", serde_json::to_string_pretty(&context)?);
                continue;
            }
            Command::Say(text) => text,
        };

        println!("{}", transcript.push(Turn::user(utterance.clone())));
        scheduler.submit(utterance)?;
        println!("{}", COMPOSING);

        let reply = tokio::select! {
            r = scheduler.next_reply() => r,
            _ = tokio::signal::ctrl_c() => Err(ChatError::ReplyCancelled),
        };
        match reply {
            Ok(text) => println!("{}", transcript.push(Turn::bot(text))),
            Err(ChatError::ReplyCancelled) => break,
            Err(e) => {
                tracing::error!(error = %e, "Reply failed");
                return Err(e.into());
            }
        }
    }

    if scheduler.cancel() {
        tracing::debug!("Pending reply cancelled on exit");
    }
    tracing::info!(
        messages = transcript.messages().len(),
        "Conversation closed"
    );
    println!();
    Ok(())
}
