//! colloquy - streaming conversation engine demo CLI

mod channel;
mod config;

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use colloquy_chat::SessionId;
use colloquy_engine::{ConversationEngine, EngineEvent};

use crate::channel::DemoChannel;
use crate::config::Config;

/// colloquy - hold streaming conversations with an automated agent
#[derive(Parser, Debug)]
#[command(name = "colloquy")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Delay between reply chunks in milliseconds
    #[arg(long)]
    chunk_delay: Option<u64>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Initialize config file
    #[arg(long)]
    init_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = Config::load();

    // Setup tracing
    if args.verbose || config.verbose.unwrap_or(false) {
        tracing_subscriber::fmt()
            .with_env_filter("colloquy=debug")
            .init();
    }

    if args.init_config {
        let path = Config::config_path();
        Config::default().save()?;
        println!("Wrote default config to {}", path.display());
        return Ok(());
    }

    let delay = args
        .chunk_delay
        .or(config.reply_delay_ms)
        .unwrap_or(40);
    let channel = Arc::new(DemoChannel::new(Duration::from_millis(delay)));
    let mut engine = ConversationEngine::new(channel);
    if let Some(chars) = config.snippet_chars {
        engine = engine.with_snippet_chars(chars);
    }

    engine.refresh_sessions().await;
    let sessions = engine.sessions();
    if let Some(first) = sessions.first() {
        engine.select_session(first.id.clone()).await;
    }

    println!("colloquy demo - type a message, /sessions, /select <id>, or /quit");
    print_sessions(&engine);

    let stdin = std::io::stdin();
    loop {
        let active = engine
            .active_session()
            .map(|s| s.0)
            .unwrap_or_else(|| "-".into());
        print!("[{active}] > ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();

        match line {
            "" => continue,
            "/quit" | "/q" => break,
            "/sessions" => print_sessions(&engine),
            _ if line.starts_with("/select ") => {
                let id = line.trim_start_matches("/select ").trim();
                engine.select_session(SessionId::from(id)).await;
            }
            _ if line.starts_with('/') => {
                println!("unknown command: {line}");
            }
            prompt => {
                stream_reply(&engine, prompt).await?;
            }
        }
    }

    Ok(())
}

/// Send a prompt and print the reply as it streams in.
async fn stream_reply(engine: &ConversationEngine, prompt: &str) -> anyhow::Result<()> {
    let mut rx = engine.subscribe();

    // Print incrementally: content grows append-only, so the unprinted tail
    // is always a suffix.
    let printer = tokio::spawn(async move {
        let mut printed = 0usize;
        loop {
            match rx.recv().await {
                Ok(EngineEvent::StreamUpdate { message }) => {
                    print!("{}", &message.content[printed..]);
                    let _ = std::io::stdout().flush();
                    printed = message.content.len();
                }
                Ok(EngineEvent::StreamEnd { message }) => {
                    println!("{}", &message.content[printed..]);
                    break;
                }
                Ok(EngineEvent::EngineError { message }) => {
                    eprintln!("\n[error] {message}");
                    break;
                }
                Ok(EngineEvent::BusyChanged { busy: false }) => break,
                Ok(_) => {}
                Err(_) => break,
            }
        }
    });

    engine.send(prompt).await?;
    printer.await?;
    Ok(())
}

fn print_sessions(engine: &ConversationEngine) {
    for session in engine.sessions() {
        let snippet = session.last_snippet.as_deref().unwrap_or("(no messages)");
        println!("  {:<10} {:<12} {}", session.id, session.title, snippet);
    }
}
