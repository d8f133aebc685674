//! pubmed-chat entry point.
//!
//! Startup order:
//! 1. Load `.env`, then read configuration from the environment.
//! 2. Initialise tracing (JSON or pretty).
//! 3. Wire the answer generator and PubMed client.
//! 4. Serve the web UI, or run the terminal REPL.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use tracing::{info, warn};

use pubmed_chat::routes;
use pubmed_chat::state::AppState;
use pubmed_chat::{ChatBot, Config};

#[derive(Parser)]
#[command(name = "pubmed-chat", version, about = "Medical chatbot with PubMed integration")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the browser chat (default).
    Serve {
        /// Address to bind, overrides PUBMED_CHAT_BIND.
        #[arg(long)]
        bind: Option<String>,
    },
    /// Chat from the terminal.
    Repl,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();
    let mut cfg = Config::from_env();

    init_tracing(&cfg);
    info!(version = env!("CARGO_PKG_VERSION"), "pubmed-chat starting");

    if cfg.openai_api_key.is_none() {
        warn!("OPENAI_API_KEY is not set; every question will fail to generate");
    }
    let bot = ChatBot::from_config(&cfg)?;

    match cli.command.unwrap_or(Command::Serve { bind: None }) {
        Command::Serve { bind } => {
            if let Some(bind) = bind {
                cfg.bind_address = bind;
            }
            serve(&cfg, bot).await
        }
        Command::Repl => {
            let stdin = std::io::stdin();
            pubmed_chat::repl::run(&bot, stdin.lock(), std::io::stdout()).await?;
            Ok(())
        }
    }
}

fn init_tracing(cfg: &Config) {
    let env_filter = match tracing_subscriber::EnvFilter::try_from_default_env() {
        Ok(f) => f,
        Err(_) => match cfg.log_level.parse::<tracing_subscriber::EnvFilter>() {
            Ok(f) => f,
            Err(e) => {
                eprintln!(
                    "WARN: PUBMED_CHAT_LOG='{}' is not a valid tracing filter ({}); \
                     falling back to 'info'",
                    cfg.log_level, e
                );
                tracing_subscriber::EnvFilter::new("info")
            }
        },
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    if cfg.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

async fn serve(cfg: &Config, bot: ChatBot) -> Result<()> {
    let app = routes::build(AppState::with_session_ttl(bot, cfg.session_ttl));
    let addr: SocketAddr = cfg
        .bind_address
        .parse()
        .with_context(|| format!("invalid bind address {}", cfg.bind_address))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("pubmed-chat stopped");
    Ok(())
}

/// Resolves when SIGINT (Ctrl-C) or SIGTERM is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install CTRL+C signal handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => warn!(error = %e, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("shutdown signal received");
}
