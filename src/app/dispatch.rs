use crate::cli::commands::{Cli, Commands};
use anyhow::{Context, Result};
use kbchat::Config;
use kbchat::gateway;
use kbchat::knowledge::{self, DocumentStore};
use kbchat::sessions::SessionLog;

pub async fn dispatch(cli: Cli) -> Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;

    match cli.command.unwrap_or_default() {
        Commands::Serve { host, port } => {
            apply_serve_overrides(&mut config, host, port)?;
            gateway::run_gateway(config).await
        }
        Commands::Context => print_context(&config),
        Commands::Sessions => print_sessions(&config),
    }
}

/// CLI flags win over file and env values, and go through the same validation.
fn apply_serve_overrides(config: &mut Config, host: Option<String>, port: Option<u16>) -> Result<()> {
    if let Some(host) = host {
        config.gateway.host = host;
    }
    if let Some(port) = port {
        config.gateway.port = port;
    }
    config.validate().context("invalid serve options")?;
    Ok(())
}

fn print_context(config: &Config) -> Result<()> {
    let store = DocumentStore::open(config.knowledge_dir())
        .with_context(|| format!("open {}", config.knowledge_dir().display()))?;
    let context = knowledge::build_context(&store);
    if context.is_empty() {
        println!("Knowledge base is empty ({})", store.root().display());
    } else {
        println!("{context}");
    }
    Ok(())
}

fn print_sessions(config: &Config) -> Result<()> {
    let log = SessionLog::open(config.sessions_dir())
        .with_context(|| format!("open {}", config.sessions_dir().display()))?;
    let sessions = log.list()?;
    if sessions.is_empty() {
        println!("No session logs in {}", log.root().display());
        return Ok(());
    }

    println!("{:<14} {:>8}  MODIFIED", "SESSION", "MESSAGES");
    for summary in sessions {
        println!(
            "{:<14} {:>8}  {}",
            summary.session_id, summary.message_count, summary.modified
        );
    }
    Ok(())
}
