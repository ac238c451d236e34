use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use rpc_session::{ListenEnd, Session, SessionConfig, SessionError};
use serde_json::json;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "rpc-session", about = "Local WebSocket RPC session client")]
struct Cli {
    /// Overrides `RPC_HOST`.
    #[arg(long)]
    host: Option<String>,

    /// Overrides `RPC_PORT`.
    #[arg(long)]
    port: Option<u16>,

    /// Overrides `RPC_CLIENT_ID`.
    #[arg(long)]
    client_id: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Connect and log every message until the service closes or Ctrl-C.
    Listen,
    /// Wait for READY, send sample commands, then listen for a while.
    TestCommands(TestCommandsArgs),
}

#[derive(Args, Debug)]
struct TestCommandsArgs {
    /// Overrides `RPC_LISTEN_SECS`.
    #[arg(long)]
    listen_secs: Option<u64>,

    /// Pause between sample commands, in milliseconds.
    #[arg(long, default_value_t = 1000)]
    pause_ms: u64,
}

#[tokio::main]
async fn main() -> Result<(), SessionError> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(std::env::var("RUST_LOG").ok().as_deref()))
        .init();

    let cli = Cli::parse();
    let mut config = SessionConfig::from_env();
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if cli.client_id.is_some() {
        config.client_id = cli.client_id;
    }

    match cli.command {
        Command::Listen => run_listen(config).await,
        Command::TestCommands(args) => {
            if let Some(secs) = args.listen_secs {
                config.timeouts.listen_secs = secs;
            }
            run_test_commands(config, Duration::from_millis(args.pause_ms)).await
        }
    }
}

async fn run_listen(config: SessionConfig) -> Result<(), SessionError> {
    let mut session = Session::new(config);
    session.connect().await?;

    let outcome = tokio::select! {
        result = session.listen() => result.map(|_| ()),
        _ = tokio::signal::ctrl_c() => {
            info!("rpc: interrupted by user");
            Ok(())
        }
    };

    session.close().await;
    outcome
}

async fn run_test_commands(config: SessionConfig, pause: Duration) -> Result<(), SessionError> {
    let mut session = Session::new(config);
    session.connect().await?;

    let outcome = test_commands(&mut session, pause).await;
    if let Err(e) = &outcome {
        error!(error = %e, "rpc: error during testing");
    }

    session.close().await;
    outcome
}

async fn test_commands(session: &mut Session, pause: Duration) -> Result<(), SessionError> {
    let ready_timeout = session.config().ready_timeout();
    let listen_for = session.config().listen_duration();

    session.wait_for_ready(ready_timeout).await?;
    info!("rpc: received READY, sending test commands");

    session.get_guilds().await?;
    tokio::time::sleep(pause).await;

    session.get_channels(None).await?;
    tokio::time::sleep(pause).await;

    let activity = json!({
        "details": "Testing the RPC session",
        "state": "Via WebSocket",
        "assets": {
            "large_image": "large_image_key",
            "large_text": "Large image tooltip",
            "small_image": "small_image_key",
            "small_text": "Small image tooltip",
        },
    });
    session.send_activity_update(activity).await?;

    if session.listen_for(listen_for).await? == ListenEnd::DeadlineElapsed {
        info!(secs = listen_for.as_secs(), "rpc: finished listening");
    }
    Ok(())
}

/// Log filter from a `RUST_LOG`-style directive; `info` when unset, blank or invalid.
fn env_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .filter(|raw| !raw.trim().is_empty())
        .and_then(|raw| EnvFilter::try_new(raw).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;
