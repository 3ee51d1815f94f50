use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{HttpControlTransport, ThrottleSession};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    task::JoinSet,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod controller;
mod terminal;

use config::load_settings;
use controller::{
    events::{parse_event, UiEvent, HELP},
    orchestration::dispatch_event,
};
use terminal::TerminalView;

#[derive(Parser, Debug)]
#[command(about = "Terminal throttle for the track control bridge")]
struct Args {
    /// TOML settings file (defaults to ./throttle.toml when present).
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    server_url: Option<String>,
    /// Locomotive address; repeat for each locomotive.
    #[arg(long = "address")]
    addresses: Vec<String>,
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut settings = load_settings(args.config.as_deref())?;
    if let Some(server_url) = args.server_url {
        settings.server_url = server_url;
    }
    if !args.addresses.is_empty() {
        settings.addresses = args.addresses;
    }
    if let Some(log_level) = args.log_level {
        settings.log_level = log_level;
    }

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log_level))
        .context("invalid log level")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let addresses = settings.locomotive_addresses()?;
    let transport = HttpControlTransport::new(&settings.server_url, settings.request_timeout())
        .with_context(|| format!("failed to set up control server '{}'", settings.server_url))?;
    let session = Arc::new(ThrottleSession::new(
        addresses,
        transport,
        TerminalView::stdout(),
    ));
    info!(
        server_url = %settings.server_url,
        locomotives = settings.addresses.len(),
        "throttle ready"
    );
    session.report(HELP).await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut tasks = JoinSet::new();
    while let Some(line) = lines.next_line().await.context("failed to read input")? {
        match parse_event(&line) {
            Ok(None) => {}
            Ok(Some(UiEvent::Quit)) => break,
            Ok(Some(event)) => dispatch_event(&session, event, &mut tasks),
            Err(err) => session.report(err.to_string()).await,
        }
        while let Some(joined) = tasks.try_join_next() {
            if let Err(err) = joined {
                warn!(error = %err, "ui event task aborted");
            }
        }
    }

    while let Some(joined) = tasks.join_next().await {
        if let Err(err) = joined {
            warn!(error = %err, "ui event task aborted");
        }
    }
    info!("throttle closed");
    Ok(())
}
