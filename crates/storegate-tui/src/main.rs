//! `storegate-tui` — terminal shell for the storegate session gate.
//!
//! Drives the storefront's route map through the core's guard: every
//! navigation is decided by [`storegate_core::decide`], identity checks
//! resolve in the background, and the visible screen follows the
//! decision (render / loading / redirect). The views themselves are
//! placeholders -- this shell exists to exercise the session core.
//!
//! Logs are written to a file (default `/tmp/storegate-tui.log`) to avoid
//! corrupting the terminal UI.
//!
//! Entry point: CLI argument parsing, tracing setup, panic hooks, and app
//! launch.

mod action;
mod app;
mod event;
mod screens;
mod session_bridge;
mod tui;

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{Result, eyre};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use storegate_api::{StorefrontClient, TransportConfig};
use storegate_core::SessionGate;

use crate::app::App;

/// Terminal shell for browsing a storefront behind the session gate.
#[derive(Parser, Debug)]
#[command(name = "storegate-tui", version, about)]
struct Cli {
    /// Storefront backend URL (e.g., https://shop.example.com)
    #[arg(short = 'u', long, env = "STOREGATE_BACKEND_URL")]
    url: Option<String>,

    /// Path to start on (defaults to the customer landing page)
    #[arg(short = 'p', long)]
    start_path: Option<String>,

    /// Log file path (defaults to /tmp/storegate-tui.log)
    #[arg(long, default_value = "/tmp/storegate-tui.log")]
    log_file: PathBuf,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Set up file-based tracing. We MUST NOT log to stdout/stderr — that would
/// corrupt the TUI output. Returns a guard that must be held for the
/// lifetime of the application to ensure logs are flushed.
fn setup_tracing(cli: &Cli) -> WorkerGuard {
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("storegate_tui={log_level},storegate_core={log_level}"))
    });

    let log_dir = cli
        .log_file
        .parent()
        .unwrap_or(std::path::Path::new("/tmp"));
    let log_filename = cli
        .log_file
        .file_name()
        .unwrap_or(std::ffi::OsStr::new("storegate-tui.log"));

    let file_appender = tracing_appender::rolling::never(log_dir, log_filename);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true),
        )
        .init();

    guard
}

/// Build the session gate from CLI args + config file.
fn build_gate(cli: &Cli) -> Result<SessionGate<StorefrontClient>> {
    let config = storegate_config::load_config_or_default();

    let url: url::Url = match cli.url.as_deref() {
        Some(raw) => raw
            .parse()
            .map_err(|e| eyre!("invalid backend URL '{raw}': {e}"))?,
        None => config
            .backend_url()
            .map_err(|e| eyre!("{e} (hint: pass --url or edit {})", storegate_config::config_path().display()))?,
    };

    let transport = TransportConfig {
        timeout: config.backend_timeout(),
        cookie_jar: None,
    };
    let client = StorefrontClient::new(url, &transport)?;

    Ok(SessionGate::new(client, config.route_table()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Install panic/error hooks BEFORE entering the terminal
    tui::install_hooks()?;

    // Tracing to file — hold the guard so logs flush on exit
    let _log_guard = setup_tracing(&cli);

    info!(
        url = cli.url.as_deref().unwrap_or("(from config)"),
        "starting storegate-tui"
    );

    let gate = build_gate(&cli)?;
    let start_path = cli
        .start_path
        .clone()
        .unwrap_or_else(|| gate.routes().paths().customer_landing.clone());

    let mut app = App::new(gate, start_path);
    app.run().await?;

    Ok(())
}
