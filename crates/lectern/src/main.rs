//! lectern — terminal client for Google Classroom.
//!
//! Main entry point for the lectern CLI.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

mod commands;

use commands::{Context, cache, courses, login, logout, status, tui};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// lectern — terminal client for Google Classroom
#[derive(Parser)]
#[command(name = "lectern")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// Config file path (default: the lectern config directory)
    #[arg(long, global = true, env = "LECTERN_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in with Google OAuth
    Login,

    /// Delete the stored credential
    Logout,

    /// Show authentication status
    Status,

    /// List courses (non-interactive)
    Courses,

    /// Inspect or clear the response cache
    Cache(cache::CacheArgs),

    /// Open the interactive interface (the default)
    Tui,
}

// ─────────────────────────────────────────────────────────────────────────────
// Entry point
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let interactive = matches!(cli.command, None | Some(Commands::Tui));
    let _guard = init_tracing(cli.verbose, interactive);

    let config = match &cli.config {
        Some(path) => lectern_config::load_from(path)?,
        None => lectern_config::load()?,
    };

    let ctx = Context {
        config,
        json_output: cli.json,
    };

    // One cancellation signal threaded through every suspension point;
    // Ctrl-C trips it so callback waits and backoff sleeps abort promptly.
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        });
    }

    match cli.command {
        Some(Commands::Login) => login::run(&ctx, &cancel).await,
        Some(Commands::Logout) => logout::run(&ctx).await,
        Some(Commands::Status) => status::run(&ctx).await,
        Some(Commands::Courses) => courses::run(&ctx, &cancel).await,
        Some(Commands::Cache(args)) => cache::run(&ctx, &args).await,
        Some(Commands::Tui) | None => tui::run(&ctx).await,
    }
}

/// Initialize tracing: console layer (suppressed in interactive mode,
/// where it would scribble over the alternate screen) plus a rotating
/// JSON file.
fn init_tracing(
    verbose: bool,
    interactive: bool,
) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::prelude::*;

    let filter = if verbose {
        "lectern=debug,lectern_auth=debug,lectern_cache=debug,lectern_client=debug,lectern_tui=debug,info"
    } else {
        "lectern=info,lectern_auth=info,lectern_cache=info,lectern_client=info,warn"
    };

    let log_dir = lectern_config::paths::log_dir();
    let file_appender = tracing_appender::rolling::daily(&log_dir, "lectern.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    if interactive {
        let file_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_writer(non_blocking)
            .with_filter(tracing_subscriber::EnvFilter::new(filter));
        tracing_subscriber::registry().with(file_layer).init();
    } else {
        let file_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_writer(non_blocking)
            .with_filter(tracing_subscriber::EnvFilter::new(filter));
        let console_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_writer(std::io::stderr)
            .with_filter(tracing_subscriber::EnvFilter::new(filter));
        tracing_subscriber::registry()
            .with(console_layer)
            .with(file_layer)
            .init();
    }

    Some(guard)
}
