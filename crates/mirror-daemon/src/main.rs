//! mirror-daemon: mirrors a local directory tree onto a remote file server.
//!
//! Connects, authenticates interactively, then watches the root and
//! translates every filesystem change into protocol exchanges until
//! interrupted.

use anyhow::{Context, Result};
use clap::Parser;
use mirror_core::Session;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use mirror_daemon::auth;
use mirror_daemon::prompt;
use mirror_daemon::translator::Translator;
use mirror_daemon::watcher::DirWatcher;

#[derive(Parser, Debug)]
#[command(name = "mirror-daemon")]
#[command(about = "Mirror a directory tree onto a remote file server")]
struct Args {
    /// Server host
    #[arg(default_value = "localhost")]
    host: String,

    /// Server port
    #[arg(default_value_t = 6012)]
    port: u16,

    /// Directory tree to mirror
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Give up after this many rejected authentication attempts
    #[arg(long, default_value_t = 3)]
    max_auth_attempts: u32,

    /// Enable verbose logging
    #[arg(long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Set up logging - respects RUST_LOG env var, defaults to info (or
    // debug with --verbose)
    let default_filter = if args.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Connecting to {}:{}", args.host, args.port);
    let mut session = Session::connect(&args.host, args.port)
        .await
        .with_context(|| format!("cannot reach {}:{}", args.host, args.port))?;

    auth::login(&mut session, args.max_auth_attempts, prompt::read_credentials).await?;
    info!("Authenticated; mirroring {}", args.root.display());

    let mut watcher = DirWatcher::new(args.root.clone()).context("cannot watch directory")?;
    let root = watcher.root().to_path_buf();
    let mut translator = Translator::new(session, root);

    info!("Watching for changes. Press Ctrl+C to stop.");

    // The translator is the only consumer of the event channel, so the
    // session never sees a second in-flight exchange.
    loop {
        tokio::select! {
            maybe_event = watcher.event_rx().recv() => {
                match maybe_event {
                    Some(event) => {
                        translator.handle(event).await.context("session ended")?;
                    }
                    None => break,
                }
            }

            // Graceful shutdown: the in-flight event, if any, has already
            // finished by the time this arm runs
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    // Two-phase shutdown: stop the watcher first, then say goodbye on the
    // wire.
    drop(watcher);
    let mut session = translator.into_session();
    if let Err(e) = session.exit().await {
        warn!("exit exchange failed: {}", e);
    }
    info!("Shutting down");
    Ok(())
}
