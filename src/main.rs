//! Tabshare daemon - main entry point
//!
//! Connects to a running browser's DevTools endpoint, watches tab activity,
//! and serves the control socket. Automatic shares fire on foreground tab
//! navigation and switches after the configured settle delay.
//!
//! # Usage
//!
//! ```bash
//! # Start with defaults (browser on :9222, endpoint on :5000)
//! tabshared
//!
//! # Start with custom endpoints
//! tabshared --browser http://localhost:9333 --endpoint http://localhost:8080/tabs
//! ```

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tabshare::{
    CdpTabs, Config, Coordinator, ControlServer, Debouncer, PrefStore, ShareClient, ShareTrigger,
    TabProvider, TabTracker,
};
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command line overrides for the daemon configuration.
#[derive(Debug, Default)]
struct DaemonArgs {
    config_path: Option<PathBuf>,
    browser_endpoint: Option<String>,
    ingest_endpoint: Option<String>,
    socket_path: Option<PathBuf>,
}

/// Parse command line arguments
fn parse_args() -> DaemonArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut parsed = DaemonArgs::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            "--version" | "-v" => {
                println!("tabshared v{}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--config" | "-c" => {
                i += 1;
                if i < args.len() {
                    parsed.config_path = Some(PathBuf::from(&args[i]));
                }
            }
            "--browser" => {
                i += 1;
                if i < args.len() {
                    parsed.browser_endpoint = Some(args[i].clone());
                }
            }
            "--endpoint" => {
                i += 1;
                if i < args.len() {
                    parsed.ingest_endpoint = Some(args[i].clone());
                }
            }
            "--socket" => {
                i += 1;
                if i < args.len() {
                    parsed.socket_path = Some(PathBuf::from(&args[i]));
                }
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                eprintln!("Use --help for usage information.");
                std::process::exit(1);
            }
        }
        i += 1;
    }

    parsed
}

fn print_help() {
    println!(
        r#"Tabshare daemon - shares open tab content with a local assistant

USAGE:
    tabshared [OPTIONS]

OPTIONS:
    -h, --help              Show this help message
    -v, --version           Show version
    -c, --config <PATH>     Path to configuration file
    --browser <URL>         DevTools debugging endpoint (default: http://localhost:9222)
    --endpoint <URL>        Ingest endpoint receiving payloads (default: http://localhost:5000/active_tab)
    --socket <PATH>         Control socket path (default: /tmp/tabshare-ctl.sock)

The browser must be started with remote debugging enabled, e.g.:
    chrome --remote-debugging-port=9222

CONTROL:
    Use tabshare-ctl to trigger shares, toggle auto-share, and read status.
"#
    );
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = parse_args();

    // Load configuration and apply command line overrides
    let mut config = match args.config_path {
        Some(path) => Config::load_from_path(path),
        None => Config::load(),
    };
    if let Some(endpoint) = args.browser_endpoint {
        config.browser.debug_endpoint = endpoint;
    }
    if let Some(endpoint) = args.ingest_endpoint {
        config.sharing.ingest_endpoint = endpoint;
    }
    if let Some(path) = args.socket_path {
        config.general.socket_path = path;
    }

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.general.log_level.clone()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let prefs = PrefStore::open_default();
    let auto_share = prefs.preferences().auto_share_enabled;

    println!("Tabshare daemon v{}", env!("CARGO_PKG_VERSION"));
    println!("  Browser:    {}", config.browser.debug_endpoint);
    println!("  Endpoint:   {}", config.sharing.ingest_endpoint);
    println!("  Socket:     {}", config.general.socket_path.display());
    println!(
        "  Auto-share: {}",
        if auto_share { "enabled" } else { "disabled" }
    );
    println!();

    // Connect to the browser
    let provider = match CdpTabs::connect(&config.browser.debug_endpoint).await {
        Ok(provider) => Arc::new(provider),
        Err(e) => {
            error!("{}", e);
            error!(
                "Start the browser with remote debugging, e.g. chrome --remote-debugging-port=9222"
            );
            return Err(e.into());
        }
    };
    info!("Connected to browser at {}", config.browser.debug_endpoint);

    // Coordinator and control server
    let client = ShareClient::new(config.sharing.ingest_endpoint.clone());
    let handle = Coordinator::new(provider.clone(), client, prefs).spawn();

    let socket_path = config.general.socket_path.clone();
    let server = ControlServer::new(socket_path.clone(), handle.clone());
    tokio::spawn(async move {
        if let Err(e) = server.run().await {
            error!("Control server error: {}", e);
        }
    });
    info!("Control server on {:?}", socket_path);

    // Setup shutdown signal
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        println!("\nShutting down...");
        r.store(false, Ordering::SeqCst);
    })?;

    // Tab event loop: poll, diff, debounce automatic shares
    let mut tracker = TabTracker::new();
    let mut debouncer = Debouncer::new(Duration::from_millis(config.sharing.settle_delay_ms));
    let mut tick_interval =
        tokio::time::interval(Duration::from_millis(config.browser.poll_interval_ms));

    info!(
        "Watching tabs ({} ms poll, {} ms settle delay)",
        config.browser.poll_interval_ms, config.sharing.settle_delay_ms
    );

    while running.load(Ordering::SeqCst) {
        tick_interval.tick().await;

        let targets = match provider.list_tabs().await {
            Ok(targets) => targets,
            Err(e) => {
                debug!("Target poll failed: {}", e);
                continue;
            }
        };

        for event in tracker.observe(&targets) {
            debug!("Tab event: {:?}", event);

            if !handle.auto_share_status().await {
                continue;
            }

            let handle = handle.clone();
            debouncer.schedule(async move {
                let outcome = handle.share(ShareTrigger::Automatic).await;
                if outcome.success {
                    info!("{}", outcome.message);
                } else {
                    // Automatic failures carry the silent marker
                    debug!("Automatic share failed: {}", outcome.message);
                }
            });
        }
    }

    // Clean up the control socket
    if socket_path.exists() {
        std::fs::remove_file(&socket_path)?;
    }

    info!("Shutdown complete");
    Ok(())
}
