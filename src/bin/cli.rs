//! attribute-highlighter
//!
//! Opens a page in Chrome, runs the overlay on it and prints the groups it
//! found as JSON. With `--watch` it keeps the overlay running, reprinting
//! after every rescan and following changes to a settings file.

use anyhow::{Context, bail};
use attribute_highlighter::{BrowserSession, ConnectionOptions, Dom, HighlighterConfig, LaunchOptions, PageDom,
                            Scanner, Settings, SettingsFile, SettingsWatcher};
use clap::Parser;
use serde::Serialize;
use std::{path::PathBuf, thread, time::{Duration, Instant}};

/// Longest sleep between two polls of the page
const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Parser)]
#[command(name = "attribute-highlighter")]
#[command(version)]
#[command(about = "Highlight and list page elements carrying a data attribute", long_about = None)]
struct Cli {
    /// Page to open
    #[arg(long, value_name = "URL")]
    url: String,

    /// Attribute to track, with or without the `data-` prefix (e.g. testid)
    #[arg(long, short = 'a', value_name = "NAME")]
    attribute: Option<String>,

    /// Start with the overlay disabled
    #[arg(long)]
    disabled: bool,

    /// JSON settings file ({"enabled": true, "attribute": "testid"}), re-read when it changes
    #[arg(long, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// JSON file with highlighter tunables
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Keep running and report every rescan
    #[arg(long, short = 'w')]
    watch: bool,

    /// Launch browser in headed mode (default: headless)
    #[arg(long, short = 'H')]
    headed: bool,

    /// Path to custom browser executable
    #[arg(long, value_name = "PATH")]
    chrome_path: Option<PathBuf>,

    /// Persistent browser profile directory
    #[arg(long, value_name = "DIR")]
    user_data_dir: Option<PathBuf>,

    /// WebSocket endpoint URL for remote browser connection
    #[arg(long, value_name = "URL")]
    ws_endpoint: Option<String>,
}

#[derive(Serialize)]
struct GroupReport<'a> {
    value: &'a str,
    count: usize,
    context: String,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => HighlighterConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => HighlighterConfig::default(),
    };

    let mut settings_file = match &cli.settings {
        Some(path) => Some(
            SettingsWatcher::new(SettingsFile::new(path))
                .with_context(|| format!("Failed to watch settings file {}", path.display()))?,
        ),
        None => None,
    };
    let settings = match settings_file.as_mut() {
        Some(source) => source
            .reload()
            .with_context(|| format!("Failed to read settings from {}", source.path().display()))?
            .unwrap_or_default(),
        None => Settings::new(!cli.disabled, cli.attribute.clone()),
    };
    if settings.enabled && settings.attribute.is_none() {
        bail!("No attribute to track: pass --attribute or a settings file with one");
    }

    let session = match &cli.ws_endpoint {
        Some(endpoint) => BrowserSession::connect(ConnectionOptions::new(endpoint.clone()))?,
        None => {
            let mut options = LaunchOptions::new().headless(!cli.headed);
            options.chrome_path = cli.chrome_path.clone();
            options.user_data_dir = cli.user_data_dir.clone();
            BrowserSession::launch(options)?
        }
    };
    session.navigate(&cli.url)?;

    let mut scanner = Scanner::new(session.attach_overlay()?, config.clone());
    scanner.apply_settings(settings, Instant::now())?;
    print_report(&scanner)?;

    if !cli.watch {
        return Ok(());
    }

    let mut reported = scanner.scan_count();
    loop {
        if !scanner.dom().is_attached() {
            log::info!("Page bridge gone, reattaching");
            session.wait_for_navigation()?;
            let settings = scanner.settings().clone();
            scanner = Scanner::new(session.attach_overlay()?, config.clone());
            if let Err(e) = scanner.apply_settings(settings, Instant::now()) {
                log::warn!("Failed to reapply settings: {}", e);
            }
        }

        let now = Instant::now();
        if let Some(source) = settings_file.as_mut() {
            match source.poll() {
                Ok(Some(settings)) => {
                    if let Err(e) = scanner.apply_settings(settings, now) {
                        log::warn!("Ignoring settings from {}: {}", source.path().display(), e);
                    }
                }
                Ok(None) => {}
                Err(e) => log::warn!("Failed to read {}: {}", source.path().display(), e),
            }
        }

        scanner.poll(now);

        if scanner.scan_count() != reported {
            reported = scanner.scan_count();
            print_report(&scanner)?;
        }

        let wait = scanner
            .next_deadline()
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
            .map_or(POLL_INTERVAL, |until| until.min(POLL_INTERVAL));
        thread::sleep(wait);
    }
}

fn print_report(scanner: &Scanner<PageDom>) -> anyhow::Result<()> {
    let Some(result) = scanner.result() else {
        println!("[]");
        return Ok(());
    };

    let reports: Vec<GroupReport> = result
        .groups()
        .iter()
        .map(|group| {
            let representative = group.first().and_then(|node| scanner.dom().element(node).ok());
            GroupReport {
                value: &group.value,
                count: group.len(),
                context: scanner.describer().describe(representative.as_ref()),
            }
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&reports)?);
    Ok(())
}
