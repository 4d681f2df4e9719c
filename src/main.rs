//! rcm-manager - manage RCM payloads for Tegra devices.
//!
//! Watches for a device in RCM, keeps a local cache of payload releases
//! fetched from a remote catalog, and hands the selected payload to a
//! configured injector program. The download ledger is reconciled against
//! the real filesystem before anything is reported as available.

mod application;
mod cli;
mod domain;
mod infrastructure;

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use application::{
    build_overview, format_devices_table, format_releases_table, format_status, DeviceMonitor,
    DeviceScanner, DownloadOrchestrator, InjectionGuard, PayloadSelector, ReconciliationEngine,
};
use cli::{Cli, Commands};
use domain::{AppConfig, AppError, DeviceStatus};
use infrastructure::{
    ensure_config_exists, load_config, CommandInjector, GithubCatalog, HttpFetcher, PayloadStore,
    UsbScanner,
};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

/// Main application logic.
async fn run(cli: Cli) -> domain::Result<()> {
    if cli.config.is_none() {
        ensure_config_exists()?;
    }
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Status => cmd_status(&config),
        Commands::Devices => cmd_devices(),
        Commands::Watch => cmd_watch(&config).await,
        Commands::Releases => cmd_releases(&config).await,
        Commands::Download { tag, latest, all } => cmd_download(&config, tag, latest, all).await,
        Commands::Select {
            payload,
            release,
            clear,
        } => cmd_select(&config, payload, release, clear).await,
        Commands::Inject { payload, wait } => cmd_inject(&config, payload, wait).await,
        Commands::Paths => cmd_paths(&config),
    }
}

fn build_monitor(config: &AppConfig) -> Arc<DeviceMonitor> {
    Arc::new(DeviceMonitor::new(
        Arc::new(UsbScanner::new()),
        config.device.poll_interval(),
    ))
}

fn open_store(config: &AppConfig) -> domain::Result<Arc<PayloadStore>> {
    Ok(Arc::new(PayloadStore::open(&config.store_db_path())?))
}

/// One-shot device scan command.
fn cmd_status(config: &AppConfig) -> domain::Result<()> {
    let monitor = build_monitor(config);
    let status = monitor.poll_once()?;

    println!("{}", "🔌 Device status".bold());
    println!("  {}", format_status(&status));

    Ok(())
}

/// USB device listing command.
fn cmd_devices() -> domain::Result<()> {
    let scanner = UsbScanner::new();
    let devices = scanner.list_devices()?;

    println!("{}", format!("🔌 USB devices ({})", devices.len()).bold());
    if devices.is_empty() {
        println!("no USB devices found");
    } else {
        println!("{}", format_devices_table(&devices));
    }

    Ok(())
}

/// Continuous monitoring command.
async fn cmd_watch(config: &AppConfig) -> domain::Result<()> {
    let monitor = build_monitor(config);
    let mut updates = monitor.subscribe();

    println!(
        "{}",
        format!(
            "🔌 Watching for device changes every {} ms (Ctrl-C to stop)",
            config.device.poll_interval_ms
        )
        .bold()
    );

    let poller = tokio::spawn(Arc::clone(&monitor).run());

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut last: Option<DeviceStatus> = None;
    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let status = updates.borrow_and_update().clone();
                if last.as_ref() != Some(&status) {
                    println!("  {}", format_status(&status));
                    last = Some(status);
                }
            }
        }
    }

    poller.abort();
    Ok(())
}

/// Release catalog listing command.
async fn cmd_releases(config: &AppConfig) -> domain::Result<()> {
    let store = open_store(config)?;
    let catalog = GithubCatalog::new(&config.catalog)?;

    let releases = catalog.fetch_releases().await;
    if releases.is_empty() {
        println!("no releases found");
        return Ok(());
    }

    // Disk truth first: the ledger alone is never shown to the user.
    let engine = ReconciliationEngine::new(Arc::clone(&store), config.payloads_dir());
    let downloaded = engine.reconcile(&releases)?;

    let rows = build_overview(releases, &downloaded, &HashSet::new());
    println!("{}", format_releases_table(&rows));

    Ok(())
}

/// Payload download command.
async fn cmd_download(
    config: &AppConfig,
    tag: Option<String>,
    latest: bool,
    all: bool,
) -> domain::Result<()> {
    let store = open_store(config)?;
    let catalog = GithubCatalog::new(&config.catalog)?;

    let releases = catalog.fetch_releases().await;
    if releases.is_empty() {
        return Err(AppError::precondition("no releases found in the catalog"));
    }

    let engine = ReconciliationEngine::new(Arc::clone(&store), config.payloads_dir());
    let downloaded = engine.reconcile(&releases)?;

    let orchestrator = Arc::new(DownloadOrchestrator::new(
        HttpFetcher::new()?,
        Arc::clone(&store),
        config.payloads_dir(),
    ));

    if all {
        return download_missing(&releases, &downloaded, &orchestrator).await;
    }

    let release = match (latest, tag) {
        (true, _) => releases
            .first()
            .ok_or_else(|| AppError::precondition("no releases found in the catalog"))?,
        (false, Some(tag)) => releases
            .iter()
            .find(|r| r.matches(&tag))
            .ok_or_else(|| {
                AppError::precondition(format!("release {tag} not found in the catalog"))
            })?,
        (false, None) => {
            return Err(AppError::precondition(
                "specify a release tag, --latest or --all",
            ))
        }
    };

    let asset = release.primary_asset().ok_or_else(|| {
        AppError::precondition(format!(
            "release {} has no downloadable payload",
            release.tag
        ))
    })?;

    if downloaded.contains(&asset.file_name) {
        println!(
            "{} {} is already in the cache",
            "✓".green().bold(),
            asset.file_name.cyan()
        );
        return Ok(());
    }

    let path = orchestrator.download(asset).await?;
    println!(
        "{} downloaded {} → {}",
        "✓".green().bold(),
        asset.file_name.cyan(),
        path.display()
    );

    Ok(())
}

/// Download every payload missing from the cache; distinct assets run
/// concurrently.
async fn download_missing(
    releases: &[domain::ReleaseEntry],
    downloaded: &std::collections::BTreeSet<String>,
    orchestrator: &Arc<DownloadOrchestrator<HttpFetcher>>,
) -> domain::Result<()> {
    let missing: Vec<_> = releases
        .iter()
        .filter_map(domain::ReleaseEntry::primary_asset)
        .filter(|asset| !downloaded.contains(&asset.file_name))
        .cloned()
        .collect();

    if missing.is_empty() {
        println!("{} payload cache is complete", "✓".green().bold());
        return Ok(());
    }

    let mut handles = Vec::new();
    for asset in missing {
        let orchestrator = Arc::clone(orchestrator);
        handles.push(tokio::spawn(async move {
            let name = asset.file_name.clone();
            (name, orchestrator.download(&asset).await)
        }));
    }

    let mut failures = 0_usize;
    for handle in handles {
        let (name, result) = handle
            .await
            .map_err(|e| AppError::operation(format!("download task aborted: {e}")))?;
        match result {
            Ok(path) => println!("{} {} → {}", "✓".green(), name.cyan(), path.display()),
            Err(e) => {
                failures += 1;
                eprintln!("{} {name}: {e}", "✗".red());
            }
        }
    }

    if failures > 0 {
        return Err(AppError::operation(format!("{failures} download(s) failed")));
    }
    Ok(())
}

/// Selection command: show, set or clear the payload selection.
async fn cmd_select(
    config: &AppConfig,
    payload: Option<PathBuf>,
    release: Option<String>,
    clear: bool,
) -> domain::Result<()> {
    let store = open_store(config)?;
    let selector = PayloadSelector::new(Arc::clone(&store), config.payloads_dir());

    if clear {
        selector.clear()?;
        println!("selection cleared");
        return Ok(());
    }

    if let Some(path) = payload {
        selector.select_manual(&path)?;
        println!("{} selected {}", "✓".green().bold(), path.display());
        return Ok(());
    }

    if let Some(tag) = release {
        let catalog = GithubCatalog::new(&config.catalog)?;
        let releases = catalog.fetch_releases().await;
        let entry = releases.iter().find(|r| r.matches(&tag)).ok_or_else(|| {
            AppError::precondition(format!("release {tag} not found in the catalog"))
        })?;
        let asset = entry.primary_asset().ok_or_else(|| {
            AppError::precondition(format!("release {} has no downloadable payload", entry.tag))
        })?;

        let path = selector.select_from_cache(&asset.file_name)?;
        println!("{} selected {}", "✓".green().bold(), path.display());
        return Ok(());
    }

    // No flags: show the current selection.
    match selector.current()? {
        Some(path) => {
            println!("selected payload: {}", path.display());
            if path.is_file() {
                let name = path.file_name().and_then(|n| n.to_str());
                if let Some(at) = name.map(|n| store.downloaded_at(n)).transpose()?.flatten() {
                    println!("downloaded {}", at.format("%Y-%m-%d %H:%M UTC"));
                }
            } else {
                println!(
                    "{} the selected file is missing on disk",
                    "!".yellow().bold()
                );
            }
        }
        None => println!("no payload selected"),
    }

    Ok(())
}

/// Injection command.
async fn cmd_inject(config: &AppConfig, payload: Option<PathBuf>, wait: bool) -> domain::Result<()> {
    let command = config.injector.command.clone().ok_or_else(|| AppError::Config {
        message: "no injector configured; set [injector] command in config.toml".into(),
    })?;

    let store = open_store(config)?;
    let selector = PayloadSelector::new(Arc::clone(&store), config.payloads_dir());

    let target = match payload {
        Some(path) => {
            selector.select_manual(&path)?;
            path
        }
        None => selector.current()?.ok_or_else(|| {
            AppError::precondition("no payload selected; pick one with `select` first")
        })?,
    };

    let monitor = build_monitor(config);
    let guard = InjectionGuard::new(Arc::clone(&monitor), Arc::new(CommandInjector::new(command)));

    let poller = if wait {
        let mut updates = monitor.subscribe();
        let poller = tokio::spawn(Arc::clone(&monitor).run());
        if !monitor.latest().is_recovery() {
            println!("waiting for an RCM device (Ctrl-C to abort)...");
            loop {
                if updates.changed().await.is_err() {
                    return Err(AppError::operation("device monitor stopped"));
                }
                if updates.borrow_and_update().is_recovery() {
                    break;
                }
            }
        }
        Some(poller)
    } else {
        monitor.poll_once()?;
        None
    };

    println!("  {}", format_status(&monitor.latest()));

    let outcome = guard.run(&target).await;
    if let Some(poller) = poller {
        poller.abort();
    }

    let message = outcome?;
    println!("{} {message}", "✓".green().bold());

    Ok(())
}

/// Show paths command.
fn cmd_paths(config: &AppConfig) -> domain::Result<()> {
    println!("{}", "📂 rcm-manager paths".bold());
    println!();
    println!("  [{}] {}", "config".green(), config.config_file_path().display());
    println!("  [{}] {}", "data".green(), config.data_dir().display());
    println!("  [{}] {}", "store".blue(), config.store_db_path().display());
    println!(
        "  [{}] {}",
        "payloads".blue(),
        config.payloads_dir().display()
    );

    Ok(())
}

/// Setup tracing/logging based on verbosity level.
fn setup_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time())
        .with(filter)
        .init();
}
