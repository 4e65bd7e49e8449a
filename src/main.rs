use anyhow::Result;
use clap::{Parser, Subcommand};
use classroutine::config::Config;
use classroutine::fetch::SheetFetcher;
use classroutine::models::next_class;
use classroutine::storage::OfflineStore;
use classroutine::sync::{
    enrich_sessions, ConnectivityPort, ConnectivityWatcher, DataSource, FileBackup, RoutineSync,
    SyncListener, SyncReport,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How often the watch loop checks whether connectivity came back
const PROBE_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Parser)]
#[command(
    name = "classroutine",
    version,
    about = "Department class routine aggregator with offline fallback cache",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path (TOML); environment variables override nothing here
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long, global = true, default_value = "text")]
    log_format: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch, parse and persist one complete snapshot
    Sync {
        /// Clear the semester memo first, forcing a full re-fetch
        #[arg(long, default_value = "false")]
        force: bool,

        /// Skip the live fetch and serve cache or backup only
        #[arg(long, default_value = "false")]
        offline: bool,
    },

    /// Print one semester's timetable from the best available snapshot
    Show {
        /// Semester sheet label, e.g. "4th"
        #[arg(short, long)]
        semester: String,

        /// Resolve teacher initials to full names before printing
        #[arg(long, default_value = "true")]
        enrich: bool,
    },

    /// Refresh periodically and on reconnect until interrupted
    Watch,

    /// Remove the persisted offline snapshot and sync status
    ClearCache,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_tracing(&cli.log_format, cli.verbose)?;

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };
    config.validate()?;

    match cli.command {
        Commands::Sync { force, offline } => {
            let sync = build_sync(&config, !offline)?;
            if force {
                sync.clear_memo();
            }

            let report = if offline {
                sync.cached()
                    .ok_or_else(|| anyhow::anyhow!("no cached or backup snapshot available"))?
            } else {
                sync.sync().await?
            };
            print_summary(&report);
        }

        Commands::Show { semester, enrich } => {
            let sync = build_sync(&config, true)?;
            let report = match sync.cached() {
                Some(report) => report,
                None => sync.sync().await?,
            };

            let Some(timetable) = report.data.semesters.get(&semester) else {
                anyhow::bail!("no timetable for semester {semester:?}");
            };

            let mut sessions: Vec<_> = timetable
                .schedule
                .iter()
                .flat_map(|d| d.classes.iter().cloned())
                .collect();
            if enrich {
                enrich_sessions(&mut sessions, &report.data.teachers);
            }

            println!("Semester {semester} ({} classes)", sessions.len());
            for slot in &timetable.time_slots {
                println!("  slot {}: {}-{}", slot.slot, slot.start_time, slot.end_time);
            }
            for session in &sessions {
                let teacher = session
                    .teacher_name
                    .as_deref()
                    .unwrap_or(&session.teacher_initials);
                println!(
                    "  {} {}-{} {} [{}] room {} ({})",
                    session.day,
                    session.start_time,
                    session.end_time,
                    session.course_code,
                    session
                        .section
                        .map(|s| s.to_string())
                        .unwrap_or_else(|| "-".to_string()),
                    session.room,
                    teacher,
                );
            }
            if let Some(next) = next_class(&sessions, chrono::Utc::now()) {
                println!("next class: {} on {} at {}", next.course_code, next.day, next.start_time);
            }
        }

        Commands::Watch => {
            watch(&config).await?;
        }

        Commands::ClearCache => {
            OfflineStore::new(&config.storage.data_dir).clear();
            println!("offline snapshot cleared");
        }
    }

    Ok(())
}

fn build_fetcher(config: &Config) -> Result<SheetFetcher> {
    let fetcher = SheetFetcher::with_config(
        &config.sheets.spreadsheet_id,
        config.sheets.api_key.clone(),
        config.fetch.max_retries,
        config.request_timeout(),
    )?;
    Ok(match &config.fetch.base_url {
        Some(base) => fetcher.with_base_url(base),
        None => fetcher,
    })
}

/// Build the orchestrator from configuration
fn build_sync(config: &Config, online: bool) -> Result<RoutineSync> {
    let fetcher = build_fetcher(config)?;
    let store = OfflineStore::new(&config.storage.data_dir);
    let watcher = Arc::new(ConnectivityWatcher::new(online));

    let mut sync = RoutineSync::new(fetcher, store, watcher, config.sync_options());
    if let Some(backup) = &config.storage.backup_file {
        sync = sync.with_backup(Box::new(FileBackup::new(backup)));
    }
    Ok(sync)
}

/// Periodic refresh plus reconnect-triggered refresh
///
/// Connectivity transitions are derived from observed outcomes: a refresh
/// served from a fallback tier after a network-style primary failure marks
/// the watcher offline, and a background reachability probe marks it back
/// online, which wakes the loop for an immediate refresh.
async fn watch(config: &Config) -> Result<()> {
    let watcher = Arc::new(ConnectivityWatcher::new(true));

    let fetcher = build_fetcher(config)?;
    let store = OfflineStore::new(&config.storage.data_dir);
    let mut sync = RoutineSync::new(
        fetcher,
        store,
        Arc::clone(&watcher) as Arc<dyn classroutine::sync::ConnectivityPort>,
        config.sync_options(),
    );
    if let Some(backup) = &config.storage.backup_file {
        sync = sync.with_backup(Box::new(FileBackup::new(backup)));
    }
    let sync = Arc::new(sync);

    // Reconnects wake the loop through a channel; the watcher invokes the
    // listener synchronously
    let (resync_tx, mut resync_rx) = tokio::sync::mpsc::unbounded_channel::<()>();
    watcher.subscribe(SyncListener {
        on_online: Box::new(move || {
            let _ = resync_tx.send(());
        }),
        on_offline: Box::new(|| {}),
    });

    // While marked offline, probe the export host until it answers again
    let prober = build_fetcher(config)?;
    let probe_watcher = Arc::clone(&watcher);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(PROBE_INTERVAL);
        loop {
            ticker.tick().await;
            if !probe_watcher.is_online() && prober.probe().await {
                probe_watcher.set_online(true);
            }
        }
    });

    let mut ticker = tokio::time::interval(config.refresh_interval());
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    tracing::info!(
        interval_secs = config.fetch.refresh_interval_secs,
        "watching for changes"
    );

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                run_once(&sync, &watcher).await;
            }
            Some(()) = resync_rx.recv() => {
                tracing::info!("reconnect detected, refreshing");
                run_once(&sync, &watcher).await;
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutting down");
                break;
            }
        }
    }

    Ok(())
}

async fn run_once(sync: &RoutineSync, watcher: &ConnectivityWatcher) {
    match sync.sync().await {
        Ok(report) => {
            match &report.primary_error {
                Some(e) if e.is_network_related() => watcher.set_online(false),
                _ => watcher.set_online(true),
            }
            print_summary(&report);
        }
        Err(e) => {
            let e = classroutine::error::Error::from(e);
            if e.is_recoverable() {
                tracing::warn!(error = %e, category = ?e.category(), "refresh failed, will retry");
            } else {
                tracing::error!(error = %e, "refresh failed");
            }
        }
    }
}

fn print_summary(report: &SyncReport) {
    let source = match report.source {
        DataSource::Live => "live fetch",
        DataSource::Backup => "exported backup",
        DataSource::OfflineCache => "offline cache",
    };
    let classes: usize = report
        .data
        .semesters
        .values()
        .map(|t| t.class_count())
        .sum();
    println!(
        "snapshot from {source}: {} teachers, {} labs, {} committee, {classes} classes, updated {}",
        report.data.teachers.len(),
        report.data.labs.len(),
        report.data.committee.len(),
        report.data.last_updated,
    );
    if !report.diagnostics.is_empty() {
        println!("{} parser diagnostics (see log)", report.diagnostics.len());
    }
}

/// Initialize tracing with text or JSON output
fn setup_tracing(format: &str, verbose: bool) -> Result<()> {
    let filter = if verbose {
        tracing_subscriber::EnvFilter::new("classroutine=debug,info")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("classroutine=info,warn"))
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    Ok(())
}
