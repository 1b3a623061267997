//! ScoutBot entrypoint
//!
//! Wires the configuration, platform adapter, risk ledger, news tracker,
//! position manager and scheduler together, then runs until Ctrl-C.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{Mutex, Notify};

use scoutbot::analysis::NullSetupProvider;
use scoutbot::config::{BotConfig, TradeMode};
use scoutbot::errors::handle_error;
use scoutbot::logger::{self, LogTag};
use scoutbot::news::{NewsBlackoutTracker, StaticCalendarSource};
use scoutbot::notifications::ConsoleNotifier;
use scoutbot::paths;
use scoutbot::platform::PaperPlatform;
use scoutbot::positions::PositionManager;
use scoutbot::risk::RiskLedger;
use scoutbot::scheduler::{JobCallback, JobSchedule, JobScheduler};
use scoutbot::session::{HealthMonitor, SessionOrchestrator, SystemState};

/// Paper account seed values used until a broker adapter is wired in
const PAPER_START_BALANCE: f64 = 5000.0;
const PAPER_SEED_PRICE: f64 = 21200.0;

#[derive(Parser, Debug)]
#[command(name = "scoutbot", about = "Trading session orchestration and risk control")]
struct Cli {
    /// Path to the config file (defaults to the platform data directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Force observation mode regardless of the configured mode
    #[arg(long)]
    dry_run: bool,

    /// Show verbose log output
    #[arg(long)]
    verbose: bool,

    /// Warnings and errors only
    #[arg(long)]
    quiet: bool,

    // Per-module debug logging; picked up by the logger through the shared
    // argument store
    #[arg(long = "debug-session", hide = true)]
    debug_session: bool,
    #[arg(long = "debug-risk", hide = true)]
    debug_risk: bool,
    #[arg(long = "debug-positions", hide = true)]
    debug_positions: bool,
    #[arg(long = "debug-scheduler", hide = true)]
    debug_scheduler: bool,
    #[arg(long = "debug-news", hide = true)]
    debug_news: bool,
    #[arg(long = "debug-calendar", hide = true)]
    debug_calendar: bool,
    #[arg(long = "debug-platform", hide = true)]
    debug_platform: bool,
    #[arg(long = "debug-health", hide = true)]
    debug_health: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    paths::ensure_all_directories().context("creating data directories")?;
    logger::init();

    let config_path = cli.config.unwrap_or_else(paths::get_config_path);
    let mut config = BotConfig::load_or_default(&config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;
    if cli.dry_run {
        config.system.current_mode = TradeMode::Observation;
        config.system.enable_live_trading = false;
    }
    let config = Arc::new(config);
    let tz = config.tz()?;

    logger::info(
        LogTag::System,
        &format!(
            "🚀 ScoutBot starting ({} mode, {} {})",
            config.system.current_mode.as_str(),
            config.system.symbol,
            config.trading_hours.timezone
        ),
    );

    let platform = Arc::new(PaperPlatform::new(
        PAPER_START_BALANCE,
        PAPER_SEED_PRICE,
        config.risk.point_value,
    ));

    let today = Utc::now().with_timezone(&tz).date_naive();
    let risk = Arc::new(Mutex::new(RiskLedger::with_persistence(
        &config,
        PAPER_START_BALANCE,
        today,
        paths::get_risk_state_path(),
    )?));

    let news = Arc::new(NewsBlackoutTracker::from_config(
        &config,
        Box::new(StaticCalendarSource::empty()),
    )?);
    if let Err(e) = news.refresh(today).await {
        handle_error(&e, "initial news refresh");
    }

    let positions = Arc::new(PositionManager::new(&config, platform.clone()));
    let state = Arc::new(SystemState::open(paths::get_system_state_path())?);

    let orchestrator = Arc::new(SessionOrchestrator::new(
        config.clone(),
        news.clone(),
        risk,
        positions,
        platform.clone(),
        Arc::new(NullSetupProvider),
        Arc::new(ConsoleNotifier),
        state,
    )?);
    orchestrator.sync_balance().await?;

    let scheduler = Arc::new(JobScheduler::new(tz));
    register_jobs(&scheduler, &config, &orchestrator, &news).await?;
    scheduler.start().await;

    let position_loop = orchestrator.start_position_loop();

    let health_shutdown = Arc::new(Notify::new());
    let health = Arc::new(HealthMonitor::new(
        platform.clone(),
        paths::get_data_directory(),
    ));
    let health_loop = health.spawn(health_shutdown.clone(), orchestrator.clone());

    logger::info(LogTag::System, "✅ ScoutBot running, Ctrl-C to stop");
    tokio::signal::ctrl_c().await.context("waiting for Ctrl-C")?;

    logger::info(LogTag::System, "🛑 Shutdown requested");
    orchestrator.stop();
    scheduler.stop().await;
    health_shutdown.notify_waiters();
    let _ = tokio::time::timeout(std::time::Duration::from_secs(5), position_loop).await;
    let _ = tokio::time::timeout(std::time::Duration::from_secs(5), health_loop).await;
    logger::flush();
    logger::info(LogTag::System, "👋 ScoutBot stopped");
    Ok(())
}

/// Register the scan schedule, the news refresh, the midday summary and the
/// Monday outlook
async fn register_jobs(
    scheduler: &Arc<JobScheduler>,
    config: &Arc<BotConfig>,
    orchestrator: &Arc<SessionOrchestrator>,
    news: &Arc<NewsBlackoutTracker>,
) -> Result<()> {
    let tz = config.tz()?;

    for hhmm in &config.trading_hours.scan_schedule {
        let time = config.parse_time(hhmm)?;
        let id = format!("scan_{}", hhmm.replace(':', ""));
        let callback: JobCallback = {
            let orchestrator = orchestrator.clone();
            Arc::new(move || {
                let orchestrator = orchestrator.clone();
                Box::pin(async move {
                    let now = Utc::now().with_timezone(&tz);
                    if let Err(e) = orchestrator.run_scan(now).await {
                        orchestrator.report_failure(&e, "scheduled scan").await;
                    }
                })
            })
        };
        scheduler
            .add_job(&id, JobSchedule::Weekdays(time), callback)
            .await?;
    }

    // Refresh the economic calendar before the session each weekday
    let refresh_time = config.parse_time("08:00")?;
    let refresh: JobCallback = {
        let news = news.clone();
        let orchestrator = orchestrator.clone();
        let tz2 = tz;
        Arc::new(move || {
            let news = news.clone();
            let orchestrator = orchestrator.clone();
            Box::pin(async move {
                let today = Utc::now().with_timezone(&tz2).date_naive();
                if let Err(e) = news.refresh(today).await {
                    orchestrator.report_failure(&e, "news refresh").await;
                }
            })
        })
    };
    scheduler
        .add_job("daily_0800", JobSchedule::Weekdays(refresh_time), refresh)
        .await?;

    let summary_time = config.parse_time(&config.trading_hours.daily_summary_time)?;
    let summary_id = format!(
        "daily_{}",
        config.trading_hours.daily_summary_time.replace(':', "")
    );
    let summary: JobCallback = {
        let orchestrator = orchestrator.clone();
        Arc::new(move || {
            let orchestrator = orchestrator.clone();
            Box::pin(async move {
                if let Err(e) = orchestrator.daily_summary().await {
                    orchestrator.report_failure(&e, "daily summary").await;
                }
            })
        })
    };
    scheduler
        .add_job(&summary_id, JobSchedule::Weekdays(summary_time), summary)
        .await?;

    // Monday morning outlook: the week's high-impact events
    let outlook_time = config.parse_time("08:00")?;
    let outlook: JobCallback = {
        let news = news.clone();
        let orchestrator = orchestrator.clone();
        let tz2 = tz;
        Arc::new(move || {
            let news = news.clone();
            let orchestrator = orchestrator.clone();
            Box::pin(async move {
                let today = Utc::now().with_timezone(&tz2).date_naive();
                match news.weekly_outlook(today).await {
                    Ok(outlook) => {
                        for (date, titles) in &outlook.days {
                            logger::info(
                                LogTag::News,
                                &format!("🗓️ {}: {}", date, titles.join(", ")),
                            );
                        }
                    }
                    Err(e) => {
                        orchestrator.report_failure(&e, "weekly outlook").await;
                    }
                }
            })
        })
    };
    scheduler
        .add_job(
            "weekly_mon_0800",
            JobSchedule::Weekly(chrono::Weekday::Mon, outlook_time),
            outlook,
        )
        .await?;

    logger::info(
        LogTag::Scheduler,
        &format!("Registered {} job(s)", scheduler.job_ids().await.len()),
    );
    Ok(())
}
