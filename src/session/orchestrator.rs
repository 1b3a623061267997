use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, Notify};

use crate::analysis::{validate_setup, SetupProvider, SetupRecord};
use crate::calendar::{is_trading_window, MarketCalendar, TradingWindow};
use crate::config::BotConfig;
use crate::errors::{handle_error, BotError, BotResult};
use crate::logger::{self, LogTag};
use crate::news::NewsBlackoutTracker;
use crate::notifications::{Notification, Notifier, Urgency};
use crate::platform::{OrderRequest, TradingPlatform};
use crate::positions::{ActionKind, PositionManager, PositionRecord};
use crate::risk::RiskLedger;

use super::state::SystemState;

/// Ties the gates, the strategy seam and the execution path together
///
/// A scan runs only when every gate passes, in order: system not halted or
/// paused, inside the trading window, no news blackout, risk limits clear.
/// The first failing gate short-circuits with its reason.
pub struct SessionOrchestrator {
    config: Arc<BotConfig>,
    calendar: MarketCalendar,
    window: TradingWindow,
    news: Arc<NewsBlackoutTracker>,
    risk: Arc<Mutex<RiskLedger>>,
    positions: Arc<PositionManager>,
    platform: Arc<dyn TradingPlatform>,
    provider: Arc<dyn SetupProvider>,
    notifier: Arc<dyn Notifier>,
    state: Arc<SystemState>,
    paused: AtomicBool,
    halted: AtomicBool,
    shutdown: Arc<Notify>,
}

impl SessionOrchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: Arc<BotConfig>,
        news: Arc<NewsBlackoutTracker>,
        risk: Arc<Mutex<RiskLedger>>,
        positions: Arc<PositionManager>,
        platform: Arc<dyn TradingPlatform>,
        provider: Arc<dyn SetupProvider>,
        notifier: Arc<dyn Notifier>,
        state: Arc<SystemState>,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            calendar: MarketCalendar::from_config(&config)?,
            window: TradingWindow::from_config(&config)?,
            config,
            news,
            risk,
            positions,
            platform,
            provider,
            notifier,
            state,
            paused: AtomicBool::new(false),
            halted: AtomicBool::new(false),
            shutdown: Arc::new(Notify::new()),
        })
    }

    /// Evaluate every admission gate at the given instant
    pub async fn evaluate_gates(&self, now: DateTime<Tz>) -> BotResult<(bool, String)> {
        if self.halted.load(Ordering::SeqCst) {
            return Ok((false, "System halted".to_string()));
        }
        if self.paused.load(Ordering::SeqCst) {
            return Ok((false, "Trading paused by user".to_string()));
        }

        if !is_trading_window(now, &self.window, &self.calendar) {
            return Ok((false, "Outside trading window".to_string()));
        }

        let (safe, reason) = self.news.is_safe_to_trade(now).await;
        if !safe {
            return Ok((false, reason));
        }

        let mut risk = self.risk.lock().await;
        let (ok, reason) = risk.can_open_trade(now.date_naive())?;
        if !ok {
            return Ok((false, reason));
        }

        Ok((true, "All gates passed".to_string()))
    }

    /// One scan cycle: gate, find setups, validate, size and execute.
    /// Returns the number of trades opened.
    pub async fn run_scan(&self, now: DateTime<Tz>) -> BotResult<usize> {
        let stamp = now.format("%Y-%m-%d %H:%M").to_string();
        self.state.set("last_scan", json!(stamp)).await?;

        let (ok, reason) = self.evaluate_gates(now).await?;
        if !ok {
            logger::info(LogTag::Session, &format!("⛔ Scan skipped: {}", reason));
            return Ok(0);
        }

        let setups = self.provider.scan(now.with_timezone(&Utc)).await?;
        logger::info(
            LogTag::Session,
            &format!("🔍 Scan at {} found {} candidate(s)", stamp, setups.len()),
        );

        let mut opened = 0;
        for setup in &setups {
            let (valid, reason) = validate_setup(setup, &self.config.setup_filters);
            if !valid {
                logger::info(
                    LogTag::Session,
                    &format!("Candidate {} rejected: {}", setup.setup_type, reason),
                );
                continue;
            }

            // Limits move with every fill, so re-check before each order
            let (ok, reason) = {
                let mut risk = self.risk.lock().await;
                risk.can_open_trade(now.date_naive())?
            };
            if !ok {
                logger::info(LogTag::Session, &format!("Admission stopped: {}", reason));
                break;
            }

            if self.execute_setup(setup, now).await? {
                opened += 1;
            }
        }

        Ok(opened)
    }

    async fn execute_setup(&self, setup: &SetupRecord, now: DateTime<Tz>) -> BotResult<bool> {
        let size = {
            let risk = self.risk.lock().await;
            risk.calculate_position_size(setup.stop_distance(), None)
        };

        // Live sizing without both enable switches is treated as a note
        if size == 0 || !self.config.is_live_trading_allowed() {
            // Observation and paper modes log the setup without an order
            logger::info(
                LogTag::Session,
                &format!(
                    "📝 {} {} setup at {:.2} noted ({} mode, no order)",
                    setup.setup_type,
                    setup.direction.as_str(),
                    setup.entry_price,
                    self.config.system.current_mode.as_str()
                ),
            );
            self.notify(
                Urgency::Normal,
                &format!(
                    "Setup noted without order: {} {} at {:.2}",
                    setup.setup_type,
                    setup.direction.as_str(),
                    setup.entry_price
                ),
            )
            .await;
            return Ok(false);
        }

        let order = OrderRequest {
            symbol: setup.symbol.clone(),
            direction: setup.direction,
            size,
            stop_loss: setup.stop_loss,
            take_profit: setup.tp1,
        };

        let ticket = match self.platform.place_order(order).await {
            Ok(ticket) => ticket,
            Err(e) => {
                self.report_failure(&e, "order placement").await;
                return Ok(false);
            }
        };

        {
            let mut risk = self.risk.lock().await;
            risk.record_trade_opened(ticket, now.date_naive())?;
        }

        self.positions
            .track(PositionRecord::new(
                ticket,
                &setup.symbol,
                &setup.setup_type,
                setup.direction,
                now.with_timezone(&Utc),
                setup.entry_price,
                setup.stop_loss,
                setup.tp1,
                setup.tp2,
                size,
            ))
            .await;

        self.notify(
            Urgency::High,
            &format!(
                "Opened #{}: {} {} x{} at {:.2} (sl {:.2}, tp1 {:.2})",
                ticket,
                setup.setup_type,
                setup.direction.as_str(),
                size,
                setup.entry_price,
                setup.stop_loss,
                setup.tp1
            ),
        )
        .await;

        Ok(true)
    }

    /// One management pass over open positions, feeding realized pnl back
    /// into the risk ledger
    pub async fn check_positions_once(&self, now: DateTime<Utc>) -> BotResult<usize> {
        let actions = self.positions.check_positions(now).await;
        let today = now.date_naive();

        for action in &actions {
            if !action.success {
                continue;
            }
            let Some(pnl) = action.pnl else {
                continue;
            };
            let mut risk = self.risk.lock().await;
            match action.kind {
                ActionKind::ForceClose | ActionKind::FullCloseAtTarget => {
                    risk.record_trade_closed(action.ticket, pnl, today)?;
                }
                ActionKind::PartialExit => {
                    risk.record_partial_pnl(pnl, today)?;
                }
                ActionKind::TrailingStopUpdate => {}
            }
        }

        Ok(actions.len())
    }

    /// Spawn the periodic position check loop
    pub fn start_position_loop(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let orchestrator = self.clone();
        let shutdown = self.shutdown.clone();
        let interval = self.config.position_rules.check_interval_secs;
        tokio::spawn(async move {
            logger::info(LogTag::Positions, "🔁 Position check loop started");
            loop {
                tokio::select! {
                    _ = shutdown.notified() => {
                        logger::info(LogTag::Positions, "Position check loop stopping");
                        break;
                    }
                    _ = tokio::time::sleep(std::time::Duration::from_secs(interval)) => {
                        if let Err(e) = orchestrator.check_positions_once(Utc::now()).await {
                            orchestrator.report_failure(&e, "position check loop").await;
                        }
                    }
                }
            }
        })
    }

    /// Current account balance as the ledger sees it
    pub async fn get_balance(&self) -> f64 {
        let risk = self.risk.lock().await;
        risk.status().account_balance
    }

    /// One-line summary of today's activity
    pub async fn get_today_summary(&self) -> String {
        let status = {
            let risk = self.risk.lock().await;
            risk.status()
        };
        let open = self.positions.open_count().await;
        let last_scan = self
            .state
            .get_str("last_scan")
            .await
            .unwrap_or_else(|| "never".to_string());

        format!(
            "Daily summary: pnl {:.2} today / {:.2} week, trades {}/{} today, {:.0}% of daily limit used, {} open position(s), last scan {}",
            status.daily_pnl,
            status.weekly_pnl,
            status.trades_today,
            self.config.risk.max_trades_per_day,
            status.daily_limit_used_pct,
            open,
            last_scan
        )
    }

    /// Midday summary: risk counters, open positions, last scan
    pub async fn daily_summary(&self) -> BotResult<()> {
        let message = self.get_today_summary().await;
        logger::info(LogTag::Session, &format!("📊 {}", message));
        self.notify(Urgency::Normal, &message).await;
        Ok(())
    }

    /// Refresh the account balance from the broker into the ledger
    pub async fn sync_balance(&self) -> BotResult<()> {
        let balance = self.platform.get_account_balance().await?;
        let mut risk = self.risk.lock().await;
        risk.update_account_balance(balance)?;
        logger::debug(LogTag::Session, &format!("Balance synced: {:.2}", balance));
        Ok(())
    }

    pub fn pause_trading(&self) {
        self.paused.store(true, Ordering::SeqCst);
        logger::warning(LogTag::Session, "⏸️ Trading paused");
    }

    pub fn resume_trading(&self) {
        self.paused.store(false, Ordering::SeqCst);
        logger::info(LogTag::Session, "▶️ Trading resumed");
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    /// Classify a background failure and act on its report: high-severity
    /// errors reach the notifier, critical ones also halt trading
    pub async fn report_failure(&self, error: &BotError, context: &str) {
        let report = handle_error(error, context);
        if report.notify_user {
            self.notify(Urgency::High, &format!("{}: {}", context, error))
                .await;
        }
        if report.system_halt && !self.is_halted() {
            self.halt(&format!("{} failed critically", context)).await;
        }
    }

    /// Stop admitting trades permanently for this run
    pub async fn halt(&self, reason: &str) {
        self.halted.store(true, Ordering::SeqCst);
        logger::error(LogTag::Session, &format!("🛑 System halted: {}", reason));
        self.notify(Urgency::Critical, &format!("System halted: {}", reason))
            .await;
        if let Err(e) = self.state.set("system_halted", json!(true)).await {
            logger::error(LogTag::State, &format!("Failed to persist halt flag: {}", e));
        }
    }

    pub fn is_halted(&self) -> bool {
        self.halted.load(Ordering::SeqCst)
    }

    /// Current status snapshot for displays
    pub async fn get_status(&self) -> serde_json::Value {
        let status = {
            let risk = self.risk.lock().await;
            risk.status()
        };
        json!({
            "mode": self.config.system.current_mode.as_str(),
            "symbol": self.config.system.symbol,
            "paused": self.is_paused(),
            "halted": self.is_halted(),
            "risk": status,
            "open_positions": self.positions.open_count().await,
        })
    }

    /// Signal background loops started from this orchestrator to stop
    pub fn stop(&self) {
        self.shutdown.notify_waiters();
    }

    async fn notify(&self, urgency: Urgency, message: &str) {
        let notification = Notification::new(urgency, message);
        if let Err(e) = self.notifier.send(&notification).await {
            logger::warning(LogTag::Notify, &format!("Notification failed: {}", e));
        }
    }
}
