use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::path::PathBuf;

use crate::config::{BotConfig, RiskConfig, TradeMode};
use crate::errors::BotResult;
use crate::logger::{self, LogTag};

use super::persistence::RiskState;

/// Snapshot of the ledger for status displays and summaries
#[derive(Debug, Clone, Serialize)]
pub struct RiskStatus {
    pub account_balance: f64,
    pub daily_pnl: f64,
    pub weekly_pnl: f64,
    pub trades_today: u32,
    pub trades_this_week: u32,
    pub open_positions: usize,
    pub daily_loss_limit_amount: f64,
    pub weekly_loss_limit_amount: f64,
    /// Percent of the daily loss limit consumed (0 when in profit)
    pub daily_limit_used_pct: f64,
    pub weekly_limit_used_pct: f64,
}

/// Daily/weekly loss and trade-count accounting with trade admission
pub struct RiskLedger {
    config: RiskConfig,
    mode: TradeMode,
    state: RiskState,
    state_path: Option<PathBuf>,
}

impl RiskLedger {
    pub fn new(config: &BotConfig, account_balance: f64, today: NaiveDate) -> Self {
        Self {
            config: config.risk.clone(),
            mode: config.system.current_mode,
            state: RiskState::new(account_balance, today, iso_week(today)),
            state_path: None,
        }
    }

    /// Build a ledger that persists its state, restoring from disk if a
    /// previous run left a state file behind
    pub fn with_persistence(
        config: &BotConfig,
        account_balance: f64,
        today: NaiveDate,
        state_path: PathBuf,
    ) -> BotResult<Self> {
        let state = match RiskState::load(&state_path)? {
            Some(state) => state,
            None => RiskState::new(account_balance, today, iso_week(today)),
        };
        Ok(Self {
            config: config.risk.clone(),
            mode: config.system.current_mode,
            state,
            state_path: Some(state_path),
        })
    }

    /// Decide whether a new trade may be opened right now
    ///
    /// Checks run in a fixed order and the first failing one supplies the
    /// reason: daily loss, daily count, weekly loss, weekly count, open
    /// position concentration.
    pub fn can_open_trade(&mut self, today: NaiveDate) -> BotResult<(bool, String)> {
        self.rollover(today)?;

        let daily_limit = self.state.account_balance * self.config.daily_loss_limit;
        if self.state.daily_pnl < -daily_limit {
            return Ok((
                false,
                format!(
                    "Daily loss limit hit ({:.2} < -{:.2})",
                    self.state.daily_pnl, daily_limit
                ),
            ));
        }
        if self.state.trades_today >= self.config.max_trades_per_day {
            return Ok((
                false,
                format!(
                    "Daily trade count reached ({}/{})",
                    self.state.trades_today, self.config.max_trades_per_day
                ),
            ));
        }

        let weekly_limit = self.state.account_balance * self.config.weekly_loss_limit;
        if self.state.weekly_pnl < -weekly_limit {
            return Ok((
                false,
                format!(
                    "Weekly loss limit hit ({:.2} < -{:.2})",
                    self.state.weekly_pnl, weekly_limit
                ),
            ));
        }
        if self.state.trades_this_week >= self.config.max_trades_per_week {
            return Ok((
                false,
                format!(
                    "Weekly trade count reached ({}/{})",
                    self.state.trades_this_week, self.config.max_trades_per_week
                ),
            ));
        }

        if self.state.open_tickets.len() >= self.config.max_open_positions {
            return Ok((
                false,
                format!(
                    "Max open positions reached ({}/{})",
                    self.state.open_tickets.len(),
                    self.config.max_open_positions
                ),
            ));
        }

        Ok((true, "Risk checks passed".to_string()))
    }

    /// Contracts to trade for a given stop distance, by mode
    ///
    /// Observation and paper modes size zero. Micro-live uses the override
    /// when given, otherwise the fixed configured size. Full-live sizes off
    /// the risk fraction, floored.
    pub fn calculate_position_size(
        &self,
        stop_distance_ticks: f64,
        micro_override: Option<u32>,
    ) -> u32 {
        match self.mode {
            TradeMode::Observation | TradeMode::PaperTrading => 0,
            TradeMode::MicroLive => micro_override.unwrap_or(self.config.micro_fixed_size),
            TradeMode::FullLive => {
                if stop_distance_ticks <= 0.0 {
                    return 0;
                }
                let risk_amount = self.state.account_balance * self.config.risk_per_trade;
                let per_contract = stop_distance_ticks * self.config.point_value;
                (risk_amount / per_contract) as u32
            }
        }
    }

    /// Register a newly opened trade against today's and this week's counts
    pub fn record_trade_opened(&mut self, ticket: u64, today: NaiveDate) -> BotResult<()> {
        self.rollover(today)?;
        self.state.trades_today += 1;
        self.state.trades_this_week += 1;
        self.state.open_tickets.insert(ticket);
        logger::info(
            LogTag::Risk,
            &format!(
                "📈 Trade #{} opened ({} today, {} this week)",
                ticket, self.state.trades_today, self.state.trades_this_week
            ),
        );
        self.persist()
    }

    /// Register a closed trade's realized PnL
    pub fn record_trade_closed(&mut self, ticket: u64, pnl: f64, today: NaiveDate) -> BotResult<()> {
        self.rollover(today)?;
        self.state.open_tickets.remove(&ticket);
        self.state.daily_pnl += pnl;
        self.state.weekly_pnl += pnl;
        logger::info(
            LogTag::Risk,
            &format!(
                "📉 Trade #{} closed, pnl {:.2} (daily {:.2}, weekly {:.2})",
                ticket, pnl, self.state.daily_pnl, self.state.weekly_pnl
            ),
        );
        self.persist()
    }

    /// Realized pnl that does not close the position (partial exits)
    pub fn record_partial_pnl(&mut self, pnl: f64, today: NaiveDate) -> BotResult<()> {
        self.rollover(today)?;
        self.state.daily_pnl += pnl;
        self.state.weekly_pnl += pnl;
        self.persist()
    }

    pub fn update_account_balance(&mut self, balance: f64) -> BotResult<()> {
        self.state.account_balance = balance;
        self.persist()
    }

    pub fn open_tickets(&self) -> Vec<u64> {
        self.state.open_tickets.iter().copied().collect()
    }

    pub fn status(&self) -> RiskStatus {
        let daily_limit = self.state.account_balance * self.config.daily_loss_limit;
        let weekly_limit = self.state.account_balance * self.config.weekly_loss_limit;
        RiskStatus {
            account_balance: self.state.account_balance,
            daily_pnl: self.state.daily_pnl,
            weekly_pnl: self.state.weekly_pnl,
            trades_today: self.state.trades_today,
            trades_this_week: self.state.trades_this_week,
            open_positions: self.state.open_tickets.len(),
            daily_loss_limit_amount: daily_limit,
            weekly_loss_limit_amount: weekly_limit,
            daily_limit_used_pct: limit_used_pct(self.state.daily_pnl, daily_limit),
            weekly_limit_used_pct: limit_used_pct(self.state.weekly_pnl, weekly_limit),
        }
    }

    /// Reset daily and weekly counters when the calendar has moved on.
    /// Idempotent within the same day/week.
    fn rollover(&mut self, today: NaiveDate) -> BotResult<()> {
        let mut changed = false;

        if today != self.state.current_day {
            logger::info(
                LogTag::Risk,
                &format!("🔄 Daily rollover {} -> {}", self.state.current_day, today),
            );
            self.state.current_day = today;
            self.state.daily_pnl = 0.0;
            self.state.trades_today = 0;
            changed = true;
        }

        let week = iso_week(today);
        if week != self.state.current_week {
            logger::info(
                LogTag::Risk,
                &format!(
                    "🔄 Weekly rollover {:?} -> {:?}",
                    self.state.current_week, week
                ),
            );
            self.state.current_week = week;
            self.state.weekly_pnl = 0.0;
            self.state.trades_this_week = 0;
            changed = true;
        }

        if changed {
            self.persist()?;
        }
        Ok(())
    }

    fn persist(&mut self) -> BotResult<()> {
        if let Some(path) = self.state_path.clone() {
            self.state.save(&path)?;
        }
        Ok(())
    }
}

fn limit_used_pct(pnl: f64, limit: f64) -> f64 {
    if limit <= 0.0 {
        return 0.0;
    }
    (-pnl).max(0.0) / limit * 100.0
}

fn iso_week(date: NaiveDate) -> (i32, u32) {
    let iso = date.iso_week();
    (iso.year(), iso.week())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(mode: TradeMode) -> BotConfig {
        let mut config = BotConfig::default();
        config.system.current_mode = mode;
        config
    }

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 12).unwrap()
    }

    #[test]
    fn test_admission_passes_when_fresh() {
        let mut ledger = RiskLedger::new(&config(TradeMode::FullLive), 5000.0, monday());
        let (ok, reason) = ledger.can_open_trade(monday()).unwrap();
        assert!(ok, "{}", reason);
    }

    #[test]
    fn test_daily_loss_limit_blocks() {
        let mut ledger = RiskLedger::new(&config(TradeMode::FullLive), 5000.0, monday());
        // 3% of 5000 is 150; lose more than that
        ledger.record_trade_opened(1, monday()).unwrap();
        ledger.record_trade_closed(1, -151.0, monday()).unwrap();

        let (ok, reason) = ledger.can_open_trade(monday()).unwrap();
        assert!(!ok);
        assert!(reason.contains("Daily loss limit"));
    }

    #[test]
    fn test_loss_exactly_at_limit_still_allowed() {
        let mut ledger = RiskLedger::new(&config(TradeMode::FullLive), 5000.0, monday());
        ledger.record_trade_opened(1, monday()).unwrap();
        ledger.record_trade_closed(1, -150.0, monday()).unwrap();

        let (ok, _) = ledger.can_open_trade(monday()).unwrap();
        assert!(ok, "the limit check is strict, -150.00 is not past -150.00");
    }

    #[test]
    fn test_daily_trade_count_blocks() {
        let mut ledger = RiskLedger::new(&config(TradeMode::FullLive), 5000.0, monday());
        for ticket in 1..=3 {
            ledger.record_trade_opened(ticket, monday()).unwrap();
            ledger.record_trade_closed(ticket, 10.0, monday()).unwrap();
        }

        let (ok, reason) = ledger.can_open_trade(monday()).unwrap();
        assert!(!ok);
        assert!(reason.contains("Daily trade count"));
    }

    #[test]
    fn test_daily_rollover_resets_daily_only() {
        let mut ledger = RiskLedger::new(&config(TradeMode::FullLive), 5000.0, monday());
        for ticket in 1..=3 {
            ledger.record_trade_opened(ticket, monday()).unwrap();
            ledger.record_trade_closed(ticket, -40.0, monday()).unwrap();
        }

        let tuesday = monday() + chrono::Duration::days(1);
        let (ok, reason) = ledger.can_open_trade(tuesday).unwrap();
        assert!(ok, "{}", reason);

        let status = ledger.status();
        assert_eq!(status.trades_today, 0);
        assert_eq!(status.daily_pnl, 0.0);
        // Weekly counters survive a daily rollover
        assert_eq!(status.trades_this_week, 3);
        assert_eq!(status.weekly_pnl, -120.0);
    }

    #[test]
    fn test_weekly_rollover_resets_weekly() {
        let mut ledger = RiskLedger::new(&config(TradeMode::FullLive), 5000.0, monday());
        ledger.record_trade_opened(1, monday()).unwrap();
        ledger.record_trade_closed(1, -100.0, monday()).unwrap();

        let next_monday = monday() + chrono::Duration::days(7);
        ledger.can_open_trade(next_monday).unwrap();

        let status = ledger.status();
        assert_eq!(status.trades_this_week, 0);
        assert_eq!(status.weekly_pnl, 0.0);
    }

    #[test]
    fn test_weekly_loss_limit_blocks() {
        let mut ledger = RiskLedger::new(&config(TradeMode::FullLive), 5000.0, monday());
        // Lose past the 6% weekly limit (300) across three days, each day
        // staying inside the 3% daily limit (150) so only the weekly check
        // can be the one that blocks
        for (offset, ticket) in [(0i64, 1u64), (1, 2), (2, 3)] {
            let day = monday() + chrono::Duration::days(offset);
            ledger.record_trade_opened(ticket, day).unwrap();
            ledger.record_trade_closed(ticket, -110.0, day).unwrap();
        }

        let wednesday = monday() + chrono::Duration::days(2);
        let (ok, reason) = ledger.can_open_trade(wednesday).unwrap();
        assert!(!ok);
        assert!(reason.contains("Weekly loss limit"));
    }

    #[test]
    fn test_concentration_blocks() {
        let mut config = config(TradeMode::FullLive);
        config.risk.max_trades_per_day = 10;
        let mut ledger = RiskLedger::new(&config, 5000.0, monday());
        for ticket in 1..=3 {
            ledger.record_trade_opened(ticket, monday()).unwrap();
        }

        let (ok, reason) = ledger.can_open_trade(monday()).unwrap();
        assert!(!ok);
        assert!(reason.contains("Max open positions"));
    }

    #[test]
    fn test_position_size_by_mode() {
        let monday = monday();

        let ledger = RiskLedger::new(&config(TradeMode::Observation), 5000.0, monday);
        assert_eq!(ledger.calculate_position_size(20.0, None), 0);

        let ledger = RiskLedger::new(&config(TradeMode::PaperTrading), 5000.0, monday);
        assert_eq!(ledger.calculate_position_size(20.0, None), 0);

        let ledger = RiskLedger::new(&config(TradeMode::MicroLive), 5000.0, monday);
        assert_eq!(ledger.calculate_position_size(20.0, None), 2);
        assert_eq!(ledger.calculate_position_size(20.0, Some(1)), 1);

        // 5000 * 0.01 / (20 * 0.25) = 10
        let ledger = RiskLedger::new(&config(TradeMode::FullLive), 5000.0, monday);
        assert_eq!(ledger.calculate_position_size(20.0, None), 10);
    }

    #[test]
    fn test_zero_stop_distance_sizes_zero() {
        let ledger = RiskLedger::new(&config(TradeMode::FullLive), 5000.0, monday());
        assert_eq!(ledger.calculate_position_size(0.0, None), 0);
        assert_eq!(ledger.calculate_position_size(-5.0, None), 0);
    }

    #[test]
    fn test_status_reports_limit_consumption() {
        let mut ledger = RiskLedger::new(&config(TradeMode::FullLive), 5000.0, monday());
        ledger.record_trade_opened(1, monday()).unwrap();
        ledger.record_trade_closed(1, -75.0, monday()).unwrap();

        let status = ledger.status();
        // 75 of the 150 daily limit, 75 of the 300 weekly limit
        assert!((status.daily_limit_used_pct - 50.0).abs() < 1e-9);
        assert!((status.weekly_limit_used_pct - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_persistence_restores_counters() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("risk_state.json");
        let config = config(TradeMode::FullLive);

        {
            let mut ledger =
                RiskLedger::with_persistence(&config, 5000.0, monday(), path.clone()).unwrap();
            ledger.record_trade_opened(7, monday()).unwrap();
            ledger.record_trade_closed(7, -50.0, monday()).unwrap();
        }

        let ledger = RiskLedger::with_persistence(&config, 5000.0, monday(), path).unwrap();
        let status = ledger.status();
        assert_eq!(status.trades_today, 1);
        assert_eq!(status.daily_pnl, -50.0);
    }
}
