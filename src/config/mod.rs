//! Runtime configuration for ScoutBot
//!
//! A `BotConfig` is loaded once at startup and passed by reference
//! (`Arc<BotConfig>`) into every component. Nothing reads configuration
//! through a global.

use anyhow::{anyhow, Result};
use chrono::NaiveTime;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Trading mode, ordered from safest to most exposed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeMode {
    /// Analysis only, no position sizing
    Observation,
    /// Simulated fills, no real position
    PaperTrading,
    /// Fixed small real size (conservative testing phase)
    MicroLive,
    /// Risk-based sizing
    FullLive,
}

impl TradeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeMode::Observation => "observation",
            TradeMode::PaperTrading => "paper_trading",
            TradeMode::MicroLive => "micro_live",
            TradeMode::FullLive => "full_live",
        }
    }
}

/// Main bot configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    pub system: SystemConfig,
    pub trading_hours: TradingHoursConfig,
    pub risk: RiskConfig,
    pub position_rules: PositionRulesConfig,
    pub news: NewsConfig,
    pub setup_filters: SetupFiltersConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    pub current_mode: TradeMode,
    /// Master switch for live trading
    pub enable_live_trading: bool,
    /// Additional safety layer, both switches must be on
    pub trading_enabled: bool,
    pub symbol: String,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            current_mode: TradeMode::Observation,
            enable_live_trading: false,
            trading_enabled: false,
            symbol: "NAS100".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TradingHoursConfig {
    pub timezone: String,
    /// Market session open (HH:MM)
    pub market_open: String,
    /// Market session close (HH:MM)
    pub market_close: String,
    /// Trade-admission window start (HH:MM)
    pub window_start: String,
    /// Trade-admission window end (HH:MM, inclusive)
    pub window_end: String,
    /// Scan times during the trading day (HH:MM)
    pub scan_schedule: Vec<String>,
    /// Daily summary time (HH:MM)
    pub daily_summary_time: String,
}

impl Default for TradingHoursConfig {
    fn default() -> Self {
        Self {
            timezone: "America/New_York".to_string(),
            market_open: "09:30".to_string(),
            market_close: "16:00".to_string(),
            window_start: "09:30".to_string(),
            window_end: "11:30".to_string(),
            scan_schedule: crate::calendar::default_scan_times()
                .iter()
                .map(|s| s.to_string())
                .collect(),
            daily_summary_time: "12:00".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Risk fraction per trade (0.01 = 1%)
    pub risk_per_trade: f64,
    /// Daily loss limit as fraction of balance (0.03 = 3%)
    pub daily_loss_limit: f64,
    /// Weekly loss limit as fraction of balance (0.06 = 6%)
    pub weekly_loss_limit: f64,
    pub max_trades_per_day: u32,
    pub max_trades_per_week: u32,
    /// Dollar value per point (0.25 for NAS100 micro)
    pub point_value: f64,
    pub max_open_positions: usize,
    /// Fixed contract count for micro_live mode
    pub micro_fixed_size: u32,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            risk_per_trade: 0.01,
            daily_loss_limit: 0.03,
            weekly_loss_limit: 0.06,
            max_trades_per_day: 3,
            max_trades_per_week: 12,
            point_value: 0.25,
            max_open_positions: 3,
            micro_fixed_size: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PositionRulesConfig {
    /// Fraction of original size closed at TP1
    pub partial_exit_ratio: f64,
    /// Maximum position hold time in hours
    pub max_hold_hours: i64,
    /// Offset fraction below/above current price used as the trailing
    /// structure candidate
    pub trail_offset_fraction: f64,
    /// Interval between periodic position checks, seconds
    pub check_interval_secs: u64,
}

impl Default for PositionRulesConfig {
    fn default() -> Self {
        Self {
            partial_exit_ratio: 0.5,
            max_hold_hours: 3,
            trail_offset_fraction: 0.001,
            check_interval_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsConfig {
    /// Minutes before a high-impact event that the blackout starts
    pub blackout_before_minutes: i64,
    /// Minutes after a high-impact event that the blackout ends
    pub blackout_after_minutes: i64,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            blackout_before_minutes: 15,
            blackout_after_minutes: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SetupFiltersConfig {
    pub min_reward_risk_ratio: f64,
    pub min_confidence_score: u32,
}

impl Default for SetupFiltersConfig {
    fn default() -> Self {
        Self {
            min_reward_risk_ratio: 1.5,
            min_confidence_score: 7,
        }
    }
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            system: SystemConfig::default(),
            trading_hours: TradingHoursConfig::default(),
            risk: RiskConfig::default(),
            position_rules: PositionRulesConfig::default(),
            news: NewsConfig::default(),
            setup_filters: SetupFiltersConfig::default(),
        }
    }
}

impl BotConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: BotConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from file if it exists, otherwise defaults
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a JSON file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        self.tz()?;
        self.parse_time(&self.trading_hours.market_open)?;
        self.parse_time(&self.trading_hours.market_close)?;
        self.parse_time(&self.trading_hours.window_start)?;
        self.parse_time(&self.trading_hours.window_end)?;
        self.parse_time(&self.trading_hours.daily_summary_time)?;
        for t in &self.trading_hours.scan_schedule {
            self.parse_time(t)?;
        }

        if self.risk.risk_per_trade <= 0.0 || self.risk.risk_per_trade > 0.1 {
            return Err(anyhow!("risk_per_trade must be in (0, 0.1]"));
        }
        if self.risk.daily_loss_limit <= 0.0 || self.risk.weekly_loss_limit <= 0.0 {
            return Err(anyhow!("loss limits must be positive"));
        }
        if self.risk.point_value <= 0.0 {
            return Err(anyhow!("point_value must be positive"));
        }
        if !(0.0..=1.0).contains(&self.position_rules.partial_exit_ratio) {
            return Err(anyhow!("partial_exit_ratio must be in [0, 1]"));
        }
        if self.position_rules.max_hold_hours <= 0 {
            return Err(anyhow!("max_hold_hours must be positive"));
        }

        Ok(())
    }

    /// Parsed timezone
    pub fn tz(&self) -> Result<Tz> {
        self.trading_hours
            .timezone
            .parse::<Tz>()
            .map_err(|e| anyhow!("invalid timezone {}: {}", self.trading_hours.timezone, e))
    }

    /// Parse an HH:MM string into a NaiveTime
    pub fn parse_time(&self, hhmm: &str) -> Result<NaiveTime> {
        NaiveTime::parse_from_str(hhmm, "%H:%M")
            .map_err(|e| anyhow!("invalid time {}: {}", hhmm, e))
    }

    /// Check if live trading is fully enabled (both switches plus live mode)
    pub fn is_live_trading_allowed(&self) -> bool {
        self.system.enable_live_trading
            && self.system.trading_enabled
            && matches!(
                self.system.current_mode,
                TradeMode::MicroLive | TradeMode::FullLive
            )
    }
}
