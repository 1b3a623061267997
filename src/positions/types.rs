use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::platform::Direction;

/// A tracked open position and its management state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionRecord {
    pub ticket: u64,
    pub symbol: String,
    /// Setup family that produced the trade, e.g. "breakout" or
    /// "mean_reversion". Mean-reversion positions exit fully at TP1.
    pub setup_type: String,
    pub direction: Direction,
    pub entry_time: DateTime<Utc>,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub tp1: f64,
    pub tp2: f64,
    pub original_size: u32,
    pub current_size: u32,
    pub partial_exit_done: bool,
    /// Last trailing stop applied at the broker; ratchets only in the
    /// favorable direction
    pub trailing_stop_price: Option<f64>,
    /// Most favorable price seen since entry
    pub favorable_extreme: f64,
    pub notes: String,
}

impl PositionRecord {
    pub fn new(
        ticket: u64,
        symbol: &str,
        setup_type: &str,
        direction: Direction,
        entry_time: DateTime<Utc>,
        entry_price: f64,
        stop_loss: f64,
        tp1: f64,
        tp2: f64,
        size: u32,
    ) -> Self {
        Self {
            ticket,
            symbol: symbol.to_string(),
            setup_type: setup_type.to_string(),
            direction,
            entry_time,
            entry_price,
            stop_loss,
            tp1,
            tp2,
            original_size: size,
            current_size: size,
            partial_exit_done: false,
            trailing_stop_price: None,
            favorable_extreme: entry_price,
            notes: String::new(),
        }
    }

    /// Instant after which the position must be force-closed
    pub fn hold_deadline(&self, max_hold_hours: i64) -> DateTime<Utc> {
        self.entry_time + Duration::hours(max_hold_hours)
    }

    /// TP1 hit at the given price
    pub fn tp1_reached(&self, price: f64) -> bool {
        match self.direction {
            Direction::Long => price >= self.tp1,
            Direction::Short => price <= self.tp1,
        }
    }

    /// Track the most favorable excursion since entry
    pub fn update_extreme(&mut self, price: f64) {
        match self.direction {
            Direction::Long => {
                if price > self.favorable_extreme {
                    self.favorable_extreme = price;
                }
            }
            Direction::Short => {
                if price < self.favorable_extreme {
                    self.favorable_extreme = price;
                }
            }
        }
    }
}

/// What the manager did (or tried to do) to a position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Max hold time exceeded, full close
    ForceClose,
    /// TP1 reached and the whole position comes off: mean-reversion setups,
    /// or a partial exit that would have flattened the remaining size
    FullCloseAtTarget,
    /// TP1 reached, close the configured fraction
    PartialExit,
    /// Trailing stop ratcheted at the broker
    TrailingStopUpdate,
}

/// Outcome of one management decision
///
/// `success` is false when the broker call failed; in that case the
/// in-memory position state is left untouched and the rule fires again on
/// the next check.
#[derive(Debug, Clone, Serialize)]
pub struct ManagementAction {
    pub ticket: u64,
    pub kind: ActionKind,
    pub success: bool,
    /// Realized pnl for closing actions that succeeded
    pub pnl: Option<f64>,
    pub detail: String,
}
