use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::{BotConfig, PositionRulesConfig};
use crate::logger::{self, LogTag};
use crate::platform::{Direction, TradingPlatform};

use super::types::{ActionKind, ManagementAction, PositionRecord};

/// Setup family whose positions exit fully at the first target
const MEAN_REVERSION: &str = "mean_reversion";

/// What a management pass decided to do with one position
enum Decision {
    ForceClose,
    FullCloseAtTarget,
    PartialExit { size: u32 },
    Trail { candidate: f64 },
}

/// Applies exit rules to the set of tracked positions
///
/// Rules are evaluated per position in priority order; at most one action
/// fires per position per check. Broker failures leave the record untouched
/// so the same rule retries on the next pass. Broker calls never hold the
/// record map lock; transitions re-check that the record still exists.
pub struct PositionManager {
    rules: PositionRulesConfig,
    platform: Arc<dyn TradingPlatform>,
    positions: Mutex<HashMap<u64, PositionRecord>>,
}

impl PositionManager {
    pub fn new(config: &BotConfig, platform: Arc<dyn TradingPlatform>) -> Self {
        Self {
            rules: config.position_rules.clone(),
            platform,
            positions: Mutex::new(HashMap::new()),
        }
    }

    /// Start tracking a newly opened position
    pub async fn track(&self, record: PositionRecord) {
        logger::info(
            LogTag::Positions,
            &format!(
                "👁️ Tracking #{} {} {} x{} @ {:.2} (tp1 {:.2}, sl {:.2})",
                record.ticket,
                record.setup_type,
                record.direction.as_str(),
                record.current_size,
                record.entry_price,
                record.tp1,
                record.stop_loss
            ),
        );
        self.positions.lock().await.insert(record.ticket, record);
    }

    /// Stop tracking (position closed externally, e.g. stop hit at broker)
    pub async fn untrack(&self, ticket: u64) -> Option<PositionRecord> {
        self.positions.lock().await.remove(&ticket)
    }

    pub async fn open_count(&self) -> usize {
        self.positions.lock().await.len()
    }

    pub async fn snapshot(&self) -> Vec<PositionRecord> {
        self.positions.lock().await.values().cloned().collect()
    }

    /// Run one management pass over every tracked position
    ///
    /// Priority per position: max hold, target exit, trailing ratchet. The
    /// ratchet runs on every pass, before or after a partial exit.
    pub async fn check_positions(&self, now: DateTime<Utc>) -> Vec<ManagementAction> {
        let records = self.snapshot().await;
        let mut actions = Vec::new();

        for record in records {
            let ticket = record.ticket;
            let price = match self.platform.get_current_price(&record.symbol).await {
                Ok(price) => price,
                Err(e) => {
                    logger::warning(
                        LogTag::Positions,
                        &format!("Price unavailable for #{}: {}", ticket, e),
                    );
                    continue;
                }
            };

            // Refresh the extreme and take a current view; the record may
            // have been untracked while the quote was in flight
            let current = {
                let mut positions = self.positions.lock().await;
                match positions.get_mut(&ticket) {
                    Some(record) => {
                        record.update_extreme(price);
                        record.clone()
                    }
                    None => continue,
                }
            };

            let Some(decision) = self.decide(&current, price, now) else {
                continue;
            };
            let action = self.apply(&current, decision, price).await;
            self.log_action(&action);
            actions.push(action);
        }

        actions
    }

    /// Pick the single rule that fires for this position, if any
    fn decide(&self, record: &PositionRecord, price: f64, now: DateTime<Utc>) -> Option<Decision> {
        // Max hold time beats every other rule
        if now >= record.hold_deadline(self.rules.max_hold_hours) {
            return Some(Decision::ForceClose);
        }

        if record.tp1_reached(price) {
            if record.setup_type == MEAN_REVERSION {
                // Mean reversion takes the whole position off at TP1
                return Some(Decision::FullCloseAtTarget);
            }
            if !record.partial_exit_done {
                let size = self.partial_size(record);
                if size >= record.current_size {
                    // The exit fraction flattens the position entirely
                    return Some(Decision::FullCloseAtTarget);
                }
                return Some(Decision::PartialExit { size });
            }
        }

        self.trailing_candidate(record, price)
            .map(|candidate| Decision::Trail { candidate })
    }

    /// Execute a decision at the broker, then fold the result back into the
    /// record map. The map lock is never held across a broker call.
    async fn apply(
        &self,
        record: &PositionRecord,
        decision: Decision,
        price: f64,
    ) -> ManagementAction {
        let ticket = record.ticket;
        match decision {
            Decision::ForceClose => match self.platform.close_position(ticket).await {
                Ok(pnl) => {
                    self.positions.lock().await.remove(&ticket);
                    ManagementAction {
                        ticket,
                        kind: ActionKind::ForceClose,
                        success: true,
                        pnl: Some(pnl),
                        detail: format!("held past {} hour limit", self.rules.max_hold_hours),
                    }
                }
                Err(e) => ManagementAction {
                    ticket,
                    kind: ActionKind::ForceClose,
                    success: false,
                    pnl: None,
                    detail: format!("close failed: {}", e),
                },
            },

            Decision::FullCloseAtTarget => match self.platform.close_position(ticket).await {
                Ok(pnl) => {
                    self.positions.lock().await.remove(&ticket);
                    ManagementAction {
                        ticket,
                        kind: ActionKind::FullCloseAtTarget,
                        success: true,
                        pnl: Some(pnl),
                        detail: format!("tp1 {:.2} reached at {:.2}", record.tp1, price),
                    }
                }
                Err(e) => ManagementAction {
                    ticket,
                    kind: ActionKind::FullCloseAtTarget,
                    success: false,
                    pnl: None,
                    detail: format!("close failed: {}", e),
                },
            },

            Decision::PartialExit { size } => {
                match self.platform.partial_close(ticket, size).await {
                    Ok(pnl) => {
                        // Runner rides risk-free: stop moves to breakeven. A
                        // failed move is not fatal; the trailing ratchet runs
                        // on every later pass and restores protection.
                        let breakeven = record.entry_price;
                        let stop_moved = self
                            .platform
                            .update_stop_loss(ticket, breakeven)
                            .await
                            .is_ok();
                        let mut positions = self.positions.lock().await;
                        if let Some(record) = positions.get_mut(&ticket) {
                            record.partial_exit_done = true;
                            record.current_size = record.current_size.saturating_sub(size);
                            if stop_moved {
                                record.stop_loss = breakeven;
                            }
                        }
                        ManagementAction {
                            ticket,
                            kind: ActionKind::PartialExit,
                            success: true,
                            pnl: Some(pnl),
                            detail: format!(
                                "closed {} of {} at tp1, stop to {}",
                                size,
                                record.original_size,
                                if stop_moved { "breakeven" } else { "breakeven pending" }
                            ),
                        }
                    }
                    Err(e) => ManagementAction {
                        ticket,
                        kind: ActionKind::PartialExit,
                        success: false,
                        pnl: None,
                        detail: format!("partial close failed: {}", e),
                    },
                }
            }

            Decision::Trail { candidate } => {
                match self.platform.update_stop_loss(ticket, candidate).await {
                    Ok(()) => {
                        let mut positions = self.positions.lock().await;
                        if let Some(record) = positions.get_mut(&ticket) {
                            record.trailing_stop_price = Some(candidate);
                        }
                        ManagementAction {
                            ticket,
                            kind: ActionKind::TrailingStopUpdate,
                            success: true,
                            pnl: None,
                            detail: format!("trailing stop -> {:.2}", candidate),
                        }
                    }
                    Err(e) => ManagementAction {
                        ticket,
                        kind: ActionKind::TrailingStopUpdate,
                        success: false,
                        pnl: None,
                        detail: format!("stop update failed: {}", e),
                    },
                }
            }
        }
    }

    /// Contracts to close at TP1, at least one and never more than remain
    fn partial_size(&self, record: &PositionRecord) -> u32 {
        let size = (record.original_size as f64 * self.rules.partial_exit_ratio).round() as u32;
        size.clamp(1, record.current_size)
    }

    /// New trailing stop, only when it improves on the current protection
    fn trailing_candidate(&self, record: &PositionRecord, price: f64) -> Option<f64> {
        let offset = self.rules.trail_offset_fraction;
        let current = record.trailing_stop_price.unwrap_or(record.stop_loss);
        match record.direction {
            Direction::Long => {
                let candidate = price * (1.0 - offset);
                (candidate > current).then_some(candidate)
            }
            Direction::Short => {
                let candidate = price * (1.0 + offset);
                (candidate < current).then_some(candidate)
            }
        }
    }

    fn log_action(&self, action: &ManagementAction) {
        let msg = format!(
            "⚙️ #{} {:?}: {} ({})",
            action.ticket,
            action.kind,
            action.detail,
            if action.success { "ok" } else { "FAILED" }
        );
        if action.success {
            logger::info(LogTag::Positions, &msg);
        } else {
            logger::warning(LogTag::Positions, &msg);
        }
    }
}
