use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::errors::BotResult;
use crate::logger::{self, LogTag};

/// Serializable risk ledger state
///
/// Written after every mutation so a restart resumes mid-day with the
/// correct counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskState {
    pub account_balance: f64,
    pub daily_pnl: f64,
    pub weekly_pnl: f64,
    pub trades_today: u32,
    pub trades_this_week: u32,
    pub current_day: NaiveDate,
    /// ISO (year, week) the weekly counters belong to
    pub current_week: (i32, u32),
    pub open_tickets: HashSet<u64>,
    pub last_updated: String,
}

impl RiskState {
    pub fn new(account_balance: f64, today: NaiveDate, week: (i32, u32)) -> Self {
        Self {
            account_balance,
            daily_pnl: 0.0,
            weekly_pnl: 0.0,
            trades_today: 0,
            trades_this_week: 0,
            current_day: today,
            current_week: week,
            open_tickets: HashSet::new(),
            last_updated: Utc::now().to_rfc3339(),
        }
    }

    /// Load from disk; None when the file does not exist yet
    pub fn load(path: &Path) -> BotResult<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path)?;
        let state: RiskState = serde_json::from_str(&content)?;
        logger::debug(
            LogTag::Risk,
            &format!("Loaded risk state from {}", path.display()),
        );
        Ok(Some(state))
    }

    pub fn save(&mut self, path: &Path) -> BotResult<()> {
        self.last_updated = Utc::now().to_rfc3339();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_missing_file_is_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("risk_state.json");
        assert!(RiskState::load(&path).expect("load").is_none());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("risk_state.json");

        let today = NaiveDate::from_ymd_opt(2026, 1, 12).unwrap();
        let mut state = RiskState::new(5000.0, today, (2026, 3));
        state.daily_pnl = -75.0;
        state.trades_today = 2;
        state.open_tickets.insert(42);
        state.save(&path).expect("save");

        let loaded = RiskState::load(&path).expect("load").expect("some");
        assert_eq!(loaded.daily_pnl, -75.0);
        assert_eq!(loaded.trades_today, 2);
        assert!(loaded.open_tickets.contains(&42));
        assert_eq!(loaded.current_day, today);
    }
}
