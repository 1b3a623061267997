//! Setup detection seam and candidate validation
//!
//! Strategy code plugs in behind `SetupProvider`; the orchestrator only sees
//! validated `SetupRecord`s. Validation enforces the quality floor (reward
//! to risk, confidence) before any risk accounting happens.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::SetupFiltersConfig;
use crate::errors::BotResult;
use crate::platform::Direction;

/// A candidate trade produced by a strategy scan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetupRecord {
    /// Setup family, e.g. "breakout" or "mean_reversion"
    pub setup_type: String,
    pub symbol: String,
    pub direction: Direction,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub tp1: f64,
    pub tp2: f64,
    /// 0-10 quality score assigned by the strategy
    pub confidence_score: u32,
    pub notes: String,
}

impl SetupRecord {
    /// Stop distance in points (always positive for a well-formed setup)
    pub fn stop_distance(&self) -> f64 {
        match self.direction {
            Direction::Long => self.entry_price - self.stop_loss,
            Direction::Short => self.stop_loss - self.entry_price,
        }
    }

    /// Reward-to-risk ratio measured to TP1
    pub fn reward_risk_ratio(&self) -> f64 {
        let risk = self.stop_distance();
        if risk <= 0.0 {
            return 0.0;
        }
        let reward = match self.direction {
            Direction::Long => self.tp1 - self.entry_price,
            Direction::Short => self.entry_price - self.tp1,
        };
        reward / risk
    }
}

/// Validate a candidate against the configured quality floor
pub fn validate_setup(setup: &SetupRecord, filters: &SetupFiltersConfig) -> (bool, String) {
    if setup.stop_distance() <= 0.0 {
        return (false, "Stop loss on the wrong side of entry".to_string());
    }

    let rr = setup.reward_risk_ratio();
    if rr < filters.min_reward_risk_ratio {
        return (
            false,
            format!(
                "Reward/risk {:.2} below minimum {:.2}",
                rr, filters.min_reward_risk_ratio
            ),
        );
    }

    if setup.confidence_score < filters.min_confidence_score {
        return (
            false,
            format!(
                "Confidence {} below minimum {}",
                setup.confidence_score, filters.min_confidence_score
            ),
        );
    }

    (true, format!("Setup valid (rr {:.2})", rr))
}

/// Strategy seam: produce candidate setups for a scan instant
#[async_trait]
pub trait SetupProvider: Send + Sync {
    async fn scan(&self, now: DateTime<Utc>) -> BotResult<Vec<SetupRecord>>;
}

/// Provider that never finds a setup, used until a strategy is wired in
pub struct NullSetupProvider;

#[async_trait]
impl SetupProvider for NullSetupProvider {
    async fn scan(&self, _now: DateTime<Utc>) -> BotResult<Vec<SetupRecord>> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn long_setup(entry: f64, stop: f64, tp1: f64, confidence: u32) -> SetupRecord {
        SetupRecord {
            setup_type: "breakout".to_string(),
            symbol: "NAS100".to_string(),
            direction: Direction::Long,
            entry_price: entry,
            stop_loss: stop,
            tp1,
            tp2: tp1 + 100.0,
            confidence_score: confidence,
            notes: String::new(),
        }
    }

    #[test]
    fn test_good_setup_passes() {
        // Risk 20, reward 40 -> rr 2.0
        let setup = long_setup(21200.0, 21180.0, 21240.0, 8);
        let (ok, reason) = validate_setup(&setup, &SetupFiltersConfig::default());
        assert!(ok, "{}", reason);
    }

    #[test]
    fn test_low_reward_risk_rejected() {
        // Risk 20, reward 20 -> rr 1.0 < 1.5
        let setup = long_setup(21200.0, 21180.0, 21220.0, 8);
        let (ok, reason) = validate_setup(&setup, &SetupFiltersConfig::default());
        assert!(!ok);
        assert!(reason.contains("Reward/risk"));
    }

    #[test]
    fn test_low_confidence_rejected() {
        let setup = long_setup(21200.0, 21180.0, 21240.0, 5);
        let (ok, reason) = validate_setup(&setup, &SetupFiltersConfig::default());
        assert!(!ok);
        assert!(reason.contains("Confidence"));
    }

    #[test]
    fn test_inverted_stop_rejected() {
        let setup = long_setup(21200.0, 21250.0, 21300.0, 9);
        let (ok, _) = validate_setup(&setup, &SetupFiltersConfig::default());
        assert!(!ok);
    }

    #[test]
    fn test_short_reward_risk() {
        let setup = SetupRecord {
            setup_type: "mean_reversion".to_string(),
            symbol: "NAS100".to_string(),
            direction: Direction::Short,
            entry_price: 21200.0,
            stop_loss: 21220.0,
            tp1: 21160.0,
            tp2: 21120.0,
            confidence_score: 8,
            notes: String::new(),
        };
        assert!((setup.reward_risk_ratio() - 2.0).abs() < 1e-9);
    }
}
