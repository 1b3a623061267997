use crate::logger::{self, LogTag};
use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BotError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Platform connection error: {0}")]
    PlatformConnection(String),

    #[error("Platform order error: {0}")]
    PlatformOrder(String),

    #[error("Analysis error: {0}")]
    Analysis(String),

    #[error("Notification error: {0}")]
    Notify(String),

    #[error("Calendar source error: {0}")]
    Calendar(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("State error: {0}")]
    State(String),

    #[error("Scheduler error: {0}")]
    Scheduler(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

/// Error severity ladder
///
/// Critical halts trading, High aborts the current scan cycle, Medium
/// discards the specific candidate, Low is logged only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Low = 0,
    Medium = 1,
    High = 2,
    Critical = 3,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "CRITICAL",
            Severity::High => "HIGH",
            Severity::Medium => "MEDIUM",
            Severity::Low => "LOW",
        }
    }
}

impl BotError {
    /// Classify this error on the severity ladder
    pub fn severity(&self) -> Severity {
        match self {
            BotError::PlatformConnection(_) => Severity::Critical,
            BotError::Config(_) => Severity::Critical,
            BotError::Analysis(_) => Severity::High,
            BotError::Notify(_) => Severity::High,
            BotError::PlatformOrder(_) => Severity::High,
            BotError::Validation(_) => Severity::Medium,
            BotError::Serialization(_) => Severity::Medium,
            BotError::Calendar(_) => Severity::Medium,
            _ => Severity::Low,
        }
    }

    /// True for errors that must halt trading entirely
    pub fn is_critical(&self) -> bool {
        self.severity() == Severity::Critical
    }

    /// Errors worth retrying on the next scheduled cycle (never within the
    /// same cycle)
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            BotError::Analysis(_)
                | BotError::Notify(_)
                | BotError::Calendar(_)
                | BotError::PlatformOrder(_)
        )
    }
}

pub type BotResult<T> = Result<T, BotError>;

/// Outcome of centralized error handling
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub severity: Severity,
    pub context: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    /// Set for Critical errors; the orchestrator observes this and halts
    pub system_halt: bool,
    /// Whether the failure should be pushed through the notifier
    pub notify_user: bool,
}

/// Handle an error with severity-appropriate logging
///
/// Does not notify or halt by itself; it reports what the caller must do.
pub fn handle_error(error: &BotError, context: &str) -> ErrorReport {
    let severity = error.severity();
    let message = error.to_string();

    match severity {
        Severity::Critical => {
            logger::error(LogTag::System, &format!("[CRITICAL] {}: {}", context, message));
        }
        Severity::High => {
            logger::error(LogTag::System, &format!("[HIGH] {}: {}", context, message));
        }
        Severity::Medium => {
            logger::warning(LogTag::System, &format!("[MEDIUM] {}: {}", context, message));
        }
        Severity::Low => {
            logger::info(LogTag::System, &format!("[LOW] {}: {}", context, message));
        }
    }

    ErrorReport {
        severity,
        context: context.to_string(),
        message,
        timestamp: Utc::now(),
        system_halt: severity == Severity::Critical,
        notify_user: severity >= Severity::High,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_loss_is_critical() {
        let err = BotError::PlatformConnection("terminal unreachable".to_string());
        assert_eq!(err.severity(), Severity::Critical);
        assert!(err.is_critical());

        let report = handle_error(&err, "health_check");
        assert!(report.system_halt);
        assert!(report.notify_user);
    }

    #[test]
    fn test_analysis_failure_is_high_and_recoverable() {
        let err = BotError::Analysis("provider timeout".to_string());
        assert_eq!(err.severity(), Severity::High);
        assert!(err.is_recoverable());
        assert!(!handle_error(&err, "scan").system_halt);
    }

    #[test]
    fn test_validation_failure_is_medium() {
        let err = BotError::Validation("reward:risk below minimum".to_string());
        let report = handle_error(&err, "setup_validation");
        assert_eq!(report.severity, Severity::Medium);
        assert!(!report.system_halt);
        assert!(!report.notify_user);
    }
}
