use chrono::{DateTime, Utc};
use serde::Serialize;

/// Notification priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    Normal,
    High,
    Critical,
}

impl Urgency {
    pub fn emoji(&self) -> &'static str {
        match self {
            Urgency::Low => "ℹ️",
            Urgency::Normal => "🔔",
            Urgency::High => "⚠️",
            Urgency::Critical => "🚨",
        }
    }
}

/// A message destined for the user
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub urgency: Urgency,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl Notification {
    pub fn new(urgency: Urgency, message: &str) -> Self {
        Self {
            urgency,
            message: message.to_string(),
            timestamp: Utc::now(),
        }
    }
}
