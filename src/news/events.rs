use serde::{Deserialize, Serialize};

/// High-impact event keywords for NAS100
///
/// A case-insensitive substring match against an event title marks the event
/// high impact regardless of any externally supplied impact label.
pub const HIGH_IMPACT_KEYWORDS: [&str; 13] = [
    "FOMC",
    "Federal Reserve",
    "Non-Farm Payrolls",
    "NFP",
    "CPI",
    "Inflation",
    "GDP",
    "Fed Chair",
    "Interest Rate",
    "Unemployment",
    "Retail Sales",
    "ISM Manufacturing",
    "ISM Services",
];

/// Event impact classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    High,
    Medium,
    Low,
}

impl Impact {
    fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "high" => Some(Impact::High),
            "medium" => Some(Impact::Medium),
            "low" => Some(Impact::Low),
            _ => None,
        }
    }
}

/// A scheduled economic event as delivered by a calendar source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EconomicEvent {
    /// Local event time, HH:MM in the trading timezone
    pub time: String,
    pub title: String,
    /// Impact label supplied by the source, if any
    #[serde(default)]
    pub impact: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
}

/// Classify an event's impact level
///
/// Keyword match takes precedence over the supplied label; events with
/// neither are Low.
pub fn classify_impact(event: &EconomicEvent) -> Impact {
    let title = event.title.to_lowercase();
    for keyword in HIGH_IMPACT_KEYWORDS {
        if title.contains(&keyword.to_lowercase()) {
            return Impact::High;
        }
    }

    if let Some(label) = &event.impact {
        if let Some(impact) = Impact::parse(label) {
            return impact;
        }
    }

    Impact::Low
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(title: &str, impact: Option<&str>) -> EconomicEvent {
        EconomicEvent {
            time: "08:30".to_string(),
            title: title.to_string(),
            impact: impact.map(|s| s.to_string()),
            currency: Some("USD".to_string()),
        }
    }

    #[test]
    fn test_keyword_match_is_high() {
        assert_eq!(classify_impact(&event("Non-Farm Payrolls", None)), Impact::High);
        assert_eq!(classify_impact(&event("US CPI m/m", None)), Impact::High);
        assert_eq!(classify_impact(&event("fomc meeting minutes", None)), Impact::High);
    }

    #[test]
    fn test_keyword_overrides_supplied_label() {
        // Vocabulary match wins even when the source says otherwise
        assert_eq!(classify_impact(&event("GDP Advance Estimate", Some("low"))), Impact::High);
    }

    #[test]
    fn test_supplied_label_used_without_keyword() {
        assert_eq!(classify_impact(&event("Crude Oil Inventories", Some("medium"))), Impact::Medium);
        assert_eq!(classify_impact(&event("Beige Book", Some("high"))), Impact::High);
    }

    #[test]
    fn test_default_is_low() {
        assert_eq!(classify_impact(&event("Treasury Auction", None)), Impact::Low);
        assert_eq!(classify_impact(&event("Some Event", Some("unknown"))), Impact::Low);
    }
}
