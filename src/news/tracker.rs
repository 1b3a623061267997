use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone};
use chrono_tz::Tz;
use tokio::sync::RwLock;

use crate::config::BotConfig;
use crate::errors::{BotError, BotResult};
use crate::logger::{self, LogTag};

use super::events::{classify_impact, EconomicEvent, Impact};

/// Absolute no-trade interval around a high-impact event (inclusive bounds)
#[derive(Debug, Clone, PartialEq)]
pub struct BlackoutPeriod {
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
    pub event_title: String,
}

impl BlackoutPeriod {
    pub fn contains(&self, t: DateTime<Tz>) -> bool {
        self.start <= t && t <= self.end
    }
}

/// Source of economic calendar events for a given date
#[async_trait]
pub trait CalendarSource: Send + Sync {
    async fn fetch_events(&self, date: NaiveDate) -> BotResult<Vec<EconomicEvent>>;
}

/// In-memory calendar source, same events every day it was seeded for
pub struct StaticCalendarSource {
    events: Vec<(NaiveDate, EconomicEvent)>,
}

impl StaticCalendarSource {
    pub fn new(events: Vec<(NaiveDate, EconomicEvent)>) -> Self {
        Self { events }
    }

    pub fn empty() -> Self {
        Self { events: Vec::new() }
    }
}

#[async_trait]
impl CalendarSource for StaticCalendarSource {
    async fn fetch_events(&self, date: NaiveDate) -> BotResult<Vec<EconomicEvent>> {
        Ok(self
            .events
            .iter()
            .filter(|(d, _)| *d == date)
            .map(|(_, e)| e.clone())
            .collect())
    }
}

/// High-impact events expected over the coming days
#[derive(Debug, Clone, Default)]
pub struct WeeklyOutlook {
    /// (date, event titles) for days that have at least one high-impact event
    pub days: Vec<(NaiveDate, Vec<String>)>,
}

/// Tracks today's blackout periods and answers trade-safety queries
///
/// The active set of periods is replaced atomically on refresh. A failed
/// refresh keeps the previous set in place.
pub struct NewsBlackoutTracker {
    tz: Tz,
    lead: Duration,
    lag: Duration,
    source: Box<dyn CalendarSource>,
    periods: RwLock<Vec<BlackoutPeriod>>,
}

impl NewsBlackoutTracker {
    pub fn new(tz: Tz, lead: Duration, lag: Duration, source: Box<dyn CalendarSource>) -> Self {
        Self {
            tz,
            lead,
            lag,
            source,
            periods: RwLock::new(Vec::new()),
        }
    }

    pub fn from_config(config: &BotConfig, source: Box<dyn CalendarSource>) -> anyhow::Result<Self> {
        Ok(Self::new(
            config.tz()?,
            Duration::minutes(config.news.blackout_before_minutes),
            Duration::minutes(config.news.blackout_after_minutes),
            source,
        ))
    }

    /// Rebuild blackout periods for the given date
    ///
    /// Only events classified high impact produce periods. On source failure
    /// the previous periods stay active and the error is returned.
    pub async fn refresh(&self, date: NaiveDate) -> BotResult<usize> {
        let events = self.source.fetch_events(date).await?;

        let mut periods = Vec::new();
        for event in &events {
            if classify_impact(event) != Impact::High {
                continue;
            }
            match self.event_period(date, event) {
                Ok(period) => periods.push(period),
                Err(e) => {
                    logger::warning(
                        LogTag::News,
                        &format!("Skipping event '{}': {}", event.title, e),
                    );
                }
            }
        }
        periods.sort_by_key(|p| p.start);

        let count = periods.len();
        *self.periods.write().await = periods;
        logger::info(
            LogTag::News,
            &format!("📰 Refreshed news calendar for {}: {} blackout period(s)", date, count),
        );
        Ok(count)
    }

    fn event_period(&self, date: NaiveDate, event: &EconomicEvent) -> BotResult<BlackoutPeriod> {
        let time = NaiveTime::parse_from_str(&event.time, "%H:%M")
            .map_err(|e| BotError::Calendar(format!("invalid event time {}: {}", event.time, e)))?;
        let local = date.and_time(time);
        let zoned = self
            .tz
            .from_local_datetime(&local)
            .earliest()
            .ok_or_else(|| BotError::Calendar(format!("unrepresentable local time {}", local)))?;

        Ok(BlackoutPeriod {
            start: zoned - self.lead,
            end: zoned + self.lag,
            event_title: event.title.clone(),
        })
    }

    /// Check whether trading at the given instant is outside all blackouts
    ///
    /// Returns the blocking event's title in the reason when unsafe.
    pub async fn is_safe_to_trade(&self, t: DateTime<Tz>) -> (bool, String) {
        let periods = self.periods.read().await;
        for period in periods.iter() {
            if period.contains(t) {
                return (
                    false,
                    format!(
                        "News blackout until {} ({})",
                        period.end.format("%H:%M"),
                        period.event_title
                    ),
                );
            }
        }
        (true, "No news blackout active".to_string())
    }

    /// End of the blackout containing `t`, or None when `t` is already safe
    pub async fn next_safe_time(&self, t: DateTime<Tz>) -> Option<DateTime<Tz>> {
        let periods = self.periods.read().await;
        periods
            .iter()
            .filter(|p| p.contains(t))
            .map(|p| p.end)
            .max()
    }

    /// Snapshot of the currently active blackout periods
    pub async fn active_periods(&self) -> Vec<BlackoutPeriod> {
        self.periods.read().await.clone()
    }

    /// High-impact events over the next seven days, for the weekly summary
    pub async fn weekly_outlook(&self, start: NaiveDate) -> BotResult<WeeklyOutlook> {
        let mut outlook = WeeklyOutlook::default();
        for offset in 0..7 {
            let date = start + Duration::days(offset);
            let events = self.source.fetch_events(date).await?;
            let titles: Vec<String> = events
                .iter()
                .filter(|e| classify_impact(e) == Impact::High)
                .map(|e| format!("{} {}", e.time, e.title))
                .collect();
            if !titles.is_empty() {
                outlook.days.push((date, titles));
            }
        }
        Ok(outlook)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::America::New_York;

    fn event(time: &str, title: &str) -> EconomicEvent {
        EconomicEvent {
            time: time.to_string(),
            title: title.to_string(),
            impact: None,
            currency: Some("USD".to_string()),
        }
    }

    fn tracker_with(events: Vec<(NaiveDate, EconomicEvent)>) -> NewsBlackoutTracker {
        NewsBlackoutTracker::new(
            New_York,
            Duration::minutes(15),
            Duration::minutes(30),
            Box::new(StaticCalendarSource::new(events)),
        )
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 12).unwrap()
    }

    fn ny(h: u32, min: u32) -> DateTime<Tz> {
        New_York.with_ymd_and_hms(2026, 1, 12, h, min, 0).unwrap()
    }

    #[tokio::test]
    async fn test_blackout_bounds_inclusive() {
        // CPI at 08:30 -> blackout [08:15, 09:00]
        let tracker = tracker_with(vec![(day(), event("08:30", "CPI m/m"))]);
        tracker.refresh(day()).await.unwrap();

        let (safe, reason) = tracker.is_safe_to_trade(ny(8, 45)).await;
        assert!(!safe);
        assert!(reason.contains("CPI"), "reason should name the event: {}", reason);

        let (safe, _) = tracker.is_safe_to_trade(ny(8, 15)).await;
        assert!(!safe, "start bound is inclusive");
        let (safe, _) = tracker.is_safe_to_trade(ny(9, 0)).await;
        assert!(!safe, "end bound is inclusive");

        let (safe, _) = tracker.is_safe_to_trade(ny(9, 1)).await;
        assert!(safe);
        let (safe, _) = tracker.is_safe_to_trade(ny(8, 14)).await;
        assert!(safe);
    }

    #[tokio::test]
    async fn test_next_safe_time() {
        let tracker = tracker_with(vec![(day(), event("08:30", "FOMC Statement"))]);
        tracker.refresh(day()).await.unwrap();

        let next = tracker.next_safe_time(ny(8, 45)).await;
        assert_eq!(next, Some(ny(9, 0)));

        assert_eq!(tracker.next_safe_time(ny(10, 0)).await, None);
    }

    #[tokio::test]
    async fn test_low_impact_events_produce_no_blackout() {
        let tracker = tracker_with(vec![(day(), event("08:30", "Treasury Auction"))]);
        let count = tracker.refresh(day()).await.unwrap();
        assert_eq!(count, 0);

        let (safe, _) = tracker.is_safe_to_trade(ny(8, 30)).await;
        assert!(safe);
    }

    #[tokio::test]
    async fn test_overlapping_blackouts_take_latest_end() {
        let tracker = tracker_with(vec![
            (day(), event("08:30", "CPI m/m")),
            (day(), event("08:45", "Fed Chair Speaks")),
        ]);
        tracker.refresh(day()).await.unwrap();

        // 08:45 sits inside both; next safe time is the later end (09:15)
        let next = tracker.next_safe_time(ny(8, 45)).await;
        assert_eq!(next, Some(ny(9, 15)));
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_periods() {
        // Succeeds for the seeded day, errors for everything else
        struct FlakySource {
            good_day: NaiveDate,
        }

        #[async_trait]
        impl CalendarSource for FlakySource {
            async fn fetch_events(&self, date: NaiveDate) -> BotResult<Vec<EconomicEvent>> {
                if date == self.good_day {
                    Ok(vec![event("08:30", "NFP")])
                } else {
                    Err(BotError::Calendar("feed unavailable".to_string()))
                }
            }
        }

        let tracker = NewsBlackoutTracker::new(
            New_York,
            Duration::minutes(15),
            Duration::minutes(30),
            Box::new(FlakySource { good_day: day() }),
        );

        tracker.refresh(day()).await.unwrap();
        assert_eq!(tracker.active_periods().await.len(), 1);

        let result = tracker.refresh(day() + Duration::days(1)).await;
        assert!(result.is_err());
        // Previous periods survive the failed refresh
        assert_eq!(tracker.active_periods().await.len(), 1);
        let (safe, _) = tracker.is_safe_to_trade(ny(8, 45)).await;
        assert!(!safe);
    }

    #[tokio::test]
    async fn test_weekly_outlook_lists_high_impact_days() {
        let tracker = tracker_with(vec![
            (day(), event("08:30", "CPI m/m")),
            (day() + Duration::days(2), event("14:00", "FOMC Statement")),
            (day() + Duration::days(3), event("10:00", "Crude Oil Inventories")),
        ]);

        let outlook = tracker.weekly_outlook(day()).await.unwrap();
        assert_eq!(outlook.days.len(), 2);
        assert_eq!(outlook.days[0].0, day());
        assert_eq!(outlook.days[1].0, day() + Duration::days(2));
    }
}
