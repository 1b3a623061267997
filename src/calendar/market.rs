use chrono::{
    DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc,
    Weekday,
};
use chrono_tz::Tz;
use std::collections::HashSet;

use crate::config::BotConfig;

/// US equity market holidays for 2026
const US_MARKET_HOLIDAYS_2026: [(i32, u32, u32); 10] = [
    (2026, 1, 1),   // New Year's Day
    (2026, 1, 19),  // MLK Day
    (2026, 2, 16),  // Presidents Day
    (2026, 4, 10),  // Good Friday
    (2026, 5, 25),  // Memorial Day
    (2026, 6, 19),  // Juneteenth
    (2026, 7, 3),   // Independence Day (observed)
    (2026, 9, 7),   // Labor Day
    (2026, 11, 26), // Thanksgiving
    (2026, 12, 25), // Christmas
];

/// Bounded lookahead for next_trading_session
const MAX_SESSION_LOOKAHEAD_DAYS: i64 = 10;

/// Canonical scan schedule for the trading day (HH:MM)
pub fn default_scan_times() -> [&'static str; 7] {
    ["09:30", "09:45", "10:00", "10:15", "10:30", "11:00", "11:30"]
}

/// Immutable market calendar: session hours, weekly closed days, holidays
#[derive(Debug, Clone)]
pub struct MarketCalendar {
    pub tz: Tz,
    pub open: NaiveTime,
    pub close: NaiveTime,
    holidays: HashSet<NaiveDate>,
}

impl MarketCalendar {
    pub fn new(
        tz: Tz,
        open: NaiveTime,
        close: NaiveTime,
        holidays: impl IntoIterator<Item = NaiveDate>,
    ) -> Self {
        Self {
            tz,
            open,
            close,
            holidays: holidays.into_iter().collect(),
        }
    }

    /// Calendar for the configured year's US market holidays
    pub fn with_us_holidays(tz: Tz, open: NaiveTime, close: NaiveTime) -> Self {
        let holidays = US_MARKET_HOLIDAYS_2026
            .iter()
            .filter_map(|&(y, m, d)| NaiveDate::from_ymd_opt(y, m, d));
        Self::new(tz, open, close, holidays)
    }

    /// Build from the bot configuration
    pub fn from_config(config: &BotConfig) -> anyhow::Result<Self> {
        let tz = config.tz()?;
        let open = config.parse_time(&config.trading_hours.market_open)?;
        let close = config.parse_time(&config.trading_hours.market_close)?;
        Ok(Self::with_us_holidays(tz, open, close))
    }

    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holidays.contains(&date)
    }
}

/// Immutable trading window: the sub-interval of market hours during which
/// new trade admission is considered (inclusive on both ends)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradingWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TradingWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    pub fn from_config(config: &BotConfig) -> anyhow::Result<Self> {
        Ok(Self {
            start: config.parse_time(&config.trading_hours.window_start)?,
            end: config.parse_time(&config.trading_hours.window_end)?,
        })
    }
}

/// Check if the market is open at the given zoned time
///
/// Closed on weekends, configured holidays, and outside [open, close).
pub fn is_market_open(t: DateTime<Tz>, cal: &MarketCalendar) -> (bool, String) {
    let weekday = t.weekday();
    if weekday == Weekday::Sat || weekday == Weekday::Sun {
        return (false, "Weekend (market closed)".to_string());
    }

    let date = t.date_naive();
    if cal.is_holiday(date) {
        return (false, format!("US market holiday ({})", date.format("%Y-%m-%d")));
    }

    let time = t.time();
    if time < cal.open {
        return (false, format!("Before market open (opens at {})", cal.open.format("%H:%M")));
    }
    if time >= cal.close {
        return (false, format!("After market close (closed at {})", cal.close.format("%H:%M")));
    }

    (true, "Market is open".to_string())
}

/// Market-open check for a UTC timestamp (converted into the calendar's zone)
pub fn is_market_open_utc(t: DateTime<Utc>, cal: &MarketCalendar) -> (bool, String) {
    is_market_open(t.with_timezone(&cal.tz), cal)
}

/// Market-open check for a naive timestamp, assumed to already be in the
/// calendar's timezone
pub fn is_market_open_naive(t: NaiveDateTime, cal: &MarketCalendar) -> (bool, String) {
    match localize(t, cal.tz) {
        Some(zoned) => is_market_open(zoned, cal),
        // DST gap: fail closed
        None => (false, "Ambiguous local time".to_string()),
    }
}

/// Check if the given time falls inside the trading window on an open day
pub fn is_trading_window(t: DateTime<Tz>, window: &TradingWindow, cal: &MarketCalendar) -> bool {
    let (open, _) = is_market_open(t, cal);
    if !open {
        return false;
    }

    let time = t.time();
    window.start <= time && time <= window.end
}

/// Next trading session start: advances one day at a time at the open time
/// until the market is open, bounded by a fixed lookahead. Falls back to
/// `t + 1 day` when the bound is exhausted (known approximation).
pub fn next_trading_session(t: DateTime<Tz>, cal: &MarketCalendar) -> DateTime<Tz> {
    let mut date = t.date_naive() + Duration::days(1);

    for _ in 0..MAX_SESSION_LOOKAHEAD_DAYS {
        if let Some(candidate) = localize(date.and_time(cal.open), cal.tz) {
            let (open, _) = is_market_open(candidate, cal);
            if open {
                return candidate;
            }
        }
        date += Duration::days(1);
    }

    t + Duration::days(1)
}

/// Resolve a naive local time in a timezone, preferring the earlier instant
/// on DST overlaps; `None` inside a DST gap
fn localize(t: NaiveDateTime, tz: Tz) -> Option<DateTime<Tz>> {
    use chrono::offset::LocalResult;
    match tz.from_local_datetime(&t) {
        LocalResult::Single(dt) => Some(dt),
        LocalResult::Ambiguous(earlier, _) => Some(earlier),
        LocalResult::None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::America::New_York;

    fn test_calendar() -> MarketCalendar {
        MarketCalendar::with_us_holidays(
            New_York,
            NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
            NaiveTime::from_hms_opt(16, 0, 0).unwrap(),
        )
    }

    fn ny(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Tz> {
        New_York.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn test_open_on_weekday_during_hours() {
        let cal = test_calendar();
        // Monday 2026-01-12 10:30
        let (open, reason) = is_market_open(ny(2026, 1, 12, 10, 30), &cal);
        assert!(open, "{}", reason);
    }

    #[test]
    fn test_closed_on_weekend() {
        let cal = test_calendar();
        // Saturday 2026-01-10
        let (open, reason) = is_market_open(ny(2026, 1, 10, 10, 30), &cal);
        assert!(!open);
        assert!(reason.contains("Weekend"));

        // Sunday 2026-01-11
        let (open, _) = is_market_open(ny(2026, 1, 11, 10, 30), &cal);
        assert!(!open);
    }

    #[test]
    fn test_closed_on_holiday() {
        let cal = test_calendar();
        // New Year's Day 2026 falls on a Thursday
        let (open, reason) = is_market_open(ny(2026, 1, 1, 10, 30), &cal);
        assert!(!open);
        assert!(reason.contains("holiday"));
    }

    #[test]
    fn test_closed_outside_hours() {
        let cal = test_calendar();
        let (open, _) = is_market_open(ny(2026, 1, 12, 9, 29), &cal);
        assert!(!open);

        // Close boundary is exclusive
        let (open, _) = is_market_open(ny(2026, 1, 12, 16, 0), &cal);
        assert!(!open);

        let (open, _) = is_market_open(ny(2026, 1, 12, 15, 59), &cal);
        assert!(open);
    }

    #[test]
    fn test_trading_window_inclusive_bounds() {
        let cal = test_calendar();
        let window = TradingWindow::new(
            NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
            NaiveTime::from_hms_opt(11, 30, 0).unwrap(),
        );

        assert!(is_trading_window(ny(2026, 1, 12, 9, 30), &window, &cal));
        assert!(is_trading_window(ny(2026, 1, 12, 10, 0), &window, &cal));
        assert!(is_trading_window(ny(2026, 1, 12, 11, 30), &window, &cal));
        // One minute past the window end
        assert!(!is_trading_window(ny(2026, 1, 12, 11, 31), &window, &cal));
        // Window requires the market to be open
        assert!(!is_trading_window(ny(2026, 1, 10, 10, 0), &window, &cal));
    }

    #[test]
    fn test_next_session_skips_weekend() {
        let cal = test_calendar();
        // Saturday afternoon -> Monday 09:30
        let next = next_trading_session(ny(2026, 1, 10, 15, 0), &cal);
        assert_eq!(next.weekday(), Weekday::Mon);
        assert_eq!(next.time(), NaiveTime::from_hms_opt(9, 30, 0).unwrap());
        assert_eq!(next.date_naive(), NaiveDate::from_ymd_opt(2026, 1, 12).unwrap());
    }

    #[test]
    fn test_next_session_skips_holiday() {
        let cal = test_calendar();
        // Dec 31 2025 (Wednesday) -> Jan 1 is a holiday -> Jan 2 (Friday)
        let next = next_trading_session(ny(2025, 12, 31, 12, 0), &cal);
        assert_eq!(next.date_naive(), NaiveDate::from_ymd_opt(2026, 1, 2).unwrap());
    }

    #[test]
    fn test_naive_input_assumed_local() {
        let cal = test_calendar();
        let naive = NaiveDate::from_ymd_opt(2026, 1, 12)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap();
        let (open, _) = is_market_open_naive(naive, &cal);
        assert!(open);
    }

    #[test]
    fn test_utc_input_converted() {
        let cal = test_calendar();
        // 15:30 UTC on 2026-01-12 is 10:30 in New York (EST)
        let utc = Utc.with_ymd_and_hms(2026, 1, 12, 15, 30, 0).unwrap();
        let (open, _) = is_market_open_utc(utc, &cal);
        assert!(open);

        // 02:00 UTC is 21:00 previous evening in New York
        let utc = Utc.with_ymd_and_hms(2026, 1, 13, 2, 0, 0).unwrap();
        let (open, _) = is_market_open_utc(utc, &cal);
        assert!(!open);
    }
}
