//! Market clock and trading-window evaluation
//!
//! Pure functions answering "is the market open", "is this a trading window"
//! and "when is the next session" for a configured timezone. No state beyond
//! the immutable `MarketCalendar`.

mod market;

pub use market::{
    default_scan_times, is_market_open, is_market_open_naive, is_market_open_utc,
    is_trading_window, next_trading_session, MarketCalendar, TradingWindow,
};
