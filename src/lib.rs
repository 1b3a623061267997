//! ScoutBot - intraday session orchestration and risk control engine
//!
//! Automates scheduled trade-admission decisions for a single instrument:
//! market-hours and trading-window gating, news blackout scheduling, risk
//! limit accounting, open-position lifecycle rules and the cron-style job
//! scheduler that drives everything at wall-clock times in a configured
//! timezone.

pub mod analysis;
pub mod arguments;
pub mod calendar;
pub mod config;
pub mod errors;
pub mod logger;
pub mod news;
pub mod notifications;
pub mod paths;
pub mod platform;
pub mod positions;
pub mod risk;
pub mod scheduler;
pub mod session;
