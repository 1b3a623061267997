//! Session orchestration
//!
//! The `SessionOrchestrator` owns the gate chain (window, news, risk) and
//! the execution path from validated setup to tracked position. Durable
//! runtime facts live in `SystemState`; `HealthMonitor` runs the periodic
//! system checks.

mod health;
mod orchestrator;
mod state;

pub use health::{HealthMonitor, HealthReport};
pub use orchestrator::SessionOrchestrator;
pub use state::SystemState;
