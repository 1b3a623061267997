//! Open position lifecycle management
//!
//! Applies the exit rules to every tracked position: maximum hold time,
//! target-based exits (full for mean-reversion setups, partial otherwise)
//! and a ratcheting trailing stop for the runner after a partial exit.

mod manager;
mod types;

pub use manager::PositionManager;
pub use types::{ActionKind, ManagementAction, PositionRecord};
