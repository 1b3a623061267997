//! Risk accounting and trade admission
//!
//! The `RiskLedger` tracks daily and weekly realized loss, trade counts and
//! open-position concentration, and decides whether a new trade may be
//! admitted. Rollovers are lazy: the first query or mutation on a new day
//! (or ISO week) resets the corresponding counters.

mod ledger;
mod persistence;

pub use ledger::{RiskLedger, RiskStatus};
pub use persistence::RiskState;
