//! User-facing notifications
//!
//! Trade events, risk warnings and system alerts go through the `Notifier`
//! trait. The console implementation prints through the logger; richer
//! channels can be added behind the same trait.

mod types;

pub use types::{Notification, Urgency};

use async_trait::async_trait;

use crate::errors::BotResult;
use crate::logger::{self, LogTag};

/// Delivery seam for notifications
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: &Notification) -> BotResult<()>;
}

/// Notifier that writes to the log output
pub struct ConsoleNotifier;

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn send(&self, notification: &Notification) -> BotResult<()> {
        let msg = format!("{} {}", notification.urgency.emoji(), notification.message);
        match notification.urgency {
            Urgency::Critical | Urgency::High => logger::warning(LogTag::Notify, &msg),
            Urgency::Normal | Urgency::Low => logger::info(LogTag::Notify, &msg),
        }
        Ok(())
    }
}
