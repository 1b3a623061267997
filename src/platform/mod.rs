//! Broker platform abstraction
//!
//! Every order-touching operation goes through the `TradingPlatform` trait so
//! the orchestrator and position manager never care which broker backs them.
//! `PaperPlatform` is the simulated implementation used for paper trading and
//! tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;

use crate::errors::{BotError, BotResult};
use crate::logger::{self, LogTag};

/// Trade direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Long => "long",
            Direction::Short => "short",
        }
    }
}

/// New-order parameters
#[derive(Debug, Clone)]
pub struct OrderRequest {
    pub symbol: String,
    pub direction: Direction,
    pub size: u32,
    pub stop_loss: f64,
    pub take_profit: f64,
}

/// Broker interface used by the orchestrator and position manager
#[async_trait]
pub trait TradingPlatform: Send + Sync {
    async fn is_connected(&self) -> bool;
    async fn get_account_balance(&self) -> BotResult<f64>;
    async fn get_current_price(&self, symbol: &str) -> BotResult<f64>;
    /// Place an order; returns the broker ticket
    async fn place_order(&self, order: OrderRequest) -> BotResult<u64>;
    /// Close the full remaining size; returns realized pnl
    async fn close_position(&self, ticket: u64) -> BotResult<f64>;
    /// Close part of a position; returns realized pnl for the closed part
    async fn partial_close(&self, ticket: u64, size: u32) -> BotResult<f64>;
    async fn update_stop_loss(&self, ticket: u64, new_stop: f64) -> BotResult<()>;
}

#[derive(Debug, Clone)]
struct PaperPosition {
    symbol: String,
    direction: Direction,
    size: u32,
    entry_price: f64,
    stop_loss: f64,
}

#[derive(Debug)]
struct PaperBook {
    balance: f64,
    price: f64,
    next_ticket: u64,
    positions: HashMap<u64, PaperPosition>,
}

/// Simulated broker with a settable quote, used in paper mode and tests
pub struct PaperPlatform {
    book: Mutex<PaperBook>,
    point_value: f64,
}

impl PaperPlatform {
    pub fn new(balance: f64, initial_price: f64, point_value: f64) -> Self {
        Self {
            book: Mutex::new(PaperBook {
                balance,
                price: initial_price,
                next_ticket: 1,
                positions: HashMap::new(),
            }),
            point_value,
        }
    }

    /// Move the simulated quote
    pub fn set_price(&self, price: f64) {
        if let Ok(mut book) = self.book.lock() {
            book.price = price;
        }
    }

    pub fn open_position_count(&self) -> usize {
        self.book.lock().map(|b| b.positions.len()).unwrap_or(0)
    }

    /// Current (symbol, stop loss) of an open paper position
    pub fn position_info(&self, ticket: u64) -> Option<(String, f64)> {
        self.book
            .lock()
            .ok()
            .and_then(|b| b.positions.get(&ticket).map(|p| (p.symbol.clone(), p.stop_loss)))
    }

    fn pnl(&self, position: &PaperPosition, exit_price: f64, size: u32) -> f64 {
        let points = match position.direction {
            Direction::Long => exit_price - position.entry_price,
            Direction::Short => position.entry_price - exit_price,
        };
        points * self.point_value * size as f64
    }
}

#[async_trait]
impl TradingPlatform for PaperPlatform {
    async fn is_connected(&self) -> bool {
        true
    }

    async fn get_account_balance(&self) -> BotResult<f64> {
        let book = self
            .book
            .lock()
            .map_err(|_| BotError::PlatformConnection("paper book poisoned".to_string()))?;
        Ok(book.balance)
    }

    async fn get_current_price(&self, _symbol: &str) -> BotResult<f64> {
        let book = self
            .book
            .lock()
            .map_err(|_| BotError::PlatformConnection("paper book poisoned".to_string()))?;
        Ok(book.price)
    }

    async fn place_order(&self, order: OrderRequest) -> BotResult<u64> {
        let mut book = self
            .book
            .lock()
            .map_err(|_| BotError::PlatformConnection("paper book poisoned".to_string()))?;
        let ticket = book.next_ticket;
        book.next_ticket += 1;
        let entry_price = book.price;
        book.positions.insert(
            ticket,
            PaperPosition {
                symbol: order.symbol.clone(),
                direction: order.direction,
                size: order.size,
                entry_price,
                stop_loss: order.stop_loss,
            },
        );
        logger::info(
            LogTag::Platform,
            &format!(
                "🧾 Paper order #{}: {} {} x{} @ {:.2}",
                ticket,
                order.direction.as_str(),
                order.symbol,
                order.size,
                entry_price
            ),
        );
        Ok(ticket)
    }

    async fn close_position(&self, ticket: u64) -> BotResult<f64> {
        let mut book = self
            .book
            .lock()
            .map_err(|_| BotError::PlatformConnection("paper book poisoned".to_string()))?;
        let price = book.price;
        let position = book
            .positions
            .remove(&ticket)
            .ok_or_else(|| BotError::PlatformOrder(format!("unknown ticket {}", ticket)))?;
        let pnl = self.pnl(&position, price, position.size);
        book.balance += pnl;
        Ok(pnl)
    }

    async fn partial_close(&self, ticket: u64, size: u32) -> BotResult<f64> {
        let mut book = self
            .book
            .lock()
            .map_err(|_| BotError::PlatformConnection("paper book poisoned".to_string()))?;
        let price = book.price;
        let position = book
            .positions
            .get_mut(&ticket)
            .ok_or_else(|| BotError::PlatformOrder(format!("unknown ticket {}", ticket)))?;
        if size == 0 || size > position.size {
            return Err(BotError::PlatformOrder(format!(
                "invalid partial size {} for ticket {} (open {})",
                size, ticket, position.size
            )));
        }
        position.size -= size;
        let snapshot = position.clone();
        let remaining = position.size;
        if remaining == 0 {
            book.positions.remove(&ticket);
        }
        let pnl = self.pnl(&snapshot, price, size);
        book.balance += pnl;
        Ok(pnl)
    }

    async fn update_stop_loss(&self, ticket: u64, new_stop: f64) -> BotResult<()> {
        let mut book = self
            .book
            .lock()
            .map_err(|_| BotError::PlatformConnection("paper book poisoned".to_string()))?;
        let position = book
            .positions
            .get_mut(&ticket)
            .ok_or_else(|| BotError::PlatformOrder(format!("unknown ticket {}", ticket)))?;
        position.stop_loss = new_stop;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(direction: Direction, size: u32) -> OrderRequest {
        OrderRequest {
            symbol: "NAS100".to_string(),
            direction,
            size,
            stop_loss: 21000.0,
            take_profit: 21400.0,
        }
    }

    #[tokio::test]
    async fn test_full_close_realizes_pnl() {
        let platform = PaperPlatform::new(5000.0, 21200.0, 0.25);
        let ticket = platform.place_order(order(Direction::Long, 4)).await.unwrap();

        platform.set_price(21250.0);
        let pnl = platform.close_position(ticket).await.unwrap();
        // 50 points * 0.25 * 4 contracts
        assert_eq!(pnl, 50.0);
        assert_eq!(platform.get_account_balance().await.unwrap(), 5050.0);
        assert_eq!(platform.open_position_count(), 0);
    }

    #[tokio::test]
    async fn test_partial_close_keeps_remainder() {
        let platform = PaperPlatform::new(5000.0, 21200.0, 0.25);
        let ticket = platform.place_order(order(Direction::Short, 4)).await.unwrap();

        platform.set_price(21100.0);
        let pnl = platform.partial_close(ticket, 2).await.unwrap();
        assert_eq!(pnl, 50.0);
        assert_eq!(platform.open_position_count(), 1);

        // Remaining 2 contracts close at the same price
        let pnl = platform.close_position(ticket).await.unwrap();
        assert_eq!(pnl, 50.0);
        assert_eq!(platform.open_position_count(), 0);
    }

    #[tokio::test]
    async fn test_partial_close_rejects_oversize() {
        let platform = PaperPlatform::new(5000.0, 21200.0, 0.25);
        let ticket = platform.place_order(order(Direction::Long, 2)).await.unwrap();
        assert!(platform.partial_close(ticket, 5).await.is_err());
    }

    #[tokio::test]
    async fn test_update_stop_loss() {
        let platform = PaperPlatform::new(5000.0, 21200.0, 0.25);
        let ticket = platform.place_order(order(Direction::Long, 2)).await.unwrap();
        platform.update_stop_loss(ticket, 21150.0).await.unwrap();

        let (symbol, stop) = platform.position_info(ticket).unwrap();
        assert_eq!(symbol, "NAS100");
        assert_eq!(stop, 21150.0);
    }

    #[tokio::test]
    async fn test_unknown_ticket_is_error() {
        let platform = PaperPlatform::new(5000.0, 21200.0, 0.25);
        assert!(platform.close_position(99).await.is_err());
        assert!(platform.update_stop_loss(99, 1.0).await.is_err());
    }
}
