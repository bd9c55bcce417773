use crate::orders::ClientId;
use crate::orders::OrderId;
use crate::price::Price;
use serde::Serialize;
use std::time::SystemTime;

/// A matched transaction between a resting maker order and an arriving
/// taker order.
///
/// - `price` comes from the maker's order (it rested at that price first).
/// - `amount` is the quantity filled in this single match.
#[derive(Debug, Clone, Serialize)]
pub struct Trade {
    pub maker_order_id: OrderId,
    pub taker_order_id: OrderId,
    pub maker_client: ClientId,
    pub taker_client: ClientId,
    pub price: Price,
    pub amount: u64,
    pub timestamp: SystemTime,
}
