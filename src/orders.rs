use crate::price::Price;
use serde::{Deserialize, Serialize, de};
use std::fmt;

/// Identifier for a resting or historical order, assigned by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OrderId(pub u64);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier for a subscribing client. `ClientId::NONE` marks orders with
/// no client attribution (market-data inserts) — the fan-out step drops
/// events for it the same way it drops events for any id with no
/// registered observer, so no special case is needed there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClientId(pub u64);

impl ClientId {
    pub const NONE: ClientId = ClientId(0);
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Buy,
    Sell,
}

impl Serialize for Side {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(match self {
            Side::Buy => "B",
            Side::Sell => "S",
        })
    }
}

impl<'de> Deserialize<'de> for Side {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        match s.as_str() {
            "B" => Ok(Side::Buy),
            "S" => Ok(Side::Sell),
            other => Err(de::Error::custom(format!(
                "unsupported side `{other}`, expected `B` or `S`"
            ))),
        }
    }
}

/// Status reported on an [`crate::events::OrderUpdate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Resting,
    PartiallyFilled,
    Filled,
    Cancelled,
    Amended,
}

/// The wire shape of an insert/amend request: side, price, amount. `id`
/// and `client_id` are assigned by the engine, never supplied by the
/// caller (see spec §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderFields {
    pub side: Side,
    pub price: Price,
    pub amount: u64,
}

/// A resting or in-flight order. Plain limit orders only — no
/// stop/iceberg/IOC/FOK, per the non-goals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub client_id: ClientId,
    pub side: Side,
    pub price: Price,
    pub original_amount: u64,
    pub unfilled_amount: u64,
}

impl Order {
    pub fn new(id: OrderId, client_id: ClientId, fields: OrderFields) -> Self {
        Self {
            id,
            client_id,
            side: fields.side,
            price: fields.price,
            original_amount: fields.amount,
            unfilled_amount: fields.amount,
        }
    }
}
