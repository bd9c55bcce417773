use crate::orders::{ClientId, OrderId, OrderStatus};
use crate::trade::Trade;
use serde::Serialize;

/// Reports a change in a single order's resting state. Emitted after
/// every fill (for the maker) and after the cross phase of an insert,
/// amend or cancel (for the order that triggered it).
#[derive(Debug, Clone, Serialize)]
pub struct OrderUpdate {
    pub order_id: OrderId,
    pub client_id: ClientId,
    pub new_unfilled_amount: u64,
    pub status: OrderStatus,
}

/// Acknowledges receipt of a submission, not its matching outcome —
/// returned synchronously before the transaction reaches the processor.
#[derive(Debug, Clone, Serialize)]
pub struct Ack {
    pub success: bool,
    pub message: String,
    pub order_id: OrderId,
}

impl Ack {
    pub fn ok(order_id: OrderId, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            order_id,
        }
    }

    pub fn rejected(order_id: OrderId, message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            order_id,
        }
    }
}

/// The three event kinds an [`crate::observer::Observer`] can receive,
/// matching the source's `IObserver` interface. In practice the engine
/// only ever fans `Trade` and `OrderUpdate` out to observers — `Ack` is
/// returned synchronously to the caller of `insert`/`amend`/`cancel` — but
/// the variant is kept so the type mirrors the full observer contract.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum Event {
    Ack(Ack),
    Trade(Trade),
    OrderUpdate(OrderUpdate),
}
