use crate::orders::{ClientId, OrderId};
use thiserror::Error;

/// Validation failures the engine catches before a transaction is ever
/// enqueued. These become negative [`crate::events::Ack`]s, never panics.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("engine stopped")]
    Stopped,

    #[error("unknown order id {0}")]
    UnknownOrder(OrderId),

    #[error("order {order_id} does not belong to client {client_id}")]
    NotOwner {
        order_id: OrderId,
        client_id: ClientId,
    },

    #[error("amount must be > 0")]
    InvalidAmount,
}
