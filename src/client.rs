use crate::engine::MatchingEngine;
use crate::events::Ack;
use crate::observer::Observer;
use crate::orders::{ClientId, OrderFields, OrderId};
use std::sync::Arc;

/// A thin handle over [`MatchingEngine`], mirroring the source's
/// `Client : IObserver`. Unlike the source, this wrapper does not
/// implement [`Observer`] itself — it registers a separate `sink` with
/// the engine at construction time. That keeps the engine's observer map
/// holding only sink capabilities, never a handle back to `Client`
/// itself, breaking the cyclic reference the spec's §9 notes call out.
pub struct Client {
    pub id: ClientId,
    engine: Arc<MatchingEngine>,
}

impl Client {
    pub fn new(id: ClientId, engine: Arc<MatchingEngine>, sink: Arc<dyn Observer>) -> Self {
        engine.subscribe(id, sink);
        Self { id, engine }
    }

    pub fn insert_order(&self, fields: OrderFields) -> Ack {
        self.engine.insert(self.id, fields)
    }

    pub fn amend_order(&self, order_id: OrderId, fields: OrderFields) -> Ack {
        self.engine.amend(self.id, order_id, fields)
    }

    pub fn cancel_order(&self, order_id: OrderId) -> Ack {
        self.engine.cancel(self.id, order_id)
    }
}
