use crate::orders::OrderFields;
use std::collections::VecDeque;

/// A blocking or polling source of anonymous insert intents — the
/// "surrounding code" collaborator spec §1 treats abstractly. The engine
/// owns a dedicated thread that calls [`MarketDataStreamer::poll`] in a
/// loop and enqueues whatever it returns as Insert transactions with
/// real, engine-issued ids (see spec §9: the source's `order_id=0` is a
/// bug, not a feature).
pub trait MarketDataStreamer: Send {
    /// Returns the next batch of orders to insert, or an empty `Vec` if
    /// none are currently available. An empty return is polled again
    /// after a short backoff rather than treated as end-of-stream.
    fn poll(&mut self) -> Vec<OrderFields>;
}

/// A streamer that never produces data. The default when an engine has
/// no live market-data feed wired up.
pub struct NullMarketDataStreamer;

impl MarketDataStreamer for NullMarketDataStreamer {
    fn poll(&mut self) -> Vec<OrderFields> {
        Vec::new()
    }
}

/// Replays a fixed sequence of batches, one per `poll()` call, then goes
/// quiet. Useful for deterministic tests and demos.
pub struct FixedBatchStreamer {
    batches: VecDeque<Vec<OrderFields>>,
}

impl FixedBatchStreamer {
    pub fn new(batches: Vec<Vec<OrderFields>>) -> Self {
        Self {
            batches: batches.into(),
        }
    }
}

impl MarketDataStreamer for FixedBatchStreamer {
    fn poll(&mut self) -> Vec<OrderFields> {
        self.batches.pop_front().unwrap_or_default()
    }
}
