use crate::events::Event;
use std::sync::mpsc;

/// A sink capable of receiving [`Event`]s fanned out by the engine.
///
/// Delivery is synchronous on the processor thread (see spec §5), so
/// implementations must be non-blocking or must enqueue internally —
/// exactly what [`ChannelObserver`] does below.
pub trait Observer: Send + Sync {
    fn notify(&self, event: Event);
}

/// The one concrete [`Observer`] this crate ships: forwards every event
/// onto an `mpsc` channel so the processor thread never blocks on a slow
/// reader. This is the "own-nothing handle" the spec's §9 cyclic-reference
/// note asks for — the engine holds only this sink, never a handle back
/// to whatever owns the receiving end.
pub struct ChannelObserver {
    tx: mpsc::Sender<Event>,
}

impl ChannelObserver {
    pub fn new() -> (Self, mpsc::Receiver<Event>) {
        let (tx, rx) = mpsc::channel();
        (Self { tx }, rx)
    }
}

impl Observer for ChannelObserver {
    fn notify(&self, event: Event) {
        // A disconnected receiver just means the client stopped
        // listening; the processor keeps going regardless.
        let _ = self.tx.send(event);
    }
}
