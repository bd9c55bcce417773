use order_book_engine::engine::{EngineConfig, MatchingEngine};
use order_book_engine::events::Event;
use order_book_engine::observer::ChannelObserver;
use order_book_engine::orders::{ClientId, OrderFields, OrderStatus, Side};
use order_book_engine::price::Price;
use std::sync::Arc;
use std::time::Duration;

fn drain(rx: &std::sync::mpsc::Receiver<Event>) -> Vec<Event> {
    std::thread::sleep(Duration::from_millis(100));
    rx.try_iter().collect()
}

fn updates(events: &[Event]) -> Vec<&order_book_engine::events::OrderUpdate> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::OrderUpdate(u) => Some(u),
            _ => None,
        })
        .collect()
}

fn trades(events: &[Event]) -> Vec<&order_book_engine::events::Trade> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::Trade(t) => Some(t),
            _ => None,
        })
        .collect()
}

#[test]
fn insert_rests_and_acks_before_matching() {
    let mut engine = MatchingEngine::new(EngineConfig::default());
    let (sink, rx) = ChannelObserver::new();
    engine.subscribe(ClientId(1), Arc::new(sink));

    let ack = engine.insert(
        ClientId(1),
        OrderFields {
            side: Side::Buy,
            price: Price::from_units(100),
            amount: 10,
        },
    );
    assert!(ack.success);

    let events = drain(&rx);
    let u = updates(&events);
    assert_eq!(u.len(), 1);
    assert_eq!(u[0].status, OrderStatus::Resting);
    assert_eq!(u[0].new_unfilled_amount, 10);

    engine.stop();
}

#[test]
fn cross_fans_out_trade_to_both_clients() {
    let mut engine = MatchingEngine::new(EngineConfig::default());
    let (sink1, rx1) = ChannelObserver::new();
    let (sink2, rx2) = ChannelObserver::new();
    engine.subscribe(ClientId(1), Arc::new(sink1));
    engine.subscribe(ClientId(2), Arc::new(sink2));

    engine.insert(
        ClientId(1),
        OrderFields {
            side: Side::Buy,
            price: Price::from_units(100),
            amount: 10,
        },
    );
    drain(&rx1);

    engine.insert(
        ClientId(2),
        OrderFields {
            side: Side::Sell,
            price: Price::from_units(99),
            amount: 4,
        },
    );

    let events1 = drain(&rx1);
    let events2 = drain(&rx2);

    // Both the maker (C1) and the taker (C2) observe the trade.
    assert_eq!(trades(&events1).len(), 1);
    assert_eq!(trades(&events2).len(), 1);
    assert_eq!(trades(&events1)[0].amount, 4);

    let u1 = updates(&events1);
    assert_eq!(u1[0].status, OrderStatus::PartiallyFilled);
    assert_eq!(u1[0].new_unfilled_amount, 6);

    let u2 = updates(&events2);
    assert_eq!(u2[0].status, OrderStatus::Filled);

    engine.stop();
}

#[test]
fn cancel_unknown_order_returns_negative_ack_without_touching_queue() {
    let mut engine = MatchingEngine::new(EngineConfig::default());
    let (sink, rx) = ChannelObserver::new();
    engine.subscribe(ClientId(1), Arc::new(sink));

    let ack = engine.cancel(ClientId(1), order_book_engine::orders::OrderId(9999));
    assert!(!ack.success);

    let events = drain(&rx);
    assert!(events.is_empty());

    engine.stop();
}

#[test]
fn cancel_by_non_owner_is_rejected() {
    let mut engine = MatchingEngine::new(EngineConfig::default());
    let (sink1, rx1) = ChannelObserver::new();
    let (sink2, _rx2) = ChannelObserver::new();
    engine.subscribe(ClientId(1), Arc::new(sink1));
    engine.subscribe(ClientId(2), Arc::new(sink2));

    let ack = engine.insert(
        ClientId(1),
        OrderFields {
            side: Side::Buy,
            price: Price::from_units(100),
            amount: 10,
        },
    );
    drain(&rx1);

    let cancel_ack = engine.cancel(ClientId(2), ack.order_id);
    assert!(!cancel_ack.success);

    let cancel_ack = engine.cancel(ClientId(1), ack.order_id);
    assert!(cancel_ack.success);

    engine.stop();
}

#[test]
fn amend_through_engine_loses_time_priority() {
    // Spec §8 scenario 6, driven through the engine (not the book
    // directly): C1 and C2 rest equal-priced bids, C1 first. Amending
    // C1's order moves it to the tail of its level, so a subsequent
    // crossing sell hits C2 first.
    let mut engine = MatchingEngine::new(EngineConfig::default());
    let (sink1, rx1) = ChannelObserver::new();
    let (sink2, rx2) = ChannelObserver::new();
    engine.subscribe(ClientId(1), Arc::new(sink1));
    engine.subscribe(ClientId(2), Arc::new(sink2));

    let ack1 = engine.insert(
        ClientId(1),
        OrderFields {
            side: Side::Buy,
            price: Price::from_units(100),
            amount: 5,
        },
    );
    engine.insert(
        ClientId(2),
        OrderFields {
            side: Side::Buy,
            price: Price::from_units(100),
            amount: 5,
        },
    );
    drain(&rx1);
    drain(&rx2);

    let amend_ack = engine.amend(
        ClientId(1),
        ack1.order_id,
        OrderFields {
            side: Side::Buy,
            price: Price::from_units(100),
            amount: 5,
        },
    );
    assert!(amend_ack.success);

    let amend_events = drain(&rx1);
    let amend_updates = updates(&amend_events);
    assert_eq!(amend_updates.len(), 1);
    assert_eq!(amend_updates[0].status, OrderStatus::Amended);

    engine.insert(
        ClientId(3),
        OrderFields {
            side: Side::Sell,
            price: Price::from_units(100),
            amount: 5,
        },
    );

    let events1 = drain(&rx1);
    let events2 = drain(&rx2);

    // C2 (never amended) keeps priority and fills first; C1's amended
    // order, now at the tail, sees no trade from this fill.
    assert_eq!(trades(&events2).len(), 1);
    assert!(trades(&events1).is_empty());
    assert_eq!(updates(&events2)[0].status, OrderStatus::Filled);

    engine.stop();
}

#[test]
fn amend_unknown_id_returns_negative_ack_without_enqueueing() {
    let mut engine = MatchingEngine::new(EngineConfig::default());
    let (sink, rx) = ChannelObserver::new();
    engine.subscribe(ClientId(1), Arc::new(sink));

    let ack = engine.amend(
        ClientId(1),
        order_book_engine::orders::OrderId(9999),
        OrderFields {
            side: Side::Buy,
            price: Price::from_units(100),
            amount: 1,
        },
    );
    assert!(!ack.success);
    assert!(drain(&rx).is_empty());

    engine.stop();
}

#[test]
fn amend_by_non_owner_is_rejected() {
    let mut engine = MatchingEngine::new(EngineConfig::default());
    let (sink1, rx1) = ChannelObserver::new();
    let (sink2, _rx2) = ChannelObserver::new();
    engine.subscribe(ClientId(1), Arc::new(sink1));
    engine.subscribe(ClientId(2), Arc::new(sink2));

    let ack = engine.insert(
        ClientId(1),
        OrderFields {
            side: Side::Buy,
            price: Price::from_units(100),
            amount: 10,
        },
    );
    drain(&rx1);

    let amend_ack = engine.amend(
        ClientId(2),
        ack.order_id,
        OrderFields {
            side: Side::Buy,
            price: Price::from_units(101),
            amount: 10,
        },
    );
    assert!(!amend_ack.success);

    // The order is untouched: the rightful owner can still amend it.
    let amend_ack = engine.amend(
        ClientId(1),
        ack.order_id,
        OrderFields {
            side: Side::Buy,
            price: Price::from_units(101),
            amount: 10,
        },
    );
    assert!(amend_ack.success);

    engine.stop();
}

#[test]
fn market_data_orders_get_real_ids_and_no_observer() {
    use order_book_engine::market_data::{FixedBatchStreamer, MarketDataStreamer};

    let batch = vec![OrderFields {
        side: Side::Sell,
        price: Price::from_units(50),
        amount: 3,
    }];
    let streamer: Box<dyn MarketDataStreamer> = Box::new(FixedBatchStreamer::new(vec![batch]));

    let mut engine = MatchingEngine::with_market_data(EngineConfig::default(), streamer);
    std::thread::sleep(Duration::from_millis(150));

    // No client attribution, no subscriber: the resting order produces
    // no observable event, but a subsequent crossing order from a real
    // client still matches against it (real id, no collision).
    let (sink, rx) = ChannelObserver::new();
    engine.subscribe(ClientId(1), Arc::new(sink));
    let ack = engine.insert(
        ClientId(1),
        OrderFields {
            side: Side::Buy,
            price: Price::from_units(50),
            amount: 3,
        },
    );
    assert!(ack.success);

    let events = drain(&rx);
    assert_eq!(trades(&events).len(), 1);
    assert_eq!(trades(&events)[0].amount, 3);

    engine.stop();
}

#[test]
fn stop_is_idempotent_and_rejects_further_submissions() {
    let mut engine = MatchingEngine::new(EngineConfig::default());
    engine.stop();
    engine.stop();

    let ack = engine.insert(
        ClientId(1),
        OrderFields {
            side: Side::Buy,
            price: Price::from_units(100),
            amount: 1,
        },
    );
    assert!(!ack.success);
}
