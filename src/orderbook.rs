use crate::events::OrderUpdate;
use crate::orders::{Order, OrderId, OrderStatus, Side};
use crate::price::Price;
use crate::trade::Trade;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::time::SystemTime;
use tracing::{debug, trace};

/// Where a resting order currently lives, so cancel/amend can jump
/// straight to its level instead of scanning every level from the best
/// price down, per the §9 "price-level container" redesign note.
#[derive(Debug, Clone, Copy)]
struct OrderLocator {
    side: Side,
    price: Price,
}

/// Holds resting orders for one instrument and matches incoming orders
/// against them with price-time priority.
///
/// Bids and asks are each a [`BTreeMap`] from price to a FIFO
/// [`VecDeque`] of orders at that price. A `BTreeMap` keeps price levels
/// sorted for free: the ask side's best price is `asks.first_key_value`,
/// the bid side's best price is `bids.last_key_value` — both O(log N)
/// instead of the source's linear scan over a `forward_list`.
///
/// The book is single-threaded by construction: every method here takes
/// `&mut self`, and the matching engine is the only caller that is ever
/// allowed to hold one.
pub struct OrderBook {
    bids: BTreeMap<Price, VecDeque<Order>>,
    asks: BTreeMap<Price, VecDeque<Order>>,
    index: HashMap<OrderId, OrderLocator>,
}

impl OrderBook {
    pub fn new() -> Self {
        Self {
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            index: HashMap::new(),
        }
    }

    pub fn best_bid_price(&self) -> Option<Price> {
        self.bids.keys().next_back().copied()
    }

    pub fn best_ask_price(&self) -> Option<Price> {
        self.asks.keys().next().copied()
    }

    pub fn best_bid_amount(&self) -> u64 {
        self.bids
            .iter()
            .next_back()
            .and_then(|(_, q)| q.front())
            .map(|o| o.unfilled_amount)
            .unwrap_or(0)
    }

    pub fn best_ask_amount(&self) -> u64 {
        self.asks
            .iter()
            .next()
            .and_then(|(_, q)| q.front())
            .map(|o| o.unfilled_amount)
            .unwrap_or(0)
    }

    pub fn order_exists(&self, id: OrderId) -> bool {
        self.index.contains_key(&id)
    }

    /// Inserts a new order, matching it against the opposite side first
    /// and resting whatever remains. Produces zero or more [`Trade`]s (via
    /// `on_trade`) and one or more [`OrderUpdate`]s (via `on_update`), in
    /// the order described in spec §4.1: per fill, `Trade` then the
    /// maker's `OrderUpdate`; after the cross phase, the taker's
    /// `OrderUpdate`.
    pub fn insert(
        &mut self,
        order: Order,
        on_trade: &mut dyn FnMut(Trade),
        on_update: &mut dyn FnMut(OrderUpdate),
    ) {
        self.insert_with_rest_status(order, OrderStatus::Resting, on_trade, on_update);
    }

    /// Semantically cancel-then-insert under the same id: the original
    /// resting order is removed with no event, and the replacement goes
    /// through the ordinary cross/rest path — so a replacement can still
    /// trade immediately, exactly like a fresh insert. It loses time
    /// priority because resting always appends to the tail of its level.
    ///
    /// Open question (spec §9): whether amend surfaces a dedicated
    /// `Amended` update or the raw cancel+insert pair. We emit a single
    /// `Amended` update for the resting outcome (see `DESIGN.md`); any
    /// trades the replacement causes while crossing still emit their own
    /// `Trade` and maker `OrderUpdate`s exactly as a normal insert would,
    /// and full consumption still reports `Filled`.
    pub fn amend(
        &mut self,
        id: OrderId,
        mut replacement: Order,
        on_trade: &mut dyn FnMut(Trade),
        on_update: &mut dyn FnMut(OrderUpdate),
    ) -> bool {
        let Some(loc) = self.index.remove(&id) else {
            return false;
        };
        self.remove_from_level(loc, id);
        replacement.id = id;
        self.insert_with_rest_status(replacement, OrderStatus::Amended, on_trade, on_update);
        true
    }

    /// Removes a resting order outright. Per §9, success is defined by
    /// presence: an unknown id fails and changes nothing; a present,
    /// resting order always succeeds.
    pub fn cancel(&mut self, id: OrderId, on_update: &mut dyn FnMut(OrderUpdate)) -> bool {
        let Some(loc) = self.index.remove(&id) else {
            return false;
        };
        let order = self.remove_from_level(loc, id);
        debug!(order_id = %id, "cancelled resting order");
        on_update(OrderUpdate {
            order_id: id,
            client_id: order.client_id,
            new_unfilled_amount: order.unfilled_amount,
            status: OrderStatus::Cancelled,
        });
        true
    }

    fn insert_with_rest_status(
        &mut self,
        mut order: Order,
        rest_status: OrderStatus,
        on_trade: &mut dyn FnMut(Trade),
        on_update: &mut dyn FnMut(OrderUpdate),
    ) {
        trace!(order_id = %order.id, side = ?order.side, price = %order.price, amount = order.unfilled_amount, "matching incoming order");
        self.cross(&mut order, on_trade, on_update);

        if order.unfilled_amount == 0 {
            on_update(OrderUpdate {
                order_id: order.id,
                client_id: order.client_id,
                new_unfilled_amount: 0,
                status: OrderStatus::Filled,
            });
            return;
        }

        let locator = OrderLocator {
            side: order.side,
            price: order.price,
        };
        let side_book = self.side_book_mut(order.side);
        side_book
            .entry(order.price)
            .or_insert_with(VecDeque::new)
            .push_back(order.clone());
        self.index.insert(order.id, locator);

        on_update(OrderUpdate {
            order_id: order.id,
            client_id: order.client_id,
            new_unfilled_amount: order.unfilled_amount,
            status: rest_status,
        });
    }

    /// Crosses `order` against the opposite side's best price while it
    /// remains marketable, i.e. for a buy, `order.price >= best_ask`; for
    /// a sell, `order.price <= best_bid`. Always matches the head order
    /// of the head level — price-time priority by construction, since
    /// each level is a FIFO queue and the map is kept sorted.
    fn cross(
        &mut self,
        order: &mut Order,
        on_trade: &mut dyn FnMut(Trade),
        on_update: &mut dyn FnMut(OrderUpdate),
    ) {
        loop {
            if order.unfilled_amount == 0 {
                break;
            }
            let Some(best_opposite) = self.best_opposite_price(order.side) else {
                break;
            };
            let marketable = match order.side {
                Side::Buy => order.price >= best_opposite,
                Side::Sell => order.price <= best_opposite,
            };
            if !marketable {
                break;
            }

            let opposite = self.side_book_mut(order.side.opposite());
            let queue = opposite
                .get_mut(&best_opposite)
                .expect("level just looked up");
            let maker = queue.front_mut().expect("non-empty level invariant");

            let traded = order.unfilled_amount.min(maker.unfilled_amount);
            maker.unfilled_amount -= traded;
            order.unfilled_amount -= traded;

            on_trade(Trade {
                maker_order_id: maker.id,
                taker_order_id: order.id,
                maker_client: maker.client_id,
                taker_client: order.client_id,
                price: best_opposite,
                amount: traded,
                timestamp: SystemTime::now(),
            });

            if maker.unfilled_amount == 0 {
                let filled_maker = queue.pop_front().expect("just matched against front");
                self.index.remove(&filled_maker.id);
                if queue.is_empty() {
                    opposite.remove(&best_opposite);
                }
                on_update(OrderUpdate {
                    order_id: filled_maker.id,
                    client_id: filled_maker.client_id,
                    new_unfilled_amount: 0,
                    status: OrderStatus::Filled,
                });
            } else {
                on_update(OrderUpdate {
                    order_id: maker.id,
                    client_id: maker.client_id,
                    new_unfilled_amount: maker.unfilled_amount,
                    status: OrderStatus::PartiallyFilled,
                });
            }
        }
    }

    fn best_opposite_price(&self, side: Side) -> Option<Price> {
        match side.opposite() {
            Side::Buy => self.best_bid_price(),
            Side::Sell => self.best_ask_price(),
        }
    }

    fn side_book_mut(&mut self, side: Side) -> &mut BTreeMap<Price, VecDeque<Order>> {
        match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        }
    }

    /// Removes the order at `id` from the level `loc` points at, pruning
    /// the level if it becomes empty. Caller has already removed `id`
    /// from `self.index`.
    fn remove_from_level(&mut self, loc: OrderLocator, id: OrderId) -> Order {
        let side_book = self.side_book_mut(loc.side);
        let queue = side_book
            .get_mut(&loc.price)
            .expect("index locator must point at an existing level");
        let pos = queue
            .iter()
            .position(|o| o.id == id)
            .expect("index locator must point at the order's level");
        let order = queue.remove(pos).expect("position just found");
        if queue.is_empty() {
            side_book.remove(&loc.price);
        }
        order
    }
}

impl Side {
    fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl Default for OrderBook {
    fn default() -> Self {
        Self::new()
    }
}
