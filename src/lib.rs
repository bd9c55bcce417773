//! A single-venue continuous-auction matching engine for a limit order
//! book: price-time priority matching (`orderbook`) behind a
//! transaction serializer (`engine`) that turns concurrent client and
//! market-data submissions into one linear history.
//!
//! Transport, authentication, persistence and multi-instrument routing
//! are explicitly out of scope — see `SPEC_FULL.md`. Everything here is
//! a library; `main.rs` is a thin demonstration binary, not a product
//! surface.

pub mod client;
pub mod engine;
pub mod errors;
pub mod events;
pub mod market_data;
pub mod observer;
pub mod orderbook;
pub mod orders;
pub mod price;
pub mod trade;
