//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// This module implements the core matching engine logic for processing orders and generating trades.
// The matching engine follows price-time priority to ensure fair order execution.
//
// | Component                | Description                                                |
// |--------------------------|-----------------------------------------------------------|
// | MatchingEngine           | Main engine for processing and matching orders            |
// | MatchResult              | Represents the outcome of a submission                    |
// | MatchingError            | Error types specific to order validation (see mod.rs)     |
//
//--------------------------------------------------------------------------------------------------
// FUNCTIONS
//--------------------------------------------------------------------------------------------------
// | Name                    | Description                                       | Return Type      |
// |-------------------------|---------------------------------------------------|------------------|
// | add_order               | Validate, match and rest a new limit order        | Result<MatchRes> |
// | add_order_str           | Same, with the side given as text                 | Result<MatchRes> |
// | cancel_order            | Flag an order cancelled (lazy)                    | bool             |
// | best_bid / best_ask     | Market data delegates                             | Option<Decimal>  |
// | spread / mid_price      | Market data delegates                             | Option<Decimal>  |
// | total_volume            | Live volume at a price level                      | u64              |
// | depth_snapshot          | Aggregated book view at the configured depth      | DepthSnapshot    |
//--------------------------------------------------------------------------------------------------

use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::domain::models::types::{Order, Side, Trade};
use crate::domain::services::events::{EventHandler, MatchingEngineEvent};
use crate::domain::services::matching_engine::{MatchingError, MatchingResult};
use crate::domain::services::orderbook::depth::DepthSnapshot;
use crate::domain::services::orderbook::orderbook::OrderBook;

/// Depth levels per side reported by [`MatchingEngine::depth_snapshot`] unless
/// configured otherwise.
const DEFAULT_SNAPSHOT_DEPTH: usize = 20;

/// Represents the outcome of a successful submission.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    /// Id assigned to the incoming order. Returned whether the order rested,
    /// partially filled or was fully consumed.
    pub order_id: u64,
    /// Trades generated from the matching process, in execution order
    /// (best price first, FIFO within a level).
    pub trades: Vec<Trade>,
}

/// The core matching engine responsible for processing orders and generating trades.
///
/// # Overview
///
/// The engine owns the order book for a single instrument and is responsible for:
///
/// * Validating incoming limit orders before any state change
/// * Assigning order ids and arrival sequence numbers
/// * Matching orders according to price-time priority
/// * Resting unmatched remainders in the book
/// * Emitting events for accepted orders, trades, rests and cancellations
///
/// # Price-Time Priority
///
/// Orders are matched according to strict price-time priority rules:
///
/// * Better prices are matched first (higher bids, lower asks)
/// * At the same price level, orders are matched in arrival-sequence order (FIFO)
/// * Every fill executes at the resting order's price
///
/// # Threading
///
/// The engine is single-threaded and synchronous. All operations are invoked
/// serially by one driver; callers that need concurrency must serialise access
/// behind their own boundary.
pub struct MatchingEngine {
    /// The order book for the instrument this engine is managing
    order_book: OrderBook,

    /// Next order id to assign. Ids start at 1 and are never reused; failed
    /// validations do not consume ids.
    next_order_id: u64,

    /// Sequence counter for assigning time priority
    next_sequence_id: u64,

    /// Instrument ID this engine is managing
    instrument_id: Uuid,

    /// Depth levels per side in a default snapshot
    snapshot_depth: usize,

    /// Registered event handlers, invoked inline in registration order
    handlers: Vec<Box<dyn EventHandler>>,
}

// Manual Debug because handler trait objects are not Debug.
impl fmt::Debug for MatchingEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatchingEngine")
            .field("instrument_id", &self.instrument_id)
            .field("next_order_id", &self.next_order_id)
            .field("next_sequence_id", &self.next_sequence_id)
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

impl MatchingEngine {
    /// Creates a new matching engine for a specific instrument.
    ///
    /// # Arguments
    /// * `instrument_id` - The unique identifier of the instrument this engine will manage
    ///
    /// # Returns
    /// A new `MatchingEngine` with an empty book and no event handlers
    pub fn new(instrument_id: Uuid) -> Self {
        Self {
            order_book: OrderBook::new(instrument_id),
            next_order_id: 1,
            next_sequence_id: 1,
            instrument_id,
            snapshot_depth: DEFAULT_SNAPSHOT_DEPTH,
            handlers: Vec::new(),
        }
    }

    /// Creates a matching engine from an [`EngineConfig`].
    pub fn from_config(config: &EngineConfig) -> Self {
        let mut engine = Self::new(config.instrument_id);
        engine.snapshot_depth = config.snapshot_depth;
        engine
    }

    /// Registers an event handler. Handlers run inline on the engine's thread
    /// in registration order and only receive the event types they declare.
    pub fn register_handler(&mut self, handler: Box<dyn EventHandler>) {
        self.handlers.push(handler);
    }

    /// Dispatches an event to every interested handler. A failing handler is
    /// logged and skipped; it never aborts the operation that emitted the event.
    fn emit(&self, event: MatchingEngineEvent) {
        let event_type = event.event_type();
        for handler in &self.handlers {
            if !handler.event_types().contains(&event_type) {
                continue;
            }
            if let Err(e) = handler.handle_event(&event) {
                warn!("event handler failed on {}: {}", event_type, e);
            }
        }
    }

    /// Submits a new limit order to the engine.
    ///
    /// # Order Processing Flow
    ///
    /// 1. Validates price and quantity; validation failures make no state
    ///    change and consume no ids
    /// 2. Constructs the order with the next id and arrival sequence
    /// 3. Matches it against the opposite side while it crosses the best price
    ///    and has residual quantity, filling at resting prices in FIFO order
    /// 4. Rests any remainder at its own price on its own side
    ///
    /// # Arguments
    /// * `side` - The side of the order (Bid/Ask)
    /// * `price` - The limit price; must be positive
    /// * `quantity` - The quantity in base units; must be positive
    ///
    /// # Returns
    /// A [`MatchResult`] carrying the new order's id and the trades executed,
    /// in execution order.
    ///
    /// # Errors
    /// * `MatchingError::InvalidPrice` - the price is not positive
    /// * `MatchingError::InvalidQuantity` - the quantity is zero
    pub fn add_order(
        &mut self,
        side: Side,
        price: Decimal,
        quantity: u64,
    ) -> MatchingResult<MatchResult> {
        if price <= Decimal::ZERO {
            return Err(MatchingError::InvalidPrice(price));
        }
        if quantity == 0 {
            return Err(MatchingError::InvalidQuantity(quantity));
        }

        let mut order = Order::new(
            self.next_order_id,
            self.instrument_id,
            side,
            price,
            quantity,
            self.next_sequence_id,
        );
        let order_id = order.id;
        self.next_order_id += 1;
        self.next_sequence_id += 1;

        debug!(
            "accepted order {}: {} {} @ {}",
            order.id, order.side, order.quantity, order.price
        );
        self.emit(MatchingEngineEvent::OrderAccepted {
            order: order.clone(),
            timestamp: Utc::now(),
        });

        let trades = self.order_book.match_incoming(&mut order);
        for trade in &trades {
            self.emit(MatchingEngineEvent::TradeExecuted {
                trade: trade.clone(),
                timestamp: Utc::now(),
            });
        }

        if order.remaining > 0 {
            self.order_book.insert_resting(order.clone());
            self.emit(MatchingEngineEvent::OrderRested {
                order,
                timestamp: Utc::now(),
            });
        }

        Ok(MatchResult { order_id, trades })
    }

    /// Submits a new limit order with the side given as text, for ingestion
    /// layers that receive sides as strings.
    ///
    /// # Errors
    /// `MatchingError::InvalidSide` for unrecognized side text, plus the
    /// validations of [`MatchingEngine::add_order`].
    pub fn add_order_str(
        &mut self,
        side: &str,
        price: Decimal,
        quantity: u64,
    ) -> MatchingResult<MatchResult> {
        let side = Side::from_str(side)?;
        self.add_order(side, price, quantity)
    }

    /// Cancels an order by id.
    ///
    /// Cancellation is lazy: the order is flagged and stops counting as
    /// liquidity immediately, but stays queued as a tombstone until it reaches
    /// the head of its level during matching.
    ///
    /// # Returns
    /// * `true` - the id is live in the book (repeat cancels stay `true`)
    /// * `false` - the id never existed or was fully filled and evicted
    pub fn cancel_order(&mut self, order_id: u64) -> bool {
        let cancelled = self.order_book.cancel_order(order_id);
        if cancelled {
            self.emit(MatchingEngineEvent::OrderCancelled {
                order_id,
                timestamp: Utc::now(),
            });
        } else {
            debug!("cancel of unknown order {} ignored", order_id);
        }
        cancelled
    }

    /// Returns the best bid price, if any bids rest in the book.
    pub fn best_bid(&self) -> Option<Decimal> {
        self.order_book.best_bid()
    }

    /// Returns the best ask price, if any asks rest in the book.
    pub fn best_ask(&self) -> Option<Decimal> {
        self.order_book.best_ask()
    }

    /// Returns the spread, or `None` when either side is empty.
    pub fn spread(&self) -> Option<Decimal> {
        self.order_book.spread()
    }

    /// Returns the mid price, or `None` when either side is empty.
    pub fn mid_price(&self) -> Option<Decimal> {
        self.order_book.mid_price()
    }

    /// Returns the live volume at a price level, 0 when the level is absent or
    /// holds only cancelled orders.
    pub fn total_volume(&self, side: Side, price: Decimal) -> u64 {
        self.order_book.volume_at_price(side, price)
    }

    /// Returns the number of live orders at a price level.
    pub fn order_count_at_price(&self, side: Side, price: Decimal) -> usize {
        self.order_book.order_count_at_price(side, price)
    }

    /// Builds an aggregated depth view at the configured depth.
    pub fn depth_snapshot(&self) -> DepthSnapshot {
        self.order_book.depth_snapshot(self.snapshot_depth)
    }

    /// Gets the current state of the order book.
    pub fn order_book(&self) -> &OrderBook {
        &self.order_book
    }

    /// Gets the instrument ID this engine is managing.
    pub fn instrument_id(&self) -> Uuid {
        self.instrument_id
    }
}

//--------------------------------------------------------------------------------------------------
//  TESTS
//--------------------------------------------------------------------------------------------------
// | Name                                   | Description                                       |
// |----------------------------------------|---------------------------------------------------|
// | test_quoting_and_spread                | Four resting quotes, top-of-book metrics          |
// | test_partial_fill                      | Aggressor partially consumes the best ask         |
// | test_complete_level_consumption        | Aggressor finishes the level, best ask advances   |
// | test_unknown_cancel_and_lazy_sweep     | Unknown id, lazy cancel, tombstone sweep          |
// | test_price_time_priority               | FIFO fills across one level                       |
// | test_cross_spread_aggressor            | Fill at the resting order's price                 |
// | test_validation_*                      | Rejections make no state change                   |
// | test_ids_monotonic                     | Ids start at 1 and never skip or reuse            |
// | test_cancel_twice_live_order           | Idempotent cancel contract                        |
// | test_non_crossing_preserves_best       | Passive inserts only improve their own side       |
// | test_limit_never_violated              | No fill worse than the taker's limit              |
// | test_middle_tombstone_does_not_block   | Tombstones never block earlier or later orders    |
// | test_fully_consumed_order_not_indexed  | Consumed takers are not cancellable               |
// | test_large_prices                      | Spread arithmetic at large magnitudes             |
// | test_many_levels                       | Best prices across a ladder of levels             |
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn engine() -> MatchingEngine {
        MatchingEngine::new(Uuid::new_v4())
    }

    /// Engine pre-loaded with the standard two-sided quote set used by the
    /// market-data scenarios.
    fn quoted_engine() -> MatchingEngine {
        let mut engine = engine();
        engine.add_order(Side::Bid, dec!(99.5), 100).unwrap();
        engine.add_order(Side::Bid, dec!(99.0), 50).unwrap();
        engine.add_order(Side::Ask, dec!(100.5), 100).unwrap();
        engine.add_order(Side::Ask, dec!(101.0), 50).unwrap();
        engine
    }

    #[test]
    fn test_quoting_and_spread() {
        let engine = quoted_engine();
        assert_eq!(engine.best_bid(), Some(dec!(99.5)));
        assert_eq!(engine.best_ask(), Some(dec!(100.5)));
        assert_eq!(engine.spread(), Some(dec!(1.0)));
        assert_eq!(engine.mid_price(), Some(dec!(100.0)));
    }

    #[test]
    fn test_partial_fill() {
        let mut engine = quoted_engine();
        let result = engine.add_order(Side::Bid, dec!(100.5), 30).unwrap();

        assert_eq!(result.trades.len(), 1);
        assert_eq!(result.trades[0].price, dec!(100.5));
        assert_eq!(result.trades[0].quantity, 30);
        // The first SELL@100.5 was order 3 in the quote set.
        assert_eq!(result.trades[0].maker_order_id, 3);
        assert_eq!(engine.total_volume(Side::Ask, dec!(100.5)), 70);
    }

    #[test]
    fn test_complete_level_consumption() {
        let mut engine = quoted_engine();
        engine.add_order(Side::Bid, dec!(100.5), 30).unwrap();
        let result = engine.add_order(Side::Bid, dec!(100.5), 70).unwrap();

        assert_eq!(result.trades.len(), 1);
        assert_eq!(result.trades[0].price, dec!(100.5));
        assert_eq!(result.trades[0].quantity, 70);
        assert_eq!(engine.best_ask(), Some(dec!(101.0)));
    }

    #[test]
    fn test_unknown_cancel_and_lazy_sweep() {
        let mut engine = engine();
        assert!(!engine.cancel_order(999999));

        let resting = engine.add_order(Side::Ask, dec!(102.0), 200).unwrap();
        assert!(engine.cancel_order(resting.order_id));
        assert_eq!(engine.total_volume(Side::Ask, dec!(102.0)), 0);

        // The aggressor crosses the tombstoned level: the cancelled order is
        // skipped and swept without a trade, and the buy rests.
        let result = engine.add_order(Side::Bid, dec!(102.0), 10).unwrap();
        assert!(result.trades.is_empty());
        assert_eq!(engine.best_ask(), None);
        assert_eq!(engine.best_bid(), Some(dec!(102.0)));
        // Swept tombstones are gone for good, later cancels miss.
        assert!(!engine.cancel_order(resting.order_id));
    }

    #[test]
    fn test_price_time_priority() {
        let mut engine = engine();
        engine.add_order(Side::Ask, dec!(100.0), 10).unwrap();
        engine.add_order(Side::Ask, dec!(100.0), 20).unwrap();
        engine.add_order(Side::Ask, dec!(100.0), 30).unwrap();

        let result = engine.add_order(Side::Bid, dec!(100.0), 35).unwrap();
        let fills: Vec<(Decimal, u64)> = result
            .trades
            .iter()
            .map(|t| (t.price, t.quantity))
            .collect();
        assert_eq!(
            fills,
            vec![
                (dec!(100.0), 10),
                (dec!(100.0), 20),
                (dec!(100.0), 5),
            ]
        );
        assert_eq!(engine.total_volume(Side::Ask, dec!(100.0)), 25);
    }

    #[test]
    fn test_cross_spread_aggressor() {
        let mut engine = engine();
        engine.add_order(Side::Bid, dec!(100.0), 50).unwrap();
        let result = engine.add_order(Side::Ask, dec!(99.0), 100).unwrap();

        // The fill executes at the resting buy's price, not the aggressor's.
        assert_eq!(result.trades.len(), 1);
        assert_eq!(result.trades[0].price, dec!(100.0));
        assert_eq!(result.trades[0].quantity, 50);
        assert_eq!(engine.best_bid(), None);
        assert_eq!(engine.best_ask(), Some(dec!(99.0)));
        assert_eq!(engine.total_volume(Side::Ask, dec!(99.0)), 50);
    }

    #[test]
    fn test_validation_rejects_bad_price() {
        let mut engine = engine();
        assert_eq!(
            engine.add_order(Side::Bid, dec!(0), 10),
            Err(MatchingError::InvalidPrice(dec!(0)))
        );
        assert_eq!(
            engine.add_order(Side::Bid, dec!(-1.5), 10),
            Err(MatchingError::InvalidPrice(dec!(-1.5)))
        );
        // No state change, no id consumed.
        assert_eq!(engine.best_bid(), None);
        let accepted = engine.add_order(Side::Bid, dec!(99.0), 10).unwrap();
        assert_eq!(accepted.order_id, 1);
    }

    #[test]
    fn test_validation_rejects_zero_quantity() {
        let mut engine = engine();
        assert_eq!(
            engine.add_order(Side::Ask, dec!(100.0), 0),
            Err(MatchingError::InvalidQuantity(0))
        );
        assert_eq!(engine.best_ask(), None);
    }

    #[test]
    fn test_validation_rejects_bad_side_text() {
        let mut engine = engine();
        assert_eq!(
            engine.add_order_str("hold", dec!(100.0), 10),
            Err(MatchingError::InvalidSide("hold".to_string()))
        );
        // The accepted spellings route through to the typed entry point.
        let result = engine.add_order_str("buy", dec!(100.0), 10).unwrap();
        assert_eq!(result.order_id, 1);
        assert_eq!(engine.best_bid(), Some(dec!(100.0)));
    }

    #[test]
    fn test_ids_monotonic() {
        let mut engine = engine();
        let a = engine.add_order(Side::Bid, dec!(99.0), 10).unwrap();
        let b = engine.add_order(Side::Ask, dec!(101.0), 10).unwrap();
        // Fully consumed aggressor still gets and returns its id.
        let c = engine.add_order(Side::Bid, dec!(101.0), 10).unwrap();
        assert_eq!((a.order_id, b.order_id, c.order_id), (1, 2, 3));
        assert_eq!(c.trades.len(), 1);
    }

    #[test]
    fn test_cancel_twice_live_order() {
        let mut engine = engine();
        let resting = engine.add_order(Side::Ask, dec!(100.0), 40).unwrap();

        assert!(engine.cancel_order(resting.order_id));
        assert!(engine.cancel_order(resting.order_id));

        // The second cancel changed nothing: the aggressor still finds no
        // liquidity and rests.
        let result = engine.add_order(Side::Bid, dec!(100.0), 10).unwrap();
        assert!(result.trades.is_empty());
        assert_eq!(engine.best_bid(), Some(dec!(100.0)));
    }

    #[test]
    fn test_non_crossing_preserves_best() {
        let mut engine = quoted_engine();

        // Worse than the current best on its side: both bests unchanged.
        engine.add_order(Side::Bid, dec!(98.0), 10).unwrap();
        engine.add_order(Side::Ask, dec!(103.0), 10).unwrap();
        assert_eq!(engine.best_bid(), Some(dec!(99.5)));
        assert_eq!(engine.best_ask(), Some(dec!(100.5)));

        // A better passive quote moves only its own side.
        engine.add_order(Side::Bid, dec!(99.75), 10).unwrap();
        assert_eq!(engine.best_bid(), Some(dec!(99.75)));
        assert_eq!(engine.best_ask(), Some(dec!(100.5)));
    }

    #[test]
    fn test_limit_never_violated() {
        let mut engine = engine();
        engine.add_order(Side::Ask, dec!(100.0), 10).unwrap();
        engine.add_order(Side::Ask, dec!(100.5), 10).unwrap();
        engine.add_order(Side::Ask, dec!(101.0), 10).unwrap();

        let limit = dec!(100.5);
        let result = engine.add_order(Side::Bid, limit, 40).unwrap();

        assert!(result.trades.iter().all(|t| t.price <= limit));
        let filled: u64 = result.trades.iter().map(|t| t.quantity).sum();
        assert_eq!(filled, 20);
        // The residual rested, so the fill total is below the incoming quantity.
        assert_eq!(engine.total_volume(Side::Bid, limit), 20);
    }

    #[test]
    fn test_middle_tombstone_does_not_block() {
        let mut engine = engine();
        let first = engine.add_order(Side::Ask, dec!(100.0), 10).unwrap();
        let middle = engine.add_order(Side::Ask, dec!(100.0), 20).unwrap();
        let last = engine.add_order(Side::Ask, dec!(100.0), 30).unwrap();
        assert!(engine.cancel_order(middle.order_id));

        let result = engine.add_order(Side::Bid, dec!(100.0), 25).unwrap();
        assert_eq!(result.trades.len(), 2);
        assert_eq!(result.trades[0].maker_order_id, first.order_id);
        assert_eq!(result.trades[0].quantity, 10);
        assert_eq!(result.trades[1].maker_order_id, last.order_id);
        assert_eq!(result.trades[1].quantity, 15);
        assert_eq!(engine.total_volume(Side::Ask, dec!(100.0)), 15);
    }

    #[test]
    fn test_fully_consumed_order_not_indexed() {
        let mut engine = engine();
        engine.add_order(Side::Ask, dec!(100.0), 10).unwrap();
        let taker = engine.add_order(Side::Bid, dec!(100.0), 10).unwrap();

        assert_eq!(taker.trades.len(), 1);
        // Neither the consumed maker nor the consumed taker can be cancelled.
        assert!(!engine.cancel_order(1));
        assert!(!engine.cancel_order(taker.order_id));
    }

    #[test]
    fn test_large_prices() {
        let mut engine = engine();
        engine.add_order(Side::Bid, dec!(999999.99), 1).unwrap();
        engine.add_order(Side::Ask, dec!(1000000.01), 1).unwrap();

        assert_eq!(engine.best_bid(), Some(dec!(999999.99)));
        assert_eq!(engine.best_ask(), Some(dec!(1000000.01)));
        assert_eq!(engine.spread(), Some(dec!(0.02)));
    }

    #[test]
    fn test_many_levels() {
        let mut engine = engine();
        for i in 0..10u32 {
            let offset = Decimal::from(i) * dec!(0.5);
            engine.add_order(Side::Bid, dec!(100.0) - offset, 10).unwrap();
            engine.add_order(Side::Ask, dec!(101.0) + offset, 10).unwrap();
        }
        assert_eq!(engine.best_bid(), Some(dec!(100.0)));
        assert_eq!(engine.best_ask(), Some(dec!(101.0)));

        let snapshot = engine.depth_snapshot();
        assert_eq!(snapshot.bids.len(), 10);
        assert_eq!(snapshot.asks.len(), 10);
    }
}
