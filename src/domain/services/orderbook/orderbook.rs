//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// This module implements a limit order book for a single trading instrument.
// It maintains bid and ask orders in price-time priority (FIFO) order.
//
// Cancellation is lazy: cancelling flips a flag on the resting order and removes
// its quantity from the level's volume cache. The tombstone stays queued until it
// reaches the head of its level during matching, where it is swept without
// producing a trade.
//
// | Component     | Description                                                               |
// |---------------|---------------------------------------------------------------------------|
// | PriceLevel    | FIFO queue of orders sharing one price, with a live-volume cache          |
// | OrderBook     | Both sides' price levels, best-price caches and the order id index        |
// | Matching      | Taker traversal of the opposite side, maker-price fills, tombstone sweep  |
//
//--------------------------------------------------------------------------------------------------
// FUNCTIONS
//--------------------------------------------------------------------------------------------------
// | Name                  | Description                                | Return Type            |
// |-----------------------|--------------------------------------------|------------------------|
// | new                   | Creates new OrderBook                      | OrderBook              |
// | insert_resting        | Adds a resting order to its side           | ()                     |
// | match_incoming        | Fills a taker against the opposite side    | Vec<Trade>             |
// | cancel_order          | Flags an order cancelled (lazy)            | bool                   |
// | best_bid / best_ask   | Best price per side                        | Option<Decimal>        |
// | spread / mid_price    | Derived top-of-book metrics                | Option<Decimal>        |
// | volume_at_price       | Live volume at a price level               | u64                    |
//--------------------------------------------------------------------------------------------------

use std::collections::{BTreeMap, HashMap, VecDeque};

use rust_decimal::Decimal;
use tracing::debug;
use uuid::Uuid;

use crate::domain::models::types::{Order, Side, Trade};
use crate::domain::services::orderbook::depth::{DepthSnapshot, PriceLevel as DepthLevel};

/// Represents a price level in the order book, maintaining a FIFO queue of orders
/// at the same price point.
#[derive(Debug, Clone)]
pub struct PriceLevel {
    /// The price for this level
    pub price: Decimal,
    /// FIFO queue of orders at this price level. The head is the oldest arrival.
    /// Cancelled orders stay queued as tombstones until swept.
    pub orders: VecDeque<Order>,
    /// Cached sum of the remaining quantities of non-cancelled orders. Updated on
    /// append, fill and cancel; the physical sweep does not touch it because the
    /// cancel already removed the quantity.
    pub total_volume: u64,
}

impl PriceLevel {
    /// Creates a new empty price level.
    pub fn new(price: Decimal) -> Self {
        Self {
            price,
            orders: VecDeque::with_capacity(4),
            total_volume: 0,
        }
    }

    /// Appends an order to the tail of the queue and credits its remaining
    /// quantity to the volume cache.
    pub fn push_order(&mut self, order: Order) {
        self.total_volume = self.total_volume.saturating_add(order.remaining);
        self.orders.push_back(order);
    }

    /// Returns the next order to be matched without removing it from the queue.
    ///
    /// # Returns
    /// * `Some(&Order)` - Reference to the head of the queue (may be a tombstone)
    /// * `None` - If there are no orders at this price level
    #[inline]
    pub fn peek_next_order(&self) -> Option<&Order> {
        self.orders.front()
    }

    /// Returns true if this price level has no orders, tombstones included.
    /// A level with only tombstones still exists in the book.
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Returns the number of live (non-cancelled) orders at this price level.
    pub fn order_count(&self) -> usize {
        self.orders.iter().filter(|o| !o.cancelled).count()
    }
}

/// The main order book structure that maintains bid and ask orders in price-time priority.
/// Uses BTreeMap for price level organization and VecDeque for FIFO ordering within price levels.
#[derive(Debug)]
pub struct OrderBook {
    /// Bid side orders organized by price (best bid = highest key)
    bids: BTreeMap<Decimal, PriceLevel>,
    /// Ask side orders organized by price (best ask = lowest key)
    asks: BTreeMap<Decimal, PriceLevel>,
    /// Cache of best bid price for quick access.
    /// This is an Option because the order book may be empty or have no bids,
    /// in which case there is no best bid price to reference.
    best_bid: Option<Decimal>,
    /// Cache of best ask price for quick access
    best_ask: Option<Decimal>,
    /// Identifier for the instrument this order book manages
    instrument_id: Uuid,
    /// O(1) lookup of an order's location by id. Entries are removed on full
    /// fill and at sweep time; cancelled-but-unswept orders keep their entry.
    order_map: HashMap<u64, (Side, Decimal)>,
}

impl OrderBook {
    /// Creates a new empty order book for a specific instrument.
    ///
    /// # Arguments
    /// * `instrument_id` - The unique identifier of the instrument this order book will manage
    ///
    /// # Returns
    /// A new `OrderBook` instance with empty bid and ask sides
    pub fn new(instrument_id: Uuid) -> Self {
        Self {
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            best_bid: None,
            best_ask: None,
            instrument_id,
            order_map: HashMap::new(),
        }
    }

    /// Adds a resting order to its own side of the book in price-time priority.
    ///
    /// The level is created on demand and registered in the best-price cache;
    /// the order is appended at the tail of the level's queue and indexed by id.
    /// The caller (the matching engine) has already validated price and quantity.
    pub fn insert_resting(&mut self, order: Order) {
        debug_assert!(order.price > Decimal::ZERO);
        debug_assert!(order.remaining > 0);

        let price = order.price;
        let side = order.side;
        let order_id = order.id;

        let price_levels = if side == Side::Bid {
            &mut self.bids
        } else {
            &mut self.asks
        };
        price_levels
            .entry(price)
            .or_insert_with(|| PriceLevel::new(price))
            .push_order(order);

        self.order_map.insert(order_id, (side, price));

        // Update best prices cache only if needed
        match side {
            Side::Bid if self.best_bid.map_or(true, |p| price > p) => self.best_bid = Some(price),
            Side::Ask if self.best_ask.map_or(true, |p| price < p) => self.best_ask = Some(price),
            _ => {}
        }
    }

    /// Matches an incoming order against the opposite side of the book,
    /// producing a series of [`Trade`]s.
    ///
    /// The taker walks the opposite side best level first, consuming queue heads
    /// in FIFO order. Every fill executes at the resting order's price. Cancelled
    /// heads are swept without producing a trade. Levels emptied by matching are
    /// removed and the best-price cache refreshed.
    ///
    /// The loop ends when the taker is fully filled, the opposite side is empty,
    /// or its best price no longer crosses the taker's limit. Any residual is the
    /// caller's to rest via [`OrderBook::insert_resting`].
    pub fn match_incoming(&mut self, taker: &mut Order) -> Vec<Trade> {
        let mut trades = Vec::new();
        let maker_side = taker.side.opposite();

        while taker.remaining > 0 {
            // Read the extreme key directly; the cached best is for accessors.
            let best_price = match maker_side {
                Side::Bid => self.bids.keys().next_back().copied(),
                Side::Ask => self.asks.keys().next().copied(),
            };
            let Some(best_price) = best_price else { break };
            if !taker.crosses(best_price) {
                break;
            }
            self.match_level(maker_side, best_price, taker, &mut trades);
        }

        trades
    }

    /// Consumes the queue of one maker level against the taker.
    ///
    /// Invariant on exit: the taker is fully filled, or the level has been
    /// emptied and removed from the book (so the outer loop always advances).
    fn match_level(
        &mut self,
        maker_side: Side,
        price: Decimal,
        taker: &mut Order,
        trades: &mut Vec<Trade>,
    ) {
        let price_levels = if maker_side == Side::Bid {
            &mut self.bids
        } else {
            &mut self.asks
        };
        let Some(level) = price_levels.get_mut(&price) else {
            return;
        };

        while taker.remaining > 0 {
            let Some(maker) = level.orders.front_mut() else {
                break;
            };

            // Lazy sweep: a cancelled head is dropped without a fill. Its
            // quantity left the volume cache when the cancel flag was set.
            if maker.cancelled {
                let maker_id = maker.id;
                level.orders.pop_front();
                self.order_map.remove(&maker_id);
                debug!("swept cancelled order {} at level {}", maker_id, price);
                continue;
            }

            let fill_quantity = taker.remaining.min(maker.remaining);
            maker.fill(fill_quantity);
            let maker_id = maker.id;
            let maker_filled = maker.is_filled();

            taker.fill(fill_quantity);
            level.total_volume = level.total_volume.saturating_sub(fill_quantity);
            trades.push(Trade::new(
                self.instrument_id,
                maker_id,
                taker.id,
                price,
                fill_quantity,
            ));

            if maker_filled {
                level.orders.pop_front();
                self.order_map.remove(&maker_id);
            }
        }

        let level_emptied = level.is_empty();
        if level_emptied {
            price_levels.remove(&price);
            debug!("removed empty price level {}", price);
            match maker_side {
                Side::Bid if self.best_bid == Some(price) => self.update_best_bid(),
                Side::Ask if self.best_ask == Some(price) => self.update_best_ask(),
                _ => {}
            }
        }
    }

    /// Flags an order as cancelled, leaving it queued as a tombstone.
    ///
    /// Returns `true` when the id is known to the book (including orders already
    /// flagged but not yet swept), `false` for ids that never existed or were
    /// fully filled and evicted. Idempotent: repeat cancels of a live order keep
    /// returning `true` and change nothing further.
    pub fn cancel_order(&mut self, order_id: u64) -> bool {
        let Some(&(side, price)) = self.order_map.get(&order_id) else {
            return false;
        };
        let price_levels = if side == Side::Bid {
            &mut self.bids
        } else {
            &mut self.asks
        };
        let Some(level) = price_levels.get_mut(&price) else {
            return false;
        };
        let Some(order) = level.orders.iter_mut().find(|o| o.id == order_id) else {
            return false;
        };

        if !order.cancelled {
            let remaining = order.remaining;
            order.cancel();
            // The tombstone no longer counts as available liquidity.
            level.total_volume = level.total_volume.saturating_sub(remaining);
            debug!("cancelled order {} at level {}", order_id, price);
        }
        true
    }

    /// Gets an order by its ID.
    ///
    /// # Returns
    /// * `Some(&Order)` - Reference to the found order (possibly a tombstone)
    /// * `None` - If no order with the given id rests in the book
    pub fn get_order_by_id(&self, order_id: u64) -> Option<&Order> {
        self.order_map.get(&order_id).and_then(|(side, price)| {
            let price_levels = match side {
                Side::Bid => &self.bids,
                Side::Ask => &self.asks,
            };
            price_levels
                .get(price)
                .and_then(|level| level.orders.iter().find(|order| order.id == order_id))
        })
    }

    /// Returns true if the given id is still indexed by the book.
    pub fn contains_order(&self, order_id: u64) -> bool {
        self.order_map.contains_key(&order_id)
    }

    /// Updates only the best bid price
    #[inline]
    fn update_best_bid(&mut self) {
        self.best_bid = self.bids.keys().next_back().copied();
    }

    /// Updates only the best ask price
    #[inline]
    fn update_best_ask(&mut self) {
        self.best_ask = self.asks.keys().next().copied();
    }

    /// Returns the best bid price.
    ///
    /// # Returns
    /// * `Some(Decimal)` - The highest bid price with a non-empty level
    /// * `None` - If there are no bid levels
    #[inline]
    pub fn best_bid(&self) -> Option<Decimal> {
        self.best_bid
    }

    /// Returns the best ask price.
    ///
    /// # Returns
    /// * `Some(Decimal)` - The lowest ask price with a non-empty level
    /// * `None` - If there are no ask levels
    #[inline]
    pub fn best_ask(&self) -> Option<Decimal> {
        self.best_ask
    }

    /// Returns the spread between the best bid and ask prices.
    ///
    /// # Returns
    /// * `Some(Decimal)` - The difference between best ask and best bid
    /// * `None` - If either best bid or best ask is missing
    pub fn spread(&self) -> Option<Decimal> {
        match (self.best_ask, self.best_bid) {
            (Some(ask), Some(bid)) => Some(ask - bid),
            _ => None,
        }
    }

    /// Returns the midpoint between the best bid and ask prices.
    ///
    /// # Returns
    /// * `Some(Decimal)` - Half the sum of best ask and best bid
    /// * `None` - If either best bid or best ask is missing
    pub fn mid_price(&self) -> Option<Decimal> {
        match (self.best_ask, self.best_bid) {
            (Some(ask), Some(bid)) => Some((ask + bid) / Decimal::TWO),
            _ => None,
        }
    }

    /// Returns the live volume at a specific price level, excluding cancelled
    /// orders regardless of their physical position in the queue.
    ///
    /// # Arguments
    /// * `side` - The side (Bid/Ask) to look up
    /// * `price` - The price level to get volume for
    ///
    /// # Returns
    /// The total non-cancelled quantity, or 0 if the level is absent or holds
    /// only tombstones.
    pub fn volume_at_price(&self, side: Side, price: Decimal) -> u64 {
        let price_levels = match side {
            Side::Bid => &self.bids,
            Side::Ask => &self.asks,
        };
        price_levels
            .get(&price)
            .map_or(0, |level| level.total_volume)
    }

    /// Returns the number of live orders at a specific price level.
    pub fn order_count_at_price(&self, side: Side, price: Decimal) -> usize {
        let price_levels = match side {
            Side::Bid => &self.bids,
            Side::Ask => &self.asks,
        };
        price_levels.get(&price).map_or(0, |level| level.order_count())
    }

    /// Gets a reference to the price level at the specified price, if present.
    pub fn get_price_level(&self, side: Side, price: Decimal) -> Option<&PriceLevel> {
        match side {
            Side::Bid => self.bids.get(&price),
            Side::Ask => self.asks.get(&price),
        }
    }

    /// Returns the instrument ID this order book manages.
    pub fn instrument_id(&self) -> Uuid {
        self.instrument_id
    }

    /// Builds an aggregated depth view of the book, best prices first.
    ///
    /// Levels holding only tombstones carry no live volume and are skipped;
    /// at most `max_levels` levels per side are reported.
    pub fn depth_snapshot(&self, max_levels: usize) -> DepthSnapshot {
        let bids = self
            .bids
            .values()
            .rev()
            .filter(|level| level.total_volume > 0)
            .take(max_levels)
            .map(|level| DepthLevel::new(level.price, level.total_volume, level.order_count() as u32))
            .collect();
        let asks = self
            .asks
            .values()
            .filter(|level| level.total_volume > 0)
            .take(max_levels)
            .map(|level| DepthLevel::new(level.price, level.total_volume, level.order_count() as u32))
            .collect();
        DepthSnapshot::new(bids, asks, self.instrument_id)
    }
}

//--------------------------------------------------------------------------------------------------
//  TESTS
//--------------------------------------------------------------------------------------------------
// | Name                               | Description                                          |
// |------------------------------------|------------------------------------------------------|
// | test_empty_orderbook               | Verifies initial empty state                         |
// | test_single_order                  | Tests single order operations                        |
// | test_multiple_orders_same_price    | Tests volume aggregation at one level                |
// | test_price_levels                  | Tests best-price selection across levels             |
// | test_spread_and_mid                | Tests spread and mid calculations                    |
// | test_cancel_excludes_volume        | Cancel drops volume but keeps the level alive        |
// | test_cancel_idempotent             | Repeat cancels keep returning true                   |
// | test_match_at_maker_price          | Fills execute at the resting order's price           |
// | test_match_fifo_within_level       | FIFO consumption by arrival sequence                 |
// | test_match_sweeps_tombstones       | Cancelled heads are swept without trades             |
// | test_match_removes_empty_level     | Consumed levels disappear and best price advances    |
// | test_match_respects_limit          | The taker never crosses beyond its own limit         |
// | test_full_sweep_leaves_other_side  | Sweeping one side leaves the other untouched         |
//--------------------------------------------------------------------------------------------------
