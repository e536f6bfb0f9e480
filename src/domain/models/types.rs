//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// This module defines the core data types used throughout the matching engine:
// orders, trades and the side enum, plus the validation errors of the parse layer.
//
// | Section            | Description                                                      |
// |--------------------|------------------------------------------------------------------|
// | ENUMS              | Side of an order (Bid/Ask).                                      |
// | STRUCTS            | Defines the structure of Orders and Trades.                      |
// | Potential Errors   | Defines errors related to type handling.                         |
// | TESTS              | Contains unit tests for the defined types.                       |
//--------------------------------------------------------------------------------------------------

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

//--------------------------------------------------------------------------------------------------
//  ENUMS
//--------------------------------------------------------------------------------------------------
// | Name          | Description                                 |
// |---------------|---------------------------------------------|
// | Side          | Represents the side of an order (Buy/Sell). |
//--------------------------------------------------------------------------------------------------

/// Represents the side of an order (Buy or Sell).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// A buy order (also called buy).
    Bid,
    /// A sell order (also called sell).
    Ask,
}

impl Side {
    /// Returns the opposite side, i.e. the side an incoming order matches against.
    #[inline]
    pub fn opposite(&self) -> Self {
        match self {
            Self::Bid => Self::Ask,
            Self::Ask => Self::Bid,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bid => write!(f, "bid"),
            Self::Ask => write!(f, "ask"),
        }
    }
}

impl FromStr for Side {
    type Err = TypeError;

    /// Parses a side from client text. Both the buy/sell and bid/ask spellings
    /// are accepted, case-insensitively.
    ///
    /// # Errors
    /// Returns `TypeError::InvalidSide` for any unrecognized value.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "buy" | "bid" => Ok(Self::Bid),
            "sell" | "ask" => Ok(Self::Ask),
            _ => Err(TypeError::InvalidSide(s.to_string())),
        }
    }
}

//--------------------------------------------------------------------------------------------------
//  STRUCTS
//--------------------------------------------------------------------------------------------------
// | Name          | Description                                   |
// |---------------|-----------------------------------------------|
// | Order         | Represents a resting or incoming limit order. |
// | Trade         | Represents a completed trade between orders.  |
//--------------------------------------------------------------------------------------------------

/// Represents a limit order accepted by the engine.
///
/// Prices are stored as [`Decimal`] (decimal fixed-point), quantities as whole
/// base units. The `sequence_id` assigned at acceptance is the authoritative
/// time-priority tie-breaker; `created_at` is informational.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Unique identifier, assigned by the engine as a monotonically increasing
    /// sequence starting at 1. Never reused.
    pub id: u64,
    /// Identifier for the instrument being traded.
    pub instrument_id: Uuid,
    /// Side of the order (Buy or Sell).
    pub side: Side,
    /// Limit price. Always positive.
    pub price: Decimal,
    /// Original order quantity in base units.
    pub quantity: u64,
    /// Remaining quantity available to trade in base units.
    pub remaining: u64,
    /// Sequence number assigned by the engine upon acceptance (for time priority).
    pub sequence_id: u64,
    /// Lazy-cancellation flag. Once set it is never cleared; a cancelled order
    /// counts as zero available liquidity until it is physically swept.
    pub cancelled: bool,
    /// Timestamp of order creation.
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Creates a new order with its full remaining quantity.
    pub fn new(
        id: u64,
        instrument_id: Uuid,
        side: Side,
        price: Decimal,
        quantity: u64,
        sequence_id: u64,
    ) -> Self {
        Self {
            id,
            instrument_id,
            side,
            price,
            quantity,
            remaining: quantity,
            sequence_id,
            cancelled: false,
            created_at: Utc::now(),
        }
    }

    /// Reduces the remaining quantity by a fill.
    ///
    /// The caller guarantees `quantity <= self.remaining`; fills are sized with
    /// `min(taker.remaining, maker.remaining)` during matching.
    #[inline]
    pub fn fill(&mut self, quantity: u64) {
        self.remaining = self.remaining.saturating_sub(quantity);
    }

    /// Returns true once the order has no residual quantity.
    #[inline]
    pub fn is_filled(&self) -> bool {
        self.remaining == 0
    }

    /// Sets the cancellation flag. Physical removal from the book is deferred
    /// until the order reaches the head of its queue.
    #[inline]
    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    /// Returns true if this order's limit price crosses the given opposite-side
    /// best price (Bid: price >= best ask, Ask: price <= best bid).
    #[inline]
    pub fn crosses(&self, opposite_best: Decimal) -> bool {
        match self.side {
            Side::Bid => self.price >= opposite_best,
            Side::Ask => self.price <= opposite_best,
        }
    }
}

/// Represents a completed trade resulting from matching two orders.
///
/// The price is always the resting (maker) order's price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    /// Unique identifier for the trade.
    pub id: Uuid,
    /// Identifier for the instrument traded.
    pub instrument_id: Uuid,
    /// ID of the order that was resting on the book (maker).
    pub maker_order_id: u64,
    /// ID of the order that matched the resting order (taker).
    pub taker_order_id: u64,
    /// Price at which the trade occurred.
    pub price: Decimal,
    /// Quantity traded in base units.
    pub quantity: u64,
    /// Timestamp when the trade occurred.
    pub created_at: DateTime<Utc>,
}

impl Trade {
    /// Creates a trade record for a fill executed at the maker's price.
    pub fn new(
        instrument_id: Uuid,
        maker_order_id: u64,
        taker_order_id: u64,
        price: Decimal,
        quantity: u64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            instrument_id,
            maker_order_id,
            taker_order_id,
            price,
            quantity,
            created_at: Utc::now(),
        }
    }
}

//--------------------------------------------------------------------------------------------------
//  Potential Errors
//--------------------------------------------------------------------------------------------------

/// Represents errors that can occur during type validation or conversion within this module.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TypeError {
    /// Occurs when attempting to create a `Side` from an unrecognized string or value.
    #[error("Invalid side specified: {0}")]
    InvalidSide(String),
}

//--------------------------------------------------------------------------------------------------
//  TESTS
//--------------------------------------------------------------------------------------------------
// | Name                       | Description                                      |
// |----------------------------|--------------------------------------------------|
// | test_order_creation        | Verify basic Order struct instantiation.         |
// | test_order_fill            | Verify fills reduce the residual.                |
// | test_order_cancel_flag     | Verify the cancellation flag is sticky.          |
// | test_crossing              | Verify the crossing predicate per side.          |
// | test_side_parsing          | Verify FromStr accepts both spellings.           |
// | test_trade_creation        | Verify basic Trade struct instantiation.         |
//--------------------------------------------------------------------------------------------------
