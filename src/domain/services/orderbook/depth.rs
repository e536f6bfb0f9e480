//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// This module provides the aggregated market-data view of the order book.
// A snapshot collapses each price level into its live volume and order count,
// ordered best prices first on both sides.
//
// | Component                | Description                                                |
// |--------------------------|-----------------------------------------------------------|
// | PriceLevel               | Aggregated volume information at a specific price          |
// | DepthSnapshot            | Immutable point-in-time view of order book depth           |
//--------------------------------------------------------------------------------------------------

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents an aggregated price level in the depth view
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceLevel {
    /// The price for this level
    pub price: Decimal,
    /// Live (non-cancelled) volume at this price level
    pub volume: u64,
    /// Number of live orders at this price level
    pub order_count: u32,
}

impl PriceLevel {
    /// Creates a new price level
    #[inline]
    pub fn new(price: Decimal, volume: u64, order_count: u32) -> Self {
        Self {
            price,
            volume,
            order_count,
        }
    }
}

/// An immutable snapshot of order book depth at a specific point in time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepthSnapshot {
    /// Bid price levels ordered by price descending (best bids first)
    pub bids: Vec<PriceLevel>,
    /// Ask price levels ordered by price ascending (best asks first)
    pub asks: Vec<PriceLevel>,
    /// Timestamp when this snapshot was taken
    pub timestamp: DateTime<Utc>,
    /// Instrument ID this depth snapshot belongs to
    pub instrument_id: Uuid,
}

impl DepthSnapshot {
    /// Creates a new depth snapshot
    #[inline]
    pub fn new(bids: Vec<PriceLevel>, asks: Vec<PriceLevel>, instrument_id: Uuid) -> Self {
        Self {
            bids,
            asks,
            timestamp: Utc::now(),
            instrument_id,
        }
    }

    /// Returns the best bid price if available
    #[inline]
    pub fn best_bid(&self) -> Option<Decimal> {
        self.bids.first().map(|level| level.price)
    }

    /// Returns the best ask price if available
    #[inline]
    pub fn best_ask(&self) -> Option<Decimal> {
        self.asks.first().map(|level| level.price)
    }

    /// Returns the current spread (best ask - best bid)
    #[inline]
    pub fn spread(&self) -> Option<Decimal> {
        match (self.best_ask(), self.best_bid()) {
            (Some(ask), Some(bid)) => Some(ask - bid),
            _ => None,
        }
    }

    /// Returns the midpoint between best bid and best ask
    #[inline]
    pub fn mid_price(&self) -> Option<Decimal> {
        match (self.best_ask(), self.best_bid()) {
            (Some(ask), Some(bid)) => Some((ask + bid) / Decimal::TWO),
            _ => None,
        }
    }
}
