//--------------------------------------------------------------------------------------------------
// STRUCTS & ENUMS
//--------------------------------------------------------------------------------------------------
// | Name                    | Description                                       | Key Methods      |
// |-------------------------|---------------------------------------------------|------------------|
// | MatchingEngineEvent     | Event variants for the matching engine            | event_type       |
// | EventError              | Error types for event processing                  | error, from      |
//--------------------------------------------------------------------------------------------------

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::models::types::{Order, Trade};

/// Errors that can occur in the event system
#[derive(Error, Debug, Clone)]
pub enum EventError {
    /// Failed to process an event
    #[error("Failed to process event: {0}")]
    ProcessingError(String),
}

/// Type alias for Result with EventError
pub type EventResult<T> = Result<T, EventError>;

/// Represents events that can occur in the matching engine.
///
/// Events are emitted synchronously, in the order the underlying operations
/// execute. Trades emitted during a single submission appear best-price-first
/// and FIFO within a level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MatchingEngineEvent {
    /// Generated when an order passes validation and enters matching
    OrderAccepted {
        /// The order as accepted, before any fills
        order: Order,
        /// Timestamp when the event occurred
        timestamp: DateTime<Utc>,
    },

    /// Generated when a trade is executed
    TradeExecuted {
        /// The trade that was executed
        trade: Trade,
        /// Timestamp when the event occurred
        timestamp: DateTime<Utc>,
    },

    /// Generated when an order's unmatched remainder rests in the book
    OrderRested {
        /// The order as rested, with its residual quantity
        order: Order,
        /// Timestamp when the event occurred
        timestamp: DateTime<Utc>,
    },

    /// Generated when an order is flagged cancelled
    OrderCancelled {
        /// The id of the cancelled order
        order_id: u64,
        /// Timestamp when the event occurred
        timestamp: DateTime<Utc>,
    },
}

impl MatchingEngineEvent {
    /// Returns the event type name used by handlers to declare interest.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::OrderAccepted { .. } => "OrderAccepted",
            Self::TradeExecuted { .. } => "TradeExecuted",
            Self::OrderRested { .. } => "OrderRested",
            Self::OrderCancelled { .. } => "OrderCancelled",
        }
    }
}
