use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::models::types::TypeError;

pub mod matching_engine;

/// Re-export key types for convenience
pub use self::matching_engine::{MatchResult, MatchingEngine};

/// Errors that can occur when submitting an order to the matching engine.
///
/// All variants are synchronous validation failures raised before any state
/// change; once validation passes, matching cannot fail. Cancellation never
/// errors, it reports unknown ids as `false`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MatchingError {
    /// The side could not be recognized. Only reachable through the text parse
    /// layer; the typed [`crate::Side`] enum cannot carry an invalid side.
    #[error("Invalid side specified: {0}")]
    InvalidSide(String),

    /// The price is not a positive value.
    #[error("Invalid price specified: {0}")]
    InvalidPrice(Decimal),

    /// The quantity is not a positive integer.
    #[error("Invalid quantity specified: {0}")]
    InvalidQuantity(u64),
}

impl From<TypeError> for MatchingError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::InvalidSide(s) => Self::InvalidSide(s),
        }
    }
}

/// Type alias for Result with MatchingError
pub type MatchingResult<T> = Result<T, MatchingError>;
