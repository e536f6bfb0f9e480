// Expose the modules
pub mod config;
pub mod domain;

// Re-export key types for easier usage
pub use config::EngineConfig;
pub use domain::models::types::{Order, Side, Trade, TypeError};
pub use domain::services::events::{
    EventError, EventHandler, EventLogger, EventResult, MatchingEngineEvent,
};
pub use domain::services::matching_engine::{
    MatchResult, MatchingEngine, MatchingError, MatchingResult,
};
pub use domain::services::orderbook::depth::{DepthSnapshot, PriceLevel as DepthLevel};
pub use domain::services::orderbook::orderbook::{OrderBook, PriceLevel};
