pub mod depth;
pub mod orderbook;

pub use depth::{DepthSnapshot, PriceLevel as DepthLevel};
pub use orderbook::{OrderBook, PriceLevel};
