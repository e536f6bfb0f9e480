//--------------------------------------------------------------------------------------------------
// STRUCTS & TRAITS
//--------------------------------------------------------------------------------------------------
// | Name                    | Description                                       | Key Methods      |
// |-------------------------|---------------------------------------------------|------------------|
// | EventHandler            | Trait for components that can handle events       | handle_event     |
// | EventLogger             | Built-in handler that logs every event            | handle_event     |
//--------------------------------------------------------------------------------------------------

use tracing::info;

use super::event_types::{EventResult, MatchingEngineEvent};

/// A synchronous observer of matching engine events.
///
/// The engine is single-threaded; handlers run inline on the engine's thread in
/// registration order, so they must return quickly. A handler only receives the
/// event types it declares in [`EventHandler::event_types`].
pub trait EventHandler {
    /// The event type names this handler wants to receive.
    fn event_types(&self) -> Vec<&'static str>;

    /// Processes a single event.
    ///
    /// # Errors
    /// A failing handler does not abort the operation that produced the event;
    /// the engine logs the error and carries on.
    fn handle_event(&self, event: &MatchingEngineEvent) -> EventResult<()>;
}

/// Built-in handler that logs every event through `tracing`.
#[derive(Debug, Default)]
pub struct EventLogger;

impl EventHandler for EventLogger {
    fn event_types(&self) -> Vec<&'static str> {
        vec![
            "OrderAccepted",
            "TradeExecuted",
            "OrderRested",
            "OrderCancelled",
        ]
    }

    fn handle_event(&self, event: &MatchingEngineEvent) -> EventResult<()> {
        match event {
            MatchingEngineEvent::OrderAccepted { order, .. } => {
                info!(
                    "order {} accepted: {} {} @ {}",
                    order.id, order.side, order.quantity, order.price
                );
            }
            MatchingEngineEvent::TradeExecuted { trade, .. } => {
                info!(
                    "trade executed: {} @ {} (maker {}, taker {})",
                    trade.quantity, trade.price, trade.maker_order_id, trade.taker_order_id
                );
            }
            MatchingEngineEvent::OrderRested { order, .. } => {
                info!(
                    "order {} rested: {} {} remaining @ {}",
                    order.id, order.side, order.remaining, order.price
                );
            }
            MatchingEngineEvent::OrderCancelled { order_id, .. } => {
                info!("order {} cancelled", order_id);
            }
        }
        Ok(())
    }
}
