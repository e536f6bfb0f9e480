//--------------------------------------------------------------------------------------------------
// TEST MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// Tests for the synchronous event surface: dispatch order, handler filtering,
// handler failure isolation and the built-in logger.
//--------------------------------------------------------------------------------------------------

use std::cell::RefCell;
use std::rc::Rc;

use rust_decimal_macros::dec;
use uuid::Uuid;

use crate::domain::models::types::Side;
use crate::domain::services::events::{
    EventError, EventHandler, EventLogger, EventResult, MatchingEngineEvent,
};
use crate::domain::services::matching_engine::MatchingEngine;

/// Test handler that records the type names of the events it receives.
struct CollectingHandler {
    interests: Vec<&'static str>,
    seen: Rc<RefCell<Vec<String>>>,
}

impl EventHandler for CollectingHandler {
    fn event_types(&self) -> Vec<&'static str> {
        self.interests.clone()
    }

    fn handle_event(&self, event: &MatchingEngineEvent) -> EventResult<()> {
        self.seen.borrow_mut().push(event.event_type().to_string());
        Ok(())
    }
}

/// Test handler that always fails.
struct FailingHandler;

impl EventHandler for FailingHandler {
    fn event_types(&self) -> Vec<&'static str> {
        vec!["OrderAccepted", "TradeExecuted", "OrderRested", "OrderCancelled"]
    }

    fn handle_event(&self, _event: &MatchingEngineEvent) -> EventResult<()> {
        Err(EventError::ProcessingError("handler on fire".to_string()))
    }
}

fn engine_with_collector(
    interests: Vec<&'static str>,
) -> (MatchingEngine, Rc<RefCell<Vec<String>>>) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let mut engine = MatchingEngine::new(Uuid::new_v4());
    engine.register_handler(Box::new(CollectingHandler {
        interests,
        seen: Rc::clone(&seen),
    }));
    (engine, seen)
}

/// Events fire in operation order: accept, fills, rest, cancel.
#[test]
fn test_event_sequence_for_partial_fill() {
    let (mut engine, seen) = engine_with_collector(vec![
        "OrderAccepted",
        "TradeExecuted",
        "OrderRested",
        "OrderCancelled",
    ]);

    engine.add_order(Side::Ask, dec!(100.0), 10).unwrap();
    let result = engine.add_order(Side::Bid, dec!(100.0), 25).unwrap();
    assert_eq!(result.trades.len(), 1);
    assert!(engine.cancel_order(result.order_id));

    let seen = seen.borrow();
    assert_eq!(
        *seen,
        vec![
            "OrderAccepted", // ask rests untouched
            "OrderRested",
            "OrderAccepted", // bid fills 10, rests 15
            "TradeExecuted",
            "OrderRested",
            "OrderCancelled",
        ]
    );
}

/// A handler only sees the event types it registered for.
#[test]
fn test_handler_filtering() {
    let (mut engine, seen) = engine_with_collector(vec!["TradeExecuted"]);

    engine.add_order(Side::Ask, dec!(100.0), 10).unwrap();
    engine.add_order(Side::Bid, dec!(100.0), 10).unwrap();

    let seen = seen.borrow();
    assert_eq!(*seen, vec!["TradeExecuted"]);
}

/// A failing handler is logged and skipped; the operation still succeeds and
/// later handlers still run.
#[test]
fn test_failing_handler_does_not_abort() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let mut engine = MatchingEngine::new(Uuid::new_v4());
    engine.register_handler(Box::new(FailingHandler));
    engine.register_handler(Box::new(CollectingHandler {
        interests: vec!["OrderAccepted", "OrderRested"],
        seen: Rc::clone(&seen),
    }));

    let result = engine.add_order(Side::Bid, dec!(99.0), 5).unwrap();
    assert!(engine.cancel_order(result.order_id));
    assert_eq!(*seen.borrow(), vec!["OrderAccepted", "OrderRested"]);
}

/// The built-in logger accepts every event type without error.
#[test]
fn test_event_logger() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let mut engine = MatchingEngine::new(Uuid::new_v4());
    engine.register_handler(Box::new(EventLogger));

    engine.add_order(Side::Ask, dec!(101.0), 50).unwrap();
    let result = engine.add_order(Side::Bid, dec!(101.0), 20).unwrap();
    assert_eq!(result.trades.len(), 1);
    assert!(engine.cancel_order(1));
}
