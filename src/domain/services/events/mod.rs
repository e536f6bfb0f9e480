//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// This module implements the event surface of the matching engine. Events are
// dispatched synchronously and inline: the engine is single-threaded by design,
// so there is no bus, no buffering and no background task.
//
// | Component                | Description                                                |
// |--------------------------|-----------------------------------------------------------|
// | MatchingEngineEvent      | Enum representing all possible events in the system       |
// | EventHandler             | Trait for components that can handle events               |
// | EventLogger              | Built-in handler that logs events via tracing             |
//--------------------------------------------------------------------------------------------------

mod event_types;
mod handlers;

#[cfg(test)]
mod tests;

// Re-exports
pub use event_types::{EventError, EventResult, MatchingEngineEvent};
pub use handlers::{EventHandler, EventLogger};
