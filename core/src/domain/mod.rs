//! Domain layer - Trigger line parsing and stream identifiers.
//!
//! These types have no I/O dependencies and can be tested in isolation.

mod stream;
mod trigger;

// Re-export all domain types
pub use stream::StreamId;
pub use trigger::{
    parse_trigger, Allocation, ForwardAllocation, FORWARD_LITERAL, TARGET_CAPACITY,
    TRIGGER_PREFIX,
};
