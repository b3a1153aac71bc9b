//! Background tasks module
//!
//! The session engine task that serializes all session and timer events.

pub mod session_engine;

// Re-export main types
pub use session_engine::{
    SessionCommand, SessionEngine, SessionEvent, COMMAND_QUEUE_SIZE,
};
