//! State management module
//!
//! The session and timer state machines plus the shared application state.

pub mod app_state;
pub mod session_state;
pub mod timer_state;

// Re-export main types
pub use app_state::AppState;
pub use session_state::{Phase, SessionRunner, SessionSnapshot, SetOutcome};
pub use timer_state::{RestTimer, TimerSignal, TimerState};
