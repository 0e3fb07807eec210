//! Session states and activity events.

use serde::{Deserialize, Serialize};

/// The client session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// No session: initial state, after logout, or after a failed refresh.
    SignedOut,
    /// Authenticated with a live access token and running timers.
    Active,
    /// The inactivity deadline elapsed with no qualifying input.
    Expired,
}

/// The fixed set of input events that reset the inactivity timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityKind {
    /// Pointer button pressed.
    PointerPress,
    /// Pointer moved.
    PointerMove,
    /// Key pressed.
    KeyPress,
    /// Page scrolled.
    Scroll,
    /// Touch started.
    TouchStart,
}
