//! # atlas-client
//!
//! The browser-side half of the Atlas session model, expressed as an
//! explicit finite-state session object independent of any UI framework.
//! A UI layer subscribes to state changes rather than owning them.
//!
//! The controller holds the access token only in volatile memory (the
//! refresh token lives in a server-set HttpOnly cookie the script never
//! reads), schedules silent refresh ahead of access-token expiry, expires
//! the session after sustained inactivity, and broadcasts logout across
//! tabs.
//!
//! All timers are cooperative tokio tasks; tests drive them with the
//! paused clock.

pub mod audit;
pub mod broadcast;
pub mod controller;
pub mod state;
pub mod transport;

pub use audit::{SecurityEvent, SecurityLog};
pub use broadcast::{SessionBroadcast, TabBroadcast};
pub use controller::{ControllerConfig, SessionController};
pub use state::{ActivityKind, SessionState};
pub use transport::{AuthTransport, RefreshedToken, TransportError};
