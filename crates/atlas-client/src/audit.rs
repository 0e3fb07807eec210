//! User-visible security event log.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of the logged operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    /// The operation succeeded.
    Success,
    /// The operation failed.
    Failure,
}

/// One security-relevant event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityEvent {
    /// What happened ("login", "refresh", "logout", "session_expired", …).
    pub kind: String,
    /// Whether it succeeded.
    pub status: EventStatus,
    /// When it happened.
    pub at: DateTime<Utc>,
    /// Free-form context.
    pub context: String,
}

impl SecurityEvent {
    /// Builds an event stamped now.
    pub fn new(kind: impl Into<String>, status: EventStatus, context: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            status,
            at: Utc::now(),
            context: context.into(),
        }
    }
}

/// Bounded, append-only ring buffer of security events.
///
/// The newest events win: pushing onto a full buffer drops the oldest.
#[derive(Debug, Clone)]
pub struct SecurityLog {
    events: VecDeque<SecurityEvent>,
    capacity: usize,
}

impl SecurityLog {
    /// Creates a log with the given capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends an event, evicting the oldest past capacity.
    pub fn push(&mut self, event: SecurityEvent) {
        if self.events.len() == self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    /// Snapshot of the buffered events, oldest first.
    pub fn events(&self) -> Vec<SecurityEvent> {
        self.events.iter().cloned().collect()
    }

    /// Number of buffered events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_buffer_drops_oldest() {
        let mut log = SecurityLog::new(10);
        for i in 0..15 {
            log.push(SecurityEvent::new(
                "login",
                EventStatus::Success,
                format!("event {i}"),
            ));
        }
        assert_eq!(log.len(), 10);
        let events = log.events();
        assert_eq!(events.first().unwrap().context, "event 5");
        assert_eq!(events.last().unwrap().context, "event 14");
    }
}
