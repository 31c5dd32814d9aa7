//! Capability grants.

use serde::{Deserialize, Serialize};

/// Capability set granted to a session after authentication.
///
/// A `Permission` is an immutable value: the client stores the grant as-is
/// and evaluates each operation against the named capability it requires.
/// There is no capability inheritance or wildcarding — every gate is an
/// explicit boolean predicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    /// May submit ticks to the store.
    pub write_tick: bool,
    /// May register tick handlers.
    pub subscribe_tick: bool,
    /// May read tick history and start points.
    pub read_tick: bool,
    /// May submit events.
    pub send_event: bool,
    /// May register event handlers.
    pub subscribe_event: bool,
    /// Ceiling for submitted event priorities. Outgoing events are clamped
    /// down to this value, never raised.
    pub max_event_priority: u32,
}

impl Permission {
    /// Grant issued to the session driving the simulation: full access.
    pub fn active() -> Self {
        Self {
            write_tick: true,
            subscribe_tick: true,
            read_tick: true,
            send_event: true,
            subscribe_event: true,
            max_event_priority: 2,
        }
    }

    /// Grant issued to follower sessions: consume ticks, submit events,
    /// never produce ticks or observe the raw event stream.
    pub fn passive() -> Self {
        Self {
            write_tick: false,
            subscribe_tick: true,
            read_tick: true,
            send_event: true,
            subscribe_event: false,
            max_event_priority: 2,
        }
    }
}
