//! Tick and event records.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Identifier of a session (one shared simulation run).
pub type SessionId = u64;

/// One atomic simulation step.
///
/// Ticks are ordered by `frame` and distributed verbatim to every attached
/// session; the client never looks inside them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tick {
    /// Position of this step in the simulation timeline.
    pub frame: u64,
    /// Events merged into this step, if any.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<Event>,
}

impl Tick {
    /// Create an empty tick for the given frame.
    pub fn new(frame: u64) -> Self {
        Self { frame, events: Vec::new() }
    }

    /// Create a tick carrying events.
    pub fn with_events(frame: u64, events: Vec<Event>) -> Self {
        Self { frame, events }
    }
}

/// An out-of-band occurrence submitted into the session's tick stream.
///
/// `priority` is the only field the client interprets: outgoing events are
/// clamped to the session's granted ceiling before transmission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Opaque event code.
    pub code: u32,
    /// Merge priority. Higher values are merged ahead of lower ones.
    pub priority: u32,
    /// Opaque payload.
    #[serde(default, skip_serializing_if = "Bytes::is_empty")]
    pub payload: Bytes,
}

impl Event {
    /// Create an event with an empty payload.
    pub fn new(code: u32, priority: u32) -> Self {
        Self { code, priority, payload: Bytes::new() }
    }

    /// Create an event with a payload.
    pub fn with_payload(code: u32, priority: u32, payload: Bytes) -> Self {
        Self { code, priority, payload }
    }
}

/// Result of an inclusive tick range query.
///
/// `from`/`to` are the frames of the first and last tick actually present,
/// which may be narrower than the queried bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickList {
    /// Frame of the first tick in `ticks`.
    pub from: u64,
    /// Frame of the last tick in `ticks`.
    pub to: u64,
    /// The ticks, in frame order.
    pub ticks: Vec<Tick>,
}
