//! Checkpoint snapshots.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// A checkpoint from which a session can start or resume without replaying
/// the full tick history.
///
/// `data` is an opaque snapshot produced by the simulation host; this core
/// only persists and retrieves it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartPoint {
    /// Frame the snapshot was taken at.
    pub frame: u64,
    /// Wall-clock timestamp of the snapshot, milliseconds since the epoch
    /// of the session host.
    pub timestamp: u64,
    /// Opaque snapshot payload.
    #[serde(default, skip_serializing_if = "Bytes::is_empty")]
    pub data: Bytes,
}

/// Lookup criteria for [`StartPoint`] retrieval.
///
/// Resolution picks the latest start point at or before the given frame or
/// timestamp; an empty query resolves to the latest stored start point.
/// A frame criterion takes precedence over a timestamp criterion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartPointQuery {
    /// Resolve against this frame.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame: Option<u64>,
    /// Resolve against this timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
}

impl StartPointQuery {
    /// The latest stored start point.
    pub fn latest() -> Self {
        Self::default()
    }

    /// The latest start point at or before `frame`.
    pub fn at_frame(frame: u64) -> Self {
        Self { frame: Some(frame), timestamp: None }
    }

    /// The latest start point at or before `timestamp`.
    pub fn at_timestamp(timestamp: u64) -> Self {
        Self { frame: None, timestamp: Some(timestamp) }
    }
}
