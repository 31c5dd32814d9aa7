//! Operations for model-based testing.
//!
//! Operations represent every action a session participant (or the shared
//! backend) can take. They are generated randomly and applied to both the
//! model and the real implementation.

use arbitrary::Arbitrary;
use tickflow_client::ErrorKind;

/// Observable resolution of one operation.
///
/// `None` for fire-and-forget operations (they never report), otherwise the
/// deferred callback's result collapsed to `Ok`/`Err(kind)`.
pub type OpOutcome = Option<Result<(), ErrorKind>>;

/// Operations that can be applied to a session client and its store.
///
/// Frames, codes, and priorities are `u8` to keep the exploration space
/// manageable; the real system widens them.
#[derive(Debug, Clone, Arbitrary)]
pub enum Operation {
    /// Open the client, with a session id that matches its binding or not.
    Open {
        /// Whether the id passed to `open` matches the bound session.
        matching_id: bool,
    },

    /// Authenticate with the issued token, or with a bogus one.
    Authenticate {
        /// Whether to present the token the store actually issued.
        valid_token: bool,
    },

    /// Close the client.
    Close,

    /// Destroy the client (precondition-free teardown).
    Destroy,

    /// Client submits a tick.
    SendTick {
        /// Frame of the submitted tick.
        frame: u8,
    },

    /// Client submits an event.
    SendEvent {
        /// Opaque event code.
        code: u8,
        /// Requested priority (clamped by the client's grant).
        priority: u8,
    },

    /// Client registers a tick handler.
    OnTick,

    /// Client registers an event handler.
    OnEvent,

    /// The backend accepts a tick from elsewhere and broadcasts it.
    BroadcastTick {
        /// Frame of the broadcast tick.
        frame: u8,
    },

    /// The backend accepts an event from elsewhere and broadcasts it.
    BroadcastEvent {
        /// Opaque event code.
        code: u8,
        /// Priority as broadcast (no clamping on this path).
        priority: u8,
    },

    /// Client queries the inclusive tick range.
    GetTickList {
        /// Range start.
        from: u8,
        /// Range end.
        to: u8,
    },
}
