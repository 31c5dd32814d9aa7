//! Model session client.
//!
//! Tracks the logical state transitions of one client attached to one
//! store: lifecycle, grant, attachment and handler counts, the pending
//! event buffer, and what the store accepted and the handlers received.

use std::collections::BTreeSet;

use tickflow_client::ErrorKind;

use super::operation::{OpOutcome, Operation};

/// Priority ceiling of the grant the model's valid token carries
/// (the active grant).
const MAX_EVENT_PRIORITY: u8 = 2;

/// Lifecycle states in the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelState {
    /// Not yet attached.
    Connecting,
    /// Attached.
    Open,
    /// Detached. Terminal.
    Closed,
}

/// Model client state.
///
/// The observable fields mirror what the test rig records on the real side:
/// everything the store accepted and everything the client's handlers were
/// invoked with.
#[derive(Debug, Clone)]
pub struct ModelFlow {
    /// Lifecycle state. Destroy does not touch it.
    pub state: ModelState,
    /// Whether teardown has run.
    pub destroyed: bool,
    authenticated: bool,
    /// Trigger attachments held at the store. Each `open` adds one; every
    /// broadcast reaches the client once per attachment.
    attach_count: usize,
    tick_handlers: usize,
    event_handlers: usize,
    buffered: Vec<(u8, u8)>,
    store_frames: BTreeSet<u8>,
    /// Every tick frame the store accepted, in order.
    pub store_tick_log: Vec<u8>,
    /// Every `(code, priority)` event the store accepted, in order.
    pub store_event_log: Vec<(u8, u8)>,
    /// Frame per handler invocation, in order.
    pub delivered_ticks: Vec<u8>,
    /// `(code, priority)` per handler invocation, in order.
    pub delivered_events: Vec<(u8, u8)>,
}

impl ModelFlow {
    /// A freshly constructed client: connecting, unauthenticated.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: ModelState::Connecting,
            destroyed: false,
            authenticated: false,
            attach_count: 0,
            tick_handlers: 0,
            event_handlers: 0,
            buffered: Vec::new(),
            store_frames: BTreeSet::new(),
            store_tick_log: Vec::new(),
            store_event_log: Vec::new(),
            delivered_ticks: Vec::new(),
            delivered_events: Vec::new(),
        }
    }

    /// Apply one operation and return its observable outcome.
    pub fn apply(&mut self, op: &Operation) -> OpOutcome {
        match *op {
            Operation::Open { matching_id } => {
                if self.destroyed {
                    return Some(Err(ErrorKind::InvalidStatus));
                }
                // The transition and the attachment are unconditional; only
                // the callback result depends on the id.
                self.attach_count += 1;
                self.state = ModelState::Open;
                Some(if matching_id { Ok(()) } else { Err(ErrorKind::RuntimeError) })
            },

            Operation::Authenticate { valid_token } => {
                if self.state != ModelState::Open || self.destroyed {
                    return Some(Err(ErrorKind::InvalidStatus));
                }
                if valid_token {
                    self.authenticated = true;
                    Some(Ok(()))
                } else {
                    Some(Err(ErrorKind::InvalidStatus))
                }
            },

            Operation::Close => {
                if self.state != ModelState::Open {
                    return Some(Err(ErrorKind::InvalidStatus));
                }
                self.release();
                self.state = ModelState::Closed;
                Some(Ok(()))
            },

            Operation::Destroy => {
                if !self.destroyed {
                    self.release();
                }
                None
            },

            Operation::SendTick { frame } => {
                if self.gated() {
                    self.accept_tick(frame);
                }
                None
            },

            Operation::SendEvent { code, priority } => {
                if self.gated() {
                    self.accept_event(code, priority.min(MAX_EVENT_PRIORITY));
                }
                None
            },

            Operation::OnTick => {
                if self.gated() {
                    self.tick_handlers += 1;
                }
                None
            },

            Operation::OnEvent => {
                if self.gated() {
                    self.event_handlers += 1;
                    if !self.buffered.is_empty() {
                        let events = std::mem::take(&mut self.buffered);
                        for _ in 0..self.event_handlers {
                            self.delivered_events.extend(events.iter().copied());
                        }
                    }
                }
                None
            },

            Operation::BroadcastTick { frame } => {
                self.accept_tick(frame);
                None
            },

            Operation::BroadcastEvent { code, priority } => {
                self.accept_event(code, priority);
                None
            },

            Operation::GetTickList { from, to } => {
                if self.state != ModelState::Open || !self.authenticated {
                    return Some(Err(ErrorKind::InvalidStatus));
                }
                let count =
                    if from > to { 0 } else { self.store_frames.range(from..=to).count() };
                Some(if count == 0 { Err(ErrorKind::RuntimeError) } else { Ok(()) })
            },
        }
    }

    /// Gate shared by the fire-and-forget operations: open and granted.
    /// The active grant carries every capability, so the specific
    /// capability never fails here; `authenticated` is false once destroyed.
    fn gated(&self) -> bool {
        self.state == ModelState::Open && self.authenticated
    }

    /// Teardown: everything the client holds is released; the store keeps
    /// its history.
    fn release(&mut self) {
        self.destroyed = true;
        self.authenticated = false;
        self.attach_count = 0;
        self.tick_handlers = 0;
        self.event_handlers = 0;
        self.buffered.clear();
    }

    /// The store accepts a tick and broadcasts it: once per attachment,
    /// fanned out to every tick handler.
    fn accept_tick(&mut self, frame: u8) {
        self.store_frames.insert(frame);
        self.store_tick_log.push(frame);
        for _ in 0..self.attach_count {
            for _ in 0..self.tick_handlers {
                self.delivered_ticks.push(frame);
            }
        }
    }

    /// The store accepts an event and broadcasts it: per attachment, either
    /// buffered (no handlers yet) or fanned out to every event handler.
    fn accept_event(&mut self, code: u8, priority: u8) {
        self.store_event_log.push((code, priority));
        for _ in 0..self.attach_count {
            if self.event_handlers == 0 {
                self.buffered.push((code, priority));
            } else {
                for _ in 0..self.event_handlers {
                    self.delivered_events.push((code, priority));
                }
            }
        }
    }
}

impl Default for ModelFlow {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silent_before_authentication() {
        let mut model = ModelFlow::new();
        model.apply(&Operation::Open { matching_id: true });
        model.apply(&Operation::SendTick { frame: 1 });

        assert!(model.store_tick_log.is_empty());
    }

    #[test]
    fn buffered_events_flush_on_first_handler() {
        let mut model = ModelFlow::new();
        model.apply(&Operation::Open { matching_id: true });
        model.apply(&Operation::Authenticate { valid_token: true });
        model.apply(&Operation::BroadcastEvent { code: 1, priority: 0 });
        model.apply(&Operation::BroadcastEvent { code: 2, priority: 0 });
        assert!(model.delivered_events.is_empty());

        model.apply(&Operation::OnEvent);
        assert_eq!(model.delivered_events, vec![(1, 0), (2, 0)]);

        // Buffer emptied: the next registration delivers nothing.
        model.apply(&Operation::OnEvent);
        assert_eq!(model.delivered_events.len(), 2);
    }

    #[test]
    fn destroy_clears_the_grant_but_not_the_state() {
        let mut model = ModelFlow::new();
        model.apply(&Operation::Open { matching_id: true });
        model.apply(&Operation::Authenticate { valid_token: true });
        model.apply(&Operation::Destroy);

        assert!(model.destroyed);
        assert_eq!(model.state, ModelState::Open);

        model.apply(&Operation::SendTick { frame: 1 });
        assert!(model.store_tick_log.is_empty());
    }
}
