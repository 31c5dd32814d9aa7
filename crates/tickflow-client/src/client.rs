//! Session client state machine.
//!
//! The `FlowClient` is the per-session facade over the shared [`Store`]. It
//! owns the session lifecycle, evaluates every operation against the
//! granted [`Permission`], multiplexes store broadcasts out to locally
//! registered handlers, and buffers events that arrive before the first
//! event handler exists.
//!
//! Two disjoint failure channels (see [`FlowError`]):
//!
//! - Fire-and-forget operations (`send_tick`, `on_tick`, `off_tick`,
//!   `send_event`, `on_event`, `off_event`) are silent policy no-ops when
//!   their preconditions are unmet
//! - Request/response operations resolve a deferred callback with either a
//!   payload or exactly one typed error, never synchronously

use std::{
    cell::RefCell,
    rc::Rc,
};

use tickflow_core::{Environment, OwnerId, Scheduler, Store};
use tickflow_proto::{
    Event, Permission, SessionId, SessionToken, StartPoint, StartPointQuery, StorageData,
    StorageKey, StorageValue, Tick, TickList,
};

use crate::error::FlowError;

/// Lifecycle states of a session client.
///
/// Transitions are monotonic: `Connecting → Open → Closed`, nothing is ever
/// revisited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Constructed, not yet attached to the store.
    Connecting,
    /// Attached; operations are accepted subject to permission gates.
    Open,
    /// Reserved for a two-phase shutdown. No transition currently enters
    /// this state.
    Closing,
    /// Detached. Terminal.
    Closed,
}

/// A registered tick callback.
///
/// Handlers are compared by identity ([`Rc::ptr_eq`]); keep the `Rc` around
/// to remove a registration later.
pub type TickHandler = Rc<dyn Fn(&Tick)>;

/// A registered event callback. Identity-compared like [`TickHandler`].
pub type EventHandler = Rc<dyn Fn(&Event)>;

/// Capabilities gating the request/response operations.
#[derive(Debug, Clone, Copy)]
enum Capability {
    ReadTick,
    WriteTick,
}

impl Capability {
    fn granted(self, permission: &Permission) -> bool {
        match self {
            Self::ReadTick => permission.read_tick,
            Self::WriteTick => permission.write_tick,
        }
    }
}

/// Per-session facade enforcing the lifecycle state machine and permission
/// checks, multiplexing subscriptions, and buffering undelivered events.
///
/// One client corresponds to one session participant. All clients of a run
/// share one [`Store`] and one [`Scheduler`]; the client itself holds no
/// threads or locks.
pub struct FlowClient<E: Environment> {
    scheduler: Scheduler,
    inner: Rc<RefCell<ClientInner<E>>>,
}

struct ClientInner<E: Environment> {
    session_id: SessionId,
    state: SessionState,
    /// `None` is the destroyed predicate: teardown takes the handle.
    store: Option<Store<E>>,
    owner: OwnerId,
    permission: Option<Permission>,
    tick_handlers: Vec<TickHandler>,
    event_handlers: Vec<EventHandler>,
    pending_events: Vec<Event>,
}

impl<E: Environment> ClientInner<E> {
    /// Gate for request/response operations: lifecycle state, then
    /// permission presence, then the specific capability, then backend
    /// availability.
    fn gate(&self, capability: Capability) -> Result<Store<E>, FlowError> {
        if self.state != SessionState::Open {
            return Err(FlowError::invalid_status("client is not open"));
        }
        if !self.permission.as_ref().is_some_and(|p| capability.granted(p)) {
            return match self.permission {
                Some(_) => Err(FlowError::permission("permission denied")),
                None => Err(FlowError::invalid_status("not authenticated")),
            };
        }
        self.store.clone().ok_or_else(|| FlowError::invalid_status("client is destroyed"))
    }
}

impl<E: Environment> FlowClient<E> {
    /// Create a client bound to `session_id`, backed by `store`, resolving
    /// its callbacks through `scheduler`.
    ///
    /// The client starts in [`SessionState::Connecting`]; call
    /// [`open`](Self::open) to attach it.
    pub fn new(session_id: SessionId, store: Store<E>, scheduler: Scheduler) -> Self {
        let owner = store.allocate_owner();
        Self {
            scheduler,
            inner: Rc::new(RefCell::new(ClientInner {
                session_id,
                state: SessionState::Connecting,
                store: Some(store),
                owner,
                permission: None,
                tick_handlers: Vec::new(),
                event_handlers: Vec::new(),
                pending_events: Vec::new(),
            })),
        }
    }

    /// The session this client is bound to.
    pub fn session_id(&self) -> SessionId {
        self.inner.borrow().session_id
    }

    /// Current lifecycle state. No side effects.
    pub fn get_state(&self) -> SessionState {
        self.inner.borrow().state
    }

    /// Whether teardown has run. The only precondition-free predicate
    /// besides [`destroy`](Self::destroy) itself.
    pub fn is_destroyed(&self) -> bool {
        self.inner.borrow().store.is_none()
    }

    /// Attach to the store's broadcasts and transition to
    /// [`SessionState::Open`].
    ///
    /// The transition and the attachment are unconditional; only the
    /// callback result depends on `session_id`. A mismatch against the
    /// bound session resolves the callback with a runtime error while the
    /// client still opens.
    pub fn open<F>(&self, session_id: SessionId, callback: F)
    where
        F: FnOnce(Result<(), FlowError>) + 'static,
    {
        tracing::info!(session_id, "FlowClient::open");

        let (bound_id, store, owner) = {
            let inner = self.inner.borrow();
            (inner.session_id, inner.store.clone(), inner.owner)
        };
        let Some(store) = store else {
            self.scheduler
                .defer(move || callback(Err(FlowError::invalid_status("client is destroyed"))));
            return;
        };

        let weak = Rc::downgrade(&self.inner);
        store.subscribe_ticks(
            owner,
            Rc::new(move |tick: &Tick| {
                if let Some(inner) = weak.upgrade() {
                    dispatch_tick(&inner, tick);
                }
            }),
        );
        let weak = Rc::downgrade(&self.inner);
        store.subscribe_events(
            owner,
            Rc::new(move |event: &Event| {
                if let Some(inner) = weak.upgrade() {
                    dispatch_event(&inner, event);
                }
            }),
        );
        self.inner.borrow_mut().state = SessionState::Open;

        self.scheduler.defer(move || {
            if bound_id == session_id {
                callback(Ok(()));
            } else {
                callback(Err(FlowError::runtime("Invalid session id")));
            }
        });
    }

    /// Detach from the store and transition to [`SessionState::Closed`].
    ///
    /// Requires [`SessionState::Open`]; otherwise the callback resolves
    /// with an invalid-status error and nothing changes.
    pub fn close<F>(&self, callback: F)
    where
        F: FnOnce(Result<(), FlowError>) + 'static,
    {
        tracing::info!(session_id = self.session_id(), "FlowClient::close");
        if self.get_state() != SessionState::Open {
            self.scheduler
                .defer(move || callback(Err(FlowError::invalid_status("client is not open"))));
            return;
        }

        self.destroy();
        self.inner.borrow_mut().state = SessionState::Closed;

        self.scheduler.defer(move || callback(Ok(())));
    }

    /// Release everything the client holds: store subscriptions, handler
    /// lists, pending buffer, and permission.
    ///
    /// Callable at any time, idempotent, and does not touch
    /// [`SessionState`]. Detaching from the store is skipped when the store
    /// itself is already destroyed.
    pub fn destroy(&self) {
        let (store, owner) = {
            let mut inner = self.inner.borrow_mut();
            let Some(store) = inner.store.take() else {
                return;
            };
            inner.permission = None;
            inner.tick_handlers.clear();
            inner.event_handlers.clear();
            inner.pending_events.clear();
            (store, inner.owner)
        };
        if !store.is_destroyed() {
            store.unsubscribe_ticks(owner);
            store.unsubscribe_events(owner);
        }
    }

    /// Exchange `token` for this session's [`Permission`].
    ///
    /// Requires [`SessionState::Open`] at resolution time. A token the
    /// store rejects resolves with an invalid-status error and leaves the
    /// stored permission unset; a granted permission replaces any previous
    /// one.
    pub fn authenticate<F>(&self, token: SessionToken, callback: F)
    where
        F: FnOnce(Result<Permission, FlowError>) + 'static,
    {
        let inner = Rc::clone(&self.inner);
        self.scheduler.defer(move || {
            let gate = {
                let guard = inner.borrow();
                if guard.state == SessionState::Open {
                    guard
                        .store
                        .clone()
                        .ok_or_else(|| FlowError::invalid_status("client is destroyed"))
                } else {
                    Err(FlowError::invalid_status("client is not open"))
                }
            };
            let store = match gate {
                Ok(store) => store,
                Err(err) => {
                    callback(Err(err));
                    return;
                },
            };
            match store.authenticate(&token) {
                Some(permission) => {
                    let session_id = {
                        let mut guard = inner.borrow_mut();
                        guard.permission = Some(permission.clone());
                        guard.session_id
                    };
                    tracing::info!(session_id, ?permission, "FlowClient::authenticate");
                    callback(Ok(permission));
                },
                None => callback(Err(FlowError::invalid_status("Invalid session token"))),
            }
        });
    }

    /// Submit a tick to the store.
    ///
    /// Silent no-op unless the client is open, authenticated, and granted
    /// `write_tick`.
    pub fn send_tick(&self, tick: Tick) {
        let store = {
            let guard = self.inner.borrow();
            if guard.state != SessionState::Open {
                return;
            }
            let Some(permission) = guard.permission.as_ref() else {
                return;
            };
            if !permission.write_tick {
                return;
            }
            match guard.store.clone() {
                Some(store) => store,
                None => return,
            }
        };
        store.send_tick(tick);
    }

    /// Register a tick handler. Handlers fire in registration order.
    ///
    /// Silent no-op unless the client is open, authenticated, and granted
    /// `subscribe_tick`.
    pub fn on_tick(&self, handler: TickHandler) {
        let mut guard = self.inner.borrow_mut();
        if guard.state != SessionState::Open {
            return;
        }
        let Some(permission) = guard.permission.as_ref() else {
            return;
        };
        if !permission.subscribe_tick {
            return;
        }
        guard.tick_handlers.push(handler);
    }

    /// Remove a tick handler by identity. Silent no-op when the handler is
    /// not registered, or before authentication, or when not open.
    pub fn off_tick(&self, handler: &TickHandler) {
        let mut guard = self.inner.borrow_mut();
        if guard.state != SessionState::Open || guard.permission.is_none() {
            return;
        }
        guard.tick_handlers.retain(|h| !Rc::ptr_eq(h, handler));
    }

    /// Submit an event to the store, clamping its priority to the granted
    /// ceiling (the priority is only ever lowered).
    ///
    /// Silent no-op unless the client is open, authenticated, and granted
    /// `send_event`.
    pub fn send_event(&self, mut event: Event) {
        let store = {
            let guard = self.inner.borrow();
            if guard.state != SessionState::Open {
                return;
            }
            let Some(permission) = guard.permission.as_ref() else {
                return;
            };
            if !permission.send_event {
                return;
            }
            event.priority = event.priority.min(permission.max_event_priority);
            match guard.store.clone() {
                Some(store) => store,
                None => return,
            }
        };
        store.send_event(event);
    }

    /// Register an event handler, then drain the pending buffer.
    ///
    /// Events broadcast while no handler was registered are buffered; the
    /// registration that ends that window delivers every buffered event to
    /// every handler present, in arrival order, and empties the buffer.
    ///
    /// Silent no-op unless the client is open, authenticated, and granted
    /// `subscribe_event`.
    pub fn on_event(&self, handler: EventHandler) {
        let flush = {
            let mut guard = self.inner.borrow_mut();
            if guard.state != SessionState::Open {
                return;
            }
            let Some(permission) = guard.permission.as_ref() else {
                return;
            };
            if !permission.subscribe_event {
                return;
            }
            guard.event_handlers.push(handler);

            if guard.pending_events.is_empty() {
                None
            } else {
                Some((guard.event_handlers.clone(), std::mem::take(&mut guard.pending_events)))
            }
        };
        if let Some((handlers, events)) = flush {
            for handler in handlers {
                for event in &events {
                    handler(event);
                }
            }
        }
    }

    /// Remove an event handler by identity. Silent no-op when absent,
    /// before authentication, or when not open.
    pub fn off_event(&self, handler: &EventHandler) {
        let mut guard = self.inner.borrow_mut();
        if guard.state != SessionState::Open || guard.permission.is_none() {
            return;
        }
        guard.event_handlers.retain(|h| !Rc::ptr_eq(h, handler));
    }

    /// Fetch the ticks in the inclusive frame range `from..=to`.
    ///
    /// Requires `read_tick`. A range the store holds no ticks for resolves
    /// with a runtime error, never an empty success.
    pub fn get_tick_list<F>(&self, from: u64, to: u64, callback: F)
    where
        F: FnOnce(Result<TickList, FlowError>) + 'static,
    {
        let inner = Rc::clone(&self.inner);
        self.scheduler.defer(move || {
            let store = match inner.borrow().gate(Capability::ReadTick) {
                Ok(store) => store,
                Err(err) => {
                    callback(Err(err));
                    return;
                },
            };
            match store.get_tick_list(from, to) {
                Some(list) => callback(Ok(list)),
                None => callback(Err(FlowError::runtime("No tick list"))),
            }
        });
    }

    /// Persist a checkpoint. Requires `write_tick`. Success carries no
    /// payload.
    pub fn put_start_point<F>(&self, start_point: StartPoint, callback: F)
    where
        F: FnOnce(Result<(), FlowError>) + 'static,
    {
        let inner = Rc::clone(&self.inner);
        self.scheduler.defer(move || {
            let store = match inner.borrow().gate(Capability::WriteTick) {
                Ok(store) => store,
                Err(err) => {
                    callback(Err(err));
                    return;
                },
            };
            store.put_start_point(start_point);
            callback(Ok(()));
        });
    }

    /// Resolve a checkpoint query. Requires `read_tick`. No matching start
    /// point resolves with a runtime error.
    pub fn get_start_point<F>(&self, query: StartPointQuery, callback: F)
    where
        F: FnOnce(Result<StartPoint, FlowError>) + 'static,
    {
        let inner = Rc::clone(&self.inner);
        self.scheduler.defer(move || {
            let store = match inner.borrow().gate(Capability::ReadTick) {
                Ok(store) => store,
                Err(err) => {
                    callback(Err(err));
                    return;
                },
            };
            match store.get_start_point(&query) {
                Some(start_point) => callback(Ok(start_point)),
                None => callback(Err(FlowError::runtime("No start point"))),
            }
        });
    }

    /// Key/value storage is unsupported: always resolves with a
    /// not-implemented error.
    pub fn put_storage_data<F>(&self, _key: StorageKey, _value: StorageValue, callback: F)
    where
        F: FnOnce(Result<(), FlowError>) + 'static,
    {
        self.scheduler
            .defer(move || callback(Err(FlowError::not_implemented("Storage is not supported"))));
    }

    /// Key/value storage is unsupported: always resolves with a
    /// not-implemented error.
    pub fn get_storage_data<F>(&self, _keys: Vec<StorageKey>, callback: F)
    where
        F: FnOnce(Result<Vec<StorageData>, FlowError>) + 'static,
    {
        self.scheduler
            .defer(move || callback(Err(FlowError::not_implemented("Storage is not supported"))));
    }
}

impl<E: Environment> std::fmt::Debug for FlowClient<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("FlowClient")
            .field("session_id", &inner.session_id)
            .field("state", &inner.state)
            .field("authenticated", &inner.permission.is_some())
            .field("tick_handlers", &inner.tick_handlers.len())
            .field("event_handlers", &inner.event_handlers.len())
            .field("pending_events", &inner.pending_events.len())
            .field("destroyed", &inner.store.is_none())
            .finish()
    }
}

/// Fan a broadcast tick out to the registered handlers, in registration
/// order.
fn dispatch_tick<E: Environment>(inner: &Rc<RefCell<ClientInner<E>>>, tick: &Tick) {
    // Snapshot, then invoke with the borrow released: handlers may re-enter
    // the client.
    let handlers = inner.borrow().tick_handlers.clone();
    for handler in handlers {
        handler(tick);
    }
}

/// Fan a broadcast event out, or buffer it while no handler is registered.
fn dispatch_event<E: Environment>(inner: &Rc<RefCell<ClientInner<E>>>, event: &Event) {
    let handlers = {
        let mut guard = inner.borrow_mut();
        if guard.event_handlers.is_empty() {
            guard.pending_events.push(event.clone());
            return;
        }
        guard.event_handlers.clone()
    };
    for handler in handlers {
        handler(event);
    }
}
