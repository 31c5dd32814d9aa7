//! Shared in-memory session backend.
//!
//! One `Store` exists per simulation run; every session client of that run
//! attaches to it. The store owns the durable side of the protocol — tick
//! history, start points, issued credentials — and the broadcast side: two
//! [`Trigger`]s fanning accepted ticks and events out to every attached
//! client, synchronously, in attachment order.
//!
//! The store performs no gating of its own. Capability enforcement is the
//! session client's job; anything that reaches `send_tick`/`send_event`
//! here is accepted.

use std::{
    cell::RefCell,
    collections::{BTreeMap, HashMap},
    fmt,
    rc::Rc,
    time::Instant,
};

use tickflow_proto::{Event, Permission, SessionToken, StartPoint, StartPointQuery, Tick, TickList};

use crate::{
    env::Environment,
    pubsub::{OwnerId, Subscriber, Trigger},
};

/// Shared backend distributing ticks and events to all attached session
/// clients, persisting checkpoints, and performing authentication.
///
/// Cloning yields another handle to the same backend.
#[derive(Clone)]
pub struct Store<E: Environment> {
    env: E,
    created_at: Instant,
    inner: Rc<RefCell<StoreState>>,
}

struct StoreState {
    ticks: BTreeMap<u64, Tick>,
    start_points: BTreeMap<u64, StartPoint>,
    tokens: HashMap<SessionToken, Permission>,
    tick_trigger: Trigger<Tick>,
    event_trigger: Trigger<Event>,
    next_owner: u64,
    destroyed: bool,
}

impl<E: Environment> Store<E> {
    /// Create an empty store.
    pub fn new(env: E) -> Self {
        let created_at = env.now();
        Self {
            env,
            created_at,
            inner: Rc::new(RefCell::new(StoreState {
                ticks: BTreeMap::new(),
                start_points: BTreeMap::new(),
                tokens: HashMap::new(),
                tick_trigger: Trigger::new(),
                event_trigger: Trigger::new(),
                next_owner: 0,
                destroyed: false,
            })),
        }
    }

    /// Mint a unique owner identity for subscription scoping.
    pub fn allocate_owner(&self) -> OwnerId {
        let mut state = self.inner.borrow_mut();
        let owner = OwnerId::new(state.next_owner);
        state.next_owner += 1;
        owner
    }

    /// Mint a session token carrying `permission`.
    ///
    /// The token authenticates against this store until the store is
    /// destroyed.
    pub fn issue_token(&self, permission: Permission) -> SessionToken {
        let token = SessionToken::new(self.env.random_u128());
        let mut state = self.inner.borrow_mut();
        if !state.destroyed {
            state.tokens.insert(token, permission);
        }
        token
    }

    /// Resolve a token to its granted permission.
    pub fn authenticate(&self, token: &SessionToken) -> Option<Permission> {
        let state = self.inner.borrow();
        if state.destroyed {
            return None;
        }
        state.tokens.get(token).cloned()
    }

    /// Subscribe `owner` to the tick broadcast.
    pub fn subscribe_ticks(&self, owner: OwnerId, subscriber: Subscriber<Tick>) {
        let mut state = self.inner.borrow_mut();
        if state.destroyed {
            return;
        }
        state.tick_trigger.add(owner, subscriber);
    }

    /// Remove every tick subscription held by `owner`.
    pub fn unsubscribe_ticks(&self, owner: OwnerId) {
        self.inner.borrow_mut().tick_trigger.remove(owner);
    }

    /// Subscribe `owner` to the event broadcast.
    pub fn subscribe_events(&self, owner: OwnerId, subscriber: Subscriber<Event>) {
        let mut state = self.inner.borrow_mut();
        if state.destroyed {
            return;
        }
        state.event_trigger.add(owner, subscriber);
    }

    /// Remove every event subscription held by `owner`.
    pub fn unsubscribe_events(&self, owner: OwnerId) {
        self.inner.borrow_mut().event_trigger.remove(owner);
    }

    /// Accept a tick: record it into history and broadcast it.
    ///
    /// Ticks are keyed by frame; re-sending a frame overwrites the recorded
    /// tick and broadcasts again.
    pub fn send_tick(&self, tick: Tick) {
        let subscribers = {
            let mut state = self.inner.borrow_mut();
            if state.destroyed {
                return;
            }
            state.ticks.insert(tick.frame, tick.clone());
            state.tick_trigger.snapshot()
        };
        // Borrow released: subscribers may re-enter the store.
        for subscriber in subscribers {
            subscriber(&tick);
        }
    }

    /// Accept an event and broadcast it. Events are not persisted.
    pub fn send_event(&self, event: Event) {
        let subscribers = {
            let state = self.inner.borrow();
            if state.destroyed {
                return;
            }
            state.event_trigger.snapshot()
        };
        for subscriber in subscribers {
            subscriber(&event);
        }
    }

    /// Ticks in the inclusive frame range `from..=to`.
    ///
    /// Returns `None` when the range holds no ticks (or is inverted) —
    /// there is no empty-success result.
    pub fn get_tick_list(&self, from: u64, to: u64) -> Option<TickList> {
        if from > to {
            return None;
        }
        let state = self.inner.borrow();
        if state.destroyed {
            return None;
        }
        let ticks: Vec<Tick> = state.ticks.range(from..=to).map(|(_, t)| t.clone()).collect();
        match (ticks.first(), ticks.last()) {
            (Some(first), Some(last)) => {
                let (from, to) = (first.frame, last.frame);
                Some(TickList { from, to, ticks })
            },
            _ => None,
        }
    }

    /// Persist a checkpoint. A start point at the same frame is replaced.
    pub fn put_start_point(&self, start_point: StartPoint) {
        let mut state = self.inner.borrow_mut();
        if state.destroyed {
            return;
        }
        state.start_points.insert(start_point.frame, start_point);
    }

    /// Resolve a checkpoint query to the latest matching start point.
    pub fn get_start_point(&self, query: &StartPointQuery) -> Option<StartPoint> {
        let state = self.inner.borrow();
        if state.destroyed {
            return None;
        }
        if let Some(frame) = query.frame {
            state.start_points.range(..=frame).next_back().map(|(_, sp)| sp.clone())
        } else if let Some(timestamp) = query.timestamp {
            state
                .start_points
                .values()
                .filter(|sp| sp.timestamp <= timestamp)
                .max_by_key(|sp| sp.timestamp)
                .cloned()
        } else {
            state.start_points.values().next_back().cloned()
        }
    }

    /// Tear the backend down: drop all subscriptions, history, checkpoints,
    /// and issued tokens. Idempotent.
    pub fn destroy(&self) {
        {
            let mut state = self.inner.borrow_mut();
            if state.destroyed {
                return;
            }
            state.destroyed = true;
            state.tick_trigger.clear();
            state.event_trigger.clear();
            state.ticks.clear();
            state.start_points.clear();
            state.tokens.clear();
        }
        let uptime = self.env.now().duration_since(self.created_at);
        tracing::info!(?uptime, "store destroyed");
    }

    /// Whether the backend has been torn down.
    pub fn is_destroyed(&self) -> bool {
        self.inner.borrow().destroyed
    }
}

impl<E: Environment> fmt::Debug for Store<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.borrow();
        f.debug_struct("Store")
            .field("ticks", &state.ticks.len())
            .field("start_points", &state.start_points.len())
            .field("tick_subscribers", &state.tick_trigger.len())
            .field("event_subscribers", &state.event_trigger.len())
            .field("destroyed", &state.destroyed)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bytes::Bytes;

    use super::*;

    /// Deterministic environment for store tests.
    #[derive(Clone)]
    struct TestEnv;

    impl Environment for TestEnv {
        fn now(&self) -> Instant {
            Instant::now()
        }

        fn random_bytes(&self, buffer: &mut [u8]) {
            for (i, byte) in buffer.iter_mut().enumerate() {
                *byte = i as u8;
            }
        }
    }

    #[test]
    fn issued_token_authenticates() {
        let store = Store::new(TestEnv);
        let token = store.issue_token(Permission::active());

        assert_eq!(store.authenticate(&token), Some(Permission::active()));
    }

    #[test]
    fn unknown_token_is_rejected() {
        let store = Store::new(TestEnv);
        store.issue_token(Permission::active());

        assert_eq!(store.authenticate(&SessionToken::new(42)), None);
    }

    #[test]
    fn tick_range_is_inclusive() {
        let store = Store::new(TestEnv);
        for frame in [10, 20, 30, 40] {
            store.send_tick(Tick::new(frame));
        }

        let list = store.get_tick_list(20, 30).unwrap();
        assert_eq!(list.from, 20);
        assert_eq!(list.to, 30);
        assert_eq!(list.ticks.len(), 2);
    }

    #[test]
    fn empty_or_inverted_range_yields_nothing() {
        let store = Store::new(TestEnv);
        store.send_tick(Tick::new(5));

        assert!(store.get_tick_list(100, 200).is_none());
        assert!(store.get_tick_list(200, 100).is_none());
    }

    #[test]
    fn start_point_resolves_at_or_before_frame() {
        let store = Store::new(TestEnv);
        for (frame, timestamp) in [(0, 1000), (50, 2000), (100, 3000)] {
            store.put_start_point(StartPoint { frame, timestamp, data: Bytes::new() });
        }

        let sp = store.get_start_point(&StartPointQuery::at_frame(70)).unwrap();
        assert_eq!(sp.frame, 50);

        let sp = store.get_start_point(&StartPointQuery::at_timestamp(2500)).unwrap();
        assert_eq!(sp.timestamp, 2000);

        let sp = store.get_start_point(&StartPointQuery::latest()).unwrap();
        assert_eq!(sp.frame, 100);
    }

    #[test]
    fn start_point_before_all_frames_yields_nothing() {
        let store = Store::new(TestEnv);
        store.put_start_point(StartPoint { frame: 50, timestamp: 0, data: Bytes::new() });

        assert!(store.get_start_point(&StartPointQuery::at_frame(10)).is_none());
    }

    #[test]
    fn broadcast_reaches_subscribers_in_attachment_order() {
        let store = Store::new(TestEnv);
        let log = Rc::new(RefCell::new(Vec::new()));

        for tag in ["first", "second"] {
            let log = Rc::clone(&log);
            let owner = store.allocate_owner();
            store.subscribe_ticks(owner, Rc::new(move |t: &Tick| {
                log.borrow_mut().push((tag, t.frame));
            }));
        }

        store.send_tick(Tick::new(1));
        assert_eq!(*log.borrow(), vec![("first", 1), ("second", 1)]);
    }

    #[test]
    fn unsubscribed_owner_receives_nothing() {
        let store = Store::new(TestEnv);
        let log = Rc::new(RefCell::new(0u32));

        let owner = store.allocate_owner();
        let count = Rc::clone(&log);
        store.subscribe_events(owner, Rc::new(move |_: &Event| *count.borrow_mut() += 1));

        store.send_event(Event::new(1, 0));
        store.unsubscribe_events(owner);
        store.send_event(Event::new(2, 0));

        assert_eq!(*log.borrow(), 1);
    }

    #[test]
    fn destroy_is_idempotent_and_silences_the_store() {
        let store = Store::new(TestEnv);
        let token = store.issue_token(Permission::active());
        store.send_tick(Tick::new(1));

        store.destroy();
        store.destroy();

        assert!(store.is_destroyed());
        assert_eq!(store.authenticate(&token), None);
        assert!(store.get_tick_list(0, 100).is_none());

        // Accepting anything after teardown is a no-op.
        store.send_tick(Tick::new(2));
        assert!(store.get_tick_list(0, 100).is_none());
    }

    #[test]
    fn owners_stay_unique() {
        let store = Store::new(TestEnv);
        let a = store.allocate_owner();
        let b = store.allocate_owner();
        assert_ne!(a, b);
    }

    mod properties {
        use proptest::prelude::*;

        use super::*;

        proptest! {
            /// The range query returns exactly the recorded frames inside
            /// the inclusive bounds, and never an empty success.
            #[test]
            fn tick_list_matches_recorded_frames(
                frames in prop::collection::btree_set(0u64..200, 0..20),
                from in 0u64..200,
                to in 0u64..200,
            ) {
                let store = Store::new(TestEnv);
                for &frame in &frames {
                    store.send_tick(Tick::new(frame));
                }

                let expected: Vec<u64> =
                    frames.iter().copied().filter(|f| from <= *f && *f <= to).collect();

                match store.get_tick_list(from, to) {
                    Some(list) => {
                        let got: Vec<u64> = list.ticks.iter().map(|t| t.frame).collect();
                        prop_assert_eq!(&got, &expected);
                        prop_assert_eq!(list.from, expected[0]);
                        prop_assert_eq!(list.to, expected[expected.len() - 1]);
                    },
                    None => prop_assert!(expected.is_empty()),
                }
            }
        }
    }
}
