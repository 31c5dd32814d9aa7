//! Session test rig.

use tickflow_client::FlowClient;
use tickflow_core::{Scheduler, Store};
use tickflow_proto::{Event, Permission, SessionId, SessionToken, Tick};

use crate::{probe::Recorder, sim_env::SimEnv};

/// One store, one scheduler, and store-side recorders — the fixed part of
/// every integration test.
///
/// The recorders subscribe to the store's broadcasts before any client
/// attaches, so `store_ticks`/`store_events` observe exactly what the store
/// accepted, independent of client-side gating.
pub struct SessionRig {
    /// Seeded environment shared by the store and its clients.
    pub env: SimEnv,
    /// The run queue every deferred callback goes through.
    pub scheduler: Scheduler,
    /// The shared backend under test.
    pub store: Store<SimEnv>,
    /// Every tick the store accepted.
    pub store_ticks: Recorder<Tick>,
    /// Every event the store accepted.
    pub store_events: Recorder<Event>,
}

impl SessionRig {
    /// Build a rig seeded with `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        let env = SimEnv::with_seed(seed);
        let scheduler = Scheduler::new();
        let store = Store::new(env.clone());

        let store_ticks = Recorder::new();
        store.subscribe_ticks(store.allocate_owner(), store_ticks.handler());
        let store_events = Recorder::new();
        store.subscribe_events(store.allocate_owner(), store_events.handler());

        Self { env, scheduler, store, store_ticks, store_events }
    }

    /// A client bound to `session_id`, still in `Connecting`.
    pub fn client(&self, session_id: SessionId) -> FlowClient<SimEnv> {
        FlowClient::new(session_id, self.store.clone(), self.scheduler.clone())
    }

    /// A client opened against its own session id.
    pub fn open_client(&self, session_id: SessionId) -> FlowClient<SimEnv> {
        let client = self.client(session_id);
        client.open(session_id, |_| {});
        self.pump();
        client
    }

    /// An opened client authenticated with a freshly issued grant.
    pub fn authenticated_client(
        &self,
        session_id: SessionId,
        permission: Permission,
    ) -> FlowClient<SimEnv> {
        let client = self.open_client(session_id);
        let token = self.issue(permission);
        client.authenticate(token, |_| {});
        self.pump();
        client
    }

    /// Issue a token against the rig's store.
    pub fn issue(&self, permission: Permission) -> SessionToken {
        self.store.issue_token(permission)
    }

    /// Drain the scheduler. Returns how many tasks ran.
    pub fn pump(&self) -> usize {
        self.scheduler.run_until_idle()
    }
}
