//! Fuzz target for the [`FlowClient`] session state machine
//!
//! Prevent permission bypass and lifecycle corruption via arbitrary
//! operation interleavings
//!
//! # Strategy
//!
//! - Event sequences: arbitrary mixes of lifecycle, channel, and
//!   request/response operations
//! - Credential probing: valid and bogus tokens in any order
//! - Teardown probing: close/destroy at every point, including repeatedly
//!
//! # Invariants
//!
//! - Lifecycle rank (`Connecting < Open < Closing < Closed`) never
//!   decreases
//! - `is_destroyed()` is sticky once true
//! - Nothing reaches the store unless an authentication succeeded first
//! - Operations after teardown NEVER panic
//! - A closed client stays closed

#![no_main]

use std::{
    cell::RefCell,
    rc::Rc,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Instant,
};

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use tickflow_client::{FlowClient, SessionState};
use tickflow_core::{Environment, Scheduler, Store};
use tickflow_proto::{Event, Permission, SessionToken, Tick};

const SESSION: u64 = 1;

/// Deterministic environment: a counter keeps issued tokens unique without
/// touching OS entropy.
#[derive(Clone)]
struct FuzzEnv {
    counter: Arc<AtomicU64>,
}

impl FuzzEnv {
    fn new() -> Self {
        Self { counter: Arc::new(AtomicU64::new(1)) }
    }
}

impl Environment for FuzzEnv {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        let tick = self.counter.fetch_add(1, Ordering::Relaxed);
        for (i, byte) in buffer.iter_mut().enumerate() {
            *byte = (tick as u8).wrapping_add(i as u8);
        }
    }
}

#[derive(Debug, Clone, Arbitrary)]
enum SessionOp {
    Open { matching_id: bool },
    Authenticate { valid_token: bool },
    Close,
    Destroy,
    SendTick { frame: u8 },
    SendEvent { code: u8, priority: u8 },
    OnTick,
    OnEvent,
    BroadcastTick { frame: u8 },
    GetTickList { from: u8, to: u8 },
    GetStartPoint,
    Pump,
}

fn rank(state: SessionState) -> u8 {
    match state {
        SessionState::Connecting => 0,
        SessionState::Open => 1,
        SessionState::Closing => 2,
        SessionState::Closed => 3,
    }
}

fuzz_target!(|ops: Vec<SessionOp>| {
    let env = FuzzEnv::new();
    let scheduler = Scheduler::new();
    let store = Store::new(env);
    let client = FlowClient::new(SESSION, store.clone(), scheduler.clone());

    let valid_token = store.issue_token(Permission::active());

    // Store-side observation, independent of client gating.
    let accepted = Rc::new(RefCell::new(0u64));
    let accepted_log = Rc::clone(&accepted);
    store.subscribe_ticks(
        store.allocate_owner(),
        Rc::new(move |_t: &Tick| *accepted_log.borrow_mut() += 1),
    );

    let granted = Rc::new(RefCell::new(false));
    let mut injected = 0u64;
    let mut was_destroyed = false;
    let mut previous_rank = rank(client.get_state());

    for op in ops {
        match op {
            SessionOp::Open { matching_id } => {
                let id = if matching_id { SESSION } else { SESSION + 1 };
                client.open(id, |_| {});
            },
            SessionOp::Authenticate { valid_token: use_valid } => {
                let token = if use_valid { valid_token } else { SessionToken::new(u128::MAX) };
                let granted = Rc::clone(&granted);
                client.authenticate(token, move |result| {
                    if result.is_ok() {
                        *granted.borrow_mut() = true;
                    }
                });
            },
            SessionOp::Close => {
                client.close(|_| {});
            },
            SessionOp::Destroy => {
                client.destroy();
                assert!(client.is_destroyed(), "destroy must be observable immediately");
            },
            SessionOp::SendTick { frame } => client.send_tick(Tick::new(u64::from(frame))),
            SessionOp::SendEvent { code, priority } => {
                client.send_event(Event::new(u32::from(code), u32::from(priority)));
            },
            SessionOp::OnTick => client.on_tick(Rc::new(|_: &Tick| {})),
            SessionOp::OnEvent => client.on_event(Rc::new(|_: &Event| {})),
            SessionOp::BroadcastTick { frame } => {
                store.send_tick(Tick::new(u64::from(frame)));
                injected += 1;
            },
            SessionOp::GetTickList { from, to } => {
                client.get_tick_list(u64::from(from), u64::from(to), |_| {});
            },
            SessionOp::GetStartPoint => {
                client.get_start_point(tickflow_proto::StartPointQuery::latest(), |_| {});
            },
            SessionOp::Pump => {
                scheduler.run_until_idle();
            },
        }

        let current_rank = rank(client.get_state());
        assert!(
            current_rank >= previous_rank,
            "Lifecycle went backwards: {} -> {}",
            previous_rank,
            current_rank
        );
        previous_rank = current_rank;

        if was_destroyed {
            assert!(client.is_destroyed(), "destroyed predicate must be sticky");
        }
        was_destroyed = client.is_destroyed();

        if !*granted.borrow() {
            assert_eq!(
                *accepted.borrow(),
                injected,
                "store accepted a client tick without a successful authentication"
            );
        }
    }

    // Drain everything still pending; no callback may panic.
    scheduler.run_until_idle();

    if client.get_state() == SessionState::Closed {
        client.open(SESSION, |_| {});
        scheduler.run_until_idle();
        assert_eq!(client.get_state(), SessionState::Closed, "Closed must be terminal");
    }
});
