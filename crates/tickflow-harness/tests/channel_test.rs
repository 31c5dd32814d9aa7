//! Tick and event channel integration tests.
//!
//! Covers silent policy no-ops, priority clamping, registration-order
//! fan-out, identity-based removal, pre-subscription buffering, and
//! multi-client distribution through one store.

use std::rc::Rc;

use tickflow_harness::{Recorder, SessionRig};
use tickflow_proto::{Event, Permission, Tick};

#[test]
fn fire_and_forget_is_silent_before_authentication() {
    let rig = SessionRig::new(1);
    let client = rig.open_client(10);

    client.send_tick(Tick::new(1));
    client.send_event(Event::new(1, 0));
    client.on_tick(Rc::new(|_: &Tick| {}));
    client.on_event(Rc::new(|_: &Event| {}));

    assert!(rig.store_ticks.is_empty());
    assert!(rig.store_events.is_empty());
}

#[test]
fn fire_and_forget_is_silent_after_teardown() {
    let rig = SessionRig::new(1);
    let client = rig.authenticated_client(10, Permission::active());
    client.destroy();

    client.send_tick(Tick::new(1));
    client.send_event(Event::new(1, 0));

    assert!(rig.store_ticks.is_empty());
    assert!(rig.store_events.is_empty());
}

#[test]
fn granted_sends_reach_the_store() {
    let rig = SessionRig::new(1);
    let client = rig.authenticated_client(10, Permission::active());

    client.send_tick(Tick::new(7));
    client.send_event(Event::new(3, 1));

    assert_eq!(rig.store_ticks.values(), vec![Tick::new(7)]);
    assert_eq!(rig.store_events.values(), vec![Event::new(3, 1)]);
}

#[test]
fn event_priority_clamps_down_never_up() {
    let rig = SessionRig::new(1);
    // Active grant carries ceiling 2.
    let client = rig.authenticated_client(10, Permission::active());

    client.send_event(Event::new(1, 5));
    client.send_event(Event::new(2, 1));

    let priorities: Vec<u32> = rig.store_events.values().iter().map(|e| e.priority).collect();
    assert_eq!(priorities, vec![2, 1]);
}

#[test]
fn send_event_requires_the_capability() {
    let rig = SessionRig::new(1);
    let no_events = Permission { send_event: false, ..Permission::active() };
    let client = rig.authenticated_client(10, no_events);

    client.send_event(Event::new(1, 0));
    assert!(rig.store_events.is_empty());
}

#[test]
fn tick_handlers_fire_in_registration_order() {
    let rig = SessionRig::new(1);
    let client = rig.authenticated_client(10, Permission::active());

    let order = Recorder::<u32>::new();
    for tag in [1u32, 2, 3] {
        let log = order.handler();
        client.on_tick(Rc::new(move |_t: &Tick| (*log)(&tag)));
    }

    rig.store.send_tick(Tick::new(0));
    assert_eq!(order.values(), vec![1, 2, 3]);
}

#[test]
fn off_tick_removes_by_identity_only() {
    let rig = SessionRig::new(1);
    let client = rig.authenticated_client(10, Permission::active());

    let ticks = Recorder::<Tick>::new();
    let first = ticks.handler();
    let second = ticks.handler();
    client.on_tick(Rc::clone(&first));
    client.on_tick(Rc::clone(&second));

    client.off_tick(&first);
    rig.store.send_tick(Tick::new(1));

    // Only the second registration is left.
    assert_eq!(ticks.len(), 1);

    // Removing an unregistered handler is a no-op.
    client.off_tick(&first);
    rig.store.send_tick(Tick::new(2));
    assert_eq!(ticks.len(), 2);
}

#[test]
fn on_tick_requires_the_subscribe_capability() {
    let rig = SessionRig::new(1);
    let no_subscribe = Permission { subscribe_tick: false, ..Permission::active() };
    let client = rig.authenticated_client(10, no_subscribe);

    let ticks = Recorder::<Tick>::new();
    client.on_tick(ticks.handler());

    rig.store.send_tick(Tick::new(1));
    assert!(ticks.is_empty());
}

#[test]
fn events_buffer_until_the_first_subscription() {
    let rig = SessionRig::new(1);
    let client = rig.authenticated_client(10, Permission::active());

    rig.store.send_event(Event::new(1, 0));
    rig.store.send_event(Event::new(2, 0));
    rig.store.send_event(Event::new(3, 0));

    let events = Recorder::<Event>::new();
    client.on_event(events.handler());

    // All buffered events arrive on subscription, in arrival order.
    let codes: Vec<u32> = events.values().iter().map(|e| e.code).collect();
    assert_eq!(codes, vec![1, 2, 3]);

    // Buffer emptied: a second subscription delivers nothing more.
    let late = Recorder::<Event>::new();
    client.on_event(late.handler());
    assert!(late.is_empty());
}

#[test]
fn live_events_bypass_the_buffer() {
    let rig = SessionRig::new(1);
    let client = rig.authenticated_client(10, Permission::active());

    let events = Recorder::<Event>::new();
    client.on_event(events.handler());

    rig.store.send_event(Event::new(9, 0));
    assert_eq!(events.len(), 1);
}

#[test]
fn event_subscription_requires_the_capability() {
    let rig = SessionRig::new(1);
    // Passive grant: subscribe_event is false.
    let client = rig.authenticated_client(10, Permission::passive());

    let events = Recorder::<Event>::new();
    client.on_event(events.handler());

    rig.store.send_event(Event::new(1, 0));
    assert!(events.is_empty());
}

#[test]
fn off_event_removes_by_identity() {
    let rig = SessionRig::new(1);
    let client = rig.authenticated_client(10, Permission::active());

    let events = Recorder::<Event>::new();
    let handler = events.handler();
    client.on_event(Rc::clone(&handler));
    client.off_event(&handler);

    rig.store.send_event(Event::new(1, 0));
    // Handler gone and the buffer fills again instead.
    assert!(events.is_empty());
}

#[test]
fn broadcasts_fan_out_to_every_attached_client() {
    let rig = SessionRig::new(1);
    let writer = rig.authenticated_client(10, Permission::active());
    let reader_a = rig.authenticated_client(11, Permission::active());
    let reader_b = rig.authenticated_client(12, Permission::active());

    let seen_a = Recorder::<Tick>::new();
    reader_a.on_tick(seen_a.handler());
    let seen_b = Recorder::<Tick>::new();
    reader_b.on_tick(seen_b.handler());

    writer.send_tick(Tick::new(5));

    assert_eq!(seen_a.values(), vec![Tick::new(5)]);
    assert_eq!(seen_b.values(), vec![Tick::new(5)]);
}

#[test]
fn detached_clients_no_longer_receive_broadcasts() {
    let rig = SessionRig::new(1);
    let reader = rig.authenticated_client(11, Permission::active());
    let seen = Recorder::<Tick>::new();
    reader.on_tick(seen.handler());

    rig.store.send_tick(Tick::new(1));
    reader.destroy();
    rig.store.send_tick(Tick::new(2));

    assert_eq!(seen.len(), 1);
}
