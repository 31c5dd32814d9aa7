//! Publish/subscribe triggers.
//!
//! A [`Trigger`] is an ordered list of `(owner, callback)` pairs. Owners
//! scope subscription lifetime: a session client subscribes with its own
//! [`OwnerId`] when it attaches to the store and removes every entry for
//! that owner on teardown, so release is a single owner-keyed operation on
//! every exit path.
//!
//! # Invariants
//!
//! - Callbacks fire in subscription order
//! - Firing iterates a snapshot: callbacks may subscribe or unsubscribe
//!   without affecting the in-flight dispatch

use std::{fmt, rc::Rc};

/// Identity of a subscription owner.
///
/// Minted by the store; one per attached client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OwnerId(u64);

impl OwnerId {
    /// Wrap a raw owner value.
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }
}

/// A subscribed callback.
pub type Subscriber<T> = Rc<dyn Fn(&T)>;

/// Ordered list of owner-scoped subscribers.
pub struct Trigger<T> {
    entries: Vec<(OwnerId, Subscriber<T>)>,
}

impl<T> Trigger<T> {
    /// Create an empty trigger.
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Append a subscriber owned by `owner`.
    ///
    /// Duplicate registrations are kept: each entry fires once per dispatch.
    pub fn add(&mut self, owner: OwnerId, subscriber: Subscriber<T>) {
        self.entries.push((owner, subscriber));
    }

    /// Remove every subscriber owned by `owner`. No-op if none exist.
    pub fn remove(&mut self, owner: OwnerId) {
        self.entries.retain(|(o, _)| *o != owner);
    }

    /// Drop all subscribers.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of subscribers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no subscriber is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Clone out the subscriber list in registration order.
    ///
    /// Dispatch sites snapshot first and invoke after releasing any borrow
    /// of the surrounding state, so subscribers may re-enter it.
    pub fn snapshot(&self) -> Vec<Subscriber<T>> {
        self.entries.iter().map(|(_, s)| Rc::clone(s)).collect()
    }

    /// Invoke every subscriber with `value`, in registration order.
    pub fn fire(&self, value: &T) {
        for subscriber in self.snapshot() {
            subscriber(value);
        }
    }
}

impl<T> Default for Trigger<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Trigger<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trigger").field("subscribers", &self.entries.len()).finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    #[test]
    fn fires_in_subscription_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut trigger: Trigger<u32> = Trigger::new();

        for tag in ["a", "b", "c"] {
            let log = Rc::clone(&log);
            trigger.add(OwnerId::new(1), Rc::new(move |v: &u32| log.borrow_mut().push((tag, *v))));
        }

        trigger.fire(&7);
        assert_eq!(*log.borrow(), vec![("a", 7), ("b", 7), ("c", 7)]);
    }

    #[test]
    fn remove_drops_all_entries_for_owner() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut trigger: Trigger<u32> = Trigger::new();

        let mine = OwnerId::new(1);
        let theirs = OwnerId::new(2);
        for owner in [mine, mine, theirs] {
            let log = Rc::clone(&log);
            trigger.add(owner, Rc::new(move |v: &u32| log.borrow_mut().push(*v)));
        }
        assert_eq!(trigger.len(), 3);

        trigger.remove(mine);
        assert_eq!(trigger.len(), 1);

        trigger.fire(&3);
        assert_eq!(*log.borrow(), vec![3]);
    }

    #[test]
    fn remove_unknown_owner_is_noop() {
        let mut trigger: Trigger<u32> = Trigger::new();
        trigger.add(OwnerId::new(1), Rc::new(|_| {}));

        trigger.remove(OwnerId::new(99));
        assert_eq!(trigger.len(), 1);
    }

    #[test]
    fn snapshot_is_isolated_from_later_mutation() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut trigger: Trigger<u32> = Trigger::new();

        let log2 = Rc::clone(&log);
        trigger.add(OwnerId::new(1), Rc::new(move |v: &u32| log2.borrow_mut().push(*v)));

        let snapshot = trigger.snapshot();
        trigger.clear();
        assert!(trigger.is_empty());

        for subscriber in snapshot {
            subscriber(&5);
        }
        assert_eq!(*log.borrow(), vec![5]);
    }
}
