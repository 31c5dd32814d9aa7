//! Recording fixtures for handlers and deferred callbacks.

use std::{cell::RefCell, rc::Rc};

use tickflow_client::{ErrorKind, FlowError};

/// Records every value a handler is invoked with.
///
/// `handler()` mints a fresh identity each call, so a test can register the
/// same log several times and still remove registrations individually.
pub struct Recorder<T> {
    log: Rc<RefCell<Vec<T>>>,
}

impl<T: Clone + 'static> Recorder<T> {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self { log: Rc::new(RefCell::new(Vec::new())) }
    }

    /// A handler that appends every received value to this recorder.
    pub fn handler(&self) -> Rc<dyn Fn(&T)> {
        let log = Rc::clone(&self.log);
        Rc::new(move |value: &T| log.borrow_mut().push(value.clone()))
    }

    /// Everything recorded so far, in delivery order.
    pub fn values(&self) -> Vec<T> {
        self.log.borrow().clone()
    }

    /// Number of recorded deliveries.
    pub fn len(&self) -> usize {
        self.log.borrow().len()
    }

    /// Whether nothing has been delivered.
    pub fn is_empty(&self) -> bool {
        self.log.borrow().is_empty()
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        self.log.borrow_mut().clear();
    }
}

impl<T: Clone + 'static> Default for Recorder<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Capture slot for one deferred operation callback.
pub struct Probe<T> {
    slot: Rc<RefCell<Option<Result<T, FlowError>>>>,
}

impl<T: 'static> Probe<T> {
    /// Create an unresolved probe.
    #[must_use]
    pub fn new() -> Self {
        Self { slot: Rc::new(RefCell::new(None)) }
    }

    /// The callback to hand to the operation under test.
    pub fn callback(&self) -> impl FnOnce(Result<T, FlowError>) + 'static + use<T> {
        let slot = Rc::clone(&self.slot);
        move |result| *slot.borrow_mut() = Some(result)
    }

    /// Whether the operation has resolved.
    pub fn is_resolved(&self) -> bool {
        self.slot.borrow().is_some()
    }

    /// Take the result out, leaving the probe unresolved.
    pub fn take(&self) -> Option<Result<T, FlowError>> {
        self.slot.borrow_mut().take()
    }

    /// The error kind, if the operation resolved with an error.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.slot.borrow().as_ref().and_then(|r| r.as_ref().err().map(FlowError::kind))
    }

    /// The resolution collapsed to `Ok`/`Err(kind)`, dropping the payload.
    /// `None` while unresolved.
    pub fn outcome(&self) -> Option<Result<(), ErrorKind>> {
        self.slot.borrow().as_ref().map(|r| match r {
            Ok(_) => Ok(()),
            Err(e) => Err(e.kind()),
        })
    }
}

impl<T: 'static> Default for Probe<T> {
    fn default() -> Self {
        Self::new()
    }
}
