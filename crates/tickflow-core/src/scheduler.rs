//! Cooperative deferred-task scheduler.
//!
//! Asynchronous client operations never resolve their callback inline: the
//! continuation is submitted here and runs only when the host drains the
//! queue. This gives two guarantees the protocol relies on:
//!
//! - A callback never runs before the call that scheduled it has returned
//!   to its caller
//! - Independently submitted tasks run in submission order (FIFO), and no
//!   stronger ordering exists
//!
//! There is no cancellation and no timing: a task submitted is a task that
//! will run on the next drain.

use std::{cell::RefCell, collections::VecDeque, fmt, rc::Rc};

type Task = Box<dyn FnOnce()>;

/// FIFO run queue for deferred continuations.
///
/// Cloning yields another handle to the same queue; the store, its clients,
/// and the host driver all share one.
#[derive(Clone, Default)]
pub struct Scheduler {
    queue: Rc<RefCell<VecDeque<Task>>>,
}

impl Scheduler {
    /// Create an empty scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Submit a task to run on a later drain.
    pub fn defer<F>(&self, task: F)
    where
        F: FnOnce() + 'static,
    {
        self.queue.borrow_mut().push_back(Box::new(task));
    }

    /// Number of tasks waiting to run.
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Run the oldest pending task. Returns false if the queue was empty.
    pub fn run_one(&self) -> bool {
        let task = self.queue.borrow_mut().pop_front();
        match task {
            Some(task) => {
                task();
                true
            },
            None => false,
        }
    }

    /// Run tasks until the queue is empty, including tasks submitted while
    /// draining. Returns how many ran.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        while self.run_one() {
            ran += 1;
        }
        ran
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler").field("pending", &self.pending()).finish()
    }
}
