//! Shared substrate for the Tickflow protocol.
//!
//! This crate holds everything the session client and its host have in
//! common: the [`Environment`] abstraction over time and randomness, the
//! [`Trigger`] publish/subscribe primitive, the cooperative [`Scheduler`]
//! that defers callbacks, and the in-memory [`Store`] backend shared by all
//! session clients of one simulation run.
//!
//! # Concurrency model
//!
//! Everything here is single-threaded by construction (`Rc`/`RefCell`, no
//! locks). A host that spans threads must keep each store and its attached
//! clients on one thread; the types do not implement `Send`.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod env;
mod pubsub;
mod scheduler;
mod store;
mod system_env;

pub use env::Environment;
pub use pubsub::{OwnerId, Subscriber, Trigger};
pub use scheduler::Scheduler;
pub use store::Store;
pub use system_env::SystemEnv;
