//! Session client for the Tickflow protocol.
//!
//! A [`FlowClient`] mediates one session's access to the shared
//! permission-gated stream of simulation ticks and side-channel events.
//!
//! # Architecture
//!
//! The client is a single-threaded facade that:
//! - Walks the monotonic lifecycle `Connecting → Open → Closed`
//! - Gates every operation on the [`Permission`](tickflow_proto::Permission)
//!   obtained through authentication
//! - Fans store broadcasts out to locally registered handlers, buffering
//!   events that arrive before the first event handler
//! - Resolves every request/response operation through the shared
//!   [`Scheduler`](tickflow_core::Scheduler), never inline
//!
//! # Components
//!
//! - [`FlowClient`]: the per-session facade
//! - [`SessionState`]: lifecycle states
//! - [`FlowError`] / [`ErrorKind`]: typed asynchronous failures

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod client;
mod error;

pub use client::{EventHandler, FlowClient, SessionState, TickHandler};
pub use error::{ErrorKind, FlowError};
pub use tickflow_core::{Environment, Scheduler, Store, SystemEnv};
