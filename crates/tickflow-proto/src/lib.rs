//! Playlog and permission data types for the Tickflow protocol.
//!
//! These are plain values shared by the store and the session client. They
//! carry no behavior beyond construction helpers: the client core gates
//! their distribution without interpreting their contents.
//!
//! # Components
//!
//! - [`Tick`] / [`TickList`]: ordered simulation steps and range-query
//!   results
//! - [`Event`]: out-of-band occurrences with a priority field
//! - [`StartPoint`] / [`StartPointQuery`]: checkpoint snapshots and lookups
//! - [`Permission`]: the capability set granted after authentication
//! - [`SessionToken`]: opaque credential exchanged for a [`Permission`]
//! - Storage placeholders ([`StorageKey`], [`StorageValue`], [`StorageData`])
//!   for the unsupported key/value facility

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod permission;
mod playlog;
mod start_point;
mod storage;
mod token;

pub use permission::Permission;
pub use playlog::{Event, SessionId, Tick, TickList};
pub use start_point::{StartPoint, StartPointQuery};
pub use storage::{StorageData, StorageKey, StorageValue};
pub use token::SessionToken;
