//! Deterministic test harness for the Tickflow protocol.
//!
//! Seeded implementations of the `Environment` trait plus recording
//! fixtures for driving a store, a scheduler, and session clients from
//! tests.
//!
//! # Model-Based Testing
//!
//! The `model` module provides a reference implementation for model-based
//! testing. Operations are applied to both the model and the real
//! client/store pair, and their observable states are compared.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod model;
mod probe;
mod rig;
mod sim_env;

pub use model::{ModelFlow, ModelState, OpOutcome, Operation};
pub use probe::{Probe, Recorder};
pub use rig::SessionRig;
pub use sim_env::SimEnv;
