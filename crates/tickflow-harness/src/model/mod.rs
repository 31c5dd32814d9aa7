//! Reference model for model-based testing.
//!
//! The model is a simplified implementation that captures the intended
//! behavior of the session client and its store without callbacks,
//! scheduling, or shared ownership. It serves as the oracle against which
//! the real implementation is verified.
//!
//! # Design Principles
//!
//! - Simplicity: the model should be obviously correct
//! - Behavior not mechanism: counts and logs instead of triggers and
//!   handler lists
//! - Deterministic: same operations produce the same observables

mod client;
pub mod operation;

pub use client::{ModelFlow, ModelState};
pub use operation::{OpOutcome, Operation};
