//! Seeded Environment implementation for deterministic tests.

use std::{
    sync::{Arc, Mutex, PoisonError},
    time::Instant,
};

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tickflow_core::Environment;

/// Deterministic environment: seeded ChaCha8 randomness, system clock.
///
/// Given the same seed, token issuance and every other randomness consumer
/// produce the same sequence, so failing runs replay exactly. Time is only
/// used for diagnostics here, so the real clock is fine.
#[derive(Clone)]
pub struct SimEnv {
    rng: Arc<Mutex<ChaCha8Rng>>,
}

impl SimEnv {
    /// Create an environment seeded with `seed`.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self { rng: Arc::new(Mutex::new(ChaCha8Rng::seed_from_u64(seed))) }
    }
}

impl Environment for SimEnv {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        rng.fill_bytes(buffer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_sequence() {
        let a = SimEnv::with_seed(7);
        let b = SimEnv::with_seed(7);

        assert_eq!(a.random_u128(), b.random_u128());
        assert_eq!(a.random_u64(), b.random_u64());
    }

    #[test]
    fn different_seeds_diverge() {
        let a = SimEnv::with_seed(1);
        let b = SimEnv::with_seed(2);

        assert_ne!(a.random_u128(), b.random_u128());
    }
}
