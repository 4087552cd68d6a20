//! Random number generator abstraction for determinism.
//!
//! In production, this wraps the thread-local RNG. In tests, a seeded or
//! scripted implementation is injected so generated identifiers are
//! reproducible.

use rand::RngCore;

/// Abstraction over random byte generation.
pub trait DeterministicRng: Send + Sync {
    /// Fill `dest` with random bytes.
    fn fill_bytes(&mut self, dest: &mut [u8]);
}

/// Production RNG backed by `rand`'s thread-local generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRng;

impl DeterministicRng for SystemRng {
    fn fill_bytes(&mut self, dest: &mut [u8]) {
        rand::rng().fill_bytes(dest);
    }
}
