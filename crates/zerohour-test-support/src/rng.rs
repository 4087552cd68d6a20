//! Test RNG — deterministic `DeterministicRng` implementation for tests.

use zerohour_core::rng::DeterministicRng;

/// An RNG that fills buffers by cycling through a predetermined byte
/// sequence. Used where a test needs a specific, repeatable identifier.
#[derive(Debug)]
pub struct SequenceRng {
    values: Vec<u8>,
    index: usize,
}

impl SequenceRng {
    /// Create a new `SequenceRng` with the given bytes.
    ///
    /// # Panics
    ///
    /// Panics if `values` is empty.
    #[must_use]
    pub fn new(values: Vec<u8>) -> Self {
        assert!(!values.is_empty(), "SequenceRng needs at least one byte");
        Self { values, index: 0 }
    }
}

impl DeterministicRng for SequenceRng {
    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for byte in dest {
            *byte = self.values[self.index % self.values.len()];
            self.index += 1;
        }
    }
}
