use super::circular::SequenceSpace;
use crate::constants::{SEQ16_MASK, SEQ32_MASK};
use crate::error::ConfigError;

/// Construction options for a [`SequenceWindow`](super::SequenceWindow).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowConfig {
    /// Maximum number of sequence numbers tracked at once.
    pub capacity: usize,
    /// Sequence numbers wrap at `modulus_mask + 1`.
    pub modulus_mask: u32,
}

impl WindowConfig {
    /// Window over 16-bit sequence numbers.
    pub const fn seq16(capacity: usize) -> Self {
        Self {
            capacity,
            modulus_mask: SEQ16_MASK,
        }
    }

    /// Window over 32-bit sequence numbers.
    pub const fn seq32(capacity: usize) -> Self {
        Self {
            capacity,
            modulus_mask: SEQ32_MASK,
        }
    }

    pub const fn with_capacity(self, capacity: usize) -> Self {
        Self { capacity, ..self }
    }

    /// Checks the options and returns the sequence space they describe.
    ///
    /// The capacity may not exceed half the modulus; beyond that the sign of a
    /// circular delta no longer orders sequence numbers unambiguously.
    pub fn validate(&self) -> Result<SequenceSpace, ConfigError> {
        let space = SequenceSpace::new(self.modulus_mask)?;
        if self.capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.capacity as u64 > space.half() {
            return Err(ConfigError::CapacityAboveHalfRange {
                capacity: self.capacity,
                max: space.half(),
            });
        }
        Ok(space)
    }
}
