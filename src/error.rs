//! Error taxonomy for bitset and sequence-window operations.
//!
//! Addressing a sequence number outside the tracked window is not an error: queries
//! answer `false`/`None` and unsets are no-ops. Only construction problems and
//! requests that would overflow the configured capacity surface as [`Error`].

use thiserror::Error;

/// Rejected construction parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("capacity must be non-zero")]
    ZeroCapacity,

    #[error("capacity {capacity} exceeds half the sequence space ({max})")]
    CapacityAboveHalfRange { capacity: usize, max: u64 },

    #[error("modulus mask {0:#x} is not of the form 2^k - 1")]
    MaskNotContiguous(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// Storage reservation failed. The instance that reported it must not be used.
    #[error("failed to allocate {bytes} bytes of bit storage")]
    AllocationFailure { bytes: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigError),

    /// The operation would need `span` bits but only `capacity` are available.
    /// Nothing was mutated.
    #[error("span of {span} bits exceeds capacity {capacity}")]
    CapacityExceeded { span: u64, capacity: usize },

    /// Set algebra between windows over different sequence spaces.
    #[error("modulus mask {found:#x} does not match {expected:#x}")]
    ModulusMismatch { expected: u32, found: u32 },
}
