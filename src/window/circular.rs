//! Circular sequence-number arithmetic.
//!
//! A sequence space is `[0, mask]` with arithmetic modulo `mask + 1`, where
//! `mask = 2^k - 1`. Every ordering decision in the window goes through
//! [`SequenceSpace::delta`].

use crate::error::ConfigError;

/// A wrapping sequence-number space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SequenceSpace {
    mask: u32,
    sign: u32,
}

impl SequenceSpace {
    /// Builds the space for `mask`, which must be non-zero and of the form `2^k - 1`.
    pub const fn new(mask: u32) -> Result<Self, ConfigError> {
        if mask == 0 || mask & mask.wrapping_add(1) != 0 {
            return Err(ConfigError::MaskNotContiguous(mask));
        }
        Ok(Self {
            mask,
            sign: mask ^ (mask >> 1),
        })
    }

    #[inline]
    pub const fn mask(self) -> u32 {
        self.mask
    }

    /// The top bit of the space; a raw difference with this bit set is "behind".
    #[inline]
    pub const fn sign_bit(self) -> u32 {
        self.sign
    }

    /// Half the modulus. Windows never exceed this many bits.
    #[inline]
    pub const fn half(self) -> u64 {
        self.sign as u64
    }

    /// `seq + n`, wrapped into the space. `n` may be negative.
    #[inline]
    pub const fn add(self, seq: u32, n: i64) -> u32 {
        // The modulus divides 2^32, so truncating `n` first is exact.
        seq.wrapping_add(n as u32) & self.mask
    }

    /// Signed circular distance from `b` to `a`, in `(-half, +half]`.
    ///
    /// Positive when `a` is ahead of `b`.
    #[inline]
    pub const fn delta(self, a: u32, b: u32) -> i64 {
        let raw = a.wrapping_sub(b) & self.mask;
        if raw & self.sign != 0 && raw != self.sign {
            raw as i64 - (self.mask as i64 + 1)
        } else {
            raw as i64
        }
    }
}
