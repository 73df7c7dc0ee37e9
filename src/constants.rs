//! Sequence-space and diagnostic constants.
//!
//! All invariants verified at compile time via `const` assertions.

// =============================================================================
// Platform verification
// =============================================================================

// Compile-time proof that u32 -> usize is safe on this platform.
const _: () = assert!(
    size_of::<usize>() >= size_of::<u32>(),
    "Platform must have at least 32-bit addressing"
);

// =============================================================================
// Sequence spaces
// =============================================================================

/// Modulus mask for 16-bit sequence numbers (segment IDs, block IDs).
pub const SEQ16_MASK: u32 = 0xFFFF;

/// Modulus mask for 32-bit sequence numbers (object IDs, transport IDs).
pub const SEQ32_MASK: u32 = 0xFFFF_FFFF;

/// Largest window that fits a 16-bit sequence space: half the modulus.
pub const SEQ16_CAPACITY_MAX: usize = ((SEQ16_MASK >> 1) as usize) + 1;

/// Largest window that fits a 32-bit sequence space: half the modulus.
pub const SEQ32_CAPACITY_MAX: usize = ((SEQ32_MASK >> 1) as usize) + 1;

// =============================================================================
// Storage geometry
// =============================================================================

/// Bits per storage byte. Bit 0 of a bitset is the most significant bit of byte 0.
pub const BITS_PER_BYTE: usize = 8;

/// Bytes needed to store `bits` bits.
#[inline]
pub const fn bytes_for_bits(bits: usize) -> usize {
    bits.div_ceil(BITS_PER_BYTE)
}

// =============================================================================
// Diagnostic dump geometry
// =============================================================================

/// Bits printed per space-separated group.
pub const DUMP_GROUP_BITS: usize = 8;

/// Bits printed per line.
pub const DUMP_LINE_BITS: usize = 64;

// =============================================================================
// Compile-time design integrity assertions
// =============================================================================

const _: () = assert!(SEQ16_MASK & SEQ16_MASK.wrapping_add(1) == 0);
const _: () = assert!(SEQ32_MASK & SEQ32_MASK.wrapping_add(1) == 0);
const _: () = assert!(SEQ16_CAPACITY_MAX == 1 << 15);
const _: () = assert!(SEQ32_CAPACITY_MAX == 1 << 31);

const _: () = assert!(bytes_for_bits(0) == 0);
const _: () = assert!(bytes_for_bits(1) == 1);
const _: () = assert!(bytes_for_bits(8) == 1);
const _: () = assert!(bytes_for_bits(9) == 2);

const _: () = assert!(DUMP_GROUP_BITS == BITS_PER_BYTE);
const _: () = assert!(
    DUMP_LINE_BITS.is_multiple_of(DUMP_GROUP_BITS),
    "A dump line must hold whole groups"
);
