//! Byte-parallel scan tables.
//!
//! Both tables are generated at compile time. Bit positions use the big-endian
//! within-byte convention shared by every bitset in this crate: position 0 is the
//! most significant bit (`0x80`), position 7 the least significant (`0x01`).
//!
//! - [`WEIGHT`] maps a byte to its population count.
//! - [`BITLOCS`] maps a byte to its set-bit positions in ascending order. Only the
//!   first `WEIGHT[b]` entries of `BITLOCS[b]` are meaningful.

/// Population count of every byte value.
pub const WEIGHT: [u8; 256] = build_weight();

/// Ascending set-bit positions of every byte value.
pub const BITLOCS: [[u8; 8]; 256] = build_bitlocs();

const fn build_weight() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut b = 0;
    while b < 256 {
        table[b] = (b as u8).count_ones() as u8;
        b += 1;
    }
    table
}

const fn build_bitlocs() -> [[u8; 8]; 256] {
    let mut table = [[0u8; 8]; 256];
    let mut b = 0;
    while b < 256 {
        let mut n = 0;
        let mut pos = 0;
        while pos < 8 {
            if (b as u8) & (0x80u8 >> pos) != 0 {
                table[b][n] = pos as u8;
                n += 1;
            }
            pos += 1;
        }
        b += 1;
    }
    table
}

const _: () = assert!(WEIGHT[0x00] == 0);
const _: () = assert!(WEIGHT[0xFF] == 8);
const _: () = assert!(WEIGHT[0xA5] == 4);
const _: () = assert!(BITLOCS[0x80][0] == 0);
const _: () = assert!(BITLOCS[0x01][0] == 7);
const _: () = assert!(BITLOCS[0x41][0] == 1 && BITLOCS[0x41][1] == 7);

/// Mask selecting bit position `pos` within a byte.
#[inline(always)]
pub const fn bit_mask(pos: usize) -> u8 {
    debug_assert!(pos < 8);
    0x80u8 >> pos
}

/// Mask selecting `count` consecutive positions starting at `pos`.
///
/// Requires `count >= 1` and `pos + count <= 8`.
#[inline(always)]
pub const fn run_mask(pos: usize, count: usize) -> u8 {
    debug_assert!(count >= 1);
    debug_assert!(pos + count <= 8);
    (0xFFu8 >> pos) & (0xFFu8 << (8 - pos - count))
}

/// Lowest set position in `byte` that is `>= from`.
#[inline]
pub fn lowest_at_or_after(byte: u8, from: usize) -> Option<usize> {
    debug_assert!(from < 8);
    let locs = &BITLOCS[byte as usize];
    locs[..WEIGHT[byte as usize] as usize]
        .iter()
        .map(|&loc| loc as usize)
        .find(|&loc| loc >= from)
}

/// Highest set position in `byte` that is `<= until`.
#[inline]
pub fn highest_at_or_before(byte: u8, until: usize) -> Option<usize> {
    debug_assert!(until < 8);
    let locs = &BITLOCS[byte as usize];
    locs[..WEIGHT[byte as usize] as usize]
        .iter()
        .rev()
        .map(|&loc| loc as usize)
        .find(|&loc| loc <= until)
}

/// Lowest set position of a non-zero byte.
#[inline(always)]
pub fn lowest(byte: u8) -> usize {
    debug_assert!(byte != 0);
    BITLOCS[byte as usize][0] as usize
}

/// Highest set position of a non-zero byte.
#[inline(always)]
pub fn highest(byte: u8) -> usize {
    debug_assert!(byte != 0);
    let w = WEIGHT[byte as usize] as usize;
    BITLOCS[byte as usize][w - 1] as usize
}
