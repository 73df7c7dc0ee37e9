//! Heap-backed bitset with byte-parallel directional scans; capacity is fixed at init.
//!
//! Storage is big-endian within each byte: bit `i` lives in byte `i / 8` under mask
//! `0x80 >> (i % 8)`. Padding bits past `capacity` in the final byte are always zero,
//! which lets scans and set algebra work on whole bytes.

use core::fmt;

use super::bit_tables::{self, WEIGHT};
use crate::constants::{DUMP_GROUP_BITS, DUMP_LINE_BITS, bytes_for_bits};
use crate::error::Error;

/// Fixed-capacity bit vector with a cached lowest-set index.
///
/// `first_set` equals the lowest set index, or `capacity` when nothing is set. Every
/// mutation keeps it exact, so scans may start from it without re-verifying the
/// prefix.
///
/// Mutations that could reach past `capacity` return [`Error::CapacityExceeded`] and
/// leave the bitset untouched. Unsets past `capacity` are clamped instead.
///
/// # Examples
/// ```
/// use seqmask::stdx::Bitset;
///
/// let mut bits = Bitset::init(16).unwrap();
/// bits.set_range(3, 4).unwrap();
/// assert_eq!(bits.next_set(0), Some(3));
/// assert_eq!(bits.prev_set(15), Some(6));
/// assert_eq!(bits.next_unset(3), Some(7));
/// ```
#[derive(Clone)]
pub struct Bitset {
    bytes: Vec<u8>,
    capacity: usize,
    first_set: usize,
}

fn alloc_storage(capacity: usize) -> Result<Vec<u8>, Error> {
    let len = bytes_for_bits(capacity);
    let mut bytes = Vec::new();
    bytes
        .try_reserve_exact(len)
        .map_err(|_| Error::AllocationFailure { bytes: len })?;
    bytes.resize(len, 0);
    Ok(bytes)
}

/// Sets or clears `count` bits starting at `index`. The run must lie within `bytes`.
fn apply_run(bytes: &mut [u8], index: usize, count: usize, value: bool) {
    let end = index + count;
    assert!(end <= bytes.len() * 8);

    let mut idx = index;
    while idx < end {
        let byte_idx = idx >> 3;
        let bit = idx & 7;

        if bit == 0 && end - idx >= 8 {
            let whole = (end - idx) >> 3;
            bytes[byte_idx..byte_idx + whole].fill(if value { 0xFF } else { 0x00 });
            idx += whole << 3;
            continue;
        }

        let take = (8 - bit).min(end - idx);
        let mask = bit_tables::run_mask(bit, take);
        if value {
            bytes[byte_idx] |= mask;
        } else {
            bytes[byte_idx] &= !mask;
        }
        idx += take;
    }
}

impl Bitset {
    /// Allocates a cleared bitset of `capacity` bits.
    pub fn init(capacity: usize) -> Result<Self, Error> {
        let bytes = alloc_storage(capacity)?;
        Ok(Self {
            bytes,
            capacity,
            first_set: capacity,
        })
    }

    /// Replaces the storage with a cleared bitset of `capacity` bits.
    ///
    /// On allocation failure `self` is left as it was.
    pub fn reinit(&mut self, capacity: usize) -> Result<(), Error> {
        *self = Self::init(capacity)?;
        Ok(())
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns `true` when at least one bit is set.
    #[inline]
    pub fn is_occupied(&self) -> bool {
        self.first_set < self.capacity
    }

    /// Raw storage, `ceil(capacity / 8)` bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Counts set bits using the weight table.
    pub fn count(&self) -> usize {
        self.bytes.iter().map(|&b| WEIGHT[b as usize] as usize).sum()
    }

    pub fn clear(&mut self) {
        self.bytes.fill(0);
        self.first_set = self.capacity;
    }

    /// Sets every bit in `[0, capacity)`.
    pub fn fill(&mut self) {
        if self.capacity == 0 {
            return;
        }
        self.bytes.fill(0xFF);
        let tail = self.capacity & 7;
        if tail != 0 {
            let last = self.bytes.len() - 1;
            self.bytes[last] = bit_tables::run_mask(0, tail);
        }
        self.first_set = 0;
        debug_assert_eq!(self.count(), self.capacity);
    }

    /// Returns the bit at `index`; indices past capacity read as unset.
    #[inline]
    pub fn test(&self, index: usize) -> bool {
        index < self.capacity && self.bytes[index >> 3] & bit_tables::bit_mask(index & 7) != 0
    }

    pub fn set(&mut self, index: usize) -> Result<(), Error> {
        if index >= self.capacity {
            return Err(Error::CapacityExceeded {
                span: index as u64 + 1,
                capacity: self.capacity,
            });
        }
        self.bytes[index >> 3] |= bit_tables::bit_mask(index & 7);
        if index < self.first_set {
            self.first_set = index;
        }
        Ok(())
    }

    /// Clears the bit at `index`. A no-op past capacity.
    pub fn unset(&mut self, index: usize) {
        if index >= self.capacity {
            return;
        }
        self.bytes[index >> 3] &= !bit_tables::bit_mask(index & 7);
        if index == self.first_set {
            self.refresh_first_set(index + 1);
        }
    }

    pub fn invert(&mut self, index: usize) -> Result<(), Error> {
        if self.test(index) {
            self.unset(index);
            Ok(())
        } else {
            self.set(index)
        }
    }

    /// Sets `count` consecutive bits starting at `index`.
    ///
    /// All-or-nothing: fails without mutation if the run ends past capacity.
    pub fn set_range(&mut self, index: usize, count: usize) -> Result<(), Error> {
        if count == 0 {
            return Ok(());
        }
        let fits = index
            .checked_add(count)
            .is_some_and(|end| end <= self.capacity);
        if !fits {
            return Err(Error::CapacityExceeded {
                span: index as u64 + count as u64,
                capacity: self.capacity,
            });
        }
        self.assign_run(index, count, true);
        Ok(())
    }

    /// Clears `count` consecutive bits starting at `index`, clamped to capacity.
    pub fn unset_range(&mut self, index: usize, count: usize) {
        if index >= self.capacity || count == 0 {
            return;
        }
        let end = index.saturating_add(count).min(self.capacity);
        self.assign_run(index, end - index, false);
    }

    /// Writes `value` into a run the caller has already bounds-checked.
    ///
    /// Panics if the run ends past capacity.
    pub(crate) fn assign_run(&mut self, index: usize, count: usize, value: bool) {
        if count == 0 {
            return;
        }
        let end = index + count;
        assert!(end <= self.capacity, "bit run out of bounds");
        apply_run(&mut self.bytes, index, count, value);

        if value {
            self.first_set = self.first_set.min(index);
        } else if self.first_set >= index && self.first_set < end {
            self.refresh_first_set(end);
        }
    }

    // =========================================================================
    // Scans
    // =========================================================================

    /// Lowest set index, if any.
    #[inline]
    pub fn first_set(&self) -> Option<usize> {
        self.is_occupied().then_some(self.first_set)
    }

    /// Highest set index, if any.
    #[inline]
    pub fn last_set(&self) -> Option<usize> {
        if self.capacity == 0 {
            return None;
        }
        self.prev_set(self.capacity - 1)
    }

    /// Nearest set index at or after `index`.
    pub fn next_set(&self, index: usize) -> Option<usize> {
        if index >= self.capacity || !self.is_occupied() {
            return None;
        }
        self.scan_next_set(index.max(self.first_set))
    }

    /// Nearest set index at or before `index`. Indices past capacity clamp to the
    /// last bit.
    pub fn prev_set(&self, index: usize) -> Option<usize> {
        if !self.is_occupied() {
            return None;
        }
        let index = index.min(self.capacity - 1);
        if index < self.first_set {
            return None;
        }

        let byte_idx = index >> 3;
        if let Some(loc) = bit_tables::highest_at_or_before(self.bytes[byte_idx], index & 7) {
            return Some((byte_idx << 3) + loc);
        }

        // Nothing below `first_set`'s byte can be set.
        let floor = self.first_set >> 3;
        let found = self.bytes[floor..byte_idx]
            .iter()
            .rposition(|&b| b != 0)
            .map(|i| {
                let byte_idx = floor + i;
                (byte_idx << 3) + bit_tables::highest(self.bytes[byte_idx])
            });
        debug_assert!(found.is_some(), "first_set hint points at a clear bit");
        found
    }

    /// Nearest unset index at or after `index`, bounded by capacity.
    pub fn next_unset(&self, index: usize) -> Option<usize> {
        if index >= self.capacity {
            return None;
        }

        let byte_idx = index >> 3;
        let found = match bit_tables::lowest_at_or_after(!self.bytes[byte_idx], index & 7) {
            Some(loc) => Some((byte_idx << 3) + loc),
            None => self.bytes[byte_idx + 1..]
                .iter()
                .position(|&b| b != 0xFF)
                .map(|i| {
                    let byte_idx = byte_idx + 1 + i;
                    (byte_idx << 3) + bit_tables::lowest(!self.bytes[byte_idx])
                }),
        };
        // Padding bits read as unset; they are not addressable.
        found.filter(|&i| i < self.capacity)
    }

    fn scan_next_set(&self, index: usize) -> Option<usize> {
        if index >= self.capacity {
            return None;
        }

        let byte_idx = index >> 3;
        let found = match bit_tables::lowest_at_or_after(self.bytes[byte_idx], index & 7) {
            Some(loc) => Some((byte_idx << 3) + loc),
            None => self.bytes[byte_idx + 1..]
                .iter()
                .position(|&b| b != 0)
                .map(|i| {
                    let byte_idx = byte_idx + 1 + i;
                    (byte_idx << 3) + bit_tables::lowest(self.bytes[byte_idx])
                }),
        };
        debug_assert!(found.is_none_or(|i| i < self.capacity));
        found
    }

    fn refresh_first_set(&mut self, from: usize) {
        self.first_set = self.scan_next_set(from).unwrap_or(self.capacity);
    }

    // =========================================================================
    // Set algebra
    // =========================================================================

    fn ensure_holds(&self, other: &Bitset) -> Result<(), Error> {
        if other.capacity > self.capacity {
            return Err(Error::CapacityExceeded {
                span: other.capacity as u64,
                capacity: self.capacity,
            });
        }
        Ok(())
    }

    /// `self = other`. Fails if `other` is larger than `self`.
    pub fn copy_from(&mut self, other: &Bitset) -> Result<(), Error> {
        self.ensure_holds(other)?;
        let n = other.bytes.len();
        self.bytes[..n].copy_from_slice(&other.bytes);
        self.bytes[n..].fill(0);
        self.first_set = other.first_set().unwrap_or(self.capacity);
        Ok(())
    }

    /// `self |= other`.
    pub fn union_with(&mut self, other: &Bitset) -> Result<(), Error> {
        self.ensure_holds(other)?;
        for (a, b) in self.bytes.iter_mut().zip(&other.bytes) {
            *a |= *b;
        }
        if let Some(first) = other.first_set() {
            self.first_set = self.first_set.min(first);
        }
        Ok(())
    }

    /// `self &= !other`: keeps the bits unique to `self`.
    pub fn difference_with(&mut self, other: &Bitset) {
        for (a, b) in self.bytes.iter_mut().zip(&other.bytes) {
            *a &= !*b;
        }
        self.refresh_first_set(self.first_set);
    }

    /// `self = other & !self`: keeps the bits unique to `other`.
    pub fn difference_from(&mut self, other: &Bitset) -> Result<(), Error> {
        self.ensure_holds(other)?;
        let n = other.bytes.len();
        for (a, b) in self.bytes[..n].iter_mut().zip(&other.bytes) {
            *a = *b & !*a;
        }
        self.bytes[n..].fill(0);
        self.refresh_first_set(other.first_set);
        Ok(())
    }

    /// `self &= other`.
    pub fn intersect_with(&mut self, other: &Bitset) {
        let n = self.bytes.len().min(other.bytes.len());
        for (a, b) in self.bytes[..n].iter_mut().zip(&other.bytes) {
            *a &= *b;
        }
        self.bytes[n..].fill(0);
        self.refresh_first_set(self.first_set.max(other.first_set));
    }

    /// `self ^= other`. A no-op when `other` is empty.
    pub fn symmetric_difference_with(&mut self, other: &Bitset) -> Result<(), Error> {
        if !other.is_occupied() {
            return Ok(());
        }
        self.ensure_holds(other)?;
        for (a, b) in self.bytes.iter_mut().zip(&other.bytes) {
            *a ^= *b;
        }
        self.refresh_first_set(self.first_set.min(other.first_set));
        Ok(())
    }

    /// Iterates set indices in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        let mut next = self.first_set();
        core::iter::from_fn(move || {
            let current = next?;
            next = self.next_set(current + 1);
            Some(current)
        })
    }
}

impl PartialEq for Bitset {
    fn eq(&self, other: &Self) -> bool {
        self.capacity == other.capacity && self.bytes == other.bytes
    }
}

impl Eq for Bitset {}

impl fmt::Debug for Bitset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bitset")
            .field("capacity", &self.capacity)
            .field("first_set", &self.first_set())
            .field("count", &self.count())
            .finish()
    }
}

/// Writes `bits` as `0`/`1` characters, a space after every group and a newline
/// after every line.
pub(crate) fn write_dump(
    f: &mut impl fmt::Write,
    bits: impl Iterator<Item = bool>,
) -> fmt::Result {
    for (i, bit) in bits.enumerate() {
        f.write_char(if bit { '1' } else { '0' })?;
        if i % DUMP_GROUP_BITS == DUMP_GROUP_BITS - 1 {
            f.write_char(' ')?;
        }
        if i % DUMP_LINE_BITS == DUMP_LINE_BITS - 1 {
            f.write_char('\n')?;
        }
    }
    Ok(())
}

impl fmt::Display for Bitset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_dump(f, (0..self.capacity).map(|i| self.test(i)))
    }
}

#[cfg(test)]
mod tests {
    use super::Bitset;
    use crate::error::Error;
    use crate::test_utils::proptest_cases;

    use proptest::prelude::*;

    fn from_indices(capacity: usize, indices: &[usize]) -> Bitset {
        let mut bits = Bitset::init(capacity).unwrap();
        for &i in indices {
            bits.set(i).unwrap();
        }
        bits
    }

    fn model(bits: &Bitset) -> Vec<bool> {
        (0..bits.capacity()).map(|i| bits.test(i)).collect()
    }

    fn arb_bits() -> impl Strategy<Value = (usize, Vec<usize>)> {
        (1usize..=200).prop_flat_map(|cap| (Just(cap), prop::collection::vec(0..cap, 0..cap)))
    }

    // ============================================
    // Property-Based Tests
    // ============================================

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(proptest_cases(256)))]

        #[test]
        fn scans_match_linear_scan((cap, indices) in arb_bits()) {
            let bits = from_indices(cap, &indices);
            let m = model(&bits);

            for i in 0..cap {
                let next = (i..cap).find(|&j| m[j]);
                let prev = (0..=i).rev().find(|&j| m[j]);
                let next_unset = (i..cap).find(|&j| !m[j]);
                prop_assert_eq!(bits.next_set(i), next);
                prop_assert_eq!(bits.prev_set(i), prev);
                prop_assert_eq!(bits.next_unset(i), next_unset);
            }
            prop_assert_eq!(bits.first_set(), m.iter().position(|&b| b));
            prop_assert_eq!(bits.last_set(), m.iter().rposition(|&b| b));
            prop_assert_eq!(bits.count(), m.iter().filter(|&&b| b).count());
        }

        #[test]
        fn set_range_touches_only_the_run(
            (cap, indices) in arb_bits(),
            index in 0usize..200,
            count in 0usize..200,
        ) {
            let mut bits = from_indices(cap, &indices);
            let before = model(&bits);

            match bits.set_range(index, count) {
                Ok(()) => {
                    prop_assert!(count == 0 || index + count <= cap);
                    for (i, &was) in before.iter().enumerate() {
                        let in_run = i >= index && i < index + count;
                        prop_assert_eq!(bits.test(i), was || in_run);
                    }
                }
                Err(Error::CapacityExceeded { .. }) => {
                    prop_assert!(index + count > cap);
                    prop_assert_eq!(model(&bits), before);
                }
                Err(e) => prop_assert!(false, "unexpected error {e}"),
            }
        }

        #[test]
        fn unset_range_clamps_and_keeps_hint_exact(
            (cap, indices) in arb_bits(),
            index in 0usize..220,
            count in 0usize..220,
        ) {
            let mut bits = from_indices(cap, &indices);
            let before = model(&bits);
            bits.unset_range(index, count);

            for (i, &was) in before.iter().enumerate() {
                let in_run = i >= index && i < index.saturating_add(count);
                prop_assert_eq!(bits.test(i), was && !in_run);
            }
            prop_assert_eq!(bits.first_set(), model(&bits).iter().position(|&b| b));
        }

        #[test]
        fn algebra_matches_bool_model(
            (cap, a) in arb_bits(),
            b_seed in prop::collection::vec(any::<usize>(), 0..64),
            b_shrink in 0usize..16,
        ) {
            let b_cap = cap.saturating_sub(b_shrink).max(1);
            let b_indices: Vec<usize> = b_seed.iter().map(|i| i % b_cap).collect();
            let x = from_indices(cap, &a);
            let y = from_indices(b_cap, &b_indices);
            let mx = model(&x);
            let my: Vec<bool> = (0..cap).map(|i| y.test(i)).collect();

            let check = |out: &Bitset, f: &dyn Fn(bool, bool) -> bool| {
                for i in 0..cap {
                    assert_eq!(out.test(i), f(mx[i], my[i]), "index {i}");
                }
                assert_eq!(out.first_set(), (0..cap).find(|&i| out.test(i)));
            };

            let mut out = x.clone();
            out.union_with(&y).unwrap();
            check(&out, &|p, q| p | q);

            let mut out = x.clone();
            out.difference_with(&y);
            check(&out, &|p, q| p & !q);

            let mut out = x.clone();
            out.difference_from(&y).unwrap();
            check(&out, &|p, q| q & !p);

            let mut out = x.clone();
            out.intersect_with(&y);
            check(&out, &|p, q| p & q);

            let mut out = x.clone();
            out.symmetric_difference_with(&y).unwrap();
            check(&out, &|p, q| p ^ q);

            let mut out = x.clone();
            out.copy_from(&y).unwrap();
            check(&out, &|_, q| q);
        }

        #[test]
        fn set_is_idempotent(cap in 1usize..128, idx in 0usize..128) {
            let idx = idx % cap;
            let mut once = Bitset::init(cap).unwrap();
            let mut twice = Bitset::init(cap).unwrap();
            once.set(idx).unwrap();
            twice.set(idx).unwrap();
            twice.set(idx).unwrap();
            prop_assert_eq!(once, twice);
        }
    }

    // ============================================
    // Unit Tests
    // ============================================

    #[test]
    fn empty_bitset() {
        let bits = Bitset::init(20).unwrap();
        assert!(!bits.is_occupied());
        assert_eq!(bits.as_bytes().len(), 3);
        assert_eq!(bits.first_set(), None);
        assert_eq!(bits.last_set(), None);
        assert_eq!(bits.next_set(0), None);
        assert_eq!(bits.prev_set(19), None);
        assert_eq!(bits.next_unset(0), Some(0));
    }

    #[test]
    fn zero_capacity_is_inert() {
        let mut bits = Bitset::init(0).unwrap();
        assert!(bits.as_bytes().is_empty());
        assert_eq!(bits.last_set(), None);
        assert_eq!(bits.next_unset(0), None);
        assert!(bits.set(0).is_err());
        bits.fill();
        assert!(!bits.is_occupied());
    }

    #[test]
    fn bit_zero_is_msb_of_first_byte() {
        let bits = from_indices(16, &[0, 9]);
        assert_eq!(bits.as_bytes(), &[0x80, 0x40]);
    }

    #[test]
    fn set_out_of_range_fails_without_mutation() {
        let mut bits = from_indices(10, &[4]);
        assert_eq!(
            bits.set(10),
            Err(Error::CapacityExceeded {
                span: 11,
                capacity: 10
            })
        );
        assert!(bits.set_range(8, 3).is_err());
        assert_eq!(bits.iter().collect::<Vec<_>>(), vec![4]);
        assert!(bits.set_range(8, 0).is_ok());
        assert!(bits.set_range(8, 2).is_ok());
    }

    #[test]
    fn unset_of_lowest_advances_hint() {
        let mut bits = from_indices(64, &[3, 17, 40]);
        bits.unset(3);
        assert_eq!(bits.first_set(), Some(17));
        bits.unset_range(0, 20);
        assert_eq!(bits.first_set(), Some(40));
        bits.unset_range(40, 1000);
        assert_eq!(bits.first_set(), None);
    }

    #[test]
    fn fill_respects_padding() {
        let mut bits = Bitset::init(13).unwrap();
        bits.fill();
        assert_eq!(bits.as_bytes(), &[0xFF, 0xF8]);
        assert_eq!(bits.count(), 13);
        assert_eq!(bits.next_unset(0), None);
        assert_eq!(bits.last_set(), Some(12));
    }

    #[test]
    fn prev_set_clamps_past_capacity() {
        let bits = from_indices(30, &[2, 25]);
        assert_eq!(bits.prev_set(1_000), Some(25));
        assert_eq!(bits.prev_set(24), Some(2));
        assert_eq!(bits.prev_set(1), None);
    }

    #[test]
    fn invert_toggles() {
        let mut bits = Bitset::init(8).unwrap();
        bits.invert(5).unwrap();
        assert!(bits.test(5));
        bits.invert(5).unwrap();
        assert!(!bits.is_occupied());
        assert!(bits.invert(8).is_err());
    }

    #[test]
    fn intersect_is_bitwise_and() {
        // A historical variant OR-ed here; the result must be the intersection.
        let mut a = from_indices(16, &[1, 2, 3, 9]);
        let b = from_indices(16, &[2, 3, 4, 12]);
        a.intersect_with(&b);
        assert_eq!(a.iter().collect::<Vec<_>>(), vec![2, 3]);
        assert_eq!(a.first_set(), Some(2));
    }

    #[test]
    fn intersect_with_smaller_operand_clears_tail() {
        let mut a = from_indices(32, &[1, 20, 31]);
        let b = from_indices(8, &[1]);
        a.intersect_with(&b);
        assert_eq!(a.iter().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn algebra_rejects_larger_operand() {
        let mut small = from_indices(8, &[0]);
        let big = from_indices(16, &[15]);
        let before = small.clone();
        assert!(small.copy_from(&big).is_err());
        assert!(small.union_with(&big).is_err());
        assert!(small.difference_from(&big).is_err());
        assert!(small.symmetric_difference_with(&big).is_err());
        assert_eq!(small, before);
    }

    #[test]
    fn symmetric_difference_with_empty_is_noop() {
        let mut a = from_indices(8, &[3]);
        let empty = Bitset::init(64).unwrap();
        assert!(a.symmetric_difference_with(&empty).is_ok());
        assert_eq!(a.iter().collect::<Vec<_>>(), vec![3]);
    }

    #[test]
    fn difference_of_self_is_empty() {
        let a = from_indices(40, &[0, 7, 8, 39]);
        let mut b = a.clone();
        b.difference_with(&a);
        assert!(!b.is_occupied());
    }

    #[test]
    fn reinit_resets_capacity_and_contents() {
        let mut bits = from_indices(8, &[1]);
        bits.reinit(100).unwrap();
        assert_eq!(bits.capacity(), 100);
        assert!(!bits.is_occupied());
    }

    #[test]
    fn display_groups_bytes_and_lines() {
        let bits = from_indices(72, &[0, 9, 71]);
        let expected = format!(
            "10000000 01000000 {} \n00000001 ",
            ["00000000"; 6].join(" ")
        );
        assert_eq!(bits.to_string(), expected);
    }
}
