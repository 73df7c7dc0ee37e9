//! Sliding window over a wrapping sequence-number space.
//!
//! A [`SequenceWindow`] records which sequence numbers of an unbounded, wrapping
//! stream are marked (received, acknowledged, pending repair, ...) while storing
//! only `capacity` bits. Storage is a [`Bitset`] used as a circular buffer:
//!
//! ```text
//!   storage position:  0 ........ end ............ start ......... capacity-1
//!                      |  window  |      gap       |     window     |
//!   sequence number:      ...                      offset, offset+1, ...
//! ```
//!
//! `offset` is the lowest marked sequence number and is stored at position `start`;
//! the highest marked sequence number is stored at `end`. Both boundary bits are
//! always set, and every set bit lies in the circular span `[start, end]`.
//!
//! Marking a sequence number outside the span slides the window: backward moves
//! `start`/`offset`, forward moves `end`. A mark is rejected when the resulting
//! span would exceed `capacity`. Clearing a boundary bit rescans for the new
//! boundary, and clearing the last bit empties the window.

use core::fmt;

use log::{debug, trace};

use super::circular::SequenceSpace;
use super::config::WindowConfig;
use crate::error::Error;
use crate::stdx::Bitset;
use crate::stdx::bitset::write_dump;

/// Placement of an occupied window in storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowBounds {
    /// Storage position of `offset`.
    pub start: usize,
    /// Storage position of the highest marked sequence number.
    pub end: usize,
    /// Lowest marked sequence number.
    pub offset: u32,
}

/// Fixed-capacity tracker of marked sequence numbers.
///
/// # Examples
/// ```
/// use seqmask::window::{SequenceWindow, WindowConfig};
///
/// let mut window = SequenceWindow::with_config(WindowConfig::seq16(16)).unwrap();
/// window.set(0xFFFE).unwrap();
/// window.set(0x0003).unwrap();
/// assert!(window.test(0xFFFE));
/// assert!(!window.test(0xFFFF));
/// assert_eq!(window.next_set(0xFFFF), Some(0x0003));
/// ```
#[derive(Clone)]
pub struct SequenceWindow {
    bits: Bitset,
    space: SequenceSpace,
    bounds: Option<WindowBounds>,
}

impl SequenceWindow {
    /// Creates an empty window of `capacity` bits over `[0, modulus_mask]`.
    pub fn init(capacity: usize, modulus_mask: u32) -> Result<Self, Error> {
        Self::with_config(WindowConfig {
            capacity,
            modulus_mask,
        })
    }

    pub fn with_config(config: WindowConfig) -> Result<Self, Error> {
        let space = config.validate()?;
        let bits = Bitset::init(config.capacity)?;
        Ok(Self {
            bits,
            space,
            bounds: None,
        })
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.bits.capacity()
    }

    #[inline]
    pub fn modulus_mask(&self) -> u32 {
        self.space.mask()
    }

    #[inline]
    pub fn space(&self) -> SequenceSpace {
        self.space
    }

    pub fn config(&self) -> WindowConfig {
        WindowConfig {
            capacity: self.capacity(),
            modulus_mask: self.space.mask(),
        }
    }

    /// Current placement, or `None` when nothing is marked.
    #[inline]
    pub fn bounds(&self) -> Option<WindowBounds> {
        self.bounds
    }

    #[inline]
    pub fn is_occupied(&self) -> bool {
        self.bounds.is_some()
    }

    /// Number of sequence numbers from the first to the last marked one, inclusive.
    pub fn span(&self) -> usize {
        self.bounds.map_or(0, |b| self.extent(&b) + 1)
    }

    /// Number of marked sequence numbers.
    pub fn count(&self) -> usize {
        self.bits.count()
    }

    // =========================================================================
    // Position mapping
    // =========================================================================

    /// Logical offset of `end` from `start`; the window covers `[0, extent]`.
    #[inline]
    fn extent(&self, b: &WindowBounds) -> usize {
        let cap = self.capacity();
        (b.end + cap - b.start) % cap
    }

    /// Storage position of logical offset `k`.
    #[inline]
    fn position(&self, b: &WindowBounds, k: usize) -> usize {
        debug_assert!(k < self.capacity());
        (b.start + k) % self.capacity()
    }

    /// Logical offset of storage position `pos`.
    #[inline]
    fn logical(&self, b: &WindowBounds, pos: usize) -> usize {
        let cap = self.capacity();
        (pos + cap - b.start) % cap
    }

    #[inline]
    fn seq_at(&self, b: &WindowBounds, k: usize) -> u32 {
        self.space.add(b.offset, k as i64)
    }

    /// Logical offset of `seq` if it lies inside the occupied span.
    fn locate(&self, seq: u32) -> Option<(WindowBounds, usize)> {
        let b = self.bounds?;
        let d = self.space.delta(seq, b.offset);
        (d >= 0 && d as usize <= self.extent(&b)).then_some((b, d as usize))
    }

    /// Checks that logical offsets `[lo, hi]` (relative to `offset`) fit alongside
    /// the current span. Returns the lowest logical offset of the merged span.
    fn admit(&self, b: &WindowBounds, lo: i64, hi: i64) -> Result<i64, Error> {
        let new_lo = lo.min(0);
        let new_hi = hi.max(self.extent(b) as i64);
        let span = new_hi - new_lo + 1;
        if span > self.capacity() as i64 {
            return Err(Error::CapacityExceeded {
                span: span as u64,
                capacity: self.capacity(),
            });
        }
        Ok(new_lo)
    }

    /// Checks that a span of `extent + 1` sequence numbers starting at `first`
    /// could be merged into this window.
    fn admit_span(&self, first: u32, extent: usize) -> Result<(), Error> {
        match self.bounds {
            Some(b) => {
                let lo = self.space.delta(first, b.offset);
                self.admit(&b, lo, lo + extent as i64).map(|_| ())
            }
            None if extent < self.capacity() => Ok(()),
            None => Err(Error::CapacityExceeded {
                span: extent as u64 + 1,
                capacity: self.capacity(),
            }),
        }
    }

    /// Writes `value` into `count` storage bits starting at logical offset `k`,
    /// splitting the run where it wraps past the end of storage.
    fn assign(&mut self, b: &WindowBounds, k: usize, count: usize, value: bool) {
        let cap = self.capacity();
        debug_assert!(count <= cap);
        let pos = self.position(b, k);
        let head = count.min(cap - pos);
        self.bits.assign_run(pos, head, value);
        self.bits.assign_run(0, count - head, value);
    }

    /// Nearest set storage position at or after `pos`, wrapping past the end.
    ///
    /// Only positions inside the span are ever set, so the first hit in circular
    /// order is the next marked sequence number.
    fn next_set_position(&self, pos: usize) -> Option<usize> {
        self.bits.next_set(pos).or_else(|| self.bits.first_set())
    }

    /// Nearest set storage position at or before `pos`, wrapping past the start.
    fn prev_set_position(&self, pos: usize) -> Option<usize> {
        self.bits.prev_set(pos).or_else(|| self.bits.last_set())
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Returns `true` if [`set`](Self::set) would accept `seq`.
    pub fn can_set(&self, seq: u32) -> bool {
        match self.bounds {
            Some(b) => {
                let d = self.space.delta(seq, b.offset);
                self.admit(&b, d, d).is_ok()
            }
            None => true,
        }
    }

    /// Marks `seq`, sliding the window if needed.
    pub fn set(&mut self, seq: u32) -> Result<(), Error> {
        self.set_range(seq, 1)
    }

    /// Marks `count` consecutive sequence numbers starting at `seq`.
    ///
    /// All-or-nothing: fails without mutation when the merged span would exceed
    /// capacity. A run may wrap past both the modulus and the end of storage.
    pub fn set_range(&mut self, seq: u32, count: usize) -> Result<(), Error> {
        if count == 0 {
            return Ok(());
        }
        let cap = self.capacity();
        if count > cap {
            return Err(Error::CapacityExceeded {
                span: count as u64,
                capacity: cap,
            });
        }
        let seq = seq & self.space.mask();

        let Some(mut b) = self.bounds else {
            let b = WindowBounds {
                start: 0,
                end: count - 1,
                offset: seq,
            };
            self.assign(&b, 0, count, true);
            self.bounds = Some(b);
            trace!("window anchored at {seq} with {count} bits");
            return Ok(());
        };

        let lo = self.space.delta(seq, b.offset);
        let hi = lo + count as i64 - 1;
        let new_lo = match self.admit(&b, lo, hi) {
            Ok(new_lo) => new_lo,
            Err(e) => {
                debug!(
                    "rejecting {count} bits at {seq}: window at {} spans {}, {e}",
                    b.offset,
                    self.extent(&b) + 1
                );
                return Err(e);
            }
        };
        let new_hi = hi.max(self.extent(&b) as i64);

        if new_lo < 0 {
            b.start = (b.start as i64 + new_lo).rem_euclid(cap as i64) as usize;
            b.offset = seq;
            trace!("window slid back {} to {seq}", -new_lo);
        }
        b.end = self.position(&b, (new_hi - new_lo) as usize);
        self.assign(&b, (lo - new_lo) as usize, count, true);
        self.bounds = Some(b);
        Ok(())
    }

    /// Clears `seq`. A no-op outside the occupied span.
    pub fn unset(&mut self, seq: u32) {
        self.unset_range(seq, 1);
    }

    /// Clears `count` consecutive sequence numbers starting at `seq`.
    ///
    /// The run is clamped to capacity and to the occupied span; the parts outside
    /// are ignored.
    pub fn unset_range(&mut self, seq: u32, count: usize) {
        let Some(mut b) = self.bounds else {
            return;
        };
        if count == 0 {
            return;
        }
        let count = count.min(self.capacity());
        let extent = self.extent(&b);

        let lo = self.space.delta(seq, b.offset);
        let hi = lo + count as i64 - 1;
        let lo_k = lo.max(0);
        let hi_k = hi.min(extent as i64);
        if lo_k > hi_k {
            return;
        }
        let (lo_k, hi_k) = (lo_k as usize, hi_k as usize);
        self.assign(&b, lo_k, hi_k - lo_k + 1, false);

        if lo_k == 0 && hi_k == extent {
            debug_assert!(!self.bits.is_occupied());
            self.bounds = None;
            trace!("window emptied at {}", b.offset);
            return;
        }

        if lo_k == 0 {
            let from = self.position(&b, hi_k + 1);
            let Some(next) = self.next_set_position(from) else {
                debug_assert!(false, "window end bit is clear");
                self.clear();
                return;
            };
            let k = self.logical(&b, next);
            debug_assert!(k > hi_k && k <= extent);
            b.offset = self.seq_at(&b, k);
            b.start = next;
        } else if hi_k == extent {
            let from = self.position(&b, lo_k - 1);
            let Some(prev) = self.prev_set_position(from) else {
                debug_assert!(false, "window start bit is clear");
                self.clear();
                return;
            };
            debug_assert!(self.logical(&b, prev) < lo_k);
            b.end = prev;
        }
        self.bounds = Some(b);
    }

    /// Flips `seq`.
    pub fn invert(&mut self, seq: u32) -> Result<(), Error> {
        if self.test(seq) {
            self.unset(seq);
            Ok(())
        } else {
            self.set(seq)
        }
    }

    /// Clears every mark.
    pub fn clear(&mut self) {
        self.bits.clear();
        self.bounds = None;
    }

    /// Marks the whole capacity, starting at `seq`.
    pub fn fill(&mut self, seq: u32) {
        self.bits.fill();
        self.bounds = Some(WindowBounds {
            start: 0,
            end: self.capacity() - 1,
            offset: seq & self.space.mask(),
        });
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Returns `true` if `seq` is marked. Anything outside the span reads as unmarked.
    pub fn test(&self, seq: u32) -> bool {
        self.locate(seq)
            .is_some_and(|(b, k)| self.bits.test(self.position(&b, k)))
    }

    /// Lowest marked sequence number.
    #[inline]
    pub fn first_set(&self) -> Option<u32> {
        self.bounds.map(|b| b.offset)
    }

    /// Highest marked sequence number.
    pub fn last_set(&self) -> Option<u32> {
        self.bounds.map(|b| self.seq_at(&b, self.extent(&b)))
    }

    /// Nearest marked sequence number at or after `seq`.
    ///
    /// Sequence numbers behind the window answer with [`first_set`](Self::first_set);
    /// those past the span answer `None`.
    pub fn next_set(&self, seq: u32) -> Option<u32> {
        let b = self.bounds?;
        let d = self.space.delta(seq, b.offset);
        if d < 0 {
            return Some(b.offset);
        }
        if d as usize > self.extent(&b) {
            return None;
        }
        let found = self.next_set_position(self.position(&b, d as usize))?;
        Some(self.seq_at(&b, self.logical(&b, found)))
    }

    /// Nearest marked sequence number at or before `seq`.
    ///
    /// Sequence numbers past the span answer with [`last_set`](Self::last_set);
    /// those behind the window answer `None`.
    pub fn prev_set(&self, seq: u32) -> Option<u32> {
        let b = self.bounds?;
        let d = self.space.delta(seq, b.offset);
        if d < 0 {
            return None;
        }
        if d as usize > self.extent(&b) {
            return self.last_set();
        }
        let found = self.prev_set_position(self.position(&b, d as usize))?;
        Some(self.seq_at(&b, self.logical(&b, found)))
    }

    /// Nearest unmarked sequence number at or after `seq` within the representable
    /// range `[offset, offset + capacity)`.
    ///
    /// An empty window answers `seq`; a `seq` outside the representable range, or
    /// a fully marked tail, answers `None`.
    pub fn next_unset(&self, seq: u32) -> Option<u32> {
        let seq = seq & self.space.mask();
        let Some(b) = self.bounds else {
            return Some(seq);
        };
        let d = self.space.delta(seq, b.offset);
        if d < 0 || d as usize >= self.capacity() {
            return None;
        }
        if d as usize > self.extent(&b) {
            return Some(seq);
        }

        // Logical order from `pos` runs to the end of storage, then from 0 up to
        // `start`.
        let pos = self.position(&b, d as usize);
        let found = if b.start > pos {
            self.bits.next_unset(pos).filter(|&p| p < b.start)
        } else {
            self.bits
                .next_unset(pos)
                .or_else(|| self.bits.next_unset(0).filter(|&p| p < b.start))
        };
        found.map(|p| self.seq_at(&b, self.logical(&b, p)))
    }

    /// Iterates marked sequence numbers in circular order from `offset`.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        let last = self.last_set();
        let mut next = self.first_set();
        core::iter::from_fn(move || {
            let current = next?;
            next = if Some(current) == last {
                None
            } else {
                self.next_set(self.space.add(current, 1))
            };
            Some(current)
        })
    }

    // =========================================================================
    // Set algebra
    //
    // Each operation walks the occupied span of one operand in sequence-number
    // space, so cost tracks the span rather than the capacity.
    // =========================================================================

    fn ensure_same_space(&self, other: &SequenceWindow) -> Result<(), Error> {
        if self.space != other.space {
            return Err(Error::ModulusMismatch {
                expected: self.space.mask(),
                found: other.space.mask(),
            });
        }
        Ok(())
    }

    /// Replaces the contents with `other`'s. Fails if `other`'s span does not fit.
    pub fn copy_from(&mut self, other: &SequenceWindow) -> Result<(), Error> {
        self.ensure_same_space(other)?;
        if other.span() > self.capacity() {
            return Err(Error::CapacityExceeded {
                span: other.span() as u64,
                capacity: self.capacity(),
            });
        }

        self.clear();
        for seq in other.iter() {
            self.set(seq)?;
        }
        Ok(())
    }

    /// `self |= other`.
    pub fn union_with(&mut self, other: &SequenceWindow) -> Result<(), Error> {
        self.ensure_same_space(other)?;
        let Some(first) = other.first_set() else {
            return Ok(());
        };
        if !self.is_occupied() {
            return self.copy_from(other);
        }
        self.admit_span(first, other.span() - 1)?;
        for seq in other.iter() {
            self.set(seq)?;
        }
        Ok(())
    }

    /// `self &= !other`: keeps the marks unique to `self`.
    pub fn difference_with(&mut self, other: &SequenceWindow) -> Result<(), Error> {
        self.ensure_same_space(other)?;
        let (Some(first), true) = (self.first_set(), other.is_occupied()) else {
            return Ok(());
        };
        for k in 0..self.span() {
            let seq = self.space.add(first, k as i64);
            if self.test(seq) && other.test(seq) {
                self.unset(seq);
            }
        }
        Ok(())
    }

    /// `self = other & !self`: keeps the marks unique to `other`.
    ///
    /// The result is built aside and swapped in, so a failure leaves `self` as it
    /// was.
    pub fn difference_from(&mut self, other: &SequenceWindow) -> Result<(), Error> {
        self.ensure_same_space(other)?;
        let mut result = Self::with_config(self.config())?;
        for seq in other.iter() {
            if !self.test(seq) {
                result.set(seq)?;
            }
        }
        *self = result;
        Ok(())
    }

    /// `self &= other`.
    pub fn intersect_with(&mut self, other: &SequenceWindow) -> Result<(), Error> {
        self.ensure_same_space(other)?;
        if !other.is_occupied() {
            self.clear();
            return Ok(());
        }
        let Some(first) = self.first_set() else {
            return Ok(());
        };
        for k in 0..self.span() {
            let seq = self.space.add(first, k as i64);
            if self.test(seq) && !other.test(seq) {
                self.unset(seq);
            }
        }
        Ok(())
    }

    /// `self ^= other`. A no-op when `other` is empty.
    ///
    /// Fails without mutation unless the union of both spans fits.
    pub fn symmetric_difference_with(&mut self, other: &SequenceWindow) -> Result<(), Error> {
        self.ensure_same_space(other)?;
        let Some(first) = other.first_set() else {
            return Ok(());
        };
        self.admit_span(first, other.span() - 1)?;
        for seq in other.iter() {
            self.invert(seq)?;
        }
        Ok(())
    }

    // =========================================================================
    // Resize
    // =========================================================================

    /// Changes the capacity, keeping every mark that still fits.
    ///
    /// When shrinking, marks `new_capacity` or more past `first_set` are dropped.
    /// On failure the window is left exactly as it was.
    pub fn resize(&mut self, new_capacity: usize) -> Result<(), Error> {
        let old_capacity = self.capacity();
        let fresh = Self::with_config(self.config().with_capacity(new_capacity))?;
        let mut snapshot = core::mem::replace(self, fresh);

        if new_capacity < old_capacity {
            if let Some(first) = snapshot.first_set() {
                let trim_from = snapshot.space.add(first, new_capacity as i64);
                snapshot.unset_range(trim_from, old_capacity - new_capacity);
            }
        }

        if let Err(e) = self.copy_from(&snapshot) {
            debug!("resize {old_capacity} -> {new_capacity} failed: {e}");
            *self = snapshot;
            return Err(e);
        }
        debug!(
            "resized window {old_capacity} -> {new_capacity}, {} marks kept",
            self.count()
        );
        Ok(())
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    /// Logs the first `limit` bits of the window, starting at `offset`, at debug
    /// level.
    pub fn log_dump(&self, limit: usize) {
        if !log::log_enabled!(log::Level::Debug) {
            return;
        }
        let offset = self.first_set().unwrap_or(0);
        let mut dump = String::new();
        let bits = (0..limit.min(self.capacity()))
            .map(|k| self.test(self.space.add(offset, k as i64)));
        if write_dump(&mut dump, bits).is_ok() {
            debug!("window offset {offset}:\n{dump}");
        }
    }
}

impl PartialEq for SequenceWindow {
    /// Windows are equal when they mark the same sequence numbers with the same
    /// configuration, regardless of where the marks sit in storage.
    fn eq(&self, other: &Self) -> bool {
        self.config() == other.config() && self.iter().eq(other.iter())
    }
}

impl Eq for SequenceWindow {}

impl fmt::Debug for SequenceWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SequenceWindow")
            .field("capacity", &self.capacity())
            .field("modulus_mask", &format_args!("{:#x}", self.space.mask()))
            .field("bounds", &self.bounds)
            .field("count", &self.count())
            .finish()
    }
}

/// Dumps `capacity` bits starting at `offset`, grouped like [`Bitset`]'s dump.
impl fmt::Display for SequenceWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let offset = self.first_set().unwrap_or(0);
        write_dump(
            f,
            (0..self.capacity()).map(|k| self.test(self.space.add(offset, k as i64))),
        )
    }
}

#[cfg(test)]
#[path = "sequence_window_tests.rs"]
mod sequence_window_tests;
