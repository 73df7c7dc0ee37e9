//! Fixed-capacity bitsets and sliding windows over wrapping sequence numbers.
//!
//! [`Bitset`] is a plain bit vector with cached-hint scans and in-place set
//! algebra. [`SequenceWindow`] layers a circular buffer on top of it to track
//! which sequence numbers of an unbounded, wrapping stream are marked, as used
//! by packet-receipt, acknowledgment and repair bookkeeping.

pub mod constants;
pub mod error;
pub mod stdx;
#[doc(hidden)]
pub mod test_utils;
pub mod window;

pub use error::{ConfigError, Error};
pub use stdx::Bitset;
pub use window::{SequenceSpace, SequenceWindow, WindowBounds, WindowConfig};
