//! Packed `(tid, clock)` epochs.
//!
//! An [`Epoch`] is a thread id and a logical clock value packed into a
//! single `u64` so that shadow state (see `racetrack-shadow`) can store the
//! last-write / last-read epoch of a memory location as one atomic word and
//! compare it without decoding into two fields on the fast path.

use crate::vector_clock::VectorClock;
use std::fmt;

/// Bits reserved for the thread id in the high part of the packed word.
const TID_BITS: u32 = 24;
/// Bits reserved for the logical clock in the low part of the packed word.
const CLK_BITS: u32 = 64 - TID_BITS;
const CLK_MASK: u64 = (1u64 << CLK_BITS) - 1;

/// Thread identifier: small, dense, assigned by the engine on `NewThread`.
pub type Tid = u32;
/// Logical clock value within one thread's vector-clock entry.
pub type Clk = u64;

/// A packed `(tid, clk)` pair.
///
/// `tid` occupies the top [`TID_BITS`] bits, `clk` the remaining low bits.
/// Two epochs from different tids are not meaningfully ordered by raw
/// integer comparison; use [`Epoch::leq`] against a [`VectorClock`] instead.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Epoch(u64);

impl Epoch {
    /// Sentinel meaning "no access has happened yet".
    pub const ZERO: Epoch = Epoch(0);

    /// Sentinel occupying a `ShadowVar`'s read slot once it has been read by
    /// two or more threads without an intervening write. Never produced by
    /// [`Epoch::make`] (its packed tid/clk bits do not correspond to a real
    /// thread); compare with [`Epoch::is_read_shared`], not `==` on the tid.
    pub const READ_SHARED: Epoch = Epoch(u64::MAX);

    /// Packs a `(tid, clk)` pair. Panics if `tid` or `clk` overflow their
    /// reserved bit widths — the engine is expected to reject `NewThread`
    /// beyond `max_tid` long before this would trip.
    #[inline]
    pub fn make(tid: Tid, clk: Clk) -> Epoch {
        debug_assert!((tid as u64) < (1u64 << TID_BITS), "tid overflows epoch bits");
        debug_assert!(clk <= CLK_MASK, "clk overflows epoch bits");
        Epoch(((tid as u64) << CLK_BITS) | (clk & CLK_MASK))
    }

    /// The packed thread id. Meaningless for [`Epoch::READ_SHARED`].
    #[inline]
    pub fn tid(self) -> Tid {
        (self.0 >> CLK_BITS) as Tid
    }

    /// The packed clock value. Meaningless for [`Epoch::READ_SHARED`].
    #[inline]
    pub fn clk(self) -> Clk {
        self.0 & CLK_MASK
    }

    #[inline]
    pub fn is_read_shared(self) -> bool {
        self == Epoch::READ_SHARED
    }

    #[inline]
    pub fn is_zero(self) -> bool {
        self == Epoch::ZERO
    }

    /// `leq(e, V)`: is `e`'s clock already observed by `V` at `tid(e)`?
    ///
    /// This is the core happens-before test used throughout the FastTrack
    /// rules: an access at epoch `e` happened-before the accessor holding
    /// vector clock `V` iff `clk(e) <= V.get(tid(e))`.
    #[inline]
    pub fn leq(self, v: &VectorClock) -> bool {
        self.clk() <= v.get(self.tid())
    }

    /// Raw packed value, for storing in an `AtomicU64` shadow slot.
    #[inline]
    pub fn to_raw(self) -> u64 {
        self.0
    }

    #[inline]
    pub fn from_raw(raw: u64) -> Epoch {
        Epoch(raw)
    }
}

impl fmt::Debug for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_read_shared() {
            write!(f, "Epoch(READ_SHARED)")
        } else {
            write!(f, "Epoch({}@{})", self.tid(), self.clk())
        }
    }
}

/// Widened variant for programs whose logical clocks exceed the narrow
/// 40-bit range a packed [`Epoch`] affords. Not packed into one word —
/// the engine falls back to this representation per-`ShadowVar` only when
/// a clock has actually overflowed, which is rare in practice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct LongEpoch {
    pub tid: Tid,
    pub clk: u64,
}

impl LongEpoch {
    pub fn make(tid: Tid, clk: u64) -> LongEpoch {
        LongEpoch { tid, clk }
    }

    #[inline]
    pub fn leq(self, v: &VectorClock) -> bool {
        self.clk <= v.get(self.tid)
    }
}
