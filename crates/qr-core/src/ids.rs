//! Strongly typed, zero-cost identifier wrappers and the packet id sequence.
//!
//! All IDs are `Copy + Ord + Hash` so they can be used as map keys and sorted
//! collection elements without ceremony.  `NodeId`s are dense: a topology of
//! `n` nodes uses ids `0..n`, so `.index()` addresses the node `Vec` directly.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Generate a typed ID wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name(pub $inner);

        impl $name {
            /// Sentinel meaning "no valid ID".
            pub const INVALID: $name = $name(<$inner>::MAX);

            /// Cast to `usize` for direct use as a `Vec` index.
            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<$name> for usize {
            #[inline(always)]
            fn from(id: $name) -> usize {
                id.0 as usize
            }
        }

        impl TryFrom<usize> for $name {
            type Error = std::num::TryFromIntError;
            fn try_from(n: usize) -> Result<$name, Self::Error> {
                <$inner>::try_from(n).map($name)
            }
        }
    };
}

typed_id! {
    /// Index of a router in a `Topology`.
    pub struct NodeId(u32);
}

typed_id! {
    /// Globally unique packet identity, issued by [`PacketIdGen`].
    pub struct PacketId(u64);
}

// ── PacketIdGen ───────────────────────────────────────────────────────────────

/// Monotonic packet id sequence.
///
/// Injected into packet construction instead of a hidden process-wide
/// counter.  Ids start at 1 and strictly increase; `next` takes `&self` so a
/// single generator can be shared by several request sources.
#[derive(Debug)]
pub struct PacketIdGen {
    first: u64,
    next:  AtomicU64,
}

impl PacketIdGen {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    /// A sequence whose first issued id is `first`.
    pub fn starting_at(first: u64) -> Self {
        Self { first, next: AtomicU64::new(first) }
    }

    /// Issue the next id.
    #[inline]
    pub fn next_id(&self) -> PacketId {
        PacketId(self.next.fetch_add(1, Ordering::Relaxed))
    }

    /// How many ids this sequence has issued.
    pub fn issued(&self) -> u64 {
        self.next.load(Ordering::Relaxed).saturating_sub(self.first)
    }
}

impl Default for PacketIdGen {
    fn default() -> Self {
        Self::new()
    }
}
