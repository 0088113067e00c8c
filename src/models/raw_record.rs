//! Fixed-layout views for the raw-binary tick frame.
//!
//! The raw frame stores each tick as a canonical 56-byte little-endian
//! record, independent of the in-memory layout of [`MarketTick`]. The
//! views are built on `zerocopy` with little-endian field wrappers, so
//! reading a frame never copies and never requires `unsafe`; all
//! structs derive `Unaligned` and stay valid on arbitrarily aligned
//! buffers.
//!
//! Record layout (offsets in bytes):
//!
//! | field | offset |
//! |-------|--------|
//! | `time_ms` | 0 |
//! | `received_ms` | 8 |
//! | `ask` | 16 |
//! | `bid` | 24 |
//! | `last` | 32 |
//! | `volume` | 40 |
//! | `flags` | 48 |

use zerocopy::little_endian::{F64 as LeF64, U64 as LeU64};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Ref, Unaligned};

use super::tick::{MarketTick, TickUpdateFlags};

/// Size of one serialized tick record in the raw-binary frame.
pub const RAW_TICK_SIZE: usize = 56;

/// Canonical on-disk image of a [`MarketTick`].
#[repr(C)]
#[derive(
  Clone, Copy, Debug, Default, Unaligned, KnownLayout, Immutable, FromBytes, IntoBytes,
)]
pub struct RawTickRecord {
  pub time_ms: LeU64,     // 0..8
  pub received_ms: LeU64, // 8..16
  pub ask: LeF64,         // 16..24
  pub bid: LeF64,         // 24..32
  pub last: LeF64,        // 32..40
  pub volume: LeF64,      // 40..48
  pub flags: LeU64,       // 48..56
}

impl RawTickRecord {
  /// Rebuilds the in-memory tick. Unknown flag bits are dropped.
  pub fn to_tick(&self) -> MarketTick {
    MarketTick {
      time_ms: self.time_ms.get(),
      received_ms: self.received_ms.get(),
      ask: self.ask.get(),
      bid: self.bid.get(),
      last: self.last.get(),
      volume: self.volume.get(),
      flags: TickUpdateFlags::from_bits_truncate(self.flags.get()),
    }
  }
}

impl From<&MarketTick> for RawTickRecord {
  fn from(tick: &MarketTick) -> Self {
    Self {
      time_ms: LeU64::new(tick.time_ms),
      received_ms: LeU64::new(tick.received_ms),
      ask: LeF64::new(tick.ask),
      bid: LeF64::new(tick.bid),
      last: LeF64::new(tick.last),
      volume: LeF64::new(tick.volume),
      flags: LeU64::new(tick.flags.bits()),
    }
  }
}

/// Tries to view `slice` as a sequence of raw tick records.
///
/// Returns `None` unless the slice length is an exact multiple of
/// [`RAW_TICK_SIZE`].
#[inline]
pub fn as_raw_records(slice: &[u8]) -> Option<Ref<&[u8], [RawTickRecord]>> {
  Ref::<_, [RawTickRecord]>::from_bytes(slice).ok()
}
