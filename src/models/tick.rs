use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
  /// Field-update and trade-direction flags carried by each tick.
  #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
  pub struct TickUpdateFlags: u64 {
    /// Bid price changed with this tick.
    const BID_UPDATED = 1 << 0;
    /// Ask price changed with this tick.
    const ASK_UPDATED = 1 << 1;
    /// Last trade price changed with this tick.
    const LAST_UPDATED = 1 << 2;
    /// Trade volume changed with this tick.
    const VOLUME_UPDATED = 1 << 3;
    /// The trade was initiated by a buyer (lifted the ask).
    const TICK_FROM_BUY = 1 << 4;
    /// The trade was initiated by a seller (hit the bid).
    const TICK_FROM_SELL = 1 << 5;
    /// The trade matched the best price in the order book.
    const BEST_MATCH = 1 << 6;
  }
}

/// A single trade observation.
///
/// Records inside one encoded block must be in non-decreasing `time_ms`
/// order; duplicate timestamps are permitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketTick {
  /// Tick timestamp, milliseconds since the Unix epoch.
  pub time_ms: u64,
  /// Local receive timestamp, milliseconds since the Unix epoch.
  pub received_ms: u64,
  /// Best ask price.
  pub ask: f64,
  /// Best bid price.
  pub bid: f64,
  /// Last trade price.
  pub last: f64,
  /// Trade size in base units.
  pub volume: f64,
  /// Update flags for this tick.
  pub flags: TickUpdateFlags,
}

impl MarketTick {
  /// Builds a trade tick; `ask`, `bid` and `received_ms` stay zero.
  pub fn trade(time_ms: u64, last: f64, volume: f64, flags: TickUpdateFlags) -> Self {
    Self {
      time_ms,
      last,
      volume,
      flags,
      ..Self::default()
    }
  }

  /// Checks whether every flag in `flag` is set.
  #[inline]
  pub fn has_flag(&self, flag: TickUpdateFlags) -> bool {
    self.flags.contains(flag)
  }

  /// Sets or clears `flag`.
  #[inline]
  pub fn set_flag(&mut self, flag: TickUpdateFlags, value: bool) {
    self.flags.set(flag, value);
  }
}
