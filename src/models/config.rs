use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::errors::CodecError;

/// Highest fixed-point precision accepted by the codecs.
pub const MAX_PRECISION_DIGITS: u8 = 18;

bitflags! {
  /// Flags controlling tick encoding, compression and storage.
  #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
  pub struct TickStorageFlags: u8 {
    /// Ticks are trade-sourced: `last`, `volume` and side are present.
    const TRADE_BASED = 1 << 0;
    /// Encode the aggressor-side column.
    const ENABLE_TICK_FLAGS = 1 << 1;
    /// Reserved for a future receive-time column; not consumed here.
    const ENABLE_RECV_TIME = 1 << 2;
    /// Encode the volume column.
    const ENABLE_VOLUME = 1 << 3;
    /// Emit the uncompressed raw-binary frame instead of the
    /// compressed frame.
    const STORE_RAW_BINARY = 1 << 5;
  }
}

/// Per-block codec parameters, persisted in the frame header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TickCodecConfig {
  /// Minimum price increment. Stored for metadata; decode does not
  /// depend on it.
  pub tick_size: f64,
  /// Contract expiration, milliseconds since epoch (0 for perpetual
  /// or spot instruments).
  pub expiration_time_ms: u64,
  /// Expiration of the next contract (0 if not defined).
  pub next_expiration_time_ms: u64,
  /// Encoding flags.
  pub flags: TickStorageFlags,
  /// Decimal places preserved for prices (0..=18).
  pub price_digits: u8,
  /// Decimal places preserved for volumes (0..=18).
  pub volume_digits: u8,
}

impl TickCodecConfig {
  /// Builds a configuration with the given flags and precisions; the
  /// metadata fields stay zero.
  pub fn new(flags: TickStorageFlags, price_digits: u8, volume_digits: u8) -> Self {
    Self {
      flags,
      price_digits,
      volume_digits,
      ..Self::default()
    }
  }

  /// Checks whether every flag in `flag` is set.
  #[inline]
  pub fn has_flag(&self, flag: TickStorageFlags) -> bool {
    self.flags.contains(flag)
  }

  /// Sets or clears `flag`.
  #[inline]
  pub fn set_flag(&mut self, flag: TickStorageFlags, value: bool) {
    self.flags.set(flag, value);
  }

  /// Rejects precisions beyond the supported 18 decimal digits.
  pub fn validate_precision(&self) -> Result<(), CodecError> {
    for digits in [self.price_digits, self.volume_digits] {
      if digits > MAX_PRECISION_DIGITS {
        return Err(CodecError::PrecisionOutOfRange { digits });
      }
    }
    Ok(())
  }
}
