use zerocopy::IntoBytes;

use crate::encoding::{vbyte, zigzag};
use crate::errors::CodecError;
use crate::models::{
  as_raw_records, MarketTick, RawTickRecord, TickCodecConfig, TickStorageFlags, RAW_TICK_SIZE,
};

use super::serializer::TickSerializer;

const HOUR_MS: u64 = 3_600_000;

/// Uncompressed tick serializer (frame signature `0x00`).
///
/// Stores the canonical little-endian image of every record after a
/// small header. The frame exists for debugging and for loss-free
/// archival of blocks the compressor cannot take; prices and volumes
/// pass through bit-exact with no precision rounding.
#[derive(Debug, Default)]
pub struct RawTickSerializer {
  config: TickCodecConfig,
}

impl RawTickSerializer {
  /// First byte of every raw-binary frame.
  pub const SIGNATURE: u8 = 0x00;

  pub fn new() -> Self {
    Self::default()
  }

  fn serialize(&mut self, ticks: &[MarketTick], output: &mut Vec<u8>) -> Result<(), CodecError> {
    if ticks.is_empty() {
      return Ok(());
    }
    if !self.config.has_flag(TickStorageFlags::STORE_RAW_BINARY) {
      return Err(CodecError::UnsupportedConfig(
        "STORE_RAW_BINARY must be set before encoding a raw-binary tick frame",
      ));
    }
    self.config.validate_precision()?;

    output.reserve(ticks.len() * RAW_TICK_SIZE + 24);
    output.push(Self::SIGNATURE);
    vbyte::append_u32(output, ticks.len() as u32);

    let mut header = self.config.price_digits & 0x1F;
    if self.config.has_flag(TickStorageFlags::ENABLE_TICK_FLAGS) {
      header |= 0x20;
    }
    if self.config.has_flag(TickStorageFlags::TRADE_BASED) {
      header |= 0x40;
    }
    if self.config.has_flag(TickStorageFlags::ENABLE_VOLUME) {
      header |= 0x80;
    }
    output.push(header);
    output.push(self.config.volume_digits & 0x1F);

    let base_hour = ticks[0].time_ms / HOUR_MS;
    let base_time = base_hour * HOUR_MS;
    vbyte::append_u32(output, base_hour as u32);
    vbyte::append_u64(
      output,
      zigzag::encode_i64(self.config.expiration_time_ms as i64 - base_time as i64),
    );
    vbyte::append_u64(
      output,
      zigzag::encode_i64(self.config.next_expiration_time_ms as i64 - base_time as i64),
    );

    for tick in ticks {
      output.extend_from_slice(RawTickRecord::from(tick).as_bytes());
    }
    log::debug!("stored {} ticks in a raw-binary frame", ticks.len());
    Ok(())
  }

  fn deserialize(&mut self, input: &[u8], ticks: &mut Vec<MarketTick>) -> Result<(), CodecError> {
    let first = *input
      .first()
      .ok_or(CodecError::TruncatedInput("empty frame"))?;
    if first != Self::SIGNATURE {
      return Err(CodecError::BadSignature(first));
    }
    let mut offset = 1usize;
    let num_ticks = vbyte::read_u32(input, &mut offset)? as usize;

    let header = *input
      .get(offset)
      .ok_or(CodecError::TruncatedInput("missing frame header"))?;
    offset += 1;
    let mut flags = TickStorageFlags::STORE_RAW_BINARY;
    flags.set(TickStorageFlags::ENABLE_TICK_FLAGS, header & 0x20 != 0);
    flags.set(TickStorageFlags::TRADE_BASED, header & 0x40 != 0);
    flags.set(TickStorageFlags::ENABLE_VOLUME, header & 0x80 != 0);
    let price_digits = header & 0x1F;

    let header = *input
      .get(offset)
      .ok_or(CodecError::TruncatedInput("missing frame header"))?;
    offset += 1;
    let volume_digits = header & 0x1F;

    let base_hour = u64::from(vbyte::read_u32(input, &mut offset)?);
    let base_time = base_hour * HOUR_MS;
    let expiration_delta = zigzag::decode_i64(vbyte::read_u64(input, &mut offset)?);
    let next_expiration_delta = zigzag::decode_i64(vbyte::read_u64(input, &mut offset)?);

    self.config = TickCodecConfig {
      tick_size: self.config.tick_size,
      expiration_time_ms: (base_time as i64).wrapping_add(expiration_delta) as u64,
      next_expiration_time_ms: (base_time as i64).wrapping_add(next_expiration_delta) as u64,
      flags,
      price_digits,
      volume_digits,
    };

    let expected = num_ticks * RAW_TICK_SIZE;
    let body = input
      .get(offset..offset + expected)
      .ok_or(CodecError::TruncatedInput("raw tick payload shorter than the tick count"))?;
    let records = as_raw_records(body)
      .ok_or(CodecError::TruncatedInput("raw tick payload is not record-aligned"))?;

    ticks.reserve(num_ticks);
    for record in records.iter() {
      ticks.push(record.to_tick());
    }
    Ok(())
  }
}

impl TickSerializer for RawTickSerializer {
  fn configure(&mut self, config: TickCodecConfig) -> Result<(), CodecError> {
    self.config = config;
    Ok(())
  }

  fn config(&self) -> &TickCodecConfig {
    &self.config
  }

  fn probe(&self, input: &[u8]) -> bool {
    input.first() == Some(&Self::SIGNATURE)
  }

  fn encode(&mut self, ticks: &[MarketTick], output: &mut Vec<u8>) -> Result<(), CodecError> {
    self.serialize(ticks, output)
  }

  fn decode(&mut self, input: &[u8], ticks: &mut Vec<MarketTick>) -> Result<(), CodecError> {
    self.deserialize(input, ticks)
  }
}
