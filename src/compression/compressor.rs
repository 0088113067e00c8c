use crate::encoding::{scaling, vbyte, zigzag};
use crate::errors::CodecError;
use crate::models::{MarketTick, TickCodecConfig, TickStorageFlags, TickUpdateFlags};

use super::columns;
use super::context::CodecContext;
use super::dictionary;
use super::serializer::TickSerializer;

const HOUR_MS: u64 = 3_600_000;

/// Columnar tick compressor (frame signature `0x01`).
///
/// Handles trade-sourced ticks where `last`, `volume` and the
/// aggressor side are meaningful. The column stream is assembled in a
/// reusable payload buffer, then wrapped in a dictionary-keyed zstd
/// frame. Not suitable for quote-only data such as order book
/// updates; those stay with the raw frame.
#[derive(Debug, Default)]
pub struct TickCompressor {
  context: CodecContext,
  payload: Vec<u8>,
  config: TickCodecConfig,
}

impl TickCompressor {
  /// First byte of every compressed frame.
  pub const SIGNATURE: u8 = 0x01;

  pub fn new() -> Self {
    Self::default()
  }

  fn compress(&mut self, ticks: &[MarketTick], output: &mut Vec<u8>) -> Result<(), CodecError> {
    if ticks.is_empty() {
      return Ok(());
    }
    if !self.config.has_flag(TickStorageFlags::TRADE_BASED) {
      return Err(CodecError::UnsupportedConfig(
        "TRADE_BASED must be set before encoding a compressed tick frame",
      ));
    }
    self.config.validate_precision()?;

    self.context.reset();
    self.payload.clear();

    let enable_tick_flags = self.config.has_flag(TickStorageFlags::ENABLE_TICK_FLAGS);
    let enable_volume = self.config.has_flag(TickStorageFlags::ENABLE_VOLUME);

    // Byte 0: price digits plus the storage-flag bits.
    let mut header = self.config.price_digits & 0x1F;
    if enable_tick_flags {
      header |= 0x20;
    }
    header |= 0x40; // TRADE_BASED, checked above
    if enable_volume {
      header |= 0x80;
    }
    self.payload.push(header);

    // Byte 1: volume digits, bit 5 marks LAST_UPDATED on the first tick.
    let mut header = self.config.volume_digits & 0x1F;
    if ticks[0].has_flag(TickUpdateFlags::LAST_UPDATED) {
      header |= 0x20;
    }
    self.payload.push(header);

    let base_hour = ticks[0].time_ms / HOUR_MS;
    let base_time = base_hour * HOUR_MS;
    vbyte::append_u32(&mut self.payload, base_hour as u32);
    vbyte::append_u64(
      &mut self.payload,
      zigzag::encode_i64(self.config.expiration_time_ms as i64 - base_time as i64),
    );
    vbyte::append_u64(
      &mut self.payload,
      zigzag::encode_i64(self.config.next_expiration_time_ms as i64 - base_time as i64),
    );

    let price_scale = scaling::pow10(self.config.price_digits)?;
    let initial_price = scaling::to_fixed_point(ticks[0].last, price_scale);
    let tick_size_scaled = scaling::to_fixed_point(self.config.tick_size, price_scale);
    vbyte::append_u64(&mut self.payload, initial_price as u64);
    vbyte::append_u64(&mut self.payload, tick_size_scaled as u64);

    columns::encode_price_column(
      &mut self.context,
      &mut self.payload,
      ticks,
      price_scale,
      initial_price,
    );
    if enable_volume {
      let volume_scale = scaling::pow10(self.config.volume_digits)?;
      columns::encode_volume_column(&mut self.context, &mut self.payload, ticks, volume_scale);
    }
    columns::encode_time_column(&mut self.context, &mut self.payload, ticks, base_time)?;
    if enable_tick_flags {
      columns::encode_side_flags(&mut self.payload, ticks);
    }

    log::debug!(
      "compressing {} ticks, {} column-stream bytes",
      ticks.len(),
      self.payload.len()
    );
    dictionary::compress_with_dictionary(
      &self.payload,
      Self::SIGNATURE,
      ticks.len() as u32,
      output,
    )
  }

  fn decompress(&mut self, input: &[u8], ticks: &mut Vec<MarketTick>) -> Result<(), CodecError> {
    let first = *input
      .first()
      .ok_or(CodecError::TruncatedInput("empty frame"))?;
    if first != Self::SIGNATURE {
      return Err(CodecError::BadSignature(first));
    }
    let mut offset = 1usize;
    let num_ticks = vbyte::read_u32(input, &mut offset)? as usize;
    if num_ticks == 0 {
      return Ok(());
    }

    self.context.reset();
    self.payload.clear();
    dictionary::decompress_with_dictionary(&input[offset..], &mut self.payload)?;
    log::debug!(
      "decompressing {} ticks from a {}-byte column stream",
      num_ticks,
      self.payload.len()
    );

    let mut offset = 0usize;
    let header = *self
      .payload
      .first()
      .ok_or(CodecError::TruncatedInput("missing frame header"))?;
    offset += 1;
    let mut flags = TickStorageFlags::empty();
    flags.set(TickStorageFlags::ENABLE_TICK_FLAGS, header & 0x20 != 0);
    flags.set(TickStorageFlags::TRADE_BASED, header & 0x40 != 0);
    flags.set(TickStorageFlags::ENABLE_VOLUME, header & 0x80 != 0);
    let price_digits = header & 0x1F;
    let enable_tick_flags = flags.contains(TickStorageFlags::ENABLE_TICK_FLAGS);
    let enable_volume = flags.contains(TickStorageFlags::ENABLE_VOLUME);

    let header = *self
      .payload
      .get(offset)
      .ok_or(CodecError::TruncatedInput("missing frame header"))?;
    offset += 1;
    let volume_digits = header & 0x1F;
    let first_last_updated = header & 0x20 != 0;

    let base_hour = u64::from(vbyte::read_u32(&self.payload, &mut offset)?);
    let base_time = base_hour * HOUR_MS;
    let expiration_delta = zigzag::decode_i64(vbyte::read_u64(&self.payload, &mut offset)?);
    let next_expiration_delta = zigzag::decode_i64(vbyte::read_u64(&self.payload, &mut offset)?);
    let initial_price = vbyte::read_u64(&self.payload, &mut offset)? as i64;
    let tick_size_scaled = vbyte::read_u64(&self.payload, &mut offset)? as i64;

    let price_scale = scaling::pow10(price_digits)?;
    self.config = TickCodecConfig {
      tick_size: scaling::from_fixed_point(tick_size_scaled, price_scale),
      expiration_time_ms: (base_time as i64).wrapping_add(expiration_delta) as u64,
      next_expiration_time_ms: (base_time as i64).wrapping_add(next_expiration_delta) as u64,
      flags,
      price_digits,
      volume_digits,
    };

    let start = ticks.len();
    ticks.resize(start + num_ticks, MarketTick::default());
    let out = &mut ticks[start..];

    columns::decode_price_column(
      &mut self.context,
      &self.payload,
      &mut offset,
      out,
      price_scale,
      initial_price,
    )?;
    if enable_volume {
      let volume_scale = scaling::pow10(volume_digits)?;
      columns::decode_volume_column(&mut self.context, &self.payload, &mut offset, out, volume_scale)?;
    }
    columns::decode_time_column(&mut self.context, &self.payload, &mut offset, out, base_time)?;
    if enable_tick_flags {
      columns::decode_side_flags(&self.payload, &mut offset, out)?;
    }
    if enable_volume {
      for tick in out.iter_mut() {
        tick.flags.insert(TickUpdateFlags::VOLUME_UPDATED);
      }
    }
    if first_last_updated {
      out[0].flags.insert(TickUpdateFlags::LAST_UPDATED);
    }
    Ok(())
  }
}

impl TickSerializer for TickCompressor {
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
    self.compress(ticks, output)
  }

  fn decode(&mut self, input: &[u8], ticks: &mut Vec<MarketTick>) -> Result<(), CodecError> {
    self.decompress(input, ticks)
  }
}
