//! Column pipelines for the compressed tick frame.
//!
//! Every integer column runs the same skeleton: scale/transform, then
//! frequency remap, then zero-run RLE over the rank stream, and the
//! result is emitted as three pieces behind a single length word:
//!
//! 1. `vbyte32(sorted_values_len << 1 | wide_flag)`;
//! 2. the distinct values, delta-sorted and bit-packed (or
//!    vbyte-encoded when `wide_flag` marks a 64-bit table);
//! 3. the sorted-position-to-rank map, delta + zig-zag + bit-packed;
//! 4. `vbyte32(rle_len)` and the RLE token stream — bit-packed for the
//!    price column, vbyte for volume and time.
//!
//! The 32-bit paths report overflow instead of producing output; the
//! column encoders catch that and rerun the whole column on the 64-bit
//! path with `wide_flag` set. Overflow never escapes this module.

use crate::encoding::{bitpack, delta, frequency, rle, scaling, vbyte, zigzag, Overflow};
use crate::errors::CodecError;
use crate::models::{MarketTick, TickUpdateFlags};

use super::context::CodecContext;

/// Low bit of the sorted-values length word; set when the value table
/// holds 64-bit entries.
pub(crate) const WIDE_VALUES_FLAG: u32 = 0x1;

/// How a column's RLE token stream is emitted.
#[derive(Clone, Copy)]
enum RleStream {
  BitPacked,
  VByte,
}

fn emit_rle(ctx: &CodecContext, out: &mut Vec<u8>, stream: RleStream) {
  vbyte::append_u32(out, ctx.rle_u32.len() as u32);
  match stream {
    RleStream::BitPacked => bitpack::pack_auto(&ctx.rle_u32, out),
    RleStream::VByte => vbyte::append_u32_slice(out, &ctx.rle_u32),
  }
}

fn emit_narrow(ctx: &CodecContext, out: &mut Vec<u8>, stream: RleStream) {
  vbyte::append_u32(out, (ctx.values_u32.len() as u32) << 1);
  bitpack::pack_auto(&ctx.values_u32, out);
  bitpack::pack_auto(&ctx.index_map_u32, out);
  emit_rle(ctx, out, stream);
}

fn emit_wide(ctx: &CodecContext, out: &mut Vec<u8>, stream: RleStream) {
  vbyte::append_u32(out, ((ctx.values_u64.len() as u32) << 1) | WIDE_VALUES_FLAG);
  vbyte::append_u64_slice(out, &ctx.values_u64);
  bitpack::pack_auto(&ctx.index_map_u32, out);
  emit_rle(ctx, out, stream);
}

/// RLE over the rank stream plus the table transforms, 32-bit side.
fn finish_tables_narrow(ctx: &mut CodecContext) {
  ctx.rle_u32.clear();
  rle::encode_zero_runs(&ctx.deltas_u32, &mut ctx.rle_u32);
  delta::encode_sorted_u32(&mut ctx.values_u32, 0);
  delta::encode_zig_zag_u32(&mut ctx.index_map_u32, 0);
}

fn finish_tables_wide(ctx: &mut CodecContext) {
  ctx.rle_u32.clear();
  rle::encode_zero_runs(&ctx.deltas_u32, &mut ctx.rle_u32);
  delta::encode_sorted_u64(&mut ctx.values_u64, 0);
  delta::encode_zig_zag_u32(&mut ctx.index_map_u32, 0);
}

/// Reads one column's tables and rank stream into the context.
/// Returns whether the column took the 64-bit path. After a
/// successful parse, `ctx.rle_u32` holds exactly `num_ticks` ranks and
/// the value tables are restored to plain form.
fn parse_column(
  ctx: &mut CodecContext,
  buf: &[u8],
  offset: &mut usize,
  num_ticks: usize,
  stream: RleStream,
) -> Result<bool, CodecError> {
  let word = vbyte::read_u32(buf, offset)?;
  let wide = word & WIDE_VALUES_FLAG != 0;
  let values_len = (word >> 1) as usize;
  if values_len > num_ticks {
    return Err(CodecError::TruncatedInput("value table larger than the tick count"));
  }

  ctx.index_map_u32.resize(values_len, 0);
  if wide {
    ctx.values_u64.resize(values_len, 0);
    vbyte::read_u64_into(buf, offset, &mut ctx.values_u64)?;
  } else {
    ctx.values_u32.resize(values_len, 0);
    bitpack::unpack_auto(buf, offset, &mut ctx.values_u32)?;
  }
  bitpack::unpack_auto(buf, offset, &mut ctx.index_map_u32)?;

  let rle_len = vbyte::read_u32(buf, offset)? as usize;
  if rle_len > num_ticks {
    return Err(CodecError::TruncatedInput("run stream longer than the tick count"));
  }
  ctx.deltas_u32.resize(rle_len, 0);
  match stream {
    RleStream::BitPacked => bitpack::unpack_auto(buf, offset, &mut ctx.deltas_u32)?,
    RleStream::VByte => vbyte::read_u32_into(buf, offset, &mut ctx.deltas_u32)?,
  }

  if wide {
    delta::decode_sorted_u64(&mut ctx.values_u64, 0);
  } else {
    delta::decode_sorted_u32(&mut ctx.values_u32, 0);
  }
  delta::decode_zig_zag_u32(&mut ctx.index_map_u32, 0);

  let mut expanded = 0usize;
  for &token in &ctx.deltas_u32 {
    expanded += if token & 1 == 1 { (token >> 1) as usize } else { 1 };
  }
  if expanded != num_ticks {
    return Err(CodecError::TruncatedInput("rank stream length mismatch"));
  }
  ctx.rle_u32.clear();
  rle::decode_zero_runs(&ctx.deltas_u32, &mut ctx.rle_u32);
  Ok(wide)
}

fn prepare_price_narrow(
  ctx: &mut CodecContext,
  ticks: &[MarketTick],
  price_scale: f64,
  initial_price: i64,
) -> Result<(), Overflow> {
  ctx.deltas_u32.clear();
  ctx.deltas_u32.reserve(ticks.len());
  let mut prev = initial_price;
  for tick in ticks {
    let scaled = scaling::to_fixed_point(tick.last, price_scale);
    let raw = scaled.checked_sub(prev).ok_or(Overflow::Delta)?;
    if raw < i64::from(i32::MIN) || raw > i64::from(i32::MAX) {
      return Err(Overflow::Delta);
    }
    ctx.deltas_u32.push(zigzag::encode_i32(raw as i32));
    prev = scaled;
  }
  frequency::encode_in_place(&mut ctx.deltas_u32, &mut ctx.values_u32, &mut ctx.index_map_u32);
  finish_tables_narrow(ctx);
  Ok(())
}

fn prepare_price_wide(
  ctx: &mut CodecContext,
  ticks: &[MarketTick],
  price_scale: f64,
  initial_price: i64,
) {
  ctx.deltas_u64.clear();
  ctx.deltas_u64.reserve(ticks.len());
  let mut prev = initial_price;
  for tick in ticks {
    let scaled = scaling::to_fixed_point(tick.last, price_scale);
    ctx.deltas_u64.push(zigzag::encode_i64(scaled.wrapping_sub(prev)));
    prev = scaled;
  }
  ctx.deltas_u32.resize(ticks.len(), 0);
  frequency::encode_wide(
    &ctx.deltas_u64,
    &mut ctx.deltas_u32,
    &mut ctx.values_u64,
    &mut ctx.index_map_u32,
  );
  finish_tables_wide(ctx);
}

/// Encodes the `last` column: zig-zagged deltas of the scaled prices,
/// with `initial_price` (the first tick's scaled price) as the delta
/// base stored in the frame header.
pub(crate) fn encode_price_column(
  ctx: &mut CodecContext,
  out: &mut Vec<u8>,
  ticks: &[MarketTick],
  price_scale: f64,
  initial_price: i64,
) {
  if prepare_price_narrow(ctx, ticks, price_scale, initial_price).is_ok() {
    emit_narrow(ctx, out, RleStream::BitPacked);
  } else {
    log::debug!("price deltas exceed the 32-bit range, retrying the column on the 64-bit path");
    prepare_price_wide(ctx, ticks, price_scale, initial_price);
    emit_wide(ctx, out, RleStream::BitPacked);
  }
}

/// Decodes the `last` column into `ticks`.
pub(crate) fn decode_price_column(
  ctx: &mut CodecContext,
  buf: &[u8],
  offset: &mut usize,
  ticks: &mut [MarketTick],
  price_scale: f64,
  initial_price: i64,
) -> Result<(), CodecError> {
  let wide = parse_column(ctx, buf, offset, ticks.len(), RleStream::BitPacked)?;
  if wide {
    ctx.deltas_u64.resize(ticks.len(), 0);
    frequency::decode_wide(
      &ctx.rle_u32,
      &mut ctx.deltas_u64,
      &mut ctx.code_to_value_u64,
      &ctx.values_u64,
      &ctx.index_map_u32,
    )?;
    let mut prev = initial_price;
    for (tick, &encoded) in ticks.iter_mut().zip(&ctx.deltas_u64) {
      let scaled = prev.wrapping_add(zigzag::decode_i64(encoded));
      tick.last = scaling::from_fixed_point(scaled, price_scale);
      prev = scaled;
    }
  } else {
    frequency::decode_in_place(
      &mut ctx.rle_u32,
      &mut ctx.code_to_value_u32,
      &ctx.values_u32,
      &ctx.index_map_u32,
    )?;
    let mut prev = initial_price;
    for (tick, &encoded) in ticks.iter_mut().zip(&ctx.rle_u32) {
      let scaled = prev.wrapping_add(i64::from(zigzag::decode_i32(encoded)));
      tick.last = scaling::from_fixed_point(scaled, price_scale);
      prev = scaled;
    }
  }
  Ok(())
}

fn prepare_volume_narrow(
  ctx: &mut CodecContext,
  ticks: &[MarketTick],
  volume_scale: f64,
) -> Result<(), Overflow> {
  ctx.deltas_u32.clear();
  ctx.deltas_u32.reserve(ticks.len());
  for tick in ticks {
    ctx.deltas_u32.push(scaling::scale_to_u32(tick.volume, volume_scale)?);
  }
  frequency::encode_in_place(&mut ctx.deltas_u32, &mut ctx.values_u32, &mut ctx.index_map_u32);
  finish_tables_narrow(ctx);
  Ok(())
}

fn prepare_volume_wide(ctx: &mut CodecContext, ticks: &[MarketTick], volume_scale: f64) {
  ctx.deltas_u64.clear();
  ctx.deltas_u64.reserve(ticks.len());
  for tick in ticks {
    ctx.deltas_u64.push(scaling::to_fixed_point(tick.volume, volume_scale) as u64);
  }
  ctx.deltas_u32.resize(ticks.len(), 0);
  frequency::encode_wide(
    &ctx.deltas_u64,
    &mut ctx.deltas_u32,
    &mut ctx.values_u64,
    &mut ctx.index_map_u32,
  );
  finish_tables_wide(ctx);
}

/// Encodes the volume column. Scaled volumes skip the delta stage and
/// go straight into the frequency remap: volumes repeat heavily, so
/// the rank stream collapses under zero-run RLE.
pub(crate) fn encode_volume_column(
  ctx: &mut CodecContext,
  out: &mut Vec<u8>,
  ticks: &[MarketTick],
  volume_scale: f64,
) {
  if prepare_volume_narrow(ctx, ticks, volume_scale).is_ok() {
    emit_narrow(ctx, out, RleStream::VByte);
  } else {
    log::debug!("scaled volume exceeds the unsigned 32-bit range, retrying the column on the 64-bit path");
    prepare_volume_wide(ctx, ticks, volume_scale);
    emit_wide(ctx, out, RleStream::VByte);
  }
}

/// Decodes the volume column into `ticks`.
pub(crate) fn decode_volume_column(
  ctx: &mut CodecContext,
  buf: &[u8],
  offset: &mut usize,
  ticks: &mut [MarketTick],
  volume_scale: f64,
) -> Result<(), CodecError> {
  let wide = parse_column(ctx, buf, offset, ticks.len(), RleStream::VByte)?;
  if wide {
    ctx.deltas_u64.resize(ticks.len(), 0);
    frequency::decode_wide(
      &ctx.rle_u32,
      &mut ctx.deltas_u64,
      &mut ctx.code_to_value_u64,
      &ctx.values_u64,
      &ctx.index_map_u32,
    )?;
    for (tick, &scaled) in ticks.iter_mut().zip(&ctx.deltas_u64) {
      tick.volume = scaled as f64 / volume_scale;
    }
  } else {
    frequency::decode_in_place(
      &mut ctx.rle_u32,
      &mut ctx.code_to_value_u32,
      &ctx.values_u32,
      &ctx.index_map_u32,
    )?;
    for (tick, &scaled) in ticks.iter_mut().zip(&ctx.rle_u32) {
      tick.volume = f64::from(scaled) / volume_scale;
    }
  }
  Ok(())
}

/// Encodes the timestamp column as unsigned deltas against the
/// previous tick, seeded with `base_time` (the block's base hour in
/// milliseconds). Rejects out-of-order timestamps.
pub(crate) fn encode_time_column(
  ctx: &mut CodecContext,
  out: &mut Vec<u8>,
  ticks: &[MarketTick],
  base_time: u64,
) -> Result<(), CodecError> {
  ctx.deltas_u32.clear();
  ctx.deltas_u32.reserve(ticks.len());
  let mut prev = base_time;
  for (index, tick) in ticks.iter().enumerate() {
    if tick.time_ms < prev {
      return Err(CodecError::NonMonotonicTimestamp {
        index,
        current: tick.time_ms,
        previous: prev,
      });
    }
    let step = tick.time_ms - prev;
    debug_assert!(step <= u64::from(u32::MAX), "block spans more than u32 milliseconds");
    ctx.deltas_u32.push(step as u32);
    prev = tick.time_ms;
  }
  frequency::encode_in_place(&mut ctx.deltas_u32, &mut ctx.values_u32, &mut ctx.index_map_u32);
  finish_tables_narrow(ctx);
  emit_narrow(ctx, out, RleStream::VByte);
  Ok(())
}

/// Decodes the timestamp column into `ticks`.
pub(crate) fn decode_time_column(
  ctx: &mut CodecContext,
  buf: &[u8],
  offset: &mut usize,
  ticks: &mut [MarketTick],
  base_time: u64,
) -> Result<(), CodecError> {
  let wide = parse_column(ctx, buf, offset, ticks.len(), RleStream::VByte)?;
  if wide {
    return Err(CodecError::TruncatedInput("time column cannot carry 64-bit values"));
  }
  frequency::decode_in_place(
    &mut ctx.rle_u32,
    &mut ctx.code_to_value_u32,
    &ctx.values_u32,
    &ctx.index_map_u32,
  )?;
  let mut prev = base_time;
  for (tick, &step) in ticks.iter_mut().zip(&ctx.rle_u32) {
    prev = prev.wrapping_add(u64::from(step));
    tick.time_ms = prev;
  }
  Ok(())
}

/// Packs the aggressor side as one bit per tick, LSB first within each
/// byte: tick 0 is bit 0 of byte 0. The trailing byte pads with zeros,
/// so the column takes `ceil(num_ticks / 8)` bytes.
pub(crate) fn encode_side_flags(out: &mut Vec<u8>, ticks: &[MarketTick]) {
  let mut byte = 0u8;
  let mut bit = 0u32;
  for tick in ticks {
    if tick.has_flag(TickUpdateFlags::TICK_FROM_BUY) {
      byte |= 1 << bit;
    }
    bit += 1;
    if bit == 8 {
      out.push(byte);
      byte = 0;
      bit = 0;
    }
  }
  if bit > 0 {
    out.push(byte);
  }
}

/// Restores the buy/sell pair from the packed side column. Both bits
/// are cleared first, then exactly one of them is set per tick.
pub(crate) fn decode_side_flags(
  buf: &[u8],
  offset: &mut usize,
  ticks: &mut [MarketTick],
) -> Result<(), CodecError> {
  let num_bytes = (ticks.len() + 7) / 8;
  let bytes = buf
    .get(*offset..*offset + num_bytes)
    .ok_or(CodecError::TruncatedInput("side column ran past the end of the buffer"))?;
  *offset += num_bytes;
  for (index, tick) in ticks.iter_mut().enumerate() {
    let is_buy = (bytes[index / 8] >> (index % 8)) & 1 == 1;
    tick
      .flags
      .remove(TickUpdateFlags::TICK_FROM_BUY | TickUpdateFlags::TICK_FROM_SELL);
    tick.flags.insert(if is_buy {
      TickUpdateFlags::TICK_FROM_BUY
    } else {
      TickUpdateFlags::TICK_FROM_SELL
    });
  }
  Ok(())
}
