//! Delta codec for exchange trade identifiers.
//!
//! Consecutive trade ids usually differ by exactly one, so each id is
//! stored as `delta - 1` (zig-zagged): a gap-free run becomes a zero
//! run and folds into a single RLE token. The stream is framed as
//! `vbyte32(rle_len)` followed by the bit-packed token stream; the id
//! count itself is tracked by the caller, like the tick count of a
//! block.

use crate::encoding::{bitpack, rle, vbyte, zigzag};
use crate::errors::CodecError;

/// Appends the encoded id stream to `output`. Empty input writes
/// nothing.
pub fn encode_trade_ids(output: &mut Vec<u8>, trade_ids: &[u64]) -> Result<(), CodecError> {
  if trade_ids.is_empty() {
    return Ok(());
  }
  let mut deltas = Vec::with_capacity(trade_ids.len());
  let mut prev = 0i64;
  for &id in trade_ids {
    let current = id as i64;
    let adjusted = current.wrapping_sub(prev).wrapping_sub(1);
    if adjusted < i64::from(i32::MIN) || adjusted > i64::from(i32::MAX) {
      return Err(CodecError::UnsupportedConfig("trade id delta exceeds the 32-bit range"));
    }
    deltas.push(zigzag::encode_i32(adjusted as i32));
    prev = current;
  }

  let mut tokens = Vec::with_capacity(deltas.len());
  rle::encode_zero_runs(&deltas, &mut tokens);
  vbyte::append_u32(output, tokens.len() as u32);
  bitpack::pack_auto(&tokens, output);
  Ok(())
}

/// Reads `count` trade ids, appending them to `output` and advancing
/// `offset`.
pub fn decode_trade_ids(
  input: &[u8],
  offset: &mut usize,
  count: usize,
  output: &mut Vec<u64>,
) -> Result<(), CodecError> {
  if count == 0 {
    return Ok(());
  }
  let rle_len = vbyte::read_u32(input, offset)? as usize;
  if rle_len > count {
    return Err(CodecError::TruncatedInput("trade id run stream longer than the id count"));
  }
  let mut tokens = vec![0u32; rle_len];
  bitpack::unpack_auto(input, offset, &mut tokens)?;

  let mut deltas = Vec::with_capacity(count);
  rle::decode_zero_runs(&tokens, &mut deltas);
  if deltas.len() != count {
    return Err(CodecError::TruncatedInput("trade id stream length mismatch"));
  }

  output.reserve(count);
  let mut prev = 0i64;
  for encoded in deltas {
    let current = prev
      .wrapping_add(i64::from(zigzag::decode_i32(encoded)))
      .wrapping_add(1);
    output.push(current as u64);
    prev = current;
  }
  Ok(())
}
