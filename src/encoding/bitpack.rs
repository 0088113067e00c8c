//! Bit packing of 32-bit integers in 128-value blocks.
//!
//! Values are packed back to back into a little-endian bit stream: bit
//! `k` of a block's stream lives in bit `k % 8` of byte `k / 8`, and
//! value `j` occupies bits `[j * width, (j + 1) * width)`. A full block
//! therefore takes exactly `16 * width` bytes, and a trailing partial
//! block of `n` values takes `ceil(n * width / 8)` bytes with no
//! padding between blocks.
//!
//! Two variants are provided:
//!
//! - **fixed width** ([`pack_fixed`]): the caller supplies the width
//!   and blocks concatenate with no per-block header;
//! - **auto width** ([`pack_auto`]): each block is prefixed with one
//!   byte holding the width actually needed for that block (0 marks an
//!   all-zero block with no payload).
//!
//! The block size of 128 and the byte layout are externally
//! observable; changing either invalidates pre-trained dictionaries.

use byteorder::{ByteOrder, LittleEndian};

use crate::errors::CodecError;

/// Number of values per packed block.
pub const BLOCK_SIZE: usize = 128;

/// Scratch capacity for one block at the maximum width.
const MAX_BLOCK_BYTES: usize = BLOCK_SIZE * 4;

/// Number of bits needed to represent the largest value in `values`.
pub fn max_bits(values: &[u32]) -> u32 {
  let mut all = 0u32;
  for &value in values {
    all |= value;
  }
  32 - all.leading_zeros()
}

#[inline]
fn width_mask(width: usize) -> u32 {
  if width == 32 {
    u32::MAX
  } else {
    (1u32 << width) - 1
  }
}

fn pack_block(block: &[u32], width: u32, out: &mut Vec<u8>) {
  let width = width as usize;
  let total_bits = block.len() * width;
  let num_bytes = (total_bits + 7) / 8;
  let num_words = (num_bytes + 3) / 4;
  let mask = width_mask(width);

  let mut words = [0u32; BLOCK_SIZE];
  let mut bit_pos = 0usize;
  for &value in block {
    let value = value & mask;
    let word = bit_pos >> 5;
    let shift = bit_pos & 31;
    words[word] |= value << shift;
    if shift + width > 32 {
      words[word + 1] |= value >> (32 - shift);
    }
    bit_pos += width;
  }

  let mut bytes = [0u8; MAX_BLOCK_BYTES];
  LittleEndian::write_u32_into(&words[..num_words], &mut bytes[..num_words * 4]);
  out.extend_from_slice(&bytes[..num_bytes]);
}

fn unpack_block(
  buf: &[u8],
  offset: &mut usize,
  out: &mut [u32],
  width: u32,
) -> Result<(), CodecError> {
  let width = width as usize;
  let total_bits = out.len() * width;
  let num_bytes = (total_bits + 7) / 8;
  let end = offset
    .checked_add(num_bytes)
    .filter(|&end| end <= buf.len())
    .ok_or(CodecError::TruncatedInput("bit-packed block ran past the end of the buffer"))?;
  let src = &buf[*offset..end];
  *offset = end;

  let num_words = (num_bytes + 3) / 4;
  let mut bytes = [0u8; MAX_BLOCK_BYTES];
  bytes[..src.len()].copy_from_slice(src);
  let mut words = [0u32; BLOCK_SIZE];
  LittleEndian::read_u32_into(&bytes[..num_words * 4], &mut words[..num_words]);

  let mask = width_mask(width);
  let mut bit_pos = 0usize;
  for slot in out.iter_mut() {
    let word = bit_pos >> 5;
    let shift = bit_pos & 31;
    let mut value = words[word] >> shift;
    if shift + width > 32 {
      value |= words[word + 1] << (32 - shift);
    }
    *slot = value & mask;
    bit_pos += width;
  }
  Ok(())
}

/// Packs `values` at the caller-supplied `width` (1..=32). Values are
/// masked to `width` bits.
pub fn pack_fixed(values: &[u32], width: u32, out: &mut Vec<u8>) {
  debug_assert!((1..=32).contains(&width));
  for block in values.chunks(BLOCK_SIZE) {
    pack_block(block, width, out);
  }
}

/// Unpacks `out.len()` values packed at `width`, advancing `offset`.
pub fn unpack_fixed(
  buf: &[u8],
  offset: &mut usize,
  out: &mut [u32],
  width: u32,
) -> Result<(), CodecError> {
  for block in out.chunks_mut(BLOCK_SIZE) {
    unpack_block(buf, offset, block, width)?;
  }
  Ok(())
}

/// Packs `values`, choosing the narrowest width per 128-value block and
/// recording it in a one-byte block header.
pub fn pack_auto(values: &[u32], out: &mut Vec<u8>) {
  for block in values.chunks(BLOCK_SIZE) {
    let width = max_bits(block);
    out.push(width as u8);
    if width > 0 {
      pack_block(block, width, out);
    }
  }
}

/// Unpacks `out.len()` values written by [`pack_auto`], advancing
/// `offset`.
pub fn unpack_auto(buf: &[u8], offset: &mut usize, out: &mut [u32]) -> Result<(), CodecError> {
  for block in out.chunks_mut(BLOCK_SIZE) {
    let width = *buf
      .get(*offset)
      .ok_or(CodecError::TruncatedInput("missing bit-width block header"))?;
    *offset += 1;
    if width > 32 {
      return Err(CodecError::TruncatedInput("bit width out of range"));
    }
    if width == 0 {
      block.fill(0);
    } else {
      unpack_block(buf, offset, block, u32::from(width))?;
    }
  }
  Ok(())
}
