//! Zig-zag transform between signed and unsigned integers.
//!
//! Maps 0, -1, 1, -2, 2, ... to 0, 1, 2, 3, 4, ... so that small
//! magnitudes of either sign stay small after the mapping. Round-trip
//! identity holds for every value in the signed domain.

/// Encodes one `i32`.
#[inline]
pub const fn encode_i32(value: i32) -> u32 {
  ((value as u32) << 1) ^ ((value >> 31) as u32)
}

/// Decodes one `u32`.
#[inline]
pub const fn decode_i32(value: u32) -> i32 {
  ((value >> 1) as i32) ^ -((value & 1) as i32)
}

/// Encodes one `i64`.
#[inline]
pub const fn encode_i64(value: i64) -> u64 {
  ((value as u64) << 1) ^ ((value >> 63) as u64)
}

/// Decodes one `u64`.
#[inline]
pub const fn decode_i64(value: u64) -> i64 {
  ((value >> 1) as i64) ^ -((value & 1) as i64)
}

/// Encodes a slice of `i32` values.
pub fn encode_i32_slice(input: &[i32], output: &mut [u32]) {
  debug_assert_eq!(input.len(), output.len());
  for (dst, &value) in output.iter_mut().zip(input) {
    *dst = encode_i32(value);
  }
}

/// Decodes a slice of `u32` values.
pub fn decode_i32_slice(input: &[u32], output: &mut [i32]) {
  debug_assert_eq!(input.len(), output.len());
  for (dst, &value) in output.iter_mut().zip(input) {
    *dst = decode_i32(value);
  }
}

/// Encodes a slice of `i64` values.
pub fn encode_i64_slice(input: &[i64], output: &mut [u64]) {
  debug_assert_eq!(input.len(), output.len());
  for (dst, &value) in output.iter_mut().zip(input) {
    *dst = encode_i64(value);
  }
}

/// Decodes a slice of `u64` values.
pub fn decode_i64_slice(input: &[u64], output: &mut [i64]) {
  debug_assert_eq!(input.len(), output.len());
  for (dst, &value) in output.iter_mut().zip(input) {
    *dst = decode_i64(value);
  }
}
