//! Fixed-point scaling between doubles and integers.
//!
//! Scaling multiplies by a power of ten and rounds half away from zero
//! (`f64::round` semantics), which makes the conversion reversible at
//! the declared precision.

use super::Overflow;
use crate::errors::CodecError;

/// Powers of ten for 0..=18 decimal digits.
const POW10: [f64; 19] = [
  1e0, 1e1, 1e2, 1e3, 1e4, 1e5, 1e6, 1e7, 1e8, 1e9, 1e10, 1e11, 1e12, 1e13, 1e14, 1e15, 1e16,
  1e17, 1e18,
];

/// Scale factor for `digits` decimal places.
pub fn pow10(digits: u8) -> Result<f64, CodecError> {
  POW10
    .get(usize::from(digits))
    .copied()
    .ok_or(CodecError::PrecisionOutOfRange { digits })
}

/// Converts `value` to its fixed-point integer at `scale`.
#[inline]
pub fn to_fixed_point(value: f64, scale: f64) -> i64 {
  (value * scale).round() as i64
}

/// Converts a fixed-point integer back to a double.
#[inline]
pub fn from_fixed_point(value: i64, scale: f64) -> f64 {
  value as f64 / scale
}

/// Scales a non-negative `value` into the unsigned 32-bit range.
#[inline]
pub fn scale_to_u32(value: f64, scale: f64) -> Result<u32, Overflow> {
  let scaled = (value * scale).round() as i64;
  if scaled < 0 || scaled > i64::from(u32::MAX) {
    return Err(Overflow::Scale);
  }
  Ok(scaled as u32)
}

/// Quantizes `value` to `digits` decimal places.
pub fn normalize(value: f64, digits: u8) -> Result<f64, CodecError> {
  let scale = pow10(digits)?;
  Ok((value * scale).round() / scale)
}

/// Comparison tolerance for values quantized to `digits` places.
pub fn precision_tolerance(digits: u8) -> Result<f64, CodecError> {
  Ok(1.0 / pow10(digits)?)
}
