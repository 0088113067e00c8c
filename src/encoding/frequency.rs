//! Frequency remap codec.
//!
//! Maps every value of a column to its rank in a descending-frequency
//! ordering, so the most common value becomes rank 0 and the rank
//! stream collapses well under zero-run RLE. Ties are broken by
//! ascending value; the tie-break is part of the wire format and is
//! computed with ordered containers so it is platform-independent.
//!
//! Encoding emits three pieces:
//!
//! - `sorted_values`: the distinct values in ascending order (which is
//!   what makes delta-sorted packing of the table effective);
//! - `sorted_to_rank`: for each sorted position, the rank code
//!   assigned to that value;
//! - the rank code of every input element.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

use crate::errors::CodecError;

fn build_rank_tables<T>(
  input: &[T],
  sorted_values: &mut Vec<T>,
  sorted_to_rank: &mut Vec<u32>,
) -> HashMap<T, u32>
where
  T: Copy + Ord + Hash,
{
  let mut freq = BTreeMap::new();
  for &value in input {
    *freq.entry(value).or_insert(0u32) += 1;
  }

  let mut pairs: Vec<(u32, T)> = freq.iter().map(|(&value, &count)| (count, value)).collect();
  pairs.sort_unstable_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));

  let mut rank_of = HashMap::with_capacity(pairs.len());
  for (rank, &(_, value)) in pairs.iter().enumerate() {
    rank_of.insert(value, rank as u32);
  }

  sorted_values.clear();
  sorted_to_rank.clear();
  sorted_values.reserve(freq.len());
  sorted_to_rank.reserve(freq.len());
  for &value in freq.keys() {
    sorted_values.push(value);
    sorted_to_rank.push(rank_of[&value]);
  }
  rank_of
}

/// Remaps `values` to rank codes in place, filling the side tables.
pub fn encode_in_place(
  values: &mut [u32],
  sorted_values: &mut Vec<u32>,
  sorted_to_rank: &mut Vec<u32>,
) {
  let rank_of = build_rank_tables(values, sorted_values, sorted_to_rank);
  for value in values.iter_mut() {
    *value = rank_of[&*value];
  }
}

/// Remaps 64-bit `input` to rank codes in `encoded`, filling the side
/// tables. Rank codes always fit 32 bits.
pub fn encode_wide(
  input: &[u64],
  encoded: &mut [u32],
  sorted_values: &mut Vec<u64>,
  sorted_to_rank: &mut Vec<u32>,
) {
  debug_assert_eq!(input.len(), encoded.len());
  let rank_of = build_rank_tables(input, sorted_values, sorted_to_rank);
  for (dst, value) in encoded.iter_mut().zip(input) {
    *dst = rank_of[value];
  }
}

fn invert_rank_tables<T>(
  code_to_value: &mut Vec<T>,
  sorted_values: &[T],
  sorted_to_rank: &[u32],
) -> Result<(), CodecError>
where
  T: Copy + Default,
{
  if sorted_values.len() != sorted_to_rank.len() {
    return Err(CodecError::TruncatedInput("frequency table length mismatch"));
  }
  code_to_value.clear();
  code_to_value.resize(sorted_values.len(), T::default());
  for (&value, &rank) in sorted_values.iter().zip(sorted_to_rank) {
    *code_to_value
      .get_mut(rank as usize)
      .ok_or(CodecError::TruncatedInput("frequency rank outside the table"))? = value;
  }
  Ok(())
}

/// Replaces rank codes in `values` with the original values, using
/// `code_to_value` as the gather table.
pub fn decode_in_place(
  values: &mut [u32],
  code_to_value: &mut Vec<u32>,
  sorted_values: &[u32],
  sorted_to_rank: &[u32],
) -> Result<(), CodecError> {
  invert_rank_tables(code_to_value, sorted_values, sorted_to_rank)?;
  for value in values.iter_mut() {
    *value = *code_to_value
      .get(*value as usize)
      .ok_or(CodecError::TruncatedInput("frequency code outside the table"))?;
  }
  Ok(())
}

/// Gathers 64-bit originals for the rank codes in `encoded`.
pub fn decode_wide(
  encoded: &[u32],
  decoded: &mut [u64],
  code_to_value: &mut Vec<u64>,
  sorted_values: &[u64],
  sorted_to_rank: &[u32],
) -> Result<(), CodecError> {
  debug_assert_eq!(encoded.len(), decoded.len());
  invert_rank_tables(code_to_value, sorted_values, sorted_to_rank)?;
  for (dst, &code) in decoded.iter_mut().zip(encoded) {
    *dst = *code_to_value
      .get(code as usize)
      .ok_or(CodecError::TruncatedInput("frequency code outside the table"))?;
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn most_frequent_value_gets_rank_zero() {
    let mut values = vec![9, 4, 4, 4, 9, 1];
    let mut sorted_values = Vec::new();
    let mut sorted_to_rank = Vec::new();
    encode_in_place(&mut values, &mut sorted_values, &mut sorted_to_rank);
    assert_eq!(sorted_values, [1, 4, 9]);
    // 4 occurs three times -> rank 0; 9 twice -> rank 1; 1 once -> rank 2.
    assert_eq!(sorted_to_rank, [2, 0, 1]);
    assert_eq!(values, [1, 0, 0, 0, 1, 2]);
  }

  #[test]
  fn ties_break_by_ascending_value() {
    let mut values = vec![30, 10, 20, 10, 30, 20];
    let mut sorted_values = Vec::new();
    let mut sorted_to_rank = Vec::new();
    encode_in_place(&mut values, &mut sorted_values, &mut sorted_to_rank);
    // All frequencies equal: ranks follow ascending value order.
    assert_eq!(sorted_values, [10, 20, 30]);
    assert_eq!(sorted_to_rank, [0, 1, 2]);
  }

  #[test]
  fn decode_restores_the_input() {
    let original: Vec<u32> = (0..2000).map(|i| (i * i) % 37).collect();
    let mut values = original.clone();
    let mut sorted_values = Vec::new();
    let mut sorted_to_rank = Vec::new();
    encode_in_place(&mut values, &mut sorted_values, &mut sorted_to_rank);
    let mut table = Vec::new();
    decode_in_place(&mut values, &mut table, &sorted_values, &sorted_to_rank).unwrap();
    assert_eq!(values, original);
  }

  #[test]
  fn wide_roundtrip() {
    let original: Vec<u64> = vec![u64::MAX, 5, 5, u64::MAX, 5, 0];
    let mut encoded = vec![0u32; original.len()];
    let mut sorted_values = Vec::new();
    let mut sorted_to_rank = Vec::new();
    encode_wide(&original, &mut encoded, &mut sorted_values, &mut sorted_to_rank);
    assert_eq!(sorted_values, [0, 5, u64::MAX]);
    let mut decoded = vec![0u64; original.len()];
    let mut table = Vec::new();
    decode_wide(&encoded, &mut decoded, &mut table, &sorted_values, &sorted_to_rank).unwrap();
    assert_eq!(decoded, original);
  }

  #[test]
  fn corrupt_rank_codes_are_rejected() {
    let mut table = Vec::new();
    let mut values = vec![7u32];
    assert!(decode_in_place(&mut values, &mut table, &[1, 2], &[0, 1]).is_err());
    assert!(decode_in_place(&mut values, &mut table, &[1, 2], &[0, 5]).is_err());
  }
}
