/// Reusable scratch buffers shared by one codec instance.
///
/// The buffers live for the lifetime of the instance and are cleared,
/// not deallocated, between operations, so repeated encode/decode
/// calls stop allocating once the high-water mark is reached. A
/// context is owned exclusively by its codec; instances never share
/// state.
#[derive(Debug, Default)]
pub(crate) struct CodecContext {
  /// 32-bit delta / rank scratch; also carries RLE token streams.
  pub(crate) deltas_u32: Vec<u32>,
  /// 64-bit delta scratch for the wide column paths.
  pub(crate) deltas_u64: Vec<u64>,
  /// Distinct 32-bit values from the frequency remap.
  pub(crate) values_u32: Vec<u32>,
  /// Distinct 64-bit values from the frequency remap.
  pub(crate) values_u64: Vec<u64>,
  /// Expanded rank stream on decode.
  pub(crate) rle_u32: Vec<u32>,
  /// Rank-to-value gather table (32-bit).
  pub(crate) code_to_value_u32: Vec<u32>,
  /// Rank-to-value gather table (64-bit).
  pub(crate) code_to_value_u64: Vec<u64>,
  /// Sorted-position-to-rank map from the frequency remap.
  pub(crate) index_map_u32: Vec<u32>,
}

impl CodecContext {
  /// Clears every buffer while keeping its capacity.
  pub(crate) fn reset(&mut self) {
    self.deltas_u32.clear();
    self.deltas_u64.clear();
    self.values_u32.clear();
    self.values_u64.clear();
    self.rle_u32.clear();
    self.code_to_value_u32.clear();
    self.code_to_value_u64.clear();
    self.index_map_u32.clear();
  }
}
