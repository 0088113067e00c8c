use thiserror::Error;

/// Errors surfaced by the tick serializers.
///
/// Internal pipeline overflows (a 32-bit price delta or a 32-bit scaled
/// volume running out of range) are not represented here: the column
/// encoders recover from them by retrying the column on the 64-bit path.
#[derive(Debug, Error)]
pub enum CodecError {
  /// Price or volume precision exceeds the supported 18 decimal digits.
  #[error("precision out of range: {digits} digits exceeds the maximum of 18")]
  PrecisionOutOfRange { digits: u8 },

  /// The configuration selects no serializer or is missing a flag the
  /// chosen frame requires.
  #[error("unsupported configuration: {0}")]
  UnsupportedConfig(&'static str),

  /// The first byte of the input is not a known frame signature.
  #[error("bad frame signature: 0x{0:02x}")]
  BadSignature(u8),

  /// A reader ran past the end of the buffer, or the stream is
  /// internally inconsistent.
  #[error("truncated input: {0}")]
  TruncatedInput(&'static str),

  /// Tick timestamps must be non-decreasing within a block.
  #[error("non-monotonic timestamp at index {index}: {current} < {previous}")]
  NonMonotonicTimestamp {
    index: usize,
    current: u64,
    previous: u64,
  },

  /// The compression backend rejected the data; the library's error
  /// text is attached verbatim.
  #[error("compression backend: {0}")]
  CompressionBackend(String),
}
