//! ZSTD wrapper with the embedded trained dictionary.
//!
//! The concatenated column stream of a block is small and
//! self-similar across blocks, which is exactly the case dictionary
//! compression is built for. The dictionary is linked into the binary
//! as immutable data; replacing it invalidates every previously
//! compressed block, so it is versioned by file name.
//!
//! Wrapped frame layout: `{ signature: u8, num_ticks: vbyte32,
//! zstd_frame }`. The tick count sits outside the compressed body so
//! callers can size buffers without decompressing.

use std::io::{self, Read, Write};

use crate::encoding::vbyte;
use crate::errors::CodecError;

/// Embedded dictionary trained offline on representative trade blocks.
pub static TICK_DICTIONARY_V1: &[u8] = include_bytes!("tick_dict_v1.bin");

/// Compression level applied to the column stream. Blocks are written
/// once and read many times, so the slowest tier is the right trade.
const COMPRESSION_LEVEL: i32 = 19;

fn backend(err: io::Error) -> CodecError {
  CodecError::CompressionBackend(err.to_string())
}

/// Compresses `input` with the embedded dictionary, prefixing the
/// signature byte and the sample count.
pub(crate) fn compress_with_dictionary(
  input: &[u8],
  signature: u8,
  num_samples: u32,
  output: &mut Vec<u8>,
) -> Result<(), CodecError> {
  output.push(signature);
  vbyte::append_u32(output, num_samples);
  let mut encoder =
    zstd::stream::write::Encoder::with_dictionary(&mut *output, COMPRESSION_LEVEL, TICK_DICTIONARY_V1)
      .map_err(backend)?;
  encoder.write_all(input).map_err(backend)?;
  encoder.finish().map_err(backend)?;
  Ok(())
}

/// Decompresses a zstd frame produced by [`compress_with_dictionary`]
/// (the caller strips the signature and count first), appending the
/// plain bytes to `output`.
pub(crate) fn decompress_with_dictionary(
  input: &[u8],
  output: &mut Vec<u8>,
) -> Result<(), CodecError> {
  let mut decoder =
    zstd::stream::read::Decoder::with_dictionary(input, TICK_DICTIONARY_V1).map_err(backend)?;
  decoder.read_to_end(output).map_err(backend)?;
  Ok(())
}
