use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::errors::CodecError;
use crate::models::{MarketTick, TickCodecConfig, TickStorageFlags};

use super::compressor::TickCompressor;
use super::raw_binary::RawTickSerializer;

/// Frame signatures understood by the dispatcher. The discriminant is
/// the first byte of the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum FrameKind {
  /// Verbatim little-endian tick records, no compression.
  RawBinary = 0x00,
  /// Dictionary-assisted columnar compression.
  Compressed = 0x01,
}

impl FrameKind {
  /// Maps a signature byte to a frame kind.
  pub fn from_signature(byte: u8) -> Option<Self> {
    match byte {
      0x00 => Some(Self::RawBinary),
      0x01 => Some(Self::Compressed),
      _ => None,
    }
  }
}

/// Common contract of the tick frame serializers.
///
/// An implementation owns its scratch buffers, so `&mut self` methods
/// must not be shared across threads; separate instances are fully
/// independent. `decode` appends to the destination vector without
/// clearing it.
pub trait TickSerializer {
  /// Sets or replaces the configuration used by [`encode`].
  ///
  /// [`encode`]: TickSerializer::encode
  fn configure(&mut self, config: TickCodecConfig) -> Result<(), CodecError>;

  /// Returns the active configuration. After a successful decode this
  /// reflects the configuration embedded in the frame.
  fn config(&self) -> &TickCodecConfig;

  /// Signature check without parsing the body.
  fn probe(&self, input: &[u8]) -> bool;

  /// Encodes `ticks` into a frame appended to `output`.
  fn encode(&mut self, ticks: &[MarketTick], output: &mut Vec<u8>) -> Result<(), CodecError>;

  /// Sets the configuration, then encodes.
  fn encode_with(
    &mut self,
    ticks: &[MarketTick],
    config: &TickCodecConfig,
    output: &mut Vec<u8>,
  ) -> Result<(), CodecError> {
    self.configure(*config)?;
    self.encode(ticks, output)
  }

  /// Decodes a frame, appending the ticks to `ticks`.
  fn decode(&mut self, input: &[u8], ticks: &mut Vec<MarketTick>) -> Result<(), CodecError>;

  /// Decodes a frame and returns the embedded configuration.
  fn decode_with(
    &mut self,
    input: &[u8],
    ticks: &mut Vec<MarketTick>,
    config: &mut TickCodecConfig,
  ) -> Result<(), CodecError> {
    self.decode(input, ticks)?;
    *config = *self.config();
    Ok(())
  }
}

/// Signature-driven dispatcher over the raw and compressed frames.
///
/// Encoding picks the serializer from the configuration:
/// `STORE_RAW_BINARY` selects the raw frame, otherwise `TRADE_BASED`
/// selects the compressed frame. Decoding picks by the first byte of
/// the input. Selection happens once per block at the frame boundary;
/// the column loops underneath are monomorphic.
#[derive(Debug, Default)]
pub struct TickCodec {
  raw: RawTickSerializer,
  compressed: TickCompressor,
  active: Option<FrameKind>,
  idle_config: TickCodecConfig,
}

impl TickCodec {
  pub fn new() -> Self {
    Self::default()
  }

  fn kind_for(config: &TickCodecConfig) -> Result<FrameKind, CodecError> {
    if config.has_flag(TickStorageFlags::STORE_RAW_BINARY) {
      Ok(FrameKind::RawBinary)
    } else if config.has_flag(TickStorageFlags::TRADE_BASED) {
      Ok(FrameKind::Compressed)
    } else {
      Err(CodecError::UnsupportedConfig(
        "flags select neither the raw-binary nor the trade-based frame",
      ))
    }
  }
}

impl TickSerializer for TickCodec {
  fn configure(&mut self, config: TickCodecConfig) -> Result<(), CodecError> {
    let kind = Self::kind_for(&config)?;
    self.active = Some(kind);
    match kind {
      FrameKind::RawBinary => self.raw.configure(config),
      FrameKind::Compressed => self.compressed.configure(config),
    }
  }

  fn config(&self) -> &TickCodecConfig {
    match self.active {
      Some(FrameKind::RawBinary) => self.raw.config(),
      Some(FrameKind::Compressed) => self.compressed.config(),
      None => &self.idle_config,
    }
  }

  fn probe(&self, input: &[u8]) -> bool {
    self.raw.probe(input) || self.compressed.probe(input)
  }

  fn encode(&mut self, ticks: &[MarketTick], output: &mut Vec<u8>) -> Result<(), CodecError> {
    match self.active {
      Some(FrameKind::RawBinary) => self.raw.encode(ticks, output),
      Some(FrameKind::Compressed) => self.compressed.encode(ticks, output),
      None => Err(CodecError::UnsupportedConfig("no serializer selected; call configure first")),
    }
  }

  fn decode(&mut self, input: &[u8], ticks: &mut Vec<MarketTick>) -> Result<(), CodecError> {
    let first = *input
      .first()
      .ok_or(CodecError::TruncatedInput("empty frame"))?;
    match FrameKind::from_signature(first) {
      Some(FrameKind::RawBinary) => {
        self.active = Some(FrameKind::RawBinary);
        self.raw.decode(input, ticks)
      }
      Some(FrameKind::Compressed) => {
        self.active = Some(FrameKind::Compressed);
        self.compressed.decode(input, ticks)
      }
      None => Err(CodecError::BadSignature(first)),
    }
  }
}
