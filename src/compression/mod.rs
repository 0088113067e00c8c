//! Frame-level codecs: column pipelines, the zstd dictionary wrapper,
//! the raw and compressed block serializers, and the signature-driven
//! dispatcher.

pub(crate) mod columns;
mod compressor;
pub(crate) mod context;
pub mod dictionary;
mod raw_binary;
mod serializer;
pub mod trade_id;

pub use self::compressor::TickCompressor;
pub use self::raw_binary::RawTickSerializer;
pub use self::serializer::{FrameKind, TickCodec, TickSerializer};
