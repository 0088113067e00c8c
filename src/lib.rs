#![warn(missing_debug_implementations, rust_2018_idioms, unreachable_pub)]

//! # Tick Codec
//!
//! Columnar, dictionary-assisted compression for trade tick streams:
//! timestamp, last price, volume, aggressor side and update flags go
//! in; a compact self-contained frame comes out, losslessly at the
//! declared fixed-point precision.
//!
//! ## Pipeline
//!
//! Each column runs its own transform chain before the shared outer
//! wrapper:
//!
//! | column | chain |
//! |--------|-------|
//! | price  | fixed-point scale → delta → zig-zag → frequency remap → zero-run RLE → bit-pack |
//! | volume | fixed-point scale → frequency remap → zero-run RLE → vbyte |
//! | time   | delta → frequency remap → zero-run RLE → vbyte |
//! | side   | one bit per tick, LSB first |
//!
//! The concatenated column stream is then compressed with ZSTD seeded
//! by an embedded dictionary trained on representative trade blocks,
//! and framed as `{ signature, tick_count, zstd_frame }`. An alternate
//! raw-binary frame (signature `0x00`) stores verbatim little-endian
//! records for debugging and loss-free archival; [`TickCodec`]
//! dispatches between the two by configuration on encode and by
//! signature on decode.
//!
//! Columns whose 32-bit fast path overflows (price deltas past the
//! `i32` range, scaled volumes past `u32`) retry transparently on a
//! 64-bit path; the wide layout is marked per column in the frame.
//!
//! ## Example
//!
//! ```rust
//! use tick_codec::{
//!   MarketTick, TickCodec, TickCodecConfig, TickSerializer, TickStorageFlags, TickUpdateFlags,
//! };
//!
//! let ticks = vec![
//!   MarketTick::trade(3_600_000_000, 101.25, 0.5, TickUpdateFlags::TICK_FROM_BUY),
//!   MarketTick::trade(3_600_000_250, 101.26, 1.5, TickUpdateFlags::TICK_FROM_SELL),
//! ];
//! let config = TickCodecConfig::new(
//!   TickStorageFlags::TRADE_BASED
//!     | TickStorageFlags::ENABLE_TICK_FLAGS
//!     | TickStorageFlags::ENABLE_VOLUME,
//!   2, // price digits
//!   4, // volume digits
//! );
//!
//! let mut codec = TickCodec::new();
//! let mut frame = Vec::new();
//! codec.encode_with(&ticks, &config, &mut frame).unwrap();
//! assert!(codec.probe(&frame));
//!
//! let mut decoded = Vec::new();
//! codec.decode(&frame, &mut decoded).unwrap();
//! assert_eq!(decoded.len(), 2);
//! assert_eq!(decoded[0].last, 101.25);
//! assert_eq!(decoded[1].time_ms, 3_600_000_250);
//! ```
//!
//! ## Concurrency
//!
//! A codec instance owns reusable scratch buffers, so a single
//! instance must not be shared between threads. Instances are fully
//! independent: use one per thread without coordination. All calls run
//! to completion on the caller's thread; there is no I/O and no
//! internal state shared between instances.

pub mod compression;
pub mod encoding;
mod errors;
pub mod models;

pub use compression::dictionary::TICK_DICTIONARY_V1;
pub use compression::{FrameKind, RawTickSerializer, TickCodec, TickCompressor, TickSerializer};
pub use errors::CodecError;
pub use models::{MarketTick, TickCodecConfig, TickStorageFlags, TickUpdateFlags};
