//! End-to-end frame tests: encode/decode scenarios, dispatch, error
//! surfaces and the embedded-config contract.

use tick_codec::{
  CodecError, MarketTick, TickCodec, TickCodecConfig, TickSerializer, TickStorageFlags,
  TickUpdateFlags,
};

fn init_logs() {
  let _ = env_logger::builder().is_test(true).try_init();
}

fn trade_config() -> TickCodecConfig {
  TickCodecConfig::new(
    TickStorageFlags::TRADE_BASED
      | TickStorageFlags::ENABLE_TICK_FLAGS
      | TickStorageFlags::ENABLE_VOLUME,
    2,
    4,
  )
}

fn roundtrip(ticks: &[MarketTick], config: &TickCodecConfig) -> (Vec<u8>, Vec<MarketTick>) {
  let mut codec = TickCodec::new();
  let mut frame = Vec::new();
  codec.encode_with(ticks, config, &mut frame).expect("encode");
  assert!(codec.probe(&frame));
  let mut decoded = Vec::new();
  codec.decode(&frame, &mut decoded).expect("decode");
  assert_eq!(decoded.len(), ticks.len());
  (frame, decoded)
}

fn assert_scaled_eq(actual: f64, expected: f64, digits: u8, what: &str) {
  let scale = 10f64.powi(i32::from(digits));
  assert_eq!(
    (actual * scale).round() as i64,
    (expected * scale).round() as i64,
    "{what}: {actual} != {expected} at {digits} digits"
  );
}

/// Simple 64-bit LCG so the data is deterministic without a rand
/// dependency.
struct Lcg(u64);

impl Lcg {
  fn next(&mut self) -> u64 {
    self.0 = self
      .0
      .wrapping_mul(6364136223846793005)
      .wrapping_add(1442695040888963407);
    self.0 >> 11
  }

  fn below(&mut self, bound: u64) -> u64 {
    self.next() % bound
  }
}

#[test]
fn single_tick_roundtrip() {
  init_logs();
  let tick = MarketTick::trade(
    3_600_000_000,
    101.25,
    0.5,
    TickUpdateFlags::TICK_FROM_BUY | TickUpdateFlags::LAST_UPDATED,
  );
  let (frame, decoded) = roundtrip(&[tick], &trade_config());

  assert_eq!(frame[0], 0x01);
  let out = decoded[0];
  assert_eq!(out.time_ms, 3_600_000_000);
  assert_eq!(out.last, 101.25);
  assert_eq!(out.volume, 0.5);
  assert!(out.has_flag(TickUpdateFlags::TICK_FROM_BUY));
  assert!(!out.has_flag(TickUpdateFlags::TICK_FROM_SELL));
  assert!(out.has_flag(TickUpdateFlags::LAST_UPDATED));
  assert!(out.has_flag(TickUpdateFlags::VOLUME_UPDATED));
}

#[test]
fn price_jumps_survive_the_wide_path() {
  let mut config = trade_config();
  config.price_digits = 5;
  let prices = [
    0.00001,
    2_500_000.00001,
    5_000_000.00001,
    7_500_000.00001,
    10_000_000.00001,
  ];
  let ticks: Vec<MarketTick> = prices
    .iter()
    .enumerate()
    .map(|(i, &last)| {
      MarketTick::trade(7_200_000_000 + i as u64, last, 1.0, TickUpdateFlags::TICK_FROM_BUY)
    })
    .collect();

  let (_, decoded) = roundtrip(&ticks, &config);
  for (out, original) in decoded.iter().zip(&ticks) {
    assert_scaled_eq(out.last, original.last, config.price_digits, "price");
    assert_eq!(out.time_ms, original.time_ms);
  }
}

#[test]
fn constant_blocks_collapse() {
  let ticks: Vec<MarketTick> = (0..1000)
    .map(|i| MarketTick::trade(3_600_000_000 + i, 1.2345, 10.0, TickUpdateFlags::TICK_FROM_SELL))
    .collect();
  let mut config = trade_config();
  config.price_digits = 4;

  let (frame, decoded) = roundtrip(&ticks, &config);
  // 1000 raw records would take 56_000 bytes; a constant block must
  // come out orders of magnitude below that.
  assert!(frame.len() < 1000, "frame is {} bytes", frame.len());
  for (out, original) in decoded.iter().zip(&ticks) {
    assert_eq!(out.time_ms, original.time_ms);
    assert_scaled_eq(out.last, original.last, 4, "price");
    assert_scaled_eq(out.volume, original.volume, 4, "volume");
    assert!(out.has_flag(TickUpdateFlags::TICK_FROM_SELL));
  }
}

#[test]
fn alternating_sides_restore_exactly() {
  let ticks: Vec<MarketTick> = (0..17)
    .map(|i| {
      let side = if i % 2 == 0 {
        TickUpdateFlags::TICK_FROM_BUY
      } else {
        TickUpdateFlags::TICK_FROM_SELL
      };
      MarketTick::trade(3_600_000_000 + i, 42.42, 1.0, side)
    })
    .collect();

  let (_, decoded) = roundtrip(&ticks, &trade_config());
  for (i, out) in decoded.iter().enumerate() {
    let buy = out.has_flag(TickUpdateFlags::TICK_FROM_BUY);
    let sell = out.has_flag(TickUpdateFlags::TICK_FROM_SELL);
    assert_ne!(buy, sell, "exactly one side bit per tick");
    assert_eq!(buy, i % 2 == 0);
  }
}

#[test]
fn raw_binary_frame_is_bit_exact() {
  init_logs();
  let tick = MarketTick {
    time_ms: 3_600_000_000,
    received_ms: 3_600_000_007,
    ask: 101.257_111,
    bid: 101.239_999,
    last: 101.257_777, // would be lossy at two digits; raw must keep it
    volume: 0.123_456_789,
    flags: TickUpdateFlags::TICK_FROM_BUY | TickUpdateFlags::BID_UPDATED,
  };
  let mut config = trade_config();
  config.set_flag(TickStorageFlags::STORE_RAW_BINARY, true);

  let mut codec = TickCodec::new();
  let mut frame = Vec::new();
  codec.encode_with(&[tick], &config, &mut frame).unwrap();
  assert_eq!(frame[0], 0x00);

  let mut decoded = Vec::new();
  codec.decode(&frame, &mut decoded).unwrap();
  assert_eq!(decoded.len(), 1);
  assert_eq!(decoded[0].last.to_bits(), tick.last.to_bits());
  assert_eq!(decoded[0].ask.to_bits(), tick.ask.to_bits());
  assert_eq!(decoded[0].bid.to_bits(), tick.bid.to_bits());
  assert_eq!(decoded[0].volume.to_bits(), tick.volume.to_bits());
  assert_eq!(decoded[0].received_ms, tick.received_ms);
  assert_eq!(decoded[0].flags, tick.flags);
}

#[test]
fn unknown_signatures_are_rejected() {
  let garbage = [0x02u8, 0x03, 0x04];
  let mut codec = TickCodec::new();
  assert!(!codec.probe(&garbage));
  let mut decoded = Vec::new();
  assert!(matches!(
    codec.decode(&garbage, &mut decoded),
    Err(CodecError::BadSignature(0x02))
  ));
  assert!(decoded.is_empty());
}

#[test]
fn decode_appends_without_clearing() {
  let first = MarketTick::trade(3_600_000_000, 10.0, 1.0, TickUpdateFlags::TICK_FROM_BUY);
  let second = MarketTick::trade(3_600_000_900, 11.0, 2.0, TickUpdateFlags::TICK_FROM_SELL);
  let mut codec = TickCodec::new();
  let config = trade_config();

  let mut frame_a = Vec::new();
  codec.encode_with(&[first], &config, &mut frame_a).unwrap();
  let mut frame_b = Vec::new();
  codec.encode_with(&[second], &config, &mut frame_b).unwrap();

  let mut decoded = Vec::new();
  codec.decode(&frame_a, &mut decoded).unwrap();
  codec.decode(&frame_b, &mut decoded).unwrap();
  assert_eq!(decoded.len(), 2);
  assert_eq!(decoded[0].last, 10.0);
  assert_eq!(decoded[1].last, 11.0);
}

#[test]
fn embedded_config_is_recovered() {
  let mut config = trade_config();
  config.tick_size = 0.25;
  config.expiration_time_ms = 1_700_006_400_000;
  config.next_expiration_time_ms = 1_702_598_400_000;

  let ticks = [MarketTick::trade(1_699_999_200_123, 55.25, 3.0, TickUpdateFlags::TICK_FROM_BUY)];
  let mut codec = TickCodec::new();
  let mut frame = Vec::new();
  codec.encode_with(&ticks, &config, &mut frame).unwrap();

  let mut decoded = Vec::new();
  let mut embedded = TickCodecConfig::default();
  let mut reader = TickCodec::new();
  reader.decode_with(&frame, &mut decoded, &mut embedded).unwrap();

  assert_eq!(embedded.price_digits, config.price_digits);
  assert_eq!(embedded.volume_digits, config.volume_digits);
  assert_eq!(embedded.tick_size, 0.25);
  assert_eq!(embedded.expiration_time_ms, config.expiration_time_ms);
  assert_eq!(embedded.next_expiration_time_ms, config.next_expiration_time_ms);
  assert!(embedded.has_flag(TickStorageFlags::TRADE_BASED));
  assert!(embedded.has_flag(TickStorageFlags::ENABLE_TICK_FLAGS));
  assert!(embedded.has_flag(TickStorageFlags::ENABLE_VOLUME));
}

#[test]
fn non_monotonic_timestamps_are_fatal() {
  let ticks = [
    MarketTick::trade(3_600_001_000, 1.0, 1.0, TickUpdateFlags::TICK_FROM_BUY),
    MarketTick::trade(3_600_000_999, 1.0, 1.0, TickUpdateFlags::TICK_FROM_BUY),
  ];
  let mut codec = TickCodec::new();
  let mut frame = Vec::new();
  assert!(matches!(
    codec.encode_with(&ticks, &trade_config(), &mut frame),
    Err(CodecError::NonMonotonicTimestamp { index: 1, .. })
  ));
}

#[test]
fn out_of_range_precision_is_fatal() {
  let mut config = trade_config();
  config.price_digits = 19;
  let ticks = [MarketTick::trade(0, 1.0, 1.0, TickUpdateFlags::TICK_FROM_BUY)];
  let mut codec = TickCodec::new();
  let mut frame = Vec::new();
  assert!(matches!(
    codec.encode_with(&ticks, &config, &mut frame),
    Err(CodecError::PrecisionOutOfRange { digits: 19 })
  ));
}

#[test]
fn configs_without_a_frame_flag_are_fatal() {
  let config = TickCodecConfig::new(TickStorageFlags::ENABLE_VOLUME, 2, 2);
  let ticks = [MarketTick::trade(0, 1.0, 1.0, TickUpdateFlags::TICK_FROM_BUY)];
  let mut codec = TickCodec::new();
  let mut frame = Vec::new();
  assert!(matches!(
    codec.encode_with(&ticks, &config, &mut frame),
    Err(CodecError::UnsupportedConfig(_))
  ));
  assert!(frame.is_empty());
}

#[test]
fn truncated_frames_are_fatal() {
  let ticks = [MarketTick::trade(3_600_000_000, 9.5, 2.0, TickUpdateFlags::TICK_FROM_BUY)];
  let mut codec = TickCodec::new();
  let mut frame = Vec::new();
  codec.encode_with(&ticks, &trade_config(), &mut frame).unwrap();
  frame.truncate(frame.len() / 2);
  let mut decoded = Vec::new();
  let err = codec.decode(&frame, &mut decoded).unwrap_err();
  assert!(matches!(
    err,
    CodecError::TruncatedInput(_) | CodecError::CompressionBackend(_)
  ));
}

#[test]
fn pseudo_random_blocks_roundtrip() {
  init_logs();
  let mut rng = Lcg(0x5EED_CAFE);
  let config = trade_config();
  let volumes = [0.1, 0.5, 1.0, 2.5, 10.0];

  for round in 0..8 {
    let mut time_ms = 3_600_000_000 + round * 7_000_000;
    let mut price_cents: i64 = 10_000;
    let ticks: Vec<MarketTick> = (0..500)
      .map(|_| {
        time_ms += rng.below(4);
        price_cents += rng.below(11) as i64 - 5;
        price_cents = price_cents.max(1);
        let side = if rng.below(2) == 0 {
          TickUpdateFlags::TICK_FROM_BUY
        } else {
          TickUpdateFlags::TICK_FROM_SELL
        };
        // Noise bits that normalization is expected to drop.
        let noise = if rng.below(4) == 0 {
          TickUpdateFlags::BID_UPDATED
        } else {
          TickUpdateFlags::empty()
        };
        MarketTick::trade(
          time_ms,
          price_cents as f64 / 100.0,
          volumes[rng.below(5) as usize],
          side | noise,
        )
      })
      .collect();

    let (_, decoded) = roundtrip(&ticks, &config);
    for (out, original) in decoded.iter().zip(&ticks) {
      assert_eq!(out.time_ms, original.time_ms);
      assert_scaled_eq(out.last, original.last, config.price_digits, "price");
      assert_scaled_eq(out.volume, original.volume, config.volume_digits, "volume");
      let buy = original.has_flag(TickUpdateFlags::TICK_FROM_BUY);
      assert_eq!(out.has_flag(TickUpdateFlags::TICK_FROM_BUY), buy);
      assert_eq!(out.has_flag(TickUpdateFlags::TICK_FROM_SELL), !buy);
      assert!(out.has_flag(TickUpdateFlags::VOLUME_UPDATED));
      assert!(!out.has_flag(TickUpdateFlags::BID_UPDATED));
    }
  }
}

#[test]
fn volume_only_and_flag_only_layouts_roundtrip() {
  // ENABLE_VOLUME off: the volume column is absent and decodes to zero.
  let ticks = [
    MarketTick::trade(3_600_000_000, 5.5, 123.0, TickUpdateFlags::TICK_FROM_BUY),
    MarketTick::trade(3_600_000_020, 5.75, 456.0, TickUpdateFlags::TICK_FROM_SELL),
  ];
  let config = TickCodecConfig::new(
    TickStorageFlags::TRADE_BASED | TickStorageFlags::ENABLE_TICK_FLAGS,
    2,
    0,
  );
  let (_, decoded) = roundtrip(&ticks, &config);
  assert_eq!(decoded[0].volume, 0.0);
  assert!(!decoded[0].has_flag(TickUpdateFlags::VOLUME_UPDATED));
  assert!(decoded[1].has_flag(TickUpdateFlags::TICK_FROM_SELL));

  // ENABLE_TICK_FLAGS off: the side column is absent.
  let config = TickCodecConfig::new(
    TickStorageFlags::TRADE_BASED | TickStorageFlags::ENABLE_VOLUME,
    2,
    1,
  );
  let (_, decoded) = roundtrip(&ticks, &config);
  assert!(!decoded[0].has_flag(TickUpdateFlags::TICK_FROM_BUY));
  assert!(!decoded[0].has_flag(TickUpdateFlags::TICK_FROM_SELL));
  assert_scaled_eq(decoded[1].volume, 456.0, 1, "volume");
}

#[test]
fn models_serialize_to_json() {
  let tick = MarketTick::trade(3_600_000_000, 2.5, 7.0, TickUpdateFlags::TICK_FROM_BUY);
  let json = serde_json::to_string(&tick).unwrap();
  let back: MarketTick = serde_json::from_str(&json).unwrap();
  assert_eq!(back, tick);

  let config = trade_config();
  let json = serde_json::to_string(&config).unwrap();
  let back: TickCodecConfig = serde_json::from_str(&json).unwrap();
  assert_eq!(back, config);
}
