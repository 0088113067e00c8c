mod config;
pub mod raw_record;
mod tick;

pub use self::config::{TickCodecConfig, TickStorageFlags, MAX_PRECISION_DIGITS};
pub use self::raw_record::{as_raw_records, RawTickRecord, RAW_TICK_SIZE};
pub use self::tick::{MarketTick, TickUpdateFlags};
