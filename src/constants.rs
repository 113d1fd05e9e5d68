//! Default values and validation bounds shared across the crate.

/// Default observer latitude (Mortlake, Victoria).
pub const DEFAULT_LATITUDE: f64 = -38.07164;
/// Default observer longitude (Mortlake, Victoria).
pub const DEFAULT_LONGITUDE: f64 = 142.803125;

/// Time of day (UTC) at which the open/close triggers are re-derived.
/// 15:00 UTC is the small hours of the local morning, well before sunrise.
pub const DEFAULT_RECOMPUTE_TIME: &str = "15:00:00";

/// Daylight-saving offset from UTC in minutes (AEDT, UTC+11).
pub const DEFAULT_DST_OFFSET_MINUTES: i32 = 660;
/// Standard offset from UTC in minutes (AEST, UTC+10).
pub const DEFAULT_STD_OFFSET_MINUTES: i32 = 600;
/// Month in which daylight saving begins (first Sunday).
pub const DEFAULT_DST_START_MONTH: u32 = 10;
/// Local hour at which daylight saving begins.
pub const DEFAULT_DST_START_HOUR: u32 = 2;
/// Month in which daylight saving ends (first Sunday).
pub const DEFAULT_DST_END_MONTH: u32 = 4;
/// Local hour at which daylight saving ends.
pub const DEFAULT_DST_END_HOUR: u32 = 3;

/// Debounce window for the limit switches in milliseconds.
pub const DEFAULT_SWITCH_DEBOUNCE_MS: u64 = 50;
/// Debounce window for the manual override button in milliseconds.
pub const DEFAULT_OVERRIDE_DEBOUNCE_MS: u64 = 150;

/// How often the clock resynchronizes from the external RTC, in seconds.
pub const DEFAULT_RTC_RESYNC_SECS: u64 = 300;
/// Sleep between main loop ticks in milliseconds.
pub const DEFAULT_TICK_SLEEP_MS: u64 = 50;

/// Full-travel time of the simulated door rig in seconds.
pub const DEFAULT_DOOR_TRAVEL_SECS: u64 = 8;

/// Upper bound accepted for the motor overrun, in milliseconds.
/// The overrun wait blocks the control loop, so it must stay short.
pub const MAX_OVERRUN_MS: u64 = 10_000;

/// Validation bounds for the timezone offsets, in minutes.
pub const MIN_UTC_OFFSET_MINUTES: i32 = -14 * 60;
pub const MAX_UTC_OFFSET_MINUTES: i32 = 14 * 60;
