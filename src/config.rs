//! Configuration for the coop controller, loaded from `coopr.toml`.
//!
//! All fields are optional; anything missing falls back to the defaults in
//! [`crate::constants`] (which describe a coop in Mortlake, Victoria). A
//! default file with commented settings is written on first run so there is
//! something concrete to edit.

use anyhow::{Context, Result};
use chrono::NaiveTime;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::*;
use crate::timezone::{TransitionRule, Timezone};

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Observer latitude in degrees (-90 to +90).
    pub latitude: Option<f64>,
    /// Observer longitude in degrees (-180 to +180).
    pub longitude: Option<f64>,

    /// UTC time of day ("HH:MM:SS") at which the daily door schedule is
    /// recomputed. Pick a moment in the small hours of the local morning.
    pub recompute_time: Option<String>,

    /// Month in which daylight saving starts (first Sunday).
    pub dst_start_month: Option<u32>,
    /// Local hour at which daylight saving starts.
    pub dst_start_hour: Option<u32>,
    /// Offset from UTC in minutes while daylight saving is in effect.
    pub dst_offset_minutes: Option<i32>,
    /// Month in which daylight saving ends (first Sunday).
    pub dst_end_month: Option<u32>,
    /// Local hour at which daylight saving ends.
    pub dst_end_hour: Option<u32>,
    /// Offset from UTC in minutes outside daylight saving.
    pub std_offset_minutes: Option<i32>,

    /// Initial motor overrun in milliseconds, used when no persisted value
    /// exists yet.
    pub overrun_ms: Option<u64>,
    /// Debounce window for the limit switches in milliseconds.
    pub switch_debounce_ms: Option<u64>,
    /// Debounce window for the override button in milliseconds.
    pub override_debounce_ms: Option<u64>,

    /// Full-travel time of the simulated door in milliseconds.
    pub door_travel_ms: Option<u64>,
    /// Seconds between clock resynchronizations from the RTC.
    pub rtc_resync_secs: Option<u64>,
    /// Milliseconds the control loop sleeps between ticks.
    pub tick_sleep_ms: Option<u64>,
}

impl Config {
    /// Path of the config file: `$XDG_CONFIG_HOME/coopr/coopr.toml`.
    pub fn get_config_path() -> Result<PathBuf> {
        let base = dirs::config_dir().context("Could not determine config directory")?;
        Ok(base.join("coopr").join("coopr.toml"))
    }

    /// Load the configuration, creating a default file first if none exists.
    pub fn load() -> Result<Self> {
        let path = Self::get_config_path()?;
        if !path.exists() {
            create_default_config(&path)?;
        }
        Self::load_from_path(&path)
    }

    /// Load from a specific path. Does not create a default file.
    pub fn load_from_path(path: &PathBuf) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;

        validate_config(&config)?;
        Ok(config)
    }

    pub fn latitude(&self) -> f64 {
        self.latitude.unwrap_or(DEFAULT_LATITUDE)
    }

    pub fn longitude(&self) -> f64 {
        self.longitude.unwrap_or(DEFAULT_LONGITUDE)
    }

    pub fn recompute_time(&self) -> NaiveTime {
        self.recompute_time
            .as_deref()
            .and_then(|s| NaiveTime::parse_from_str(s, "%H:%M:%S").ok())
            .or_else(|| NaiveTime::parse_from_str(DEFAULT_RECOMPUTE_TIME, "%H:%M:%S").ok())
            .unwrap_or_default()
    }

    pub fn timezone(&self) -> Timezone {
        Timezone::new(
            TransitionRule {
                month: self.dst_start_month.unwrap_or(DEFAULT_DST_START_MONTH),
                hour: self.dst_start_hour.unwrap_or(DEFAULT_DST_START_HOUR),
                offset_minutes: self.dst_offset_minutes.unwrap_or(DEFAULT_DST_OFFSET_MINUTES),
            },
            TransitionRule {
                month: self.dst_end_month.unwrap_or(DEFAULT_DST_END_MONTH),
                hour: self.dst_end_hour.unwrap_or(DEFAULT_DST_END_HOUR),
                offset_minutes: self.std_offset_minutes.unwrap_or(DEFAULT_STD_OFFSET_MINUTES),
            },
        )
    }

    pub fn overrun(&self) -> Duration {
        Duration::from_millis(self.overrun_ms.unwrap_or(0))
    }

    pub fn switch_debounce(&self) -> Duration {
        Duration::from_millis(self.switch_debounce_ms.unwrap_or(DEFAULT_SWITCH_DEBOUNCE_MS))
    }

    pub fn override_debounce(&self) -> Duration {
        Duration::from_millis(
            self.override_debounce_ms
                .unwrap_or(DEFAULT_OVERRIDE_DEBOUNCE_MS),
        )
    }

    pub fn door_travel(&self) -> Duration {
        Duration::from_millis(
            self.door_travel_ms
                .unwrap_or(DEFAULT_DOOR_TRAVEL_SECS * 1000),
        )
    }

    pub fn rtc_resync(&self) -> Duration {
        Duration::from_secs(self.rtc_resync_secs.unwrap_or(DEFAULT_RTC_RESYNC_SECS))
    }

    pub fn tick_sleep(&self) -> Duration {
        Duration::from_millis(self.tick_sleep_ms.unwrap_or(DEFAULT_TICK_SLEEP_MS))
    }

    /// Log the effective configuration at startup.
    pub fn log_config(&self) {
        log_block_start!("Loaded configuration");
        log_indented!(
            "Location: {:.5}°, {:.5}°",
            self.latitude(),
            self.longitude()
        );
        log_indented!(
            "Schedule recompute: {} UTC",
            self.recompute_time().format("%H:%M:%S")
        );
        let tz = self.timezone();
        let std = tz.std_rule();
        let dst = tz.dst_rule();
        log_indented!(
            "Timezone: UTC{:+}:{:02} standard, UTC{:+}:{:02} daylight saving",
            std.offset_minutes / 60,
            (std.offset_minutes % 60).abs(),
            dst.offset_minutes / 60,
            (dst.offset_minutes % 60).abs()
        );
        log_indented!("Motor overrun: {} ms", self.overrun().as_millis());
        log_indented!(
            "Debounce: switches {} ms, override {} ms",
            self.switch_debounce().as_millis(),
            self.override_debounce().as_millis()
        );
    }
}

/// Range and format checks. Invalid values fail the load with a message that
/// names the field and its accepted range.
fn validate_config(config: &Config) -> Result<()> {
    if let Some(lat) = config.latitude
        && !(-90.0..=90.0).contains(&lat)
    {
        anyhow::bail!("latitude must be between -90 and 90 degrees (got {})", lat);
    }

    if let Some(lon) = config.longitude
        && !(-180.0..=180.0).contains(&lon)
    {
        anyhow::bail!(
            "longitude must be between -180 and 180 degrees (got {})",
            lon
        );
    }

    if let Some(ref time) = config.recompute_time {
        NaiveTime::parse_from_str(time, "%H:%M:%S")
            .context("Invalid recompute_time format (expected HH:MM:SS)")?;
    }

    for (name, month) in [
        ("dst_start_month", config.dst_start_month),
        ("dst_end_month", config.dst_end_month),
    ] {
        if let Some(m) = month
            && !(1..=12).contains(&m)
        {
            anyhow::bail!("{} ({}) must be between 1 and 12", name, m);
        }
    }

    for (name, hour) in [
        ("dst_start_hour", config.dst_start_hour),
        ("dst_end_hour", config.dst_end_hour),
    ] {
        if let Some(h) = hour
            && h > 23
        {
            anyhow::bail!("{} ({}) must be between 0 and 23", name, h);
        }
    }

    for (name, offset) in [
        ("dst_offset_minutes", config.dst_offset_minutes),
        ("std_offset_minutes", config.std_offset_minutes),
    ] {
        if let Some(o) = offset
            && !(MIN_UTC_OFFSET_MINUTES..=MAX_UTC_OFFSET_MINUTES).contains(&o)
        {
            anyhow::bail!(
                "{} ({}) must be between {} and {} minutes",
                name,
                o,
                MIN_UTC_OFFSET_MINUTES,
                MAX_UTC_OFFSET_MINUTES
            );
        }
    }

    let dst_month = config.dst_start_month.unwrap_or(DEFAULT_DST_START_MONTH);
    let std_month = config.dst_end_month.unwrap_or(DEFAULT_DST_END_MONTH);
    if dst_month == std_month {
        anyhow::bail!(
            "dst_start_month and dst_end_month must differ (both are {})",
            dst_month
        );
    }

    if let Some(overrun) = config.overrun_ms
        && overrun > MAX_OVERRUN_MS
    {
        anyhow::bail!(
            "overrun_ms ({}) must be at most {} milliseconds",
            overrun,
            MAX_OVERRUN_MS
        );
    }

    if let Some(travel) = config.door_travel_ms
        && travel == 0
    {
        anyhow::bail!("door_travel_ms must be greater than zero");
    }

    if let Some(sleep) = config.tick_sleep_ms
        && sleep == 0
    {
        anyhow::bail!("tick_sleep_ms must be greater than zero");
    }

    Ok(())
}

/// Write a fully commented default config file.
fn create_default_config(path: &PathBuf) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    let content = format!(
        "\
#[Location]
latitude = {DEFAULT_LATITUDE}        # Observer latitude (-90..90)
longitude = {DEFAULT_LONGITUDE}      # Observer longitude (-180..180)

#[Schedule]
recompute_time = \"{DEFAULT_RECOMPUTE_TIME}\"  # UTC time the daily schedule is recomputed

#[Timezone]
dst_start_month = {DEFAULT_DST_START_MONTH}         # Daylight saving starts on the first Sunday of this month
dst_start_hour = {DEFAULT_DST_START_HOUR}           # ...at this local hour
dst_offset_minutes = {DEFAULT_DST_OFFSET_MINUTES}   # Offset from UTC during daylight saving
dst_end_month = {DEFAULT_DST_END_MONTH}            # Daylight saving ends on the first Sunday of this month
dst_end_hour = {DEFAULT_DST_END_HOUR}             # ...at this local hour
std_offset_minutes = {DEFAULT_STD_OFFSET_MINUTES}   # Offset from UTC outside daylight saving

#[Door]
overrun_ms = 0               # Motor overrun past the limit switch (0-{MAX_OVERRUN_MS})
switch_debounce_ms = {DEFAULT_SWITCH_DEBOUNCE_MS}       # Limit switch debounce window
override_debounce_ms = {DEFAULT_OVERRIDE_DEBOUNCE_MS}    # Override button debounce window

#[Hardware]
door_travel_ms = {travel}        # Simulated door full-travel time
rtc_resync_secs = {DEFAULT_RTC_RESYNC_SECS}        # Seconds between RTC resynchronizations
tick_sleep_ms = {DEFAULT_TICK_SLEEP_MS}          # Control loop sleep between ticks
",
        travel = DEFAULT_DOOR_TRAVEL_SECS * 1000,
    );

    fs::write(path, &content)
        .with_context(|| format!("Failed to write default config to {}", path.display()))?;

    log_block_start!("Created default configuration");
    log_indented!("{}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_config(dir: &tempfile::TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("coopr.toml");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn empty_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "");
        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.latitude(), DEFAULT_LATITUDE);
        assert_eq!(config.longitude(), DEFAULT_LONGITUDE);
        assert_eq!(
            config.recompute_time(),
            NaiveTime::from_hms_opt(15, 0, 0).unwrap()
        );
        assert_eq!(config.switch_debounce(), Duration::from_millis(50));
        assert_eq!(config.override_debounce(), Duration::from_millis(150));
        assert_eq!(config.overrun(), Duration::ZERO);
        assert_eq!(config.tick_sleep(), Duration::from_millis(DEFAULT_TICK_SLEEP_MS));
    }

    #[test]
    fn explicit_values_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            r#"
latitude = 51.5
longitude = -0.12
recompute_time = "03:30:00"
overrun_ms = 750
tick_sleep_ms = 20
"#,
        );
        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.latitude(), 51.5);
        assert_eq!(config.longitude(), -0.12);
        assert_eq!(
            config.recompute_time(),
            NaiveTime::from_hms_opt(3, 30, 0).unwrap()
        );
        assert_eq!(config.overrun(), Duration::from_millis(750));
        assert_eq!(config.tick_sleep(), Duration::from_millis(20));
    }

    #[test]
    fn latitude_out_of_range_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "latitude = 95.0\n");
        let err = Config::load_from_path(&path).unwrap_err();
        assert!(err.to_string().contains("latitude"));
    }

    #[test]
    fn bad_recompute_time_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "recompute_time = \"25:99\"\n");
        assert!(Config::load_from_path(&path).is_err());
    }

    #[test]
    fn overrun_above_cap_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "overrun_ms = 60000\n");
        let err = Config::load_from_path(&path).unwrap_err();
        assert!(err.to_string().contains("overrun_ms"));
    }

    #[test]
    fn zero_tick_sleep_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "tick_sleep_ms = 0\n");
        let err = Config::load_from_path(&path).unwrap_err();
        assert!(err.to_string().contains("tick_sleep_ms"));
    }

    #[test]
    fn equal_transition_months_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "dst_start_month = 4\ndst_end_month = 4\n");
        assert!(Config::load_from_path(&path).is_err());
    }

    #[test]
    fn default_file_round_trips() {
        crate::logger::Log::set_enabled(false);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("coopr").join("coopr.toml");
        create_default_config(&path).unwrap();
        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.latitude(), DEFAULT_LATITUDE);
        assert_eq!(config.timezone(), Timezone::new(
            TransitionRule {
                month: DEFAULT_DST_START_MONTH,
                hour: DEFAULT_DST_START_HOUR,
                offset_minutes: DEFAULT_DST_OFFSET_MINUTES,
            },
            TransitionRule {
                month: DEFAULT_DST_END_MONTH,
                hour: DEFAULT_DST_END_HOUR,
                offset_minutes: DEFAULT_STD_OFFSET_MINUTES,
            },
        ));
    }
}
