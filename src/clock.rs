//! Device clock: a monotonic UTC "now" resynchronized from an external RTC.
//!
//! The RTC lives behind the [`RtcSource`] trait so the control logic can be
//! exercised against a fake clock source. Between syncs the clock counts time
//! with a monotonic [`Instant`], so a failed RTC read degrades accuracy
//! gracefully instead of failing the tick.

use anyhow::Result;
use chrono::{DateTime, NaiveDateTime, Utc};
use std::time::{Duration, Instant};

/// External real-time clock access.
pub trait RtcSource: Send {
    /// Read the current UTC time from the RTC.
    fn read(&mut self) -> Result<DateTime<Utc>>;

    /// Write a new UTC time to the RTC.
    fn adjust(&mut self, to: DateTime<Utc>) -> Result<()>;
}

/// RTC source backed by the host system clock. Used by the binary; real
/// deployments substitute a hardware RTC implementation.
pub struct SystemRtc;

impl RtcSource for SystemRtc {
    fn read(&mut self) -> Result<DateTime<Utc>> {
        Ok(Utc::now())
    }

    fn adjust(&mut self, _to: DateTime<Utc>) -> Result<()> {
        // The host clock is not ours to set; accept the adjustment so the
        // in-memory clock rebases, and leave the system time alone.
        Ok(())
    }
}

/// Monotonic UTC clock with periodic RTC resynchronization.
pub struct Clock {
    rtc: Box<dyn RtcSource>,
    base_utc: DateTime<Utc>,
    synced_at: Instant,
    resync_interval: Duration,
    last_attempt: Instant,
}

impl Clock {
    /// Create the clock and perform an initial RTC sync.
    ///
    /// If the initial read fails the clock starts from the host time and
    /// keeps counting; accuracy is degraded but the device stays up.
    pub fn new(mut rtc: Box<dyn RtcSource>, resync_interval: Duration) -> Self {
        let base_utc = match rtc.read() {
            Ok(t) => t,
            Err(e) => {
                log_pipe!();
                log_warning!("RTC unavailable at startup: {e}");
                log_indented!("Continuing from host time; accuracy degraded until RTC returns");
                Utc::now()
            }
        };
        let now = Instant::now();
        Self {
            rtc,
            base_utc,
            synced_at: now,
            resync_interval,
            last_attempt: now,
        }
    }

    /// Current UTC time: the last synced base plus monotonic elapsed time.
    pub fn now(&self) -> DateTime<Utc> {
        self.base_utc
            + chrono::Duration::from_std(self.synced_at.elapsed())
                .unwrap_or_else(|_| chrono::Duration::zero())
    }

    /// Periodic maintenance: resync from the RTC once the interval elapses.
    /// Failed reads are tolerated silently; the monotonic count carries on.
    pub fn tick(&mut self) {
        if self.last_attempt.elapsed() >= self.resync_interval {
            self.sync();
        }
    }

    /// Resync from the RTC now. Returns whether the read succeeded.
    pub fn sync(&mut self) -> bool {
        self.last_attempt = Instant::now();
        match self.rtc.read() {
            Ok(t) => {
                self.base_utc = t;
                self.synced_at = self.last_attempt;
                true
            }
            Err(_) => false,
        }
    }

    /// Set the RTC and rebase the internal count to the new time.
    pub fn set(&mut self, to: DateTime<Utc>) -> Result<()> {
        self.rtc.adjust(to)?;
        self.base_utc = to;
        self.synced_at = Instant::now();
        self.last_attempt = self.synced_at;
        Ok(())
    }
}

/// Output format for time/date display strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeFormat {
    TimeOnly,
    DateOnly,
    DateTime,
}

/// Render a timestamp for the presentation layer: `HH:MM:SS`, `DD/MM/YYYY`,
/// or both.
pub fn format_timestamp(t: NaiveDateTime, format: TimeFormat) -> String {
    match format {
        TimeFormat::TimeOnly => t.format("%H:%M:%S").to_string(),
        TimeFormat::DateOnly => t.format("%d/%m/%Y").to_string(),
        TimeFormat::DateTime => t.format("%d/%m/%Y %H:%M:%S").to_string(),
    }
}
