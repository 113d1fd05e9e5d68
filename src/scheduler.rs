//! Daily door alarms driven by the solar calculator.
//!
//! Triggers are stored as local time-of-day and fire at most once per local
//! day. The trigger times are refreshed once per UTC day at the configured
//! recompute time, computed for the local calendar date at that moment: the
//! eastern-Australian default recomputes in the small hours of the local
//! morning, so the schedule covers the local day that has just begun.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use crate::solar::{self, SunEvent, Zenith};
use crate::timezone::Timezone;

/// What an expired alarm asks the door to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmEvent {
    OpenDoor,
    CloseDoor,
}

/// A once-per-day trigger at a local time-of-day.
#[derive(Debug, Clone, Copy)]
struct Alarm {
    /// Local time-of-day, or `None` until the first successful recompute.
    time: Option<NaiveTime>,
    /// Local date the alarm last fired (or was armed past) on.
    last_fired: Option<NaiveDate>,
}

impl Alarm {
    const fn unset() -> Self {
        Alarm {
            time: None,
            last_fired: None,
        }
    }

    /// Install a fresh trigger time. If the moment has already passed today,
    /// the alarm is marked fired so it waits for tomorrow rather than firing
    /// stale.
    fn arm(&mut self, time: NaiveTime, now_local: chrono::NaiveDateTime) {
        self.time = Some(time);
        if now_local.time() >= time {
            self.last_fired = Some(now_local.date());
        }
    }

    fn due(&self, now_local: chrono::NaiveDateTime) -> bool {
        match self.time {
            Some(t) => now_local.time() >= t && self.last_fired != Some(now_local.date()),
            None => false,
        }
    }
}

/// Computes and fires the daily open (sunrise) and close (nautical dusk)
/// alarms.
pub struct Scheduler {
    latitude: f64,
    longitude: f64,
    tz: Timezone,
    /// UTC time-of-day at which the triggers are refreshed.
    recompute_time: NaiveTime,
    last_recompute: Option<NaiveDate>,
    open_alarm: Alarm,
    close_alarm: Alarm,
}

impl Scheduler {
    pub fn new(latitude: f64, longitude: f64, tz: Timezone, recompute_time: NaiveTime) -> Self {
        Self {
            latitude,
            longitude,
            tz,
            recompute_time,
            last_recompute: None,
            open_alarm: Alarm::unset(),
            close_alarm: Alarm::unset(),
        }
    }

    /// Local trigger time for the open alarm, if one has been computed.
    pub fn open_trigger(&self) -> Option<NaiveTime> {
        self.open_alarm.time
    }

    /// Local trigger time for the close alarm, if one has been computed.
    pub fn close_trigger(&self) -> Option<NaiveTime> {
        self.close_alarm.time
    }

    /// UTC time-of-day at which the daily recompute runs.
    pub fn recompute_trigger(&self) -> NaiveTime {
        self.recompute_time
    }

    /// Refresh both trigger times from the solar calculator for the current
    /// local calendar date. At extreme latitudes the sun may not cross a
    /// zenith at all; in that case the previous trigger is kept and a warning
    /// logged.
    pub fn recompute(&mut self, now_utc: DateTime<Utc>) {
        let now_local = self.tz.to_local(now_utc);
        let date = now_local.date();
        self.last_recompute = Some(now_utc.date_naive());

        match solar::sun_event_utc(
            date,
            self.latitude,
            self.longitude,
            Zenith::Official,
            SunEvent::Sunrise,
        ) {
            Some(rise_utc) => {
                let local = self.tz.to_local(DateTime::from_naive_utc_and_offset(rise_utc, Utc));
                self.open_alarm.arm(local.time(), now_local);
            }
            None => {
                log_warning!("No sunrise at this latitude today; keeping the previous open time");
            }
        }

        match solar::sun_event_utc(
            date,
            self.latitude,
            self.longitude,
            Zenith::Nautical,
            SunEvent::Sunset,
        ) {
            Some(set_utc) => {
                let local = self.tz.to_local(DateTime::from_naive_utc_and_offset(set_utc, Utc));
                self.close_alarm.arm(local.time(), now_local);
            }
            None => {
                log_warning!("No nautical dusk at this latitude today; keeping the previous close time");
            }
        }

        log_block_start!("Door schedule for {}", date.format("%d/%m/%Y"));
        match self.open_alarm.time {
            Some(t) => log_indented!("Open at {} local", t.format("%H:%M:%S")),
            None => log_indented!("Open time not yet available"),
        }
        match self.close_alarm.time {
            Some(t) => log_indented!("Close at {} local", t.format("%H:%M:%S")),
            None => log_indented!("Close time not yet available"),
        }
    }

    /// Check the alarms against the current time, returning the events that
    /// just expired. Runs the daily recompute first so freshly computed
    /// triggers obey the stale-arming rule before anything can fire.
    pub fn tick(&mut self, now_utc: DateTime<Utc>) -> Vec<AlarmEvent> {
        if now_utc.time() >= self.recompute_time && self.last_recompute != Some(now_utc.date_naive())
        {
            self.recompute(now_utc);
        }

        let now_local = self.tz.to_local(now_utc);
        let mut events = Vec::new();
        if self.open_alarm.due(now_local) {
            self.open_alarm.last_fired = Some(now_local.date());
            events.push(AlarmEvent::OpenDoor);
        }
        if self.close_alarm.due(now_local) {
            self.close_alarm.last_fired = Some(now_local.date());
            events.push(AlarmEvent::CloseDoor);
        }
        events
    }
}
