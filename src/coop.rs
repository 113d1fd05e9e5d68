//! The controller core that ties the clock, the scheduler, and the door
//! together and drives them from the main loop.
//!
//! All stateful pieces are owned here and stepped from one loop; the
//! request/report methods are the synchronous surface a presentation layer
//! (CLI, status page) calls into, returning human-readable status strings
//! rather than structured errors.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, NaiveDateTime, NaiveTime, Utc};

use crate::clock::{Clock, TimeFormat, format_timestamp};
use crate::config::Config;
use crate::constants::MAX_OVERRUN_MS;
use crate::door::{Door, DoorState};
use crate::hardware::DebouncedInput;
use crate::scheduler::{AlarmEvent, Scheduler};
use crate::solar::{self, SunEvent, Zenith};
use crate::timezone::Timezone;

pub struct Coop {
    clock: Clock,
    door: Door,
    scheduler: Scheduler,
    tz: Timezone,
    latitude: f64,
    longitude: f64,
    override_button: DebouncedInput,
    tick_sleep: Duration,
}

impl Coop {
    pub fn new(config: &Config, clock: Clock, door: Door, override_button: DebouncedInput) -> Self {
        let tz = config.timezone();
        let scheduler = Scheduler::new(
            config.latitude(),
            config.longitude(),
            tz,
            config.recompute_time(),
        );
        Self {
            clock,
            door,
            scheduler,
            tz,
            latitude: config.latitude(),
            longitude: config.longitude(),
            override_button,
            tick_sleep: config.tick_sleep(),
        }
    }

    /// One pass of the control loop: service the clock, the override button,
    /// the alarms, and finally the door state machine.
    pub fn tick(&mut self) {
        self.clock.tick();

        self.override_button.update();
        if self.override_button.just_pressed() {
            log_block_start!("Override pressed (door {})", self.door.state());
            self.door.toggle();
        }

        for event in self.scheduler.tick(self.clock.now()) {
            match event {
                AlarmEvent::OpenDoor => {
                    log_block_start!(
                        "Sunrise alarm at {}",
                        self.current_time_formatted(TimeFormat::DateTime, false)
                    );
                    self.door.open();
                }
                AlarmEvent::CloseDoor => {
                    log_block_start!(
                        "Dusk alarm at {}",
                        self.current_time_formatted(TimeFormat::DateTime, false)
                    );
                    self.door.close();
                }
            }
        }

        self.door.tick();
    }

    /// Main loop: compute the initial schedule, then tick until the shutdown
    /// flag is raised by a signal handler.
    pub fn run(&mut self, running: &AtomicBool) -> Result<()> {
        log_block_start!(
            "Current time: {}",
            self.current_time_formatted(TimeFormat::DateTime, false)
        );
        self.scheduler.recompute(self.clock.now());
        self.log_sun_times();

        while running.load(Ordering::SeqCst) {
            self.tick();
            std::thread::sleep(self.tick_sleep);
        }

        log_block_start!("Shutting down (door {})", self.door.state());
        log_end!();
        Ok(())
    }

    /// Manual open request from the presentation layer.
    pub fn request_open(&mut self) -> String {
        self.door.open();
        format!("Door: {}", self.door.state())
    }

    /// Manual close request from the presentation layer.
    pub fn request_close(&mut self) -> String {
        self.door.close();
        format!("Door: {}", self.door.state())
    }

    /// Manual override, same semantics as the physical button.
    pub fn request_override(&mut self) -> String {
        self.door.toggle();
        format!("Door: {}", self.door.state())
    }

    /// Change the motor overrun. Rejected above the safety cap since the
    /// overrun wait blocks the control loop; the caller gets the refusal as
    /// the status string and nothing changes.
    pub fn request_set_overrun(&mut self, overrun: Duration) -> String {
        if overrun.as_millis() as u64 > MAX_OVERRUN_MS {
            return format!(
                "Overrun not changed: {} ms exceeds the {} ms cap",
                overrun.as_millis(),
                MAX_OVERRUN_MS
            );
        }
        self.door.set_overrun(overrun);
        format!("Overrun set to {} ms", overrun.as_millis())
    }

    /// Set the clock from a local wall-clock time. Writes the RTC, rebases
    /// the soft clock, and re-derives the sun alarms since the trigger times
    /// were computed from the old date.
    pub fn request_set_clock(&mut self, local: NaiveDateTime) -> String {
        let utc = self.tz.to_utc(local);
        match self.clock.set(utc) {
            Ok(()) => {
                self.scheduler.recompute(self.clock.now());
                format!(
                    "Clock set to {}",
                    self.current_time_formatted(TimeFormat::DateTime, false)
                )
            }
            Err(e) => format!("Clock not changed: {e}"),
        }
    }

    pub fn current_door_state(&self) -> DoorState {
        self.door.state()
    }

    /// Current time, formatted in UTC or local.
    pub fn current_time_formatted(&self, format: TimeFormat, use_utc: bool) -> String {
        let now = self.clock.now();
        let t = if use_utc {
            now.naive_utc()
        } else {
            self.tz.to_local(now)
        };
        format_timestamp(t, format)
    }

    /// Sunrise on the current local date, formatted. "n/a" when the sun does
    /// not rise at this latitude today.
    pub fn next_sunrise_formatted(&self, format: TimeFormat, use_utc: bool) -> String {
        self.sun_event_formatted(Zenith::Official, SunEvent::Sunrise, format, use_utc)
    }

    /// Civil dusk on the current local date, formatted. The door closes
    /// later, at nautical dusk; civil dusk is the useful "it is getting
    /// dark" figure.
    pub fn next_sunset_formatted(&self, format: TimeFormat, use_utc: bool) -> String {
        self.sun_event_formatted(Zenith::Civil, SunEvent::Sunset, format, use_utc)
    }

    /// The armed trigger time for an alarm, attached to today's local date
    /// and formatted in UTC or local. "n/a" before the first recompute.
    pub fn alarm_time_formatted(
        &self,
        event: AlarmEvent,
        format: TimeFormat,
        use_utc: bool,
    ) -> String {
        let trigger = match event {
            AlarmEvent::OpenDoor => self.scheduler.open_trigger(),
            AlarmEvent::CloseDoor => self.scheduler.close_trigger(),
        };
        match trigger {
            Some(time) => {
                let local = self.tz.to_local(self.clock.now()).date().and_time(time);
                let stamp = if use_utc {
                    self.tz.to_utc(local).naive_utc()
                } else {
                    local
                };
                format_timestamp(stamp, format)
            }
            None => "n/a".to_string(),
        }
    }

    /// The armed local trigger times in raw time-of-day form, open then
    /// close.
    pub fn alarm_times(&self) -> (Option<NaiveTime>, Option<NaiveTime>) {
        (self.scheduler.open_trigger(), self.scheduler.close_trigger())
    }

    /// The daily schedule-refresh trigger, attached to today's UTC date and
    /// formatted in UTC or local. Unlike the door alarms this one is stored
    /// as a UTC time-of-day.
    pub fn recompute_time_formatted(&self, format: TimeFormat, use_utc: bool) -> String {
        let utc = self
            .clock
            .now()
            .date_naive()
            .and_time(self.scheduler.recompute_trigger());
        let stamp = if use_utc {
            utc
        } else {
            self.tz.to_local(DateTime::from_naive_utc_and_offset(utc, Utc))
        };
        format_timestamp(stamp, format)
    }

    fn sun_event_formatted(
        &self,
        zenith: Zenith,
        event: SunEvent,
        format: TimeFormat,
        use_utc: bool,
    ) -> String {
        let utc = solar::sun_event_utc(
            self.tz.to_local(self.clock.now()).date(),
            self.latitude,
            self.longitude,
            zenith,
            event,
        );
        match utc {
            Some(t) => {
                // The calculator attaches the UTC time-of-day to the queried
                // calendar date; the local rendering keeps that date and
                // converts the time-of-day.
                let stamp = if use_utc {
                    t
                } else {
                    let local = self.tz.to_local(DateTime::from_naive_utc_and_offset(t, Utc));
                    t.date().and_time(local.time())
                };
                format_timestamp(stamp, format)
            }
            None => "n/a".to_string(),
        }
    }

    fn log_sun_times(&self) {
        log_indented!(
            "Sunrise: {} local",
            self.next_sunrise_formatted(TimeFormat::TimeOnly, false)
        );
        log_indented!(
            "Civil dusk: {} local",
            self.next_sunset_formatted(TimeFormat::TimeOnly, false)
        );
        log_indented!("Door: {}", self.door.state());
    }
}
