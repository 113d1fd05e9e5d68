//! Sunrise/sunset calculation for a fixed observer location.
//!
//! This is the single-pass approximate solar position formula: day-of-year,
//! solar mean anomaly, true longitude, quadrant-adjusted right ascension,
//! declination, then the local hour angle for the chosen zenith. It is not an
//! iteratively refined ephemeris; accuracy is on the order of a minute or
//! two, which is plenty for deciding when to move a coop door.
//!
//! The function is pure: no clock access, no I/O. The returned time of day is
//! in UTC, attached to the calendar date the caller passed in (the formula
//! only produces a time; the caller decides what date it belongs to). The
//! alarm scheduler depends on this exact arithmetic, including the rounding
//! rule, so changes here shift the regression fixtures.

use chrono::{Datelike, NaiveDate, NaiveDateTime};

/// Degrees/radians conversion factor used throughout the formula.
const D2R: f64 = 3.141592653 / 180.0;
const R2D: f64 = 180.0 / 3.141592653;

/// Which solar event to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SunEvent {
    Sunrise,
    Sunset,
}

/// Zenith angle selecting the event definition.
///
/// The official zenith is adjusted from 90° to correspond more closely to
/// results from online tools; the others are the standard twilight angles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zenith {
    /// Plain horizon crossing, 90.83°.
    Official,
    /// Civil twilight, 96°.
    Civil,
    /// Nautical twilight, 102°.
    Nautical,
    /// Astronomical twilight, 108°.
    Astronomical,
}

impl Zenith {
    pub fn degrees(self) -> f64 {
        match self {
            Zenith::Official => 90.83,
            Zenith::Civil => 96.0,
            Zenith::Nautical => 102.0,
            Zenith::Astronomical => 108.0,
        }
    }
}

/// Compute the UTC time of day of `event` on `date` for the given observer.
///
/// Returns the time attached to `date` as a `NaiveDateTime`, or `None` when
/// the sun neither rises nor sets at that latitude on that date (polar day or
/// polar night), in which case the hour-angle cosine leaves the `acos`
/// domain.
pub fn sun_event_utc(
    date: NaiveDate,
    latitude: f64,
    longitude: f64,
    zenith: Zenith,
    event: SunEvent,
) -> Option<NaiveDateTime> {
    let year = date.year();
    let month = date.month() as i32;
    let day = date.day() as i32;

    // Day of year via the standard integer formula (integer division floors).
    let n1 = 275 * month / 9;
    let n2 = (month + 9) / 12;
    let n3 = 1 + (year - 4 * (year / 4) + 2) / 3;
    let n = n1 - n2 * n3 + day - 30;

    // Approximate event time: sunrise near 06:00, sunset near 18:00 local
    // solar time.
    let lng_hour = longitude / 15.0;
    let event_hour = match event {
        SunEvent::Sunrise => 6.0,
        SunEvent::Sunset => 18.0,
    };
    let t = n as f64 + ((event_hour - lng_hour) / 24.0);

    // Mean anomaly and true longitude, normalized into [0, 360).
    let m = 0.9856 * t - 3.289;
    let mut l = m + 1.916 * (m * D2R).sin() + 0.020 * (2.0 * m * D2R).sin() + 282.634;
    if l > 360.0 {
        l -= 360.0;
    } else if l < 0.0 {
        l += 360.0;
    }

    // Right ascension, adjusted into the same quadrant as L, in hours.
    let mut ra = R2D * (0.91764 * (l * D2R).tan()).atan();
    if ra < 0.0 {
        ra += 360.0;
    } else if ra > 360.0 {
        ra -= 360.0;
    }
    let l_quadrant = (l / 90.0).floor() * 90.0;
    let ra_quadrant = (ra / 90.0).floor() * 90.0;
    ra = (ra + (l_quadrant - ra_quadrant)) / 15.0;

    // Declination and local hour angle for the chosen zenith.
    let sin_dec = 0.39782 * (l * D2R).sin();
    let cos_dec = sin_dec.asin().cos();
    let cos_h = ((zenith.degrees() * D2R).cos() - sin_dec * (latitude * D2R).sin())
        / (cos_dec * (latitude * D2R).cos());
    if !(-1.0..=1.0).contains(&cos_h) {
        // Sun never reaches the zenith threshold on this date: polar day
        // (cos_h < -1) or polar night (cos_h > 1).
        return None;
    }
    let mut h = match event {
        SunEvent::Sunrise => 360.0 - R2D * cos_h.acos(),
        SunEvent::Sunset => R2D * cos_h.acos(),
    };
    h /= 15.0;

    // Local mean time of the event, converted to UT and normalized into
    // [0, 24).
    let t_event = h + ra - 0.06571 * t - 6.622;
    let mut ut = t_event - lng_hour;
    if ut > 24.0 {
        ut -= 24.0;
    } else if ut < 0.0 {
        ut += 24.0;
    }

    // Break fractional hours into H/M/S; seconds >= 30 round the minute up,
    // with the hour carry wrapping at 24.
    let ms = ut * 3600.0 * 1000.0;
    let mut hour = (ms / 3_600_000.0).floor() as u32;
    let mut minute = ((ms / 60_000.0).floor() as i64 % 60) as u32;
    let second = ((ms / 1000.0).floor() as i64 % 60) as u32;
    if second >= 30 {
        if minute < 59 {
            minute += 1;
        } else {
            minute = 0;
            hour = (hour + 1) % 24;
        }
    }

    date.and_hms_opt(hour, minute, 0)
}
