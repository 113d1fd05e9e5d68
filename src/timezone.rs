//! Fixed-rule local time conversion.
//!
//! The device does not carry a tz database; it converts UTC to local civil
//! time with exactly two rules: a daylight offset that takes effect on the
//! first Sunday of one month and a standard offset that takes effect on the
//! first Sunday of another. The defaults encode the Australian east-coast
//! calendar (AEDT begins first Sunday of October at 02:00 local, AEST returns
//! first Sunday of April at 03:00 local), but the months, hours and offsets
//! are configurable.
//!
//! Rule hours are expressed in the local time previously in effect, so the
//! UTC transition instants are derived with the *other* rule's offset.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc, Weekday};

/// One transition rule: on the first Sunday of `month`, at local `hour`, the
/// offset becomes `offset_minutes` east of UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionRule {
    pub month: u32,
    pub hour: u32,
    pub offset_minutes: i32,
}

/// A two-rule timezone: one daylight rule, one standard rule.
///
/// Set once at startup from configuration and never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timezone {
    dst: TransitionRule,
    std: TransitionRule,
}

impl Timezone {
    /// Construct from two rules. Panics on a month outside 1-12 or an hour
    /// outside 0-23; config validation reports those with a proper error
    /// before this is reached.
    pub fn new(dst: TransitionRule, std: TransitionRule) -> Self {
        for rule in [&dst, &std] {
            assert!(
                (1..=12).contains(&rule.month),
                "transition month {} out of range",
                rule.month
            );
            assert!(rule.hour <= 23, "transition hour {} out of range", rule.hour);
        }
        Self { dst, std }
    }

    pub fn dst_rule(&self) -> TransitionRule {
        self.dst
    }

    pub fn std_rule(&self) -> TransitionRule {
        self.std
    }

    /// First Sunday of the rule's month at the rule's local hour.
    fn rule_local(rule: &TransitionRule, year: i32) -> NaiveDateTime {
        let date = NaiveDate::from_weekday_of_month_opt(year, rule.month, Weekday::Sun, 1)
            .expect("rule month checked in Timezone::new");
        date.and_hms_opt(rule.hour, 0, 0)
            .expect("rule hour checked in Timezone::new")
    }

    /// UTC instant at which daylight saving begins in `year`. The rule hour
    /// is local standard time, so the standard offset applies.
    fn dst_start_utc(&self, year: i32) -> NaiveDateTime {
        Self::rule_local(&self.dst, year) - Duration::minutes(self.std.offset_minutes as i64)
    }

    /// UTC instant at which daylight saving ends in `year`. The rule hour is
    /// local daylight time, so the daylight offset applies.
    fn dst_end_utc(&self, year: i32) -> NaiveDateTime {
        Self::rule_local(&self.std, year) - Duration::minutes(self.dst.offset_minutes as i64)
    }

    /// Whether daylight saving spans the new year (southern hemisphere).
    fn spans_new_year(&self) -> bool {
        self.dst.month > self.std.month
    }

    /// Whether the given UTC instant falls inside daylight saving.
    pub fn is_dst_utc(&self, utc: NaiveDateTime) -> bool {
        use chrono::Datelike;
        let year = utc.year();
        let start = self.dst_start_utc(year);
        let end = self.dst_end_utc(year);
        if self.spans_new_year() {
            utc >= start || utc < end
        } else {
            utc >= start && utc < end
        }
    }

    /// Whether the given local wall-clock time falls inside daylight saving.
    ///
    /// Local times inside the spring-forward gap or the fall-back overlap are
    /// resolved by this comparison in one fixed direction; round-trip
    /// guarantees only hold outside those two hours per year.
    fn is_dst_local(&self, local: NaiveDateTime) -> bool {
        use chrono::Datelike;
        let year = local.year();
        let start = Self::rule_local(&self.dst, year);
        let end = Self::rule_local(&self.std, year);
        if self.spans_new_year() {
            local >= start || local < end
        } else {
            local >= start && local < end
        }
    }

    /// Offset from UTC in minutes at the given UTC instant.
    pub fn offset_minutes_utc(&self, utc: NaiveDateTime) -> i32 {
        if self.is_dst_utc(utc) {
            self.dst.offset_minutes
        } else {
            self.std.offset_minutes
        }
    }

    /// Convert a UTC timestamp to local civil time.
    pub fn to_local(&self, utc: DateTime<Utc>) -> NaiveDateTime {
        let naive = utc.naive_utc();
        naive + Duration::minutes(self.offset_minutes_utc(naive) as i64)
    }

    /// Convert a local civil time to UTC.
    pub fn to_utc(&self, local: NaiveDateTime) -> DateTime<Utc> {
        let offset = if self.is_dst_local(local) {
            self.dst.offset_minutes
        } else {
            self.std.offset_minutes
        };
        DateTime::<Utc>::from_naive_utc_and_offset(
            local - Duration::minutes(offset as i64),
            Utc,
        )
    }
}
