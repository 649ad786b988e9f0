use chrono::{NaiveDate, NaiveDateTime};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// A duration of time, in seconds, that cannot be negative
#[derive(Debug, Eq, PartialEq, Clone, Copy, Ord, PartialOrd, Hash)]
pub struct PositiveDuration {
    pub(crate) seconds: u32,
}

impl PositiveDuration {
    pub fn zero() -> Self {
        Self { seconds: 0 }
    }

    pub const fn from_hms(hours: u32, minutes: u32, seconds: u32) -> PositiveDuration {
        let total_seconds = seconds + 60 * minutes + 60 * 60 * hours;
        PositiveDuration {
            seconds: total_seconds,
        }
    }

    pub const fn from_seconds(seconds: u32) -> PositiveDuration {
        PositiveDuration { seconds }
    }

    pub fn total_seconds(&self) -> u64 {
        u64::from(self.seconds)
    }
}

impl Display for PositiveDuration {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let hours = self.seconds / (60 * 60);
        let minutes_in_secs = self.seconds % (60 * 60);
        let minutes = minutes_in_secs / 60;
        let seconds = minutes_in_secs % 60;
        if hours != 0 {
            write!(f, "{}h{:02}m{:02}s", hours, minutes, seconds)
        } else if minutes != 0 {
            write!(f, "{}m{:02}s", minutes, seconds)
        } else {
            write!(f, "{}s", seconds)
        }
    }
}

#[derive(Debug)]
pub struct DurationParseError {
    text: String,
}

impl Display for DurationParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "`{}` is not a valid duration, expected `hh:mm:ss`",
            self.text
        )
    }
}

impl std::error::Error for DurationParseError {}

impl FromStr for PositiveDuration {
    type Err = DurationParseError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let error = || DurationParseError {
            text: text.to_string(),
        };
        let mut fields = text.split(':');
        let hours: u32 = fields
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or_else(error)?;
        let minutes: u32 = fields
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or_else(error)?;
        let seconds: u32 = fields
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or_else(error)?;
        if fields.next().is_some() || minutes >= 60 || seconds >= 60 {
            return Err(error());
        }
        Ok(PositiveDuration::from_hms(hours, minutes, seconds))
    }
}

impl serde::Serialize for PositiveDuration {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let hours = self.seconds / (60 * 60);
        let minutes = (self.seconds % (60 * 60)) / 60;
        let seconds = self.seconds % 60;
        serializer.serialize_str(&format!("{:02}:{:02}:{:02}", hours, minutes, seconds))
    }
}

impl<'de> serde::Deserialize<'de> for PositiveDuration {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        PositiveDuration::from_str(&text).map_err(serde::de::Error::custom)
    }
}

impl std::ops::Add for PositiveDuration {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            seconds: self.seconds + rhs.seconds,
        }
    }
}

impl std::ops::Mul<u32> for PositiveDuration {
    type Output = Self;

    fn mul(self, rhs: u32) -> Self::Output {
        PositiveDuration {
            seconds: self.seconds * rhs,
        }
    }
}

/// Duration since 00:00:00 on the reference date of the schedule.
/// This is used in the engine to store a point in time in an unambiguous way.
/// Values may exceed 24h for trips that run past midnight.
#[derive(Debug, Clone, Copy, Eq, PartialEq, PartialOrd, Ord, Hash)]
pub struct SecondsSinceScheduleStart {
    pub(crate) seconds: u32,
}

impl SecondsSinceScheduleStart {
    pub fn zero() -> Self {
        Self { seconds: 0 }
    }

    pub fn from_seconds(seconds: u32) -> Self {
        Self { seconds }
    }

    pub fn total_seconds(&self) -> u32 {
        self.seconds
    }

    pub fn duration_since(&self, earlier: &SecondsSinceScheduleStart) -> Option<PositiveDuration> {
        self.seconds
            .checked_sub(earlier.seconds)
            .map(|seconds| PositiveDuration { seconds })
    }

    pub fn checked_sub(&self, duration: PositiveDuration) -> Option<Self> {
        self.seconds
            .checked_sub(duration.seconds)
            .map(|seconds| Self { seconds })
    }
}

impl std::ops::Add<PositiveDuration> for SecondsSinceScheduleStart {
    type Output = Self;

    fn add(self, rhs: PositiveDuration) -> Self::Output {
        Self {
            seconds: self.seconds.saturating_add(rhs.seconds),
        }
    }
}

impl Display for SecondsSinceScheduleStart {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}",
            self.seconds / 60 / 60,
            self.seconds / 60 % 60,
            self.seconds % 60
        )
    }
}

/// Duration since 00:00:00 on any day.
/// Used for daily opening/closing windows of time-dependent fallbacks.
#[derive(Debug, Clone, Copy, Eq, PartialEq, PartialOrd, Ord)]
pub struct SecondsSinceDayStart {
    pub(crate) seconds: u32,
}

const MAX_SECONDS_SINCE_DAY_START: u32 = 48 * 60 * 60; // 48h

impl SecondsSinceDayStart {
    pub fn zero() -> Self {
        Self { seconds: 0 }
    }

    pub fn from_seconds(seconds: u32) -> Option<Self> {
        if seconds > MAX_SECONDS_SINCE_DAY_START {
            None
        } else {
            Some(Self { seconds })
        }
    }

    pub fn total_seconds(&self) -> u32 {
        self.seconds
    }
}

impl Display for SecondsSinceDayStart {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}",
            self.seconds / 60 / 60,
            self.seconds / 60 % 60,
            self.seconds % 60
        )
    }
}

/// The validity period of a schedule.
/// Engine times are counted in seconds from 00:00:00 on `first_date`.
#[derive(Debug, Clone)]
pub struct Calendar {
    first_date: NaiveDate, // first date (included) covered by the schedule
    last_date: NaiveDate,  // last date (included) covered by the schedule
}

impl Calendar {
    pub fn new(first_date: NaiveDate, last_date: NaiveDate) -> Self {
        assert!(first_date <= last_date);
        Self {
            first_date,
            last_date,
        }
    }

    pub fn first_date(&self) -> &NaiveDate {
        &self.first_date
    }

    pub fn last_date(&self) -> &NaiveDate {
        &self.last_date
    }

    pub fn contains_datetime(&self, datetime: &NaiveDateTime) -> bool {
        let date = datetime.date();
        self.first_date <= date && date <= self.last_date
    }

    pub fn to_naive_datetime(&self, seconds: &SecondsSinceScheduleStart) -> NaiveDateTime {
        self.first_date.and_hms_opt(0, 0, 0).unwrap() // unwrap is safe, 00:00:00 is always valid
            + chrono::Duration::seconds(i64::from(seconds.seconds))
    }

    /// Returns `None` if `datetime` is outside the validity period.
    pub fn from_naive_datetime(&self, datetime: &NaiveDateTime) -> Option<SecondsSinceScheduleStart> {
        if !self.contains_datetime(datetime) {
            return None;
        }
        let reference = self.first_date.and_hms_opt(0, 0, 0).unwrap(); // unwrap is safe, 00:00:00 is always valid
        let seconds_i64 = (*datetime - reference).num_seconds();
        // since datetime is within the validity period, seconds_i64 is non negative
        // and small enough to fit in a u32
        u32::try_from(seconds_i64)
            .ok()
            .map(|seconds| SecondsSinceScheduleStart { seconds })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_parse_and_display() {
        let duration = PositiveDuration::from_str("10:05:00").unwrap();
        assert_eq!(duration.total_seconds(), 10 * 3600 + 5 * 60);
        assert_eq!(format!("{}", duration), "10h05m00s");

        assert!(PositiveDuration::from_str("10:65:00").is_err());
        assert!(PositiveDuration::from_str("abc").is_err());
        assert!(PositiveDuration::from_str("10:05").is_err());
    }

    #[test]
    fn duration_arithmetic() {
        let a = PositiveDuration::from_hms(0, 1, 30);
        let b = PositiveDuration::from_seconds(30);
        assert_eq!((a + b).total_seconds(), 120);
        assert_eq!((b * 3).total_seconds(), 90);
    }

    #[test]
    fn schedule_start_arithmetic() {
        let t = SecondsSinceScheduleStart::from_seconds(3600);
        let shifted = t + PositiveDuration::from_seconds(60);
        assert_eq!(shifted.total_seconds(), 3660);
        assert_eq!(
            shifted.duration_since(&t),
            Some(PositiveDuration::from_seconds(60))
        );
        assert_eq!(t.duration_since(&shifted), None);
        assert_eq!(
            shifted.checked_sub(PositiveDuration::from_seconds(3660)),
            Some(SecondsSinceScheduleStart::zero())
        );
    }

    #[test]
    fn calendar_datetime_roundtrip() {
        let calendar = Calendar::new(
            NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2020, 1, 2).unwrap(),
        );
        let datetime = NaiveDate::from_ymd_opt(2020, 1, 2)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap();
        let seconds = calendar.from_naive_datetime(&datetime).unwrap();
        assert_eq!(seconds.total_seconds(), (24 + 10) * 3600 + 30 * 60);
        assert_eq!(calendar.to_naive_datetime(&seconds), datetime);

        let outside = NaiveDate::from_ymd_opt(2020, 2, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert!(calendar.from_naive_datetime(&outside).is_none());
    }
}
