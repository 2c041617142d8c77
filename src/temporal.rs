//! Numeric encodings for temporal values.
//!
//! The backing store's JSON has no temporal type, so values are stored as numbers:
//! - date-time: Unix epoch seconds as a float (microsecond precision)
//! - date: the integer `YYYYMMDD`
//! - time: the integer `HHMMSSffffff` (hour, minute, second, microsecond, zero padded)

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Timelike, Utc};

const MICROS_PER_SEC: f64 = 1_000_000.0;

#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn encode_datetime(dt: &DateTime<Utc>) -> f64 {
    dt.timestamp_micros() as f64 / MICROS_PER_SEC
}

#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn decode_datetime(epoch_secs: f64) -> Option<DateTime<Utc>> {
    if !epoch_secs.is_finite() {
        return None;
    }
    DateTime::from_timestamp_micros((epoch_secs * MICROS_PER_SEC).round() as i64)
}

#[must_use]
pub fn encode_date(date: &NaiveDate) -> i64 {
    i64::from(date.year()) * 10_000 + i64::from(date.month()) * 100 + i64::from(date.day())
}

/// Inverse of [`encode_date`]. Years before 1 CE encode negative (`-0044-03-15` is
/// `-439685`); the month and day are always the non-negative remainder.
#[must_use]
pub fn decode_date(encoded: i64) -> Option<NaiveDate> {
    let year = i32::try_from(encoded.div_euclid(10_000)).ok()?;
    let month_day = encoded.rem_euclid(10_000);
    let month = u32::try_from(month_day / 100).ok()?;
    let day = u32::try_from(month_day % 100).ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Sub-microsecond precision (and leap-second nanos beyond one second) is dropped.
#[must_use]
pub fn encode_time(time: &NaiveTime) -> i64 {
    let micros = i64::from(time.nanosecond() % 1_000_000_000 / 1_000);
    let hms = i64::from(time.hour()) * 10_000 + i64::from(time.minute()) * 100 + i64::from(time.second());
    hms * 1_000_000 + micros
}

/// Inverse of [`encode_time`]. The integer form loses leading zeros (`09:30:15` is
/// `93015000000`), so decoding works on the zero-padded twelve digit layout.
#[must_use]
pub fn decode_time(encoded: i64) -> Option<NaiveTime> {
    if !(0..240_000_000_000).contains(&encoded) {
        return None;
    }
    let micros = u32::try_from(encoded % 1_000_000).ok()?;
    let hms = encoded / 1_000_000;
    let hour = u32::try_from(hms / 10_000).ok()?;
    let minute = u32::try_from(hms / 100 % 100).ok()?;
    let second = u32::try_from(hms % 100).ok()?;
    NaiveTime::from_hms_micro_opt(hour, minute, second, micros)
}
