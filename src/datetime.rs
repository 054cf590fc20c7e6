// This file is part of the untouch package.
//
// For the full copyright and license information, please view the LICENSE
// file that was distributed with this source code.

// spell-checker:ignore (formats) yyyy Thh ampm

//! Free-form date/time parsing.
//!
//! Accepts `yyyy-mm-dd` and `mm/dd/yyyy` dates with an optional time of
//! day, seconds, milliseconds, and a 12-hour am/pm marker:
//!
//! ```text
//! yyyy-mm-dd [hh:mm[:ss[.fff]] [am|pm]]
//! yyyy-mm-dd[Thh:mm[:ss[.fff]][am|pm]]
//! mm/dd/yyyy ...
//! ```
//!
//! The parsed value is calendar-checked (leap years, days per month) and
//! then interpreted as local wall-clock time when converted to an
//! absolute instant.

use chrono::{Local, NaiveDate, TimeZone};
use filetime::FileTime;
use thiserror::Error;

/// The input could not be understood as a valid date/time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("date/time string is invalid or unrecognized")]
pub struct ParseDateTimeError;

/// A calendar-valid wall-clock value, before timezone conversion.
///
/// Only [`parse`] constructs this; invalid field combinations are
/// rejected there, never clamped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CalendarDateTime {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
    pub millisecond: u32,
}

impl CalendarDateTime {
    /// Interprets the wall-clock value as local time and converts it to
    /// an absolute instant.
    ///
    /// A local time skipped by a DST transition has no representation
    /// and is reported as a parse failure.
    pub fn to_filetime(self) -> Result<FileTime, ParseDateTimeError> {
        let naive = NaiveDate::from_ymd_opt(self.year, self.month, self.day)
            .and_then(|d| d.and_hms_milli_opt(self.hour, self.minute, self.second, self.millisecond))
            .ok_or(ParseDateTimeError)?;
        let local = Local
            .from_local_datetime(&naive)
            .earliest()
            .ok_or(ParseDateTimeError)?;
        Ok(FileTime::from_unix_time(
            local.timestamp(),
            local.timestamp_subsec_nanos(),
        ))
    }
}

/// Parses a free-form date/time string.
///
/// The date is read positionally as (year, month, day) first; a day
/// value over 31 means the string was month/day/year and the three
/// numbers are reassigned. `02-03-2024` therefore parses as February 3rd
/// of year 2024, never March 2nd; the day-first ordering is not
/// supported.
pub fn parse(text: &str) -> Result<CalendarDateTime, ParseDateTimeError> {
    let text = text.trim();
    let (date_part, time_part) = match text.find([' ', 'T', 't']) {
        Some(split) => (&text[..split], Some(&text[split + 1..])),
        None => (text, None),
    };

    let (year, month, day) = parse_date(date_part)?;
    let (hour, minute, second, millisecond) = match time_part {
        Some(time) => parse_time(time)?,
        None => (0, 0, 0, 0),
    };

    Ok(CalendarDateTime {
        year,
        month,
        day,
        hour,
        minute,
        second,
        millisecond,
    })
}

/// Number of days in a Gregorian month.
pub(crate) fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        2 => {
            if year % 400 == 0 || (year % 4 == 0 && year % 100 != 0) {
                29
            } else {
                28
            }
        }
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        _ => 30,
    }
}

/// A numeric field of at most `max_digits` ASCII digits.
fn field(part: Option<&str>, max_digits: usize) -> Result<u32, ParseDateTimeError> {
    let s = part.ok_or(ParseDateTimeError)?;
    if s.is_empty() || s.len() > max_digits || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseDateTimeError);
    }
    s.parse().map_err(|_| ParseDateTimeError)
}

fn parse_date(s: &str) -> Result<(i32, u32, u32), ParseDateTimeError> {
    let mut parts = s.split(['-', '/']);
    let n1 = field(parts.next(), 4)?;
    let n2 = field(parts.next(), 2)?;
    let n3 = field(parts.next(), 4)?;
    if parts.next().is_some() {
        return Err(ParseDateTimeError);
    }

    // Positionally year-month-day; a day over 31 means the string was
    // month/day/year and the fields are reassigned.
    let (year, month, day) = if n3 > 31 { (n3, n1, n2) } else { (n1, n2, n3) };

    if year < 1000 {
        return Err(ParseDateTimeError);
    }
    if !(1..=12).contains(&month) {
        return Err(ParseDateTimeError);
    }
    if day < 1 || day > days_in_month(year as i32, month) {
        return Err(ParseDateTimeError);
    }

    Ok((year as i32, month, day))
}

fn parse_time(s: &str) -> Result<(u32, u32, u32, u32), ParseDateTimeError> {
    let lower = s.to_ascii_lowercase();

    // `is_pm` is None when no am/pm marker is present.
    let (mut rest, is_pm) = if let Some(r) = lower.strip_suffix("am") {
        (r, Some(false))
    } else if let Some(r) = lower.strip_suffix("pm") {
        (r, Some(true))
    } else if let Some(r) = lower.strip_suffix('a') {
        (r, Some(false))
    } else if let Some(r) = lower.strip_suffix('p') {
        (r, Some(true))
    } else {
        (lower.as_str(), None)
    };
    if is_pm.is_some() {
        // At most one space between the clock and the marker.
        rest = rest.strip_suffix(' ').unwrap_or(rest);
    }

    let (clock, fraction) = match rest.split_once('.') {
        Some((clock, fraction)) => (clock, Some(fraction)),
        None => (rest, None),
    };

    let mut columns = clock.split(':');
    let mut hour = field(columns.next(), 2)?;
    let minute = field(columns.next(), 2)?;
    let second = match columns.next() {
        Some(s) => field(Some(s), 2)?,
        None => {
            // A fraction is only valid after explicit seconds.
            if fraction.is_some() {
                return Err(ParseDateTimeError);
            }
            0
        }
    };
    if columns.next().is_some() {
        return Err(ParseDateTimeError);
    }

    let millisecond = match fraction {
        Some(f) => {
            if f.is_empty() || f.len() > 3 || !f.bytes().all(|b| b.is_ascii_digit()) {
                return Err(ParseDateTimeError);
            }
            // 1 or 2 digits are a decimal fraction of a second;
            // right-pad to milliseconds (".5" is 500, not 5).
            let mut padded = f.to_owned();
            while padded.len() < 3 {
                padded.push('0');
            }
            padded.parse().map_err(|_| ParseDateTimeError)?
        }
        None => 0,
    };

    // No special case for 12: "12am" stays 12 and "12pm" stays 12.
    if is_pm == Some(true) && hour < 12 {
        hour += 12;
    }

    // Bounds apply to the 24-hour value, after any pm adjustment.
    if hour > 23 || minute > 59 || second > 59 {
        return Err(ParseDateTimeError);
    }

    Ok((hour, minute, second, millisecond))
}
