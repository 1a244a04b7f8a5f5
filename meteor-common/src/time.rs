//! Timestamp utilities
//!
//! Both government APIs take a `date_time` query parameter formatted as
//! `YYYY-MM-DDTHH:MM:SS` in local time.

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::{Error, Result};

/// Format accepted by the traffic and weather APIs
pub const API_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Format a date and time for the APIs, truncating seconds to `:00`
pub fn format_timestamp(date: NaiveDate, time: NaiveTime) -> String {
    let time = time.with_second(0).unwrap_or(time).with_nanosecond(0).unwrap_or(time);
    NaiveDateTime::new(date, time)
        .format(API_TIMESTAMP_FORMAT)
        .to_string()
}

/// Current local time as an API timestamp (seconds kept)
pub fn now_timestamp() -> String {
    Local::now().naive_local().format(API_TIMESTAMP_FORMAT).to_string()
}

/// Parse a `YYYY-MM-DD` date as submitted by the date picker
pub fn parse_date(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|e| Error::InvalidInput(format!("date {:?}: {}", input, e)))
}

/// Parse an `HH:MM` or `HH:MM:SS` time as submitted by the time picker
pub fn parse_time(input: &str) -> Result<NaiveTime> {
    let input = input.trim();
    NaiveTime::parse_from_str(input, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(input, "%H:%M"))
        .map_err(|e| Error::InvalidInput(format!("time {:?}: {}", input, e)))
}
