//! Clock and calendar helpers shared across the engine.

use chrono::{Local, NaiveDateTime, NaiveTime};

/// Current Unix timestamp in milliseconds.
pub fn current_time_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Local wall-clock as a naive datetime.
pub(crate) fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Local date formatted `YYYYMMDD`, used for dated file names.
pub(crate) fn today_compact() -> String {
    Local::now().format("%Y%m%d").to_string()
}

/// Interpret a gateway `HH:MM:SS` event time as a datetime on `today`.
///
/// Gateways only push the time of day; the trading day is assumed to be the
/// local calendar day (overnight sessions report times after midnight with
/// the new date, so this holds).
pub(crate) fn event_time_on(today: NaiveDateTime, time: &str) -> Option<NaiveDateTime> {
    let parsed = NaiveTime::parse_from_str(time, "%H:%M:%S").ok()?;
    Some(today.date().and_time(parsed))
}

/// Whether `t` falls inside the end-of-session save window
/// `[daylight_end, night_begin)`.
pub(crate) fn in_save_window(t: NaiveTime, daylight_end: NaiveTime, night_begin: NaiveTime) -> bool {
    t >= daylight_end && t < night_begin
}
