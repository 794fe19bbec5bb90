//! Date arithmetic for day-scoped downloads.

use chrono::{Datelike as _, Days, Local, NaiveDate, NaiveTime, TimeZone as _, Utc};
use sojourn_core::Error as CoreError;

use crate::{Error, Result};

/// Stays are clipped to end one minute before the next day starts.
const DAY_END_MARGIN_MS: i64 = 60_000;

fn encode_param(year: i32, month0: u32, day: u32) -> String {
  format!("!1m8!1m3!1i{year}!2i{month0}!3i{day}!2m3!1i{year}!2i{month0}!3i{day}")
}

/// Encode the opaque `pb` query parameter for one day.
///
/// `month0` is zero-based (January is 0), matching what the track endpoint
/// expects.
pub fn date_param(year: i32, month0: u32, day: u32) -> Result<String> {
  let valid = month0
    .checked_add(1)
    .and_then(|month| NaiveDate::from_ymd_opt(year, month, day))
    .is_some();
  if !valid {
    return Err(Error::from(CoreError::InvalidArgument(format!(
      "no such date: year {year}, month0 {month0}, day {day}"
    ))));
  }
  Ok(encode_param(year, month0, day))
}

/// [`date_param`] for a calendar date.
pub fn date_param_for(date: NaiveDate) -> String {
  encode_param(date.year(), date.month0(), date.day())
}

/// The dates a backfill of `days` days covers: `today` first, then going
/// backward.
pub fn backfill_dates(today: NaiveDate, days: u32) -> Result<Vec<NaiveDate>> {
  if days == 0 {
    return Err(Error::from(CoreError::InvalidArgument(
      "backfill needs at least one day".into(),
    )));
  }
  (0..days)
    .map(|n| {
      today.checked_sub_days(Days::new(n.into())).ok_or_else(|| {
        Error::from(CoreError::InvalidArgument(format!(
          "{today} minus {n} days is out of range"
        )))
      })
    })
    .collect()
}

/// Local midnight of `date` as epoch milliseconds.
fn local_midnight_ms(date: NaiveDate) -> i64 {
  let naive = date.and_time(NaiveTime::MIN);
  match Local.from_local_datetime(&naive).earliest() {
    Some(dt) => dt.timestamp_millis(),
    None => Utc.from_utc_datetime(&naive).timestamp_millis(),
  }
}

/// The window stays on `date` are clipped to, in epoch milliseconds: local
/// midnight up to one minute before the next local midnight.
pub fn day_window(date: NaiveDate) -> (i64, i64) {
  let start = local_midnight_ms(date);
  let next = date
    .checked_add_days(Days::new(1))
    .map(local_midnight_ms)
    .unwrap_or(start + 86_400_000);
  (start, next - DAY_END_MARGIN_MS)
}
