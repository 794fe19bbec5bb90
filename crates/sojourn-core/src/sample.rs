//! One timestamped position, and the stays merged from them.

use serde::{Deserialize, Serialize};

/// A position held over a time interval.
///
/// Straight off the track, `start_time == end_time`. After stay detection the
/// same shape describes a merged interval, see [`Stay`]. Times are
/// milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
  pub latitude:   f64,
  pub longitude:  f64,
  pub start_time: i64,
  pub end_time:   i64,
}

/// A merged interval the subject spent within a small radius.
pub type Stay = Sample;

impl Sample {
  /// A zero-duration sample taken at `time`.
  pub fn at(latitude: f64, longitude: f64, time: i64) -> Self {
    Self {
      latitude,
      longitude,
      start_time: time,
      end_time: time,
    }
  }

  pub fn new(latitude: f64, longitude: f64, start_time: i64, end_time: i64) -> Self {
    Self {
      latitude,
      longitude,
      start_time,
      end_time,
    }
  }

  pub fn duration_ms(&self) -> i64 { self.end_time - self.start_time }

  /// Whether `other` lies within `tolerance` degrees on both axes.
  pub fn is_near(&self, other: &Sample, tolerance: f64) -> bool {
    (self.latitude - other.latitude).abs() <= tolerance
      && (self.longitude - other.longitude).abs() <= tolerance
  }

  /// Clip the interval to `[window_start, window_end]`.
  ///
  /// Returns `None` when no time of the interval remains inside the window,
  /// including when it only touches one of the window's edges.
  pub fn clamp_to(&self, window_start: i64, window_end: i64) -> Option<Self> {
    let start_time = self.start_time.max(window_start);
    let end_time = self.end_time.min(window_end);
    (start_time < end_time).then_some(Self {
      start_time,
      end_time,
      ..*self
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn near_is_inclusive_on_both_axes() {
    let a = Sample::at(1.0, 1.0, 0);
    assert!(a.is_near(&Sample::at(1.0005, 0.9995, 0), 0.001));
    assert!(!a.is_near(&Sample::at(1.0, 1.01, 0), 0.001));
    assert!(!a.is_near(&Sample::at(1.01, 1.0, 0), 0.001));
  }

  #[test]
  fn clamp_trims_both_ends() {
    let s = Sample::new(1.0, 2.0, 100, 900);
    let c = s.clamp_to(200, 800).unwrap();
    assert_eq!((c.start_time, c.end_time), (200, 800));
    assert_eq!((c.latitude, c.longitude), (1.0, 2.0));
  }

  #[test]
  fn clamp_outside_window_is_none() {
    let s = Sample::new(1.0, 2.0, 100, 150);
    assert!(s.clamp_to(200, 800).is_none());
  }

  #[test]
  fn clamp_touching_window_edge_is_none() {
    assert!(Sample::new(1.0, 2.0, 100, 200).clamp_to(200, 800).is_none());
    assert!(Sample::new(1.0, 2.0, 800, 900).clamp_to(200, 800).is_none());
  }
}
