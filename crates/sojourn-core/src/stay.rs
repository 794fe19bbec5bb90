//! Stay detection: collapsing an ordered track into stay intervals.
//!
//! A single forward pass merges runs of consecutive samples that stay within
//! [`PROXIMITY_DEGREES`] of the run's first sample, and keeps a run only if
//! it lasted at least [`MIN_STAY_MS`]. Dropping short runs can make two kept
//! runs adjacent, so passes repeat until one emits as many stays as it was
//! given. The pass count is capped; hitting the cap is reported as
//! [`Error::NonConvergence`].

use crate::{Error, Result, Sample, Stay};

/// Maximum per-axis distance, in degrees, for a sample to join a stay.
pub const PROXIMITY_DEGREES: f64 = 0.001;

/// Minimum duration of an emitted stay (ten minutes).
pub const MIN_STAY_MS: i64 = 600_000;

/// Pass cap for [`detect_stays`].
pub const MAX_PASSES: usize = 64;

/// Tunables for [`detect_stays_with`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StayPolicy {
  pub proximity_degrees: f64,
  pub min_duration_ms:   i64,
  pub max_passes:        usize,
}

impl Default for StayPolicy {
  fn default() -> Self {
    Self {
      proximity_degrees: PROXIMITY_DEGREES,
      min_duration_ms:   MIN_STAY_MS,
      max_passes:        MAX_PASSES,
    }
  }
}

/// Detect stays in `samples` with the default policy.
///
/// `samples` must be non-empty and in time order. The result may be empty:
/// a run shorter than ten minutes is dropped, including a lone final sample.
pub fn detect_stays(samples: &[Sample]) -> Result<Vec<Stay>> {
  detect_stays_with(samples, &StayPolicy::default())
}

/// Detect stays in `samples` under `policy`.
pub fn detect_stays_with(samples: &[Sample], policy: &StayPolicy) -> Result<Vec<Stay>> {
  if samples.is_empty() {
    return Err(Error::InvalidArgument(
      "stay detection needs at least one sample".into(),
    ));
  }
  if policy.max_passes == 0 {
    return Err(Error::InvalidArgument("max_passes must be at least 1".into()));
  }

  let mut current = samples.to_vec();
  for _ in 0..policy.max_passes {
    let next = merge_pass(&current, policy);
    if next.is_empty() || next.len() == current.len() {
      return Ok(next);
    }
    current = next;
  }

  Err(Error::NonConvergence {
    passes: policy.max_passes,
  })
}

/// One forward merge pass. `input` is non-empty.
fn merge_pass(input: &[Sample], policy: &StayPolicy) -> Vec<Stay> {
  let mut out = Vec::new();
  let mut acc = input[0];

  for sample in &input[1..] {
    if acc.is_near(sample, policy.proximity_degrees) {
      acc.end_time = sample.end_time;
    } else {
      if acc.duration_ms() >= policy.min_duration_ms {
        out.push(acc);
      }
      acc = *sample;
    }
  }

  if acc.duration_ms() >= policy.min_duration_ms {
    out.push(acc);
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;

  const MIN: i64 = 60_000;

  fn at(lat: f64, lng: f64, t: i64) -> Sample { Sample::at(lat, lng, t) }

  #[test]
  fn empty_input_is_invalid() {
    assert!(matches!(detect_stays(&[]), Err(Error::InvalidArgument(_))));
  }

  #[test]
  fn nearby_samples_merge_into_one_stay() {
    let t0 = 1_000_000;
    let samples = [
      at(1.0, 1.0, t0),
      at(1.0, 1.0, t0 + 700_000),
      at(1.0, 1.0001, t0 + 900_000),
    ];
    let stays = detect_stays(&samples).unwrap();
    assert_eq!(stays.len(), 1);
    assert_eq!(stays[0].start_time, t0);
    assert_eq!(stays[0].end_time, t0 + 900_000);
    assert_eq!((stays[0].latitude, stays[0].longitude), (1.0, 1.0));
  }

  #[test]
  fn two_distant_short_samples_are_both_dropped() {
    let samples = [at(1.0, 1.0, 0), at(1.01, 1.0, 5 * MIN)];
    assert!(detect_stays(&samples).unwrap().is_empty());
  }

  #[test]
  fn lone_sample_is_dropped() {
    assert!(detect_stays(&[at(1.0, 1.0, 0)]).unwrap().is_empty());
  }

  #[test]
  fn exactly_ten_minutes_is_kept() {
    let samples = [at(1.0, 1.0, 0), at(1.0, 1.0, MIN_STAY_MS)];
    let stays = detect_stays(&samples).unwrap();
    assert_eq!(stays.len(), 1);
    assert_eq!(stays[0].duration_ms(), MIN_STAY_MS);
  }

  #[test]
  fn proximity_is_measured_from_the_run_start() {
    // Each step is within tolerance of the previous sample but the third
    // drifts out of range of the first.
    let samples = [
      at(1.0, 1.0, 0),
      at(1.0, 1.0008, 11 * MIN),
      at(1.0, 1.0016, 12 * MIN),
    ];
    let stays = detect_stays(&samples).unwrap();
    assert_eq!(stays.len(), 1);
    assert_eq!(stays[0].end_time, 11 * MIN);
  }

  #[test]
  fn interrupted_stay_is_rejoined_on_a_later_pass() {
    // A - A - B - A - A: the short B excursion is dropped on the first pass,
    // leaving two adjacent A stays that only merge on the second.
    let samples = [
      at(1.0, 1.0, 0),
      at(1.0, 1.0, 11 * MIN),
      at(2.0, 2.0, 12 * MIN),
      at(1.0, 1.0, 13 * MIN),
      at(1.0, 1.0, 25 * MIN),
    ];
    let stays = detect_stays(&samples).unwrap();
    assert_eq!(stays, vec![Sample::new(1.0, 1.0, 0, 25 * MIN)]);
  }

  #[test]
  fn pass_cap_reports_non_convergence() {
    let samples = [
      at(1.0, 1.0, 0),
      at(1.0, 1.0, 11 * MIN),
      at(2.0, 2.0, 12 * MIN),
      at(1.0, 1.0, 13 * MIN),
      at(1.0, 1.0, 25 * MIN),
    ];
    let policy = StayPolicy {
      max_passes: 2,
      ..StayPolicy::default()
    };
    assert!(matches!(
      detect_stays_with(&samples, &policy),
      Err(Error::NonConvergence { passes: 2 })
    ));

    let policy = StayPolicy {
      max_passes: 3,
      ..StayPolicy::default()
    };
    assert_eq!(detect_stays_with(&samples, &policy).unwrap().len(), 1);
  }

  #[test]
  fn zero_pass_cap_is_invalid() {
    let policy = StayPolicy {
      max_passes: 0,
      ..StayPolicy::default()
    };
    assert!(matches!(
      detect_stays_with(&[at(1.0, 1.0, 0)], &policy),
      Err(Error::InvalidArgument(_))
    ));
  }

  /// A day-shaped track: home, commute, office, lunch, office, commute, home.
  fn day_track() -> Vec<Sample> {
    let mut samples = Vec::new();
    let mut t = 0;
    let mut dwell = |lat: f64, lng: f64, minutes: i64, samples: &mut Vec<Sample>| {
      for _ in 0..minutes / 5 {
        samples.push(at(lat, lng, t));
        t += 5 * MIN;
      }
    };
    dwell(40.0, -74.0, 60, &mut samples);
    dwell(40.01, -74.01, 5, &mut samples);
    dwell(40.02, -74.02, 5, &mut samples);
    dwell(40.05, -74.05, 120, &mut samples);
    dwell(40.06, -74.05, 5, &mut samples);
    dwell(40.05, -74.05, 90, &mut samples);
    dwell(40.02, -74.02, 5, &mut samples);
    dwell(40.0, -74.0, 60, &mut samples);
    samples
  }

  #[test]
  fn detection_is_a_fixed_point() {
    let stays = detect_stays(&day_track()).unwrap();
    assert!(!stays.is_empty());
    let again = detect_stays(&stays).unwrap();
    assert_eq!(stays, again);
  }

  #[test]
  fn stays_are_ordered_and_never_inverted() {
    let stays = detect_stays(&day_track()).unwrap();
    assert!(stays.iter().all(|s| s.end_time >= s.start_time));
    assert!(stays.iter().all(|s| s.duration_ms() >= MIN_STAY_MS));
    assert!(stays.windows(2).all(|w| w[0].end_time <= w[1].start_time));
  }

  #[test]
  fn day_track_collapses_office_visit_across_lunch() {
    let stays = detect_stays(&day_track()).unwrap();
    let office: Vec<_> = stays
      .iter()
      .filter(|s| s.latitude == 40.05 && s.longitude == -74.05)
      .collect();
    assert_eq!(office.len(), 1);
    assert_eq!(stays.len(), 3);
  }
}
