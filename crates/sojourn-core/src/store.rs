//! The `EventStore` trait, the persistence gateway of the pipeline.
//!
//! Implemented by storage backends (e.g. `sojourn-store-sqlite`). The
//! ingestion pipeline depends on this abstraction, not on a concrete backend.

use std::future::Future;

use crate::{
  event::{Event, Location, NewEvent, RecordedStay},
  place::CandidatePlace,
};

/// Abstraction over an event/location store backend.
///
/// All methods return `Send` futures so the trait can be used from tasks on a
/// multi-threaded tokio runtime.
pub trait EventStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Writes ────────────────────────────────────────────────────────────

  /// Persist a new event and return its store-assigned id.
  fn create_event(
    &self,
    event: NewEvent,
  ) -> impl Future<Output = Result<i64, Self::Error>> + Send + '_;

  /// Persist a location derived from `place` and link it to `event_id` as a
  /// candidate. Returns the location id.
  fn create_location_candidate(
    &self,
    place: CandidatePlace,
    event_id: i64,
  ) -> impl Future<Output = Result<i64, Self::Error>> + Send + '_;

  /// Persist an event together with all of its candidate places as one
  /// unit: either everything is committed or nothing is.
  fn record_stay(
    &self,
    event: NewEvent,
    candidates: Vec<CandidatePlace>,
  ) -> impl Future<Output = Result<RecordedStay, Self::Error>> + Send + '_;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// All events overlapping `[start_time, end_time]`, ordered by start time.
  fn query_events(
    &self,
    start_time: i64,
    end_time: i64,
  ) -> impl Future<Output = Result<Vec<Event>, Self::Error>> + Send + '_;

  /// Candidate locations linked to an event.
  fn event_candidates(
    &self,
    event_id: i64,
  ) -> impl Future<Output = Result<Vec<Location>, Self::Error>> + Send + '_;
}
