//! The ingestion pipeline: download → parse → detect → resolve → persist.
//!
//! One *day cycle* fetches a single day's track and records every stay found
//! in it. [`Pipeline::run_today`] runs one cycle; [`Pipeline::run_backfill`]
//! runs one per day going backward from today, and a failing day never stops
//! the days after it.
//!
//! Within a cycle, parsing and stay detection run on the blocking pool, and
//! stays are resolved concurrently (bounded by a semaphore). Each resolved
//! stay is written through [`EventStore::record_stay`], so an event and its
//! candidate locations commit together. A stay whose resolution was aborted
//! by cancellation is not written at all.

use std::{sync::Arc, time::Duration};

use chrono::{Local, NaiveDate, Utc};
use serde::Serialize;
use sojourn_core::{
  Stay,
  event::{EventType, NewEvent},
  place::CandidatePlace,
  session::SessionProvider,
  stay::{StayPolicy, detect_stays_with},
  store::EventStore,
};
use tokio::{sync::Semaphore, task::JoinSet};
use tokio_util::sync::CancellationToken;

use crate::{
  Error, IngestConfig, Result,
  date::{backfill_dates, date_param_for, day_window},
  places::PlaceResolver,
  track::TrackSource,
};

// ─── Options & reports ───────────────────────────────────────────────────────

/// Tunables for a [`Pipeline`].
#[derive(Debug, Clone)]
pub struct PipelineOptions {
  pub download_timeout:           Duration,
  /// Upper bound for one stay's resolution, retries included.
  pub resolve_timeout:            Duration,
  pub max_concurrent_resolutions: usize,
  /// Clip stays to the day being processed.
  pub clamp_to_day:               bool,
  pub stay_policy:                StayPolicy,
}

impl Default for PipelineOptions {
  fn default() -> Self { Self::from(&IngestConfig::default()) }
}

impl From<&IngestConfig> for PipelineOptions {
  fn from(cfg: &IngestConfig) -> Self {
    Self {
      download_timeout:           Duration::from_secs(cfg.request_timeout_secs),
      resolve_timeout:            Duration::from_secs(cfg.resolve_timeout_secs),
      max_concurrent_resolutions: cfg.max_concurrent_resolutions,
      clamp_to_day:               cfg.clamp_to_day,
      stay_policy:                StayPolicy::default(),
    }
  }
}

/// What one day cycle did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayReport {
  pub date:                 NaiveDate,
  pub samples:              usize,
  /// Track records skipped because their timestamp or coordinate was bad.
  pub rejected_records:     usize,
  pub stays:                usize,
  pub persisted:            usize,
  /// Stays written with no candidates because the lookup failed.
  pub resolution_failures:  usize,
  pub persistence_failures: usize,
  /// Stays dropped because cancellation cut their resolution short.
  pub aborted:              usize,
}

impl DayReport {
  fn empty(date: NaiveDate) -> Self {
    Self {
      date,
      samples: 0,
      rejected_records: 0,
      stays: 0,
      persisted: 0,
      resolution_failures: 0,
      persistence_failures: 0,
      aborted: 0,
    }
  }
}

/// Outcome of a backfill, one entry per day, newest first.
#[derive(Debug)]
pub struct BackfillReport {
  pub days: Vec<(NaiveDate, Result<DayReport>)>,
}

impl BackfillReport {
  pub fn succeeded(&self) -> impl Iterator<Item = &DayReport> {
    self.days.iter().filter_map(|(_, r)| r.as_ref().ok())
  }

  pub fn failures(&self) -> impl Iterator<Item = (NaiveDate, &Error)> {
    self
      .days
      .iter()
      .filter_map(|(date, r)| r.as_ref().err().map(|e| (*date, e)))
  }
}

// ─── Event content ───────────────────────────────────────────────────────────

/// Build the `USERSTAY` event recorded for `stay`.
///
/// The first candidate names the event and supplies its location; the
/// description lists every candidate.
pub fn stay_event(stay: &Stay, candidates: &[CandidatePlace], create_time: i64) -> NewEvent {
  let title = candidates
    .first()
    .map(|p| p.name.clone())
    .unwrap_or_else(|| "Stay".to_owned());

  let mut description = String::from("Place candidates:");
  for (i, place) in candidates.iter().enumerate() {
    description.push_str(&format!("\n{}. {}", i + 1, place.name));
  }

  NewEvent {
    external_id: Some(format!("userstay:{}-{}", stay.start_time, stay.end_time)),
    title,
    description,
    location: candidates
      .first()
      .map(CandidatePlace::address_line)
      .unwrap_or_default(),
    color: -1,
    start_time: stay.start_time,
    end_time: stay.end_time,
    create_time,
    event_type: EventType::UserStay,
  }
}

// ─── Pipeline ────────────────────────────────────────────────────────────────

enum Resolution {
  Resolved(Vec<CandidatePlace>),
  Failed(Error),
  Aborted,
}

/// Sequences downloads, parsing, stay detection, place resolution and
/// persistence.
pub struct Pipeline<A, T, R, S> {
  session:  A,
  source:   T,
  resolver: Arc<R>,
  store:    Arc<S>,
  options:  PipelineOptions,
}

impl<A, T, R, S> Pipeline<A, T, R, S>
where
  A: SessionProvider,
  T: TrackSource,
  R: PlaceResolver + 'static,
  S: EventStore,
{
  pub fn new(session: A, source: T, resolver: R, store: Arc<S>, options: PipelineOptions) -> Self {
    Self {
      session,
      source,
      resolver: Arc::new(resolver),
      store,
      options,
    }
  }

  pub fn store(&self) -> &S { &self.store }

  fn session_cookie(&self) -> Result<String> {
    if !self.session.is_authenticated() {
      return Err(Error::NotAuthenticated);
    }
    self.session.session_cookie().ok_or(Error::NotAuthenticated)
  }

  /// Run one cycle for today's track.
  pub async fn run_today(&self, cancel: &CancellationToken) -> Result<DayReport> {
    self.run_today_from(Local::now().date_naive(), cancel).await
  }

  /// Run one cycle for `today`.
  pub async fn run_today_from(
    &self,
    today: NaiveDate,
    cancel: &CancellationToken,
  ) -> Result<DayReport> {
    let cookie = self.session_cookie()?;
    self.run_day(today, &cookie, cancel).await
  }

  /// Run one cycle per day for the last `days` days, today included.
  pub async fn run_backfill(
    &self,
    days: u32,
    cancel: &CancellationToken,
  ) -> Result<BackfillReport> {
    self
      .run_backfill_from(Local::now().date_naive(), days, cancel)
      .await
  }

  /// [`run_backfill`](Self::run_backfill) anchored at `today`.
  pub async fn run_backfill_from(
    &self,
    today: NaiveDate,
    days: u32,
    cancel: &CancellationToken,
  ) -> Result<BackfillReport> {
    let cookie = self.session_cookie()?;
    let dates = backfill_dates(today, days)?;

    let mut report = BackfillReport {
      days: Vec::with_capacity(dates.len()),
    };
    for date in dates {
      let outcome = if cancel.is_cancelled() {
        Err(Error::Cancelled)
      } else {
        self.run_day(date, &cookie, cancel).await
      };
      if let Err(e) = &outcome {
        tracing::warn!(%date, error = %e, "day failed");
      }
      report.days.push((date, outcome));
    }

    tracing::info!(
      days = report.days.len(),
      failed = report.failures().count(),
      "backfill finished"
    );
    Ok(report)
  }

  #[tracing::instrument(skip_all, fields(date = %date))]
  async fn run_day(
    &self,
    date: NaiveDate,
    cookie: &str,
    cancel: &CancellationToken,
  ) -> Result<DayReport> {
    let param = date_param_for(date);
    let timeout = self.options.download_timeout;

    let body = tokio::select! {
      biased;
      _ = cancel.cancelled() => return Err(Error::Cancelled),
      fetched = tokio::time::timeout(timeout, self.source.fetch(&param, cookie)) => fetched
        .map_err(|_| Error::Transport(format!("download timed out after {timeout:?}")))??,
    };

    let parsed = tokio::task::spawn_blocking(move || sojourn_kml::parse_track(&body)).await??;
    for rejected in &parsed.rejected {
      tracing::warn!(error = %rejected, "skipped track record");
    }

    let mut report = DayReport::empty(date);
    report.samples = parsed.samples.len();
    report.rejected_records = parsed.rejected.len();
    if parsed.samples.is_empty() {
      tracing::info!("track has no samples");
      return Ok(report);
    }

    let policy = self.options.stay_policy;
    let samples = parsed.samples;
    let mut stays =
      tokio::task::spawn_blocking(move || detect_stays_with(&samples, &policy)).await??;

    // Clipping can shorten a stay below the minimum; those are dropped.
    if self.options.clamp_to_day {
      let (start, end) = day_window(date);
      let min_duration = policy.min_duration_ms;
      stays = stays
        .into_iter()
        .filter_map(|stay| stay.clamp_to(start, end))
        .filter(|stay| stay.duration_ms() >= min_duration)
        .collect();
    }
    report.stays = stays.len();

    let mut tasks = self.spawn_resolutions(stays, cancel);
    let create_time = Utc::now().timestamp_millis();

    while let Some(joined) = tasks.join_next().await {
      let (stay, resolution) = match joined {
        Ok(pair) => pair,
        Err(e) => {
          tracing::error!(error = %e, "resolution task failed");
          report.aborted += 1;
          continue;
        }
      };

      let candidates = match resolution {
        Resolution::Resolved(candidates) => candidates,
        Resolution::Failed(e) => {
          tracing::warn!(
            lat = stay.latitude,
            lng = stay.longitude,
            error = %e,
            "place lookup failed; recording stay without candidates"
          );
          report.resolution_failures += 1;
          Vec::new()
        }
        Resolution::Aborted => {
          report.aborted += 1;
          continue;
        }
      };

      let event = stay_event(&stay, &candidates, create_time);
      match self.store.record_stay(event, candidates).await {
        Ok(recorded) => {
          tracing::debug!(
            event_id = recorded.event.id,
            candidates = recorded.location_ids.len(),
            "stay recorded"
          );
          report.persisted += 1;
        }
        Err(e) => {
          let e = Error::Persistence(Box::new(e));
          tracing::warn!(start = stay.start_time, error = %e, "stay not recorded");
          report.persistence_failures += 1;
        }
      }
    }

    tracing::info!(
      samples = report.samples,
      stays = report.stays,
      persisted = report.persisted,
      resolution_failures = report.resolution_failures,
      aborted = report.aborted,
      "day finished"
    );
    Ok(report)
  }

  /// Start one resolution task per stay. Tasks wait for a semaphore permit
  /// and race `cancel`; a cancelled task yields [`Resolution::Aborted`].
  fn spawn_resolutions(
    &self,
    stays: Vec<Stay>,
    cancel: &CancellationToken,
  ) -> JoinSet<(Stay, Resolution)> {
    let semaphore = Arc::new(Semaphore::new(self.options.max_concurrent_resolutions.max(1)));
    let timeout = self.options.resolve_timeout;
    let mut tasks = JoinSet::new();

    for stay in stays {
      let resolver = Arc::clone(&self.resolver);
      let semaphore = Arc::clone(&semaphore);
      let cancel = cancel.clone();

      tasks.spawn(async move {
        let resolution = tokio::select! {
          biased;
          _ = cancel.cancelled() => Resolution::Aborted,
          outcome = async {
            let _permit = semaphore.acquire().await.ok();
            tokio::time::timeout(timeout, resolver.resolve(stay)).await
          } => match outcome {
            Ok(Ok(places)) => Resolution::Resolved(places),
            Ok(Err(e)) => Resolution::Failed(e),
            Err(_) => Resolution::Failed(Error::Transport(format!(
              "place lookup timed out after {timeout:?}"
            ))),
          },
        };
        (stay, resolution)
      });
    }
    tasks
  }
}
