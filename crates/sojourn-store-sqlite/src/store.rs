//! [`SqliteStore`]: the SQLite implementation of [`EventStore`].

use std::path::Path;

use sojourn_core::{
  event::{Event, Location, NewEvent, RecordedStay},
  place::CandidatePlace,
  store::EventStore,
};

use crate::{
  Error, Result,
  encode::{
    EVENT_COLUMNS, LOCATION_COLUMNS, RawEvent, event_exists, insert_candidate,
    insert_event, location_from_row,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Sojourn event store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. Concurrent
/// writers are serialised on the connection thread, and every multi-row
/// write runs in its own transaction.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── EventStore impl ─────────────────────────────────────────────────────────

impl EventStore for SqliteStore {
  type Error = Error;

  // ── Writes ────────────────────────────────────────────────────────────────

  async fn create_event(&self, event: NewEvent) -> Result<i64> {
    let id = self
      .conn
      .call(move |conn| Ok(insert_event(conn, &event)?))
      .await?;
    tracing::debug!(event_id = id, "created event");
    Ok(id)
  }

  async fn create_location_candidate(
    &self,
    place: CandidatePlace,
    event_id: i64,
  ) -> Result<i64> {
    let loc_id: Option<i64> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if !event_exists(&tx, event_id)? {
          return Ok(None);
        }
        let loc_id = insert_candidate(&tx, &place, event_id)?;
        tx.commit()?;
        Ok(Some(loc_id))
      })
      .await?;

    loc_id.ok_or(Error::EventNotFound(event_id))
  }

  async fn record_stay(
    &self,
    event: NewEvent,
    candidates: Vec<CandidatePlace>,
  ) -> Result<RecordedStay> {
    let for_insert = event.clone();
    let (id, location_ids) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let id = insert_event(&tx, &for_insert)?;
        let location_ids = candidates
          .iter()
          .map(|place| insert_candidate(&tx, place, id))
          .collect::<rusqlite::Result<Vec<_>>>()?;
        tx.commit()?;
        Ok((id, location_ids))
      })
      .await?;

    tracing::debug!(
      event_id = id,
      candidates = location_ids.len(),
      "recorded stay"
    );
    Ok(RecordedStay {
      event: Event::from_new(id, event),
      location_ids,
    })
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn query_events(&self, start_time: i64, end_time: i64) -> Result<Vec<Event>> {
    let raws: Vec<RawEvent> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {EVENT_COLUMNS} FROM event
           WHERE start_time <= ?2 AND end_time >= ?1
           ORDER BY start_time, id"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![start_time, end_time], RawEvent::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawEvent::into_event).collect()
  }

  async fn event_candidates(&self, event_id: i64) -> Result<Vec<Location>> {
    let locations = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {LOCATION_COLUMNS}
           FROM event_location_candidates c
           JOIN location l ON l.id = c.loc_id
           WHERE c.event_id = ?1
           ORDER BY l.id"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![event_id], location_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(locations)
  }
}
