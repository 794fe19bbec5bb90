//! Row types and the SQL helpers shared by the store's write paths.
//!
//! The helpers take a plain `&Connection` so they can run either directly or
//! inside a [`rusqlite::Transaction`] (which derefs to a connection).

use rusqlite::{Connection, OptionalExtension as _};
use sojourn_core::{
  event::{Event, EventType, Location, NewEvent},
  place::CandidatePlace,
};

use crate::Result;

// ─── Row types ───────────────────────────────────────────────────────────────

pub const EVENT_COLUMNS: &str = "id, external_id, type, title, description, location, \
                                 color, start_time, end_time, create_time";

/// Raw values read directly from an `event` row.
pub struct RawEvent {
  pub id:          i64,
  pub external_id: Option<String>,
  pub event_type:  String,
  pub title:       String,
  pub description: String,
  pub location:    String,
  pub color:       i32,
  pub start_time:  i64,
  pub end_time:    i64,
  pub create_time: i64,
}

impl RawEvent {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:          row.get(0)?,
      external_id: row.get(1)?,
      event_type:  row.get(2)?,
      title:       row.get(3)?,
      description: row.get(4)?,
      location:    row.get(5)?,
      color:       row.get(6)?,
      start_time:  row.get(7)?,
      end_time:    row.get(8)?,
      create_time: row.get(9)?,
    })
  }

  pub fn into_event(self) -> Result<Event> {
    Ok(Event {
      id:          self.id,
      external_id: self.external_id,
      title:       self.title,
      description: self.description,
      location:    self.location,
      color:       self.color,
      start_time:  self.start_time,
      end_time:    self.end_time,
      create_time: self.create_time,
      event_type:  EventType::parse(&self.event_type)?,
    })
  }
}

pub const LOCATION_COLUMNS: &str =
  "l.id, l.name, l.place_id, l.latitude, l.longitude, l.address, l.been_there";

pub fn location_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Location> {
  Ok(Location {
    id:                row.get(0)?,
    name:              row.get(1)?,
    external_place_id: row.get(2)?,
    latitude:          row.get(3)?,
    longitude:         row.get(4)?,
    address:           row.get(5)?,
    been_there:        row.get::<_, i64>(6)? != 0,
  })
}

// ─── Write helpers ───────────────────────────────────────────────────────────

pub fn insert_event(conn: &Connection, event: &NewEvent) -> rusqlite::Result<i64> {
  conn.execute(
    "INSERT INTO event (
       external_id, type, title, description, location,
       color, start_time, end_time, create_time
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
    rusqlite::params![
      event.external_id,
      event.event_type.as_str(),
      event.title,
      event.description,
      event.location,
      event.color,
      event.start_time,
      event.end_time,
      event.create_time,
    ],
  )?;
  Ok(conn.last_insert_rowid())
}

pub fn event_exists(conn: &Connection, event_id: i64) -> rusqlite::Result<bool> {
  Ok(
    conn
      .query_row(
        "SELECT 1 FROM event WHERE id = ?1",
        rusqlite::params![event_id],
        |_| Ok(true),
      )
      .optional()?
      .unwrap_or(false),
  )
}

/// Find or create the location row for `place`, then link it to `event_id`.
///
/// Places with a non-empty external id reuse an existing row with the same
/// id; anonymous places always get a fresh row.
pub fn insert_candidate(
  conn: &Connection,
  place: &CandidatePlace,
  event_id: i64,
) -> rusqlite::Result<i64> {
  let existing: Option<i64> = if place.external_place_id.is_empty() {
    None
  } else {
    conn
      .query_row(
        "SELECT id FROM location WHERE place_id = ?1 ORDER BY id LIMIT 1",
        rusqlite::params![place.external_place_id],
        |r| r.get(0),
      )
      .optional()?
  };

  let loc_id = match existing {
    Some(id) => id,
    None => {
      conn.execute(
        "INSERT INTO location (place_id, name, address, latitude, longitude, been_there)
         VALUES (?1, ?2, ?3, ?4, ?5, 0)",
        rusqlite::params![
          place.external_place_id,
          place.name,
          place.address_line(),
          place.latitude,
          place.longitude,
        ],
      )?;
      conn.last_insert_rowid()
    }
  };

  conn.execute(
    "INSERT OR IGNORE INTO event_location_candidates (event_id, loc_id) VALUES (?1, ?2)",
    rusqlite::params![event_id, loc_id],
  )?;
  Ok(loc_id)
}
