//! Events and locations as they are persisted by an [`EventStore`].
//!
//! [`EventStore`]: crate::store::EventStore

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// What produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
  Calendar,
  UserStay,
}

impl EventType {
  pub fn as_str(self) -> &'static str {
    match self {
      EventType::Calendar => "calendar",
      EventType::UserStay => "userstay",
    }
  }

  pub fn parse(s: &str) -> Result<Self> {
    match s {
      "calendar" => Ok(EventType::Calendar),
      "userstay" => Ok(EventType::UserStay),
      other => Err(Error::UnknownEventType(other.to_owned())),
    }
  }
}

/// Input for [`EventStore::create_event`](crate::store::EventStore::create_event).
/// The id is assigned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEvent {
  /// Identifier of the event in the system it came from, if any.
  pub external_id: Option<String>,
  pub title:       String,
  pub description: String,
  pub location:    String,
  pub color:       i32,
  pub start_time:  i64,
  pub end_time:    i64,
  pub create_time: i64,
  pub event_type:  EventType,
}

/// A persisted event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
  pub id:          i64,
  pub external_id: Option<String>,
  pub title:       String,
  pub description: String,
  pub location:    String,
  pub color:       i32,
  pub start_time:  i64,
  pub end_time:    i64,
  pub create_time: i64,
  pub event_type:  EventType,
}

impl Event {
  pub fn from_new(id: i64, new: NewEvent) -> Self {
    Self {
      id,
      external_id: new.external_id,
      title: new.title,
      description: new.description,
      location: new.location,
      color: new.color,
      start_time: new.start_time,
      end_time: new.end_time,
      create_time: new.create_time,
      event_type: new.event_type,
    }
  }
}

/// A persisted location row, derived from a
/// [`CandidatePlace`](crate::place::CandidatePlace).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
  pub id:                i64,
  pub name:              String,
  pub external_place_id: String,
  pub latitude:          f64,
  pub longitude:         f64,
  pub address:           String,
  /// Whether the user has confirmed visiting this place. New rows start
  /// `false`.
  pub been_there:        bool,
}

/// Outcome of writing a stay: the event and the ids of its candidate
/// locations, in candidate order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedStay {
  pub event:        Event,
  pub location_ids: Vec<i64>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn event_type_round_trips_through_str() {
    for t in [EventType::Calendar, EventType::UserStay] {
      assert_eq!(EventType::parse(t.as_str()).unwrap(), t);
    }
  }

  #[test]
  fn unknown_event_type_is_rejected() {
    assert!(matches!(
      EventType::parse("meeting"),
      Err(Error::UnknownEventType(s)) if s == "meeting"
    ));
  }

  #[test]
  fn event_type_serializes_lowercase() {
    let json = serde_json::to_string(&EventType::UserStay).unwrap();
    assert_eq!(json, "\"userstay\"");
  }
}
