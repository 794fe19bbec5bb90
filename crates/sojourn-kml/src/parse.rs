//! Streaming KML reader.
//!
//! Pipeline:
//!   raw &[u8]
//!     └─ read_tracks()   → Vec<RawTrack>  (structure checks)
//!          └─ pair()     → Sample per when/coord pair
//!               └─ parse_when() / parse_coord()

use chrono::{DateTime, NaiveDateTime};
use quick_xml::{Reader, events::Event};
use sojourn_core::Sample;

use crate::{
  ParsedTrack,
  error::{Error, Result},
};

// ─── Raw track ───────────────────────────────────────────────────────────────

#[derive(Default)]
struct RawTrack {
  whens:  Vec<String>,
  coords: Vec<String>,
}

#[derive(Clone, Copy)]
enum Field {
  When,
  Coord,
}

#[derive(PartialEq)]
enum Container {
  Pending,
  Open,
  Closed,
}

// ─── Low-level helpers
// ────────────────────────────────────────────────────────

fn local_name(name: &[u8]) -> &[u8] {
  // strip "prefix:" if present
  if let Some(pos) = name.iter().rposition(|&b| b == b':') {
    &name[pos + 1..]
  } else {
    name
  }
}

fn field_for(local: &[u8]) -> Option<Field> {
  match local {
    b"when" => Some(Field::When),
    b"coord" => Some(Field::Coord),
    _ => None,
  }
}

fn push_field(track: &mut RawTrack, field: Field, text: String) {
  match field {
    Field::When => track.whens.push(text),
    Field::Coord => track.coords.push(text),
  }
}

/// Parse a `when` value: `yyyy-MM-ddTHH:mm:ss.SSS`, with an optional `Z` or
/// numeric offset. Values without an offset are read as UTC.
pub(crate) fn parse_when(raw: &str) -> Result<i64> {
  let s = raw.trim();
  if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
    return Ok(dt.timestamp_millis());
  }
  NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
    .map(|naive| naive.and_utc().timestamp_millis())
    .map_err(|_| Error::InvalidTimestamp(s.to_owned()))
}

/// Parse a `coord` value `"<lng> <lat>[ <alt>]"` into `(lat, lng)`.
pub(crate) fn parse_coord(raw: &str) -> Result<(f64, f64)> {
  let invalid = || Error::InvalidCoordinate(raw.trim().to_owned());
  let mut parts = raw.split_whitespace();
  let lng: f64 = parts.next().and_then(|p| p.parse().ok()).ok_or_else(invalid)?;
  let lat: f64 = parts.next().and_then(|p| p.parse().ok()).ok_or_else(invalid)?;

  if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
    return Err(invalid());
  }
  Ok((lat, lng))
}

// ─── Document walk ───────────────────────────────────────────────────────────

/// Collect the raw `when`/`coord` text of every track in the container.
fn read_tracks(xml: &[u8]) -> Result<Vec<RawTrack>> {
  let mut reader = Reader::from_reader(xml);
  reader.config_mut().trim_text(true);

  let mut buf = Vec::new();
  let mut depth = 0usize;
  let mut saw_root = false;
  let mut container = Container::Pending;
  let mut open_track: Option<(usize, RawTrack)> = None;
  let mut capture: Option<(usize, Field, String)> = None;
  let mut tracks = Vec::new();

  loop {
    match reader.read_event_into(&mut buf) {
      Ok(Event::Start(ref e)) => {
        depth += 1;
        let name_buf = e.name();
        let local = local_name(name_buf.as_ref());

        match depth {
          1 => saw_root = true,
          2 if container == Container::Pending => container = Container::Open,
          _ => {}
        }

        if container == Container::Open && depth >= 2 {
          if open_track.is_none() {
            if local == b"Track" {
              open_track = Some((depth, RawTrack::default()));
            }
          } else if let Some(field) = field_for(local) {
            capture = Some((depth, field, String::new()));
          }
        }
      }
      Ok(Event::Empty(ref e)) => {
        let name_buf = e.name();
        let local = local_name(name_buf.as_ref());
        match depth {
          0 => saw_root = true,
          // An empty first child still claims the container slot.
          1 if container == Container::Pending => container = Container::Closed,
          _ => {}
        }
        if let (Some((_, track)), Some(field)) = (open_track.as_mut(), field_for(local)) {
          push_field(track, field, String::new());
        }
      }
      Ok(Event::Text(ref e)) => {
        if let Some((_, _, text)) = capture.as_mut() {
          let value = e.unescape().map_err(|e| Error::Xml(e.to_string()))?;
          text.push_str(&value);
        }
      }
      Ok(Event::CData(ref e)) => {
        if let Some((_, _, text)) = capture.as_mut() {
          text.push_str(&String::from_utf8_lossy(e.as_ref()));
        }
      }
      Ok(Event::End(_)) => {
        if let Some((at, field, text)) = capture.take() {
          if at == depth {
            if let Some((_, track)) = open_track.as_mut() {
              push_field(track, field, text);
            }
          } else {
            capture = Some((at, field, text));
          }
        }
        if open_track.as_ref().is_some_and(|(at, _)| *at == depth) {
          if let Some((_, track)) = open_track.take() {
            tracks.push(track);
          }
        }
        if depth == 2 && container == Container::Open {
          container = Container::Closed;
        }
        depth = depth.saturating_sub(1);
      }
      Ok(Event::Eof) => break,
      Err(e) => return Err(Error::Xml(e.to_string())),
      _ => {}
    }
    buf.clear();
  }

  if depth != 0 {
    return Err(Error::Xml("unexpected end of document".into()));
  }
  if !saw_root {
    return Err(Error::MissingRoot);
  }
  if container == Container::Pending {
    return Err(Error::MissingContainer);
  }
  if tracks.is_empty() {
    return Err(Error::MissingTrack);
  }
  Ok(tracks)
}

// ─── Entry point ─────────────────────────────────────────────────────────────

pub(crate) fn parse_track(xml: &[u8]) -> Result<ParsedTrack> {
  let tracks = read_tracks(xml)?;

  // Validate every track before producing anything so a structural error
  // never yields a partial list.
  if let Some(bad) = tracks.iter().find(|t| t.whens.len() != t.coords.len()) {
    return Err(Error::MismatchedPairs {
      whens:  bad.whens.len(),
      coords: bad.coords.len(),
    });
  }

  let mut samples = Vec::new();
  let mut rejected = Vec::new();

  for track in tracks {
    for (when, coord) in track.whens.iter().zip(&track.coords) {
      let parsed = parse_when(when).and_then(|t| parse_coord(coord).map(|c| (t, c)));
      match parsed {
        Ok((time, (lat, lng))) => samples.push(Sample::at(lat, lng, time)),
        Err(e) => rejected.push(e),
      }
    }
  }

  Ok(ParsedTrack { samples, rejected })
}
