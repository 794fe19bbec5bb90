//! KML track parser for Sojourn.
//!
//! Turns a location-history export into an ordered list of
//! [`Sample`](sojourn_core::Sample)s. Pure synchronous; no HTTP or database
//! dependencies.
//!
//! # Quick start
//!
//! ```no_run
//! use sojourn_kml::parse_track;
//!
//! let kml = br#"<kml><Document><Placemark><gx:Track>
//!   <when>2016-02-17T10:00:00.000Z</when>
//!   <gx:coord>-122.08 37.42 0</gx:coord>
//! </gx:Track></Placemark></Document></kml>"#;
//! let track = parse_track(kml).unwrap();
//! println!("{} samples, {} rejected", track.samples.len(), track.rejected.len());
//! ```

pub mod error;
mod parse;

pub use error::{Error, Result};
use sojourn_core::Sample;

/// The result of parsing one track document.
#[derive(Debug)]
pub struct ParsedTrack {
  /// One sample per well-formed `when`/`coord` pair, in document order.
  pub samples:  Vec<Sample>,
  /// Per-record errors for pairs that were skipped.
  pub rejected: Vec<Error>,
}

/// Parse a KML track document.
///
/// The first element inside the root is the track container; every `Track`
/// element inside it contributes its positionally paired `when` and `coord`
/// children. Structural problems fail the whole document. A pair whose
/// timestamp or coordinate does not parse is skipped and reported in
/// [`ParsedTrack::rejected`].
pub fn parse_track(xml: &[u8]) -> Result<ParsedTrack> { parse::parse_track(xml) }
