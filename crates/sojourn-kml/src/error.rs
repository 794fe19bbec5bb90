//! Error types for the track parser.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("xml error: {0}")]
  Xml(String),

  #[error("document has no root element")]
  MissingRoot,

  #[error("root element has no track container")]
  MissingContainer,

  #[error("track container holds no Track element")]
  MissingTrack,

  #[error("track has {whens} <when> but {coords} <coord> elements")]
  MismatchedPairs { whens: usize, coords: usize },

  #[error("invalid timestamp: {0:?}")]
  InvalidTimestamp(String),

  #[error("invalid coordinate: {0:?}")]
  InvalidCoordinate(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
