//! Error types for `sojourn-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid argument: {0}")]
  InvalidArgument(String),

  #[error("stay detection did not converge after {passes} passes")]
  NonConvergence { passes: usize },

  #[error("unknown event type: {0:?}")]
  UnknownEventType(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
