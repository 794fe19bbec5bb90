//! Error type for `sojourn-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] sojourn_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("event not found: {0}")]
  EventNotFound(i64),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
