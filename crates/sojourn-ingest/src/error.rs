//! Error type for the ingestion pipeline.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("no authenticated session")]
  NotAuthenticated,

  #[error("transport error: {0}")]
  Transport(String),

  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("unexpected status: {0}")]
  Status(reqwest::StatusCode),

  #[error("places service error: {0}")]
  Service(String),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("parse error: {0}")]
  Parse(#[from] sojourn_kml::Error),

  #[error(transparent)]
  Core(#[from] sojourn_core::Error),

  #[error("persistence error: {0}")]
  Persistence(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("cancelled")]
  Cancelled,

  #[error("task failed: {0}")]
  Join(#[from] tokio::task::JoinError),
}

impl Error {
  /// Whether a retry of the same request could succeed.
  pub fn is_retryable(&self) -> bool {
    match self {
      Error::Http(_) | Error::Transport(_) => true,
      Error::Status(status) => status.is_server_error(),
      _ => false,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
