//! Location-history ingestion for Sojourn.
//!
//! Downloads a day's track export, detects stays, resolves each stay to
//! candidate places, and records the result in an
//! [`EventStore`](sojourn_core::store::EventStore). The [`pipeline`] module
//! sequences the steps; [`track`] and [`places`] hold the network clients.

pub mod date;
pub mod error;
pub mod pipeline;
pub mod places;
pub mod track;

#[cfg(test)]
mod test_helpers;

pub use error::{Error, Result};

use std::path::PathBuf;

use serde::Deserialize;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime configuration, deserialised from `sojourn.toml` and `SOJOURN_*`
/// environment variables. Every field has a default.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct IngestConfig {
  pub store_path:                 PathBuf,
  /// Raw `Cookie` header value for the track download.
  pub session_cookie:             Option<String>,
  pub track_endpoint:             String,
  pub places_endpoint:            String,
  pub places_api_key:             String,
  pub places_radius_m:            u32,
  pub request_timeout_secs:       u64,
  pub resolve_timeout_secs:       u64,
  pub resolve_retries:            u32,
  pub retry_backoff_ms:           u64,
  pub max_concurrent_resolutions: usize,
  pub clamp_to_day:               bool,
}

impl Default for IngestConfig {
  fn default() -> Self {
    Self {
      store_path:                 PathBuf::from("~/.local/share/sojourn/sojourn.db"),
      session_cookie:             None,
      track_endpoint:             track::DEFAULT_TRACK_ENDPOINT.to_owned(),
      places_endpoint:            places::DEFAULT_PLACES_ENDPOINT.to_owned(),
      places_api_key:             String::new(),
      places_radius_m:            50,
      request_timeout_secs:       30,
      resolve_timeout_secs:       20,
      resolve_retries:            2,
      retry_backoff_ms:           500,
      max_concurrent_resolutions: 4,
      clamp_to_day:               true,
    }
  }
}
