//! Place resolution: nearby-places lookups for detected stays.

use std::{future::Future, time::Duration};

use reqwest::Client;
use serde::Deserialize;
use sojourn_core::{Stay, place::CandidatePlace};

use crate::{Error, IngestConfig, Result};

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Turns a stay into zero or more candidate places.
///
/// One call per stay. The pipeline runs calls concurrently, so
/// implementations must be shareable across tasks.
pub trait PlaceResolver: Send + Sync {
  fn resolve(
    &self,
    stay: Stay,
  ) -> impl Future<Output = Result<Vec<CandidatePlace>>> + Send + '_;
}

// ─── Wire types ──────────────────────────────────────────────────────────────

/// Top level of a nearby-search response. Every field is optional; results
/// are kept as raw values so one bad entry cannot sink the rest.
#[derive(Debug, Deserialize)]
struct NearbyResponse {
  #[serde(default)]
  status:        Option<String>,
  #[serde(default)]
  error_message: Option<String>,
  #[serde(default)]
  results:       Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RawPlace {
  name:     Option<String>,
  vicinity: Option<String>,
  place_id: Option<String>,
  geometry: Option<RawGeometry>,
}

#[derive(Debug, Deserialize)]
struct RawGeometry {
  location: Option<RawLatLng>,
}

#[derive(Debug, Deserialize)]
struct RawLatLng {
  lat: Option<f64>,
  lng: Option<f64>,
}

impl RawPlace {
  fn into_candidate(self) -> Option<CandidatePlace> {
    let name = self.name?;
    let location = self.geometry.and_then(|g| g.location);
    let (latitude, longitude) = location
      .map(|l| (l.lat.unwrap_or(0.0), l.lng.unwrap_or(0.0)))
      .unwrap_or((0.0, 0.0));
    let address = self
      .vicinity
      .as_deref()
      .map(|v| {
        v.split(',')
          .map(str::trim)
          .filter(|part| !part.is_empty())
          .map(str::to_owned)
          .collect()
      })
      .unwrap_or_default();

    Some(CandidatePlace {
      name,
      external_place_id: self.place_id.unwrap_or_default(),
      latitude,
      longitude,
      address,
    })
  }
}

/// Parse a nearby-search response body.
///
/// Entries without a `name`, or whose fields have the wrong JSON type, are
/// skipped. A `status` other than `OK` or `ZERO_RESULTS` is an error.
pub fn parse_places(body: &str) -> Result<Vec<CandidatePlace>> {
  let response: NearbyResponse = serde_json::from_str(body)?;

  if let Some(status) = response.status.as_deref()
    && !matches!(status, "OK" | "ZERO_RESULTS")
  {
    let detail = response.error_message.unwrap_or_default();
    return Err(Error::Service(format!("{status} {detail}").trim_end().to_owned()));
  }

  Ok(
    response
      .results
      .into_iter()
      .filter_map(|value| serde_json::from_value::<RawPlace>(value).ok())
      .filter_map(RawPlace::into_candidate)
      .collect(),
  )
}

// ─── HTTP client ─────────────────────────────────────────────────────────────

pub const DEFAULT_PLACES_ENDPOINT: &str =
  "https://maps.googleapis.com/maps/api/place/nearbysearch/json";

/// Connection settings for the places service.
#[derive(Debug, Clone)]
pub struct PlacesConfig {
  pub endpoint: String,
  pub api_key:  String,
  pub radius_m: u32,
  pub timeout:  Duration,
  /// Extra attempts after the first for retryable failures.
  pub retries:  u32,
  /// Delay before retry `n` is `backoff * n`.
  pub backoff:  Duration,
}

const MIN_REQUEST_TIMEOUT: Duration = Duration::from_secs(1);

/// Split the whole-resolution bound across every attempt, after the retry
/// sleeps, so a timed-out request still leaves room for its retries.
fn per_request_timeout(resolve_timeout: Duration, retries: u32, backoff: Duration) -> Duration {
  let attempts = retries.saturating_add(1);
  let sleeps = backoff * (retries.saturating_mul(attempts) / 2);
  (resolve_timeout.saturating_sub(sleeps) / attempts).max(MIN_REQUEST_TIMEOUT)
}

impl From<&IngestConfig> for PlacesConfig {
  fn from(cfg: &IngestConfig) -> Self {
    let backoff = Duration::from_millis(cfg.retry_backoff_ms);
    Self {
      endpoint: cfg.places_endpoint.clone(),
      api_key:  cfg.places_api_key.clone(),
      radius_m: cfg.places_radius_m,
      timeout:  per_request_timeout(
        Duration::from_secs(cfg.resolve_timeout_secs),
        cfg.resolve_retries,
        backoff,
      ),
      retries:  cfg.resolve_retries,
      backoff,
    }
  }
}

/// [`PlaceResolver`] backed by the nearby-search web service.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct PlacesClient {
  client: Client,
  config: PlacesConfig,
}

impl PlacesClient {
  pub fn new(config: PlacesConfig) -> Result<Self> {
    let client = Client::builder().timeout(config.timeout).build()?;
    Ok(Self { client, config })
  }

  /// `GET {endpoint}?location=<lat>,<lng>&radius=<m>&key=<key>`
  async fn fetch_once(&self, stay: &Stay) -> Result<Vec<CandidatePlace>> {
    let resp = self
      .client
      .get(&self.config.endpoint)
      .query(&[
        ("location", format!("{},{}", stay.latitude, stay.longitude)),
        ("radius", self.config.radius_m.to_string()),
        ("key", self.config.api_key.clone()),
      ])
      .send()
      .await?;

    if !resp.status().is_success() {
      return Err(Error::Status(resp.status()));
    }
    let body = resp.text().await?;
    parse_places(&body)
  }
}

impl PlaceResolver for PlacesClient {
  async fn resolve(&self, stay: Stay) -> Result<Vec<CandidatePlace>> {
    let mut attempt = 0;
    loop {
      match self.fetch_once(&stay).await {
        Ok(places) => {
          tracing::debug!(
            lat = stay.latitude,
            lng = stay.longitude,
            candidates = places.len(),
            "resolved stay"
          );
          return Ok(places);
        }
        Err(e) if e.is_retryable() && attempt < self.config.retries => {
          attempt += 1;
          tracing::debug!(attempt, error = %e, "places lookup failed; retrying");
          tokio::time::sleep(self.config.backoff * attempt).await;
        }
        Err(e) => return Err(e),
      }
    }
  }
}
