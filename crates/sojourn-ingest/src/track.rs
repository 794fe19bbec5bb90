//! Track source: downloading one day's location-history export.

use std::{future::Future, time::Duration};

use reqwest::{Client, header};

use crate::{Error, IngestConfig, Result};

/// Fetches the raw track document for one day.
pub trait TrackSource: Send + Sync {
  /// Download the export selected by `date_param` (see
  /// [`date_param`](crate::date::date_param)) using the session `cookie`.
  fn fetch<'a>(
    &'a self,
    date_param: &'a str,
    cookie: &'a str,
  ) -> impl Future<Output = Result<Vec<u8>>> + Send + 'a;
}

pub const DEFAULT_TRACK_ENDPOINT: &str = "https://www.google.com/maps/timeline/kml";

/// [`TrackSource`] that downloads the KML export over HTTPS.
#[derive(Clone)]
pub struct HttpTrackSource {
  client:   Client,
  endpoint: String,
}

impl HttpTrackSource {
  pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
    let client = Client::builder().timeout(timeout).build()?;
    Ok(Self {
      client,
      endpoint: endpoint.into(),
    })
  }

  pub fn from_config(cfg: &IngestConfig) -> Result<Self> {
    Self::new(
      cfg.track_endpoint.clone(),
      Duration::from_secs(cfg.request_timeout_secs),
    )
  }
}

impl TrackSource for HttpTrackSource {
  /// `GET {endpoint}?authuser=0&pb=<date_param>` with the session cookie.
  async fn fetch<'a>(&'a self, date_param: &'a str, cookie: &'a str) -> Result<Vec<u8>> {
    let resp = self
      .client
      .get(&self.endpoint)
      .query(&[("authuser", "0"), ("pb", date_param)])
      .header(header::COOKIE, cookie)
      .send()
      .await?;

    if !resp.status().is_success() {
      return Err(Error::Status(resp.status()));
    }
    let body = resp.bytes().await?;
    tracing::debug!(bytes = body.len(), "downloaded track");
    Ok(body.to_vec())
  }
}
