//! Shared fixtures for this crate's tests.

use axum::Router;
use chrono::{DateTime, SecondsFormat};
use tokio::net::TcpListener;

/// Serve `app` on an ephemeral local port and return its base URL.
pub async fn serve(app: Router) -> String {
  let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
  let address = listener.local_addr().unwrap();
  tokio::spawn(async move {
    axum::serve(listener, app).await.unwrap();
  });
  format!("http://{address}")
}

/// A KML document with one track holding `points` as `(lat, lng, ms)`.
pub fn kml(points: &[(f64, f64, i64)]) -> String {
  let mut whens = String::new();
  let mut coords = String::new();
  for &(lat, lng, ms) in points {
    let when = DateTime::from_timestamp_millis(ms)
      .unwrap()
      .to_rfc3339_opts(SecondsFormat::Millis, true);
    whens.push_str(&format!("<when>{when}</when>\n"));
    coords.push_str(&format!("<gx:coord>{lng} {lat} 0</gx:coord>\n"));
  }
  format!(
    r#"<?xml version="1.0" encoding="UTF-8"?>
<kml xmlns="http://www.opengis.net/kml/2.2" xmlns:gx="http://www.google.com/kml/ext/2.2">
<Document>
<Placemark>
<gx:Track>
{whens}{coords}</gx:Track>
</Placemark>
</Document>
</kml>"#
  )
}
