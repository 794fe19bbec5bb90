//! Candidate places returned by the nearby-places lookup for a stay.

use serde::{Deserialize, Serialize};

/// A places-service result associated with a stay.
///
/// Not yet confirmed as the place actually visited. Identical places returned
/// for different stays remain distinct values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidatePlace {
  pub name:              String,
  pub external_place_id: String,
  pub latitude:          f64,
  pub longitude:         f64,
  /// Address components, in the order the service listed them.
  pub address:           Vec<String>,
}

impl CandidatePlace {
  /// The address components joined back into one line.
  pub fn address_line(&self) -> String { self.address.join(", ") }
}
