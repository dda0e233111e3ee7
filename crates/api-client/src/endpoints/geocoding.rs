//! Free-text place search (Nominatim-compatible)

use crate::client::PhotopostClient;
use crate::error::ApiResult;
use photopost_core::config::GeocodingConfig;
use photopost_geo::Coordinate;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// A place matching a search query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceCandidate {
    pub coordinate: Coordinate,
    pub display_name: String,
}

/// Geocoding API
#[derive(Debug, Clone)]
pub struct GeocodingApi {
    client: PhotopostClient,
    config: GeocodingConfig,
}

impl GeocodingApi {
    pub fn new(client: PhotopostClient, config: GeocodingConfig) -> Self {
        Self { client, config }
    }

    /// Search for places matching `query`.
    ///
    /// Blank queries return nothing without touching the network. Results
    /// whose coordinates do not parse or are out of range are skipped.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> ApiResult<Vec<PlaceCandidate>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/search", self.config.base_url.trim_end_matches('/'));
        let mut params = vec![
            ("format", "json".to_string()),
            ("q", query.to_string()),
            ("limit", self.config.limit.to_string()),
            ("addressdetails", "1".to_string()),
        ];
        if let Some(codes) = &self.config.country_codes {
            params.push(("countrycodes", codes.clone()));
        }

        let places: Vec<NominatimPlace> = self.client.get_json(&url, &params).await?;
        let candidates = to_candidates(places, self.config.limit);
        debug!(count = candidates.len(), "Geocoding candidates");
        Ok(candidates)
    }
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    #[serde(default)]
    display_name: String,
}

impl NominatimPlace {
    fn into_candidate(self) -> Option<PlaceCandidate> {
        let latitude = self.lat.trim().parse().ok()?;
        let longitude = self.lon.trim().parse().ok()?;
        let coordinate = Coordinate::try_new(latitude, longitude).ok()?;
        Some(PlaceCandidate {
            coordinate,
            display_name: self.display_name,
        })
    }
}

fn to_candidates(places: Vec<NominatimPlace>, limit: usize) -> Vec<PlaceCandidate> {
    places
        .into_iter()
        .filter_map(NominatimPlace::into_candidate)
        .take(limit)
        .collect()
}
