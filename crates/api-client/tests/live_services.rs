//! Checks against the public services; run with `--features integration`.

#![cfg(feature = "integration")]

use photopost_api_client::PhotopostClient;
use photopost_core::config::{GeocodingConfig, WeatherConfig};
use photopost_geo::Coordinate;

#[tokio::test]
async fn live_weather_lookup() {
    let client = PhotopostClient::new().unwrap();
    let snapshot = client
        .weather(&WeatherConfig::default())
        .lookup(Coordinate::new(52.3676, 4.9041))
        .await;
    assert!(snapshot.is_some());
}

#[tokio::test]
async fn live_place_search() {
    let client = PhotopostClient::new().unwrap();
    let candidates = client
        .geocoding(&GeocodingConfig::default())
        .search("Rijksmuseum Amsterdam")
        .await
        .unwrap();
    assert!(!candidates.is_empty());
}
