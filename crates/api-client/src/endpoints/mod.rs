//! Remote services used by an upload session

mod geocoding;
mod weather;
mod wordpress;

pub use geocoding::{GeocodingApi, PlaceCandidate};
pub use weather::{
    wmo_description, OpenMeteoSource, WeatherIcon, WeatherLookup, WeatherProvider, WeatherSnapshot,
    WeatherSource, WttrSource, UNNAMED_PLACE,
};
pub use wordpress::{normalize_site_url, Category, CurrentUser, WordPressApi};
