//! HTTP clients for the services around an upload
//!
//! One [`PhotopostClient`] is shared by:
//!
//! - **Weather**: wttr.in with a single Open-Meteo fallback
//! - **Geocoding**: Nominatim-compatible place search for manual location picks
//! - **Publishing**: WordPress media upload and post creation behind the
//!   [`Publisher`] trait
//!
//! Every request carries an `X-Request-ID` for correlation. Nothing is
//! retried.
//!
//! # Example
//!
//! ```rust,no_run
//! use photopost_api_client::PhotopostClient;
//! use photopost_core::config::WeatherConfig;
//! use photopost_geo::Coordinate;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = PhotopostClient::new()?;
//!
//!     let weather = client.weather(&WeatherConfig::default());
//!     if let Some(snapshot) = weather.lookup(Coordinate::new(52.09, 5.12)).await {
//!         println!("{}°C, {}", snapshot.temperature_c, snapshot.condition);
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod publish;

pub use client::PhotopostClient;
pub use config::ClientConfig;
pub use error::{ApiError, ApiResult, PublishStep};
pub use publish::{PublishRequest, PublishedPost, Publisher, Rating};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::client::PhotopostClient;
    pub use crate::config::ClientConfig;
    pub use crate::endpoints::{
        GeocodingApi, PlaceCandidate, WeatherIcon, WeatherLookup, WeatherProvider, WeatherSnapshot,
        WordPressApi,
    };
    pub use crate::error::{ApiError, ApiResult};
    pub use crate::publish::{PublishRequest, PublishedPost, Publisher, Rating};
}
