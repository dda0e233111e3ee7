//! Current weather conditions
//!
//! Two providers with different payloads and code spaces are normalised into
//! one [`WeatherSnapshot`]. [`WeatherLookup`] asks the primary source and,
//! on any failure, the fallback exactly once.

use crate::client::PhotopostClient;
use crate::error::{ApiError, ApiResult};
use async_trait::async_trait;
use photopost_geo::Coordinate;
use photopost_location::GeoFix;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Place name used when the provider does not resolve one
pub const UNNAMED_PLACE: &str = "Current location";

/// Icon classification shown next to a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeatherIcon {
    Sun,
    Cloud,
    Rain,
    Snow,
}

impl WeatherIcon {
    /// Icon for a primary-provider condition code.
    ///
    /// Codes 400-499 have no bucket of their own and fall through to `Sun`.
    pub fn from_primary_code(code: i32) -> Self {
        match code {
            200..400 | 500..600 => Self::Rain,
            600..700 => Self::Snow,
            700..800 => Self::Cloud,
            800 => Self::Sun,
            801.. => Self::Cloud,
            _ => Self::Sun,
        }
    }

    /// Icon for a WMO weather interpretation code
    pub fn from_wmo_code(code: i32) -> Self {
        match code {
            0 => Self::Sun,
            1..=3 => Self::Cloud,
            4..=67 => Self::Rain,
            68..=77 => Self::Snow,
            78..=82 => Self::Rain,
            _ => Self::Cloud,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sun => "sun",
            Self::Cloud => "cloud",
            Self::Rain => "rain",
            Self::Snow => "snow",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            Self::Sun => "☀️",
            Self::Cloud => "☁️",
            Self::Rain => "🌧️",
            Self::Snow => "❄️",
        }
    }
}

impl fmt::Display for WeatherIcon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provider that produced a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WeatherProvider {
    Wttr,
    OpenMeteo,
}

impl WeatherProvider {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Wttr => "wttr",
            Self::OpenMeteo => "open-meteo",
        }
    }
}

impl fmt::Display for WeatherProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current conditions at a coordinate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub temperature_c: i32,
    pub condition: String,
    pub humidity_percent: u32,
    pub wind_kmh: u32,
    pub visibility_km: Option<u32>,
    pub place: String,
    pub icon: WeatherIcon,
    /// Provider-specific condition code
    pub condition_code: i32,
    pub provider: WeatherProvider,
}

/// English description of a WMO weather interpretation code
pub fn wmo_description(code: i32) -> &'static str {
    match code {
        0 => "Clear sky",
        1 => "Mainly clear",
        2 => "Partly cloudy",
        3 => "Overcast",
        45 => "Fog",
        48 => "Depositing rime fog",
        51 => "Light drizzle",
        53 => "Moderate drizzle",
        55 => "Dense drizzle",
        61 => "Light rain",
        63 => "Moderate rain",
        65 => "Heavy rain",
        71 => "Light snow",
        73 => "Moderate snow",
        75 => "Heavy snow",
        80 => "Light showers",
        81 => "Moderate showers",
        82 => "Violent showers",
        _ => "Unknown weather",
    }
}

/// A single source of current conditions
#[async_trait]
pub trait WeatherSource: Send + Sync {
    fn provider(&self) -> WeatherProvider;

    async fn current(&self, coordinate: Coordinate) -> ApiResult<WeatherSnapshot>;
}

// -----------------------------------------------------------------------------
// wttr.in
// -----------------------------------------------------------------------------

/// wttr.in `?format=j1` source
#[derive(Debug, Clone)]
pub struct WttrSource {
    client: PhotopostClient,
    base_url: String,
}

impl WttrSource {
    pub fn new(client: PhotopostClient, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, coordinate: Coordinate) -> String {
        format!("{}/{},{}", self.base_url, coordinate.latitude, coordinate.longitude)
    }
}

#[async_trait]
impl WeatherSource for WttrSource {
    fn provider(&self) -> WeatherProvider {
        WeatherProvider::Wttr
    }

    #[instrument(skip(self), fields(provider = "wttr"))]
    async fn current(&self, coordinate: Coordinate) -> ApiResult<WeatherSnapshot> {
        let body: WttrResponse = self
            .client
            .get_json(&self.url(coordinate), &[("format", "j1".to_string())])
            .await?;
        wttr_snapshot(body)
    }
}

#[derive(Debug, Deserialize)]
struct WttrResponse {
    #[serde(default)]
    current_condition: Vec<WttrCondition>,
    #[serde(default)]
    nearest_area: Vec<WttrArea>,
}

#[derive(Debug, Deserialize)]
struct WttrCondition {
    #[serde(rename = "temp_C")]
    temp_c: String,
    #[serde(rename = "weatherDesc", default)]
    weather_desc: Vec<WttrValue>,
    humidity: String,
    #[serde(rename = "windspeedKmph")]
    windspeed_kmph: String,
    #[serde(default)]
    visibility: Option<String>,
    #[serde(rename = "weatherCode")]
    weather_code: String,
}

#[derive(Debug, Deserialize)]
struct WttrArea {
    #[serde(rename = "areaName", default)]
    area_name: Vec<WttrValue>,
}

#[derive(Debug, Deserialize)]
struct WttrValue {
    value: String,
}

fn parse_number<T: std::str::FromStr>(field: &str, raw: &str) -> ApiResult<T> {
    raw.trim()
        .parse()
        .map_err(|_| ApiError::malformed(format!("{field} is not a number: '{raw}'")))
}

fn wttr_snapshot(body: WttrResponse) -> ApiResult<WeatherSnapshot> {
    let current = body
        .current_condition
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::malformed("current_condition is empty"))?;

    let condition_code: i32 = parse_number("weatherCode", &current.weather_code)?;
    let condition = current
        .weather_desc
        .into_iter()
        .next()
        .map(|desc| desc.value)
        .ok_or_else(|| ApiError::malformed("weatherDesc is empty"))?;
    let visibility_km = match current.visibility.as_deref() {
        Some(raw) if !raw.trim().is_empty() => Some(parse_number("visibility", raw)?),
        _ => None,
    };
    let place = body
        .nearest_area
        .into_iter()
        .next()
        .and_then(|area| area.area_name.into_iter().next())
        .map(|name| name.value)
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| UNNAMED_PLACE.to_string());

    Ok(WeatherSnapshot {
        temperature_c: parse_number("temp_C", &current.temp_c)?,
        condition,
        humidity_percent: parse_number("humidity", &current.humidity)?,
        wind_kmh: parse_number("windspeedKmph", &current.windspeed_kmph)?,
        visibility_km,
        place,
        icon: WeatherIcon::from_primary_code(condition_code),
        condition_code,
        provider: WeatherProvider::Wttr,
    })
}

// -----------------------------------------------------------------------------
// Open-Meteo
// -----------------------------------------------------------------------------

const OPEN_METEO_FIELDS: &str = "temperature_2m,relative_humidity_2m,wind_speed_10m,weather_code";

/// Open-Meteo `/v1/forecast` source
#[derive(Debug, Clone)]
pub struct OpenMeteoSource {
    client: PhotopostClient,
    base_url: String,
}

impl OpenMeteoSource {
    pub fn new(client: PhotopostClient, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl WeatherSource for OpenMeteoSource {
    fn provider(&self) -> WeatherProvider {
        WeatherProvider::OpenMeteo
    }

    #[instrument(skip(self), fields(provider = "open-meteo"))]
    async fn current(&self, coordinate: Coordinate) -> ApiResult<WeatherSnapshot> {
        let url = format!("{}/v1/forecast", self.base_url);
        let query = [
            ("latitude", coordinate.latitude.to_string()),
            ("longitude", coordinate.longitude.to_string()),
            ("current", OPEN_METEO_FIELDS.to_string()),
            ("timezone", "auto".to_string()),
        ];
        let body: OpenMeteoResponse = self.client.get_json(&url, &query).await?;
        Ok(open_meteo_snapshot(body))
    }
}

#[derive(Debug, Deserialize)]
struct OpenMeteoResponse {
    current: OpenMeteoCurrent,
}

#[derive(Debug, Deserialize)]
struct OpenMeteoCurrent {
    temperature_2m: f64,
    relative_humidity_2m: f64,
    wind_speed_10m: f64,
    weather_code: i32,
}

fn non_negative(value: f64) -> u32 {
    value.round().max(0.0) as u32
}

fn open_meteo_snapshot(body: OpenMeteoResponse) -> WeatherSnapshot {
    let current = body.current;
    WeatherSnapshot {
        temperature_c: current.temperature_2m.round() as i32,
        condition: wmo_description(current.weather_code).to_string(),
        humidity_percent: non_negative(current.relative_humidity_2m),
        wind_kmh: non_negative(current.wind_speed_10m),
        visibility_km: None,
        place: UNNAMED_PLACE.to_string(),
        icon: WeatherIcon::from_wmo_code(current.weather_code),
        condition_code: current.weather_code,
        provider: WeatherProvider::OpenMeteo,
    }
}

// -----------------------------------------------------------------------------
// Lookup with fallback
// -----------------------------------------------------------------------------

/// Primary source with a single fallback
#[derive(Clone)]
pub struct WeatherLookup {
    primary: Arc<dyn WeatherSource>,
    fallback: Arc<dyn WeatherSource>,
}

impl WeatherLookup {
    pub fn new(primary: Arc<dyn WeatherSource>, fallback: Arc<dyn WeatherSource>) -> Self {
        Self { primary, fallback }
    }

    /// Current conditions for a resolved fix
    pub async fn lookup_fix(&self, fix: &GeoFix) -> Option<WeatherSnapshot> {
        self.lookup(fix.coordinate()).await
    }

    /// Current conditions, or `None` when both sources fail.
    ///
    /// Failures are logged and never surfaced: missing weather is not an
    /// error for the caller.
    pub async fn lookup(&self, coordinate: Coordinate) -> Option<WeatherSnapshot> {
        match self.primary.current(coordinate).await {
            Ok(snapshot) => {
                debug!(provider = %snapshot.provider, "Weather resolved");
                return Some(snapshot);
            }
            Err(e) => warn!(
                provider = %self.primary.provider(),
                error = %e,
                "Primary weather source failed, trying fallback"
            ),
        }

        match self.fallback.current(coordinate).await {
            Ok(snapshot) => {
                debug!(provider = %snapshot.provider, "Weather resolved by fallback");
                Some(snapshot)
            }
            Err(e) => {
                warn!(provider = %self.fallback.provider(), error = %e, "No weather available");
                None
            }
        }
    }
}

impl fmt::Debug for WeatherLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeatherLookup")
            .field("primary", &self.primary.provider())
            .field("fallback", &self.fallback.provider())
            .finish()
    }
}
