//! Configuration schema definitions
//!
//! Every section has defaults matching the reference pipeline policy, so an
//! empty file (or no file at all) yields a working configuration.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const KB: usize = 1024;
const MB: usize = 1024 * KB;

/// Root configuration schema
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConfigSchema {
    #[serde(default)]
    pub location: LocationConfig,

    #[serde(default)]
    pub transcode: TranscodeConfig,

    #[serde(default)]
    pub preview: PreviewConfig,

    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub weather: WeatherConfig,

    #[serde(default)]
    pub geocoding: GeocodingConfig,

    #[serde(default)]
    pub publish: PublishConfig,
}

impl ConfigSchema {
    /// Validate every section
    pub fn validate(&self) -> Result<()> {
        self.location.validate()?;
        self.transcode.validate()?;
        self.preview.validate()?;
        self.http.validate()?;
        self.weather.validate()?;
        self.geocoding.validate()?;
        self.publish.validate()?;
        Ok(())
    }
}

/// Durations are stored as whole seconds in configuration files.
pub mod duration_secs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

fn require_nonzero(name: &str, duration: Duration) -> Result<()> {
    if duration.is_zero() {
        return Err(Error::config_invalid(format!("{name} cannot be zero")));
    }
    Ok(())
}

fn require_http_url(name: &str, url: &str) -> Result<()> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(Error::config_invalid(format!(
            "{name} must start with http:// or https:// (got '{url}')"
        )));
    }
    Ok(())
}

/// Location acquisition policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationConfig {
    /// Hard bound on reading GPS tags from the photo
    #[serde(with = "duration_secs", default = "default_metadata_timeout")]
    pub metadata_timeout: Duration,

    /// Hard bound on the device position request
    #[serde(with = "duration_secs", default = "default_device_timeout")]
    pub device_timeout: Duration,

    /// Oldest cached device fix that is still accepted
    #[serde(with = "duration_secs", default = "default_device_max_age")]
    pub device_max_age: Duration,

    /// Ask the positioning sensor for its high-accuracy mode
    #[serde(default = "default_true")]
    pub high_accuracy: bool,

    /// Advisory delay after which extraction is flagged as slow
    #[serde(with = "duration_secs", default = "default_slow_warning")]
    pub slow_warning: Duration,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            metadata_timeout: default_metadata_timeout(),
            device_timeout: default_device_timeout(),
            device_max_age: default_device_max_age(),
            high_accuracy: true,
            slow_warning: default_slow_warning(),
        }
    }
}

impl LocationConfig {
    pub fn validate(&self) -> Result<()> {
        require_nonzero("location.metadata_timeout", self.metadata_timeout)?;
        require_nonzero("location.device_timeout", self.device_timeout)?;
        Ok(())
    }
}

fn default_metadata_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_device_timeout() -> Duration {
    Duration::from_secs(8)
}

fn default_device_max_age() -> Duration {
    Duration::from_secs(30)
}

fn default_slow_warning() -> Duration {
    Duration::from_secs(3)
}

fn default_true() -> bool {
    true
}

/// Transcoding policy applied before upload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscodeConfig {
    /// Inputs above this size are rejected outright
    #[serde(default = "default_max_input_bytes")]
    pub max_input_bytes: usize,

    /// Inputs below this size are uploaded unchanged
    #[serde(default = "default_passthrough_below_bytes")]
    pub passthrough_below_bytes: usize,

    /// Maximum output width in pixels
    #[serde(default = "default_max_width")]
    pub max_width: u32,

    /// Maximum output height in pixels
    #[serde(default = "default_max_height")]
    pub max_height: u32,

    /// Encoder quality factor in (0, 1]
    #[serde(default = "default_quality")]
    pub quality: f32,

    /// Bound on decode + resample + encode
    #[serde(with = "duration_secs", default = "default_transcode_timeout")]
    pub timeout: Duration,
}

impl Default for TranscodeConfig {
    fn default() -> Self {
        Self {
            max_input_bytes: default_max_input_bytes(),
            passthrough_below_bytes: default_passthrough_below_bytes(),
            max_width: default_max_width(),
            max_height: default_max_height(),
            quality: default_quality(),
            timeout: default_transcode_timeout(),
        }
    }
}

impl TranscodeConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_width == 0 || self.max_height == 0 {
            return Err(Error::config_invalid("transcode.max_width and max_height must be positive"));
        }
        if !(self.quality > 0.0 && self.quality <= 1.0) {
            return Err(Error::config_invalid(format!(
                "transcode.quality must be in (0, 1], got {}",
                self.quality
            )));
        }
        if self.passthrough_below_bytes > self.max_input_bytes {
            return Err(Error::config_invalid(
                "transcode.passthrough_below_bytes cannot exceed max_input_bytes",
            ));
        }
        require_nonzero("transcode.timeout", self.timeout)
    }
}

fn default_max_input_bytes() -> usize {
    50 * MB
}

fn default_passthrough_below_bytes() -> usize {
    500 * KB
}

fn default_max_width() -> u32 {
    1920
}

fn default_max_height() -> u32 {
    1080
}

fn default_quality() -> f32 {
    0.8
}

fn default_transcode_timeout() -> Duration {
    Duration::from_secs(10)
}

/// Preview generation policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewConfig {
    /// Longest edge of the preview in pixels
    #[serde(default = "default_preview_edge")]
    pub max_edge: u32,

    /// Encoder quality factor in (0, 1]
    #[serde(default = "default_quality")]
    pub quality: f32,

    #[serde(with = "duration_secs", default = "default_preview_timeout")]
    pub timeout: Duration,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            max_edge: default_preview_edge(),
            quality: default_quality(),
            timeout: default_preview_timeout(),
        }
    }
}

impl PreviewConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_edge == 0 {
            return Err(Error::config_invalid("preview.max_edge must be positive"));
        }
        if !(self.quality > 0.0 && self.quality <= 1.0) {
            return Err(Error::config_invalid("preview.quality must be in (0, 1]"));
        }
        require_nonzero("preview.timeout", self.timeout)
    }
}

fn default_preview_edge() -> u32 {
    400
}

fn default_preview_timeout() -> Duration {
    Duration::from_secs(5)
}

/// Shared HTTP client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout
    #[serde(with = "duration_secs", default = "default_http_timeout")]
    pub timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout: default_http_timeout(),
        }
    }
}

impl HttpConfig {
    pub fn validate(&self) -> Result<()> {
        if self.user_agent.trim().is_empty() {
            return Err(Error::config_invalid("http.user_agent cannot be empty"));
        }
        require_nonzero("http.timeout", self.timeout)
    }
}

fn default_user_agent() -> String {
    format!("photopost/{}", env!("CARGO_PKG_VERSION"))
}

fn default_http_timeout() -> Duration {
    Duration::from_secs(15)
}

/// Weather providers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Primary provider (wttr.in compatible, `?format=j1`)
    #[serde(default = "default_weather_primary")]
    pub primary_url: String,

    /// Fallback provider (Open-Meteo compatible)
    #[serde(default = "default_weather_fallback")]
    pub fallback_url: String,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            primary_url: default_weather_primary(),
            fallback_url: default_weather_fallback(),
        }
    }
}

impl WeatherConfig {
    pub fn validate(&self) -> Result<()> {
        require_http_url("weather.primary_url", &self.primary_url)?;
        require_http_url("weather.fallback_url", &self.fallback_url)
    }
}

fn default_weather_primary() -> String {
    "https://wttr.in".to_string()
}

fn default_weather_fallback() -> String {
    "https://api.open-meteo.com".to_string()
}

/// Geocoding service used for manual location search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodingConfig {
    #[serde(default = "default_geocoding_url")]
    pub base_url: String,

    /// Maximum number of candidates returned
    #[serde(default = "default_geocoding_limit")]
    pub limit: usize,

    /// Optional comma-separated ISO country filter (e.g. "nl,be")
    #[serde(default)]
    pub country_codes: Option<String>,
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            base_url: default_geocoding_url(),
            limit: default_geocoding_limit(),
            country_codes: None,
        }
    }
}

impl GeocodingConfig {
    pub fn validate(&self) -> Result<()> {
        require_http_url("geocoding.base_url", &self.base_url)?;
        if self.limit == 0 {
            return Err(Error::config_invalid("geocoding.limit must be positive"));
        }
        Ok(())
    }
}

fn default_geocoding_url() -> String {
    "https://nominatim.openstreetmap.org".to_string()
}

fn default_geocoding_limit() -> usize {
    5
}

/// Publish target (WordPress REST API)
///
/// The password is never read from or written to the configuration file; the
/// caller supplies it explicitly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishConfig {
    #[serde(default)]
    pub site_url: String,

    #[serde(default)]
    pub username: String,

    #[serde(skip)]
    pub application_password: Option<String>,

    /// Rewrite http:// site URLs to https://
    #[serde(default = "default_true")]
    pub force_https: bool,

    /// Media uploads can be slow on mobile links
    #[serde(with = "duration_secs", default = "default_publish_timeout")]
    pub timeout: Duration,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            site_url: String::new(),
            username: String::new(),
            application_password: None,
            force_https: true,
            timeout: default_publish_timeout(),
        }
    }
}

impl PublishConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.site_url.is_empty() {
            require_http_url("publish.site_url", &self.site_url)?;
        }
        require_nonzero("publish.timeout", self.timeout)
    }

    /// Whether enough is configured to talk to the backend
    pub fn is_complete(&self) -> bool {
        !self.site_url.is_empty()
            && !self.username.is_empty()
            && self.application_password.as_deref().is_some_and(|p| !p.is_empty())
    }

    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.application_password = Some(password.into());
        self
    }
}

fn default_publish_timeout() -> Duration {
    Duration::from_secs(60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_policy() {
        let schema = ConfigSchema::default();
        assert_eq!(schema.location.metadata_timeout, Duration::from_secs(5));
        assert_eq!(schema.location.device_timeout, Duration::from_secs(8));
        assert_eq!(schema.location.device_max_age, Duration::from_secs(30));
        assert_eq!(schema.location.slow_warning, Duration::from_secs(3));
        assert_eq!(schema.transcode.max_input_bytes, 50 * MB);
        assert_eq!(schema.transcode.passthrough_below_bytes, 500 * KB);
        assert_eq!((schema.transcode.max_width, schema.transcode.max_height), (1920, 1080));
        assert_eq!(schema.preview.max_edge, 400);
        assert_eq!(schema.geocoding.limit, 5);
        assert!(schema.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let schema: ConfigSchema = toml::from_str(
            r#"
            [transcode]
            quality = 0.6
            timeout = 4

            [publish]
            site_url = "https://blog.example.org"
            username = "editor"
            "#,
        )
        .unwrap();

        assert!((schema.transcode.quality - 0.6).abs() < f32::EPSILON);
        assert_eq!(schema.transcode.timeout, Duration::from_secs(4));
        assert_eq!(schema.transcode.max_width, 1920);
        assert_eq!(schema.publish.username, "editor");
        assert!(schema.publish.application_password.is_none());
        assert!(schema.publish.force_https);
    }

    #[test]
    fn test_password_is_never_deserialized() {
        let schema: ConfigSchema = toml::from_str(
            r#"
            [publish]
            site_url = "https://blog.example.org"
            username = "editor"
            application_password = "secret"
            "#,
        )
        .unwrap();
        assert!(schema.publish.application_password.is_none());
        assert!(!schema.publish.is_complete());
        assert!(schema.publish.clone().with_password("secret").is_complete());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut schema = ConfigSchema::default();
        schema.transcode.quality = 1.5;
        assert!(schema.validate().is_err());

        let mut schema = ConfigSchema::default();
        schema.weather.primary_url = "wttr.in".to_string();
        assert!(schema.validate().is_err());

        let mut schema = ConfigSchema::default();
        schema.location.metadata_timeout = Duration::ZERO;
        assert!(schema.validate().is_err());
    }
}
