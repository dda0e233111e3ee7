//! Shared HTTP client

use crate::config::ClientConfig;
use crate::endpoints::{GeocodingApi, OpenMeteoSource, WeatherLookup, WordPressApi, WttrSource};
use crate::error::{ApiError, ApiResult};
use photopost_core::config::{GeocodingConfig, PublishConfig, WeatherConfig};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, instrument, Span};
use uuid::Uuid;

/// Request correlation ID header
const X_REQUEST_ID: &str = "X-Request-ID";

/// Thin wrapper over `reqwest` shared by every endpoint.
///
/// Adds a user agent, a default timeout and an `X-Request-ID` per request.
/// Nothing is retried: callers decide on fallbacks.
#[derive(Clone)]
pub struct PhotopostClient {
    inner: Client,
    config: Arc<ClientConfig>,
}

impl PhotopostClient {
    /// Create a client with defaults plus environment overrides
    pub fn new() -> ApiResult<Self> {
        Self::with_config(ClientConfig::default().with_env_overrides())
    }

    /// Create a new client with specific configuration
    pub fn with_config(config: ClientConfig) -> ApiResult<Self> {
        config.validate()?;

        let mut default_headers = HeaderMap::new();
        default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        default_headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|_| ApiError::config(format!("invalid user agent '{}'", config.user_agent)))?,
        );

        let inner = Client::builder()
            .timeout(config.timeout)
            .default_headers(default_headers)
            .build()
            .map_err(ApiError::Request)?;

        Ok(Self {
            inner,
            config: Arc::new(config),
        })
    }

    /// Get the current configuration
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    // -------------------------------------------------------------------------
    // Endpoint API accessors
    // -------------------------------------------------------------------------

    /// Weather lookup with wttr.in as primary and Open-Meteo as fallback
    #[must_use]
    pub fn weather(&self, config: &WeatherConfig) -> WeatherLookup {
        WeatherLookup::new(
            Arc::new(WttrSource::new(self.clone(), &config.primary_url)),
            Arc::new(OpenMeteoSource::new(self.clone(), &config.fallback_url)),
        )
    }

    /// Free-text place search
    #[must_use]
    pub fn geocoding(&self, config: &GeocodingConfig) -> GeocodingApi {
        GeocodingApi::new(self.clone(), config.clone())
    }

    /// WordPress REST API for the configured site
    pub fn wordpress(&self, config: &PublishConfig) -> ApiResult<WordPressApi> {
        WordPressApi::new(self.clone(), config)
    }

    // -------------------------------------------------------------------------
    // Low-level HTTP methods
    // -------------------------------------------------------------------------

    /// Build a request against an absolute URL
    pub fn request_builder(&self, method: Method, url: &str) -> RequestBuilder {
        self.inner.request(method, url)
    }

    /// GET an absolute URL and decode the JSON body
    #[instrument(skip(self, query), fields(request_id))]
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, String)]) -> ApiResult<T> {
        let request = self.request_builder(Method::GET, url).query(query);
        self.send_json(request).await
    }

    /// Send a prepared request and decode the JSON body
    pub async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> ApiResult<T> {
        let response = self.execute(request).await?;
        handle_response(response).await
    }

    /// Send a prepared request with a fresh correlation ID
    pub async fn execute(&self, request: RequestBuilder) -> ApiResult<Response> {
        let request_id = Uuid::new_v4().to_string();
        Span::current().record("request_id", request_id.as_str());

        let start = Instant::now();
        let response = request.header(X_REQUEST_ID, &request_id).send().await?;

        debug!(
            request_id = %request_id,
            url = %response.url(),
            status = response.status().as_u16(),
            elapsed_ms = start.elapsed().as_millis(),
            "Request completed"
        );
        Ok(response)
    }
}

/// Map non-success statuses to [`ApiError::ApiResponse`] and decode the rest
pub(crate) async fn handle_response<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
    let status = response.status();

    if status.is_success() {
        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(ApiError::Json)
    } else {
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(ApiError::api_response(status.as_u16(), message))
    }
}

impl std::fmt::Debug for PhotopostClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhotopostClient").field("config", &self.config).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_client_creation() {
        let client = PhotopostClient::with_config(ClientConfig::default());
        assert!(client.is_ok());
    }

    #[test]
    fn test_client_rejects_bad_user_agent() {
        let config = ClientConfig::default().with_user_agent("bad\nagent");
        assert!(matches!(PhotopostClient::with_config(config), Err(ApiError::Config(_))));
    }

    #[test]
    fn test_client_keeps_config() {
        let config = ClientConfig::default().with_timeout(Duration::from_secs(4));
        let client = PhotopostClient::with_config(config).unwrap();
        assert_eq!(client.config().timeout, Duration::from_secs(4));
    }
}
