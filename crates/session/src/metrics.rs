//! Metric names recorded by an upload session

pub const PREVIEW_MS: &str = "preview.ms";
pub const PREVIEW_FAILED: &str = "preview.failed";
pub const TRANSCODE_MS: &str = "transcode.ms";
pub const TRANSCODE_BYTES_SAVED: &str = "transcode.bytes_saved";
pub const LOCATION_UNRESOLVED: &str = "location.unresolved";
pub const WEATHER_UNAVAILABLE: &str = "weather.unavailable";
pub const PUBLISH_SUCCEEDED: &str = "publish.succeeded";
pub const PUBLISH_FAILED: &str = "publish.failed";

/// `transcode.decision.<label>`
pub fn transcode_decision(label: &str) -> String {
    format!("transcode.decision.{label}")
}

/// `location.source.<source>`
pub fn location_source(source: impl std::fmt::Display) -> String {
    format!("location.source.{source}")
}

/// `weather.provider.<provider>`
pub fn weather_provider(provider: impl std::fmt::Display) -> String {
    format!("weather.provider.{provider}")
}
