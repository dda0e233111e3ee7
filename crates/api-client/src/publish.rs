//! Publish record and the collaborator seam that sends it

use crate::endpoints::WeatherSnapshot;
use crate::error::{ApiError, ApiResult};
use async_trait::async_trait;
use photopost_location::{GeoFix, Source};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write as _};
use std::sync::Arc;

/// Star rating between 1 and 5
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(stars: u8) -> Result<Self, photopost_core::Error> {
        if (Self::MIN..=Self::MAX).contains(&stars) {
            Ok(Self(stars))
        } else {
            Err(photopost_core::Error::invalid_rating(stars))
        }
    }

    pub fn stars(self) -> u8 {
        self.0
    }

    pub fn label(self) -> &'static str {
        match self.0 {
            1 => "Poor",
            2 => "Fair",
            3 => "Good",
            4 => "Very good",
            _ => "Excellent",
        }
    }
}

impl TryFrom<u8> for Rating {
    type Error = photopost_core::Error;

    fn try_from(stars: u8) -> Result<Self, Self::Error> {
        Self::new(stars)
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/5", self.0)
    }
}

/// Everything the publish collaborator needs to create one post
#[derive(Clone)]
pub struct PublishRequest {
    pub bytes: Arc<[u8]>,
    pub media_type: String,
    pub file_name: String,
    pub title: String,
    pub body: String,
    pub categories: Vec<u64>,
    pub rating: Option<Rating>,
    pub location: Option<GeoFix>,
    pub weather: Option<WeatherSnapshot>,
}

impl PublishRequest {
    /// Reject requests the backend would refuse anyway
    pub fn validate(&self) -> ApiResult<()> {
        if self.title.trim().is_empty() {
            return Err(ApiError::Validation("a title is required".into()));
        }
        if self.bytes.is_empty() {
            return Err(ApiError::Validation("the photo is empty".into()));
        }
        Ok(())
    }

    /// HTML body of the post: the text followed by rating, location and
    /// weather blocks for whichever are present.
    pub fn render_content(&self) -> String {
        let mut html = format!("<p>{}</p>", escape_html(&self.body));
        if let Some(rating) = self.rating {
            render_rating(&mut html, rating);
        }
        if let Some(fix) = &self.location {
            render_location(&mut html, fix);
        }
        if let Some(weather) = &self.weather {
            render_weather(&mut html, weather);
        }
        html
    }
}

impl fmt::Debug for PublishRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublishRequest")
            .field("bytes", &self.bytes.len())
            .field("media_type", &self.media_type)
            .field("file_name", &self.file_name)
            .field("title", &self.title)
            .field("categories", &self.categories)
            .field("rating", &self.rating)
            .field("location", &self.location)
            .field("weather", &self.weather)
            .finish_non_exhaustive()
    }
}

/// Identifiers of a created post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedPost {
    pub post_id: u64,
    pub post_url: String,
    pub media_id: u64,
    pub media_url: String,
}

/// Backend that turns a [`PublishRequest`] into a post
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, request: &PublishRequest) -> ApiResult<PublishedPost>;
}

/// Escape text for inclusion in HTML element content or attribute values
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn render_rating(html: &mut String, rating: Rating) {
    let stars = "⭐".repeat(usize::from(rating.stars()));
    let _ = write!(
        html,
        "<div class=\"rating-info\"><h4>⭐ Rating</h4><p>{stars}</p>\
         <p><strong>{} stars</strong> - {}</p></div>",
        rating,
        rating.label()
    );
}

fn hemisphere(value: f64, positive: char, negative: char) -> char {
    if value < 0.0 { negative } else { positive }
}

fn render_location(html: &mut String, fix: &GeoFix) {
    let (icon, accuracy) = match fix.source() {
        Source::Metadata => ("📸", "GPS data from the photo (very accurate)".to_string()),
        Source::Manual => ("🗺️", "Manually chosen location (accurate)".to_string()),
        Source::Device => (
            "📱",
            match fix.accuracy().radius_m {
                Some(radius) => format!("Device GPS (±{}m)", radius.round()),
                None => "Device GPS".to_string(),
            },
        ),
    };

    let _ = write!(
        html,
        "<div class=\"location-info\"><h4>{icon} Location</h4>\
         <p><strong>Coordinates:</strong> {:.6}°{}, {:.6}°{}</p>\
         <p><strong>Accuracy:</strong> {accuracy}</p>",
        fix.latitude().abs(),
        hemisphere(fix.latitude(), 'N', 'S'),
        fix.longitude().abs(),
        hemisphere(fix.longitude(), 'E', 'W'),
    );
    if let Some(altitude) = fix.altitude() {
        let _ = write!(html, "<p><strong>Altitude:</strong> {}m</p>", altitude.round());
    }
    if let Some(name) = fix.display_name() {
        let _ = write!(html, "<p><strong>Place:</strong> {}</p>", escape_html(name));
    }
    let _ = write!(
        html,
        "<p><a href=\"{}\" target=\"_blank\" rel=\"noopener\">🗺️ View on map →</a></p></div>",
        escape_html(&fix.map_url())
    );
}

fn render_weather(html: &mut String, weather: &WeatherSnapshot) {
    let _ = write!(
        html,
        "<div class=\"weather-info\"><h4>{} Weather at the time</h4>\
         <p><strong>Temperature:</strong> {}°C</p>\
         <p><strong>Conditions:</strong> {}</p>\
         <p><strong>Humidity:</strong> {}%</p>\
         <p><strong>Wind:</strong> {} km/h</p>",
        weather.icon.emoji(),
        weather.temperature_c,
        escape_html(&weather.condition),
        weather.humidity_percent,
        weather.wind_kmh,
    );
    if let Some(visibility) = weather.visibility_km {
        let _ = write!(html, "<p><strong>Visibility:</strong> {visibility} km</p>");
    }
    let _ = write!(html, "<p><strong>Place:</strong> {}</p></div>", escape_html(&weather.place));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoints::{WeatherIcon, WeatherProvider};
    use photopost_core::ErrorCode;
    use photopost_location::Accuracy;

    fn request() -> PublishRequest {
        PublishRequest {
            bytes: Arc::from(&b"jpeg"[..]),
            media_type: "image/jpeg".into(),
            file_name: "walk.jpg".into(),
            title: "Morning walk".into(),
            body: "Fog over the <river> & fields".into(),
            categories: vec![],
            rating: None,
            location: None,
            weather: None,
        }
    }

    #[test]
    fn test_rating_bounds() {
        assert!(Rating::new(1).is_ok());
        assert!(Rating::new(5).is_ok());
        assert_eq!(Rating::new(0).unwrap_err().code, ErrorCode::InvalidRating);
        assert_eq!(Rating::new(6).unwrap_err().code, ErrorCode::InvalidRating);
        assert_eq!(Rating::new(4).unwrap().label(), "Very good");
    }

    #[test]
    fn test_rating_deserialization_is_validated() {
        assert!(serde_json::from_str::<Rating>("3").is_ok());
        assert!(serde_json::from_str::<Rating>("9").is_err());
    }

    #[test]
    fn test_validate_requires_title() {
        let mut req = request();
        req.title = "  ".into();
        assert!(matches!(req.validate(), Err(ApiError::Validation(_))));
        assert!(request().validate().is_ok());
    }

    #[test]
    fn test_body_is_escaped() {
        let html = request().render_content();
        assert_eq!(html, "<p>Fog over the &lt;river&gt; &amp; fields</p>");
    }

    #[test]
    fn test_content_blocks() {
        let mut req = request();
        req.rating = Some(Rating::new(3).unwrap());
        req.location = Some(
            GeoFix::new(-33.8688, 151.2093, Source::Device, Accuracy::from_radius(42.4))
                .unwrap()
                .with_altitude(Some(12.6)),
        );
        req.weather = Some(WeatherSnapshot {
            temperature_c: 21,
            condition: "Sunny".into(),
            humidity_percent: 40,
            wind_kmh: 9,
            visibility_km: Some(10),
            place: "Sydney".into(),
            icon: WeatherIcon::Sun,
            condition_code: 113,
            provider: WeatherProvider::Wttr,
        });

        let html = req.render_content();
        assert!(html.contains("⭐⭐⭐</p>"));
        assert!(html.contains("3/5 stars</strong> - Good"));
        assert!(html.contains("33.868800°S, 151.209300°E"));
        assert!(html.contains("Device GPS (±42m)"));
        assert!(html.contains("Altitude:</strong> 13m"));
        assert!(html.contains("https://maps.google.com/?q=-33.8688,151.2093"));
        assert!(html.contains("☀️ Weather at the time"));
        assert!(html.contains("Visibility:</strong> 10 km"));
        assert!(html.contains("Place:</strong> Sydney"));
    }

    #[test]
    fn test_manual_location_block() {
        let mut req = request();
        req.location = Some(GeoFix::manual(52.37, 4.89).unwrap().with_display_name("Dam <square>"));
        let html = req.render_content();
        assert!(html.contains("🗺️ Location"));
        assert!(html.contains("Manually chosen location"));
        assert!(html.contains("Dam &lt;square&gt;"));
    }
}
