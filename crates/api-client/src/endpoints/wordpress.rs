//! WordPress REST API publisher

use crate::client::{handle_response, PhotopostClient};
use crate::error::{ApiError, ApiResult, PublishStep};
use crate::publish::{PublishRequest, PublishedPost, Publisher};
use async_trait::async_trait;
use photopost_core::config::PublishConfig;
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{info, instrument};

const API_PREFIX: &str = "/wp-json/wp/v2";

/// Trim trailing slashes and, when asked, upgrade `http://` to `https://`.
pub fn normalize_site_url(site_url: &str, force_https: bool) -> ApiResult<String> {
    let trimmed = site_url.trim().trim_end_matches('/');
    if let Some(rest) = trimmed.strip_prefix("http://") {
        if rest.is_empty() {
            return Err(ApiError::InvalidUrl(site_url.to_string()));
        }
        return Ok(if force_https {
            format!("https://{rest}")
        } else {
            trimmed.to_string()
        });
    }
    match trimmed.strip_prefix("https://") {
        Some(rest) if !rest.is_empty() => Ok(trimmed.to_string()),
        _ => Err(ApiError::InvalidUrl(site_url.to_string())),
    }
}

/// Post category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub count: u64,
}

/// Account the credentials belong to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct MediaResponse {
    id: u64,
    #[serde(default)]
    source_url: String,
}

#[derive(Debug, Deserialize)]
struct PostResponse {
    id: u64,
    #[serde(default)]
    link: String,
}

#[derive(Debug, Serialize)]
struct NewPost<'a> {
    title: &'a str,
    content: String,
    status: &'static str,
    featured_media: u64,
    #[serde(skip_serializing_if = "no_categories")]
    categories: &'a [u64],
}

fn no_categories(categories: &&[u64]) -> bool {
    categories.is_empty()
}

/// Authenticated access to one WordPress site
#[derive(Clone)]
pub struct WordPressApi {
    client: PhotopostClient,
    site_url: String,
    username: String,
    password: String,
    timeout: Duration,
}

impl WordPressApi {
    /// Requires site URL, username and application password.
    pub fn new(client: PhotopostClient, config: &PublishConfig) -> ApiResult<Self> {
        if !config.is_complete() {
            return Err(ApiError::config(
                "publishing needs a site URL, a username and an application password",
            ));
        }
        Ok(Self {
            client,
            site_url: normalize_site_url(&config.site_url, config.force_https)?,
            username: config.username.clone(),
            password: config.application_password.clone().unwrap_or_default(),
            timeout: config.timeout,
        })
    }

    /// Site base URL after normalisation
    pub fn site_url(&self) -> &str {
        &self.site_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{API_PREFIX}/{path}", self.site_url)
    }

    fn authed(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request_builder(method, &self.endpoint(path))
            .basic_auth(&self.username, Some(&self.password))
            .timeout(self.timeout)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> ApiResult<T> {
        let response = self.client.execute(request).await?;
        handle_response(response).await
    }

    /// List post categories; doubles as a connection check
    #[instrument(skip(self), fields(site = %self.site_url))]
    pub async fn categories(&self) -> ApiResult<Vec<Category>> {
        self.send(self.authed(Method::GET, "categories").query(&[("per_page", "100")]))
            .await
    }

    /// Verify the credentials
    #[instrument(skip(self), fields(site = %self.site_url))]
    pub async fn current_user(&self) -> ApiResult<CurrentUser> {
        self.send(self.authed(Method::GET, "users/me").query(&[("context", "edit")]))
            .await
    }

    #[instrument(skip(self, request), fields(site = %self.site_url, bytes = request.bytes.len()))]
    async fn upload_media(&self, request: &PublishRequest) -> ApiResult<MediaResponse> {
        let disposition = format!("attachment; filename=\"{}\"", header_file_name(&request.file_name));
        let upload = self
            .authed(Method::POST, "media")
            .header(CONTENT_TYPE, request.media_type.as_str())
            .header(CONTENT_DISPOSITION, disposition)
            .body(request.bytes.to_vec());
        self.send(upload).await
    }

    #[instrument(skip(self, request), fields(site = %self.site_url))]
    async fn create_post(&self, request: &PublishRequest, media_id: u64) -> ApiResult<PostResponse> {
        let post = NewPost {
            title: &request.title,
            content: request.render_content(),
            status: "publish",
            featured_media: media_id,
            categories: &request.categories,
        };
        self.send(self.authed(Method::POST, "posts").json(&post)).await
    }
}

#[async_trait]
impl Publisher for WordPressApi {
    async fn publish(&self, request: &PublishRequest) -> ApiResult<PublishedPost> {
        request.validate()?;

        let media = self
            .upload_media(request)
            .await
            .map_err(|e| e.at_step(PublishStep::MediaUpload))?;
        info!(media_id = media.id, "Media uploaded");

        let post = self
            .create_post(request, media.id)
            .await
            .map_err(|e| e.at_step(PublishStep::PostCreation))?;
        info!(post_id = post.id, url = %post.link, "Post published");

        Ok(PublishedPost {
            post_id: post.id,
            post_url: post.link,
            media_id: media.id,
            media_url: media.source_url,
        })
    }
}

impl fmt::Debug for WordPressApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WordPressApi")
            .field("site_url", &self.site_url)
            .field("username", &self.username)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Header-safe rendition of a file name
fn header_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' { c } else { '_' })
        .collect();
    if cleaned.trim().is_empty() {
        "photo".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;

    #[test]
    fn test_normalize_site_url() {
        assert_eq!(normalize_site_url("https://blog.example/", true).unwrap(), "https://blog.example");
        assert_eq!(normalize_site_url("http://blog.example//", true).unwrap(), "https://blog.example");
        assert_eq!(normalize_site_url("http://blog.example", false).unwrap(), "http://blog.example");
        assert!(normalize_site_url("blog.example", true).is_err());
        assert!(normalize_site_url("https://", true).is_err());
    }

    #[test]
    fn test_requires_complete_config() {
        let client = PhotopostClient::with_config(ClientConfig::default()).unwrap();
        let config = PublishConfig {
            site_url: "https://blog.example".into(),
            username: "editor".into(),
            ..PublishConfig::default()
        };
        assert!(matches!(WordPressApi::new(client.clone(), &config), Err(ApiError::Config(_))));

        let api = WordPressApi::new(client, &config.with_password("abcd efgh")).unwrap();
        assert_eq!(api.site_url(), "https://blog.example");
        assert!(!format!("{api:?}").contains("abcd"));
    }

    #[test]
    fn test_header_file_name() {
        assert_eq!(header_file_name("IMG 0001.jpg"), "IMG 0001.jpg");
        assert_eq!(header_file_name("zoë\"s.jpg"), "zo__s.jpg");
        assert_eq!(header_file_name(""), "photo");
    }

    #[test]
    fn test_post_payload_omits_empty_categories() {
        let post = NewPost {
            title: "t",
            content: "<p></p>".into(),
            status: "publish",
            featured_media: 7,
            categories: &[],
        };
        let json = serde_json::to_value(&post).unwrap();
        assert!(json.get("categories").is_none());
        assert_eq!(json["featured_media"], 7);
    }
}
