//! Publish a photo as a post

use crate::context::AppContext;
use crate::{CredentialArgs, DeviceArgs, LocationArgs};
use anyhow::Result;
use photopost_cli::progress::{finish_error, finish_success, spinner};
use photopost_cli::Status;
use photopost_core::{Error, ErrorCode};
use photopost_location::Extraction;
use photopost_session::{PostForm, UploadSession};
use std::path::Path;
use tracing::info;

pub async fn run(
    ctx: &AppContext,
    file: &Path,
    form: PostForm,
    location: &LocationArgs,
    device: &DeviceArgs,
    credentials: &CredentialArgs,
) -> Result<()> {
    // Credentials are checked before any image work starts
    let api = ctx.wordpress(credentials)?;

    let raw = AppContext::read_photo(file)?;
    let session = UploadSession::start(raw, &ctx.config, ctx.collaborators(device, true))?;
    let visible = ctx.interactive() && !ctx.global.json;

    match (location.lat, location.lon, &location.search) {
        (Some(lat), Some(lon), _) => {
            session.override_location(lat, lon, None)?;
        }
        (_, _, Some(query)) => {
            let places = ctx
                .client
                .geocoding(&ctx.config.geocoding)
                .search(query)
                .await
                .map_err(|e| Error::new(ErrorCode::GeocodingFailed, e.user_message()))?;
            let Some(place) = places.first() else {
                return Err(Error::new(ErrorCode::GeocodingFailed, format!("No place found for \"{query}\""))
                    .with_suggestion("Try a broader query or pass --lat and --lon")
                    .into());
            };
            info!(place = %place.display_name, "Using search result");
            session.override_from_candidate(place)?;
        }
        _ => {
            let state = session.location().await;
            if let Extraction::Unresolved(why) = &state.extraction {
                Status::warning(&why.to_string());
            }
        }
    }

    let pb = spinner("Waiting for weather", visible);
    let weather = session.settled_weather().await;
    finish_success(&pb, if weather.is_some() { "Weather attached" } else { "No weather" });

    let pb = spinner("Publishing", visible);
    let post = match session.publish(form, &api).await {
        Ok(post) => {
            finish_success(&pb, "Published");
            post
        }
        Err(e) => {
            finish_error(&pb, "Publish failed");
            return Err(e.into());
        }
    };

    if ctx.global.json {
        let report = serde_json::json!({
            "post_id": post.post_id,
            "post_url": post.post_url,
            "media_id": post.media_id,
            "media_url": post.media_url,
            "location": session.current_fix(),
            "weather": weather,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        Status::success(&format!("Post {} is live at {}", post.post_id, post.post_url));
    }
    Ok(())
}
