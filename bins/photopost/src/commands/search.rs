//! Place search

use crate::context::AppContext;
use anyhow::Result;
use photopost_cli::output::format_coordinate;
use photopost_cli::Status;
use photopost_core::{Error, ErrorCode};

pub async fn run(ctx: &AppContext, query: &str) -> Result<()> {
    let places = ctx
        .client
        .geocoding(&ctx.config.geocoding)
        .search(query)
        .await
        .map_err(|e| Error::new(ErrorCode::GeocodingFailed, e.user_message()))?;

    if ctx.global.json {
        let rows: Vec<_> = places
            .iter()
            .map(|p| {
                serde_json::json!({
                    "latitude": p.coordinate.latitude,
                    "longitude": p.coordinate.longitude,
                    "display_name": p.display_name,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if places.is_empty() {
        Status::info("No places found");
        return Ok(());
    }
    for place in &places {
        println!(
            "  {}  {}",
            format_coordinate(place.coordinate.latitude, place.coordinate.longitude),
            place.display_name
        );
    }
    Ok(())
}
