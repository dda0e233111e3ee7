//! Current conditions at a coordinate

use crate::context::AppContext;
use anyhow::Result;
use photopost_cli::progress::{finish_success, finish_warning, spinner};
use photopost_cli::Status;
use photopost_core::{Error, ErrorCode};
use photopost_geo::Coordinate;

pub async fn run(ctx: &AppContext, latitude: f64, longitude: f64) -> Result<()> {
    let coordinate = Coordinate::try_new(latitude, longitude)
        .map_err(|e| Error::new(ErrorCode::InvalidCoordinate, e.to_string()))?;

    let pb = spinner("Fetching weather", ctx.interactive() && !ctx.global.json);
    let Some(snapshot) = ctx.client.weather(&ctx.config.weather).lookup(coordinate).await else {
        finish_warning(&pb, "Weather unavailable");
        return Err(Error::new(ErrorCode::WeatherUnavailable, "Neither weather service answered")
            .with_suggestion("Check the network connection and try again")
            .into());
    };
    finish_success(&pb, "Weather fetched");

    if ctx.global.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    Status::header(&format!("{} {}", snapshot.icon.emoji(), snapshot.place));
    Status::field("Temperature", format!("{}°C", snapshot.temperature_c));
    Status::field("Conditions", &snapshot.condition);
    Status::field("Humidity", format!("{}%", snapshot.humidity_percent));
    Status::field("Wind", format!("{} km/h", snapshot.wind_kmh));
    if let Some(visibility) = snapshot.visibility_km {
        Status::field("Visibility", format!("{visibility} km"));
    }
    Status::field("Provider", snapshot.provider.as_str());
    Ok(())
}
