//! Run the enrichment pipeline on one photo without publishing

use crate::context::AppContext;
use crate::DeviceArgs;
use anyhow::Result;
use photopost_cli::output::{format_coordinate, format_duration, format_reduction, format_size};
use photopost_cli::progress::{finish_success, finish_warning, spinner};
use photopost_cli::Status;
use photopost_location::{Extraction, LocationState};
use photopost_session::UploadSession;
use serde_json::{json, Value};
use std::path::Path;

pub async fn run(ctx: &AppContext, file: &Path, device: &DeviceArgs, with_weather: bool) -> Result<()> {
    let raw = AppContext::read_photo(file)?;
    let session = UploadSession::start(raw, &ctx.config, ctx.collaborators(device, with_weather))?;

    let pb = spinner("Reading photo", ctx.interactive() && !ctx.global.json);
    let preview = session.preview().await;
    let processed = session.processed().await;
    let location = session.location().await;
    let weather = session.settled_weather().await;
    match &location.extraction {
        Extraction::Resolved(_) => finish_success(&pb, "Photo ready"),
        _ => finish_warning(&pb, "Photo ready, location unknown"),
    }

    if ctx.global.json {
        let report = json!({
            "file": session.raw().file_name(),
            "media_type": session.raw().media_type(),
            "bytes": session.raw().len(),
            "preview": match &preview {
                Ok(p) => json!({ "width": p.width, "height": p.height, "bytes": p.bytes.len() }),
                Err(e) => json!({ "error": e.to_string() }),
            },
            "transcode": {
                "decision": processed.decision,
                "file_name": processed.asset.file_name(),
                "media_type": processed.asset.media_type(),
                "bytes": processed.asset.len(),
                "report": processed.report,
            },
            "location": location_json(&location),
            "weather": weather,
            "metrics": session.metrics().export_json(),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    Status::header(session.raw().file_name());
    Status::field("Type", session.raw().media_type());
    Status::field("Size", format_size(session.raw().len() as u64));
    match &preview {
        Ok(p) => Status::field("Preview", format!("{}x{}", p.width, p.height)),
        Err(e) => Status::field("Preview", e),
    }
    match &processed.report {
        Some(report) => Status::field(
            "Upload",
            format!(
                "{} {} in {}",
                processed.asset.file_name(),
                format_reduction(report.original_bytes as u64, report.compressed_bytes as u64, report.reduction_percent),
                format_duration(report.elapsed)
            ),
        ),
        None => Status::field("Upload", format!("original ({})", processed.decision.as_str())),
    }

    match &location.extraction {
        Extraction::Resolved(fix) => {
            Status::field("Location", format_coordinate(fix.latitude(), fix.longitude()));
            Status::field("Source", fix.source());
            Status::field("Map", fix.map_url());
        }
        Extraction::Unresolved(why) => Status::warning(&why.to_string()),
        Extraction::Extracting => {}
    }

    if let Some(snapshot) = &weather {
        Status::field(
            "Weather",
            format!(
                "{} {}°C {} in {}",
                snapshot.icon.emoji(),
                snapshot.temperature_c,
                snapshot.condition,
                snapshot.place
            ),
        );
    } else if with_weather && location.extraction.fix().is_some() {
        Status::warning("Weather unavailable");
    }

    Ok(())
}

fn location_json(state: &LocationState) -> Value {
    match &state.extraction {
        Extraction::Resolved(fix) => json!({ "status": "resolved", "fix": fix }),
        Extraction::Unresolved(why) => json!({
            "status": "unresolved",
            "reasons": why,
            "message": why.to_string(),
        }),
        Extraction::Extracting => json!({ "status": "extracting" }),
    }
}
