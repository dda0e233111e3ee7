//! photopost: enrich a photo with location and weather, shrink it and
//! publish it to a WordPress site.

use clap::{Args, Parser, Subcommand};
use owo_colors::OwoColorize;
use photopost_cli::{GlobalArgs, Status};
use photopost_telemetry::TelemetryConfig;
use std::path::PathBuf;
use std::process::ExitCode;

mod commands;
mod context;

use commands::{categories, inspect, publish, search, weather};
use context::AppContext;

/// Photo upload pipeline: location race, adaptive compression, weather, publish
#[derive(Parser)]
#[command(name = "photopost")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run preview, compression and the location race on a photo
    Inspect {
        /// Photo to inspect
        file: PathBuf,

        #[command(flatten)]
        device: DeviceArgs,

        /// Skip the weather lookup
        #[arg(long)]
        no_weather: bool,
    },

    /// Current weather at a coordinate
    Weather {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
    },

    /// Search for a place by name
    Search {
        /// Free-text query, e.g. "Dom Tower Utrecht"
        query: String,
    },

    /// Publish a photo as a post
    Publish {
        /// Photo to publish
        file: PathBuf,

        #[arg(long)]
        title: String,

        #[arg(long, default_value = "")]
        body: String,

        /// Category id (repeatable)
        #[arg(long = "category", value_name = "ID")]
        categories: Vec<u64>,

        /// 1 to 5 stars
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
        rating: Option<u8>,

        #[command(flatten)]
        location: LocationArgs,

        #[command(flatten)]
        device: DeviceArgs,

        #[command(flatten)]
        credentials: CredentialArgs,
    },

    /// List the site's categories and check the credentials
    Categories {
        #[command(flatten)]
        credentials: CredentialArgs,
    },
}

/// A fixed device position; without one the device reader reports no
/// positioning capability
#[derive(Debug, Clone, Args)]
pub struct DeviceArgs {
    #[arg(long, allow_hyphen_values = true, requires = "device_lon")]
    pub device_lat: Option<f64>,

    #[arg(long, allow_hyphen_values = true, requires = "device_lat")]
    pub device_lon: Option<f64>,

    /// Reported accuracy radius in metres
    #[arg(long, default_value_t = 10.0)]
    pub device_accuracy: f64,
}

/// Manual location, taking precedence over anything detected
#[derive(Debug, Clone, Args)]
pub struct LocationArgs {
    #[arg(long, allow_hyphen_values = true, requires = "lon", conflicts_with = "search")]
    pub lat: Option<f64>,

    #[arg(long, allow_hyphen_values = true, requires = "lat")]
    pub lon: Option<f64>,

    /// Use the first geocoding result for this query
    #[arg(long, value_name = "QUERY")]
    pub search: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct CredentialArgs {
    /// WordPress application password
    #[arg(long, env = "PHOTOPOST_WP_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let telemetry = if cli.global.verbose {
        TelemetryConfig::verbose()
    } else if cli.global.quiet || cli.global.json {
        TelemetryConfig::quiet()
    } else {
        TelemetryConfig::default()
    };
    if let Err(e) = photopost_telemetry::init_with_config(telemetry) {
        eprintln!("{} {}", "Warning:".yellow(), e);
    }

    let json = cli.global.json;
    let result = match AppContext::load(cli.global) {
        Ok(ctx) => match cli.command {
            Commands::Inspect { file, device, no_weather } => inspect::run(&ctx, &file, &device, !no_weather).await,
            Commands::Weather { lat, lon } => weather::run(&ctx, lat, lon).await,
            Commands::Search { query } => search::run(&ctx, &query).await,
            Commands::Publish {
                file,
                title,
                body,
                categories,
                rating,
                location,
                device,
                credentials,
            } => {
                let form = photopost_session::PostForm {
                    title,
                    body,
                    categories,
                    rating,
                };
                publish::run(&ctx, &file, form, &location, &device, &credentials).await
            }
            Commands::Categories { credentials } => categories::run(&ctx, &credentials).await,
        },
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => report(&e, json),
    }
}

fn report(err: &anyhow::Error, json: bool) -> ExitCode {
    if let Some(coded) = err.downcast_ref::<photopost_core::Error>() {
        if json {
            if let Ok(body) = serde_json::to_string_pretty(&coded.to_report()) {
                println!("{body}");
            }
        }
        Status::report(coded);
        return ExitCode::from(u8::try_from(coded.exit_code()).unwrap_or(1));
    }
    eprintln!("{} {:#}", "Error:".red().bold(), err);
    ExitCode::FAILURE
}
