//! Logging and per-upload metrics for photopost
//!
//! - `tracing` subscriber setup driven by `RUST_LOG`, writing to stderr in a
//!   compact or JSON format
//! - [`MetricsRegistry`]: counters, gauges and timing samples for one upload
//!   session, exported as a [`MetricsSnapshot`]
//! - [`Timer`] for recording step durations
//! - A per-process id for correlating log lines with exported metrics

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uuid::Uuid;

static SESSION_ID: Lazy<String> = Lazy::new(|| Uuid::new_v4().to_string());

/// Initialize logging at `info` unless `RUST_LOG` says otherwise
pub fn init() -> anyhow::Result<()> {
    init_with_config(TelemetryConfig::default())
}

/// Initialize with custom configuration
pub fn init_with_config(config: TelemetryConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.filter));

    let (compact, json) = match config.format {
        LogFormat::Compact => (
            Some(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(config.with_target)
                    .compact(),
            ),
            None,
        ),
        LogFormat::Json => (
            None,
            Some(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(config.with_target)
                    .json()
                    .flatten_event(true),
            ),
        ),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(compact)
        .with(json)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install log subscriber: {e}"))?;

    tracing::debug!(session_id = %session_id(), version = env!("CARGO_PKG_VERSION"), "Logging ready");
    Ok(())
}

/// Id shared by every log line and metrics export of this process
pub fn session_id() -> &'static str {
    &SESSION_ID
}

/// Log line layout
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    /// One JSON object per line
    Json,
}

impl LogFormat {
    /// `PHOTOPOST_LOG_FORMAT=json` selects JSON lines
    pub fn from_env() -> Self {
        match std::env::var("PHOTOPOST_LOG_FORMAT") {
            Ok(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Compact,
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub filter: String,
    pub format: LogFormat,
    pub with_target: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            format: LogFormat::from_env(),
            with_target: false,
        }
    }
}

impl TelemetryConfig {
    /// Debug-level logs with targets, for `--verbose`
    pub fn verbose() -> Self {
        Self {
            filter: "debug".to_string(),
            with_target: true,
            ..Self::default()
        }
    }

    /// Warnings and errors only, for `--quiet`
    pub fn quiet() -> Self {
        Self {
            filter: "warn".to_string(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Default)]
struct Samples {
    counters: BTreeMap<String, u64>,
    gauges: BTreeMap<String, u64>,
    timings: BTreeMap<String, Vec<f64>>,
}

/// Metrics for one upload session.
///
/// Names are dotted paths such as `location.source.metadata`; exports list
/// them in sorted order.
#[derive(Debug)]
pub struct MetricsRegistry {
    samples: Mutex<Samples>,
    started: Instant,
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self {
            samples: Mutex::new(Samples::default()),
            started: Instant::now(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Samples> {
        self.samples.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add one to a counter
    pub fn increment(&self, name: &str) {
        self.increment_by(name, 1);
    }

    pub fn increment_by(&self, name: &str, value: u64) {
        *self.lock().counters.entry(name.to_string()).or_default() += value;
    }

    /// Counter value; zero when never incremented
    pub fn counter(&self, name: &str) -> u64 {
        self.lock().counters.get(name).copied().unwrap_or(0)
    }

    /// Overwrite a gauge
    pub fn gauge(&self, name: &str, value: u64) {
        self.lock().gauges.insert(name.to_string(), value);
    }

    pub fn gauge_value(&self, name: &str) -> Option<u64> {
        self.lock().gauges.get(name).copied()
    }

    /// Record one timing sample in milliseconds
    pub fn observe(&self, name: &str, millis: f64) {
        self.lock().timings.entry(name.to_string()).or_default().push(millis);
    }

    /// Summary of the samples recorded under `name`
    pub fn summary(&self, name: &str) -> Option<Summary> {
        self.lock().timings.get(name).and_then(|values| Summary::of(values))
    }

    /// Start a timer that records into this registry
    pub fn timer(&self, name: impl Into<String>) -> Timer<'_> {
        Timer {
            registry: self,
            name: name.into(),
            start: Instant::now(),
            recorded: false,
        }
    }

    /// Time since the registry was created
    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }

    /// Point-in-time copy of every metric
    pub fn snapshot(&self) -> MetricsSnapshot {
        let samples = self.lock();
        MetricsSnapshot {
            session_id: session_id().to_string(),
            uptime_ms: u64::try_from(self.uptime().as_millis()).unwrap_or(u64::MAX),
            counters: samples.counters.clone(),
            gauges: samples.gauges.clone(),
            timings: samples
                .timings
                .iter()
                .filter_map(|(name, values)| Summary::of(values).map(|s| (name.clone(), s)))
                .collect(),
        }
    }

    /// [`snapshot`](Self::snapshot) as a JSON value
    pub fn export_json(&self) -> serde_json::Value {
        serde_json::to_value(self.snapshot()).unwrap_or(serde_json::Value::Null)
    }
}

/// Exported metrics
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub session_id: String,
    pub uptime_ms: u64,
    pub counters: BTreeMap<String, u64>,
    pub gauges: BTreeMap<String, u64>,
    pub timings: BTreeMap<String, Summary>,
}

/// Count, range, mean and nearest-rank percentiles of a sample set
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Summary {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub p50: f64,
    pub p95: f64,
}

impl Summary {
    fn of(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        let count = sorted.len();

        Some(Self {
            count,
            min: sorted[0],
            max: sorted[count - 1],
            mean: sorted.iter().sum::<f64>() / count as f64,
            p50: nearest_rank(&sorted, 50.0),
            p95: nearest_rank(&sorted, 95.0),
        })
    }
}

fn nearest_rank(sorted: &[f64], percentile: f64) -> f64 {
    let rank = ((percentile / 100.0) * sorted.len() as f64).ceil() as usize;
    sorted[rank.clamp(1, sorted.len()) - 1]
}

/// Records elapsed milliseconds once, when stopped or dropped
pub struct Timer<'a> {
    registry: &'a MetricsRegistry,
    name: String,
    start: Instant,
    recorded: bool,
}

impl Timer<'_> {
    /// Stop the timer and record the duration
    pub fn stop(mut self) -> Duration {
        self.record()
    }

    fn record(&mut self) -> Duration {
        let elapsed = self.start.elapsed();
        if !self.recorded {
            self.recorded = true;
            self.registry.observe(&self.name, elapsed.as_secs_f64() * 1000.0);
            tracing::debug!(metric = %self.name, elapsed_ms = elapsed.as_millis(), "Step timed");
        }
        elapsed
    }
}

impl Drop for Timer<'_> {
    fn drop(&mut self) {
        self.record();
    }
}
