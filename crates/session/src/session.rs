use crate::form::PostForm;
use crate::metrics::{
    location_source, transcode_decision, LOCATION_UNRESOLVED, PREVIEW_FAILED, PREVIEW_MS, PUBLISH_FAILED,
    PUBLISH_SUCCEEDED, TRANSCODE_BYTES_SAVED, TRANSCODE_MS,
};
use crate::weather::{follow_location, WeatherState};
use photopost_api_client::endpoints::{PlaceCandidate, WeatherLookup, WeatherSnapshot};
use photopost_api_client::{PublishRequest, PublishedPost, Publisher, Rating};
use photopost_core::config::ConfigSchema;
use photopost_core::{Error, ErrorCode, Result};
use photopost_geo::GeoError;
use photopost_image::{
    generate_preview, Preview, PreviewError, ProcessedAsset, RawAsset, TranscodeDecision, TranscodeResult,
    Transcoder,
};
use photopost_location::{Extraction, GeoFix, LocationArbiter, LocationState, PositionProvider, Source};
use photopost_telemetry::MetricsRegistry;
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};

/// Everything outside the pipeline a session talks to
#[derive(Clone)]
pub struct Collaborators {
    /// Host positioning capability
    pub position: Arc<dyn PositionProvider>,
    /// `None` disables weather entirely
    pub weather: Option<WeatherLookup>,
    pub metrics: Arc<MetricsRegistry>,
}

impl Collaborators {
    pub fn new(position: Arc<dyn PositionProvider>) -> Self {
        Self {
            position,
            weather: None,
            metrics: Arc::new(MetricsRegistry::new()),
        }
    }

    #[must_use]
    pub fn with_weather(mut self, lookup: WeatherLookup) -> Self {
        self.weather = Some(lookup);
        self
    }

    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = metrics;
        self
    }
}

impl fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collaborators")
            .field("weather", &self.weather)
            .finish_non_exhaustive()
    }
}

type PreviewSlot = Option<std::result::Result<Preview, PreviewError>>;

/// One selected photo and everything derived from it.
///
/// Background work is aborted when the session is dropped.
pub struct UploadSession {
    raw: RawAsset,
    arbiter: Arc<LocationArbiter>,
    preview: watch::Receiver<PreviewSlot>,
    transcode: watch::Receiver<Option<TranscodeResult>>,
    weather: Option<watch::Receiver<WeatherState>>,
    metrics: Arc<MetricsRegistry>,
    tasks: Vec<JoinHandle<()>>,
}

impl UploadSession {
    /// Accept a selected photo and start all background work.
    ///
    /// Oversize input is rejected here, before anything is decoded, and no
    /// session is created. Must be called inside a Tokio runtime.
    #[instrument(skip_all, fields(file = %raw.file_name(), bytes = raw.len()))]
    pub fn start(raw: RawAsset, config: &ConfigSchema, collaborators: Collaborators) -> Result<Self> {
        let transcoder = Transcoder::new(config.transcode.clone());
        if let Err(e) = transcoder.check_size(&raw) {
            warn!(error = %e, "Rejecting selected photo");
            return Err(e.into());
        }

        let Collaborators {
            position,
            weather,
            metrics,
        } = collaborators;
        let arbiter = Arc::new(LocationArbiter::from_config(&config.location, position));
        let mut tasks = Vec::with_capacity(4);

        let (preview_tx, preview) = watch::channel(None);
        tasks.push(tokio::spawn({
            let raw = raw.clone();
            let config = config.preview.clone();
            let metrics = Arc::clone(&metrics);
            async move {
                let timer = metrics.timer(PREVIEW_MS);
                let result = generate_preview(&raw, &config).await;
                timer.stop();
                if let Err(e) = &result {
                    warn!(error = %e, "No preview");
                    metrics.increment(PREVIEW_FAILED);
                }
                preview_tx.send_replace(Some(result));
            }
        }));

        let (transcode_tx, transcode) = watch::channel(None);
        tasks.push(tokio::spawn({
            let raw = raw.clone();
            let metrics = Arc::clone(&metrics);
            async move {
                let timer = metrics.timer(TRANSCODE_MS);
                let result = transcoder.transcode(&raw).await.unwrap_or_else(|e| {
                    warn!(error = %e, "Transcoder refused input, keeping original");
                    TranscodeResult {
                        asset: ProcessedAsset::passthrough(&raw),
                        report: None,
                        decision: TranscodeDecision::DecodeError,
                    }
                });
                timer.stop();
                metrics.increment(&transcode_decision(result.decision.as_str()));
                if let Some(report) = &result.report {
                    let saved = report.original_bytes.saturating_sub(report.compressed_bytes);
                    metrics.gauge(TRANSCODE_BYTES_SAVED, saved as u64);
                }
                transcode_tx.send_replace(Some(result));
            }
        }));

        let extraction = arbiter.spawn_extract(raw.shared_bytes());
        tasks.push(tokio::spawn({
            let metrics = Arc::clone(&metrics);
            async move {
                let Ok(state) = extraction.await else {
                    return;
                };
                match &state.extraction {
                    Extraction::Resolved(fix) if fix.source() != Source::Manual => {
                        metrics.increment(&location_source(fix.source()));
                    }
                    Extraction::Unresolved(_) => metrics.increment(LOCATION_UNRESOLVED),
                    _ => {}
                }
            }
        }));

        let weather = weather.map(|lookup| {
            let (weather_tx, weather_rx) = watch::channel(WeatherState::default());
            tasks.push(tokio::spawn(follow_location(
                Arc::clone(&arbiter),
                lookup,
                weather_tx,
                Arc::clone(&metrics),
            )));
            weather_rx
        });

        info!("Upload session started");
        Ok(Self {
            raw,
            arbiter,
            preview,
            transcode,
            weather,
            metrics,
            tasks,
        })
    }

    /// The photo as selected
    pub fn raw(&self) -> &RawAsset {
        &self.raw
    }

    pub fn metrics(&self) -> &MetricsRegistry {
        &self.metrics
    }

    // -------------------------------------------------------------------------
    // Image work
    // -------------------------------------------------------------------------

    /// Wait for the preview
    pub async fn preview(&self) -> std::result::Result<Preview, PreviewError> {
        let mut rx = self.preview.clone();
        match rx.wait_for(Option::is_some).await {
            Ok(slot) => slot
                .clone()
                .unwrap_or_else(|| Err(PreviewError::Decode("preview missing".into()))),
            Err(_) => Err(PreviewError::Decode("preview task ended early".into())),
        }
    }

    /// Wait for the transcoder's decision
    pub async fn processed(&self) -> TranscodeResult {
        let mut rx = self.transcode.clone();
        let finished = match rx.wait_for(Option::is_some).await {
            Ok(slot) => slot.clone(),
            Err(_) => None,
        };
        finished.unwrap_or_else(|| TranscodeResult {
            asset: ProcessedAsset::passthrough(&self.raw),
            report: None,
            decision: TranscodeDecision::DecodeError,
        })
    }

    // -------------------------------------------------------------------------
    // Location
    // -------------------------------------------------------------------------

    /// Location as it stands now
    pub fn location_state(&self) -> LocationState {
        self.arbiter.current()
    }

    pub fn subscribe_location(&self) -> watch::Receiver<LocationState> {
        self.arbiter.subscribe()
    }

    /// Wait until the location is resolved or unresolved
    pub async fn location(&self) -> LocationState {
        let mut rx = self.arbiter.subscribe();
        match rx.wait_for(|s| s.extraction != Extraction::Extracting).await {
            Ok(state) => state.clone(),
            Err(_) => self.arbiter.current(),
        }
    }

    /// The resolved fix, if any
    pub fn current_fix(&self) -> Option<GeoFix> {
        self.arbiter.current().extraction.fix().cloned()
    }

    /// Set the location to a user-chosen point
    pub fn override_location(&self, latitude: f64, longitude: f64, display_name: Option<String>) -> Result<GeoFix> {
        let fix = self
            .arbiter
            .override_location(latitude, longitude, display_name)
            .map_err(invalid_coordinate)?;
        self.metrics.increment(&location_source(Source::Manual));
        Ok(fix)
    }

    /// Set the location to a geocoding search result
    pub fn override_from_candidate(&self, candidate: &PlaceCandidate) -> Result<GeoFix> {
        self.override_location(
            candidate.coordinate.latitude,
            candidate.coordinate.longitude,
            Some(candidate.display_name.clone()),
        )
    }

    /// Accept the detected location as the person's own choice
    pub fn confirm_current(&self) -> Option<GeoFix> {
        let fix = self.arbiter.confirm_current()?;
        self.metrics.increment(&location_source(Source::Manual));
        Some(fix)
    }

    // -------------------------------------------------------------------------
    // Weather
    // -------------------------------------------------------------------------

    /// Weather for the current location, if it has arrived
    pub fn weather(&self) -> Option<WeatherSnapshot> {
        let rx = self.weather.as_ref()?;
        let state = rx.borrow();
        (state.revision == self.arbiter.current().revision)
            .then(|| state.snapshot.clone())
            .flatten()
    }

    pub fn subscribe_weather(&self) -> Option<watch::Receiver<WeatherState>> {
        self.weather.clone()
    }

    /// Wait for the location to settle and for the weather lookup that
    /// belongs to it
    pub async fn settled_weather(&self) -> Option<WeatherSnapshot> {
        let mut rx = self.weather.clone()?;
        let location = self.location().await;
        if location.extraction.fix().is_none() {
            return None;
        }
        let arbiter = &self.arbiter;
        let settled = rx
            .wait_for(|w| !w.pending && w.revision == arbiter.current().revision)
            .await
            .ok()?;
        settled.snapshot.clone()
    }

    // -------------------------------------------------------------------------
    // Publishing
    // -------------------------------------------------------------------------

    /// Assemble the publish record from the form and the current state.
    ///
    /// Waits for the transcoder so the smaller file is the one sent.
    pub async fn publish_request(&self, form: PostForm) -> Result<PublishRequest> {
        let rating = form.rating.map(Rating::new).transpose()?;
        let processed = self.processed().await;

        let request = PublishRequest {
            bytes: processed.asset.shared_bytes(),
            media_type: processed.asset.media_type().to_string(),
            file_name: processed.asset.file_name().to_string(),
            title: form.title,
            body: form.body,
            categories: form.categories,
            rating,
            location: self.current_fix(),
            weather: self.weather(),
        };
        request.validate()?;
        Ok(request)
    }

    /// Publish through `publisher`; failures come back readable and leave the
    /// session untouched
    #[instrument(skip_all, fields(file = %self.raw.file_name()))]
    pub async fn publish(&self, form: PostForm, publisher: &dyn Publisher) -> Result<PublishedPost> {
        let request = self.publish_request(form).await?;
        match publisher.publish(&request).await {
            Ok(post) => {
                self.metrics.increment(PUBLISH_SUCCEEDED);
                info!(post_id = post.post_id, url = %post.post_url, "Published");
                Ok(post)
            }
            Err(e) => {
                self.metrics.increment(PUBLISH_FAILED);
                warn!(error = %e, "Publish failed");
                Err(e.into())
            }
        }
    }
}

fn invalid_coordinate(err: GeoError) -> Error {
    Error::new(ErrorCode::InvalidCoordinate, err.to_string())
        .with_suggestion("Latitude must be within ±90° and longitude within ±180°")
}

impl Drop for UploadSession {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

impl fmt::Debug for UploadSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadSession")
            .field("file", &self.raw.file_name())
            .field("bytes", &self.raw.len())
            .field("location", &self.arbiter.current())
            .finish_non_exhaustive()
    }
}
