//! Races the metadata and device readers and holds the current location.
//!
//! State lives in a watch channel. Every resolution attempt takes a revision
//! ticket; an automatic result is applied only while its ticket is still the
//! current revision, so a manual override is never overwritten by a late
//! automatic result.

use crate::device::{DeviceReader, PositionProvider};
use crate::fix::GeoFix;
use crate::metadata::MetadataReader;
use crate::outcome::{NoFixReason, ReaderOutcome};
use photopost_core::config::LocationConfig;
use photopost_geo::{haversine_distance_meters, Result as GeoResult};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// Why neither reader produced a fix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Unresolved {
    pub metadata: NoFixReason,
    pub device: NoFixReason,
}

impl fmt::Display for Unresolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Location not detected (photo: {}; device: {}). Pick a location manually.",
            self.metadata, self.device
        )
    }
}

/// Where location acquisition stands.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    /// Readers are running
    Extracting,
    Resolved(GeoFix),
    Unresolved(Unresolved),
}

impl Extraction {
    pub fn fix(&self) -> Option<&GeoFix> {
        match self {
            Extraction::Resolved(fix) => Some(fix),
            _ => None,
        }
    }
}

/// Snapshot published to observers.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationState {
    /// Bumped by every extraction start and every override
    pub revision: u64,
    pub extraction: Extraction,
    /// Extraction has taken longer than the advisory threshold
    pub slow: bool,
}

/// Owns the readers and the observable location state.
#[derive(Debug)]
pub struct LocationArbiter {
    metadata: MetadataReader,
    device: DeviceReader,
    slow_warning: Duration,
    state: watch::Sender<LocationState>,
}

impl LocationArbiter {
    pub fn new(metadata: MetadataReader, device: DeviceReader, slow_warning: Duration) -> Self {
        let (state, _) = watch::channel(LocationState {
            revision: 0,
            extraction: Extraction::Extracting,
            slow: false,
        });

        Self {
            metadata,
            device,
            slow_warning,
            state,
        }
    }

    pub fn from_config(config: &LocationConfig, provider: Arc<dyn PositionProvider>) -> Self {
        Self::new(
            MetadataReader::from_config(config),
            DeviceReader::from_config(provider, config),
            config.slow_warning,
        )
    }

    pub fn subscribe(&self) -> watch::Receiver<LocationState> {
        self.state.subscribe()
    }

    pub fn current(&self) -> LocationState {
        self.state.borrow().clone()
    }

    /// Run both readers against `image` and resolve by priority: metadata,
    /// then device, else unresolved.
    ///
    /// Returns the state after the race, which is the override's state if a
    /// manual choice arrived while the readers were running.
    pub async fn extract(&self, image: Arc<[u8]>) -> LocationState {
        let ticket = self.begin();
        self.race(ticket, image).await
    }

    /// Start extraction on the runtime and return at once.
    ///
    /// The revision ticket is taken before this returns, so an override
    /// issued afterwards always supersedes the automatic result.
    pub fn spawn_extract(self: &Arc<Self>, image: Arc<[u8]>) -> JoinHandle<LocationState> {
        let ticket = self.begin();
        let arbiter = Arc::clone(self);
        tokio::spawn(async move { arbiter.race(ticket, image).await })
    }

    #[instrument(skip(self, image), fields(bytes = image.len()))]
    async fn race(&self, ticket: u64, image: Arc<[u8]>) -> LocationState {
        let race = async { tokio::join!(self.metadata.read(image), self.device.read()) };
        tokio::pin!(race);
        let slow_timer = tokio::time::sleep(self.slow_warning);
        tokio::pin!(slow_timer);
        let mut flagged = false;

        let (from_metadata, from_device) = loop {
            tokio::select! {
                outcomes = &mut race => break outcomes,
                () = &mut slow_timer, if !flagged => {
                    flagged = true;
                    warn!(after = ?self.slow_warning, "Location extraction is slow");
                    self.state.send_if_modified(|s| {
                        let current = s.revision == ticket && s.extraction == Extraction::Extracting;
                        if current {
                            s.slow = true;
                        }
                        current
                    });
                }
            }
        };

        let extraction = arbitrate(from_metadata, from_device);
        let applied = self.state.send_if_modified(|s| {
            if s.revision != ticket {
                return false;
            }
            s.extraction = extraction.clone();
            true
        });

        if applied {
            match &extraction {
                Extraction::Resolved(fix) => info!(source = %fix.source(), %fix, "Location resolved"),
                Extraction::Unresolved(why) => info!(%why, "Location unresolved"),
                Extraction::Extracting => {}
            }
        } else {
            debug!(ticket, "Automatic result superseded by manual choice");
        }
        self.current()
    }

    /// Replace the current location with a user-chosen one.
    pub fn override_location(&self, latitude: f64, longitude: f64, display_name: Option<String>) -> GeoResult<GeoFix> {
        let mut fix = GeoFix::manual(latitude, longitude)?;
        if let Some(name) = display_name {
            fix = fix.with_display_name(name);
        }
        self.apply_manual(fix.clone());
        Ok(fix)
    }

    /// Re-issue the current fix as a manual choice. `None` when nothing is
    /// resolved yet.
    pub fn confirm_current(&self) -> Option<GeoFix> {
        let fix = self.state.borrow().extraction.fix()?.as_manual();
        self.apply_manual(fix.clone());
        Some(fix)
    }

    fn begin(&self) -> u64 {
        let mut ticket = 0;
        self.state.send_modify(|s| {
            s.revision += 1;
            s.extraction = Extraction::Extracting;
            s.slow = false;
            ticket = s.revision;
        });
        ticket
    }

    fn apply_manual(&self, fix: GeoFix) {
        self.state.send_modify(|s| {
            s.revision += 1;
            info!(revision = s.revision, %fix, "Location set manually");
            s.extraction = Extraction::Resolved(fix);
            s.slow = false;
        });
    }
}

/// Metadata wins unconditionally, then device.
fn arbitrate(from_metadata: ReaderOutcome, from_device: ReaderOutcome) -> Extraction {
    match (from_metadata, from_device) {
        (ReaderOutcome::Fix(photo), device) => {
            if let Some(live) = device.fix() {
                let gap = haversine_distance_meters(&photo.coordinate(), &live.coordinate());
                debug!(gap_m = gap.round(), "Photo geotag and device position both available");
            }
            Extraction::Resolved(photo)
        }
        (ReaderOutcome::NoFix(_), ReaderOutcome::Fix(live)) => Extraction::Resolved(live),
        (ReaderOutcome::NoFix(metadata), ReaderOutcome::NoFix(device)) => {
            Extraction::Unresolved(Unresolved { metadata, device })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{DeniedProvider, FixedPositionProvider, PositionRequest};
    use crate::fix::{AccuracyClass, Source};
    use crate::fixtures::{plain_jpeg, GpsTags};

    fn arbiter(provider: impl PositionProvider + 'static) -> LocationArbiter {
        LocationArbiter::from_config(&LocationConfig::default(), Arc::new(provider))
    }

    fn geotagged(lat: f64, lon: f64) -> Arc<[u8]> {
        GpsTags::new(lat, lon).embed(&plain_jpeg()).unwrap().into()
    }

    #[tokio::test]
    async fn test_metadata_beats_device() {
        let arbiter = arbiter(FixedPositionProvider::new(51.0, 5.0, 3.0));
        let state = arbiter.extract(geotagged(52.370, 4.895)).await;

        let fix = state.extraction.fix().unwrap();
        assert_eq!(fix.source(), Source::Metadata);
        assert!((fix.latitude() - 52.370).abs() < 1e-4);
        assert_eq!(state.revision, 1);
    }

    #[tokio::test]
    async fn test_device_used_without_geotag() {
        let arbiter = arbiter(FixedPositionProvider::new(51.0, 5.0, 15.0));
        let state = arbiter.extract(plain_jpeg().into()).await;

        let fix = state.extraction.fix().unwrap();
        assert_eq!(fix.source(), Source::Device);
        assert_eq!(fix.accuracy().class, AccuracyClass::Medium);
    }

    #[tokio::test]
    async fn test_unresolved_reason_names_both_readers() {
        let arbiter = arbiter(DeniedProvider);
        let state = arbiter.extract(plain_jpeg().into()).await;

        let Extraction::Unresolved(why) = state.extraction else {
            panic!("expected unresolved, got {:?}", state.extraction);
        };
        assert_eq!(why.metadata, NoFixReason::TagsAbsent);
        assert_eq!(why.device, NoFixReason::PermissionDenied);
        assert!(why.to_string().contains("location permission denied"));
    }

    #[tokio::test]
    async fn test_override_replaces_resolved_fix() {
        let arbiter = arbiter(DeniedProvider);
        arbiter.extract(geotagged(52.370, 4.895)).await;

        let fix = arbiter.override_location(48.85, 2.35, Some("Paris".into())).unwrap();
        assert_eq!(fix.source(), Source::Manual);

        let state = arbiter.current();
        assert_eq!(state.extraction, Extraction::Resolved(fix));
        assert_eq!(state.revision, 2);
    }

    #[tokio::test]
    async fn test_invalid_override_leaves_state() {
        let arbiter = arbiter(DeniedProvider);
        arbiter.extract(geotagged(52.370, 4.895)).await;
        let before = arbiter.current();

        assert!(arbiter.override_location(100.0, 2.35, None).is_err());
        assert_eq!(arbiter.current(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_automatic_result_never_overwrites_override() {
        let slow_device = FixedPositionProvider::new(51.0, 5.0, 3.0).with_delay(Duration::from_secs(6));
        let arbiter = arbiter(slow_device);

        let (state, manual) = tokio::join!(arbiter.extract(plain_jpeg().into()), async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            arbiter.override_location(48.85, 2.35, None).unwrap()
        });

        assert_eq!(state.extraction, Extraction::Resolved(manual));
        assert_eq!(arbiter.current().extraction.fix().unwrap().source(), Source::Manual);
    }

    #[tokio::test]
    async fn test_override_right_after_spawn_wins() {
        let arbiter = Arc::new(arbiter(FixedPositionProvider::new(51.0, 5.0, 3.0)));
        let handle = arbiter.spawn_extract(geotagged(52.370, 4.895));
        let manual = arbiter.override_location(48.85, 2.35, Some("Paris".into())).unwrap();

        let state = handle.await.unwrap();
        assert_eq!(state.extraction, Extraction::Resolved(manual));
        assert_eq!(state.revision, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_flag_raised_then_unresolved_then_manual() {
        let hanging = FixedPositionProvider::new(51.0, 5.0, 3.0).with_delay(Duration::from_secs(60));
        let arbiter = arbiter(hanging);
        let mut watcher = arbiter.subscribe();

        let (state, saw_slow) = tokio::join!(arbiter.extract(plain_jpeg().into()), async {
            watcher.wait_for(|s| s.slow).await.is_ok()
        });
        assert!(saw_slow);

        let Extraction::Unresolved(why) = &state.extraction else {
            panic!("expected unresolved, got {:?}", state.extraction);
        };
        assert_eq!(why.device, NoFixReason::Timeout);

        let fix = arbiter.override_location(48.85, 2.35, None).unwrap();
        assert_eq!(fix.source(), Source::Manual);
        assert_eq!(arbiter.current().extraction.fix(), Some(&fix));
    }

    #[tokio::test(start_paused = true)]
    async fn test_override_while_slow_clears_flag() {
        let hanging = FixedPositionProvider::new(51.0, 5.0, 3.0).with_delay(Duration::from_secs(60));
        let arbiter = Arc::new(arbiter(hanging));
        let mut watcher = arbiter.subscribe();
        let handle = arbiter.spawn_extract(plain_jpeg().into());

        watcher.wait_for(|s| s.slow).await.unwrap();
        let manual = arbiter.override_location(48.85, 2.35, None).unwrap();
        assert!(!arbiter.current().slow);

        let state = handle.await.unwrap();
        assert!(!state.slow);
        assert_eq!(state.extraction, Extraction::Resolved(manual));
    }

    fn stalled_parse(data: &[u8]) -> ReaderOutcome {
        std::thread::sleep(Duration::from_millis(400));
        crate::metadata::read_gps(data)
    }

    #[tokio::test]
    async fn test_metadata_timeout_falls_back_to_device() {
        let config = LocationConfig::default();
        let arbiter = LocationArbiter::new(
            MetadataReader::new(Duration::from_millis(20)).with_parser(stalled_parse),
            DeviceReader::from_config(Arc::new(FixedPositionProvider::new(51.0, 5.0, 15.0)), &config),
            config.slow_warning,
        );
        let state = arbiter.extract(geotagged(52.370, 4.895)).await;

        let fix = state.extraction.fix().unwrap();
        assert_eq!(fix.source(), Source::Device);
        assert!((fix.latitude() - 51.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_confirm_current_reissues_as_manual() {
        let arbiter = arbiter(FixedPositionProvider::new(51.0, 5.0, 50.0));
        assert!(arbiter.confirm_current().is_none());

        arbiter.extract(plain_jpeg().into()).await;
        let confirmed = arbiter.confirm_current().unwrap();
        assert_eq!(confirmed.source(), Source::Manual);
        assert_eq!((confirmed.latitude(), confirmed.longitude()), (51.0, 5.0));
        assert_eq!(arbiter.current().revision, 2);
    }

    #[test]
    fn test_request_reflects_config() {
        let config = LocationConfig {
            device_timeout: Duration::from_secs(2),
            ..LocationConfig::default()
        };
        let reader = DeviceReader::from_config(Arc::new(DeniedProvider), &config);
        assert_eq!(reader.request(), &PositionRequest { timeout: Duration::from_secs(2), ..PositionRequest::default() });
    }
}
