//! Keeps weather in step with the resolved location

use crate::metrics::{weather_provider, WEATHER_UNAVAILABLE};
use photopost_api_client::endpoints::{WeatherLookup, WeatherSnapshot};
use photopost_location::{Extraction, LocationArbiter};
use photopost_telemetry::MetricsRegistry;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

/// Weather for one location revision
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeatherState {
    /// Location revision the snapshot belongs to
    pub revision: u64,
    pub snapshot: Option<WeatherSnapshot>,
    /// A lookup for `revision` is in flight
    pub pending: bool,
}

/// Look up weather for every newly resolved location until the location
/// channel closes.
///
/// A lookup overtaken by a newer location is abandoned; a result is only
/// published while its revision is still the arbiter's current one.
pub(crate) async fn follow_location(
    arbiter: Arc<LocationArbiter>,
    lookup: WeatherLookup,
    state: watch::Sender<WeatherState>,
    metrics: Arc<MetricsRegistry>,
) {
    let mut location = arbiter.subscribe();
    let mut handled = None;

    loop {
        let (revision, extraction) = {
            let current = location.borrow_and_update();
            (current.revision, current.extraction.clone())
        };

        if handled != Some(revision) {
            match extraction {
                Extraction::Extracting => {}
                Extraction::Unresolved(_) => {
                    handled = Some(revision);
                    state.send_replace(WeatherState {
                        revision,
                        snapshot: None,
                        pending: false,
                    });
                }
                Extraction::Resolved(fix) => {
                    handled = Some(revision);
                    state.send_replace(WeatherState {
                        revision,
                        snapshot: None,
                        pending: true,
                    });

                    tokio::select! {
                        snapshot = lookup.lookup_fix(&fix) => {
                            if arbiter.current().revision == revision {
                                match &snapshot {
                                    Some(s) => metrics.increment(&weather_provider(s.provider)),
                                    None => metrics.increment(WEATHER_UNAVAILABLE),
                                }
                                state.send_replace(WeatherState { revision, snapshot, pending: false });
                            } else {
                                debug!(revision, "Discarding weather for a superseded location");
                            }
                        }
                        changed = location.changed() => {
                            debug!(revision, "Location changed during weather lookup");
                            if changed.is_err() {
                                return;
                            }
                            continue;
                        }
                    }
                }
            }
        }

        if location.changed().await.is_err() {
            return;
        }
    }
}
