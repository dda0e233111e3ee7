//! Location acquisition for photo uploads.
//!
//! Two readers run concurrently, each bounded by its own timeout:
//!
//! - [`MetadataReader`]: GPS tags embedded in the photo
//! - [`DeviceReader`]: the host's positioning capability, behind the
//!   [`PositionProvider`] trait
//!
//! [`LocationArbiter`] joins both, prefers the photo's own geotag, falls back
//! to the device and otherwise reports why nothing was found. A manual
//! override is accepted at any time and always wins.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use photopost_core::config::LocationConfig;
//! use photopost_location::{DeniedProvider, LocationArbiter};
//!
//! # async fn run(photo: Arc<[u8]>) {
//! let arbiter = LocationArbiter::from_config(&LocationConfig::default(), Arc::new(DeniedProvider));
//! let state = arbiter.extract(photo).await;
//! if let Some(fix) = state.extraction.fix() {
//!     println!("{fix} -> {}", fix.map_url());
//! }
//! # }
//! ```

mod arbiter;
mod device;
mod fix;
mod metadata;
mod outcome;

#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;

pub use arbiter::{Extraction, LocationArbiter, LocationState, Unresolved};
pub use device::{
    DeniedProvider, DeviceReader, FixedPositionProvider, Position, PositionError, PositionProvider, PositionRequest,
    UnavailableProvider,
};
pub use fix::{Accuracy, AccuracyClass, GeoFix, Source, METADATA_NOMINAL_RADIUS_M};
pub use metadata::{read_gps, MetadataReader};
pub use outcome::{NoFixReason, ReaderOutcome};
