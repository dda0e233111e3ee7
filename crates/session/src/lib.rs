//! One photo upload from selection to publish record.
//!
//! [`UploadSession::start`] takes the selected file and kicks off, all at
//! once:
//!
//! - the preview (fast path for immediate feedback)
//! - adaptive transcoding of the original bytes
//! - the location race between the photo's geotag and the device
//!
//! Weather is looked up for every resolved location, automatic or manual,
//! and discarded if the location changed while the lookup was in flight.
//! [`UploadSession::publish_request`] assembles what the publish collaborator
//! receives.

mod form;
pub mod metrics;
mod session;
mod weather;

pub use form::PostForm;
pub use session::{Collaborators, UploadSession};
pub use weather::WeatherState;
