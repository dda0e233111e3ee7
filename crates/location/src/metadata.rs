//! GPS tags embedded in the photo itself.

use crate::fix::{Accuracy, GeoFix, Source};
use crate::outcome::{NoFixReason, ReaderOutcome};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use exif::{Exif, In, Tag, Value};
use photopost_core::config::LocationConfig;
use photopost_geo::dms_to_decimal;
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

/// Reads the GPS block of an image, bounded by a timeout.
#[derive(Debug, Clone)]
pub struct MetadataReader {
    timeout: Duration,
    parse: fn(&[u8]) -> ReaderOutcome,
}

impl MetadataReader {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout, parse: read_gps }
    }

    pub fn from_config(config: &LocationConfig) -> Self {
        Self::new(config.metadata_timeout)
    }

    /// Replace the EXIF parser, e.g. with one for another container format.
    pub fn with_parser(mut self, parse: fn(&[u8]) -> ReaderOutcome) -> Self {
        self.parse = parse;
        self
    }

    /// Parse off the executor; never fails, only reports why there is no fix.
    #[instrument(skip_all, fields(bytes = image.len()))]
    pub async fn read(&self, image: Arc<[u8]>) -> ReaderOutcome {
        let parse = self.parse;
        let job = tokio::task::spawn_blocking(move || parse(&image));

        let outcome = match tokio::time::timeout(self.timeout, job).await {
            Err(_) => ReaderOutcome::NoFix(NoFixReason::Timeout),
            Ok(Err(join_err)) => ReaderOutcome::NoFix(NoFixReason::Unreadable(join_err.to_string())),
            Ok(Ok(outcome)) => outcome,
        };

        match &outcome {
            ReaderOutcome::Fix(fix) => debug!(%fix, "Photo carries a geotag"),
            ReaderOutcome::NoFix(reason) => debug!(%reason, "No geotag from photo"),
        }
        outcome
    }
}

/// Extract a fix from the EXIF GPS tags of an encoded image. CPU bound.
pub fn read_gps(data: &[u8]) -> ReaderOutcome {
    let exif = match exif::Reader::new().read_from_container(&mut Cursor::new(data)) {
        Ok(exif) => exif,
        Err(exif::Error::NotFound(_)) => return ReaderOutcome::NoFix(NoFixReason::TagsAbsent),
        Err(e) => return ReaderOutcome::NoFix(NoFixReason::Unreadable(e.to_string())),
    };

    let (Some(lat), Some(lat_ref), Some(lon), Some(lon_ref)) = (
        rationals(&exif, Tag::GPSLatitude),
        ascii_char(&exif, Tag::GPSLatitudeRef),
        rationals(&exif, Tag::GPSLongitude),
        ascii_char(&exif, Tag::GPSLongitudeRef),
    ) else {
        return ReaderOutcome::NoFix(NoFixReason::TagsAbsent);
    };

    if lat.len() < 3 || lon.len() < 3 {
        return ReaderOutcome::NoFix(NoFixReason::TagsAbsent);
    }

    let latitude = dms_to_decimal(&lat, lat_ref);
    let longitude = dms_to_decimal(&lon, lon_ref);

    match GeoFix::new(latitude, longitude, Source::Metadata, Accuracy::metadata()) {
        Ok(fix) => ReaderOutcome::Fix(fix.with_altitude(altitude(&exif)).with_captured_at(timestamp(&exif))),
        Err(_) => ReaderOutcome::NoFix(NoFixReason::OutOfRange),
    }
}

fn rationals(exif: &Exif, tag: Tag) -> Option<Vec<f64>> {
    match &exif.get_field(tag, In::PRIMARY)?.value {
        Value::Rational(values) => Some(values.iter().map(exif::Rational::to_f64).collect()),
        _ => None,
    }
}

fn ascii(exif: &Exif, tag: Tag) -> Option<&str> {
    match &exif.get_field(tag, In::PRIMARY)?.value {
        Value::Ascii(values) => std::str::from_utf8(values.first()?).ok(),
        _ => None,
    }
}

fn ascii_char(exif: &Exif, tag: Tag) -> Option<char> {
    ascii(exif, tag)?.trim().chars().next()
}

/// Metres above sea level; `GPSAltitudeRef` 1 means below.
fn altitude(exif: &Exif) -> Option<f64> {
    let metres = *rationals(exif, Tag::GPSAltitude)?.first()?;
    let below = matches!(
        exif.get_field(Tag::GPSAltitudeRef, In::PRIMARY).map(|f| &f.value),
        Some(Value::Byte(bytes)) if bytes.first() == Some(&1)
    );
    Some(if below { -metres } else { metres })
}

/// `GPSDateStamp` (`YYYY:MM:DD`) plus `GPSTimeStamp` (h, m, s) in UTC.
fn timestamp(exif: &Exif) -> Option<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(ascii(exif, Tag::GPSDateStamp)?.trim(), "%Y:%m:%d").ok()?;
    let hms = rationals(exif, Tag::GPSTimeStamp)?;
    let [hours, minutes, seconds, ..] = hms.as_slice() else {
        return None;
    };

    if !(hours.is_finite() && minutes.is_finite() && seconds.is_finite()) {
        return None;
    }
    let millis = ((seconds.fract()) * 1000.0).round() as u32;
    let time = NaiveTime::from_hms_milli_opt(*hours as u32, *minutes as u32, seconds.trunc() as u32, millis.min(999))?;
    Some(date.and_time(time).and_utc())
}
