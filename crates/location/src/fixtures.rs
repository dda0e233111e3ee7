//! Helpers that embed GPS tags into JPEG bytes.
//!
//! Enabled for this crate's tests and, through the `fixtures` feature, for
//! downstream test suites.

use exif::experimental::Writer;
use exif::{Field, In, Rational, Tag, Value};
use std::io::Cursor;

/// A GPS tag set to embed.
#[derive(Debug, Clone)]
pub struct GpsTags {
    latitude: f64,
    longitude: f64,
    altitude: Option<f64>,
    timestamp: Option<(String, [f64; 3])>,
}

impl GpsTags {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            altitude: None,
            timestamp: None,
        }
    }

    #[must_use]
    pub fn altitude(mut self, metres: f64) -> Self {
        self.altitude = Some(metres);
        self
    }

    #[must_use]
    pub fn timestamp(mut self, date: &str, hms: [f64; 3]) -> Self {
        self.timestamp = Some((date.to_string(), hms));
        self
    }

    /// EXIF fields for this tag set.
    pub fn fields(&self) -> Vec<Field> {
        let mut fields = vec![
            gps(Tag::GPSLatitudeRef, ascii(if self.latitude < 0.0 { "S" } else { "N" })),
            gps(Tag::GPSLatitude, Value::Rational(to_dms(self.latitude))),
            gps(Tag::GPSLongitudeRef, ascii(if self.longitude < 0.0 { "W" } else { "E" })),
            gps(Tag::GPSLongitude, Value::Rational(to_dms(self.longitude))),
        ];

        if let Some(alt) = self.altitude {
            fields.push(gps(Tag::GPSAltitudeRef, Value::Byte(vec![u8::from(alt < 0.0)])));
            fields.push(gps(Tag::GPSAltitude, Value::Rational(vec![thousandths(alt.abs())])));
        }

        if let Some((date, [h, m, s])) = &self.timestamp {
            fields.push(gps(Tag::GPSDateStamp, ascii(date)));
            fields.push(gps(
                Tag::GPSTimeStamp,
                Value::Rational(vec![thousandths(*h), thousandths(*m), thousandths(*s)]),
            ));
        }

        fields
    }

    /// Splice these tags into `jpeg`.
    pub fn embed(&self, jpeg: &[u8]) -> Result<Vec<u8>, exif::Error> {
        embed_exif(jpeg, &self.fields())
    }
}

/// Insert an APP1 `Exif` segment carrying `fields` right after the SOI marker.
pub fn embed_exif(jpeg: &[u8], fields: &[Field]) -> Result<Vec<u8>, exif::Error> {
    let software = Field {
        tag: Tag::Software,
        ifd_num: In::PRIMARY,
        value: ascii("photopost fixtures"),
    };
    let mut writer = Writer::new();
    writer.push_field(&software);
    for field in fields {
        writer.push_field(field);
    }
    let mut tiff = Cursor::new(Vec::new());
    writer.write(&mut tiff, false)?;
    let tiff = tiff.into_inner();

    let segment_len = u16::try_from(2 + 6 + tiff.len())
        .map_err(|_| exif::Error::TooBig("EXIF segment exceeds 64 KiB"))?;

    let mut out = Vec::with_capacity(jpeg.len() + tiff.len() + 10);
    out.extend_from_slice(&jpeg[..2.min(jpeg.len())]);
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&segment_len.to_be_bytes());
    out.extend_from_slice(b"Exif\0\0");
    out.extend_from_slice(&tiff);
    out.extend_from_slice(jpeg.get(2..).unwrap_or_default());
    Ok(out)
}

fn gps(tag: Tag, value: Value) -> Field {
    Field {
        tag,
        ifd_num: In::PRIMARY,
        value,
    }
}

fn ascii(text: &str) -> Value {
    Value::Ascii(vec![text.as_bytes().to_vec()])
}

fn thousandths(value: f64) -> Rational {
    Rational {
        num: (value * 1000.0).round() as u32,
        denom: 1000,
    }
}

fn to_dms(decimal: f64) -> Vec<Rational> {
    let abs = decimal.abs();
    let degrees = abs.trunc();
    let minutes = ((abs - degrees) * 60.0).trunc();
    let seconds = (abs - degrees - minutes / 60.0) * 3600.0;

    vec![
        Rational { num: degrees as u32, denom: 1 },
        Rational { num: minutes as u32, denom: 1 },
        thousandths(seconds.max(0.0)),
    ]
}

/// A small JPEG without any metadata.
#[cfg(test)]
pub fn plain_jpeg() -> Vec<u8> {
    let img = image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(64, 48, image::Rgb([120, 160, 90])));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageOutputFormat::Jpeg(85)).unwrap();
    out.into_inner()
}
