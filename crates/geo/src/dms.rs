//! Sexagesimal geotag conversion.
//!
//! EXIF stores GPS positions as three rationals (degrees, minutes, seconds)
//! plus a hemisphere reference letter kept in a separate tag.

/// Converts a degrees/minutes/seconds triple to signed decimal degrees.
///
/// The result is negated when `reference` is `S` or `W` (case-insensitive).
/// A slice with fewer than three components yields `0.0`, which callers treat
/// as "no usable value" rather than an error. Components past the third are
/// ignored.
///
/// # Example
/// ```
/// use photopost_geo::dms_to_decimal;
///
/// let lat = dms_to_decimal(&[52.0, 22.0, 12.0], 'N');
/// assert!((lat - 52.37).abs() < 1e-9);
///
/// let lon = dms_to_decimal(&[4.0, 53.0, 42.0], 'W');
/// assert!((lon + 4.895).abs() < 1e-9);
/// ```
pub fn dms_to_decimal(components: &[f64], reference: char) -> f64 {
    let [degrees, minutes, seconds, ..] = components else {
        return 0.0;
    };

    let decimal = degrees + minutes / 60.0 + seconds / 3600.0;
    if is_negative_hemisphere(reference) {
        -decimal
    } else {
        decimal
    }
}

/// Returns true for the southern and western hemisphere references.
#[inline]
pub fn is_negative_hemisphere(reference: char) -> bool {
    matches!(reference.to_ascii_uppercase(), 'S' | 'W')
}
