use std::sync::OnceLock;

use regex::Regex;

fn decimal_pair() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(-?\d+\.\d+)°\s*([NS])\s+(-?\d+\.\d+)°\s*([EW])")
            .expect("valid coordinate pattern")
    })
}

/// Pulls a decimal-degree coordinate pair out of free text.
///
/// Wikipedia's `geo-inline` span usually carries three renderings of the same
/// point (`45°25′N 75°41′W / 45.4256°N 75.6950°W / 45.4256; -75.6950`); the first
/// `<decimal>°N|S <decimal>°E|W` pair wins. Digits are kept verbatim and the
/// cardinal letter only decides the sign, so southern latitudes and western
/// longitudes come back negative.
///
/// Returns `None` when no pair is present, including for text that is already in
/// the normalized `"<lat>; <lon>"` form.
///
/// ```
/// use hotel_parser::parse_coordinates;
///
/// assert_eq!(
///     parse_coordinates("45.1234°N 75.5678°W").as_deref(),
///     Some("45.1234; -75.5678")
/// );
/// assert_eq!(parse_coordinates("45.1234; -75.5678"), None);
/// ```
pub fn parse_coordinates(text: &str) -> Option<String> {
    let captures = decimal_pair().captures(text)?;
    let latitude = signed(&captures[1], &captures[2] == "S");
    let longitude = signed(&captures[3], &captures[4] == "W");
    Some(format!("{latitude}; {longitude}"))
}

fn signed(value: &str, negative: bool) -> String {
    let magnitude = value.trim_start_matches('-');
    if negative {
        format!("-{magnitude}")
    } else {
        magnitude.to_string()
    }
}

/// Parses the normalized `"<lat>; <lon>"` form into numbers.
pub fn parse_coordinate_pair(text: &str) -> Option<(f64, f64)> {
    let mut parts = text.split(';');
    let latitude = parts.next()?.trim();
    let longitude = parts.next()?.trim();
    if parts.next().is_some() || latitude.is_empty() || longitude.is_empty() {
        return None;
    }
    Some((latitude.parse().ok()?, longitude.parse().ok()?))
}
