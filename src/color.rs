//! Hex color parsing.
//!
//! Config files carry colors as CSS-style hex strings. Both the short form
//! (`#fff`) and the long form (`#ffffff`) are accepted, with or without the
//! leading `#`. Anything else is rejected so a typo surfaces during config
//! validation instead of as a black overlay.

use image::Rgb;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ColorError {
    #[error("invalid hex color '{0}': expected 3 or 6 hex digits")]
    InvalidHex(String),
}

/// Parse a 3- or 6-digit hex string into an RGB triple.
///
/// ```
/// # use featured_thumb::color::parse_hex;
/// assert_eq!(parse_hex("#ff8000").unwrap().0, [255, 128, 0]);
/// assert_eq!(parse_hex("fff").unwrap().0, [255, 255, 255]);
/// ```
pub fn parse_hex(input: &str) -> Result<Rgb<u8>, ColorError> {
    let digits = input.trim().trim_start_matches('#');
    let invalid = || ColorError::InvalidHex(input.to_string());

    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid());
    }

    let expanded: String = match digits.len() {
        3 => digits.chars().flat_map(|c| [c, c]).collect(),
        6 => digits.to_string(),
        _ => return Err(invalid()),
    };

    let channel = |i: usize| u8::from_str_radix(&expanded[i..i + 2], 16).map_err(|_| invalid());
    Ok(Rgb([channel(0)?, channel(2)?, channel(4)?]))
}
