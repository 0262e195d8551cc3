//! Fallback card: a flat-color canvas with the title on it.
//!
//! Shares the grayscale, frame and title stages with the
//! [compositor](super::compositor) so a card looks like a composited image
//! without the photo. There is no darkening rectangle; the background is
//! already flat.

use super::compositor::{
    Composited, CompositeError, apply_grayscale, check_canvas, draw_frame, finish, render_title,
};
use super::params::{CardOptions, CompositingOptions};
use crate::fonts::FontResolver;
use image::RgbImage;

/// Build and encode a fallback card for `title`.
///
/// Grayscale and frame settings come from `effects`, so cards follow the same
/// look as composited photos. A missing font renders a diagnostic naming it.
pub fn generate_card(
    title: &str,
    card: &CardOptions,
    effects: &CompositingOptions,
    fonts: &FontResolver,
) -> Result<Composited, CompositeError> {
    check_canvas(card.width, card.height)?;
    let mut canvas = RgbImage::from_pixel(card.width, card.height, card.background);

    if effects.grayscale {
        apply_grayscale(&mut canvas);
    }
    if effects.frame.enabled {
        draw_frame(&mut canvas, &effects.frame);
    }

    let rendered = render_title(
        &mut canvas,
        fonts,
        title,
        &card.font,
        card.font_size,
        card.text_color,
    );

    finish(canvas, effects.quality, rendered)
}
