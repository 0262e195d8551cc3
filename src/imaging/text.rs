//! Title layout and text drawing.
//!
//! Layout is renderer-agnostic: [`wrap_words`] only needs a measuring
//! function, and [`draw_centered_block`] works with anything implementing
//! [`LineRenderer`]. Two renderers exist:
//!
//! - [`OutlineText`]: a TrueType font through `rusttype`, anti-aliased.
//! - [`BitmapText`]: the built-in 5×7 glyphs, for diagnostics when the
//!   configured font is missing.

use super::bitmap_font::{GLYPH_ADVANCE, GLYPH_HEIGHT, GLYPH_WIDTH, is_lit};
use super::calculations::{
    blend_channel, centered_x, line_height, max_line_width, text_block_top,
};
use image::{Rgb, RgbImage};
use rusttype::{Font, Scale, point};

/// Something that can measure and paint a single line of text.
pub trait LineRenderer {
    /// Rendered width of `text` in pixels.
    fn measure(&self, text: &str) -> f32;

    /// Height of the glyph box (ascender to descender).
    fn glyph_height(&self) -> f32;

    /// Paint `text` with its glyph box starting at (`left`, `top`).
    fn draw(&self, canvas: &mut RgbImage, left: f32, top: f32, color: Rgb<u8>, text: &str);
}

/// Greedy word wrap.
///
/// Words are appended to the current line while the measured width of the
/// candidate line stays within `max_width`; otherwise a new line starts. A
/// single word wider than `max_width` gets a line of its own and is never
/// split.
pub fn wrap_words(text: &str, max_width: f32, measure: impl Fn(&str) -> f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
            continue;
        }
        let candidate = format!("{current} {word}");
        if measure(&candidate) <= max_width {
            current = candidate;
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Wrap `text` to 80% of the canvas width and draw it as a block centered
/// both ways, each line centered on its own measured width.
///
/// `font_size` drives the line pitch (1.5× font size). Returns the lines as
/// laid out.
pub fn draw_centered_block(
    canvas: &mut RgbImage,
    renderer: &impl LineRenderer,
    text: &str,
    font_size: f32,
    color: Rgb<u8>,
) -> Vec<String> {
    let (width, height) = canvas.dimensions();
    let lines = wrap_words(text, max_line_width(width), |line| renderer.measure(line));

    let pitch = line_height(font_size);
    let block_top = text_block_top(height, lines.len(), font_size);
    let inset = (pitch - renderer.glyph_height()) / 2.0;

    for (i, line) in lines.iter().enumerate() {
        let left = centered_x(width, renderer.measure(line));
        let top = block_top + i as f32 * pitch + inset;
        renderer.draw(canvas, left, top, color, line);
    }
    lines
}

/// Blend `color` into the pixel at (`x`, `y`) with `coverage`, clipping to
/// the canvas.
fn blend_pixel(canvas: &mut RgbImage, x: i64, y: i64, color: Rgb<u8>, coverage: f32) {
    if x < 0 || y < 0 || x >= canvas.width() as i64 || y >= canvas.height() as i64 {
        return;
    }
    let dst = canvas.get_pixel_mut(x as u32, y as u32);
    for c in 0..3 {
        dst.0[c] = blend_channel(dst.0[c], color.0[c], coverage);
    }
}

// ============================================================================
// Outline font renderer
// ============================================================================

/// TrueType text at a fixed pixel size.
pub struct OutlineText<'f> {
    font: &'f Font<'static>,
    scale: Scale,
}

impl<'f> OutlineText<'f> {
    pub fn new(font: &'f Font<'static>, px: f32) -> Self {
        Self {
            font,
            scale: Scale::uniform(px),
        }
    }
}

impl LineRenderer for OutlineText<'_> {
    fn measure(&self, text: &str) -> f32 {
        if text.is_empty() {
            return 0.0;
        }
        let ascent = self.font.v_metrics(self.scale).ascent;
        self.font
            .layout(text, self.scale, point(0.0, ascent))
            .filter_map(|g| g.pixel_bounding_box())
            .map(|bb| bb.max.x as f32)
            .fold(0.0, f32::max)
    }

    fn glyph_height(&self) -> f32 {
        let v = self.font.v_metrics(self.scale);
        (v.ascent - v.descent).max(1.0)
    }

    fn draw(&self, canvas: &mut RgbImage, left: f32, top: f32, color: Rgb<u8>, text: &str) {
        let baseline = top + self.font.v_metrics(self.scale).ascent;
        for glyph in self.font.layout(text, self.scale, point(left, baseline)) {
            let Some(bb) = glyph.pixel_bounding_box() else {
                continue;
            };
            glyph.draw(|gx, gy, v| {
                if v <= 0.0 {
                    return;
                }
                let x = gx as i64 + bb.min.x as i64;
                let y = gy as i64 + bb.min.y as i64;
                blend_pixel(canvas, x, y, color, v.min(1.0));
            });
        }
    }
}

// ============================================================================
// Bitmap renderer
// ============================================================================

/// Built-in block glyphs scaled by an integer factor.
#[derive(Debug, Clone, Copy)]
pub struct BitmapText {
    pixel: u32,
}

impl BitmapText {
    pub fn new(pixel: u32) -> Self {
        Self {
            pixel: pixel.max(1),
        }
    }

    /// Pick a glyph scale readable on a canvas of the given width.
    pub fn for_canvas(canvas_width: u32) -> Self {
        Self::new((canvas_width / 300).max(2))
    }

    /// Nominal font size for layout purposes (the glyph box height).
    pub fn font_size(&self) -> f32 {
        (GLYPH_HEIGHT * self.pixel) as f32
    }
}

impl LineRenderer for BitmapText {
    fn measure(&self, text: &str) -> f32 {
        let chars = text.chars().count() as u32;
        if chars == 0 {
            return 0.0;
        }
        ((chars * GLYPH_ADVANCE - 1) * self.pixel) as f32
    }

    fn glyph_height(&self) -> f32 {
        self.font_size()
    }

    fn draw(&self, canvas: &mut RgbImage, left: f32, top: f32, color: Rgb<u8>, text: &str) {
        let origin_x = left.round() as i64;
        let origin_y = top.round() as i64;
        let px = self.pixel as i64;

        for (i, c) in text.chars().enumerate() {
            let cell_x = origin_x + i as i64 * (GLYPH_ADVANCE as i64) * px;
            for gy in 0..GLYPH_HEIGHT {
                for gx in 0..GLYPH_WIDTH {
                    if !is_lit(c, gx, gy) {
                        continue;
                    }
                    for dy in 0..px {
                        for dx in 0..px {
                            blend_pixel(
                                canvas,
                                cell_x + gx as i64 * px + dx,
                                origin_y + gy as i64 * px + dy,
                                color,
                                1.0,
                            );
                        }
                    }
                }
            }
        }
    }
}
