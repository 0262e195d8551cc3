//! Image compositing pipeline.
//!
//! Stages run in a fixed order, each one only when its options enable it:
//!
//! ```text
//! decode → crop-to-target → grayscale → overlay + title → frame → JPEG
//! ```
//!
//! Input can be any raster format the `image` crate decodes (JPEG, PNG, GIF,
//! BMP, WebP); output is always JPEG so storage sees a single type.
//!
//! A missing font never fails the composite: the title is replaced by a
//! diagnostic string drawn with the built-in bitmap glyphs.

use super::calculations::{
    blend_channel, calculate_crop_window, calculate_frame_rect, overlay_alpha, paint_coverage,
    rgb_buffer_len,
};
use super::params::{CompositingOptions, FrameOptions, MAX_CANVAS_SIDE, Quality};
use super::text::{BitmapText, OutlineText, draw_centered_block};
use crate::fonts::{FontError, FontResolver};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, Rgb, RgbImage};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CompositeError {
    #[error("could not decode image: {0}")]
    Decode(#[source] image::ImageError),
    #[error("could not encode image: {0}")]
    Encode(#[source] image::ImageError),
    #[error("canvas {width}x{height} is empty or larger than {max} per side", max = MAX_CANVAS_SIDE)]
    Canvas { width: u32, height: u32 },
}

/// How the title ended up on the canvas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TitleRender {
    /// Overlay disabled, no text drawn.
    Skipped,
    /// Title drawn with the configured font, as these lines.
    Title(Vec<String>),
    /// Font unavailable; this message was drawn instead.
    Diagnostic(String),
}

/// Encoded output of a compositing run.
#[derive(Debug, Clone)]
pub struct Composited {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub title: TitleRender,
}

/// Runs the compositing pipeline. Holds the font directory; images are
/// owned per call.
#[derive(Debug, Clone)]
pub struct Compositor {
    fonts: FontResolver,
}

impl Compositor {
    pub fn new(fonts: FontResolver) -> Self {
        Self { fonts }
    }

    pub fn fonts(&self) -> &FontResolver {
        &self.fonts
    }

    /// Decode `bytes`, apply the enabled stages, re-encode as JPEG.
    pub fn composite(
        &self,
        bytes: &[u8],
        title: &str,
        options: &CompositingOptions,
    ) -> Result<Composited, CompositeError> {
        let decoded = image::load_from_memory(bytes).map_err(CompositeError::Decode)?;

        let mut canvas = if options.crop.enabled {
            check_canvas(options.crop.width, options.crop.height)?;
            crop_to_target(&decoded, options.crop.width, options.crop.height)
        } else {
            decoded.to_rgb8()
        };

        if options.grayscale {
            apply_grayscale(&mut canvas);
        }

        let title = if options.overlay.enabled {
            paint_overlay(&mut canvas, options.overlay.background, options.overlay.opacity);
            render_title(
                &mut canvas,
                &self.fonts,
                title,
                &options.overlay.font,
                options.overlay.font_size,
                options.overlay.text_color,
            )
        } else {
            TitleRender::Skipped
        };

        if options.frame.enabled {
            draw_frame(&mut canvas, &options.frame);
        }

        finish(canvas, options.quality, title)
    }
}

/// Check that `bytes` decode as a supported raster image and return its
/// dimensions.
pub fn probe(bytes: &[u8]) -> Result<(u32, u32), CompositeError> {
    let decoded = image::load_from_memory(bytes).map_err(CompositeError::Decode)?;
    Ok((decoded.width(), decoded.height()))
}

/// Refuse canvas sizes that cannot or should not be allocated.
pub fn check_canvas(width: u32, height: u32) -> Result<(), CompositeError> {
    match rgb_buffer_len(width, height, MAX_CANVAS_SIDE) {
        Some(_) => Ok(()),
        None => Err(CompositeError::Canvas { width, height }),
    }
}

/// Encode the canvas and package the result.
pub(super) fn finish(
    canvas: RgbImage,
    quality: Quality,
    title: TitleRender,
) -> Result<Composited, CompositeError> {
    let (width, height) = canvas.dimensions();
    let bytes = encode_jpeg(&canvas, quality)?;
    Ok(Composited {
        bytes,
        width,
        height,
        title,
    })
}

/// Center-crop to the target aspect ratio, then resample to exactly
/// `width` × `height`.
pub fn crop_to_target(image: &DynamicImage, width: u32, height: u32) -> RgbImage {
    let window = calculate_crop_window((image.width(), image.height()), (width, height));
    image
        .crop_imm(window.x, window.y, window.width, window.height)
        .resize_exact(width, height, FilterType::Lanczos3)
        .to_rgb8()
}

/// Replace every pixel with its luminance.
pub fn apply_grayscale(canvas: &mut RgbImage) {
    let gray = image::imageops::grayscale(&*canvas);
    for (dst, luma) in canvas.pixels_mut().zip(gray.pixels()) {
        dst.0 = [luma.0[0]; 3];
    }
}

/// Paint `color` over the whole canvas at the given opacity percentage.
pub fn paint_overlay(canvas: &mut RgbImage, color: Rgb<u8>, opacity: u8) {
    let coverage = paint_coverage(overlay_alpha(opacity));
    if coverage <= 0.0 {
        return;
    }
    for pixel in canvas.pixels_mut() {
        for c in 0..3 {
            pixel.0[c] = blend_channel(pixel.0[c], color.0[c], coverage);
        }
    }
}

/// Stroke a rectangle inset by `frame.margin`, `frame.width` pixels thick,
/// growing inwards.
pub fn draw_frame(canvas: &mut RgbImage, frame: &FrameOptions) {
    let dims = canvas.dimensions();
    for ring in 0..frame.width {
        let Some(rect) = calculate_frame_rect(dims, frame.margin + ring) else {
            break;
        };
        for x in rect.left..=rect.right {
            canvas.put_pixel(x, rect.top, frame.color);
            canvas.put_pixel(x, rect.bottom, frame.color);
        }
        for y in rect.top..=rect.bottom {
            canvas.put_pixel(rect.left, y, frame.color);
            canvas.put_pixel(rect.right, y, frame.color);
        }
    }
}

/// Draw `title` centered and wrapped with the named font, or a diagnostic
/// naming the font when it cannot be loaded.
pub fn render_title(
    canvas: &mut RgbImage,
    fonts: &FontResolver,
    title: &str,
    font_name: &str,
    font_size: f32,
    color: Rgb<u8>,
) -> TitleRender {
    match fonts.load(font_name) {
        Ok(font) => {
            let renderer = OutlineText::new(&font, font_size);
            TitleRender::Title(draw_centered_block(canvas, &renderer, title, font_size, color))
        }
        Err(err) => {
            let message = diagnostic_message(font_name, &err);
            log::warn!("{message}: {err}");
            let renderer = BitmapText::for_canvas(canvas.width());
            draw_centered_block(canvas, &renderer, &message, renderer.font_size(), color);
            TitleRender::Diagnostic(message)
        }
    }
}

fn diagnostic_message(font_name: &str, err: &FontError) -> String {
    match err {
        FontError::NotFound { .. } => format!("Font '{font_name}' not found"),
        FontError::Io(_) | FontError::Invalid(_) => format!("Font '{font_name}' unreadable"),
    }
}

/// Encode as baseline JPEG.
pub fn encode_jpeg(canvas: &RgbImage, quality: Quality) -> Result<Vec<u8>, CompositeError> {
    let mut bytes = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut bytes, quality.value() as u8);
    canvas
        .write_with_encoder(encoder)
        .map_err(CompositeError::Encode)?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::params::{CropOptions, OverlayOptions};
    use image::ImageFormat;
    use tempfile::TempDir;

    fn options() -> CompositingOptions {
        CompositingOptions {
            crop: CropOptions {
                enabled: false,
                width: 1200,
                height: 630,
            },
            grayscale: false,
            overlay: OverlayOptions {
                enabled: false,
                background: Rgb([0, 0, 0]),
                opacity: 50,
                text_color: Rgb([255, 255, 255]),
                font: "Missing".into(),
                font_size: 40.0,
            },
            frame: FrameOptions {
                enabled: false,
                color: Rgb([255, 0, 0]),
                width: 3,
                margin: 5,
            },
            quality: Quality::default(),
        }
    }

    fn png_bytes(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb(color));
        let mut bytes = std::io::Cursor::new(Vec::new());
        img.write_to(&mut bytes, ImageFormat::Png).unwrap();
        bytes.into_inner()
    }

    fn decode(bytes: &[u8]) -> RgbImage {
        image::load_from_memory(bytes).unwrap().to_rgb8()
    }

    fn compositor() -> (TempDir, Compositor) {
        let tmp = TempDir::new().unwrap();
        let compositor = Compositor::new(FontResolver::new(tmp.path()));
        (tmp, compositor)
    }

    // =========================================================================
    // Pipeline tests
    // =========================================================================

    #[test]
    fn undecodable_input_fails() {
        let (_tmp, c) = compositor();
        let err = c.composite(b"<html>nope</html>", "t", &options()).unwrap_err();
        assert!(matches!(err, CompositeError::Decode(_)));
    }

    #[test]
    fn output_is_always_jpeg() {
        let (_tmp, c) = compositor();
        let mut opts = options();
        opts.grayscale = true;
        let out = c.composite(&png_bytes(300, 200, [10, 200, 30]), "t", &opts).unwrap();
        assert_eq!(image::guess_format(&out.bytes).unwrap(), ImageFormat::Jpeg);
        assert_eq!((out.width, out.height), (300, 200));
    }

    #[test]
    fn crop_resamples_to_exact_target() {
        let (_tmp, c) = compositor();
        let mut opts = options();
        opts.crop.enabled = true;
        let out = c.composite(&png_bytes(2000, 1000, [90, 90, 90]), "t", &opts).unwrap();
        let img = decode(&out.bytes);
        assert_eq!(img.dimensions(), (1200, 630));
    }

    #[test]
    fn crop_keeps_center_content() {
        // Left half red, right half blue, narrow target: the center column survives
        let src = RgbImage::from_fn(400, 100, |x, _| {
            if x < 200 { Rgb([255, 0, 0]) } else { Rgb([0, 0, 255]) }
        });
        let cropped = crop_to_target(&DynamicImage::ImageRgb8(src), 20, 10);
        assert_eq!(cropped.dimensions(), (20, 10));
        // 400x100 → window 200x100 at x=100: still half red, half blue
        assert!(cropped.get_pixel(2, 5).0[0] > 200);
        assert!(cropped.get_pixel(17, 5).0[2] > 200);
    }

    #[test]
    fn overlay_without_font_draws_diagnostic() {
        let (_tmp, c) = compositor();
        let mut opts = options();
        opts.overlay.enabled = true;
        let out = c.composite(&png_bytes(600, 300, [200, 200, 200]), "Gatos", &opts).unwrap();
        assert_eq!(
            out.title,
            TitleRender::Diagnostic("Font 'Missing' not found".into())
        );
    }

    #[test]
    fn overlay_disabled_skips_title() {
        let (_tmp, c) = compositor();
        let mut opts = options();
        opts.frame.enabled = true;
        let out = c.composite(&png_bytes(100, 100, [0, 0, 0]), "t", &opts).unwrap();
        assert_eq!(out.title, TitleRender::Skipped);
    }

    // =========================================================================
    // Stage tests
    // =========================================================================

    #[test]
    fn grayscale_equalizes_channels() {
        let mut canvas = RgbImage::from_pixel(4, 4, Rgb([200, 50, 10]));
        apply_grayscale(&mut canvas);
        let p = canvas.get_pixel(0, 0).0;
        assert_eq!(p[0], p[1]);
        assert_eq!(p[1], p[2]);
    }

    #[test]
    fn overlay_zero_opacity_is_invisible() {
        let mut canvas = RgbImage::from_pixel(4, 4, Rgb([200, 100, 50]));
        paint_overlay(&mut canvas, Rgb([0, 0, 0]), 0);
        assert_eq!(canvas.get_pixel(1, 1).0, [200, 100, 50]);
    }

    #[test]
    fn overlay_full_opacity_is_solid() {
        let mut canvas = RgbImage::from_pixel(4, 4, Rgb([200, 100, 50]));
        paint_overlay(&mut canvas, Rgb([10, 20, 30]), 100);
        assert_eq!(canvas.get_pixel(3, 3).0, [10, 20, 30]);
    }

    #[test]
    fn overlay_higher_opacity_is_darker() {
        let mut light = RgbImage::from_pixel(2, 2, Rgb([200, 200, 200]));
        let mut dark = light.clone();
        paint_overlay(&mut light, Rgb([0, 0, 0]), 30);
        paint_overlay(&mut dark, Rgb([0, 0, 0]), 70);
        assert!(dark.get_pixel(0, 0).0[0] < light.get_pixel(0, 0).0[0]);
    }

    #[test]
    fn frame_paints_band_inset_by_margin() {
        let mut canvas = RgbImage::from_pixel(50, 40, Rgb([0, 0, 0]));
        let frame = FrameOptions {
            enabled: true,
            color: Rgb([255, 0, 0]),
            width: 2,
            margin: 3,
        };
        draw_frame(&mut canvas, &frame);
        // Outside the margin untouched
        assert_eq!(canvas.get_pixel(2, 2).0, [0, 0, 0]);
        // Both rings of the band painted
        assert_eq!(canvas.get_pixel(3, 20).0, [255, 0, 0]);
        assert_eq!(canvas.get_pixel(4, 20).0, [255, 0, 0]);
        assert_eq!(canvas.get_pixel(46, 20).0, [255, 0, 0]);
        // Interior untouched
        assert_eq!(canvas.get_pixel(5, 20).0, [0, 0, 0]);
        assert_eq!(canvas.get_pixel(25, 20).0, [0, 0, 0]);
    }

    #[test]
    fn frame_wider_than_canvas_stops_cleanly() {
        let mut canvas = RgbImage::from_pixel(10, 10, Rgb([0, 0, 0]));
        let frame = FrameOptions {
            enabled: true,
            color: Rgb([0, 255, 0]),
            width: 100,
            margin: 0,
        };
        draw_frame(&mut canvas, &frame);
        assert_eq!(canvas.get_pixel(4, 4).0, [0, 255, 0]);
    }

    #[test]
    fn encode_jpeg_roundtrips_dimensions() {
        let canvas = RgbImage::from_pixel(33, 17, Rgb([1, 2, 3]));
        let bytes = encode_jpeg(&canvas, Quality::new(90)).unwrap();
        assert_eq!(decode(&bytes).dimensions(), (33, 17));
    }
}
