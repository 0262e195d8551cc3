//! Pure calculation functions for compositing geometry.
//!
//! All functions here are pure and testable without any I/O or images.

/// Source rectangle to cut out of an image before resampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropWindow {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Calculate the centered crop window that matches the target aspect ratio.
///
/// The window always lies inside the source: a source wider than the target
/// loses columns on both sides, a taller one loses rows top and bottom. The
/// window is never padded.
///
/// # Arguments
/// * `source` - Original image dimensions (width, height)
/// * `target` - Output dimensions (width, height), both non-zero
///
/// # Examples
/// ```
/// # use featured_thumb::imaging::calculate_crop_window;
/// // 2000x1000 into 1200x630: full height, 1905px wide, centered
/// let w = calculate_crop_window((2000, 1000), (1200, 630));
/// assert_eq!((w.x, w.y, w.width, w.height), (47, 0, 1905, 1000));
/// ```
pub fn calculate_crop_window(source: (u32, u32), target: (u32, u32)) -> CropWindow {
    let (src_w, src_h) = source;
    let (tgt_w, tgt_h) = target;

    let src_aspect = src_w as f64 / src_h as f64;
    let tgt_aspect = tgt_w as f64 / tgt_h as f64;

    if src_aspect > tgt_aspect {
        // Source is wider: keep full height, trim width
        let width = ((src_h as f64 * tgt_aspect).round() as u32).clamp(1, src_w);
        CropWindow {
            x: (src_w - width) / 2,
            y: 0,
            width,
            height: src_h,
        }
    } else {
        // Source is taller (or equal): keep full width, trim height
        let height = ((src_w as f64 / tgt_aspect).round() as u32).clamp(1, src_h);
        CropWindow {
            x: 0,
            y: (src_h - height) / 2,
            width: src_w,
            height,
        }
    }
}

/// Byte length of an RGB8 buffer of the given size, or `None` when a side is
/// zero, exceeds `max_side`, or the length overflows `usize`.
pub fn rgb_buffer_len(width: u32, height: u32, max_side: u32) -> Option<usize> {
    if width == 0 || height == 0 || width > max_side || height > max_side {
        return None;
    }
    (width as usize).checked_mul(height as usize)?.checked_mul(3)
}

/// Maximum value of the 7-bit alpha scale used for overlay paint.
pub const ALPHA_TRANSPARENT: u8 = 127;

/// Map an overlay opacity percentage to the 7-bit alpha scale.
///
/// 0 is fully opaque, 127 fully transparent. Higher opacity settings give
/// lower alpha values, i.e. more opaque paint.
///
/// ```
/// # use featured_thumb::imaging::overlay_alpha;
/// assert_eq!(overlay_alpha(0), 127);
/// assert_eq!(overlay_alpha(100), 0);
/// assert_eq!(overlay_alpha(50), 64);
/// ```
pub fn overlay_alpha(opacity_pct: u8) -> u8 {
    let opacity = opacity_pct.min(100);
    ((100 - opacity) as f64 * 1.27).round() as u8
}

/// Fraction of the paint color that ends up in a pixel for a 7-bit alpha.
pub fn paint_coverage(alpha: u8) -> f32 {
    let alpha = alpha.min(ALPHA_TRANSPARENT);
    (ALPHA_TRANSPARENT - alpha) as f32 / ALPHA_TRANSPARENT as f32
}

/// Blend one channel of `paint` over `base` at the given coverage (0.0–1.0).
pub fn blend_channel(base: u8, paint: u8, coverage: f32) -> u8 {
    (paint as f32 * coverage + base as f32 * (1.0 - coverage))
        .round()
        .clamp(0.0, 255.0) as u8
}

/// Height of one text line: 1.5× the font size.
pub fn line_height(font_size: f32) -> f32 {
    font_size * 1.5
}

/// Top edge of a text block of `line_count` lines, vertically centered.
///
/// Can be negative when the block is taller than the canvas; drawing clips.
pub fn text_block_top(canvas_height: u32, line_count: usize, font_size: f32) -> f32 {
    let block_height = line_count as f32 * line_height(font_size);
    (canvas_height as f32 - block_height) / 2.0
}

/// Left edge of a line of measured width, horizontally centered.
pub fn centered_x(canvas_width: u32, line_width: f32) -> f32 {
    (canvas_width as f32 - line_width) / 2.0
}

/// Maximum rendered width of one wrapped line: 80% of the canvas.
pub fn max_line_width(canvas_width: u32) -> f32 {
    canvas_width as f32 * 0.8
}

/// Outer rectangle of a frame stroke, inclusive pixel corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRect {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

/// Calculate the outer edge of a frame inset by `margin` on every side.
///
/// Returns `None` when the margin leaves no room to draw anything.
pub fn calculate_frame_rect(canvas: (u32, u32), margin: u32) -> Option<FrameRect> {
    let (w, h) = canvas;
    if w == 0 || h == 0 || margin.saturating_mul(2) >= w || margin.saturating_mul(2) >= h {
        return None;
    }
    Some(FrameRect {
        left: margin,
        top: margin,
        right: w - 1 - margin,
        bottom: h - 1 - margin,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // calculate_crop_window tests
    // =========================================================================

    #[test]
    fn crop_wide_source_trims_width_centered() {
        let w = calculate_crop_window((2000, 1000), (1200, 630));
        assert!(w.width < 2000);
        assert_eq!(w.height, 1000);
        assert_eq!(w.y, 0);
        assert_eq!(w.x, (2000 - w.width) / 2);
    }

    #[test]
    fn crop_tall_source_trims_height_centered() {
        // 1000x2000 into 1200x630 → width kept, height = 1000 / (1200/630) = 525
        let w = calculate_crop_window((1000, 2000), (1200, 630));
        assert_eq!(w.width, 1000);
        assert_eq!(w.height, 525);
        assert_eq!(w.x, 0);
        assert_eq!(w.y, (2000 - 525) / 2);
    }

    #[test]
    fn crop_same_aspect_keeps_everything() {
        let w = calculate_crop_window((2400, 1260), (1200, 630));
        assert_eq!(
            w,
            CropWindow {
                x: 0,
                y: 0,
                width: 2400,
                height: 1260
            }
        );
    }

    #[test]
    fn crop_window_matches_target_aspect() {
        for source in [(3000, 1000), (640, 480), (500, 900), (1234, 567)] {
            let w = calculate_crop_window(source, (1200, 630));
            let aspect = w.width as f64 / w.height as f64;
            assert!(
                (aspect - 1200.0 / 630.0).abs() < 0.01,
                "{source:?} -> {w:?} has aspect {aspect}"
            );
        }
    }

    #[test]
    fn crop_square_target_from_landscape() {
        let w = calculate_crop_window((800, 600), (300, 300));
        assert_eq!((w.x, w.y, w.width, w.height), (100, 0, 600, 600));
    }

    #[test]
    fn crop_tiny_source_never_zero() {
        let w = calculate_crop_window((1, 1000), (1000, 1));
        assert!(w.width >= 1 && w.height >= 1);
    }

    // =========================================================================
    // Overlay alpha tests
    // =========================================================================

    #[test]
    fn overlay_alpha_bounds() {
        assert_eq!(overlay_alpha(0), ALPHA_TRANSPARENT);
        assert_eq!(overlay_alpha(100), 0);
    }

    #[test]
    fn overlay_alpha_clamps_above_100() {
        assert_eq!(overlay_alpha(250), 0);
    }

    #[test]
    fn overlay_alpha_is_monotonic() {
        let mut previous = overlay_alpha(0);
        for opacity in 1..=100 {
            let alpha = overlay_alpha(opacity);
            assert!(alpha <= previous, "alpha rose at opacity {opacity}");
            previous = alpha;
        }
    }

    #[test]
    fn coverage_bounds() {
        assert_eq!(paint_coverage(overlay_alpha(0)), 0.0);
        assert_eq!(paint_coverage(overlay_alpha(100)), 1.0);
    }

    #[test]
    fn coverage_interpolates_linearly() {
        let half = paint_coverage(overlay_alpha(50));
        assert!((half - 0.5).abs() < 0.01, "got {half}");
        let quarter = paint_coverage(overlay_alpha(25));
        assert!((quarter - 0.25).abs() < 0.01, "got {quarter}");
    }

    #[test]
    fn blend_channel_extremes() {
        assert_eq!(blend_channel(200, 0, 0.0), 200);
        assert_eq!(blend_channel(200, 0, 1.0), 0);
        assert_eq!(blend_channel(200, 0, 0.5), 100);
    }

    // =========================================================================
    // Text placement tests
    // =========================================================================

    #[test]
    fn text_block_centered_vertically() {
        // 2 lines of 40px → block 120px in a 630px canvas
        assert_eq!(text_block_top(630, 2, 40.0), 255.0);
    }

    #[test]
    fn text_block_taller_than_canvas_goes_negative() {
        assert!(text_block_top(100, 10, 40.0) < 0.0);
    }

    #[test]
    fn line_centered_horizontally() {
        assert_eq!(centered_x(1200, 400.0), 400.0);
    }

    #[test]
    fn max_line_width_is_eighty_percent() {
        assert_eq!(max_line_width(1000), 800.0);
    }

    // =========================================================================
    // Frame tests
    // =========================================================================

    #[test]
    fn frame_rect_inset_by_margin() {
        assert_eq!(
            calculate_frame_rect((1200, 630), 20),
            Some(FrameRect {
                left: 20,
                top: 20,
                right: 1179,
                bottom: 609
            })
        );
    }

    #[test]
    fn frame_rect_zero_margin_hugs_edges() {
        let r = calculate_frame_rect((10, 10), 0).unwrap();
        assert_eq!((r.left, r.top, r.right, r.bottom), (0, 0, 9, 9));
    }

    #[test]
    fn frame_rect_margin_too_large() {
        assert_eq!(calculate_frame_rect((100, 40), 20), None);
    }

    // =========================================================================
    // rgb_buffer_len tests
    // =========================================================================

    #[test]
    fn buffer_len_for_normal_canvas() {
        assert_eq!(rgb_buffer_len(1200, 630, 8192), Some(1200 * 630 * 3));
    }

    #[test]
    fn buffer_len_rejects_zero_and_oversized() {
        assert_eq!(rgb_buffer_len(0, 630, 8192), None);
        assert_eq!(rgb_buffer_len(8193, 10, 8192), None);
        assert_eq!(rgb_buffer_len(u32::MAX, u32::MAX, u32::MAX), None);
    }
}
