//! Parameter types for compositing operations.
//!
//! These structs describe *what* to paint, not *how*. They are built once
//! from the validated [`GeneratorConfig`](crate::config::GeneratorConfig) by
//! [`CompositingOptions::from_config`] and [`CardOptions::from_config`]; no
//! other code reads raw config values for compositing.
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality (1–100, default 90). Clamped on construction.
//! - [`CompositingOptions`]: Crop, grayscale, overlay and frame stages for a downloaded image.
//! - [`CardOptions`]: Canvas size and colors for the fallback card.

use crate::color::parse_hex;
use crate::config::{ConfigError, GeneratorConfig};
use image::Rgb;

pub const MIN_FONT_SIZE: f32 = 10.0;
pub const MAX_FONT_SIZE: f32 = 200.0;
pub const MAX_FRAME_WIDTH: u32 = 100;
pub const MAX_FRAME_MARGIN: u32 = 500;
/// Largest width or height of a canvas the compositor will allocate.
pub const MAX_CANVAS_SIDE: u32 = 8192;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// Darkening rectangle plus title text.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayOptions {
    pub enabled: bool,
    pub background: Rgb<u8>,
    /// 0 = invisible, 100 = solid.
    pub opacity: u8,
    pub text_color: Rgb<u8>,
    pub font: String,
    pub font_size: f32,
}

/// Rectangular stroke inset from the canvas edges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameOptions {
    pub enabled: bool,
    pub color: Rgb<u8>,
    pub width: u32,
    pub margin: u32,
}

/// Center crop to an exact output size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropOptions {
    pub enabled: bool,
    pub width: u32,
    pub height: u32,
}

/// Full compositing pipeline description for one image.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositingOptions {
    pub crop: CropOptions,
    pub grayscale: bool,
    pub overlay: OverlayOptions,
    pub frame: FrameOptions,
    pub quality: Quality,
}

impl CompositingOptions {
    /// Whether any stage would touch the image.
    pub fn any_enabled(&self) -> bool {
        self.crop.enabled || self.grayscale || self.overlay.enabled || self.frame.enabled
    }

    pub fn from_config(config: &GeneratorConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            crop: CropOptions {
                enabled: config.crop.enabled,
                width: config.crop.width.clamp(1, MAX_CANVAS_SIDE),
                height: config.crop.height.clamp(1, MAX_CANVAS_SIDE),
            },
            grayscale: config.effects.grayscale,
            overlay: OverlayOptions {
                enabled: config.overlay.enabled,
                background: parse_color("overlay.background", &config.overlay.background)?,
                opacity: config.overlay.opacity.min(100) as u8,
                text_color: parse_color("overlay.text_color", &config.overlay.text_color)?,
                font: config.overlay.font.clone(),
                font_size: clamp_font_size(config.overlay.font_size),
            },
            frame: FrameOptions {
                enabled: config.frame.enabled,
                color: parse_color("frame.color", &config.frame.color)?,
                width: config.frame.width.clamp(1, MAX_FRAME_WIDTH),
                margin: config.frame.margin.min(MAX_FRAME_MARGIN),
            },
            quality: Quality::new(config.output.quality),
        })
    }
}

/// Flat-color card drawn when no downloaded image qualifies.
#[derive(Debug, Clone, PartialEq)]
pub struct CardOptions {
    pub width: u32,
    pub height: u32,
    pub background: Rgb<u8>,
    pub text_color: Rgb<u8>,
    pub font: String,
    pub font_size: f32,
}

impl CardOptions {
    pub fn from_config(config: &GeneratorConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            width: config.fallback.width.clamp(1, MAX_CANVAS_SIDE),
            height: config.fallback.height.clamp(1, MAX_CANVAS_SIDE),
            background: parse_color("fallback.background", &config.fallback.background)?,
            text_color: parse_color("fallback.text_color", &config.fallback.text_color)?,
            font: config.fallback.font.clone(),
            font_size: clamp_font_size(config.fallback.font_size),
        })
    }
}

pub fn clamp_font_size(size: f32) -> f32 {
    if size.is_nan() {
        return MIN_FONT_SIZE;
    }
    size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE)
}

fn parse_color(key: &str, value: &str) -> Result<Rgb<u8>, ConfigError> {
    parse_hex(value).map_err(|e| ConfigError::Validation(format!("{key}: {e}")))
}
