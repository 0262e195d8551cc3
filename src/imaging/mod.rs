//! Image compositing, pure Rust.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::load_from_memory` (JPEG, PNG, GIF, BMP, WebP) |
//! | **Crop-to-target** | `crop_imm` + Lanczos3 `resize_exact` |
//! | **Grayscale** | `image::imageops::grayscale` |
//! | **Title text** | `rusttype` outline fonts, built-in bitmap glyphs as fallback |
//! | **Encode** | `JpegEncoder` at configured quality |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for geometry and alpha math (unit testable)
//! - **Parameters**: Typed, clamped options built from config
//! - **Text**: Word wrap and line renderers
//! - **Compositor**: The fixed-order pipeline over a downloaded image
//! - **Card**: The fallback card drawn from scratch

mod bitmap_font;
mod calculations;
pub mod card;
pub mod compositor;
mod params;
pub mod text;

pub use calculations::{CropWindow, calculate_crop_window, overlay_alpha};
pub use card::generate_card;
pub use compositor::{Composited, CompositeError, Compositor, TitleRender};
pub use params::{
    CardOptions, CompositingOptions, CropOptions, FrameOptions, MAX_CANVAS_SIDE, OverlayOptions,
    Quality,
};
