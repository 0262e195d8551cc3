//! Generator configuration.
//!
//! Handles loading, validating, and merging `featured-thumb.toml`. Stock
//! defaults are the base layer; the user file overrides whatever it names.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [general]
//! enable = true
//! selection = "first"       # first | best | random
//! language = "es"
//!
//! [search]
//! provider = "scrape"       # scrape | api
//! rights = ""               # fmc | fc | fm | f
//! size = ""                 # l | m | i | lt,islt:svga ...
//! aspect = ""               # w | t | s | xw
//! image_type = ""           # photo | clipart | lineart | face | animated
//! filetype = "all"          # all | jpg | png | gif | bmp | webp
//! blacklist = []
//! timeout_secs = 15
//! head_check = true
//! api_key = ""              # or FEATURED_THUMB_API_KEY
//! api_count = 35
//!
//! [crop]
//! enabled = false
//! width = 1200
//! height = 630
//!
//! [effects]
//! grayscale = false
//!
//! [overlay]
//! enabled = false
//! background = "#000000"
//! opacity = 50
//! text_color = "#ffffff"
//! font = "Roboto"
//! font_size = 48.0
//!
//! [frame]
//! enabled = false
//! color = "#ffffff"
//! width = 5
//! margin = 20
//!
//! [fallback]
//! enabled = true
//! width = 1200
//! height = 630
//! background = "#333333"
//! text_color = "#ffffff"
//! font = "Roboto"
//! font_size = 60.0
//!
//! [fonts]
//! dir = "fonts"
//!
//! [output]
//! dir = "featured"
//! quality = 90
//! log_file = "featured-thumb-log.json"
//! ```
//!
//! Config files are sparse; unknown keys are rejected to catch typos early.

use crate::color::parse_hex;
use crate::http::{DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT};
use crate::imaging::MAX_CANVAS_SIDE;
use crate::search::api::DEFAULT_COUNT;
use crate::search::{ProviderKind, SelectionPolicy};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable consulted when `search.api_key` is empty.
pub const API_KEY_ENV: &str = "FEATURED_THUMB_API_KEY";

/// Config file name used when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "featured-thumb.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Everything the generator reads. One default-construction point per
/// section; components only see validated values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    pub general: GeneralConfig,
    pub search: SearchConfig,
    pub crop: CropConfig,
    pub effects: EffectsConfig,
    pub overlay: OverlayConfig,
    pub frame: FrameConfig,
    pub fallback: FallbackConfig,
    pub fonts: FontsConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneralConfig {
    /// Master switch. When off every run aborts before searching.
    pub enable: bool,
    pub selection: SelectionPolicy,
    /// Interface language passed to the provider.
    pub language: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            enable: true,
            selection: SelectionPolicy::First,
            language: "es".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchConfig {
    pub provider: ProviderKind,
    pub rights: String,
    pub size: String,
    pub aspect: String,
    pub image_type: String,
    pub filetype: String,
    /// Host substrings to exclude.
    pub blacklist: Vec<String>,
    pub timeout_secs: u64,
    pub user_agent: String,
    /// HEAD each candidate before downloading it.
    pub head_check: bool,
    pub api_key: String,
    pub api_count: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Scrape,
            rights: String::new(),
            size: String::new(),
            aspect: String::new(),
            image_type: String::new(),
            filetype: "all".into(),
            blacklist: Vec::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.into(),
            head_check: true,
            api_key: String::new(),
            api_count: DEFAULT_COUNT,
        }
    }
}

impl SearchConfig {
    /// The configured API key, or the one from [`API_KEY_ENV`].
    pub fn resolved_api_key(&self) -> Option<String> {
        let configured = self.api_key.trim();
        if !configured.is_empty() {
            return Some(configured.to_string());
        }
        std::env::var(API_KEY_ENV)
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CropConfig {
    pub enabled: bool,
    pub width: u32,
    pub height: u32,
}

impl Default for CropConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            width: 1200,
            height: 630,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EffectsConfig {
    pub grayscale: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OverlayConfig {
    pub enabled: bool,
    pub background: String,
    /// 0 = invisible, 100 = solid.
    pub opacity: u32,
    pub text_color: String,
    pub font: String,
    pub font_size: f32,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            background: "#000000".into(),
            opacity: 50,
            text_color: "#ffffff".into(),
            font: "Roboto".into(),
            font_size: 48.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FrameConfig {
    pub enabled: bool,
    pub color: String,
    pub width: u32,
    pub margin: u32,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            color: "#ffffff".into(),
            width: 5,
            margin: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FallbackConfig {
    pub enabled: bool,
    pub width: u32,
    pub height: u32,
    pub background: String,
    pub text_color: String,
    pub font: String,
    pub font_size: f32,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            width: 1200,
            height: 630,
            background: "#333333".into(),
            text_color: "#ffffff".into(),
            font: "Roboto".into(),
            font_size: 60.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FontsConfig {
    pub dir: PathBuf,
}

impl Default for FontsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("fonts"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub quality: u32,
    pub log_file: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("featured"),
            quality: 90,
            log_file: PathBuf::from("featured-thumb-log.json"),
        }
    }
}

impl GeneratorConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("overlay.background", &self.overlay.background),
            ("overlay.text_color", &self.overlay.text_color),
            ("frame.color", &self.frame.color),
            ("fallback.background", &self.fallback.background),
            ("fallback.text_color", &self.fallback.text_color),
        ] {
            parse_hex(value).map_err(|e| ConfigError::Validation(format!("{key}: {e}")))?;
        }
        for (section, width, height) in [
            ("crop", self.crop.width, self.crop.height),
            ("fallback", self.fallback.width, self.fallback.height),
        ] {
            let in_range = |side: u32| (1..=MAX_CANVAS_SIDE).contains(&side);
            if !in_range(width) || !in_range(height) {
                return Err(ConfigError::Validation(format!(
                    "{section}.width and {section}.height must be 1-{MAX_CANVAS_SIDE}"
                )));
            }
        }
        if self.overlay.opacity > 100 {
            return Err(ConfigError::Validation(
                "overlay.opacity must be 0-100".into(),
            ));
        }
        if self.output.quality == 0 || self.output.quality > 100 {
            return Err(ConfigError::Validation(
                "output.quality must be 1-100".into(),
            ));
        }
        if self.search.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "search.timeout_secs must be non-zero".into(),
            ));
        }
        Ok(())
    }

    /// Path of the persisted activity log. A relative `output.log_file`
    /// lives inside `output.dir`.
    pub fn log_path(&self) -> PathBuf {
        if self.output.log_file.is_absolute() {
            self.output.log_file.clone()
        } else {
            self.output.dir.join(&self.output.log_file)
        }
    }
}

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(GeneratorConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<GeneratorConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: GeneratorConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from the file at `path`, falling back to stock defaults when
/// it does not exist.
pub fn load_config(path: &Path) -> Result<GeneratorConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(path)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock config with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# featured-thumb Configuration
# ============================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# General
# ---------------------------------------------------------------------------
[general]
# Master switch. When false every run stops before searching.
enable = true

# Order in which candidates are tried:
#   "first"  - provider relevance order
#   "best"   - largest declared pixel area first
#   "random" - one random candidate first, then relevance order
selection = "first"

# Interface language sent to the search provider.
language = "es"

# ---------------------------------------------------------------------------
# Image search
# ---------------------------------------------------------------------------
[search]
# "scrape" reads an image search results page.
# "api" calls a JSON search API and needs api_key.
provider = "scrape"

# Usage rights: "" (any), "fmc", "fc", "fm", "f".
rights = ""

# Minimum size: "" (any), "l", "m", "i", "lt,islt:svga", ...
size = ""

# Aspect: "" (any), "w" (wide), "t" (tall), "s" (square), "xw" (panoramic).
aspect = ""

# Type: "" (any), "photo", "clipart", "lineart", "face", "animated".
image_type = ""

# File type: "all", "jpg", "png", "gif", "bmp", "webp".
filetype = "all"

# Host substrings never to download from, e.g. ["pinterest.com"].
blacklist = []

# Timeout for every HTTP request, in seconds.
timeout_secs = 15

# User agent sent with every request.
user_agent = "Mozilla/5.0 (Linux; Android 6.0.1; Nexus 5X Build/MMB29P) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/41.0.2272.96"

# Check status and Content-Type with a HEAD request before downloading.
head_check = true

# API subscription key. Falls back to $FEATURED_THUMB_API_KEY when empty.
api_key = ""

# Results requested per API call.
api_count = 35

# ---------------------------------------------------------------------------
# Compositing (each stage runs only when enabled)
# ---------------------------------------------------------------------------
[crop]
# Center-crop to this aspect ratio and resample to exactly width x height.
# Each side 1-8192.
enabled = false
width = 1200
height = 630

[effects]
grayscale = false

[overlay]
# Darkening rectangle plus the title, wrapped and centered.
enabled = false
background = "#000000"
# 0 = invisible, 100 = solid.
opacity = 50
text_color = "#ffffff"
# Looked up in [fonts] dir as Name-Bold.ttf, Name.ttf, name-bold.ttf, name.ttf.
font = "Roboto"
# Clamped to 10-200.
font_size = 48.0

[frame]
enabled = false
color = "#ffffff"
# Stroke width, clamped to 1-100.
width = 5
# Inset from the canvas edges, clamped to 0-500.
margin = 20

# ---------------------------------------------------------------------------
# Fallback card (drawn when no candidate works)
# ---------------------------------------------------------------------------
[fallback]
enabled = true
# Each side 1-8192.
width = 1200
height = 630
background = "#333333"
text_color = "#ffffff"
font = "Roboto"
font_size = 60.0

# ---------------------------------------------------------------------------
# Files
# ---------------------------------------------------------------------------
[fonts]
# Directory holding .ttf files.
dir = "fonts"

[output]
# Where finished images are written.
dir = "featured"
# JPEG quality for composited images and fallback cards (1-100).
quality = 90
# Activity log, newest entry first, capped at 100 entries. Relative paths
# are resolved inside the output dir.
log_file = "featured-thumb-log.json"
"##
}
