//! Journal configuration.
//!
//! Loaded from `journal.toml` in the data directory (or an explicit path).
//! Stock defaults are the base layer; the user file only needs the keys it
//! wants to override. Unknown keys are rejected to catch typos early.
//!
//! ```toml
//! storage_key = "travelPhotos"
//!
//! [labels]
//! default_title = "My Travel Diary"
//!
//! [map]
//! center = [39.9042, 116.4074]
//! zoom = 10
//!
//! [pdf]
//! page_break_y = 250.0
//!
//! [share]
//! param = "share"
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File name looked up inside the data directory.
pub const CONFIG_FILENAME: &str = "journal.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Top-level journal configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JournalConfig {
    /// Key under which the photo list is persisted.
    pub storage_key: String,
    /// User-visible strings: placeholders, default title, prompts.
    pub labels: LabelsConfig,
    /// Map widget defaults.
    pub map: MapConfig,
    /// PDF page layout, in millimetres and points.
    pub pdf: PdfLayout,
    /// Share link settings.
    pub share: ShareConfig,
    /// Page colors.
    pub theme: ThemeConfig,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            storage_key: "travelPhotos".to_string(),
            labels: LabelsConfig::default(),
            map: MapConfig::default(),
            pdf: PdfLayout::default(),
            share: ShareConfig::default(),
            theme: ThemeConfig::default(),
        }
    }
}

impl JournalConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage_key.trim().is_empty() {
            return Err(ConfigError::Validation(
                "storage_key must not be empty".into(),
            ));
        }
        let [lat, lng] = self.map.center;
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
            return Err(ConfigError::Validation(
                "map.center must be a valid [latitude, longitude]".into(),
            ));
        }
        if self.map.zoom > self.map.max_zoom {
            return Err(ConfigError::Validation(
                "map.zoom must not exceed map.max_zoom".into(),
            ));
        }
        if self.pdf.wrap_width <= 0.0 || self.pdf.line_height <= 0.0 {
            return Err(ConfigError::Validation(
                "pdf.wrap_width and pdf.line_height must be positive".into(),
            ));
        }
        if self.pdf.page_break_y >= self.pdf.page_height {
            return Err(ConfigError::Validation(
                "pdf.page_break_y must be above the bottom of the page".into(),
            ));
        }
        if self.share.param.is_empty() {
            return Err(ConfigError::Validation("share.param must not be empty".into()));
        }
        Ok(())
    }
}

/// User-visible strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LabelsConfig {
    /// Diary title used when the title input is empty.
    pub default_title: String,
    /// Card heading for photos without a location.
    pub no_location: String,
    /// Card text for photos without a description.
    pub no_description: String,
    /// Diary entry heading for photos without a location.
    pub unknown_location: String,
    /// Shown in the diary preview when nothing is selected.
    pub empty_diary_prompt: String,
    /// First option of the location filter.
    pub all_locations: String,
}

impl Default for LabelsConfig {
    fn default() -> Self {
        Self {
            default_title: "My Travel Diary".to_string(),
            no_location: "No location set".to_string(),
            no_description: "No description yet".to_string(),
            unknown_location: "Unknown location".to_string(),
            empty_diary_prompt: "Select photos to include in your diary".to_string(),
            all_locations: "All locations".to_string(),
        }
    }
}

/// Map widget defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MapConfig {
    /// Initial view centre as `[latitude, longitude]`.
    pub center: [f64; 2],
    pub zoom: u8,
    pub max_zoom: u8,
    /// Tile URL template.
    pub tile_url: String,
    pub attribution: String,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            center: [39.9042, 116.4074],
            zoom: 10,
            max_zoom: 18,
            tile_url: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
            attribution: "© OpenStreetMap contributors".to_string(),
        }
    }
}

/// PDF layout constants. Positions are millimetres on an A4 portrait page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PdfLayout {
    pub page_width: f64,
    pub page_height: f64,
    /// Title baseline on the first page.
    pub title_y: f64,
    pub title_font_size: f64,
    /// Where the first entry starts.
    pub first_entry_y: f64,
    /// Entries starting below this line move to a new page.
    pub page_break_y: f64,
    /// Where entries start on continuation pages.
    pub top_margin: f64,
    pub left_margin: f64,
    /// Description wrap width.
    pub wrap_width: f64,
    /// Advance per wrapped description line.
    pub line_height: f64,
    /// Advance after the location and date lines.
    pub line_gap: f64,
    /// Space after each entry.
    pub entry_gap: f64,
    pub location_font_size: f64,
    pub date_font_size: f64,
    pub description_font_size: f64,
}

impl Default for PdfLayout {
    fn default() -> Self {
        Self {
            page_width: 210.0,
            page_height: 297.0,
            title_y: 20.0,
            title_font_size: 20.0,
            first_entry_y: 40.0,
            page_break_y: 250.0,
            top_margin: 20.0,
            left_margin: 20.0,
            wrap_width: 170.0,
            line_height: 5.0,
            line_gap: 10.0,
            entry_gap: 10.0,
            location_font_size: 14.0,
            date_font_size: 10.0,
            description_font_size: 12.0,
        }
    }
}

/// Share link settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShareConfig {
    /// Query parameter carrying the encoded diary.
    pub param: String,
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            param: "share".to_string(),
        }
    }
}

/// Page colors, emitted as CSS custom properties.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThemeConfig {
    pub accent: String,
    pub background: String,
    pub surface: String,
    pub text: String,
    pub text_muted: String,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            accent: "#667eea".to_string(),
            background: "#f7fafc".to_string(),
            surface: "#ffffff".to_string(),
            text: "#2d3748".to_string(),
            text_muted: "#718096".to_string(),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(JournalConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// Tables merge key by key; any other overlay value replaces the base value.
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

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<JournalConfig, ConfigError> {
    let base = stock_defaults_value();
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: JournalConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load a config file. A missing file yields the stock defaults.
pub fn load_config_file(path: &Path) -> Result<JournalConfig, ConfigError> {
    if !path.exists() {
        return resolve_config(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    resolve_config(Some(value))
}

/// Load `journal.toml` from the data directory.
pub fn load_config(data_dir: &Path) -> Result<JournalConfig, ConfigError> {
    load_config_file(&data_dir.join(CONFIG_FILENAME))
}

/// Returns a fully-commented stock `journal.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Photo Journal Configuration
# ===========================
# All settings are optional. Values shown below are the defaults.
# Unknown keys will cause an error.

# Key under which the photo list is stored in the data directory.
storage_key = "travelPhotos"

# ---------------------------------------------------------------------------
# Labels
# ---------------------------------------------------------------------------
[labels]
default_title = "My Travel Diary"
no_location = "No location set"
no_description = "No description yet"
unknown_location = "Unknown location"
empty_diary_prompt = "Select photos to include in your diary"
all_locations = "All locations"

# ---------------------------------------------------------------------------
# Map
# ---------------------------------------------------------------------------
[map]
# Initial view centre as [latitude, longitude].
center = [39.9042, 116.4074]
zoom = 10
max_zoom = 18
tile_url = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png"
attribution = "© OpenStreetMap contributors"

# ---------------------------------------------------------------------------
# PDF export (millimetres on A4 portrait; font sizes in points)
# ---------------------------------------------------------------------------
[pdf]
page_width = 210.0
page_height = 297.0
title_y = 20.0
title_font_size = 20.0
first_entry_y = 40.0
# Entries that would start below this line begin a new page.
page_break_y = 250.0
top_margin = 20.0
left_margin = 20.0
wrap_width = 170.0
line_height = 5.0
line_gap = 10.0
entry_gap = 10.0
location_font_size = 14.0
date_font_size = 10.0
description_font_size = 12.0

# ---------------------------------------------------------------------------
# Share links
# ---------------------------------------------------------------------------
[share]
# Query parameter carrying the encoded diary.
param = "share"

# ---------------------------------------------------------------------------
# Page colors
# ---------------------------------------------------------------------------
[theme]
accent = "#667eea"
background = "#f7fafc"
surface = "#ffffff"
text = "#2d3748"
text_muted = "#718096"
"##
}

/// Generate CSS custom properties from theme config.
pub fn generate_theme_css(theme: &ThemeConfig) -> String {
    format!(
        r#":root {{
    --color-accent: {accent};
    --color-bg: {background};
    --color-surface: {surface};
    --color-text: {text};
    --color-text-muted: {text_muted};
}}"#,
        accent = theme.accent,
        background = theme.background,
        surface = theme.surface,
        text = theme.text,
        text_muted = theme.text_muted,
    )
}
