//! Configuration – intake policy, identity format and card geometry.
//!
//! Every field has a default, so a JSON config only needs to name what it
//! overrides:
//!
//! ```json
//! { "require_motivation": false, "id_prefix": "GWGM" }
//! ```

use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::asset::MimeType;
use crate::error::Result;

/// Points per millimetre.
pub const PT_PER_MM: f32 = 72.0 / 25.4;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Organisation name; header fallback when no logo is attached.
    pub organization_name: String,
    /// Title line shared by the three card encodings.
    pub card_title: String,

    /// Largest accepted passport upload in bytes (default: 300 KB).
    pub max_asset_bytes: usize,
    /// MIME types accepted for passport and logo uploads.
    pub accepted_mime_types: Vec<MimeType>,

    /// Identifier prefix (default: "GWGM").
    pub id_prefix: String,
    /// Zero-padded width of the numeric part (default: 3).
    pub id_width: usize,

    /// Field length limits, in characters.
    pub limits: FieldLimits,

    pub require_passport: bool,
    pub require_motivation: bool,
    pub require_date_of_birth: bool,
    /// When set, the phone number must be exactly this many digits.
    pub phone_digits: Option<usize>,
    /// Earliest accepted date of birth (latest is today).
    pub earliest_birth_date: NaiveDate,

    /// Raster card canvas in pixels (default: 300 × 400).
    pub raster_width: u32,
    pub raster_height: u32,
    /// Passport box on the raster card, in pixels (square).
    pub raster_photo_size: u32,

    /// Document page in millimetres (default: 100 × 150).
    pub page_width_mm: f32,
    pub page_height_mm: f32,
    /// Passport photo width on the document, in millimetres.
    pub document_photo_width_mm: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldLimits {
    pub name: usize,
    pub phone: usize,
    pub address: usize,
    pub occupation: usize,
    pub motivation: usize,
}

impl Default for FieldLimits {
    fn default() -> Self {
        Self {
            name: 100,
            phone: 20,
            address: 200,
            occupation: 100,
            motivation: 500,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            organization_name: "GraciousWord Global Mission".to_string(),
            card_title: "GraciousWord Global Mission ID Card".to_string(),
            max_asset_bytes: 300 * 1024,
            accepted_mime_types: vec![MimeType::Jpeg, MimeType::Png],
            id_prefix: "GWGM".to_string(),
            id_width: 3,
            limits: FieldLimits::default(),
            require_passport: true,
            require_motivation: true,
            require_date_of_birth: true,
            phone_digits: None,
            earliest_birth_date: NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or(NaiveDate::MIN),
            raster_width: 300,
            raster_height: 400,
            raster_photo_size: 150,
            page_width_mm: 100.0,
            page_height_mm: 150.0,
            document_photo_width_mm: 30.0,
        }
    }
}

impl Config {
    /// Deserialise from JSON; missing keys keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn page_width_pt(&self) -> f32 {
        self.page_width_mm * PT_PER_MM
    }

    pub fn page_height_pt(&self) -> f32 {
        self.page_height_mm * PT_PER_MM
    }

    pub fn document_photo_width_pt(&self) -> f32 {
        self.document_photo_width_mm * PT_PER_MM
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_card_constants() {
        let cfg = Config::default();
        assert_eq!(cfg.max_asset_bytes, 307_200);
        assert_eq!(cfg.id_prefix, "GWGM");
        assert_eq!(cfg.id_width, 3);
        assert_eq!(cfg.accepted_mime_types, vec![MimeType::Jpeg, MimeType::Png]);
        assert!(cfg.require_motivation);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = Config::from_json(r#"{ "require_motivation": false, "limits": { "name": 40 } }"#)
            .unwrap();
        assert!(!cfg.require_motivation);
        assert_eq!(cfg.limits.name, 40);
        assert_eq!(cfg.limits.address, 200);
        assert_eq!(cfg.raster_width, 300);
    }

    #[test]
    fn page_size_in_points() {
        let cfg = Config::default();
        assert!((cfg.page_width_pt() - 283.46).abs() < 0.01);
        assert!((cfg.page_height_pt() - 425.20).abs() < 0.01);
    }
}
