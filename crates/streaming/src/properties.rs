//! Survey metadata.
//!
//! A HiPS root serves a plain-text `properties` document of `key = value`
//! lines. Only a handful of keys matter to the engine; everything else is
//! carried through untouched so diagnostics can show it.

use std::collections::BTreeMap;

use foundation::math::frames::CooFrame;
use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TileFormat {
    Jpeg,
    Png,
    Fits,
}

impl TileFormat {
    /// File extension used in tile URLs.
    pub fn ext(self) -> &'static str {
        match self {
            TileFormat::Jpeg => "jpg",
            TileFormat::Png => "png",
            TileFormat::Fits => "fits",
        }
    }

    /// First recognized token of a `hips_tile_format` list.
    pub fn from_list(list: &str) -> Option<TileFormat> {
        for token in list.split(|c: char| c == ' ' || c == ',') {
            match token.trim().to_ascii_lowercase().as_str() {
                "jpeg" | "jpg" => return Some(TileFormat::Jpeg),
                "png" => return Some(TileFormat::Png),
                "fits" => return Some(TileFormat::Fits),
                _ => {}
            }
        }
        None
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropertiesError {
    MissingKey(&'static str),
    InvalidValue { key: &'static str, value: String },
}

impl std::fmt::Display for PropertiesError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PropertiesError::MissingKey(key) => write!(f, "missing property `{key}`"),
            PropertiesError::InvalidValue { key, value } => {
                write!(f, "invalid value `{value}` for property `{key}`")
            }
        }
    }
}

impl std::error::Error for PropertiesError {}

/// Parsed survey metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct HiPSProperties {
    /// Deepest order the survey provides tiles for.
    pub max_order: u8,
    pub tile_format: TileFormat,
    /// Tile edge in pixels, when advertised. Otherwise the first decoded
    /// tile settles it.
    pub tile_width: Option<u32>,
    /// Default display cut `[min, max]`, for FITS surveys.
    pub pixel_cut: Option<(f64, f64)>,
    /// FITS sample type, when advertised.
    pub bitpix: Option<i32>,
    pub frame: CooFrame,
    pub service_url: Option<String>,
    pub title: Option<String>,
    /// Every key of the document, for passthrough.
    pub raw: BTreeMap<String, String>,
}

/// Parses a `properties` document.
///
/// `hips_order` is the only mandatory key. Unknown keys are preserved in
/// `raw`; malformed lines without `=` are skipped.
pub fn parse_properties(text: &str) -> Result<HiPSProperties, PropertiesError> {
    let mut raw = BTreeMap::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        raw.insert(key.trim().to_owned(), value.trim().to_owned());
    }

    let order_str = raw
        .get("hips_order")
        .ok_or(PropertiesError::MissingKey("hips_order"))?;
    let max_order: u8 = order_str
        .parse()
        .map_err(|_| PropertiesError::InvalidValue {
            key: "hips_order",
            value: order_str.clone(),
        })?;

    let tile_format = match raw.get("hips_tile_format") {
        Some(list) => TileFormat::from_list(list).ok_or_else(|| PropertiesError::InvalidValue {
            key: "hips_tile_format",
            value: list.clone(),
        })?,
        None => TileFormat::Jpeg,
    };

    let tile_width = match raw.get("hips_tile_width") {
        Some(w) => Some(w.parse().map_err(|_| PropertiesError::InvalidValue {
            key: "hips_tile_width",
            value: w.clone(),
        })?),
        None => None,
    };

    let pixel_cut = match raw.get("hips_pixel_cut") {
        Some(cut) => {
            let mut it = cut.split_whitespace();
            let parsed = match (it.next(), it.next()) {
                (Some(lo), Some(hi)) => lo.parse().ok().zip(hi.parse().ok()),
                _ => None,
            };
            Some(parsed.ok_or_else(|| PropertiesError::InvalidValue {
                key: "hips_pixel_cut",
                value: cut.clone(),
            })?)
        }
        None => None,
    };

    let bitpix = match raw.get("hips_pixel_bitpix") {
        Some(b) => Some(b.parse().map_err(|_| PropertiesError::InvalidValue {
            key: "hips_pixel_bitpix",
            value: b.clone(),
        })?),
        None => None,
    };

    let frame = match raw.get("hips_frame").map(String::as_str) {
        Some("galactic") => CooFrame::Galactic,
        // "equatorial", legacy spellings and absence all mean ICRS.
        _ => CooFrame::Icrs,
    };

    Ok(HiPSProperties {
        max_order,
        tile_format,
        tile_width,
        pixel_cut,
        bitpix,
        frame,
        service_url: raw.get("hips_service_url").cloned(),
        title: raw.get("obs_title").cloned(),
        raw,
    })
}

/// Embedder-side survey description, usually loaded from JSON.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SurveyConfig {
    pub id: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_order: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tile_width: Option<u32>,
}

impl SurveyConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
