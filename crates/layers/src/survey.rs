//! One HiPS image layer.

use foundation::math::frames::CooFrame;
use foundation::time::Time;

use gpu::commands::BlendMode;
use scene::traversal::SurveyGeometry;
use streaming::properties::{HiPSProperties, TileFormat};
use streaming::url;

use crate::color::ColorCfg;

/// Tiles missed by a draw pass are re-requested at most this often.
pub const TILE_REQUEST_INTERVAL_S: f64 = 1.0;

/// Assumed tile width until the survey tells us otherwise.
pub const DEFAULT_TILE_WIDTH: u32 = 512;

#[derive(Debug, Clone, PartialEq)]
pub struct Survey {
    name: String,
    root_url: String,
    frame: CooFrame,
    max_order: u8,
    format: TileFormat,
    tile_width: Option<u32>,
    pub color: ColorCfg,
    opacity: f32,
    blend: BlendMode,
    /// Shared across all of this survey's tiles: one miss re-arms the
    /// interval for every other miss in the same window.
    last_tile_request: Option<Time>,
}

impl Survey {
    pub fn from_properties(name: &str, root_url: &str, props: &HiPSProperties) -> Self {
        let mut color = ColorCfg::default();
        if let Some((low, high)) = props.pixel_cut {
            color.set_cuts(low, high);
        }
        Self {
            name: name.to_owned(),
            root_url: root_url.trim_end_matches('/').to_owned(),
            frame: props.frame,
            max_order: props.max_order,
            format: props.tile_format,
            tile_width: props.tile_width,
            color,
            opacity: 1.0,
            blend: BlendMode::Alpha,
            last_tile_request: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rename(&mut self, name: &str) {
        self.name = name.to_owned();
    }

    pub fn root_url(&self) -> &str {
        &self.root_url
    }

    pub fn frame(&self) -> CooFrame {
        self.frame
    }

    pub fn max_order(&self) -> u8 {
        self.max_order
    }

    pub fn format(&self) -> TileFormat {
        self.format
    }

    /// Tile width in pixels, defaulting until discovered.
    pub fn tile_width(&self) -> u32 {
        self.tile_width.unwrap_or(DEFAULT_TILE_WIDTH)
    }

    /// Records the width of the first decoded tile when the properties file
    /// did not declare one. Later tiles never change it.
    pub fn note_tile_width(&mut self, width: u32) {
        if self.tile_width.is_none() && width > 0 {
            self.tile_width = Some(width);
        }
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn set_opacity(&mut self, opacity: f32) {
        self.opacity = opacity.clamp(0.0, 1.0);
    }

    pub fn blend(&self) -> BlendMode {
        self.blend
    }

    pub fn set_blend(&mut self, blend: BlendMode) {
        self.blend = blend;
    }

    pub fn geometry(&self) -> SurveyGeometry<'_> {
        SurveyGeometry {
            root_url: &self.root_url,
            ext: self.format.ext(),
            frame: self.frame,
            max_order: self.max_order,
        }
    }

    pub fn tile_url(&self, order: u8, ipix: u64) -> String {
        url::tile_url(&self.root_url, order, ipix, self.format.ext())
    }

    pub fn allsky_url(&self) -> String {
        url::allsky_url(&self.root_url, self.format.ext())
    }

    pub fn properties_url(&self) -> String {
        url::properties_url(&self.root_url)
    }

    /// Whether a draw pass may queue downloads right now.
    pub fn allow_tile_requests(&self, now: Time) -> bool {
        match self.last_tile_request {
            None => true,
            Some(t) => now.seconds_since(t) > TILE_REQUEST_INTERVAL_S,
        }
    }

    pub fn note_tile_requests(&mut self, now: Time) {
        self.last_tile_request = Some(now);
    }
}
