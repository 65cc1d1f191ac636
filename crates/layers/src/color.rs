//! Per-survey color configuration.
//!
//! Pure state: every setter is a plain field update the renderer picks up on
//! the next frame, no reload of any tile.

use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stretch {
    Linear,
    Sqrt,
    Log,
    Asinh,
    Pow2,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Colormap {
    /// Pass the tile pixels through untouched.
    Native,
    Grayscale,
    Rainbow,
    Fire,
    Cubehelix,
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorCfg {
    pub min_cut: f64,
    pub max_cut: f64,
    pub stretch: Stretch,
    pub colormap: Colormap,
    pub reversed: bool,
}

impl Default for ColorCfg {
    fn default() -> Self {
        Self {
            min_cut: 0.0,
            max_cut: 1.0,
            stretch: Stretch::Linear,
            colormap: Colormap::Native,
            reversed: false,
        }
    }
}

impl ColorCfg {
    /// Sets the pixel cuts, swapping the pair if given out of order.
    pub fn set_cuts(&mut self, low: f64, high: f64) {
        if low <= high {
            self.min_cut = low;
            self.max_cut = high;
        } else {
            self.min_cut = high;
            self.max_cut = low;
        }
    }

    pub fn set_stretch(&mut self, stretch: Stretch) {
        self.stretch = stretch;
    }

    pub fn set_colormap(&mut self, colormap: Colormap) {
        self.colormap = colormap;
    }

    pub fn set_reversed(&mut self, reversed: bool) {
        self.reversed = reversed;
    }
}
