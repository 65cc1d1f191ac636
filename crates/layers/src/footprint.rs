//! Instrument footprint overlays: sky polygons drawn as outlines with an
//! optional translucent fill.

use earcutr::earcut;

use foundation::math::frames::CooFrame;
use foundation::math::sphere::{LonLat, lonlat_to_vec};
use foundation::math::vec::Vec2;

use gpu::commands::Color;
use scene::view::ViewState;

#[derive(Debug, Clone, PartialEq)]
pub struct Footprint {
    name: String,
    frame: CooFrame,
    /// One outer ring per polygon; holes are not supported.
    polygons: Vec<Vec<LonLat>>,
    pub color: Color,
    pub fill: bool,
    visible: bool,
}

/// Screen-space geometry for one frame.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FootprintDraw {
    pub outlines: Vec<Vec<Vec2>>,
    pub fill_vertices: Vec<Vec2>,
    /// Triples into `fill_vertices`.
    pub fill_indices: Vec<u32>,
}

impl Footprint {
    pub fn new(name: &str, frame: CooFrame) -> Self {
        Self {
            name: name.to_owned(),
            frame,
            polygons: Vec::new(),
            color: Color::rgba(0.0, 1.0, 0.5, 0.4),
            fill: false,
            visible: true,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_polygon(&mut self, vertices: Vec<LonLat>) {
        if vertices.len() >= 3 {
            self.polygons.push(vertices);
        }
    }

    pub fn polygon_count(&self) -> usize {
        self.polygons.len()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Projects every polygon. A polygon with any vertex outside the
    /// projection's domain straddles the horizon and is skipped whole;
    /// stitching it across the limb is not attempted.
    pub fn project(&self, view: &ViewState) -> FootprintDraw {
        let mut out = FootprintDraw::default();
        if !self.visible {
            return out;
        }
        for polygon in &self.polygons {
            let mut screen: Vec<Vec2> = Vec::with_capacity(polygon.len());
            let mut complete = true;
            for p in polygon {
                match view.project_vec_in_frame(lonlat_to_vec(*p), self.frame) {
                    Some(px) => screen.push(px),
                    None => {
                        complete = false;
                        break;
                    }
                }
            }
            if !complete || !view.viewport().any_corner_visible(&screen) {
                continue;
            }
            if self.fill {
                triangulate_into(&screen, &mut out);
            }
            out.outlines.push(screen);
        }
        out
    }
}

fn triangulate_into(screen: &[Vec2], out: &mut FootprintDraw) {
    let mut coords: Vec<f64> = Vec::with_capacity(screen.len() * 2);
    for p in screen {
        coords.push(p.x);
        coords.push(p.y);
    }
    let Ok(indices) = earcut(&coords, &[], 2) else {
        return;
    };
    let base = out.fill_vertices.len() as u32;
    out.fill_vertices.extend_from_slice(screen);
    out.fill_indices
        .extend(indices.into_iter().map(|i| base + i as u32));
}
