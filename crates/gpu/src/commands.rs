//! Backend-agnostic draw commands.
//!
//! One frame of the viewer compiles to a flat command list. Commands are
//! ordered back to front; a backend replays them in order with no further
//! sorting.

use foundation::math::vec::Vec2;
use scene::traversal::SubRect;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::rgba(r, g, b, 1.0)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BlendMode {
    Alpha,
    Additive,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderCommand {
    /// One sky cell textured with (a sub-rectangle of) a tile.
    TexturedTile {
        layer: String,
        url: String,
        /// Screen corners in perimeter order.
        corners: [Vec2; 4],
        sub_rect: SubRect,
        opacity: f32,
        blend: BlendMode,
    },
    Polyline {
        points: Vec<Vec2>,
        color: Color,
        width_px: f32,
        closed: bool,
    },
    FillTriangles {
        vertices: Vec<Vec2>,
        /// Triples into `vertices`.
        indices: Vec<u32>,
        color: Color,
    },
    Markers {
        points: Vec<Vec2>,
        color: Color,
        size_px: f32,
    },
    Reticle {
        center: Vec2,
        color: Color,
        size_px: f32,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderFrame {
    pub frame_index: u64,
    pub commands: Vec<RenderCommand>,
    /// Set when the frame budget ran out before the list was complete.
    pub truncated: bool,
}

impl RenderFrame {
    pub fn new(frame_index: u64) -> Self {
        Self {
            frame_index,
            commands: Vec::new(),
            truncated: false,
        }
    }

    pub fn tile_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, RenderCommand::TexturedTile { .. }))
            .count()
    }
}
