//! Point-source catalog overlays.
//!
//! Ingest (VOTable, CSV) happens outside the engine; a catalog here is just
//! named positions to project, draw and hit-test.

use foundation::math::frames::CooFrame;
use foundation::math::sphere::{LonLat, lonlat_to_vec};
use foundation::math::vec::Vec2;

use gpu::commands::Color;
use scene::picking::{PickHit, ScreenMarker, pick_nearest};
use scene::view::ViewState;

/// Cursor slack for picking, pixels.
pub const PICK_TOLERANCE_PX: f64 = 10.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    pub pos: LonLat,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    name: String,
    frame: CooFrame,
    sources: Vec<Source>,
    pub color: Color,
    pub marker_size_px: f32,
    visible: bool,
}

impl Catalog {
    pub fn new(name: &str, frame: CooFrame) -> Self {
        Self {
            name: name.to_owned(),
            frame,
            sources: Vec::new(),
            color: Color::rgb(1.0, 0.5, 0.0),
            marker_size_px: 8.0,
            visible: true,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn frame(&self) -> CooFrame {
        self.frame
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn push(&mut self, source: Source) {
        self.sources.push(source);
    }

    pub fn source(&self, index: usize) -> Option<&Source> {
        self.sources.get(index)
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Screen markers for the sources the current projection can place.
    /// `source_index` survives the filtering, so hits map back to sources.
    pub fn project_markers(&self, view: &ViewState) -> Vec<ScreenMarker> {
        let mut out = Vec::new();
        for (source_index, source) in self.sources.iter().enumerate() {
            let v = lonlat_to_vec(source.pos);
            if let Some(px) = view.project_vec_in_frame(v, self.frame)
                && view.viewport().rect().contains(px)
            {
                out.push(ScreenMarker { source_index, px });
            }
        }
        out
    }

    pub fn hit_test(&self, view: &ViewState, cursor: Vec2) -> Option<PickHit> {
        if !self.visible {
            return None;
        }
        let markers = self.project_markers(view);
        pick_nearest(&markers, cursor, PICK_TOLERANCE_PX)
    }
}

#[cfg(test)]
mod tests {
    use super::{Catalog, Source};
    use foundation::math::frames::CooFrame;
    use foundation::math::sphere::LonLat;
    use scene::view::ViewState;

    fn catalog_at_center() -> (Catalog, ViewState) {
        let mut view = ViewState::new(400.0, 400.0);
        view.point_to(LonLat::new(83.63, 22.01));
        view.set_fov(10.0);

        let mut cat = Catalog::new("messier", CooFrame::Icrs);
        cat.push(Source {
            pos: LonLat::new(83.63, 22.01),
            name: Some("M1".to_owned()),
        });
        cat.push(Source {
            pos: LonLat::new(83.63, 24.0),
            name: None,
        });
        // Far outside the view.
        cat.push(Source {
            pos: LonLat::new(263.63, -22.01),
            name: None,
        });
        (cat, view)
    }

    #[test]
    fn markers_keep_their_source_index() {
        let (cat, view) = catalog_at_center();
        let markers = cat.project_markers(&view);
        assert_eq!(markers.len(), 2);
        assert_eq!(markers[0].source_index, 0);
        assert_eq!(markers[1].source_index, 1);
        // The first source sits at the view center.
        assert!((markers[0].px.x - 200.0).abs() < 1e-6);
        assert!((markers[0].px.y - 200.0).abs() < 1e-6);
    }

    #[test]
    fn hit_test_finds_the_center_source() {
        let (cat, view) = catalog_at_center();
        let hit = cat.hit_test(&view, foundation::math::vec::Vec2::new(203.0, 200.0));
        assert_eq!(hit.unwrap().source_index, 0);
        assert_eq!(cat.source(0).unwrap().name.as_deref(), Some("M1"));
    }

    #[test]
    fn hidden_catalogs_do_not_hit() {
        let (mut cat, view) = catalog_at_center();
        cat.set_visible(false);
        assert!(
            cat.hit_test(&view, foundation::math::vec::Vec2::new(200.0, 200.0))
                .is_none()
        );
    }
}
