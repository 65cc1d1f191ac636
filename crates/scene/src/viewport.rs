//! Screen mapping.
//!
//! Projections produce normalized plane coordinates; the viewport maps them
//! to pixels through the zoom factor. The mapping is centered on the larger
//! screen dimension so aspect ratio never stretches the sky.

use foundation::bounds::Aabb2;
use foundation::math::projection::{Projection, ProjectionKind};
use foundation::math::sphere::LonLat;
use foundation::math::vec::Vec2;

/// Pixels a projected corner may fall outside the viewport and still count
/// as visible.
pub const VISIBILITY_MARGIN_PX: f64 = 20.0;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width: width.max(1.0),
            height: height.max(1.0),
        }
    }

    pub fn largest_dim(&self) -> f64 {
        self.width.max(self.height)
    }

    pub fn rect(&self) -> Aabb2 {
        Aabb2::new([0.0, 0.0], [self.width, self.height])
    }

    /// Viewport rectangle grown by the visibility margin.
    pub fn expanded_rect(&self) -> Aabb2 {
        self.rect().expanded(VISIBILITY_MARGIN_PX)
    }

    /// Plane scale so that `fov_deg` spans the viewport width.
    pub fn zoom_factor(&self, kind: ProjectionKind, fov_deg: f64) -> f64 {
        let fov = fov_deg.clamp(1e-9, kind.fov_limit_deg());
        // Back off a hair from the limit so the probe stays projectable
        // (stereographic rejects exactly 180 degrees from center).
        let half = (fov / 2.0) * (1.0 - 1e-9);
        let probe = Projection::new(kind, LonLat::new(0.0, 0.0));
        let d = probe
            .project(LonLat::new(half, 0.0))
            .map(|p| p.x.abs())
            .filter(|d| *d > 0.0)
            .unwrap_or(std::f64::consts::PI);
        self.width / (self.largest_dim() * d)
    }

    /// Plane -> screen pixels.
    pub fn plane_to_screen(&self, xy: Vec2, zoom_factor: f64) -> Vec2 {
        let l = self.largest_dim();
        Vec2::new(
            l / 2.0 * (1.0 + zoom_factor * xy.x) - (l - self.width) / 2.0,
            l / 2.0 * (1.0 + zoom_factor * xy.y) - (l - self.height) / 2.0,
        )
    }

    /// Screen pixels -> plane. Inverse of [`plane_to_screen`](Self::plane_to_screen).
    pub fn screen_to_plane(&self, px: Vec2, zoom_factor: f64) -> Vec2 {
        let l = self.largest_dim();
        Vec2::new(
            (2.0 * (px.x + (l - self.width) / 2.0) / l - 1.0) / zoom_factor,
            (2.0 * (px.y + (l - self.height) / 2.0) / l - 1.0) / zoom_factor,
        )
    }

    /// At least one corner inside the margin-expanded viewport.
    pub fn any_corner_visible(&self, corners: &[Vec2]) -> bool {
        let rect = self.expanded_rect();
        corners.iter().any(|c| rect.contains(*c))
    }

    /// A projected quad overlaps the viewport.
    ///
    /// True when a corner lands inside the margin-expanded viewport, or when
    /// the quad is larger than the screen and swallows it whole: zoomed far
    /// enough in, a single cell covers the viewport with all four corners
    /// off screen.
    pub fn quad_visible(&self, corners: &[Vec2; 4]) -> bool {
        if self.any_corner_visible(corners) {
            return true;
        }
        let r = self.rect();
        let anchors = [
            Vec2::new(self.width / 2.0, self.height / 2.0),
            Vec2::new(r.min[0], r.min[1]),
            Vec2::new(r.max[0], r.min[1]),
            Vec2::new(r.max[0], r.max[1]),
            Vec2::new(r.min[0], r.max[1]),
        ];
        anchors.iter().any(|p| point_in_quad(corners, *p))
    }
}

/// Even-odd test against the quad's perimeter.
fn point_in_quad(quad: &[Vec2; 4], p: Vec2) -> bool {
    let mut inside = false;
    let mut j = 3;
    for i in 0..4 {
        let a = quad[i];
        let b = quad[j];
        if (a.y > p.y) != (b.y > p.y) && p.x < a.x + (p.y - a.y) / (b.y - a.y) * (b.x - a.x) {
            inside = !inside;
        }
        j = i;
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::{VISIBILITY_MARGIN_PX, Viewport};
    use foundation::math::projection::ProjectionKind;
    use foundation::math::vec::Vec2;

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn plane_origin_lands_at_screen_center() {
        let vp = Viewport::new(800.0, 600.0);
        let c = vp.plane_to_screen(Vec2::new(0.0, 0.0), 1.3);
        assert_close(c.x, 400.0, 1e-12);
        assert_close(c.y, 300.0, 1e-12);
    }

    #[test]
    fn screen_mapping_round_trips() {
        let vp = Viewport::new(1024.0, 768.0);
        let zf = 2.7;
        for &(x, y) in &[(0.0, 0.0), (0.3, -0.2), (-1.0, 0.9)] {
            let p = Vec2::new(x, y);
            let rt = vp.screen_to_plane(vp.plane_to_screen(p, zf), zf);
            assert_close(rt.x, p.x, 1e-12);
            assert_close(rt.y, p.y, 1e-12);
        }
    }

    #[test]
    fn full_orthographic_fov_fills_the_width() {
        // fov 180 under SIN projects the limb at plane distance 1; a square
        // viewport maps plane x = 1 to the right edge.
        let vp = Viewport::new(512.0, 512.0);
        let zf = vp.zoom_factor(ProjectionKind::Sin, 180.0);
        let edge = vp.plane_to_screen(Vec2::new(1.0, 0.0), zf);
        assert_close(edge.x, 512.0, 1e-3);
    }

    #[test]
    fn zoom_factor_halving_fov_doubles_scale_for_small_fov() {
        let vp = Viewport::new(512.0, 512.0);
        let z1 = vp.zoom_factor(ProjectionKind::Tan, 2.0);
        let z2 = vp.zoom_factor(ProjectionKind::Tan, 1.0);
        assert_close(z2 / z1, 2.0, 1e-4);
    }

    #[test]
    fn corner_visibility_uses_the_margin() {
        let vp = Viewport::new(100.0, 100.0);
        assert!(vp.any_corner_visible(&[Vec2::new(-VISIBILITY_MARGIN_PX, 50.0)]));
        assert!(!vp.any_corner_visible(&[Vec2::new(-VISIBILITY_MARGIN_PX - 1.0, 50.0)]));
        assert!(vp.any_corner_visible(&[
            Vec2::new(-500.0, -500.0),
            Vec2::new(110.0, 110.0),
        ]));
    }

    #[test]
    fn quad_swallowing_the_viewport_is_visible() {
        let vp = Viewport::new(100.0, 100.0);
        // All four corners far off screen; the quad covers the whole
        // viewport.
        let big = [
            Vec2::new(-400.0, -400.0),
            Vec2::new(500.0, -400.0),
            Vec2::new(500.0, 500.0),
            Vec2::new(-400.0, 500.0),
        ];
        assert!(!vp.any_corner_visible(&big));
        assert!(vp.quad_visible(&big));

        // Same size, shifted entirely past the viewport: not visible.
        let offset = [
            Vec2::new(200.0, 200.0),
            Vec2::new(1100.0, 200.0),
            Vec2::new(1100.0, 1100.0),
            Vec2::new(200.0, 1100.0),
        ];
        assert!(!vp.quad_visible(&offset));
    }
}
