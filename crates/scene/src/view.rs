//! View state: center, field of view, projection, frame, screen mapping.
//!
//! All angular inputs are degrees. The view keeps its center in the current
//! coordinate frame; switching frames converts the center atomically so the
//! same piece of sky stays on screen.

use foundation::bounds::Aabb2;
use foundation::math::frames::{self, CooFrame};
use foundation::math::projection::{Projection, ProjectionKind};
use foundation::math::sphere::LonLat;
use foundation::math::vec::{Vec2, Vec3};

use healpix::cache::{BASE_ORDER, CornerCache};
use healpix::index as hpx;

use crate::viewport::Viewport;
use crate::zoom;

/// Mean HEALPix cell edge at nside 1, degrees.
const CELL_EDGE_DEG_NSIDE1: f64 = 58.632;

#[derive(Debug, Clone, PartialEq)]
pub struct VisibleCell {
    pub ipix: u64,
    /// Screen corners in perimeter order (matching `healpix::cell_vertices`).
    pub corners: [Vec2; 4],
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    viewport: Viewport,
    projection: Projection,
    frame: CooFrame,
    fov_deg: f64,
    zoom_factor: f64,
}

impl ViewState {
    pub fn new(width: f64, height: f64) -> Self {
        let viewport = Viewport::new(width, height);
        let kind = ProjectionKind::Sin;
        let fov_deg = 60.0;
        Self {
            viewport,
            projection: Projection::new(kind, LonLat::new(0.0, 0.0)),
            frame: CooFrame::Icrs,
            fov_deg,
            zoom_factor: viewport.zoom_factor(kind, fov_deg),
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.viewport = Viewport::new(width, height);
        self.zoom_factor = self.viewport.zoom_factor(self.projection.kind(), self.fov_deg);
    }

    pub fn center(&self) -> LonLat {
        self.projection.center()
    }

    /// Moves the view center. Latitude is clamped at the poles and longitude
    /// wrapped by `LonLat` itself.
    pub fn point_to(&mut self, target: LonLat) {
        self.projection.set_center(target);
    }

    pub fn fov_deg(&self) -> f64 {
        self.fov_deg
    }

    /// Sets the field of view, clamped to the zoom table floor and to what
    /// the active projection can display.
    pub fn set_fov(&mut self, fov_deg: f64) {
        let limit = self.projection.kind().fov_limit_deg();
        self.fov_deg = fov_deg.clamp(zoom::min_fov(), limit);
        self.zoom_factor = self.viewport.zoom_factor(self.projection.kind(), self.fov_deg);
    }

    pub fn zoom_factor(&self) -> f64 {
        self.zoom_factor
    }

    pub fn frame(&self) -> CooFrame {
        self.frame
    }

    /// Switches the working frame, re-expressing the center so the view does
    /// not move.
    pub fn set_frame(&mut self, frame: CooFrame) {
        if frame == self.frame {
            return;
        }
        let center = frames::convert(self.center(), self.frame, frame);
        self.frame = frame;
        self.projection.set_center(center);
    }

    pub fn projection_kind(&self) -> ProjectionKind {
        self.projection.kind()
    }

    /// Switches the projection, keeping the center and clamping the fov to
    /// the new projection's limit.
    pub fn set_projection(&mut self, kind: ProjectionKind) {
        self.projection.set_kind(kind);
        self.set_fov(self.fov_deg);
    }

    /// Projects a position given in the view frame to screen pixels.
    pub fn project(&self, p: LonLat) -> Option<Vec2> {
        let xy = self.projection.project(p)?;
        Some(self.viewport.plane_to_screen(xy, self.zoom_factor))
    }

    /// Projects a unit vector given in `from` frame coordinates.
    pub fn project_vec_in_frame(&self, v: Vec3, from: CooFrame) -> Option<Vec2> {
        let v = frames::convert_vec(v, from, self.frame);
        let xy = self.projection.project_vec(v)?;
        Some(self.viewport.plane_to_screen(xy, self.zoom_factor))
    }

    /// Screen pixels back to a sky position in the view frame.
    pub fn unproject(&self, px: Vec2) -> Option<LonLat> {
        let xy = self.viewport.screen_to_plane(px, self.zoom_factor);
        self.projection.unproject(xy)
    }

    /// New center after dragging the pointer from `from_px` to `to_px`.
    /// `None` when either end falls outside the projection.
    pub fn drag_center(&self, from_px: Vec2, to_px: Vec2) -> Option<LonLat> {
        let from = self.unproject(from_px)?;
        let to = self.unproject(to_px)?;
        let c = self.center();
        let mut dlon = from.lon_deg - to.lon_deg;
        // Shortest way around the seam.
        if dlon > 180.0 {
            dlon -= 360.0;
        } else if dlon < -180.0 {
            dlon += 360.0;
        }
        let dlat = from.lat_deg - to.lat_deg;
        Some(LonLat::new(c.lon_deg + dlon, c.lat_deg + dlat))
    }

    /// Screen width of half the projected sky, for projections that unroll
    /// the sphere onto a plane with an anti-meridian seam. `None` for
    /// azimuthal projections, which have no seam.
    pub fn seam_half_width_px(&self) -> Option<f64> {
        let half_plane = match self.projection.kind() {
            ProjectionKind::Gls | ProjectionKind::Mercator | ProjectionKind::Lambert => {
                std::f64::consts::PI
            }
            ProjectionKind::Aitoff => 2.0 * std::f64::consts::SQRT_2,
            _ => return None,
        };
        Some(self.viewport.largest_dim() / 2.0 * self.zoom_factor * half_plane)
    }

    /// True when a projected rhombus straddles the projection seam. Its
    /// corners then land on opposite edges of the unrolled sky, giving a
    /// screen quad wider than half the map while the cell itself spans at
    /// most a quarter of it.
    pub fn quad_wraps_seam(&self, corners: &[Vec2; 4]) -> bool {
        let Some(limit) = self.seam_half_width_px() else {
            return false;
        };
        let min = corners.iter().map(|c| c.x).fold(f64::INFINITY, f64::min);
        let max = corners.iter().map(|c| c.x).fold(f64::NEG_INFINITY, f64::max);
        max - min > limit
    }

    /// HEALPix order whose tiles roughly match the screen resolution.
    ///
    /// Fovs of 50 degrees or less always get at least order 3 so the view
    /// leaves the allsky mosaic behind once it matters.
    pub fn display_order(&self, tile_width: u32) -> u8 {
        let px_per_deg = self.viewport.width / self.fov_deg;
        let needed_nside = CELL_EDGE_DEG_NSIDE1 * px_per_deg / tile_width as f64;
        let mut order = 0u8;
        while order < hpx::ORDER_MAX && f64::from(hpx::nside(order)) < needed_nside {
            order += 1;
        }
        if self.fov_deg <= 50.0 {
            order = order.max(BASE_ORDER);
        }
        order
    }

    /// HEALPix cells of `order` (expressed in `cell_frame`) whose projected
    /// rhombus touches the viewport grown by the visibility margin.
    ///
    /// Ordering contract: ascending `ipix`.
    ///
    /// Notes:
    /// - A cell counts only if all four corners project; cells straddling a
    ///   projection horizon are skipped, as the drawing path cannot texture
    ///   them either.
    /// - A cell larger than the screen still counts when its rhombus covers
    ///   the viewport, even with every corner off screen.
    /// - Above the base order the search refines from the order-3 grid,
    ///   pruning subtrees whose projected bounds miss the viewport. A
    ///   subtree is only pruned when all of its corners project, otherwise
    ///   invisibility cannot be proven.
    pub fn visible_cells(
        &self,
        order: u8,
        cell_frame: CooFrame,
        cache: &mut CornerCache,
    ) -> Vec<VisibleCell> {
        let mut out = Vec::new();
        if order <= BASE_ORDER {
            for ipix in 0..hpx::npix(order) {
                if let Some(corners) = self.screen_corners(order, ipix, cell_frame, cache)
                    && self.viewport.quad_visible(&corners)
                {
                    out.push(VisibleCell { ipix, corners });
                }
            }
            return out;
        }

        for root in 0..hpx::npix(BASE_ORDER) {
            self.refine_visible(BASE_ORDER, root, order, cell_frame, cache, &mut out);
        }
        out
    }

    fn refine_visible(
        &self,
        at_order: u8,
        ipix: u64,
        target_order: u8,
        cell_frame: CooFrame,
        cache: &mut CornerCache,
        out: &mut Vec<VisibleCell>,
    ) {
        let corners = self.screen_corners(at_order, ipix, cell_frame, cache);

        if at_order == target_order {
            if let Some(corners) = corners
                && self.viewport.quad_visible(&corners)
            {
                out.push(VisibleCell { ipix, corners });
            }
            return;
        }

        if let Some(corners) = corners
            && let Some(bbox) = Aabb2::from_points(corners.iter().copied())
        {
            // Cell boundaries bow away from the straight corner quad, so
            // pad the box by half its own extent before pruning.
            let pad = 0.5 * bbox.width().max(bbox.height());
            if !bbox.expanded(pad).intersects(&self.viewport.expanded_rect()) {
                return;
            }
        }

        for child in hpx::children(ipix) {
            self.refine_visible(at_order + 1, child, target_order, cell_frame, cache, out);
        }
    }

    /// Screen corners of a cell, or `None` if any corner fails to project.
    pub fn screen_corners(
        &self,
        order: u8,
        ipix: u64,
        cell_frame: CooFrame,
        cache: &mut CornerCache,
    ) -> Option<[Vec2; 4]> {
        // Only the base order goes through the cache here; refinement orders
        // are transient and must not evict the display order's table.
        let vertices = if order == BASE_ORDER {
            cache.corners(order, ipix)
        } else {
            hpx::cell_vertices(order, ipix)
        };
        let mut out = [Vec2::new(0.0, 0.0); 4];
        for (slot, v) in out.iter_mut().zip(vertices) {
            *slot = self.project_vec_in_frame(v, cell_frame)?;
        }
        Some(out)
    }
}
