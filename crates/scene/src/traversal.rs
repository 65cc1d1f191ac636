//! Tile selection for one survey and one frame.
//!
//! Starting from the visible cells at the display order, each cell is
//! subdivided while its screen rhombus is too distorted to draw in one
//! piece, then textured with the best tile at hand: its own when resident,
//! otherwise the nearest resident ancestor (a sub-rectangle of that tile).
//! Cells whose own tile is missing queue a download, rate-limited by the
//! caller through `allow_requests`.

use foundation::math::frames::CooFrame;
use foundation::math::precision::stable_total_cmp_f64;
use foundation::math::vec::Vec2;

use healpix::cache::{BASE_ORDER, CornerCache};
use healpix::index as hpx;
use streaming::buffer::TileBuffer;
use streaming::url::tile_url;

use crate::view::ViewState;

/// Longest a filiation may get, subdivision and ancestor walk combined.
pub const MAX_ANCESTRY_DEPTH: u8 = 4;

/// Squared screen thresholds of the subdivision predicate.
const EDGE_SQ_LIMIT: f64 = 280.0 * 280.0;
const DIAG_SQ_LIMIT: f64 = 150.0 * 150.0;
const ASPECT_LIMIT: f64 = 0.7;

/// Survey-side inputs the traversal needs.
#[derive(Debug, Copy, Clone)]
pub struct SurveyGeometry<'a> {
    pub root_url: &'a str,
    pub ext: &'a str,
    pub frame: CooFrame,
    pub max_order: u8,
}

/// Normalized sub-rectangle of a texture: `u0` runs along the cell's first
/// axis (toward the east corner), `v0` along the second (toward the west
/// corner).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SubRect {
    pub u0: f64,
    pub v0: f64,
    pub scale: f64,
}

impl SubRect {
    pub const FULL: SubRect = SubRect {
        u0: 0.0,
        v0: 0.0,
        scale: 1.0,
    };
}

#[derive(Debug, Clone, PartialEq)]
pub struct TileDraw {
    pub cell_order: u8,
    pub cell_ipix: u64,
    /// Screen corners in perimeter order.
    pub corners: [Vec2; 4],
    /// Tile actually sampled; equals the cell when its own tile is ready.
    pub tex_order: u8,
    pub tex_ipix: u64,
    pub tex_url: String,
    pub sub_rect: SubRect,
}

/// A cell whose screen rhombus cannot be drawn: collapsed to zero extent,
/// or wrapped around the projection seam.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct GeometryError {
    pub order: u8,
    pub ipix: u64,
}

#[derive(Debug, Default)]
pub struct TraversalOutput {
    pub draws: Vec<TileDraw>,
    /// Tile URLs worth downloading, nearest to the view center first.
    pub requests: Vec<String>,
    pub geometry_errors: Vec<GeometryError>,
}

struct RhombError;

/// Subdivision predicate on the projected rhombus.
///
/// Zero-length edges or diagonals are a geometry error, checked before
/// anything else so a collapsed rhombus with one runaway edge is never
/// mistaken for a merely oversized one. Otherwise the cell is too large
/// when an edge exceeds 280 px, or when it is squashed (diagonal ratio
/// under 0.7) with a diagonal over 150 px.
fn cell_too_large(c: &[Vec2; 4]) -> Result<bool, RhombError> {
    fn dist_sq(a: Vec2, b: Vec2) -> f64 {
        let d = a - b;
        d.x * d.x + d.y * d.y
    }

    let e1 = dist_sq(c[0], c[1]);
    let e2 = dist_sq(c[1], c[2]);
    if e1 == 0.0 || e2 == 0.0 {
        return Err(RhombError);
    }
    let d1 = dist_sq(c[0], c[2]);
    let d2 = dist_sq(c[1], c[3]);
    if d1 == 0.0 || d2 == 0.0 {
        return Err(RhombError);
    }
    if e1 > EDGE_SQ_LIMIT || e2 > EDGE_SQ_LIMIT {
        return Ok(true);
    }
    let rap = if d2 > d1 { d1 / d2 } else { d2 / d1 };
    Ok(rap < ASPECT_LIMIT && (d1 > DIAG_SQ_LIMIT || d2 > DIAG_SQ_LIMIT))
}

/// Selects tiles for every visible cell at `entry_order`.
///
/// Ordering contract:
/// - Draws follow the ascending-`ipix` order of the visible cells, children
///   before the next sibling.
/// - Requests are sorted by angular distance to the view center.
pub fn traverse(
    view: &ViewState,
    geom: &SurveyGeometry<'_>,
    entry_order: u8,
    cache: &mut CornerCache,
    tiles: &TileBuffer,
    allow_requests: bool,
) -> TraversalOutput {
    let mut out = TraversalOutput::default();
    let mut requests: Vec<(f64, String)> = Vec::new();

    let cells = view.visible_cells(entry_order, geom.frame, cache);
    for cell in cells {
        draw_cell(
            view,
            geom,
            entry_order,
            cell.ipix,
            0,
            cell.corners,
            cache,
            tiles,
            allow_requests,
            &mut out,
            &mut requests,
        );
    }

    requests.sort_by(|a, b| stable_total_cmp_f64(a.0, b.0).then_with(|| a.1.cmp(&b.1)));
    out.requests = requests.into_iter().map(|(_, url)| url).collect();
    out
}

#[allow(clippy::too_many_arguments)]
fn draw_cell(
    view: &ViewState,
    geom: &SurveyGeometry<'_>,
    order: u8,
    ipix: u64,
    depth: u8,
    corners: [Vec2; 4],
    cache: &mut CornerCache,
    tiles: &TileBuffer,
    allow_requests: bool,
    out: &mut TraversalOutput,
    requests: &mut Vec<(f64, String)>,
) -> u32 {
    // A rhombus straddling the projection seam smears across the whole
    // map; report it instead of drawing or subdividing it.
    if view.quad_wraps_seam(&corners) {
        out.geometry_errors.push(GeometryError { order, ipix });
        return 0;
    }

    match cell_too_large(&corners) {
        Err(RhombError) => {
            out.geometry_errors.push(GeometryError { order, ipix });
            return 0;
        }
        Ok(true) if order < hpx::ORDER_MAX && depth < MAX_ANCESTRY_DEPTH => {
            let mut drawn = 0;
            for child in hpx::children(ipix) {
                if let Some(child_corners) =
                    view.screen_corners(order + 1, child, geom.frame, cache)
                {
                    drawn += draw_cell(
                        view,
                        geom,
                        order + 1,
                        child,
                        depth + 1,
                        child_corners,
                        cache,
                        tiles,
                        allow_requests,
                        out,
                        requests,
                    );
                }
            }
            // A parent with no drawable child still draws itself, distorted
            // or not, rather than leaving a hole.
            if drawn > 0 {
                return drawn;
            }
        }
        Ok(_) => {}
    }

    // Own tile first.
    if order <= geom.max_order {
        let own_url = tile_url(geom.root_url, order, ipix, geom.ext);
        if tiles.is_ready(&own_url) {
            out.draws.push(TileDraw {
                cell_order: order,
                cell_ipix: ipix,
                corners,
                tex_order: order,
                tex_ipix: ipix,
                tex_url: own_url,
                sub_rect: SubRect::FULL,
            });
            return 2;
        }

        // Only cells the view actually asked for (not subdivision products)
        // queue downloads.
        if depth == 0 && order >= BASE_ORDER && allow_requests && !tiles.contains(&own_url) {
            let center = hpx::cell_center(order, ipix);
            let center_px = view.project_vec_in_frame(center, geom.frame);
            let view_center = view.project(view.center());
            let d = match (center_px, view_center) {
                (Some(c), Some(v)) => (c - v).length(),
                _ => f64::INFINITY,
            };
            requests.push((d, own_url));
        }
    }

    // Walk up for the nearest resident ancestor.
    for d in 1..=MAX_ANCESTRY_DEPTH {
        if order < BASE_ORDER + d {
            break;
        }
        let tex_order = order - d;
        if tex_order > geom.max_order {
            continue;
        }
        let tex_ipix = hpx::ancestor(ipix, d);
        let url = tile_url(geom.root_url, tex_order, tex_ipix, geom.ext);
        if tiles.is_ready(&url) {
            let (ox, oy) = hpx::offset_within_ancestor(ipix, d);
            let scale = 1.0 / f64::from(1u32 << d);
            out.draws.push(TileDraw {
                cell_order: order,
                cell_ipix: ipix,
                corners,
                tex_order,
                tex_ipix,
                tex_url: url,
                sub_rect: SubRect {
                    u0: f64::from(ox) * scale,
                    v0: f64::from(oy) * scale,
                    scale,
                },
            });
            return 2;
        }
    }

    0
}

#[cfg(test)]
mod tests {
    use super::{SubRect, SurveyGeometry, cell_too_large, traverse};
    use crate::view::ViewState;
    use foundation::math::frames::CooFrame;
    use foundation::math::projection::ProjectionKind;
    use foundation::math::sphere::LonLat;
    use foundation::math::vec::Vec2;
    use healpix::cache::CornerCache;
    use healpix::index as hpx;
    use streaming::buffer::TileBuffer;
    use streaming::url::tile_url;

    const ROOT: &str = "http://hips/test";

    fn geom(max_order: u8) -> SurveyGeometry<'static> {
        SurveyGeometry {
            root_url: ROOT,
            ext: "jpg",
            frame: CooFrame::Icrs,
            max_order,
        }
    }

    fn narrow_view() -> ViewState {
        let mut view = ViewState::new(512.0, 512.0);
        view.point_to(LonLat::new(83.63, 22.01));
        view.set_fov(1.0);
        view
    }

    /// One order past the display order: cells land around half the tile
    /// width on screen, safely below the subdivision threshold, so leaf
    /// behavior can be asserted directly.
    fn leaf_order(view: &ViewState) -> u8 {
        view.display_order(512) + 1
    }

    #[test]
    fn predicate_flags_long_edges_and_squashed_cells() {
        let square = |s: f64| {
            [
                Vec2::new(0.0, 0.0),
                Vec2::new(s, 0.0),
                Vec2::new(s, s),
                Vec2::new(0.0, s),
            ]
        };
        assert!(!cell_too_large(&square(100.0)).unwrap_or(true));
        assert!(cell_too_large(&square(300.0)).unwrap_or(false));

        // Squashed: diagonals 400 px and 40 px.
        let squashed = [
            Vec2::new(0.0, 0.0),
            Vec2::new(200.0, 20.0),
            Vec2::new(400.0, 0.0),
            Vec2::new(200.0, -20.0),
        ];
        assert!(cell_too_large(&squashed).unwrap_or(false));

        // Degenerate rhombs are an error, not a subdivision.
        let collapsed = [
            Vec2::new(0.0, 0.0),
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(10.0, 10.0),
        ];
        assert!(cell_too_large(&collapsed).is_err());

        // Still an error when the surviving edge is past the subdivision
        // threshold; subdividing a collapsed rhombus only recurses into
        // more collapsed rhombs.
        let collapsed_long = [
            Vec2::new(0.0, 0.0),
            Vec2::new(0.0, 0.0),
            Vec2::new(400.0, 0.0),
            Vec2::new(400.0, 40.0),
        ];
        assert!(cell_too_large(&collapsed_long).is_err());
    }

    #[test]
    fn seam_wrapped_cells_are_reported_never_drawn() {
        // Sinusoidal view of the whole sky, centered on the anti-meridian:
        // cells crossing lon 0 project corners on both edges of the map.
        let mut view = ViewState::new(512.0, 512.0);
        view.set_projection(ProjectionKind::Gls);
        view.set_fov(360.0);
        view.point_to(LonLat::new(180.0, 0.0));
        let mut cache = CornerCache::new();
        let mut tiles = TileBuffer::new(1024);
        for ipix in 0..hpx::npix(3) {
            let url = tile_url(ROOT, 3, ipix, "jpg");
            tiles.add_tile(&url);
            tiles.mark_ready(&url, 512, 512);
        }

        let out = traverse(&view, &geom(13), 3, &mut cache, &tiles, true);
        assert!(!out.draws.is_empty());
        assert!(!out.geometry_errors.is_empty(), "wrapped cells not reported");
        let limit = view.seam_half_width_px().unwrap();
        for d in &out.draws {
            let min = d.corners.iter().map(|c| c.x).fold(f64::INFINITY, f64::min);
            let max = d.corners.iter().map(|c| c.x).fold(f64::NEG_INFINITY, f64::max);
            assert!(max - min <= limit, "smeared quad drawn for cell {}", d.cell_ipix);
        }
    }

    #[test]
    fn missing_tiles_are_requested_nearest_first() {
        let view = narrow_view();
        let mut cache = CornerCache::new();
        let tiles = TileBuffer::new(16);
        let order = leaf_order(&view);
        let out = traverse(&view, &geom(13), order, &mut cache, &tiles, true);

        assert!(out.draws.is_empty());
        assert!(!out.requests.is_empty());
        assert!(out.geometry_errors.is_empty());
        // The request list is sorted by distance to center; every entry is
        // one of the visible cells, requested exactly once.
        let cells = view.visible_cells(order, CooFrame::Icrs, &mut cache);
        assert_eq!(out.requests.len(), cells.len());
        assert!(cells.iter().any(|c| {
            tile_url(ROOT, order, c.ipix, "jpg") == out.requests[0]
        }));
    }

    #[test]
    fn resident_tiles_draw_and_are_not_rerequested() {
        let view = narrow_view();
        let mut cache = CornerCache::new();
        let mut tiles = TileBuffer::new(256);
        let order = leaf_order(&view);
        for cell in view.visible_cells(order, CooFrame::Icrs, &mut cache) {
            let url = tile_url(ROOT, order, cell.ipix, "jpg");
            tiles.add_tile(&url);
            tiles.mark_ready(&url, 512, 512);
        }

        let out = traverse(&view, &geom(13), order, &mut cache, &tiles, true);
        assert!(out.requests.is_empty());
        assert!(!out.draws.is_empty());
        for draw in &out.draws {
            assert_eq!(draw.tex_order, draw.cell_order);
            assert_eq!(draw.sub_rect, SubRect::FULL);
        }
    }

    #[test]
    fn pending_cells_fall_back_to_a_ready_ancestor() {
        let view = narrow_view();
        let mut cache = CornerCache::new();
        let mut tiles = TileBuffer::new(256);
        let order = leaf_order(&view);
        assert!(order >= 4);

        // Only the parents are resident.
        for cell in view.visible_cells(order, CooFrame::Icrs, &mut cache) {
            let parent = hpx::parent(cell.ipix);
            let url = tile_url(ROOT, order - 1, parent, "jpg");
            if tiles.add_tile(&url).is_some() {
                tiles.mark_ready(&url, 512, 512);
            }
        }

        let out = traverse(&view, &geom(13), order, &mut cache, &tiles, true);
        assert!(!out.draws.is_empty());
        for draw in &out.draws {
            assert_eq!(draw.tex_order, draw.cell_order - 1);
            assert_eq!(draw.tex_ipix, hpx::parent(draw.cell_ipix));
            assert_eq!(draw.sub_rect.scale, 0.5);
            assert!(draw.sub_rect.u0 == 0.0 || draw.sub_rect.u0 == 0.5);
            assert!(draw.sub_rect.v0 == 0.0 || draw.sub_rect.v0 == 0.5);
        }
        // Own tiles still get requested while drawing the fallback.
        assert!(!out.requests.is_empty());
    }

    #[test]
    fn rate_gate_suppresses_requests_but_not_draws() {
        let view = narrow_view();
        let mut cache = CornerCache::new();
        let tiles = TileBuffer::new(16);
        let order = leaf_order(&view);
        let out = traverse(&view, &geom(13), order, &mut cache, &tiles, false);
        assert!(out.requests.is_empty());
    }

    #[test]
    fn oversized_cells_subdivide_onto_the_ancestor_texture() {
        let mut view = ViewState::new(512.0, 512.0);
        // A 10 degree fov keeps the display order at 3 while an order-3
        // cell spans roughly 370 px on screen, past the subdivision
        // threshold.
        view.set_fov(10.0);
        let mut cache = CornerCache::new();
        let mut tiles = TileBuffer::new(1024);

        // Make every base tile resident so subdivided children have an
        // ancestor texture to draw with.
        for ipix in 0..hpx::npix(3) {
            let url = tile_url(ROOT, 3, ipix, "jpg");
            tiles.add_tile(&url);
            tiles.mark_ready(&url, 512, 512);
        }

        let out = traverse(&view, &geom(13), 3, &mut cache, &tiles, true);
        assert!(!out.draws.is_empty());
        assert!(
            out.draws.iter().any(|d| d.cell_order > 3 && d.tex_order == 3),
            "no subdivided draws found"
        );
        for d in &out.draws {
            if d.cell_order > d.tex_order {
                assert!(d.sub_rect.scale < 1.0);
            }
        }
    }

    #[test]
    fn tiles_beyond_survey_depth_use_the_deepest_available() {
        let view = narrow_view();
        let mut cache = CornerCache::new();
        let mut tiles = TileBuffer::new(256);
        let order = leaf_order(&view);
        let shallow = geom(order - 2);

        // Deepest tiles the survey has.
        for cell in view.visible_cells(order, CooFrame::Icrs, &mut cache) {
            let tex_ipix = hpx::ancestor(cell.ipix, 2);
            let url = tile_url(ROOT, order - 2, tex_ipix, "jpg");
            if tiles.add_tile(&url).is_some() {
                tiles.mark_ready(&url, 512, 512);
            }
        }

        let out = traverse(&view, &shallow, order, &mut cache, &tiles, true);
        assert!(!out.draws.is_empty());
        // Nothing beyond the survey depth is requested.
        assert!(out.requests.is_empty());
        for d in &out.draws {
            assert_eq!(d.tex_order, order - 2);
            assert_eq!(d.sub_rect.scale, 0.25);
        }
    }
}
