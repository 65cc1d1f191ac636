//! HEALPix nested-scheme index math.
//!
//! Cells are addressed by `(order, ipix)` with `nside = 2^order` and
//! `npix = 12 * nside^2`. The nested scheme makes hierarchy cheap: the four
//! children of a cell are `4*ipix .. 4*ipix+3` one order deeper, and the
//! parent is `ipix / 4`.

use foundation::math::Vec3;

/// Deepest order any survey is drawn at.
pub const ORDER_MAX: u8 = 13;

/// Ring index of the face's north corner, per base face.
const JRLL: [u64; 12] = [2, 2, 2, 2, 3, 3, 3, 3, 4, 4, 4, 4];
/// Longitude offset of the face center, in units of pi/4.
const JPLL: [u64; 12] = [1, 3, 5, 7, 0, 2, 4, 6, 1, 3, 5, 7];

pub fn nside(order: u8) -> u32 {
    1u32 << order
}

pub fn npix(order: u8) -> u64 {
    12 * (1u64 << (2 * order))
}

pub fn children(ipix: u64) -> [u64; 4] {
    [4 * ipix, 4 * ipix + 1, 4 * ipix + 2, 4 * ipix + 3]
}

pub fn parent(ipix: u64) -> u64 {
    ipix / 4
}

/// Ancestor `depth` orders up (`depth = 0` is the cell itself).
pub fn ancestor(ipix: u64, depth: u8) -> u64 {
    ipix >> (2 * depth)
}

/// Grid position of a cell inside its ancestor `depth` orders up, in units
/// of cells at the deeper order. Both coordinates are in `[0, 2^depth)`.
pub fn offset_within_ancestor(ipix: u64, depth: u8) -> (u32, u32) {
    let low = ipix & ((1u64 << (2 * depth)) - 1);
    (compress_bits(low) as u32, compress_bits(low >> 1) as u32)
}

/// Interleave the low 32 bits of `x` into even bit positions.
fn spread_bits(mut x: u64) -> u64 {
    x &= 0xffff_ffff;
    x = (x | (x << 16)) & 0x0000_ffff_0000_ffff;
    x = (x | (x << 8)) & 0x00ff_00ff_00ff_00ff;
    x = (x | (x << 4)) & 0x0f0f_0f0f_0f0f_0f0f;
    x = (x | (x << 2)) & 0x3333_3333_3333_3333;
    x = (x | (x << 1)) & 0x5555_5555_5555_5555;
    x
}

/// Inverse of [`spread_bits`]: gather the even bit positions.
fn compress_bits(mut x: u64) -> u64 {
    x &= 0x5555_5555_5555_5555;
    x = (x | (x >> 1)) & 0x3333_3333_3333_3333;
    x = (x | (x >> 2)) & 0x0f0f_0f0f_0f0f_0f0f;
    x = (x | (x >> 4)) & 0x00ff_00ff_00ff_00ff;
    x = (x | (x >> 8)) & 0x0000_ffff_0000_ffff;
    x = (x | (x >> 16)) & 0xffff_ffff;
    x
}

/// Nested pixel -> (ix, iy, face) coordinates on the base face grid.
pub fn nest_to_xyf(order: u8, ipix: u64) -> (u32, u32, u8) {
    debug_assert!(ipix < npix(order));
    let face = (ipix >> (2 * order)) as u8;
    let pix = ipix & ((1u64 << (2 * order)) - 1);
    let ix = compress_bits(pix) as u32;
    let iy = compress_bits(pix >> 1) as u32;
    (ix, iy, face)
}

/// (ix, iy, face) -> nested pixel.
pub fn xyf_to_nest(order: u8, ix: u32, iy: u32, face: u8) -> u64 {
    ((face as u64) << (2 * order)) | spread_bits(ix as u64) | (spread_bits(iy as u64) << 1)
}

/// Unit vector of a point on a base face, with `(x, y)` in `[0, 1]^2`
/// running along the two cell axes of `face`.
fn face_point_to_vec(x: f64, y: f64, face: u8) -> Vec3 {
    let jr = JRLL[face as usize] as f64 - x - y;
    let (z, nr) = if jr < 1.0 {
        // North polar cap.
        (1.0 - jr * jr / 3.0, jr)
    } else if jr > 3.0 {
        // South polar cap.
        let nr = 4.0 - jr;
        (nr * nr / 3.0 - 1.0, nr)
    } else {
        // Equatorial belt.
        ((2.0 - jr) * 2.0 / 3.0, 1.0)
    };

    let mut tmp = JPLL[face as usize] as f64 * nr + x - y;
    if tmp < 0.0 {
        tmp += 8.0;
    }
    if tmp >= 8.0 {
        tmp -= 8.0;
    }
    let phi = if nr < 1e-15 {
        0.0
    } else {
        (std::f64::consts::FRAC_PI_4 * tmp) / nr
    };

    let sin_theta = ((1.0 - z) * (1.0 + z)).max(0.0).sqrt();
    Vec3::new(sin_theta * phi.cos(), sin_theta * phi.sin(), z)
}

/// The four corners of a cell as unit vectors, in perimeter order:
/// south (lowest), east, north (highest), west. Consecutive entries share an
/// edge; `(0, 2)` and `(1, 3)` are the diagonals.
pub fn cell_vertices(order: u8, ipix: u64) -> [Vec3; 4] {
    let (ix, iy, face) = nest_to_xyf(order, ipix);
    let n = nside(order) as f64;
    let (x0, y0) = (ix as f64 / n, iy as f64 / n);
    let d = 1.0 / n;
    [
        face_point_to_vec(x0, y0, face),
        face_point_to_vec(x0 + d, y0, face),
        face_point_to_vec(x0 + d, y0 + d, face),
        face_point_to_vec(x0, y0 + d, face),
    ]
}

/// Unit vector of the cell center.
pub fn cell_center(order: u8, ipix: u64) -> Vec3 {
    let (ix, iy, face) = nest_to_xyf(order, ipix);
    let n = nside(order) as f64;
    face_point_to_vec((ix as f64 + 0.5) / n, (iy as f64 + 0.5) / n, face)
}

#[cfg(test)]
mod tests {
    use super::{
        ORDER_MAX, ancestor, cell_center, cell_vertices, children, nest_to_xyf, npix, nside,
        offset_within_ancestor, parent, xyf_to_nest,
    };
    use foundation::math::Vec3;

    #[test]
    fn sizes_per_order() {
        assert_eq!(nside(0), 1);
        assert_eq!(nside(3), 8);
        assert_eq!(npix(0), 12);
        assert_eq!(npix(3), 768);
        assert_eq!(nside(ORDER_MAX), 8192);
    }

    #[test]
    fn hierarchy_round_trips() {
        let ipix = 123_456u64;
        for child in children(ipix) {
            assert_eq!(parent(child), ipix);
        }
        assert_eq!(ancestor(ipix, 0), ipix);
        assert_eq!(ancestor(ipix, 2), ipix >> 4);
    }

    #[test]
    fn xyf_round_trips_every_base_cell() {
        let order = 3;
        for ipix in 0..npix(order) {
            let (ix, iy, face) = nest_to_xyf(order, ipix);
            assert!(ix < nside(order) && iy < nside(order));
            assert_eq!(xyf_to_nest(order, ix, iy, face), ipix);
        }
    }

    #[test]
    fn vertices_are_unit_length() {
        for order in [0, 3, 6] {
            for ipix in [0u64, npix(order) / 2, npix(order) - 1] {
                for v in cell_vertices(order, ipix) {
                    assert!((v.length() - 1.0).abs() < 1e-12, "order {order} pix {ipix}");
                }
            }
        }
    }

    #[test]
    fn base_face_zero_touches_the_pole() {
        // Face 0 is a north face: its highest corner is the pole, its lowest
        // sits on the equator.
        let v = cell_vertices(0, 0);
        assert!((v[2].z - 1.0).abs() < 1e-12);
        assert!(v[0].z.abs() < 1e-12);
        assert!((v[1].z - 2.0 / 3.0).abs() < 1e-12);
        assert!((v[3].z - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn children_tile_the_parent() {
        // Every child center must be closer to the parent center than to any
        // other order-1 cell center on the same face.
        let parent_pix = 5u64;
        let pc = cell_center(0, parent_pix);
        for child in children(parent_pix) {
            let cc = cell_center(1, child);
            let d_own = (cc - pc).length();
            for other in 0..12u64 {
                if other == parent_pix {
                    continue;
                }
                let oc = cell_center(0, other);
                assert!(d_own < (cc - oc).length() + 1e-12);
            }
        }
    }

    /// Spherical excess of the triangle (a, b, c), van Oosterom-Strackee.
    fn triangle_area_sr(a: Vec3, b: Vec3, c: Vec3) -> f64 {
        let num = a.dot(b.cross(c)).abs();
        let den = 1.0 + a.dot(b) + b.dot(c) + c.dot(a);
        2.0 * num.atan2(den)
    }

    /// Area of the great-circle quad through a cell's corners. The true
    /// boundary bows away from the chords, so this only approximates the
    /// cell area, but the bowing shrinks fast with order.
    fn quad_area_sr(order: u8, ipix: u64) -> f64 {
        let [s, e, n, w] = cell_vertices(order, ipix);
        triangle_area_sr(s, e, n) + triangle_area_sr(s, n, w)
    }

    #[test]
    fn children_areas_sum_to_the_parent() {
        // The four children partition the parent, so their spherical areas
        // must add up to it. Internal chords cancel; only the boundary
        // bowing is left, well under a percent at these orders.
        for &(order, ipix) in &[(2u8, 13u64), (2, 101), (2, 177), (6, 1_234), (6, 30_000)] {
            let parent = quad_area_sr(order, ipix);
            let sum: f64 = children(ipix)
                .iter()
                .map(|&c| quad_area_sr(order + 1, c))
                .sum();
            let rel = ((sum - parent) / parent).abs();
            assert!(rel < 1e-2, "order {order} pix {ipix}: rel err {rel}");
        }
    }

    #[test]
    fn offsets_within_ancestor_form_a_grid() {
        let ipix = 0b10_01_11u64; // three nested steps below pixel 0
        let (x, y) = offset_within_ancestor(ipix, 3);
        assert!(x < 8 && y < 8);
        assert_eq!(offset_within_ancestor(ipix, 0), (0, 0));

        // Children occupy the four distinct unit offsets.
        let mut seen = Vec::new();
        for child in children(42) {
            seen.push(offset_within_ancestor(child, 1));
        }
        seen.sort_unstable();
        assert_eq!(seen, vec![(0, 0), (0, 1), (1, 0), (1, 1)]);
    }
}
