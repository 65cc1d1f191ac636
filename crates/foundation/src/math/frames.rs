//! Coordinate frame conversion.
//!
//! Two frames are supported: equatorial ICRS (J2000) and galactic. The
//! conversion is a fixed rotation applied on unit vectors, so it is exact up
//! to rounding and safe at the poles and across the 0/360 seam.

use super::sphere::{LonLat, lonlat_to_vec, vec_to_lonlat};
use super::vec::Vec3;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum CooFrame {
    /// Equatorial ICRS (J2000).
    Icrs,
    Galactic,
}

const GALACTIC_TO_ICRS: [[f64; 3]; 3] = [
    [-0.054_875_560_402_435_9, 0.494_109_427_943_568_1, -0.867_666_148_981_161_0],
    [-0.873_437_090_247_923_7, -0.444_829_629_919_504_5, -0.198_076_373_464_673_7],
    [-0.483_835_015_526_738_1, 0.746_982_244_476_370_7, 0.455_983_776_232_537_2],
];

const ICRS_TO_GALACTIC: [[f64; 3]; 3] = [
    [-0.054_875_560_402_435_9, -0.873_437_090_247_923_7, -0.483_835_015_526_738_1],
    [0.494_109_427_943_568_1, -0.444_829_629_919_504_5, 0.746_982_244_476_370_7],
    [-0.867_666_148_981_161_0, -0.198_076_373_464_673_7, 0.455_983_776_232_537_2],
];

fn mul(m: &[[f64; 3]; 3], v: Vec3) -> Vec3 {
    Vec3::new(
        m[0][0] * v.x + m[0][1] * v.y + m[0][2] * v.z,
        m[1][0] * v.x + m[1][1] * v.y + m[1][2] * v.z,
        m[2][0] * v.x + m[2][1] * v.y + m[2][2] * v.z,
    )
}

pub fn convert_vec(v: Vec3, from: CooFrame, to: CooFrame) -> Vec3 {
    match (from, to) {
        (CooFrame::Galactic, CooFrame::Icrs) => mul(&GALACTIC_TO_ICRS, v),
        (CooFrame::Icrs, CooFrame::Galactic) => mul(&ICRS_TO_GALACTIC, v),
        _ => v,
    }
}

pub fn convert(p: LonLat, from: CooFrame, to: CooFrame) -> LonLat {
    if from == to {
        return p;
    }
    vec_to_lonlat(convert_vec(lonlat_to_vec(p), from, to))
}

#[cfg(test)]
mod tests {
    use super::{CooFrame, GALACTIC_TO_ICRS, ICRS_TO_GALACTIC, convert};
    use crate::math::sphere::LonLat;

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn galactic_center_is_near_sgr_a() {
        let gc = convert(LonLat::new(0.0, 0.0), CooFrame::Galactic, CooFrame::Icrs);
        // Sgr A* sits within arcminutes of the galactic origin.
        assert_close(gc.lon_deg, 266.405, 0.01);
        assert_close(gc.lat_deg, -28.936, 0.01);
    }

    #[test]
    fn north_galactic_pole() {
        let ngp = convert(LonLat::new(0.0, 90.0), CooFrame::Galactic, CooFrame::Icrs);
        assert_close(ngp.lon_deg, 192.859, 0.01);
        assert_close(ngp.lat_deg, 27.128, 0.01);
    }

    #[test]
    fn round_trip_is_tight() {
        for &(lon, lat) in &[(0.0, 0.0), (83.63, 22.01), (266.4, -29.0), (10.0, 89.0)] {
            let p = LonLat::new(lon, lat);
            let rt = convert(
                convert(p, CooFrame::Icrs, CooFrame::Galactic),
                CooFrame::Galactic,
                CooFrame::Icrs,
            );
            assert_close(rt.lon_deg, p.lon_deg, 1e-9);
            assert_close(rt.lat_deg, p.lat_deg, 1e-9);
        }
    }

    #[test]
    fn matrices_are_exact_transposes() {
        // The rotation is orthogonal, so the inverse matrix must be the
        // transpose bit for bit. A dropped digit here skews round trips.
        for i in 0..3 {
            for j in 0..3 {
                assert_eq!(ICRS_TO_GALACTIC[i][j], GALACTIC_TO_ICRS[j][i], "({i},{j})");
            }
        }
    }

    #[test]
    fn same_frame_is_identity() {
        let p = LonLat::new(123.4, -56.7);
        assert_eq!(convert(p, CooFrame::Icrs, CooFrame::Icrs), p);
    }
}
