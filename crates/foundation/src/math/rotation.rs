//! View-centering rotation.
//!
//! Every projection works in a local frame whose x axis points at the view
//! center, y points east and z points north. `Rotation3` carries the change
//! of basis from sky coordinates into that frame.

use super::sphere::LonLat;
use super::vec::Vec3;

/// Orthonormal 3x3 rotation, row-major.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Rotation3 {
    pub rows: [[f64; 3]; 3],
}

impl Rotation3 {
    pub fn identity() -> Self {
        Self {
            rows: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
        }
    }

    pub fn from_rows(rows: [[f64; 3]; 3]) -> Self {
        Self { rows }
    }

    /// Basis looking at `center`: rows are (toward-center, east, north).
    pub fn centered_on(center: LonLat) -> Self {
        let lon = center.lon_deg.to_radians();
        let lat = center.lat_deg.to_radians();
        let (sin_lon, cos_lon) = lon.sin_cos();
        let (sin_lat, cos_lat) = lat.sin_cos();
        Self {
            rows: [
                [cos_lat * cos_lon, cos_lat * sin_lon, sin_lat],
                [-sin_lon, cos_lon, 0.0],
                [-sin_lat * cos_lon, -sin_lat * sin_lon, cos_lat],
            ],
        }
    }

    /// Sky direction -> local view frame.
    pub fn apply(&self, v: Vec3) -> Vec3 {
        let r = &self.rows;
        Vec3::new(
            r[0][0] * v.x + r[0][1] * v.y + r[0][2] * v.z,
            r[1][0] * v.x + r[1][1] * v.y + r[1][2] * v.z,
            r[2][0] * v.x + r[2][1] * v.y + r[2][2] * v.z,
        )
    }

    /// Local view frame -> sky direction (transpose; rotations are orthonormal).
    pub fn apply_inverse(&self, v: Vec3) -> Vec3 {
        let r = &self.rows;
        Vec3::new(
            r[0][0] * v.x + r[1][0] * v.y + r[2][0] * v.z,
            r[0][1] * v.x + r[1][1] * v.y + r[2][1] * v.z,
            r[0][2] * v.x + r[1][2] * v.y + r[2][2] * v.z,
        )
    }

    /// Max deviation of `R * R^T` from the identity.
    pub fn orthonormality_error(&self) -> f64 {
        let r = &self.rows;
        let mut worst: f64 = 0.0;
        for i in 0..3 {
            for j in 0..3 {
                let mut dot = 0.0;
                for k in 0..3 {
                    dot += r[i][k] * r[j][k];
                }
                let expected = if i == j { 1.0 } else { 0.0 };
                worst = worst.max((dot - expected).abs());
            }
        }
        worst
    }
}
