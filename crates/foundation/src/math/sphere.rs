//! Celestial sphere coordinates.
//!
//! Positions are angular pairs in degrees; the engine converts to unit
//! vectors for any math that crosses the poles or the 0/360 seam.

use super::Vec3;

/// A position on the unit sphere, degrees.
///
/// `lon_deg` is stored wrapped to `[0, 360)`; `lat_deg` in `[-90, 90]`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LonLat {
    pub lon_deg: f64,
    pub lat_deg: f64,
}

impl LonLat {
    pub fn new(lon_deg: f64, lat_deg: f64) -> Self {
        Self {
            lon_deg: wrap_lon_deg(lon_deg),
            lat_deg: clamp_lat_deg(lat_deg),
        }
    }

    pub fn to_vec(self) -> Vec3 {
        lonlat_to_vec(self)
    }
}

/// Wrap a longitude into `[0, 360)`.
pub fn wrap_lon_deg(lon: f64) -> f64 {
    let l = lon % 360.0;
    if l < 0.0 { l + 360.0 } else { l }
}

/// Clamp a latitude into `[-90, 90]`.
pub fn clamp_lat_deg(lat: f64) -> f64 {
    lat.clamp(-90.0, 90.0)
}

pub fn lonlat_to_vec(p: LonLat) -> Vec3 {
    let lon = p.lon_deg.to_radians();
    let lat = p.lat_deg.to_radians();
    let cos_lat = lat.cos();
    Vec3::new(cos_lat * lon.cos(), cos_lat * lon.sin(), lat.sin())
}

/// Inverse of [`lonlat_to_vec`] for unit-length input.
///
/// At the poles the longitude is undefined; 0 is returned.
pub fn vec_to_lonlat(v: Vec3) -> LonLat {
    let r2 = v.x * v.x + v.y * v.y;
    if r2 <= 0.0 {
        let lat = if v.z >= 0.0 { 90.0 } else { -90.0 };
        return LonLat {
            lon_deg: 0.0,
            lat_deg: lat,
        };
    }
    let lon = v.y.atan2(v.x).to_degrees();
    let lat = v.z.atan2(r2.sqrt()).to_degrees();
    LonLat {
        lon_deg: wrap_lon_deg(lon),
        lat_deg: clamp_lat_deg(lat),
    }
}

/// Great-circle separation between two positions, degrees.
pub fn angular_separation_deg(a: LonLat, b: LonLat) -> f64 {
    let va = lonlat_to_vec(a);
    let vb = lonlat_to_vec(b);
    // atan2 form stays accurate for both tiny and near-180 separations.
    let cross = va.cross(vb).length();
    let dot = va.dot(vb);
    cross.atan2(dot).to_degrees()
}
