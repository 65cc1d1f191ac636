//! Sky-to-plane projections.
//!
//! Nine classical projections over a common contract: `project` maps a sky
//! position to normalized plane coordinates (or `None` outside the
//! projection's domain, e.g. the far hemisphere in gnomonic), `unproject`
//! inverts it. Both work through the view-centering rotation so the center
//! always lands on (0, 0).

use super::rotation::Rotation3;
use super::sphere::{LonLat, lonlat_to_vec};
use super::vec::{Vec2, Vec3};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ProjectionKind {
    /// Gnomonic.
    Tan,
    /// Stereographic.
    Stg,
    /// Orthographic.
    Sin,
    /// Zenithal equal-area.
    Zea,
    /// Zenithal equidistant (Schmidt plates).
    Arc,
    Aitoff,
    /// Global sinusoidal (Sanson).
    Gls,
    Mercator,
    Lambert,
}

impl ProjectionKind {
    /// Largest field of view the projection can display, degrees.
    pub fn fov_limit_deg(self) -> f64 {
        match self {
            ProjectionKind::Tan => 150.0,
            ProjectionKind::Sin => 180.0,
            _ => 360.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    kind: ProjectionKind,
    center: LonLat,
    rot: Rotation3,
}

impl Projection {
    pub fn new(kind: ProjectionKind, center: LonLat) -> Self {
        Self {
            kind,
            center,
            rot: Rotation3::centered_on(center),
        }
    }

    pub fn kind(&self) -> ProjectionKind {
        self.kind
    }

    pub fn center(&self) -> LonLat {
        self.center
    }

    pub fn set_center(&mut self, center: LonLat) {
        self.center = center;
        self.rot = Rotation3::centered_on(center);
    }

    pub fn set_kind(&mut self, kind: ProjectionKind) {
        self.kind = kind;
    }

    /// Sky position -> plane. `None` outside the projection domain.
    pub fn project(&self, p: LonLat) -> Option<Vec2> {
        self.project_vec(lonlat_to_vec(p))
    }

    /// Same as [`project`](Self::project) for an already-built unit vector.
    pub fn project_vec(&self, v: Vec3) -> Option<Vec2> {
        let local = self.rot.apply(v);
        let plane = forward(self.kind, local)?;
        // Plane axes run opposite to the local frame so that east is left
        // and north is up on screen, as on the sky.
        Some(Vec2::new(-plane.x, -plane.y))
    }

    /// Plane -> sky position. `None` outside the projection limits.
    pub fn unproject(&self, xy: Vec2) -> Option<LonLat> {
        let local = inverse(self.kind, Vec2::new(-xy.x, -xy.y))?;
        let v = self.rot.apply_inverse(local);
        let r2 = v.x * v.x + v.y * v.y;
        if r2 == 0.0 && v.z == 0.0 {
            return None;
        }
        Some(super::sphere::vec_to_lonlat(v))
    }
}

/// Local unit vector (x toward center) -> plane coordinates.
fn forward(kind: ProjectionKind, u: Vec3) -> Option<Vec2> {
    let (x, y, z) = (u.x, u.y, u.z);
    let r = y.hypot(x);
    if r == 0.0 && z == 0.0 {
        return None;
    }

    match kind {
        ProjectionKind::Tan => {
            if x > 0.0 {
                Some(Vec2::new(y / x, z / x))
            } else {
                None
            }
        }
        ProjectionKind::Stg => {
            let den = (1.0 + x) / 2.0;
            if den > 0.0 {
                Some(Vec2::new(y / den, z / den))
            } else {
                None
            }
        }
        ProjectionKind::Sin => {
            if x >= 0.0 {
                Some(Vec2::new(y, z))
            } else {
                None
            }
        }
        ProjectionKind::Zea => {
            let den = ((1.0 + x) / 2.0).sqrt();
            if den != 0.0 {
                Some(Vec2::new(y / den, z / den))
            } else {
                // Antipode of the center.
                Some(Vec2::new(2.0, 0.0))
            }
        }
        ProjectionKind::Arc => {
            if x <= -1.0 {
                Some(Vec2::new(std::f64::consts::PI, 0.0))
            } else {
                let rr = y.hypot(z);
                let den = if x > 0.0 { asinc(rr) } else { x.acos() / rr };
                Some(Vec2::new(y * den, z * den))
            }
        }
        ProjectionKind::Aitoff => {
            let mut den = (r * (r + x) / 2.0).sqrt();
            let mut px = (2.0 * r * (r - x)).sqrt();
            den = ((1.0 + den) / 2.0).sqrt();
            px /= den;
            let py = z / den;
            if y < 0.0 {
                px = -px;
            }
            Some(Vec2::new(px, py))
        }
        ProjectionKind::Gls => {
            let py = z.asin();
            let px = if r != 0.0 { y.atan2(x) * r } else { 0.0 };
            Some(Vec2::new(px, py))
        }
        ProjectionKind::Mercator => {
            if r != 0.0 {
                Some(Vec2::new(y.atan2(x), z.atanh()))
            } else {
                None
            }
        }
        ProjectionKind::Lambert => {
            let px = if r != 0.0 { y.atan2(x) } else { 0.0 };
            Some(Vec2::new(px, z))
        }
    }
}

/// Plane coordinates -> local unit vector. Inverse of [`forward`].
fn inverse(kind: ProjectionKind, p: Vec2) -> Option<Vec3> {
    let (px, py) = (p.x, p.y);

    match kind {
        ProjectionKind::Tan => {
            let x = 1.0 / (1.0 + px * px + py * py).sqrt();
            Some(Vec3::new(x, px * x, py * x))
        }
        ProjectionKind::Stg => {
            let r = (px * px + py * py) / 4.0;
            let s = 1.0 + r;
            Some(Vec3::new((1.0 - r) / s, px / s, py / s))
        }
        ProjectionKind::Sin => {
            let s = 1.0 - px * px - py * py;
            if s < 0.0 {
                return None;
            }
            Some(Vec3::new(s.sqrt(), px, py))
        }
        ProjectionKind::Zea => {
            let r = (px * px + py * py) / 4.0;
            if r > 1.0 {
                return None;
            }
            let s = (1.0 - r).sqrt();
            Some(Vec3::new(1.0 - 2.0 * r, s * px, s * py))
        }
        ProjectionKind::Arc => {
            let r = px.hypot(py);
            if r > std::f64::consts::PI {
                return None;
            }
            let s = sinc(r);
            Some(Vec3::new(r.cos(), s * px, s * py))
        }
        ProjectionKind::Aitoff => {
            // Domain is the ellipse with semi-axes 2*sqrt(2) and sqrt(2).
            let r = px * px / 8.0 + py * py / 2.0;
            if r > 1.0 {
                return None;
            }
            let mut x = 1.0 - r;
            let s = (1.0 - r / 2.0).sqrt();
            let mut y = px * s / 2.0;
            let z = py * s;
            // Double the half-longitude.
            let rb = x.hypot(y);
            if rb != 0.0 {
                let s = x;
                x = (s * s - y * y) / rb;
                y = 2.0 * s * y / rb;
            }
            Some(Vec3::new(x, y, z))
        }
        ProjectionKind::Gls => {
            let z = py.sin();
            let r = 1.0 - z * z;
            if r < 0.0 {
                return None;
            }
            let r = r.sqrt();
            let lon = if r != 0.0 { px / r } else { 0.0 };
            Some(Vec3::new(r * lon.cos(), r * lon.sin(), z))
        }
        ProjectionKind::Mercator => {
            let z = py.tanh();
            let r = 1.0 / py.cosh();
            Some(Vec3::new(r * px.cos(), r * px.sin(), z))
        }
        ProjectionKind::Lambert => {
            let z = py;
            let r = 1.0 - z * z;
            if r < 0.0 {
                return None;
            }
            let r = r.sqrt();
            Some(Vec3::new(r * px.cos(), r * px.sin(), z))
        }
    }
}

/// asin(x)/x, continuous at 0.
fn asinc(x: f64) -> f64 {
    if x.abs() < 1e-8 {
        1.0 + x * x / 6.0
    } else {
        x.asin() / x
    }
}

/// sin(x)/x, continuous at 0.
fn sinc(x: f64) -> f64 {
    if x.abs() < 1e-8 {
        1.0 - x * x / 6.0
    } else {
        x.sin() / x
    }
}
