//! Coordinate grid overlay: parallels and meridians of the current view
//! frame, sampled into screen polylines with edge labels.

use serde::{Deserialize, Serialize};

use foundation::math::sphere::LonLat;
use foundation::math::vec::Vec2;
use scene::view::ViewState;

/// Grid steps offered, degrees, down to one arcsecond.
const STEPS_DEG: [f64; 16] = [
    45.0,
    30.0,
    15.0,
    10.0,
    5.0,
    2.0,
    1.0,
    30.0 / 60.0,
    15.0 / 60.0,
    10.0 / 60.0,
    5.0 / 60.0,
    2.0 / 60.0,
    1.0 / 60.0,
    30.0 / 3600.0,
    10.0 / 3600.0,
    1.0 / 3600.0,
];

/// Samples per polyline.
const SAMPLES: usize = 64;

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridCfg {
    pub enabled: bool,
    pub show_labels: bool,
    /// RGBA, straight through to the render command.
    pub color: [f32; 4],
}

impl Default for GridCfg {
    fn default() -> Self {
        Self {
            enabled: false,
            show_labels: true,
            color: [0.5, 0.8, 1.0, 0.6],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridLabel {
    pub text: String,
    pub px: Vec2,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct GridDraw {
    pub polylines: Vec<Vec<Vec2>>,
    pub labels: Vec<GridLabel>,
}

/// Largest step that still fits at least three lines across the fov.
pub fn grid_step_deg(fov_deg: f64) -> f64 {
    for step in STEPS_DEG {
        if step <= fov_deg / 3.0 {
            return step;
        }
    }
    STEPS_DEG[STEPS_DEG.len() - 1]
}

pub fn build_grid(view: &ViewState, cfg: &GridCfg) -> GridDraw {
    let mut out = GridDraw::default();
    if !cfg.enabled {
        return out;
    }

    let fov = view.fov_deg();
    let step = grid_step_deg(fov);
    let center = view.center();
    let span = fov.min(180.0);

    // Parallels across the latitude band in view, poles excluded.
    let lat_lo = (center.lat_deg - span).max(-90.0 + step);
    let lat_hi = (center.lat_deg + span).min(90.0 - step);
    let mut lat = (lat_lo / step).ceil() * step;
    while lat <= lat_hi {
        let line = |t: f64| LonLat::new(center.lon_deg - span + 2.0 * span * t, lat);
        sample_line(view, cfg, &line, format_angle(lat, step), &mut out);
        lat += step;
    }

    // Meridians around the longitude band in view.
    let mut k = ((center.lon_deg - span) / step).ceil();
    while k * step <= center.lon_deg + span {
        let lon = k * step;
        let line = |t: f64| {
            LonLat::new(
                lon,
                (center.lat_deg - span + 2.0 * span * t).clamp(-89.9, 89.9),
            )
        };
        sample_line(
            view,
            cfg,
            &line,
            format_angle(LonLat::new(lon, 0.0).lon_deg, step),
            &mut out,
        );
        k += 1.0;
    }

    out
}

/// Projects one grid line, splitting it where the projection loses points
/// or where the plot jumps across a seam.
fn sample_line(
    view: &ViewState,
    cfg: &GridCfg,
    line: &dyn Fn(f64) -> LonLat,
    label: String,
    out: &mut GridDraw,
) {
    let jump_limit = 0.5 * view.viewport().largest_dim();
    let mut run: Vec<Vec2> = Vec::new();
    let mut labeled = false;

    let mut flush = |run: &mut Vec<Vec2>, labeled: &mut bool| {
        if run.len() < 2 {
            run.clear();
            return;
        }
        let visible = view.viewport().any_corner_visible(run);
        if visible {
            if cfg.show_labels && !*labeled {
                out.labels.push(GridLabel {
                    text: label.clone(),
                    px: run[0],
                });
                *labeled = true;
            }
            out.polylines.push(std::mem::take(run));
        } else {
            run.clear();
        }
    };

    for i in 0..=SAMPLES {
        let t = i as f64 / SAMPLES as f64;
        match view.project(line(t)) {
            Some(px) => {
                if let Some(prev) = run.last()
                    && (px - *prev).length() > jump_limit
                {
                    flush(&mut run, &mut labeled);
                }
                run.push(px);
            }
            None => flush(&mut run, &mut labeled),
        }
    }
    flush(&mut run, &mut labeled);
}

/// Degrees rendered at a precision matching the grid step.
fn format_angle(value_deg: f64, step_deg: f64) -> String {
    if step_deg >= 1.0 {
        format!("{value_deg:.0}\u{b0}")
    } else if step_deg >= 1.0 / 60.0 {
        let sign = if value_deg < 0.0 { "-" } else { "" };
        let total = value_deg.abs();
        let d = total.floor();
        let m = ((total - d) * 60.0).round();
        format!("{sign}{d:.0}\u{b0}{m:02.0}'")
    } else {
        let sign = if value_deg < 0.0 { "-" } else { "" };
        let total = value_deg.abs();
        let d = total.floor();
        let m = ((total - d) * 60.0).floor();
        let s = ((total - d) * 3600.0 - m * 60.0).round();
        format!("{sign}{d:.0}\u{b0}{m:02.0}'{s:02.0}\"")
    }
}

#[cfg(test)]
mod tests {
    use super::{GridCfg, build_grid, format_angle, grid_step_deg};
    use foundation::math::sphere::LonLat;
    use scene::view::ViewState;

    #[test]
    fn step_tracks_the_fov() {
        assert_eq!(grid_step_deg(180.0), 45.0);
        assert_eq!(grid_step_deg(60.0), 15.0);
        assert_eq!(grid_step_deg(10.0), 2.0);
        assert_eq!(grid_step_deg(1.0), 15.0 / 60.0);
        // Never below the finest step.
        assert_eq!(grid_step_deg(1e-6), 1.0 / 3600.0);
    }

    #[test]
    fn disabled_grid_is_empty() {
        let view = ViewState::new(400.0, 400.0);
        let draw = build_grid(&view, &GridCfg::default());
        assert!(draw.polylines.is_empty());
        assert!(draw.labels.is_empty());
    }

    #[test]
    fn equator_projects_as_a_horizontal_line() {
        let view = ViewState::new(400.0, 400.0);
        let cfg = GridCfg {
            enabled: true,
            ..GridCfg::default()
        };
        let draw = build_grid(&view, &cfg);
        assert!(!draw.polylines.is_empty());
        assert!(!draw.labels.is_empty());
        // Center (0, 0): the equator parallel is the horizontal midline.
        let equator = draw
            .polylines
            .iter()
            .find(|line| line.iter().all(|p| (p.y - 200.0).abs() < 1e-6));
        assert!(equator.is_some(), "no equator line found");
    }

    #[test]
    fn labels_follow_the_step_precision() {
        assert_eq!(format_angle(45.0, 5.0), "45\u{b0}");
        assert_eq!(format_angle(22.5, 0.5), "22\u{b0}30'");
        assert_eq!(format_angle(-0.25, 0.25), "-0\u{b0}15'");
        assert_eq!(format_angle(10.0 / 3600.0, 1.0 / 3600.0), "0\u{b0}00'10\"");
    }

    #[test]
    fn narrow_fields_still_produce_lines() {
        let mut view = ViewState::new(400.0, 400.0);
        view.point_to(LonLat::new(83.63, 22.01));
        view.set_fov(0.5);
        let cfg = GridCfg {
            enabled: true,
            ..GridCfg::default()
        };
        let draw = build_grid(&view, &cfg);
        assert!(!draw.polylines.is_empty());
    }
}
