//! Zoom animation and discrete zoom levels.
//!
//! The wheel steps through a fixed table of fields of view; programmatic
//! zooms animate along a cubic Hermite spline. Retargeting mid-flight keeps
//! the curve C1-continuous: the new segment starts at the current value with
//! the current slope.

use foundation::time::Time;

/// Discrete wheel stops, degrees, from the full sky down to 0.1 arcsec.
pub const LEVELS: [f64; 92] = [
    360.0, 330.0, 300.0, 275.0, 250.0, 225.0, 200.0, 190.0,
    180.0, 170.0, 160.0, 150.0, 140.0, 130.0, 120.0, 110.0, 100.0,
    95.0, 90.0, 85.0, 80.0, 75.0, 70.0, 65.0, 60.0, 55.0, 50.0, 45.0, 40.0,
    35.0, 30.0, 25.0, 20.0, 18.0, 16.0, 14.0, 12.0, 10.0,
    9.0, 8.0, 7.0, 6.0, 5.0, 4.0, 3.0, 2.0, 1.75, 1.5, 1.25, 1.0,
    55.0 / 60.0, 50.0 / 60.0, 45.0 / 60.0, 40.0 / 60.0, 35.0 / 60.0,
    30.0 / 60.0, 25.0 / 60.0, 20.0 / 60.0, 15.0 / 60.0, 10.0 / 60.0,
    9.0 / 60.0, 8.0 / 60.0, 7.0 / 60.0, 6.0 / 60.0, 5.0 / 60.0, 4.0 / 60.0,
    3.0 / 60.0, 2.0 / 60.0, 1.0 / 60.0,
    50.0 / 3600.0, 40.0 / 3600.0, 30.0 / 3600.0, 20.0 / 3600.0, 10.0 / 3600.0,
    9.0 / 3600.0, 8.0 / 3600.0, 7.0 / 3600.0, 6.0 / 3600.0, 5.0 / 3600.0,
    4.0 / 3600.0, 3.0 / 3600.0, 2.0 / 3600.0, 1.0 / 3600.0,
    9.0 / 36000.0, 8.0 / 36000.0, 7.0 / 36000.0, 6.0 / 36000.0, 5.0 / 36000.0,
    4.0 / 36000.0, 3.0 / 36000.0, 2.0 / 36000.0, 1.0 / 36000.0,
];

/// Wheel events are throttled to this many table steps at once.
pub const MAX_IDX_DELTA_PER_THROTTLE: i32 = 2;

pub fn max_fov() -> f64 {
    LEVELS[0]
}

pub fn min_fov() -> f64 {
    LEVELS[LEVELS.len() - 1]
}

/// Steps through [`LEVELS`]. The index persists between wheel events so a
/// fov set programmatically between steps does not reset the ladder.
#[derive(Debug, Default)]
pub struct LevelStepper {
    idx: Option<usize>,
}

impl LevelStepper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next fov after moving `delta` steps (positive zooms out toward 360).
    pub fn step(&mut self, current_fov: f64, delta: i32) -> f64 {
        let idx = match self.idx {
            Some(idx) => idx,
            None => nearest_level_index(current_fov),
        };
        let stepped = (idx as i64 + delta as i64).clamp(0, LEVELS.len() as i64 - 1) as usize;
        self.idx = Some(stepped);
        LEVELS[stepped]
    }

    pub fn reset(&mut self) {
        self.idx = None;
    }
}

/// Index of the level closest to `fov` (the table is descending).
fn nearest_level_index(fov: f64) -> usize {
    let mut best = 0;
    let mut best_err = f64::INFINITY;
    for (i, level) in LEVELS.iter().enumerate() {
        let err = (level - fov).abs();
        if err < best_err {
            best_err = err;
            best = i;
        }
    }
    best
}

fn hermite(x: f64, x1: f64, x2: f64, y1: f64, y2: f64, m1: f64, m2: f64) -> f64 {
    let t = (x - x1) / (x2 - x1);
    let t2 = t * t;
    let t3 = t2 * t;
    (1.0 - 3.0 * t2 + 2.0 * t3) * y1
        + (t - 2.0 * t2 + t3) * m1
        + (3.0 * t2 - 2.0 * t3) * y2
        + (-t2 + t3) * m2
}

fn hermite_prime(x: f64, x1: f64, x2: f64, y1: f64, y2: f64, m1: f64, m2: f64) -> f64 {
    let t = (x - x1) / (x2 - x1);
    let t2 = t * t;
    (1.0 / (x2 - x1))
        * ((-6.0 * t + 6.0 * t2) * y1
            + (1.0 - 4.0 * t + 3.0 * t2) * m1
            + (6.0 * t - 6.0 * t2) * y2
            + m2 * (3.0 * t2 - 2.0 * t))
}

/// An in-flight animated zoom. Time is normalized so one duration maps to
/// one unit of the spline parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoomAnimation {
    start_time: Time,
    duration_s: f64,
    x1: f64,
    x2: f64,
    y1: f64,
    y2: f64,
    m1: f64,
    m2: f64,
    target: f64,
}

impl ZoomAnimation {
    pub fn start(current_fov: f64, target_fov: f64, now: Time, duration_s: f64) -> Self {
        Self {
            start_time: now,
            duration_s: duration_s.max(1e-3),
            x1: 0.0,
            x2: 1.0,
            y1: current_fov,
            y2: target_fov,
            m1: target_fov - current_fov,
            m2: 0.0,
            target: target_fov,
        }
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    /// Redirects the animation toward a new target without a kink: the new
    /// segment picks up the current value and slope and runs one duration
    /// from here.
    pub fn retarget(&mut self, new_target: f64, now: Time) {
        let x = now.seconds_since(self.start_time) / self.duration_s;
        let m1 = hermite_prime(x, self.x1, self.x2, self.y1, self.y2, self.m1, self.m2);
        let y1 = hermite(x, self.x1, self.x2, self.y1, self.y2, self.m1, self.m2);
        self.x1 = x;
        self.x2 = x + 1.0;
        self.y1 = y1;
        self.y2 = new_target;
        self.m1 = m1;
        self.m2 = 0.0;
        self.target = new_target;
    }

    /// Field of view at `now` and whether the animation has finished.
    /// The spline can undershoot below the smallest level; the sample is
    /// clamped there.
    pub fn sample(&self, now: Time) -> (f64, bool) {
        let x = now.seconds_since(self.start_time) / self.duration_s;
        let mut fov = hermite(x, self.x1, self.x2, self.y1, self.y2, self.m1, self.m2);
        if fov < min_fov() {
            fov = min_fov();
        }
        let done = x >= self.x2 || (fov - self.target).abs() < 1e-4;
        if done { (self.target, true) } else { (fov, false) }
    }
}

#[cfg(test)]
mod tests {
    use super::{LEVELS, LevelStepper, ZoomAnimation, max_fov, min_fov};
    use foundation::time::Time;

    #[test]
    fn levels_are_strictly_descending() {
        for pair in LEVELS.windows(2) {
            assert!(pair[0] > pair[1], "{} !> {}", pair[0], pair[1]);
        }
        assert_eq!(max_fov(), 360.0);
        assert!((min_fov() - 1.0 / 36000.0).abs() < 1e-15);
    }

    #[test]
    fn stepper_clamps_at_both_ends() {
        let mut s = LevelStepper::new();
        assert_eq!(s.step(360.0, -5), 360.0);
        let mut s = LevelStepper::new();
        assert_eq!(s.step(min_fov(), 5), min_fov());
    }

    #[test]
    fn stepper_moves_through_the_table() {
        let mut s = LevelStepper::new();
        assert_eq!(s.step(90.0, 1), 85.0);
        assert_eq!(s.step(90.0, 1), 80.0); // index persists, argument ignored
        assert_eq!(s.step(90.0, -2), 90.0);
    }

    #[test]
    fn animation_starts_at_current_and_ends_at_target() {
        let anim = ZoomAnimation::start(60.0, 20.0, Time(0.0), 0.3);
        let (v0, done0) = anim.sample(Time(0.0));
        assert!((v0 - 60.0).abs() < 1e-9);
        assert!(!done0);
        let (v1, done1) = anim.sample(Time(0.3));
        assert_eq!(v1, 20.0);
        assert!(done1);
    }

    #[test]
    fn retarget_is_continuous() {
        let mut anim = ZoomAnimation::start(60.0, 20.0, Time(0.0), 0.3);
        let (before, _) = anim.sample(Time(0.15));
        anim.retarget(120.0, Time(0.15));
        let (after, _) = anim.sample(Time(0.15));
        assert!((before - after).abs() < 1e-9, "{before} vs {after}");
        // And it eventually reaches the new target.
        let (v, done) = anim.sample(Time(0.15 + 0.3));
        assert_eq!(v, 120.0);
        assert!(done);
    }

    #[test]
    fn sample_never_goes_below_the_smallest_level() {
        // Aggressive slope can momentarily undershoot.
        let anim = ZoomAnimation::start(min_fov() * 2.0, min_fov(), Time(0.0), 0.3);
        for i in 0..=30 {
            let (v, _) = anim.sample(Time(i as f64 * 0.01));
            assert!(v >= min_fov());
        }
    }
}
