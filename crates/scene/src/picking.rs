//! Deterministic marker picking in screen space.

use foundation::math::precision::stable_total_cmp_f64;
use foundation::math::vec::Vec2;

/// A projected catalog source, ready for hit testing.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ScreenMarker {
    /// Index of the source in its catalog.
    pub source_index: usize,
    pub px: Vec2,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PickHit {
    pub source_index: usize,
    pub distance_px: f64,
}

/// Nearest marker within `tolerance_px` of the cursor.
///
/// Ordering contract:
/// - The closest marker wins.
/// - At equal distance, the lower `source_index` wins.
pub fn pick_nearest(
    markers: &[ScreenMarker],
    cursor: Vec2,
    tolerance_px: f64,
) -> Option<PickHit> {
    let mut best: Option<PickHit> = None;
    for marker in markers {
        let distance_px = (marker.px - cursor).length();
        if distance_px > tolerance_px {
            continue;
        }
        let candidate = PickHit {
            source_index: marker.source_index,
            distance_px,
        };
        let better = match &best {
            None => true,
            Some(b) => match stable_total_cmp_f64(candidate.distance_px, b.distance_px) {
                std::cmp::Ordering::Less => true,
                std::cmp::Ordering::Equal => candidate.source_index < b.source_index,
                std::cmp::Ordering::Greater => false,
            },
        };
        if better {
            best = Some(candidate);
        }
    }
    best
}
