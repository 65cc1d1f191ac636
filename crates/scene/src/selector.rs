//! Interactive region selection.
//!
//! A small pointer-driven state machine: arm it with a selection kind, feed
//! it pointer events, and it eventually yields a [`Region`]. Rectangles and
//! circles are drawn in one drag; polygons accumulate a vertex per click and
//! close on double click.

use foundation::bounds::Aabb2;
use foundation::math::vec::Vec2;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SelectionKind {
    Rect,
    Circle,
    Polygon,
}

/// A finished selection, in screen pixels.
#[derive(Debug, Clone, PartialEq)]
pub enum Region {
    Rect { x: f64, y: f64, w: f64, h: f64 },
    Circle { cx: f64, cy: f64, r: f64 },
    Polygon { vertices: Vec<Vec2> },
}

impl Region {
    pub fn bbox(&self) -> Aabb2 {
        match self {
            Region::Rect { x, y, w, h } => Aabb2::new([*x, *y], [x + w, y + h]),
            Region::Circle { cx, cy, r } => Aabb2::new([cx - r, cy - r], [cx + r, cy + r]),
            Region::Polygon { vertices } => Aabb2::from_points(vertices.iter().copied())
                .unwrap_or(Aabb2::new([0.0, 0.0], [0.0, 0.0])),
        }
    }

    pub fn contains(&self, p: Vec2) -> bool {
        match self {
            Region::Rect { x, y, w, h } => {
                p.x >= *x && p.x <= x + w && p.y >= *y && p.y <= y + h
            }
            Region::Circle { cx, cy, r } => {
                let dx = p.x - cx;
                let dy = p.y - cy;
                dx * dx + dy * dy <= r * r
            }
            Region::Polygon { vertices } => point_in_polygon(vertices, p),
        }
    }
}

/// Even-odd rule; points exactly on an edge may fall either way.
fn point_in_polygon(vertices: &[Vec2], p: Vec2) -> bool {
    if vertices.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = vertices.len() - 1;
    for i in 0..vertices.len() {
        let a = vertices[i];
        let b = vertices[j];
        if (a.y > p.y) != (b.y > p.y) {
            let t = (p.y - a.y) / (b.y - a.y);
            if p.x < a.x + t * (b.x - a.x) {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum PointerEvent {
    Down(Vec2),
    Move(Vec2),
    Up(Vec2),
    DoubleClick(Vec2),
    Cancel,
}

/// What the caller should do after feeding an event.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectorUpdate {
    /// Nothing changed.
    None,
    /// The in-progress preview moved; redraw it.
    Redraw,
    /// Selection finished.
    Done(Region),
    /// Selection abandoned (cancelled, or degenerate at release).
    Cancelled,
}

#[derive(Debug, Clone, PartialEq)]
enum State {
    Idle,
    Armed {
        kind: SelectionKind,
    },
    Dragging {
        kind: SelectionKind,
        start: Vec2,
        current: Vec2,
    },
    Polygon {
        vertices: Vec<Vec2>,
        current: Vec2,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    state: State,
}

impl Default for Selector {
    fn default() -> Self {
        Self::new()
    }
}

impl Selector {
    pub fn new() -> Self {
        Self { state: State::Idle }
    }

    /// Arms the selector; the next pointer down starts the selection.
    /// Any selection already in progress is dropped.
    pub fn arm(&mut self, kind: SelectionKind) {
        self.state = State::Armed { kind };
    }

    pub fn disarm(&mut self) {
        self.state = State::Idle;
    }

    /// True while the selector owns pointer input (armed or mid-selection).
    pub fn is_active(&self) -> bool {
        !matches!(self.state, State::Idle)
    }

    /// The shape as it stands mid-selection, for preview rendering.
    pub fn preview(&self) -> Option<Region> {
        match &self.state {
            State::Idle | State::Armed { .. } => None,
            State::Dragging {
                kind,
                start,
                current,
            } => Some(drag_region(*kind, *start, *current)),
            State::Polygon { vertices, current } => {
                let mut v = vertices.clone();
                v.push(*current);
                Some(Region::Polygon { vertices: v })
            }
        }
    }

    pub fn handle(&mut self, event: PointerEvent) -> SelectorUpdate {
        match (&mut self.state, event) {
            (State::Idle, _) => SelectorUpdate::None,

            (_, PointerEvent::Cancel) => {
                let was_drawing = !matches!(self.state, State::Armed { .. });
                self.state = State::Idle;
                if was_drawing {
                    SelectorUpdate::Cancelled
                } else {
                    SelectorUpdate::None
                }
            }

            (State::Armed { kind }, PointerEvent::Down(p)) => {
                self.state = match kind {
                    SelectionKind::Polygon => State::Polygon {
                        vertices: vec![p],
                        current: p,
                    },
                    kind => State::Dragging {
                        kind: *kind,
                        start: p,
                        current: p,
                    },
                };
                SelectorUpdate::Redraw
            }
            (State::Armed { .. }, _) => SelectorUpdate::None,

            (State::Dragging { current, .. }, PointerEvent::Move(p)) => {
                *current = p;
                SelectorUpdate::Redraw
            }
            (
                State::Dragging {
                    kind,
                    start,
                    current,
                },
                PointerEvent::Up(p),
            ) => {
                *current = p;
                let region = drag_region(*kind, *start, p);
                self.state = State::Idle;
                if degenerate(&region) {
                    SelectorUpdate::Cancelled
                } else {
                    SelectorUpdate::Done(region)
                }
            }
            (State::Dragging { .. }, _) => SelectorUpdate::None,

            (State::Polygon { vertices, current }, PointerEvent::Down(p)) => {
                vertices.push(p);
                *current = p;
                SelectorUpdate::Redraw
            }
            (State::Polygon { current, .. }, PointerEvent::Move(p)) => {
                *current = p;
                SelectorUpdate::Redraw
            }
            (State::Polygon { vertices, .. }, PointerEvent::DoubleClick(_)) => {
                let vertices = std::mem::take(vertices);
                self.state = State::Idle;
                if vertices.len() >= 3 {
                    SelectorUpdate::Done(Region::Polygon { vertices })
                } else {
                    SelectorUpdate::Cancelled
                }
            }
            (State::Polygon { .. }, PointerEvent::Up(_)) => SelectorUpdate::None,
        }
    }
}

fn drag_region(kind: SelectionKind, start: Vec2, end: Vec2) -> Region {
    match kind {
        SelectionKind::Rect => Region::Rect {
            x: start.x.min(end.x),
            y: start.y.min(end.y),
            w: (end.x - start.x).abs(),
            h: (end.y - start.y).abs(),
        },
        SelectionKind::Circle => Region::Circle {
            cx: start.x,
            cy: start.y,
            r: (end - start).length(),
        },
        SelectionKind::Polygon => Region::Polygon {
            vertices: vec![start, end],
        },
    }
}

fn degenerate(region: &Region) -> bool {
    match region {
        Region::Rect { w, h, .. } => *w == 0.0 || *h == 0.0,
        Region::Circle { r, .. } => *r == 0.0,
        Region::Polygon { vertices } => vertices.len() < 3,
    }
}

#[cfg(test)]
mod tests {
    use super::{PointerEvent, Region, SelectionKind, Selector, SelectorUpdate};
    use foundation::math::vec::Vec2;
    use pretty_assertions::assert_eq;

    fn p(x: f64, y: f64) -> Vec2 {
        Vec2::new(x, y)
    }

    #[test]
    fn idle_ignores_pointer_events() {
        let mut s = Selector::new();
        assert_eq!(s.handle(PointerEvent::Down(p(1.0, 1.0))), SelectorUpdate::None);
        assert!(!s.is_active());
    }

    #[test]
    fn rect_drag_produces_a_normalized_rect() {
        let mut s = Selector::new();
        s.arm(SelectionKind::Rect);
        s.handle(PointerEvent::Down(p(100.0, 80.0)));
        s.handle(PointerEvent::Move(p(40.0, 120.0)));
        // Dragging up-left still yields positive extents.
        let done = s.handle(PointerEvent::Up(p(40.0, 120.0)));
        assert_eq!(
            done,
            SelectorUpdate::Done(Region::Rect {
                x: 40.0,
                y: 80.0,
                w: 60.0,
                h: 40.0
            })
        );
        assert!(!s.is_active());
    }

    #[test]
    fn zero_extent_drag_is_cancelled() {
        let mut s = Selector::new();
        s.arm(SelectionKind::Rect);
        s.handle(PointerEvent::Down(p(10.0, 10.0)));
        assert_eq!(s.handle(PointerEvent::Up(p(10.0, 10.0))), SelectorUpdate::Cancelled);
    }

    #[test]
    fn circle_radius_is_distance_from_anchor() {
        let mut s = Selector::new();
        s.arm(SelectionKind::Circle);
        s.handle(PointerEvent::Down(p(0.0, 0.0)));
        let done = s.handle(PointerEvent::Up(p(3.0, 4.0)));
        assert_eq!(
            done,
            SelectorUpdate::Done(Region::Circle {
                cx: 0.0,
                cy: 0.0,
                r: 5.0
            })
        );
    }

    #[test]
    fn polygon_closes_on_double_click() {
        let mut s = Selector::new();
        s.arm(SelectionKind::Polygon);
        s.handle(PointerEvent::Down(p(0.0, 0.0)));
        s.handle(PointerEvent::Down(p(10.0, 0.0)));
        s.handle(PointerEvent::Move(p(10.0, 10.0)));
        assert!(s.preview().is_some());
        s.handle(PointerEvent::Down(p(10.0, 10.0)));
        let done = s.handle(PointerEvent::DoubleClick(p(10.0, 10.0)));
        let SelectorUpdate::Done(Region::Polygon { vertices }) = done else {
            panic!("expected a polygon, got {done:?}");
        };
        assert_eq!(vertices.len(), 3);
        assert!(!s.is_active());
    }

    #[test]
    fn polygon_with_too_few_vertices_is_cancelled() {
        let mut s = Selector::new();
        s.arm(SelectionKind::Polygon);
        s.handle(PointerEvent::Down(p(0.0, 0.0)));
        s.handle(PointerEvent::Down(p(10.0, 0.0)));
        assert_eq!(
            s.handle(PointerEvent::DoubleClick(p(10.0, 0.0))),
            SelectorUpdate::Cancelled
        );
    }

    #[test]
    fn cancel_mid_drag_returns_to_idle() {
        let mut s = Selector::new();
        s.arm(SelectionKind::Circle);
        s.handle(PointerEvent::Down(p(0.0, 0.0)));
        assert_eq!(s.handle(PointerEvent::Cancel), SelectorUpdate::Cancelled);
        assert!(!s.is_active());
    }

    #[test]
    fn region_containment() {
        let rect = Region::Rect {
            x: 0.0,
            y: 0.0,
            w: 10.0,
            h: 10.0,
        };
        assert!(rect.contains(p(5.0, 5.0)));
        assert!(!rect.contains(p(11.0, 5.0)));

        let circle = Region::Circle {
            cx: 0.0,
            cy: 0.0,
            r: 5.0,
        };
        assert!(circle.contains(p(3.0, 4.0)));
        assert!(!circle.contains(p(3.1, 4.0)));

        let tri = Region::Polygon {
            vertices: vec![p(0.0, 0.0), p(10.0, 0.0), p(0.0, 10.0)],
        };
        assert!(tri.contains(p(2.0, 2.0)));
        assert!(!tri.contains(p(8.0, 8.0)));
        let bbox = tri.bbox();
        assert_eq!(bbox.min, [0.0, 0.0]);
        assert_eq!(bbox.max, [10.0, 10.0]);
    }
}
