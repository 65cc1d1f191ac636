use foundation::math::frames::CooFrame;
use foundation::math::projection::ProjectionKind;
use foundation::math::sphere::LonLat;

use crate::frame::Frame;

/// Everything the viewer reports back to its embedder.
///
/// Payloads stay primitive (angles, names, indices) so the bus never drags
/// scene state out of the engine; listeners that need more look it up.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewerEvent {
    PositionChanged { center: LonLat },
    ZoomChanged { fov_deg: f64 },
    FrameChanged { frame: CooFrame },
    ProjectionChanged { kind: ProjectionKind },
    LayerAdded { name: String },
    LayerRemoved { name: String },
    LayerError { name: String, message: String },
    TileLoaded { url: String, success: bool },
    GeometryError { order: u8, ipix: u64 },
    ObjectClicked { layer: String, source_index: usize },
    SelectionDone { vertex_count: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub frame_index: u64,
    pub kind: ViewerEvent,
}

/// Per-tick event sink. The embedder drains it after every tick; nothing is
/// delivered asynchronously.
#[derive(Debug, Default)]
pub struct EventBus {
    events: Vec<Event>,
}

impl EventBus {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, frame: Frame, kind: ViewerEvent) {
        self.events.push(Event {
            frame_index: frame.index,
            kind,
        });
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn drain(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}
