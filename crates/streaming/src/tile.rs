/// Lifecycle of a tile slot: Pending → Ready | Errored.
///
/// The engine never retries an `Errored` tile on its own; the slot has to be
/// evicted and re-requested for another attempt.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TileState {
    Pending,
    Ready { width: u32, height: u32 },
    Errored,
}

impl TileState {
    pub fn is_ready(&self) -> bool {
        matches!(self, TileState::Ready { .. })
    }
}

/// A tile slot in the buffer. The decoded pixels live on the embedder's
/// side, keyed by the same URL; the engine only tracks state and dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct TileImage {
    pub url: String,
    pub state: TileState,
}

impl TileImage {
    pub fn pending(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            state: TileState::Pending,
        }
    }
}
