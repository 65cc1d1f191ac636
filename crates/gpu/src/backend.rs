//! The seam between the engine and an actual renderer.

use std::fmt;

use crate::commands::RenderFrame;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The rendering device is gone (context lost, window closed).
    Unavailable,
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::Unavailable => write!(f, "rendering backend unavailable"),
        }
    }
}

impl std::error::Error for BackendError {}

pub trait RenderBackend {
    fn begin_frame(&mut self, width: f64, height: f64);
    fn submit(&mut self, frame: &RenderFrame) -> Result<(), BackendError>;
}

/// Test backend that records everything it is handed.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    pub begun: Vec<(f64, f64)>,
    pub frames: Vec<RenderFrame>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_frame(&self) -> Option<&RenderFrame> {
        self.frames.last()
    }
}

impl RenderBackend for RecordingBackend {
    fn begin_frame(&mut self, width: f64, height: f64) {
        self.begun.push((width, height));
    }

    fn submit(&mut self, frame: &RenderFrame) -> Result<(), BackendError> {
        self.frames.push(frame.clone());
        Ok(())
    }
}
