//! Still-image capture from the live video feed.

use std::fmt::Debug;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::ExtendedColorType;
use image::codecs::jpeg::JpegEncoder;

/// One RGB frame pulled from the video source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    /// Tightly packed RGB8 pixels, row-major.
    pub rgb: Vec<u8>,
}

/// Live video source capability.
///
/// Implementations hand out the most recent frame at the source's native
/// resolution; a source that is not streaming returns `None`.
pub trait FrameSource: Send + Sync + Debug {
    fn latest_frame(&self) -> Option<Frame>;
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum CaptureError {
    #[error("Camera is not streaming")]
    NotStreaming,
    #[error("Camera produced an empty frame")]
    EmptyFrame,
    #[error("Could not encode frame: {0}")]
    Encode(String),
}

/// A still image ready to travel as a remote-call payload.
///
/// Created on demand when a capture step fires, handed to the next remote
/// call, and not retained afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureArtifact {
    data_uri: String,
}

impl CaptureArtifact {
    /// JPEG-encodes `frame` at its native size into a `data:image/jpeg`
    /// URI.
    pub fn from_frame(frame: &Frame) -> Result<Self, CaptureError> {
        let pixels = frame
            .width
            .checked_mul(frame.height)
            .and_then(|n| n.checked_mul(3));
        if frame.width == 0 || frame.height == 0 || pixels != Some(frame.rgb.len() as u32) {
            return Err(CaptureError::EmptyFrame);
        }

        let mut jpeg = Vec::new();
        JpegEncoder::new_with_quality(&mut jpeg, 80)
            .encode(&frame.rgb, frame.width, frame.height, ExtendedColorType::Rgb8)
            .map_err(|err| CaptureError::Encode(err.to_string()))?;

        Ok(Self {
            data_uri: format!("data:image/jpeg;base64,{}", STANDARD.encode(&jpeg)),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.data_uri
    }

    pub fn into_data_uri(self) -> String {
        self.data_uri
    }
}

/// The camera feed shared by both flows.
///
/// Visibility is presentational only: pages show the live preview while a
/// capture step wants it on screen and hide it afterwards. It gates
/// nothing, and both flows toggle it freely.
#[derive(Debug, Clone)]
pub struct VideoFeed {
    source: Arc<dyn FrameSource>,
    visible: Arc<AtomicBool>,
}

impl VideoFeed {
    pub fn new(source: Arc<dyn FrameSource>) -> Self {
        Self {
            source,
            visible: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn show(&self) {
        self.visible.store(true, Ordering::SeqCst);
    }

    pub fn hide(&self) {
        self.visible.store(false, Ordering::SeqCst);
    }

    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }

    pub fn latest_frame(&self) -> Option<Frame> {
        self.source.latest_frame()
    }

    /// Freezes the current frame into a transmittable still.
    pub fn snapshot(&self) -> Result<CaptureArtifact, CaptureError> {
        let frame = self.source.latest_frame().ok_or(CaptureError::NotStreaming)?;
        CaptureArtifact::from_frame(&frame)
    }
}
