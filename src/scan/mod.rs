//! Camera access and the QR decode loop. The platform camera and the image
//! decoder are injected; this module owns their lifecycle.

pub mod controller;
pub mod error;
pub mod piped;

use async_trait::async_trait;

use crate::scan::error::ScanError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoDevice {
    pub id: String,
    pub label: String,
}

impl VideoDevice {
    pub fn is_rear_facing(&self) -> bool {
        let label = self.label.to_lowercase();
        label.contains("back") || label.contains("rear") || label.contains("environment")
    }
}

#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub luma: Vec<u8>,
}

#[async_trait]
pub trait CameraBackend: Send + Sync {
    /// Opens a video stream; `None` lets the platform pick a device.
    async fn open(&self, device_id: Option<&str>) -> Result<Box<dyn MediaStream>, ScanError>;

    async fn video_inputs(&self) -> Result<Vec<VideoDevice>, ScanError>;
}

#[async_trait]
pub trait MediaStream: Send {
    /// `Ok(None)` once the stream has ended.
    async fn next_frame(&mut self) -> Result<Option<Frame>, ScanError>;

    fn stop_tracks(&mut self);
}

pub trait FrameDecoder: Send + Sync {
    /// `Ok(None)` when no code is visible in this frame.
    fn decode(&self, frame: &Frame) -> Result<Option<String>, ScanError>;
}

/// Exclusive owner of an open camera stream. Tracks are stopped on `stop` or
/// on drop, whichever comes first.
pub struct ScanHandle {
    device_id: Option<String>,
    stream: Option<Box<dyn MediaStream>>,
}

impl ScanHandle {
    pub fn new(device_id: Option<String>, stream: Box<dyn MediaStream>) -> Self {
        ScanHandle {
            device_id,
            stream: Some(stream),
        }
    }

    pub fn device_id(&self) -> Option<&str> {
        self.device_id.as_deref()
    }

    pub fn is_live(&self) -> bool {
        self.stream.is_some()
    }

    pub async fn next_frame(&mut self) -> Result<Option<Frame>, ScanError> {
        match self.stream.as_mut() {
            Some(stream) => stream.next_frame().await,
            None => Err(ScanError::NotScanning),
        }
    }

    pub fn stop(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop_tracks();
        }
    }
}

impl Drop for ScanHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
