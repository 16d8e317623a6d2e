//! Camera backend for an external QR reader that prints each decoded code on
//! its own line, e.g. `zbarcam --raw | school-wallet-agent pay --scan ...`.
//! Every line is one frame; the frame already holds the decoded text.

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};

use crate::scan::{CameraBackend, Frame, FrameDecoder, MediaStream, VideoDevice, error::ScanError};

pub const STDIN_DEVICE_ID: &str = "stdin";

pub struct StdinCamera;

#[async_trait]
impl CameraBackend for StdinCamera {
    async fn open(&self, _device_id: Option<&str>) -> Result<Box<dyn MediaStream>, ScanError> {
        Ok(Box::new(LineStream::new(BufReader::new(tokio::io::stdin()))))
    }

    async fn video_inputs(&self) -> Result<Vec<VideoDevice>, ScanError> {
        Ok(vec![VideoDevice {
            id: STDIN_DEVICE_ID.to_owned(),
            label: "External reader (stdin)".to_owned(),
        }])
    }
}

pub struct LineStream<R> {
    lines: Option<Lines<R>>,
}

impl<R: AsyncBufRead + Unpin> LineStream<R> {
    pub fn new(reader: R) -> Self {
        LineStream {
            lines: Some(reader.lines()),
        }
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> MediaStream for LineStream<R> {
    async fn next_frame(&mut self) -> Result<Option<Frame>, ScanError> {
        let Some(lines) = self.lines.as_mut() else {
            return Ok(None);
        };

        let line = lines
            .next_line()
            .await
            .map_err(|e| ScanError::Camera(e.to_string()))?;

        Ok(line.map(|text| {
            let luma = text.trim().as_bytes().to_vec();
            Frame {
                width: luma.len() as u32,
                height: 1,
                luma,
            }
        }))
    }

    fn stop_tracks(&mut self) {
        self.lines = None;
    }
}

/// Reads the frame bytes back as the already-decoded text.
pub struct TextFrameDecoder;

impl FrameDecoder for TextFrameDecoder {
    fn decode(&self, frame: &Frame) -> Result<Option<String>, ScanError> {
        if frame.luma.is_empty() {
            return Ok(None);
        }

        String::from_utf8(frame.luma.clone())
            .map(Some)
            .map_err(|_| ScanError::InvalidQrFormat)
    }
}
