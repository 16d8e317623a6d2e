use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    domain::intent::{PaymentIntent, payload},
    scan::{CameraBackend, FrameDecoder, ScanHandle, VideoDevice, error::ScanError},
};

pub struct ScanController {
    backend: Arc<dyn CameraBackend>,
    decoder: Arc<dyn FrameDecoder>,
    devices: Vec<VideoDevice>,
    selected: usize,
    active: Option<ScanHandle>,
}

impl ScanController {
    pub fn new(backend: Arc<dyn CameraBackend>, decoder: Arc<dyn FrameDecoder>) -> Self {
        ScanController {
            backend,
            decoder,
            devices: vec![],
            selected: 0,
            active: None,
        }
    }

    pub fn devices(&self) -> &[VideoDevice] {
        &self.devices
    }

    pub fn selected_device(&self) -> Option<&VideoDevice> {
        self.devices.get(self.selected)
    }

    pub fn is_scanning(&self) -> bool {
        self.active.as_ref().is_some_and(ScanHandle::is_live)
    }

    /// Triggers the permission prompt with a short-lived probe stream, then
    /// lists video inputs. A rear-facing camera is preferred.
    pub async fn request_camera_access(&mut self) -> Result<&[VideoDevice], ScanError> {
        let probe = ScanHandle::new(None, self.backend.open(None).await?);
        let devices = self.backend.video_inputs().await;
        drop(probe);

        let devices = devices?;
        if devices.is_empty() {
            warn!("No video input devices found");
            return Err(ScanError::NoCameraFound);
        }

        self.selected = devices
            .iter()
            .position(VideoDevice::is_rear_facing)
            .unwrap_or(0);
        self.devices = devices;
        info!("Found {} camera(s)", self.devices.len());

        Ok(&self.devices)
    }

    /// Opens a stream on the device (or the selected one), replacing any
    /// running scan.
    pub async fn start_scanning(&mut self, device_id: Option<&str>) -> Result<(), ScanError> {
        self.stop_scanning();

        if let Some(idx) = device_id.and_then(|id| self.devices.iter().position(|d| d.id == id)) {
            self.selected = idx;
        }
        let device_id = device_id
            .map(str::to_owned)
            .or_else(|| self.selected_device().map(|d| d.id.clone()));

        debug!("Starting scan on {:?}", device_id);
        let stream = self.backend.open(device_id.as_deref()).await?;
        self.active = Some(ScanHandle::new(device_id, stream));

        Ok(())
    }

    /// Runs the decode loop until a payload decodes, `cancel` fires, or the
    /// camera fails. The stream is released in every case.
    pub async fn scan(
        &mut self,
        cancel: &CancellationToken,
    ) -> Result<Option<PaymentIntent>, ScanError> {
        let handle = self.active.as_mut().ok_or(ScanError::NotScanning)?;

        let outcome = loop {
            let frame = tokio::select! {
                _ = cancel.cancelled() => break Ok(None),
                frame = handle.next_frame() => frame,
            };

            let frame = match frame {
                Ok(Some(frame)) => frame,
                Ok(None) => break Err(ScanError::StreamEnded),
                Err(e) => break Err(e),
            };

            match self.decoder.decode(&frame) {
                Ok(Some(text)) => break payload::decode(&text).map(Some).map_err(ScanError::from),
                Ok(None) => continue,
                Err(e) => debug!("Frame skipped: {}", e),
            }
        };

        self.stop_scanning();
        outcome
    }

    pub fn stop_scanning(&mut self) {
        if let Some(mut handle) = self.active.take() {
            debug!("Stopping scan on {:?}", handle.device_id());
            handle.stop();
        }
    }

    /// Moves to the next camera, restarting the scan there if one was running.
    pub async fn switch_camera(&mut self) -> Result<Option<&VideoDevice>, ScanError> {
        if self.devices.is_empty() {
            return Err(ScanError::NoCameraFound);
        }

        let was_scanning = self.is_scanning();
        self.stop_scanning();
        self.selected = (self.selected + 1) % self.devices.len();

        if was_scanning {
            self.start_scanning(None).await?;
        }

        Ok(self.selected_device())
    }
}

impl Drop for ScanController {
    fn drop(&mut self) {
        self.stop_scanning();
    }
}
