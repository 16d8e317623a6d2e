use derive_more::Display;

use crate::domain::intent::error::IntentError;

#[derive(Debug, PartialEq, Display)]
pub enum ScanError {
    PermissionDenied,
    NoCameraFound,
    #[display("camera error: {_0}")]
    Camera(String),
    StreamEnded,
    NotScanning,
    InvalidQrFormat,
}

impl ScanError {
    pub fn user_message(&self) -> String {
        match self {
            ScanError::PermissionDenied => {
                "Camera permission denied. Please allow camera access and try again.".to_owned()
            }
            ScanError::NoCameraFound => "No camera found on this device".to_owned(),
            ScanError::Camera(e) => format!("Camera error: {}", e),
            ScanError::StreamEnded => "Camera stopped unexpectedly. Please try again.".to_owned(),
            ScanError::NotScanning => "Scanner is not running".to_owned(),
            ScanError::InvalidQrFormat => IntentError::InvalidQrFormat.user_message().to_owned(),
        }
    }
}

impl From<IntentError> for ScanError {
    fn from(_: IntentError) -> Self {
        ScanError::InvalidQrFormat
    }
}

impl std::error::Error for ScanError {}
