use derive_more::Display;

#[derive(Debug, PartialEq, Display)]
pub enum IntentError {
    InvalidQrFormat,
    MissingFields,
}

impl IntentError {
    pub fn user_message(&self) -> &'static str {
        match self {
            IntentError::InvalidQrFormat => "Invalid QR code format",
            IntentError::MissingFields => "Please fill in all required fields",
        }
    }
}

impl std::error::Error for IntentError {}
