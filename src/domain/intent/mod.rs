//! Payment intents: who the agent is paying, captured from a QR code or typed in.

pub mod error;
pub mod manual;
pub mod payload;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{
    intent::error::IntentError,
    props::{IntentSource, Pin, RecipientId},
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentIntent {
    pub recipient_id: RecipientId,
    pub recipient_name: String,
    pub recipient_email: String,
    /// PIN carried by the payload, used only for the local pre-check.
    pub pin: Pin,
    /// Informational only, as advertised by the payload.
    pub wallet_balance: Option<Decimal>,
    pub source: IntentSource,
}

impl PaymentIntent {
    pub fn is_manual_entry(&self) -> bool {
        self.source == IntentSource::Manual
    }

    pub fn require_complete(&self) -> Result<(), IntentError> {
        let fields = [
            self.recipient_id.as_str(),
            self.recipient_name.as_str(),
            self.recipient_email.as_str(),
            self.pin.as_str(),
        ];
        if fields.iter().any(|f| f.trim().is_empty()) {
            return Err(IntentError::MissingFields);
        }

        Ok(())
    }
}
