//! QR payload codec: base64 of a JSON object carrying the recipient identity.

use base64::{Engine, engine::general_purpose::STANDARD};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{
    intent::{PaymentIntent, error::IntentError},
    props::{IntentSource, Pin, RecipientId},
};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QrPayload {
    id: Option<String>,
    name: Option<String>,
    email: Option<String>,
    pin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    wallet_balance: Option<Decimal>,
}

pub fn decode(text: &str) -> Result<PaymentIntent, IntentError> {
    let bytes = STANDARD.decode(text.trim()).map_err(|e| {
        debug!("QR payload is not base64: {}", e);
        IntentError::InvalidQrFormat
    })?;

    let payload: QrPayload = serde_json::from_slice(&bytes).map_err(|e| {
        debug!("QR payload is not a JSON object: {}", e);
        IntentError::InvalidQrFormat
    })?;

    let (Some(id), Some(name), Some(email), Some(pin)) =
        (payload.id, payload.name, payload.email, payload.pin)
    else {
        debug!("QR payload misses a required field");
        return Err(IntentError::InvalidQrFormat);
    };

    let intent = PaymentIntent {
        recipient_id: RecipientId(id),
        recipient_name: name,
        recipient_email: email,
        pin: Pin(pin),
        wallet_balance: payload.wallet_balance,
        source: IntentSource::Scanned,
    };

    intent
        .require_complete()
        .map_err(|_| IntentError::InvalidQrFormat)?;

    Ok(intent)
}

pub fn encode(intent: &PaymentIntent) -> Result<String, IntentError> {
    intent.require_complete()?;

    let payload = QrPayload {
        id: Some(intent.recipient_id.to_string()),
        name: Some(intent.recipient_name.clone()),
        email: Some(intent.recipient_email.clone()),
        pin: Some(intent.pin.0.clone()),
        wallet_balance: intent.wallet_balance,
    };
    let json = serde_json::to_vec(&payload).map_err(|_| IntentError::InvalidQrFormat)?;

    Ok(STANDARD.encode(json))
}
