//! The backend wraps the same records differently depending on the endpoint
//! and deployment. All unwrapping goes through here, in a fixed priority order.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, de::DeserializeOwned};
use serde_json::Value;
use tracing::warn;

use crate::{
    api::{TransactionRecord, UserProfile, error::ApiError},
    domain::{props::TransactionId, wizard::draft::TransactionResult},
};

const USER_WRAPPERS: [&str; 3] = ["/user/data", "/data", "/user"];
const TRANSFER_ID_POINTERS: [&str; 10] = [
    "/transactionId",
    "/transaction_id",
    "/data/transactionId",
    "/data/transaction_id",
    "/transaction/_id",
    "/transaction/id",
    "/data/transaction/_id",
    "/data/transaction/id",
    "/data/_id",
    "/_id",
];

pub const UNKNOWN_TRANSACTION_ID: &str = "unknown";
const HISTORY_WRAPPERS: [&str; 4] = ["", "/data", "/transactions", "/data/transactions"];

/// Unwraps `user.data`, then `data`, then `user`, then a bare profile object.
pub fn user_profile(body: &Value) -> Result<UserProfile, ApiError> {
    let candidate = USER_WRAPPERS
        .iter()
        .filter_map(|p| body.pointer(p))
        .find(|v| v.is_object())
        .or_else(|| looks_like_profile(body).then_some(body))
        .ok_or_else(|| ApiError::UnexpectedResponse("no user record in response".to_owned()))?;

    let profile: UserProfile = from_value(candidate)?;
    if profile.id.is_empty() && profile.email.is_empty() {
        return Err(ApiError::UnexpectedResponse(
            "user record has no identity".to_owned(),
        ));
    }

    Ok(profile)
}

/// A 2xx transfer response always means the money moved, so this never fails.
/// An id that cannot be found is reported as [`UNKNOWN_TRANSACTION_ID`].
pub fn transfer_result(body: &Value) -> TransactionResult {
    let transaction_id = TRANSFER_ID_POINTERS
        .iter()
        .filter_map(|p| body.pointer(p))
        .find_map(id_text)
        .unwrap_or_else(|| {
            warn!("Transfer accepted without a transaction id: {}", body);
            UNKNOWN_TRANSACTION_ID.to_owned()
        });

    let message = ["/message", "/data/message"]
        .iter()
        .filter_map(|p| body.pointer(p))
        .filter_map(Value::as_str)
        .find(|m| !m.trim().is_empty())
        .unwrap_or_default()
        .to_owned();

    TransactionResult {
        transaction_id: TransactionId(transaction_id),
        message,
    }
}

fn id_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_owned()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub fn transactions(body: &Value) -> Result<Vec<TransactionRecord>, ApiError> {
    let candidate = HISTORY_WRAPPERS
        .iter()
        .filter_map(|p| body.pointer(p))
        .find(|v| v.is_array())
        .ok_or_else(|| ApiError::UnexpectedResponse("no transaction list in response".to_owned()))?;

    from_value(candidate)
}

/// Error text carried by a non-2xx body, if any.
pub fn error_message(body: &Value) -> Option<String> {
    ["/message", "/error", "/error/message"]
        .iter()
        .filter_map(|p| body.pointer(p))
        .find_map(Value::as_str)
        .filter(|m| !m.trim().is_empty())
        .map(str::to_owned)
}

/// Accepts amounts sent either as JSON numbers or as strings.
pub(crate) fn lenient_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let text = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) if s.trim().is_empty() => return Ok(None),
        Some(Value::String(s)) => s.trim().to_owned(),
        Some(other) => {
            return Err(serde::de::Error::custom(format!(
                "expected an amount, found {}",
                other
            )));
        }
    };

    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map(Some)
        .map_err(serde::de::Error::custom)
}

fn looks_like_profile(body: &Value) -> bool {
    ["email", "_id", "id"].iter().any(|k| body.get(k).is_some())
}

fn from_value<T: DeserializeOwned>(value: &Value) -> Result<T, ApiError> {
    T::deserialize(value).map_err(|e| ApiError::UnexpectedResponse(e.to_string()))
}
