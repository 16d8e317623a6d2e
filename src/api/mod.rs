//! Client side of the wallet backend REST contract.

pub mod client;
pub mod error;
pub mod normalize;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    api::error::ApiError,
    domain::{
        props::{Pin, RecipientId},
        wizard::draft::TransactionResult,
    },
};

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(alias = "_id", default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(
        alias = "balance",
        default,
        deserialize_with = "normalize::lenient_decimal"
    )]
    pub wallet_balance: Option<Decimal>,
}

/// Body of `POST /wallet/walletToWalletTransfer`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub recipient_id: RecipientId,
    /// Sent as a decimal string so no digits are lost to `f64`.
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    pub description: String,
    pub pin: Pin,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    #[serde(alias = "_id", default)]
    pub id: String,
    #[serde(alias = "type", default)]
    pub transaction_type: String,
    #[serde(default, deserialize_with = "normalize::lenient_decimal")]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub created_at: String,
}

/// Backend operations the agent client consumes.
#[async_trait]
pub trait WalletApi: Send + Sync {
    async fn current_user(&self) -> Result<UserProfile, ApiError>;

    async fn transfer(&self, request: &TransferRequest) -> Result<TransactionResult, ApiError>;

    async fn transactions(&self) -> Result<Vec<TransactionRecord>, ApiError>;
}
