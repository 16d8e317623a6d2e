use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    api::{
        TransactionRecord, TransferRequest, UserProfile, WalletApi, error::ApiError, normalize,
    },
    config::Settings,
    domain::wizard::draft::TransactionResult,
};

const CURRENT_USER_PATH: &str = "users/getuserone";
const TRANSFER_PATH: &str = "wallet/walletToWalletTransfer";
const HISTORY_PATH: &str = "transaction/getusertransaction";

pub const TRANSFER_FAILED_MESSAGE: &str = "Transfer failed. Please try again.";

pub struct HttpWalletApi {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpWalletApi {
    pub fn new(
        base_url: impl Into<String>,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let http = Client::builder().timeout(timeout).build()?;

        Ok(HttpWalletApi {
            http,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            token,
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, ApiError> {
        Self::new(
            settings.api_base_url.clone(),
            settings.api_token.clone(),
            Duration::from_secs(settings.request_timeout_secs),
        )
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder, ApiError> {
        let token = self.token.as_deref().ok_or(ApiError::MissingToken)?;
        Ok(request.bearer_auth(token))
    }

    async fn send(&self, request: RequestBuilder, fallback: &str) -> Result<Value, ApiError> {
        let response = self.authorized(request)?.send().await?;
        read_body(response, fallback).await
    }
}

async fn read_body(response: Response, fallback: &str) -> Result<Value, ApiError> {
    let status = response.status();
    let text = response.text().await?;
    // A non-JSON body reads as null and is judged by each endpoint's normalizer.
    let body = serde_json::from_str::<Value>(&text).unwrap_or(Value::Null);

    if !status.is_success() {
        let message = normalize::error_message(&body).unwrap_or_else(|| fallback.to_owned());
        warn!("Backend rejected request with {}: {}", status, message);
        return Err(ApiError::Rejected {
            status: status.as_u16(),
            message,
        });
    }

    Ok(body)
}

#[async_trait]
impl WalletApi for HttpWalletApi {
    async fn current_user(&self) -> Result<UserProfile, ApiError> {
        debug!("Fetching current user");

        let body = self
            .send(
                self.http.get(self.url(CURRENT_USER_PATH)),
                "Failed to fetch user data",
            )
            .await?;

        normalize::user_profile(&body)
    }

    async fn transfer(&self, request: &TransferRequest) -> Result<TransactionResult, ApiError> {
        debug!(
            "Transferring {} to {}",
            request.amount, request.recipient_id
        );

        let body = self
            .send(
                self.http.post(self.url(TRANSFER_PATH)).json(request),
                TRANSFER_FAILED_MESSAGE,
            )
            .await?;

        Ok(normalize::transfer_result(&body))
    }

    async fn transactions(&self) -> Result<Vec<TransactionRecord>, ApiError> {
        debug!("Fetching transaction history");

        let body = self
            .send(
                self.http.get(self.url(HISTORY_PATH)),
                "Failed to fetch transactions",
            )
            .await?;

        normalize::transactions(&body)
    }
}
