//! Transfer Dispatcher
//!
//! Runs the outbound pipeline for one transfer:
//! build payload -> sign -> serialize -> fresh IV -> encrypt -> POST envelope.
//!
//! Every failure (local or remote) comes back as `TransferResult::Failure`;
//! the dispatcher itself touches no persisted state.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::adapter::{BalancePassthrough, GatewayAdapter};
use super::cipher::{self, EncryptionKey};
use super::error::PayoutError;
use super::iv::{IvSource, OsRngIvSource};
use super::payload;
use super::state::TransactionStatus;
use super::types::{TransferRequest, TransferResult};
use crate::config::{PaymentConfig, Secret};

pub const FUND_TRANSFER_PATH: &str = "/api/v1/payout/fundTransfer";
pub const BALANCE_PATH: &str = "/api/v1/account/balance";
pub const API_KEY_HEADER: &str = "api-Key";

/// Everything the dispatcher needs to talk to the gateway.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Base URL without trailing slash
    pub base_url: String,
    pub api_key: Secret,
    pub secret_key: Secret,
    pub encryption_key: EncryptionKey,
    pub timeout: Duration,
}

impl GatewayConfig {
    pub fn from_payment(config: &PaymentConfig, timeout: Duration) -> Self {
        Self {
            base_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            secret_key: config.secret_key.clone(),
            encryption_key: config.encryption_key.clone(),
            timeout,
        }
    }
}

/// Body POSTed to the gateway. The key travels in the clear next to the
/// ciphertext; the gateway expects it there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundEnvelope {
    pub encdata: String,
    pub key: String,
    pub iv: String,
}

#[derive(Debug, Deserialize)]
struct GatewayResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<GatewayResponseData>,
    #[serde(default)]
    errors: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct GatewayResponseData {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    utr: Option<String>,
}

pub struct TransferDispatcher {
    client: reqwest::Client,
    config: GatewayConfig,
    iv_source: Arc<dyn IvSource>,
}

impl TransferDispatcher {
    pub fn new(config: GatewayConfig) -> Result<Self, PayoutError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| PayoutError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            iv_source: Arc::new(OsRngIvSource),
        })
    }

    /// Replace the IV source (fixtures pin the IV)
    pub fn with_iv_source(mut self, iv_source: Arc<dyn IvSource>) -> Self {
        self.iv_source = iv_source;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    /// Build, sign and encrypt. No network.
    pub fn prepare(&self, req: &TransferRequest) -> Result<OutboundEnvelope, PayoutError> {
        let signed = payload::build(req)?.signed(self.config.secret_key.expose());
        let plaintext = serde_json::to_vec(&signed)?;

        let iv = self.iv_source.generate();
        let encdata = cipher::encrypt(
            &plaintext,
            self.config.encryption_key.as_bytes(),
            iv.as_bytes(),
        )?;

        Ok(OutboundEnvelope {
            encdata,
            key: self.config.encryption_key.as_str().to_string(),
            iv,
        })
    }

    async fn post_envelope(
        &self,
        envelope: &OutboundEnvelope,
    ) -> Result<(StatusCode, String), PayoutError> {
        let response = self
            .client
            .post(self.url(FUND_TRANSFER_PATH))
            .header(API_KEY_HEADER, self.config.api_key.expose())
            .json(envelope)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;
        Ok((status, body))
    }
}

fn transport_error(e: reqwest::Error) -> PayoutError {
    if e.is_timeout() {
        PayoutError::Gateway("Payment gateway timed out".to_string())
    } else if e.is_connect() {
        PayoutError::Gateway("Payment gateway unreachable".to_string())
    } else {
        PayoutError::Gateway(format!("Payment gateway request failed: {}", e))
    }
}

/// Map a raw gateway reply to a result.
///
/// Success needs both a 2xx status and `status: "success"` in the body.
pub fn interpret_response(http_status: u16, body: &str) -> TransferResult {
    let parsed: GatewayResponse = match serde_json::from_str(body) {
        Ok(parsed) => parsed,
        Err(_) => {
            return TransferResult::failure(PayoutError::Gateway(format!(
                "Invalid response from payment gateway (HTTP {})",
                http_status
            )));
        }
    };

    let accepted = (200..300).contains(&http_status)
        && parsed
            .status
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case("success"));

    if accepted {
        let (status, utr) = match parsed.data {
            Some(data) => (
                data.status
                    .as_deref()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(TransactionStatus::Processing),
                data.utr.filter(|u| !u.trim().is_empty()),
            ),
            None => (TransactionStatus::Processing, None),
        };
        return TransferResult::Success {
            status,
            utr,
            message: parsed
                .message
                .unwrap_or_else(|| "Transfer initiated".to_string()),
        };
    }

    let reason = parsed
        .message
        .filter(|m| !m.trim().is_empty())
        .or_else(|| parsed.errors.as_ref().map(describe_errors))
        .unwrap_or_else(|| format!("Payment gateway returned HTTP {}", http_status));
    TransferResult::failure(PayoutError::Gateway(reason))
}

fn describe_errors(errors: &Value) -> String {
    match errors {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
            .collect::<Vec<_>>()
            .join("; "),
        other => other.to_string(),
    }
}

#[async_trait]
impl GatewayAdapter for TransferDispatcher {
    fn name(&self) -> &'static str {
        "payout-gateway"
    }

    async fn send_transfer(&self, req: &TransferRequest) -> TransferResult {
        let envelope = match self.prepare(req) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(
                    merchant_reference_id = %req.merchant_reference_id,
                    mode = %req.mode,
                    error = %e,
                    "Transfer rejected before dispatch"
                );
                return TransferResult::failure(e);
            }
        };

        debug!(
            merchant_reference_id = %req.merchant_reference_id,
            mode = %req.mode,
            "Posting fund transfer"
        );

        let result = match self.post_envelope(&envelope).await {
            Ok((status, body)) => interpret_response(status.as_u16(), &body),
            Err(e) => TransferResult::failure(e),
        };

        match &result {
            TransferResult::Success { status, utr, .. } => info!(
                merchant_reference_id = %req.merchant_reference_id,
                mode = %req.mode,
                status = %status,
                has_utr = utr.is_some(),
                "Fund transfer accepted"
            ),
            TransferResult::Failure { error } => warn!(
                merchant_reference_id = %req.merchant_reference_id,
                mode = %req.mode,
                error = %error,
                "Fund transfer failed"
            ),
        }
        result
    }

    async fn account_balance(&self) -> Result<BalancePassthrough, PayoutError> {
        let response = self
            .client
            .get(self.url(BALANCE_PATH))
            .header(API_KEY_HEADER, self.config.api_key.expose())
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(transport_error)?;
        let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
        Ok(BalancePassthrough { status, body })
    }
}
