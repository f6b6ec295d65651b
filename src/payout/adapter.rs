//! Gateway Adapter
//!
//! Seam between the payout service and the remote payment gateway.
//! [`TransferDispatcher`](super::dispatcher::TransferDispatcher) is the real
//! implementation; tests swap in [`MockGateway`].

use async_trait::async_trait;
use serde_json::Value;

use super::error::PayoutError;
use super::types::{TransferRequest, TransferResult};

/// Gateway balance response, passed through untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct BalancePassthrough {
    /// HTTP status returned by the gateway
    pub status: u16,
    pub body: Value,
}

/// Remote payout gateway
///
/// `send_transfer` never returns an error: every failure is folded into
/// `TransferResult::Failure` so the caller can always settle the record.
#[async_trait]
pub trait GatewayAdapter: Send + Sync {
    /// Adapter name for logging
    fn name(&self) -> &'static str;

    /// Sign, encrypt and submit one transfer
    async fn send_transfer(&self, req: &TransferRequest) -> TransferResult;

    /// Query the payout account balance
    async fn account_balance(&self) -> Result<BalancePassthrough, PayoutError>;
}


#[cfg(test)]
pub use mock::MockGateway;
