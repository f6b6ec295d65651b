//! Gateway types module
//!
//! - [`ApiResponse<T>`]: Unified API response wrapper
//! - [`ApiError`]: handler error with HTTP status and API code
//! - [`FundTransferRequest`] / [`FundTransferData`]: vendor transfer DTOs

pub mod payout;
pub mod response;

pub use payout::{FundTransferData, FundTransferRequest, WebhookAck};
pub use response::{ApiError, ApiResponse, ApiResult, error_codes, ok};
