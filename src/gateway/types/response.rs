//! API Response types and error codes
//!
//! - `ApiResponse<T>`: Unified response wrapper
//! - `ApiError`: handler error, renders as an `ApiResponse` with a status
//! - `error_codes`: Standard error code constants

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

use crate::payout::PayoutError;

// ============================================================================
// Unified API Response Format
// ============================================================================

/// Unified API response wrapper
///
/// - code: 0 = success, non-zero = error code
/// - msg: short message description
/// - data: payload on success; some errors also carry one
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response code: 0 for success, non-zero for errors
    #[schema(example = 0)]
    pub code: i32,
    /// Response message
    #[schema(example = "ok")]
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Create success response
    pub fn success(data: T) -> Self {
        Self {
            code: error_codes::SUCCESS,
            msg: "ok".to_string(),
            data: Some(data),
        }
    }

    /// Create error response
    pub fn error(code: i32, msg: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            code,
            msg: msg.into(),
            data: None,
        }
    }
}

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

/// Wrap a value in a 200 success response
pub fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::success(data)))
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: i32,
    pub msg: String,
    pub data: Option<Value>,
}

impl ApiError {
    pub fn new(status: StatusCode, code: i32, msg: impl Into<String>) -> Self {
        Self {
            status,
            code,
            msg: msg.into(),
            data: None,
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error_codes::INVALID_PARAMETER, msg)
    }

    /// Attach a payload (e.g. the failed transaction)
    pub fn with_data(mut self, data: impl Serialize) -> Self {
        self.data = serde_json::to_value(data).ok();
        self
    }

    pub fn into_err<T>(self) -> ApiResult<T> {
        Err(self)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiResponse {
            code: self.code,
            msg: self.msg,
            data: self.data,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<PayoutError> for ApiError {
    fn from(e: PayoutError) -> Self {
        if e.is_internal() {
            tracing::error!(code = e.code(), error = %e, "Internal payout fault");
        }
        let status =
            StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        ApiError::new(status, error_codes::for_payout(&e), e.public_message())
    }
}

// ============================================================================
// Error Codes
// ============================================================================

/// Standard API error codes
pub mod error_codes {
    use crate::payout::PayoutError;

    // Success
    pub const SUCCESS: i32 = 0;

    // Client errors (1xxx)
    pub const INVALID_PARAMETER: i32 = 1001;
    pub const INVALID_BENEFICIARY: i32 = 1002;
    pub const INVALID_AMOUNT: i32 = 1003;
    pub const DUPLICATE_REFERENCE: i32 = 1004;

    // Callback errors (3xxx)
    pub const DECRYPTION_FAILED: i32 = 3001;
    pub const MALFORMED_CALLBACK: i32 = 3002;

    // Resource errors (4xxx)
    pub const TRANSACTION_NOT_FOUND: i32 = 4001;
    pub const CONFLICT: i32 = 4091;

    // Server errors (5xxx)
    pub const INTERNAL_ERROR: i32 = 5000;
    pub const SERVICE_UNAVAILABLE: i32 = 5001;
    pub const GATEWAY_ERROR: i32 = 5002;

    pub fn for_payout(e: &PayoutError) -> i32 {
        match e {
            PayoutError::InvalidBeneficiary(_) => INVALID_BENEFICIARY,
            PayoutError::InvalidAmount => INVALID_AMOUNT,
            PayoutError::DuplicateReference(_) => DUPLICATE_REFERENCE,
            PayoutError::DecryptionFailed(_) => DECRYPTION_FAILED,
            PayoutError::MalformedCallback(_) => MALFORMED_CALLBACK,
            PayoutError::UnknownReference(_) => TRANSACTION_NOT_FOUND,
            PayoutError::Conflict(_) => CONFLICT,
            PayoutError::Gateway(_) => GATEWAY_ERROR,
            PayoutError::InvalidKeyMaterial(_)
            | PayoutError::Config(_)
            | PayoutError::Serialization(_)
            | PayoutError::Database(_) => INTERNAL_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_shape() {
        let json = serde_json::to_value(ApiResponse::success(42)).unwrap();
        assert_eq!(json, serde_json::json!({"code": 0, "msg": "ok", "data": 42}));

        let json = serde_json::to_value(ApiResponse::<()>::error(1001, "bad")).unwrap();
        assert!(json.get("data").is_none());
    }

    #[test]
    fn test_payout_error_mapping() {
        let err = ApiError::from(PayoutError::InvalidAmount);
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.code, error_codes::INVALID_AMOUNT);

        let err = ApiError::from(PayoutError::UnknownReference("REF".into()));
        assert_eq!(err.status, StatusCode::NOT_FOUND);

        let err = ApiError::from(PayoutError::Gateway("bank offline".into()));
        assert_eq!(err.status, StatusCode::BAD_GATEWAY);
        assert_eq!(err.msg, "bank offline");
    }

    #[test]
    fn test_internal_errors_hide_detail() {
        let err = ApiError::from(PayoutError::Database("password authentication failed".into()));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code, error_codes::INTERNAL_ERROR);
        assert!(!err.msg.contains("password"));
    }
}
