//! OpenAPI Documentation
//!
//! Auto-generated OpenAPI 3.0 document for the vendor payout API.
//!
//! - OpenAPI JSON: `http://localhost:8080/api-docs/openapi.json`

use utoipa::OpenApi;

use crate::gateway::handlers::HealthResponse;
use crate::gateway::types::{FundTransferData, FundTransferRequest, WebhookAck};
use crate::payout::{Beneficiary, CallbackEnvelope, PaymentMode, Transaction, TransactionStatus};

/// Main API Documentation struct
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Vendor Payout API",
        version = "1.0.0",
        description = "Signed, encrypted UPI/IMPS/NEFT fund transfers and gateway callback reconciliation."
    ),
    servers(
        (url = "http://localhost:8080", description = "Development"),
    ),
    paths(
        crate::gateway::handlers::health_check,
        crate::gateway::handlers::create_fund_transfer,
        crate::gateway::handlers::get_transaction,
        crate::gateway::handlers::payout_webhook,
        crate::gateway::handlers::get_account_balance,
    ),
    components(
        schemas(
            HealthResponse,
            FundTransferRequest,
            FundTransferData,
            WebhookAck,
            CallbackEnvelope,
            Beneficiary,
            PaymentMode,
            Transaction,
            TransactionStatus,
        )
    ),
    tags(
        (name = "System", description = "Health"),
        (name = "Payout", description = "Fund transfers and settlement callbacks"),
        (name = "Account", description = "Payout account")
    )
)]
pub struct ApiDoc;
