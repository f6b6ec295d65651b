//! Vendor Payout - signed, encrypted fund transfers with webhook reconciliation
//!
//! # Modules
//!
//! - [`payout`] - Transfer core: payload, signing, AES transport, dispatch, callbacks
//! - [`gateway`] - HTTP surface (axum) and OpenAPI document
//! - [`db`] - PostgreSQL connection pool
//! - [`config`] - YAML settings and environment credentials
//! - [`logging`] - tracing setup with rolling files

pub mod config;
pub mod db;
pub mod gateway;
pub mod logging;
pub mod payout;

pub use config::{AppConfig, PaymentConfig};
pub use payout::{PayoutError, PayoutService, TransactionStatus, TransferRequest, TransferResult};
