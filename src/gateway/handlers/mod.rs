//! HTTP handlers
//!
//! - [`payout`]: vendor fund transfers and transaction lookup
//! - [`webhook`]: gateway settlement callbacks
//! - [`account`]: payout account balance
//! - [`health`]: liveness

pub mod account;
pub mod health;
pub mod payout;
pub mod webhook;

// Globs also carry the `__path_*` items utoipa generates per handler
pub use account::*;
pub use health::*;
pub use payout::*;
pub use webhook::*;
