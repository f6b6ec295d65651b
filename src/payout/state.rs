//! Transaction State Machine
//!
//! ```text
//! pending ──dispatch ok──▶ processing ──callback──▶ success
//!    │                         │                      │
//!    ├──dispatch ok──▶ success  └──callback──▶ failed  │
//!    │                                                ▼
//!    └──dispatch err─▶ failed          (any) ──▶ reversed
//! ```
//!
//! Transitions outside the table are logged by the caller and applied anyway
//! (last writer wins on status). A `utr` is never overwritten once set.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::types::{CallbackReport, Transaction, TransferResult};

/// Reason stored when a callback reports failure without any earlier message.
pub const CALLBACK_FAILED_REASON: &str = "Payout failed at the bank";

/// Transaction lifecycle states, stored as lowercase text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// Recorded locally, gateway call not resolved yet
    Pending,
    /// Accepted by the gateway, awaiting settlement
    Processing,
    /// Terminal: settled, `utr` known
    Success,
    /// Terminal: rejected locally or by the gateway
    Failed,
    /// Terminal: reversed after settlement
    Reversed,
}

impl TransactionStatus {
    /// No further gateway-driven transition is expected
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransactionStatus::Success | TransactionStatus::Failed | TransactionStatus::Reversed
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Processing => "processing",
            TransactionStatus::Success => "success",
            TransactionStatus::Failed => "failed",
            TransactionStatus::Reversed => "reversed",
        }
    }

    /// Whether `self -> to` appears in the transition table.
    pub fn can_transition_to(&self, to: TransactionStatus) -> bool {
        use TransactionStatus::*;
        match (*self, to) {
            (_, Reversed) => *self != Reversed,
            (Pending, Processing | Success | Failed) => true,
            (Processing, Success | Failed) => true,
            _ => false,
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(TransactionStatus::Pending),
            "processing" => Ok(TransactionStatus::Processing),
            "success" => Ok(TransactionStatus::Success),
            "failed" => Ok(TransactionStatus::Failed),
            "reversed" => Ok(TransactionStatus::Reversed),
            other => Err(format!("unknown transaction status: {other}")),
        }
    }
}

/// Field values to write when a transition is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionUpdate {
    pub status: TransactionStatus,
    pub utr: Option<String>,
    /// Stored as-is. `Some` only when `status` is `Failed`.
    pub error_message: Option<String>,
}

/// What a callback should do to the stored record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackDecision {
    /// Same status and nothing new to record
    NoOp,
    Apply {
        update: TransactionUpdate,
        /// False when the move is outside the transition table
        in_table: bool,
        /// Set when the callback tried to replace an existing utr
        utr_conflict: bool,
    },
}

/// Map a dispatcher result onto the update of a `pending` record.
pub fn on_dispatch(result: &TransferResult) -> TransactionUpdate {
    match result {
        TransferResult::Success { status, utr, .. } => TransactionUpdate {
            status: match status {
                TransactionStatus::Success => TransactionStatus::Success,
                _ => TransactionStatus::Processing,
            },
            utr: utr.clone(),
            error_message: None,
        },
        TransferResult::Failure { error } => TransactionUpdate {
            status: TransactionStatus::Failed,
            utr: None,
            error_message: Some(error.public_message()),
        },
    }
}

/// Decide how a callback report changes `current`.
pub fn on_callback(current: &Transaction, report: &CallbackReport) -> CallbackDecision {
    let reported_utr = report.utr.as_deref().filter(|u| !u.is_empty());
    let utr_conflict = matches!(
        (current.utr.as_deref(), reported_utr),
        (Some(have), Some(new)) if have != new
    );
    let utr = current
        .utr
        .clone()
        .or_else(|| reported_utr.map(str::to_string));

    if current.status == report.status && utr == current.utr {
        return CallbackDecision::NoOp;
    }

    // Earlier failure reasons do not survive a move out of `failed`
    let error_message = (report.status == TransactionStatus::Failed).then(|| {
        current
            .error_message
            .clone()
            .unwrap_or_else(|| CALLBACK_FAILED_REASON.to_string())
    });

    CallbackDecision::Apply {
        in_table: current.status == report.status
            || current.status.can_transition_to(report.status),
        utr_conflict,
        update: TransactionUpdate {
            status: report.status,
            utr,
            error_message,
        },
    }
}
