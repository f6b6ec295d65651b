//! Transaction Store
//!
//! The payout core only touches persisted state through this trait. All
//! status changes go through `update_if`, a compare-and-swap on the observed
//! `(status, utr)` pair, so concurrent callbacks for one reference serialize
//! at the store.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use super::error::PayoutError;
use super::state::{TransactionStatus, TransactionUpdate};
use super::types::Transaction;

/// Persistence for payout transactions
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Store name for logging
    fn name(&self) -> &'static str;

    /// Insert a new record. Fails with `DuplicateReference` if the id exists.
    async fn create(&self, tx: &Transaction) -> Result<(), PayoutError>;

    /// Look up by merchant reference id
    async fn get(&self, merchant_reference_id: &str) -> Result<Option<Transaction>, PayoutError>;

    /// Atomic CAS update: apply `update` only if the stored status and utr
    /// still equal the expected values.
    ///
    /// Returns true if the row was updated, false if someone else changed it
    /// first (or it does not exist).
    async fn update_if(
        &self,
        merchant_reference_id: &str,
        expected_status: TransactionStatus,
        expected_utr: Option<&str>,
        update: &TransactionUpdate,
    ) -> Result<bool, PayoutError>;

    /// Move a record still in `expected_status` (with no utr) to `failed`,
    /// recording `reason`.
    async fn mark_failed_if(
        &self,
        merchant_reference_id: &str,
        expected_status: TransactionStatus,
        reason: &str,
    ) -> Result<bool, PayoutError> {
        let update = TransactionUpdate {
            status: TransactionStatus::Failed,
            utr: None,
            error_message: Some(reason.to_string()),
        };
        self.update_if(merchant_reference_id, expected_status, None, &update)
            .await
    }
}

/// In-memory store backed by a sharded map.
///
/// Used when no database is configured and in tests. The CAS runs under the
/// shard's write lock, which gives the same guarantee as the SQL version.
#[derive(Default)]
pub struct MemoryTransactionStore {
    records: DashMap<String, Transaction>,
    writes: AtomicUsize,
}

impl MemoryTransactionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful inserts and updates
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl TransactionStore for MemoryTransactionStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn create(&self, tx: &Transaction) -> Result<(), PayoutError> {
        match self.records.entry(tx.merchant_reference_id.clone()) {
            Entry::Occupied(_) => Err(PayoutError::DuplicateReference(
                tx.merchant_reference_id.clone(),
            )),
            Entry::Vacant(slot) => {
                slot.insert(tx.clone());
                self.writes.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        }
    }

    async fn get(&self, merchant_reference_id: &str) -> Result<Option<Transaction>, PayoutError> {
        Ok(self
            .records
            .get(merchant_reference_id)
            .map(|r| r.value().clone()))
    }

    async fn update_if(
        &self,
        merchant_reference_id: &str,
        expected_status: TransactionStatus,
        expected_utr: Option<&str>,
        update: &TransactionUpdate,
    ) -> Result<bool, PayoutError> {
        let Some(mut record) = self.records.get_mut(merchant_reference_id) else {
            return Ok(false);
        };
        if record.status != expected_status || record.utr.as_deref() != expected_utr {
            return Ok(false);
        }

        record.status = update.status;
        record.utr = update.utr.clone();
        record.error_message = update.error_message.clone();
        record.updated_at = Utc::now();
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payout::types::PaymentMode;
    use rust_decimal::Decimal;

    fn pending(reference: &str) -> Transaction {
        Transaction::new(reference, None, Decimal::from(100), PaymentMode::Upi, None)
    }

    fn to(status: TransactionStatus, utr: Option<&str>) -> TransactionUpdate {
        TransactionUpdate {
            status,
            utr: utr.map(str::to_string),
            error_message: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let store = MemoryTransactionStore::new();
        store.create(&pending("REF1")).await.unwrap();

        let tx = store.get("REF1").await.unwrap().unwrap();
        assert_eq!(tx.status, TransactionStatus::Pending);
        assert!(store.get("REF2").await.unwrap().is_none());
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_reference_rejected() {
        let store = MemoryTransactionStore::new();
        store.create(&pending("REF1")).await.unwrap();
        let err = store.create(&pending("REF1")).await.unwrap_err();
        assert_eq!(err, PayoutError::DuplicateReference("REF1".into()));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_update_if_matches_expected_state() {
        let store = MemoryTransactionStore::new();
        store.create(&pending("REF1")).await.unwrap();

        let applied = store
            .update_if(
                "REF1",
                TransactionStatus::Pending,
                None,
                &to(TransactionStatus::Processing, None),
            )
            .await
            .unwrap();
        assert!(applied);

        // Stale expectation loses
        let applied = store
            .update_if(
                "REF1",
                TransactionStatus::Pending,
                None,
                &to(TransactionStatus::Failed, None),
            )
            .await
            .unwrap();
        assert!(!applied);

        let tx = store.get("REF1").await.unwrap().unwrap();
        assert_eq!(tx.status, TransactionStatus::Processing);
    }

    #[tokio::test]
    async fn test_update_if_checks_utr() {
        let store = MemoryTransactionStore::new();
        store.create(&pending("REF1")).await.unwrap();
        store
            .update_if(
                "REF1",
                TransactionStatus::Pending,
                None,
                &to(TransactionStatus::Success, Some("UTR1")),
            )
            .await
            .unwrap();

        let applied = store
            .update_if(
                "REF1",
                TransactionStatus::Success,
                None,
                &to(TransactionStatus::Reversed, Some("UTR1")),
            )
            .await
            .unwrap();
        assert!(!applied);

        let applied = store
            .update_if(
                "REF1",
                TransactionStatus::Success,
                Some("UTR1"),
                &to(TransactionStatus::Reversed, Some("UTR1")),
            )
            .await
            .unwrap();
        assert!(applied);
    }

    #[tokio::test]
    async fn test_update_if_missing_record() {
        let store = MemoryTransactionStore::new();
        let applied = store
            .update_if(
                "NOPE",
                TransactionStatus::Pending,
                None,
                &to(TransactionStatus::Failed, None),
            )
            .await
            .unwrap();
        assert!(!applied);
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_mark_failed_if() {
        let store = MemoryTransactionStore::new();
        store.create(&pending("REF1")).await.unwrap();

        assert!(
            !store
                .mark_failed_if("REF1", TransactionStatus::Processing, "timeout")
                .await
                .unwrap()
        );
        assert!(
            store
                .mark_failed_if("REF1", TransactionStatus::Pending, "timeout")
                .await
                .unwrap()
        );

        let tx = store.get("REF1").await.unwrap().unwrap();
        assert_eq!(tx.status, TransactionStatus::Failed);
        assert_eq!(tx.error_message.as_deref(), Some("timeout"));
    }

    #[tokio::test]
    async fn test_error_message_follows_update() {
        let store = MemoryTransactionStore::new();
        store.create(&pending("REF1")).await.unwrap();
        store
            .update_if(
                "REF1",
                TransactionStatus::Pending,
                None,
                &TransactionUpdate {
                    status: TransactionStatus::Failed,
                    utr: None,
                    error_message: Some("Bank offline".into()),
                },
            )
            .await
            .unwrap();
        store
            .update_if(
                "REF1",
                TransactionStatus::Failed,
                None,
                &to(TransactionStatus::Reversed, None),
            )
            .await
            .unwrap();

        let tx = store.get("REF1").await.unwrap().unwrap();
        assert_eq!(tx.status, TransactionStatus::Reversed);
        assert!(tx.error_message.is_none());
    }
}
