//! Transaction Database Layer
//!
//! PostgreSQL-backed [`TransactionStore`]. Status changes are atomic CAS
//! updates on `(status, utr)`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Row};

use super::error::PayoutError;
use super::state::{TransactionStatus, TransactionUpdate};
use super::store::TransactionStore;
use super::types::{PaymentMode, Transaction};
use crate::db::SafeRow;

const SCHEMA: &str = include_str!("../../migrations/0001_transactions.sql");

pub struct PgTransactionStore {
    pool: PgPool,
}

impl PgTransactionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the table and indexes if missing
    pub async fn ensure_schema(&self) -> Result<(), PayoutError> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }

    fn row_to_transaction(row: &sqlx::postgres::PgRow) -> Result<Transaction, PayoutError> {
        let status_str: String = row.try_get("status")?;
        let status = status_str
            .parse::<TransactionStatus>()
            .map_err(PayoutError::Database)?;

        let mode_str: String = row.try_get("mode")?;
        let mode = mode_str.parse::<PaymentMode>().map_err(PayoutError::Database)?;

        let amount: Decimal = row.try_get("amount")?;
        let created_at: DateTime<Utc> = row.try_get("created_at")?;
        let updated_at: DateTime<Utc> = row.try_get("updated_at")?;

        Ok(Transaction {
            merchant_reference_id: row.try_get("merchant_reference_id")?,
            vendor_id: row.try_get_log::<Option<String>>("vendor_id").flatten(),
            amount,
            mode,
            status,
            utr: row.try_get("utr")?,
            narration: row.try_get_log::<Option<String>>("narration").flatten(),
            error_message: row.try_get("error_message")?,
            created_at,
            updated_at,
        })
    }
}

#[async_trait]
impl TransactionStore for PgTransactionStore {
    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn create(&self, tx: &Transaction) -> Result<(), PayoutError> {
        let result = sqlx::query(
            r#"
            INSERT INTO transactions
                (merchant_reference_id, vendor_id, amount, mode, status, utr,
                 narration, error_message, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (merchant_reference_id) DO NOTHING
            "#,
        )
        .bind(&tx.merchant_reference_id)
        .bind(&tx.vendor_id)
        .bind(tx.amount)
        .bind(tx.mode.as_str())
        .bind(tx.status.as_str())
        .bind(&tx.utr)
        .bind(&tx.narration)
        .bind(&tx.error_message)
        .bind(tx.created_at)
        .bind(tx.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(PayoutError::DuplicateReference(
                tx.merchant_reference_id.clone(),
            ));
        }
        Ok(())
    }

    async fn get(&self, merchant_reference_id: &str) -> Result<Option<Transaction>, PayoutError> {
        let row = sqlx::query(
            r#"
            SELECT merchant_reference_id, vendor_id, amount, mode, status, utr,
                   narration, error_message, created_at, updated_at
            FROM transactions
            WHERE merchant_reference_id = $1
            "#,
        )
        .bind(merchant_reference_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_transaction).transpose()
    }

    async fn update_if(
        &self,
        merchant_reference_id: &str,
        expected_status: TransactionStatus,
        expected_utr: Option<&str>,
        update: &TransactionUpdate,
    ) -> Result<bool, PayoutError> {
        let result = sqlx::query(
            r#"
            UPDATE transactions
            SET status = $1,
                utr = $2,
                error_message = $3,
                updated_at = NOW()
            WHERE merchant_reference_id = $4
              AND status = $5
              AND utr IS NOT DISTINCT FROM $6
            "#,
        )
        .bind(update.status.as_str())
        .bind(&update.utr)
        .bind(&update.error_message)
        .bind(merchant_reference_id)
        .bind(expected_status.as_str())
        .bind(expected_utr)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
