use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::application::ports::{ChargeReceipt, Ledger, LedgerError};
use crate::domain::AccountId;

const MAX_CONFLICT_RETRIES: u32 = 3;

/// Postgres-backed ledger. Balance updates are optimistic-concurrency
/// writes: the row carries a version, the UPDATE is conditional on it, and
/// a lost race surfaces as a conflict retried in a bounded loop rather
/// than an ad hoc sleep counter. Idempotency comes from the transaction
/// table's (account_id, idempotency_key) primary key.
pub struct PgLedger {
    pool: PgPool,
}

impl PgLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn try_charge(
        &self,
        account_id: AccountId,
        credits: u32,
        idempotency_key: &str,
    ) -> Result<ChargeOutcome, LedgerError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| LedgerError::Unavailable(e.to_string()))?;

        let account_uuid = account_id.as_uuid();

        let committed = sqlx::query(
            "SELECT credits FROM ledger_transactions \
             WHERE account_id = $1 AND idempotency_key = $2",
        )
        .bind(account_uuid)
        .bind(idempotency_key)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| LedgerError::Unavailable(e.to_string()))?;

        let account = sqlx::query(
            "SELECT available, version FROM ledger_accounts WHERE account_id = $1",
        )
        .bind(account_uuid)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| LedgerError::Unavailable(e.to_string()))?
        .ok_or_else(|| LedgerError::AccountNotFound(account_id.to_string()))?;

        let available: i64 = account
            .try_get("available")
            .map_err(|e| LedgerError::Unavailable(e.to_string()))?;
        let version: i64 = account
            .try_get("version")
            .map_err(|e| LedgerError::Unavailable(e.to_string()))?;

        if committed.is_some() {
            // Replayed key: already charged, report the current balance.
            return Ok(ChargeOutcome::Done(ChargeReceipt {
                charged: 0,
                new_balance: available.max(0) as u32,
            }));
        }

        if available < credits as i64 {
            return Err(LedgerError::InsufficientFunds {
                required: credits,
                available: available.max(0) as u32,
            });
        }

        let updated = sqlx::query(
            "UPDATE ledger_accounts \
             SET available = available - $1, version = version + 1 \
             WHERE account_id = $2 AND version = $3",
        )
        .bind(credits as i64)
        .bind(account_uuid)
        .bind(version)
        .execute(&mut *tx)
        .await
        .map_err(|e| LedgerError::Unavailable(e.to_string()))?;

        if updated.rows_affected() == 0 {
            // Someone else moved the version; the caller retries.
            return Ok(ChargeOutcome::Conflict);
        }

        sqlx::query(
            "INSERT INTO ledger_transactions (account_id, idempotency_key, credits) \
             VALUES ($1, $2, $3)",
        )
        .bind(account_uuid)
        .bind(idempotency_key)
        .bind(credits as i64)
        .execute(&mut *tx)
        .await
        .map_err(|e| LedgerError::Unavailable(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| LedgerError::Unavailable(e.to_string()))?;

        Ok(ChargeOutcome::Done(ChargeReceipt {
            charged: credits,
            new_balance: (available - credits as i64).max(0) as u32,
        }))
    }
}

enum ChargeOutcome {
    Done(ChargeReceipt),
    Conflict,
}

#[async_trait]
impl Ledger for PgLedger {
    async fn check_balance(&self, account_id: AccountId) -> Result<u32, LedgerError> {
        let row = sqlx::query("SELECT available FROM ledger_accounts WHERE account_id = $1")
            .bind(account_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| LedgerError::Unavailable(e.to_string()))?
            .ok_or_else(|| LedgerError::AccountNotFound(account_id.to_string()))?;

        let available: i64 = row
            .try_get("available")
            .map_err(|e| LedgerError::Unavailable(e.to_string()))?;
        Ok(available.max(0) as u32)
    }

    async fn charge(
        &self,
        account_id: AccountId,
        credits: u32,
        idempotency_key: &str,
    ) -> Result<ChargeReceipt, LedgerError> {
        for attempt in 0..MAX_CONFLICT_RETRIES {
            match self.try_charge(account_id, credits, idempotency_key).await? {
                ChargeOutcome::Done(receipt) => return Ok(receipt),
                ChargeOutcome::Conflict => {
                    tracing::debug!(
                        account_id = %account_id,
                        attempt,
                        "Ledger version conflict, retrying"
                    );
                    tokio::time::sleep(std::time::Duration::from_millis(25 * (attempt as u64 + 1)))
                        .await;
                }
            }
        }

        Err(LedgerError::Conflict(format!(
            "charge on {} lost {} version races",
            account_id, MAX_CONFLICT_RETRIES
        )))
    }
}
