use async_trait::async_trait;

use crate::domain::AccountId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChargeReceipt {
    pub charged: u32,
    pub new_balance: u32,
}

/// External credit bookkeeping. `charge` must be idempotent by
/// `(account_id, idempotency_key)`: replaying a committed charge is a
/// no-op that reports the current balance.
#[async_trait]
pub trait Ledger: Send + Sync {
    async fn check_balance(&self, account_id: AccountId) -> Result<u32, LedgerError>;

    async fn charge(
        &self,
        account_id: AccountId,
        credits: u32,
        idempotency_key: &str,
    ) -> Result<ChargeReceipt, LedgerError>;
}

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: u32, available: u32 },
    #[error("account not found: {0}")]
    AccountNotFound(String),
    #[error("concurrent ledger update conflict: {0}")]
    Conflict(String),
    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}
