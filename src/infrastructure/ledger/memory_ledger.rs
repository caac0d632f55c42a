use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::application::ports::{ChargeReceipt, Ledger, LedgerError};
use crate::domain::AccountId;

struct Account {
    available: u32,
    applied: HashSet<String>,
}

/// In-process ledger for development and tests. Charges are idempotent by
/// (account, key): replaying a committed key is a no-op reporting the
/// current balance.
pub struct MemoryLedger {
    accounts: Mutex<HashMap<AccountId, Account>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self {
            accounts: Mutex::new(HashMap::new()),
        }
    }

    pub async fn credit(&self, account_id: AccountId, credits: u32) {
        let mut accounts = self.accounts.lock().await;
        let account = accounts.entry(account_id).or_insert(Account {
            available: 0,
            applied: HashSet::new(),
        });
        account.available += credits;
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn check_balance(&self, account_id: AccountId) -> Result<u32, LedgerError> {
        let accounts = self.accounts.lock().await;
        accounts
            .get(&account_id)
            .map(|a| a.available)
            .ok_or_else(|| LedgerError::AccountNotFound(account_id.to_string()))
    }

    async fn charge(
        &self,
        account_id: AccountId,
        credits: u32,
        idempotency_key: &str,
    ) -> Result<ChargeReceipt, LedgerError> {
        let mut accounts = self.accounts.lock().await;
        let account = accounts
            .get_mut(&account_id)
            .ok_or_else(|| LedgerError::AccountNotFound(account_id.to_string()))?;

        if account.applied.contains(idempotency_key) {
            return Ok(ChargeReceipt {
                charged: 0,
                new_balance: account.available,
            });
        }

        if account.available < credits {
            return Err(LedgerError::InsufficientFunds {
                required: credits,
                available: account.available,
            });
        }

        account.available -= credits;
        account.applied.insert(idempotency_key.to_string());

        Ok(ChargeReceipt {
            charged: credits,
            new_balance: account.available,
        })
    }
}
