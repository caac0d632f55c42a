use std::sync::Arc;

use crate::application::ports::{Ledger, LedgerError};
use crate::domain::AccountId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admission {
    pub allowed: bool,
    pub available: u32,
}

/// Read-only pre-flight gate comparing an estimated compute cost to the
/// account balance. Runs once before any download on the adapter's reported
/// duration, and again before transcription on the real one. Denial has no
/// side effects.
pub struct AdmissionController {
    ledger: Arc<dyn Ledger>,
}

impl AdmissionController {
    pub fn new(ledger: Arc<dyn Ledger>) -> Self {
        Self { ledger }
    }

    pub async fn check(
        &self,
        account_id: AccountId,
        required: u32,
    ) -> Result<Admission, AdmissionError> {
        let available = self
            .ledger
            .check_balance(account_id)
            .await
            .map_err(AdmissionError::Ledger)?;

        Ok(Admission {
            allowed: available >= required,
            available,
        })
    }

    /// `check` that fails fast with `InsufficientCredits` on denial.
    pub async fn require(&self, account_id: AccountId, required: u32) -> Result<u32, AdmissionError> {
        let admission = self.check(account_id, required).await?;
        if !admission.allowed {
            return Err(AdmissionError::InsufficientCredits {
                required,
                available: admission.available,
            });
        }
        Ok(admission.available)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AdmissionError {
    #[error("insufficient credits: required {required}, available {available}")]
    InsufficientCredits { required: u32, available: u32 },
    #[error("ledger: {0}")]
    Ledger(LedgerError),
}
