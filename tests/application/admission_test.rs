use std::sync::Arc;

use semporna::application::ports::Ledger;
use semporna::application::services::{AdmissionController, AdmissionError};
use semporna::domain::AccountId;
use semporna::infrastructure::ledger::MemoryLedger;

async fn controller_with_balance(
    account: AccountId,
    credits: u32,
) -> (AdmissionController, Arc<MemoryLedger>) {
    let ledger = Arc::new(MemoryLedger::new());
    ledger.credit(account, credits).await;
    let controller = AdmissionController::new(Arc::clone(&ledger) as Arc<dyn Ledger>);
    (controller, ledger)
}

#[tokio::test]
async fn given_sufficient_balance_when_checking_then_allows() {
    let account = AccountId::new();
    let (controller, _ledger) = controller_with_balance(account, 50).await;

    let admission = controller.check(account, 30).await.unwrap();
    assert!(admission.allowed);
    assert_eq!(admission.available, 50);
}

#[tokio::test]
async fn given_insufficient_balance_when_requiring_then_denies_without_side_effects() {
    let account = AccountId::new();
    let (controller, ledger) = controller_with_balance(account, 50).await;

    let err = controller.require(account, 60).await.unwrap_err();
    match err {
        AdmissionError::InsufficientCredits {
            required,
            available,
        } => {
            assert_eq!(required, 60);
            assert_eq!(available, 50);
        }
        other => panic!("unexpected error: {}", other),
    }

    // Pre-flight is read-only: the balance is untouched.
    assert_eq!(ledger.check_balance(account).await.unwrap(), 50);
}

#[tokio::test]
async fn given_exact_balance_when_requiring_then_allows() {
    let account = AccountId::new();
    let (controller, _ledger) = controller_with_balance(account, 30).await;

    assert_eq!(controller.require(account, 30).await.unwrap(), 30);
}

#[tokio::test]
async fn given_unknown_account_when_checking_then_surfaces_ledger_error() {
    let ledger = Arc::new(MemoryLedger::new());
    let controller = AdmissionController::new(ledger as Arc<dyn Ledger>);

    let err = controller.check(AccountId::new(), 10).await.unwrap_err();
    assert!(matches!(err, AdmissionError::Ledger(_)));
}
