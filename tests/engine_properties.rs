use async_trait::async_trait;
use minibank::application::engine::{DepositRequest, TransferEngine, TransferRequest};
use minibank::domain::account::{AccountId, Amount, Balance};
use minibank::domain::entry::{
    Counterparty, Direction, LedgerEntry, LedgerFilter, NewLedgerEntry,
};
use minibank::domain::ports::{AccountStore, LedgerStore};
use minibank::error::LedgerError;
use minibank::infrastructure::in_memory::{InMemoryAccountStore, InMemoryLedgerStore};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::Duration;

fn counterparty() -> Counterparty {
    Counterparty {
        name: "Jane Roe".to_string(),
        account_number: "000111222".to_string(),
        routing_code: None,
    }
}

fn transfer_req(account_id: AccountId, amount: Decimal) -> TransferRequest {
    TransferRequest {
        account_id,
        amount: Amount::new(amount).unwrap(),
        counterparty: counterparty(),
        remarks: None,
        idempotency_key: None,
    }
}

fn deposit_req(account_id: AccountId, amount: Decimal) -> DepositRequest {
    DepositRequest {
        account_id,
        amount: Amount::new(amount).unwrap(),
        description: None,
        idempotency_key: None,
    }
}

async fn setup(
    opening: Decimal,
) -> (
    Arc<TransferEngine>,
    Arc<InMemoryAccountStore>,
    Arc<InMemoryLedgerStore>,
) {
    let accounts = Arc::new(InMemoryAccountStore::new());
    accounts
        .open_account(1, Balance::new(opening))
        .await
        .unwrap();
    let ledger = Arc::new(InMemoryLedgerStore::new());
    let engine = Arc::new(TransferEngine::new(accounts.clone(), ledger.clone()));
    (engine, accounts, ledger)
}

#[tokio::test]
async fn conservation_over_a_mixed_sequence() {
    let (engine, accounts, ledger) = setup(dec!(1000)).await;

    engine.deposit(deposit_req(1, dec!(300))).await.unwrap();
    engine.transfer(transfer_req(1, dec!(450))).await.unwrap();
    engine.deposit(deposit_req(1, dec!(25.50))).await.unwrap();
    engine.transfer(transfer_req(1, dec!(100))).await.unwrap();
    // One rejected attempt in the middle must not count.
    engine.transfer(transfer_req(1, dec!(10000))).await.unwrap_err();

    // initial + credits - debits
    let expected = dec!(1000) + dec!(300) + dec!(25.50) - dec!(450) - dec!(100);
    assert_eq!(accounts.balance(1).await.unwrap(), Balance::new(expected));

    // Replaying entries in ascending id order reproduces every balance_after.
    let mut entries = ledger.entries(1, &LedgerFilter::default()).await.unwrap();
    entries.reverse();
    let mut running = dec!(1000);
    for entry in &entries {
        match entry.direction {
            Direction::Credit => running += entry.amount.value(),
            Direction::Debit => running -= entry.amount.value(),
        }
        assert_eq!(entry.balance_after, Balance::new(running));
    }
    assert_eq!(running, expected);
}

#[tokio::test]
async fn exact_balance_transfer_reaches_zero() {
    let (engine, accounts, _) = setup(dec!(1000)).await;

    let entry = engine.transfer(transfer_req(1, dec!(1000))).await.unwrap();
    assert_eq!(entry.direction, Direction::Debit);
    assert_eq!(entry.balance_after, Balance::new(dec!(0)));
    assert_eq!(accounts.balance(1).await.unwrap(), Balance::new(dec!(0)));
}

#[tokio::test]
async fn rejected_transfer_leaves_no_trace() {
    let (engine, accounts, ledger) = setup(dec!(1000)).await;

    let err = engine.transfer(transfer_req(1, dec!(1001))).await.unwrap_err();
    assert!(matches!(err, LedgerError::InsufficientFunds { .. }));

    assert_eq!(accounts.balance(1).await.unwrap(), Balance::new(dec!(1000)));
    let entries = ledger.entries(1, &LedgerFilter::default()).await.unwrap();
    assert!(entries.is_empty());
}

#[tokio::test]
async fn concurrent_transfers_exceeding_balance_approve_exactly_one() {
    let (engine, accounts, ledger) = setup(dec!(1000)).await;

    let (a, b) = tokio::join!(
        engine.transfer(transfer_req(1, dec!(600))),
        engine.transfer(transfer_req(1, dec!(600))),
    );

    let successes = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
    assert_eq!(successes, 1, "the balance supports exactly one approval");

    let rejected = if a.is_ok() { b } else { a };
    assert!(matches!(
        rejected.unwrap_err(),
        LedgerError::InsufficientFunds { .. }
    ));

    assert_eq!(accounts.balance(1).await.unwrap(), Balance::new(dec!(400)));
    let entries = ledger.entries(1, &LedgerFilter::default()).await.unwrap();
    assert_eq!(entries.len(), 1);
}

#[tokio::test]
async fn many_concurrent_transfers_never_overdraft() {
    let (engine, accounts, ledger) = setup(dec!(1000)).await;

    let mut handles = Vec::new();
    for _ in 0..10 {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            engine.transfer(transfer_req(1, dec!(300))).await.is_ok()
        }));
    }

    let mut approvals = 0;
    for handle in handles {
        if handle.await.unwrap() {
            approvals += 1;
        }
    }

    // 1000 / 300 supports exactly three approvals.
    assert_eq!(approvals, 3);
    assert_eq!(accounts.balance(1).await.unwrap(), Balance::new(dec!(100)));
    let entries = ledger.entries(1, &LedgerFilter::default()).await.unwrap();
    assert_eq!(entries.len(), 3);
}

#[tokio::test]
async fn returned_entry_is_never_altered_by_later_operations() {
    let (engine, _, ledger) = setup(dec!(1000)).await;

    let first = engine.transfer(transfer_req(1, dec!(100))).await.unwrap();
    engine.deposit(deposit_req(1, dec!(50))).await.unwrap();
    engine.transfer(transfer_req(1, dec!(200))).await.unwrap();

    let entries = ledger.entries(1, &LedgerFilter::default()).await.unwrap();
    let stored = entries.iter().find(|e| e.id == first.id).unwrap();
    assert_eq!(*stored, first);
}

#[tokio::test]
async fn direction_filter_excludes_other_entries() {
    let (engine, _, ledger) = setup(dec!(500)).await;

    engine.transfer(transfer_req(1, dec!(100))).await.unwrap();
    let deposit = engine.deposit(deposit_req(1, dec!(250))).await.unwrap();

    let filter = LedgerFilter {
        direction: Some(Direction::Credit),
        ..Default::default()
    };
    let credits = ledger.entries(1, &filter).await.unwrap();
    assert_eq!(credits.len(), 1);
    assert_eq!(credits[0], deposit);
}

#[tokio::test]
async fn lock_timeout_is_surfaced_while_the_account_is_held() {
    let accounts = Arc::new(InMemoryAccountStore::new());
    accounts
        .open_account(1, Balance::new(dec!(1000)))
        .await
        .unwrap();
    let ledger = Arc::new(InMemoryLedgerStore::new());
    let engine = TransferEngine::with_lock_wait(
        accounts.clone(),
        ledger,
        Duration::from_millis(20),
    );

    let _held = accounts
        .acquire_for_update(1, Duration::from_secs(1))
        .await
        .unwrap();

    let err = engine.transfer(transfer_req(1, dec!(10))).await.unwrap_err();
    assert!(matches!(err, LedgerError::LockTimeout));

    // Nothing happened; the caller may retry.
    drop(_held);
    assert_eq!(accounts.balance(1).await.unwrap(), Balance::new(dec!(1000)));
}

/// Ledger store that accepts nothing, to exercise the partial-failure path.
struct FailingLedgerStore;

#[async_trait]
impl LedgerStore for FailingLedgerStore {
    async fn append(&self, _entry: NewLedgerEntry) -> minibank::error::Result<LedgerEntry> {
        Err(LedgerError::Storage("disk full".to_string()))
    }

    async fn entries(
        &self,
        _account_id: AccountId,
        _filter: &LedgerFilter,
    ) -> minibank::error::Result<Vec<LedgerEntry>> {
        Ok(Vec::new())
    }

    async fn find_by_idempotency_key(
        &self,
        _account_id: AccountId,
        _key: &str,
    ) -> minibank::error::Result<Option<LedgerEntry>> {
        Ok(None)
    }
}

#[tokio::test]
async fn append_failure_after_commit_is_a_distinct_fatal_error() {
    let accounts = Arc::new(InMemoryAccountStore::new());
    accounts
        .open_account(1, Balance::new(dec!(1000)))
        .await
        .unwrap();
    let engine = TransferEngine::new(accounts.clone(), Arc::new(FailingLedgerStore));

    let err = engine.transfer(transfer_req(1, dec!(600))).await.unwrap_err();
    assert!(matches!(
        err,
        LedgerError::LedgerWriteFailure { account_id: 1, .. }
    ));

    // The debit is already durable; this is the state reconciliation exists for.
    assert_eq!(accounts.balance(1).await.unwrap(), Balance::new(dec!(400)));
}
