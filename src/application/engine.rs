use crate::domain::account::{AccountId, Amount};
use crate::domain::entry::{Counterparty, Direction, LedgerEntry, NewLedgerEntry};
use crate::domain::ports::{AccountStoreArc, BalanceLock, LedgerStoreArc};
use crate::error::{LedgerError, Result};
use std::time::Duration;

/// Default bound on waiting for the per-account lock.
pub const DEFAULT_LOCK_WAIT: Duration = Duration::from_secs(5);

/// A debit against `account_id` in favor of an external counterparty.
///
/// `amount` is validated at construction ([`Amount`]), so a non-positive
/// value is rejected before the engine acquires any lock.
#[derive(Debug, Clone)]
pub struct TransferRequest {
    pub account_id: AccountId,
    pub amount: Amount,
    pub counterparty: Counterparty,
    pub remarks: Option<String>,
    pub idempotency_key: Option<String>,
}

/// A credit to `account_id`; no counterparty, no insufficiency check.
#[derive(Debug, Clone)]
pub struct DepositRequest {
    pub account_id: AccountId,
    pub amount: Amount,
    pub description: Option<String>,
    pub idempotency_key: Option<String>,
}

/// The core: executes a funds movement as one atomic unit of balance
/// validation, balance mutation and ledger append.
///
/// Both stores are injected ports, so the engine is testable against
/// in-memory fakes and oblivious to the storage backend. The per-account
/// lock is held across the whole check-commit-append window; releasing it
/// between the balance check and the commit would reintroduce the
/// check-then-act overdraft race.
pub struct TransferEngine {
    accounts: AccountStoreArc,
    ledger: LedgerStoreArc,
    lock_wait: Duration,
}

impl TransferEngine {
    pub fn new(accounts: AccountStoreArc, ledger: LedgerStoreArc) -> Self {
        Self::with_lock_wait(accounts, ledger, DEFAULT_LOCK_WAIT)
    }

    pub fn with_lock_wait(
        accounts: AccountStoreArc,
        ledger: LedgerStoreArc,
        lock_wait: Duration,
    ) -> Self {
        Self {
            accounts,
            ledger,
            lock_wait,
        }
    }

    /// Debits the account and appends the matching ledger entry.
    ///
    /// A rejected transfer (`InsufficientFunds`, `AccountNotFound`,
    /// `LockTimeout`) leaves no trace: no balance change, no entry.
    pub async fn transfer(&self, req: TransferRequest) -> Result<LedgerEntry> {
        let mut lock = self
            .accounts
            .acquire_for_update(req.account_id, self.lock_wait)
            .await?;

        if let Some(existing) = self.replay(req.account_id, req.idempotency_key.as_deref()).await? {
            return Ok(existing);
        }

        let balance = lock.balance();
        if balance.0 < req.amount.value() {
            // Dropping the lock uncommitted aborts; nothing is written.
            return Err(LedgerError::InsufficientFunds {
                balance: balance.0,
                requested: req.amount.value(),
            });
        }

        let new_balance = balance - req.amount.into();
        lock.commit(new_balance).await?;

        let description = req.remarks.filter(|r| !r.is_empty()).unwrap_or_else(|| {
            format!(
                "Transfer to {} ({})",
                req.counterparty.name, req.counterparty.account_number
            )
        });
        let entry = NewLedgerEntry {
            account_id: req.account_id,
            direction: Direction::Debit,
            amount: req.amount,
            balance_after: new_balance,
            description,
            counterparty: Some(req.counterparty),
            idempotency_key: req.idempotency_key,
        };
        let persisted = self.append_committed(entry).await?;
        drop(lock);

        tracing::debug!(
            account_id = req.account_id,
            entry_id = persisted.id,
            %new_balance,
            "transfer completed"
        );
        Ok(persisted)
    }

    /// Credits the account and appends the matching ledger entry.
    pub async fn deposit(&self, req: DepositRequest) -> Result<LedgerEntry> {
        let mut lock = self
            .accounts
            .acquire_for_update(req.account_id, self.lock_wait)
            .await?;

        if let Some(existing) = self.replay(req.account_id, req.idempotency_key.as_deref()).await? {
            return Ok(existing);
        }

        let new_balance = lock.balance() + req.amount.into();
        lock.commit(new_balance).await?;

        let entry = NewLedgerEntry {
            account_id: req.account_id,
            direction: Direction::Credit,
            amount: req.amount,
            balance_after: new_balance,
            description: req
                .description
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| "Cash Deposit".to_string()),
            counterparty: None,
            idempotency_key: req.idempotency_key,
        };
        let persisted = self.append_committed(entry).await?;
        drop(lock);

        tracing::debug!(
            account_id = req.account_id,
            entry_id = persisted.id,
            %new_balance,
            "deposit completed"
        );
        Ok(persisted)
    }

    /// Resolves a repeated idempotency key to the original entry. Runs under
    /// the account lock so two in-flight submissions with the same key cannot
    /// both miss it.
    async fn replay(&self, account_id: AccountId, key: Option<&str>) -> Result<Option<LedgerEntry>> {
        let Some(key) = key else {
            return Ok(None);
        };
        let existing = self.ledger.find_by_idempotency_key(account_id, key).await?;
        if existing.is_some() {
            tracing::debug!(account_id, key, "replaying entry for repeated idempotency key");
        }
        Ok(existing)
    }

    /// Appends after the balance commit is already durable. On failure the
    /// ledger is missing an entry the balance reflects, so the inconsistency
    /// is logged for manual reconciliation and surfaced as
    /// `LedgerWriteFailure` instead of a retryable error.
    async fn append_committed(&self, entry: NewLedgerEntry) -> Result<LedgerEntry> {
        let account_id = entry.account_id;
        let direction = entry.direction;
        let amount = entry.amount;
        let balance_after = entry.balance_after;

        match self.ledger.append(entry).await {
            Ok(persisted) => Ok(persisted),
            Err(source) => {
                tracing::error!(
                    account_id,
                    ?direction,
                    %amount,
                    %balance_after,
                    error = %source,
                    "ledger append failed after balance commit; manual reconciliation required"
                );
                Err(LedgerError::LedgerWriteFailure {
                    account_id,
                    source: Box::new(source),
                })
            }
        }
    }
}
