use crate::domain::account::{AccountId, Balance};
use crate::domain::entry::{EntryStatus, LedgerEntry, LedgerFilter, NewLedgerEntry};
use crate::domain::ports::{AccountStore, BalanceLock, LedgerStore};
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

/// In-memory account store.
///
/// Each account's balance lives behind its own `tokio::sync::Mutex`, which is
/// exactly the per-account exclusive lock the engine needs: operations on
/// different accounts proceed in parallel, operations on the same account
/// serialize in lock-grant order.
#[derive(Default, Clone)]
pub struct InMemoryAccountStore {
    accounts: Arc<RwLock<HashMap<AccountId, Arc<Mutex<Balance>>>>>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn slot(&self, id: AccountId) -> Result<Arc<Mutex<Balance>>> {
        let accounts = self.accounts.read().await;
        accounts
            .get(&id)
            .cloned()
            .ok_or(LedgerError::AccountNotFound(id))
    }
}

struct InMemoryBalanceLock {
    guard: OwnedMutexGuard<Balance>,
}

#[async_trait]
impl BalanceLock for InMemoryBalanceLock {
    fn balance(&self) -> Balance {
        *self.guard
    }

    async fn commit(&mut self, new_balance: Balance) -> Result<()> {
        *self.guard = new_balance;
        Ok(())
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn open_account(&self, id: AccountId, opening_balance: Balance) -> Result<()> {
        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(&id) {
            return Err(LedgerError::AccountExists(id));
        }
        accounts.insert(id, Arc::new(Mutex::new(opening_balance)));
        Ok(())
    }

    async fn balance(&self, id: AccountId) -> Result<Balance> {
        let slot = self.slot(id).await?;
        let balance = *slot.lock().await;
        Ok(balance)
    }

    async fn acquire_for_update(
        &self,
        id: AccountId,
        wait: Duration,
    ) -> Result<Box<dyn BalanceLock>> {
        let slot = self.slot(id).await?;
        let guard = tokio::time::timeout(wait, slot.lock_owned())
            .await
            .map_err(|_| LedgerError::LockTimeout)?;
        Ok(Box::new(InMemoryBalanceLock { guard }))
    }
}

#[derive(Default)]
struct LedgerInner {
    next_id: u64,
    entries: Vec<LedgerEntry>,
}

/// In-memory append-only ledger. Entries are stored in append (= ascending
/// `id`) order; queries walk the list backwards for most-recent-first output.
#[derive(Default, Clone)]
pub struct InMemoryLedgerStore {
    inner: Arc<RwLock<LedgerInner>>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn append(&self, entry: NewLedgerEntry) -> Result<LedgerEntry> {
        let mut inner = self.inner.write().await;
        inner.next_id += 1;
        let persisted = LedgerEntry {
            id: inner.next_id,
            account_id: entry.account_id,
            timestamp: Utc::now(),
            direction: entry.direction,
            amount: entry.amount,
            balance_after: entry.balance_after,
            status: EntryStatus::Completed,
            description: entry.description,
            counterparty: entry.counterparty,
            idempotency_key: entry.idempotency_key,
        };
        inner.entries.push(persisted.clone());
        Ok(persisted)
    }

    async fn entries(
        &self,
        account_id: AccountId,
        filter: &LedgerFilter,
    ) -> Result<Vec<LedgerEntry>> {
        let inner = self.inner.read().await;
        Ok(inner
            .entries
            .iter()
            .rev()
            .filter(|e| e.account_id == account_id && filter.matches(e))
            .cloned()
            .collect())
    }

    async fn find_by_idempotency_key(
        &self,
        account_id: AccountId,
        key: &str,
    ) -> Result<Option<LedgerEntry>> {
        let inner = self.inner.read().await;
        Ok(inner
            .entries
            .iter()
            .find(|e| e.account_id == account_id && e.idempotency_key.as_deref() == Some(key))
            .cloned())
    }
}
