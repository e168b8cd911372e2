use super::account::{AccountId, Balance};
use super::entry::{LedgerEntry, LedgerFilter, NewLedgerEntry};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Scoped exclusive hold on one account's balance.
///
/// Granted by [`AccountStore::acquire_for_update`]; at most one lock per
/// account is in flight at any time. Dropping the guard without calling
/// `commit` aborts the update and leaves the balance unchanged.
#[async_trait]
pub trait BalanceLock: Send {
    /// Balance as read under the lock.
    fn balance(&self) -> Balance;

    /// Durably replaces the balance. The lock stays held afterwards so the
    /// caller can finish the rest of its critical section before release.
    async fn commit(&mut self, new_balance: Balance) -> Result<()>;
}

impl std::fmt::Debug for dyn BalanceLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BalanceLock")
            .field("balance", &self.balance())
            .finish()
    }
}

#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Provisioning hook used by seeding and tests; account opening itself
    /// is outside the engine.
    async fn open_account(&self, id: AccountId, opening_balance: Balance) -> Result<()>;

    /// Point-in-time read outside any update; stale-but-consistent.
    async fn balance(&self, id: AccountId) -> Result<Balance>;

    /// Blocks until the per-account lock is granted, or fails with
    /// `LockTimeout` once `wait` elapses. `AccountNotFound` if absent.
    async fn acquire_for_update(
        &self,
        id: AccountId,
        wait: Duration,
    ) -> Result<Box<dyn BalanceLock>>;
}

#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Assigns `id` and `timestamp`, persists the entry as `Completed` and
    /// returns the stored record. Fails loudly on durability errors, never
    /// drops silently.
    async fn append(&self, entry: NewLedgerEntry) -> Result<LedgerEntry>;

    /// Matching entries for one account, ordered by `id` descending.
    async fn entries(&self, account_id: AccountId, filter: &LedgerFilter)
    -> Result<Vec<LedgerEntry>>;

    /// Replay lookup for submission deduplication.
    async fn find_by_idempotency_key(
        &self,
        account_id: AccountId,
        key: &str,
    ) -> Result<Option<LedgerEntry>>;
}

pub type AccountStoreArc = Arc<dyn AccountStore>;
pub type LedgerStoreArc = Arc<dyn LedgerStore>;
