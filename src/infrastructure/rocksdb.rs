use crate::domain::account::{AccountId, Balance};
use crate::domain::entry::{EntryStatus, LedgerEntry, LedgerFilter, NewLedgerEntry};
use crate::domain::ports::{AccountStore, BalanceLock, LedgerStore};
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use chrono::Utc;
use rocksdb::{ColumnFamilyDescriptor, DB, IteratorMode, Options};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

/// Column family for account balances, keyed by big-endian account id.
pub const CF_ACCOUNTS: &str = "accounts";
/// Column family for ledger entries, keyed by big-endian entry id so that
/// iteration order is id order.
pub const CF_LEDGER: &str = "ledger";

/// Persistent store backed by RocksDB, implementing both ports.
///
/// Balances and entries are durable; the per-account exclusive lock is an
/// in-process registry of `tokio::sync::Mutex`es, equivalent to row-level
/// `SELECT ... FOR UPDATE` semantics for a single engine instance.
///
/// `Clone` shares the underlying `Arc<DB>` and lock registry.
#[derive(Clone)]
pub struct RocksDbStore {
    db: Arc<DB>,
    locks: Arc<RwLock<HashMap<AccountId, Arc<Mutex<()>>>>>,
    append_seq: Arc<Mutex<()>>,
}

impl RocksDbStore {
    /// Opens or creates the database, ensuring both column families exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_accounts = ColumnFamilyDescriptor::new(CF_ACCOUNTS, Options::default());
        let cf_ledger = ColumnFamilyDescriptor::new(CF_LEDGER, Options::default());

        let db = DB::open_cf_descriptors(&opts, path, vec![cf_accounts, cf_ledger])?;

        Ok(Self {
            db: Arc::new(db),
            locks: Arc::new(RwLock::new(HashMap::new())),
            append_seq: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &str) -> Result<&rocksdb::ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| LedgerError::Storage(format!("column family {name} not found")))
    }

    fn read_balance(&self, id: AccountId) -> Result<Option<Balance>> {
        let cf = self.cf(CF_ACCOUNTS)?;
        match self.db.get_cf(cf, id.to_be_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn write_balance(&self, id: AccountId, balance: Balance) -> Result<()> {
        let cf = self.cf(CF_ACCOUNTS)?;
        self.db
            .put_cf(cf, id.to_be_bytes(), serde_json::to_vec(&balance)?)?;
        Ok(())
    }

    /// Highest entry id assigned so far, 0 on an empty ledger.
    fn last_entry_id(&self) -> Result<u64> {
        let cf = self.cf(CF_LEDGER)?;
        let mut iter = self.db.iterator_cf(cf, IteratorMode::End);
        match iter.next() {
            Some(item) => {
                let (key, _) = item?;
                let bytes: [u8; 8] = key
                    .as_ref()
                    .try_into()
                    .map_err(|_| LedgerError::Storage("malformed ledger key".to_string()))?;
                Ok(u64::from_be_bytes(bytes))
            }
            None => Ok(0),
        }
    }

    async fn account_lock(&self, id: AccountId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.write().await;
        locks.entry(id).or_default().clone()
    }

    /// Full descending scan of one account's entries; the ledger is small
    /// enough at this scale that no secondary index is kept.
    fn scan_entries<F>(&self, account_id: AccountId, mut keep: F) -> Result<Vec<LedgerEntry>>
    where
        F: FnMut(&LedgerEntry) -> bool,
    {
        let cf = self.cf(CF_LEDGER)?;
        let mut out = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::End) {
            let (_, value) = item?;
            let entry: LedgerEntry = serde_json::from_slice(&value)?;
            if entry.account_id == account_id && keep(&entry) {
                out.push(entry);
            }
        }
        Ok(out)
    }
}

struct RocksDbBalanceLock {
    store: RocksDbStore,
    account_id: AccountId,
    balance: Balance,
    _permit: OwnedMutexGuard<()>,
}

#[async_trait]
impl BalanceLock for RocksDbBalanceLock {
    fn balance(&self) -> Balance {
        self.balance
    }

    async fn commit(&mut self, new_balance: Balance) -> Result<()> {
        self.store.write_balance(self.account_id, new_balance)?;
        self.balance = new_balance;
        Ok(())
    }
}

#[async_trait]
impl AccountStore for RocksDbStore {
    async fn open_account(&self, id: AccountId, opening_balance: Balance) -> Result<()> {
        if self.read_balance(id)?.is_some() {
            return Err(LedgerError::AccountExists(id));
        }
        self.write_balance(id, opening_balance)
    }

    async fn balance(&self, id: AccountId) -> Result<Balance> {
        self.read_balance(id)?
            .ok_or(LedgerError::AccountNotFound(id))
    }

    async fn acquire_for_update(
        &self,
        id: AccountId,
        wait: Duration,
    ) -> Result<Box<dyn BalanceLock>> {
        // Existence check before queueing on the lock.
        if self.read_balance(id)?.is_none() {
            return Err(LedgerError::AccountNotFound(id));
        }

        let lock = self.account_lock(id).await;
        let permit = tokio::time::timeout(wait, lock.lock_owned())
            .await
            .map_err(|_| LedgerError::LockTimeout)?;

        // Re-read under the lock; a concurrent update may have committed
        // between the existence check and the grant.
        let balance = self
            .read_balance(id)?
            .ok_or(LedgerError::AccountNotFound(id))?;

        Ok(Box::new(RocksDbBalanceLock {
            store: self.clone(),
            account_id: id,
            balance,
            _permit: permit,
        }))
    }
}

#[async_trait]
impl LedgerStore for RocksDbStore {
    async fn append(&self, entry: NewLedgerEntry) -> Result<LedgerEntry> {
        // Id assignment and put must not interleave across appends.
        let _seq = self.append_seq.lock().await;

        let id = self.last_entry_id()? + 1;
        let persisted = LedgerEntry {
            id,
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

        let cf = self.cf(CF_LEDGER)?;
        self.db
            .put_cf(cf, id.to_be_bytes(), serde_json::to_vec(&persisted)?)?;
        Ok(persisted)
    }

    async fn entries(
        &self,
        account_id: AccountId,
        filter: &LedgerFilter,
    ) -> Result<Vec<LedgerEntry>> {
        self.scan_entries(account_id, |e| filter.matches(e))
    }

    async fn find_by_idempotency_key(
        &self,
        account_id: AccountId,
        key: &str,
    ) -> Result<Option<LedgerEntry>> {
        let matches = self.scan_entries(account_id, |e| {
            e.idempotency_key.as_deref() == Some(key)
        })?;
        Ok(matches.into_iter().next())
    }
}
