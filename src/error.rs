use crate::domain::account::AccountId;
use rust_decimal::Decimal;
use thiserror::Error;

pub type Result<T, E = LedgerError> = std::result::Result<T, E>;

/// Error taxonomy of the ledger engine.
///
/// Validation errors (`InvalidAmount`, `AccountNotFound`, `InsufficientFunds`)
/// are surfaced before any mutation. `LockTimeout` is transient and safe to
/// retry. `LedgerWriteFailure` marks the partial-failure state where the
/// balance commit is durable but the ledger append is not; it must never be
/// retried as a fresh operation.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("amount must be a positive value")]
    InvalidAmount,
    #[error("account {0} not found")]
    AccountNotFound(AccountId),
    #[error("account {0} already exists")]
    AccountExists(AccountId),
    #[error("insufficient funds: balance {balance}, requested {requested}")]
    InsufficientFunds {
        balance: Decimal,
        requested: Decimal,
    },
    #[error("timed out waiting for the account update lock")]
    LockTimeout,
    #[error("balance of account {account_id} was updated but the ledger append failed; needs reconciliation")]
    LedgerWriteFailure {
        account_id: AccountId,
        #[source]
        source: Box<LedgerError>,
    },
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        LedgerError::Storage(err.to_string())
    }
}

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for LedgerError {
    fn from(err: rocksdb::Error) -> Self {
        LedgerError::Storage(err.to_string())
    }
}
