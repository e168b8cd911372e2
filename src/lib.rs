//! minibank: a ledger transaction engine.
//!
//! Mutates an account balance and appends an immutable ledger record as one
//! atomic unit, under a per-account exclusive lock. Storage is injected via
//! the ports in [`domain::ports`]; an in-memory backend is built in and a
//! RocksDB backend is available behind the `storage-rocksdb` feature. The
//! [`interfaces::http`] module exposes the engine over JSON/HTTP.

pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod interfaces;
