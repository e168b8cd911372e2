//! Domain types and storage ports of the ledger engine.

pub mod account;
pub mod entry;
pub mod ports;
