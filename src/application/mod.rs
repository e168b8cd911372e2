//! Application layer: the transfer engine (the atomic debit/credit core)
//! and the read-only query service.

pub mod engine;
pub mod query;
