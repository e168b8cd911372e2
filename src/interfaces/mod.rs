//! HTTP interface adapters.

pub mod http;
