//! Request/response shapes of the JSON API.
//!
//! Amounts arrive as raw decimals and are validated into [`Amount`] at this
//! boundary, before any lock is taken.

use crate::domain::account::{AccountId, Balance};
use crate::domain::entry::{Counterparty, Direction, LedgerEntry, LedgerFilter};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferBody {
    pub account_id: AccountId,
    pub amount: Decimal,
    pub counterparty: Counterparty,
    #[serde(default)]
    pub remarks: Option<String>,
    #[serde(default)]
    pub idempotency_key: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositBody {
    pub account_id: AccountId,
    pub amount: Decimal,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub idempotency_key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LedgerQuery {
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub direction: Option<Direction>,
    pub search: Option<String>,
}

impl From<LedgerQuery> for LedgerFilter {
    fn from(q: LedgerQuery) -> Self {
        LedgerFilter {
            date_from: q.date_from,
            date_to: q.date_to,
            direction: q.direction,
            search: q.search.filter(|s| !s.is_empty()),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationResponse {
    pub new_balance: Balance,
    pub entry: LedgerEntry,
}
