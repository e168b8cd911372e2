use crate::domain::account::{AccountId, Amount, Balance};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Signed effect of a ledger entry on the account balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Credit,
    Debit,
}

/// Entries are only ever persisted as `Completed`; rejected operations never
/// reach the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryStatus {
    Completed,
    Failed,
}

/// Recipient details of an external transfer. Absent for self-deposits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Counterparty {
    pub name: String,
    pub account_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routing_code: Option<String>,
}

/// An immutable record of one balance-affecting event.
///
/// `id` and `timestamp` are assigned by the ledger store at append time.
/// Replaying an account's entries in ascending `id` order against its opening
/// balance reproduces every `balance_after` exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub id: u64,
    pub account_id: AccountId,
    pub timestamp: DateTime<Utc>,
    pub direction: Direction,
    pub amount: Amount,
    pub balance_after: Balance,
    pub status: EntryStatus,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counterparty: Option<Counterparty>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
}

/// Append-time input: everything the engine knows before the store assigns
/// `id`, `timestamp` and marks the entry `Completed`.
#[derive(Debug, Clone)]
pub struct NewLedgerEntry {
    pub account_id: AccountId,
    pub direction: Direction,
    pub amount: Amount,
    pub balance_after: Balance,
    pub description: String,
    pub counterparty: Option<Counterparty>,
    pub idempotency_key: Option<String>,
}

/// Stateless history filter: every parameter restricts the match, none is
/// required, no cursor.
#[derive(Debug, Clone, Default)]
pub struct LedgerFilter {
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub direction: Option<Direction>,
    pub search: Option<String>,
}

impl LedgerFilter {
    pub fn matches(&self, entry: &LedgerEntry) -> bool {
        let date = entry.timestamp.date_naive();
        if let Some(from) = self.date_from
            && date < from
        {
            return false;
        }
        if let Some(to) = self.date_to
            && date > to
        {
            return false;
        }
        if let Some(direction) = self.direction
            && entry.direction != direction
        {
            return false;
        }
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            let mut haystacks = vec![entry.description.to_lowercase()];
            if let Some(cp) = &entry.counterparty {
                haystacks.push(cp.name.to_lowercase());
                haystacks.push(cp.account_number.to_lowercase());
            }
            if !haystacks.iter().any(|h| h.contains(&needle)) {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn entry(direction: Direction, description: &str, counterparty: Option<Counterparty>) -> LedgerEntry {
        LedgerEntry {
            id: 1,
            account_id: 1,
            timestamp: "2025-03-15T10:00:00Z".parse().unwrap(),
            direction,
            amount: Amount::new(dec!(100)).unwrap(),
            balance_after: Balance::new(dec!(900)),
            status: EntryStatus::Completed,
            description: description.to_string(),
            counterparty,
            idempotency_key: None,
        }
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let e = entry(Direction::Debit, "Online Transfer", None);
        assert!(LedgerFilter::default().matches(&e));
    }

    #[test]
    fn test_direction_filter() {
        let e = entry(Direction::Debit, "Online Transfer", None);
        let filter = LedgerFilter {
            direction: Some(Direction::Credit),
            ..Default::default()
        };
        assert!(!filter.matches(&e));
    }

    #[test]
    fn test_date_range_filter() {
        let e = entry(Direction::Debit, "Online Transfer", None);

        let inside = LedgerFilter {
            date_from: Some("2025-03-01".parse().unwrap()),
            date_to: Some("2025-03-31".parse().unwrap()),
            ..Default::default()
        };
        assert!(inside.matches(&e));

        let before = LedgerFilter {
            date_to: Some("2025-02-28".parse().unwrap()),
            ..Default::default()
        };
        assert!(!before.matches(&e));
    }

    #[test]
    fn test_search_covers_counterparty_fields() {
        let cp = Counterparty {
            name: "Alice Smith".to_string(),
            account_number: "GB001122".to_string(),
            routing_code: None,
        };
        let e = entry(Direction::Debit, "Rent", Some(cp));

        let by_name = LedgerFilter {
            search: Some("alice".to_string()),
            ..Default::default()
        };
        assert!(by_name.matches(&e));

        let by_account = LedgerFilter {
            search: Some("001122".to_string()),
            ..Default::default()
        };
        assert!(by_account.matches(&e));

        let miss = LedgerFilter {
            search: Some("bob".to_string()),
            ..Default::default()
        };
        assert!(!miss.matches(&e));
    }

    #[test]
    fn test_entry_wire_shape_is_camel_case() {
        let e = entry(Direction::Credit, "Cash Deposit", None);
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["direction"], "Credit");
        assert_eq!(json["balanceAfter"], "900");
        assert_eq!(json["status"], "Completed");
        // Absent counterparty is omitted, not null.
        assert!(json.get("counterparty").is_none());
    }
}
