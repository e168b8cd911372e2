use crate::domain::account::AccountId;
use crate::domain::entry::{Direction, EntryStatus, LedgerEntry, LedgerFilter};
use crate::domain::ports::LedgerStoreArc;
use crate::error::Result;
use chrono::Datelike;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

/// Credit/debit totals over an account's completed entries.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
    pub total_credit: Decimal,
    pub total_debit: Decimal,
    pub net_flow: Decimal,
}

/// One calendar month of aggregated flows, labelled for display ("Jan 25").
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyFlow {
    pub month: String,
    pub credit: Decimal,
    pub debit: Decimal,
}

/// Thin read path over the ledger store: filtered history and aggregate sums.
/// Sums always match a full scan of the matching entries.
pub struct QueryService {
    ledger: LedgerStoreArc,
}

impl QueryService {
    pub fn new(ledger: LedgerStoreArc) -> Self {
        Self { ledger }
    }

    /// Filtered history, most recent first.
    pub async fn history(
        &self,
        account_id: AccountId,
        filter: &LedgerFilter,
    ) -> Result<Vec<LedgerEntry>> {
        self.ledger.entries(account_id, filter).await
    }

    pub async fn summary(&self, account_id: AccountId) -> Result<AccountSummary> {
        let entries = self
            .ledger
            .entries(account_id, &LedgerFilter::default())
            .await?;

        let mut total_credit = Decimal::ZERO;
        let mut total_debit = Decimal::ZERO;
        for entry in completed(&entries) {
            match entry.direction {
                Direction::Credit => total_credit += entry.amount.value(),
                Direction::Debit => total_debit += entry.amount.value(),
            }
        }

        Ok(AccountSummary {
            total_credit,
            total_debit,
            net_flow: total_credit - total_debit,
        })
    }

    /// Credit/debit per calendar month, oldest month first.
    pub async fn monthly_trends(&self, account_id: AccountId) -> Result<Vec<MonthlyFlow>> {
        let entries = self
            .ledger
            .entries(account_id, &LedgerFilter::default())
            .await?;

        // BTreeMap keyed by (year, month) keeps the buckets in ascending order.
        let mut buckets: BTreeMap<(i32, u32), (Decimal, Decimal)> = BTreeMap::new();
        for entry in completed(&entries) {
            let key = (entry.timestamp.year(), entry.timestamp.month());
            let bucket = buckets.entry(key).or_default();
            match entry.direction {
                Direction::Credit => bucket.0 += entry.amount.value(),
                Direction::Debit => bucket.1 += entry.amount.value(),
            }
        }

        Ok(buckets
            .into_iter()
            .map(|((year, month), (credit, debit))| MonthlyFlow {
                month: month_label(year, month),
                credit,
                debit,
            })
            .collect())
    }
}

fn completed(entries: &[LedgerEntry]) -> impl Iterator<Item = &LedgerEntry> {
    entries
        .iter()
        .filter(|e| e.status == EntryStatus::Completed)
}

fn month_label(year: i32, month: u32) -> String {
    const NAMES: [&str; 12] = [
        "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
    ];
    format!("{} {:02}", NAMES[(month - 1) as usize], year % 100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::account::{Amount, Balance};
    use crate::domain::entry::NewLedgerEntry;
    use crate::domain::ports::LedgerStore;
    use crate::infrastructure::in_memory::InMemoryLedgerStore;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    async fn append(
        store: &InMemoryLedgerStore,
        direction: Direction,
        amount: Decimal,
        balance_after: Decimal,
    ) {
        store
            .append(NewLedgerEntry {
                account_id: 1,
                direction,
                amount: Amount::new(amount).unwrap(),
                balance_after: Balance::new(balance_after),
                description: "test".to_string(),
                counterparty: None,
                idempotency_key: None,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_summary_totals_and_net_flow() {
        let store = Arc::new(InMemoryLedgerStore::new());
        append(&store, Direction::Credit, dec!(500), dec!(500)).await;
        append(&store, Direction::Debit, dec!(120), dec!(380)).await;
        append(&store, Direction::Debit, dec!(80), dec!(300)).await;

        let queries = QueryService::new(store);
        let summary = queries.summary(1).await.unwrap();

        assert_eq!(summary.total_credit, dec!(500));
        assert_eq!(summary.total_debit, dec!(200));
        assert_eq!(summary.net_flow, dec!(300));
    }

    #[tokio::test]
    async fn test_summary_of_empty_account_is_zero() {
        let queries = QueryService::new(Arc::new(InMemoryLedgerStore::new()));
        let summary = queries.summary(9).await.unwrap();
        assert_eq!(summary.total_credit, Decimal::ZERO);
        assert_eq!(summary.total_debit, Decimal::ZERO);
        assert_eq!(summary.net_flow, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_monthly_trends_groups_and_labels() {
        let store = Arc::new(InMemoryLedgerStore::new());
        append(&store, Direction::Credit, dec!(100), dec!(100)).await;
        append(&store, Direction::Debit, dec!(40), dec!(60)).await;

        let queries = QueryService::new(store);
        let trends = queries.monthly_trends(1).await.unwrap();

        // All entries land in the current month (store assigns timestamps).
        assert_eq!(trends.len(), 1);
        assert_eq!(trends[0].credit, dec!(100));
        assert_eq!(trends[0].debit, dec!(40));
    }

    #[test]
    fn test_month_label_format() {
        assert_eq!(month_label(2025, 1), "Jan 25");
        assert_eq!(month_label(2024, 12), "Dec 24");
    }
}
