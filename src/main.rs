use clap::Parser;
use miette::{IntoDiagnostic, Result, miette};
use minibank::application::engine::TransferEngine;
use minibank::application::query::QueryService;
use minibank::domain::account::{AccountId, Balance};
use minibank::domain::ports::{AccountStore, AccountStoreArc, LedgerStoreArc};
use minibank::infrastructure::in_memory::{InMemoryAccountStore, InMemoryLedgerStore};
use minibank::interfaces::http::{AppState, build_app};
use rust_decimal::Decimal;
use std::sync::Arc;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Address to bind the HTTP API on
    #[arg(long, default_value = "127.0.0.1:8080")]
    bind: String,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[cfg(feature = "storage-rocksdb")]
    #[arg(long)]
    db_path: Option<std::path::PathBuf>,

    /// Seed an account as `id=balance`. Repeatable.
    #[arg(long = "seed", value_name = "ID=BALANCE", value_parser = parse_seed)]
    seeds: Vec<(AccountId, Decimal)>,
}

fn parse_seed(s: &str) -> Result<(AccountId, Decimal), String> {
    let (id, balance) = s
        .split_once('=')
        .ok_or_else(|| format!("expected `id=balance`, got `{s}`"))?;
    let id: AccountId = id.trim().parse().map_err(|e| format!("bad account id: {e}"))?;
    let balance: Decimal = balance
        .trim()
        .parse()
        .map_err(|e| format!("bad balance: {e}"))?;
    if balance < Decimal::ZERO {
        return Err("opening balance must not be negative".to_string());
    }
    Ok((id, balance))
}

fn build_stores(cli: &Cli) -> Result<(AccountStoreArc, LedgerStoreArc)> {
    #[cfg(feature = "storage-rocksdb")]
    if let Some(db_path) = &cli.db_path {
        let store = minibank::infrastructure::rocksdb::RocksDbStore::open(db_path)
            .map_err(|e| miette!("failed to open database: {e}"))?;
        return Ok((Arc::new(store.clone()), Arc::new(store)));
    }

    #[cfg(not(feature = "storage-rocksdb"))]
    let _ = cli;

    Ok((
        Arc::new(InMemoryAccountStore::new()),
        Arc::new(InMemoryLedgerStore::new()),
    ))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let (accounts, ledger) = build_stores(&cli)?;

    for (id, balance) in cli.seeds.iter().copied() {
        match accounts.open_account(id, Balance::new(balance)).await {
            Ok(()) => tracing::info!(account_id = id, %balance, "seeded account"),
            // Re-seeding an existing account (e.g. a persistent db) is fine.
            Err(minibank::error::LedgerError::AccountExists(_)) => {
                tracing::debug!(account_id = id, "account already exists, seed skipped")
            }
            Err(e) => return Err(miette!("failed to seed account {id}: {e}")),
        }
    }

    let engine = Arc::new(TransferEngine::new(accounts, ledger.clone()));
    let queries = Arc::new(QueryService::new(ledger));
    let app = build_app(AppState { engine, queries });

    let listener = tokio::net::TcpListener::bind(&cli.bind)
        .await
        .into_diagnostic()?;
    tracing::info!("listening on {}", listener.local_addr().into_diagnostic()?);

    axum::serve(listener, app).await.into_diagnostic()?;

    Ok(())
}
