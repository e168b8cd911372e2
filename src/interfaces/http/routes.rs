use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use crate::application::engine::{DepositRequest, TransferRequest};
use crate::domain::account::{AccountId, Amount};
use crate::interfaces::http::{AppState, dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/transfer", post(transfer))
        .route("/deposit", post(deposit))
        .route("/ledger/:account_id", get(ledger_history))
        .route("/analytics/summary/:account_id", get(analytics_summary))
        .route("/analytics/monthly/:account_id", get(analytics_monthly))
}

pub async fn health() -> axum::response::Response {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" }))).into_response()
}

pub async fn transfer(
    Extension(state): Extension<Arc<AppState>>,
    Json(body): Json<dto::TransferBody>,
) -> axum::response::Response {
    let amount = match Amount::new(body.amount) {
        Ok(a) => a,
        Err(e) => return errors::error_response(&e),
    };

    let result = state
        .engine
        .transfer(TransferRequest {
            account_id: body.account_id,
            amount,
            counterparty: body.counterparty,
            remarks: body.remarks,
            idempotency_key: body.idempotency_key,
        })
        .await;

    match result {
        Ok(entry) => (
            StatusCode::OK,
            Json(dto::MutationResponse {
                new_balance: entry.balance_after,
                entry,
            }),
        )
            .into_response(),
        Err(e) => errors::error_response(&e),
    }
}

pub async fn deposit(
    Extension(state): Extension<Arc<AppState>>,
    Json(body): Json<dto::DepositBody>,
) -> axum::response::Response {
    let amount = match Amount::new(body.amount) {
        Ok(a) => a,
        Err(e) => return errors::error_response(&e),
    };

    let result = state
        .engine
        .deposit(DepositRequest {
            account_id: body.account_id,
            amount,
            description: body.description,
            idempotency_key: body.idempotency_key,
        })
        .await;

    match result {
        Ok(entry) => (
            StatusCode::OK,
            Json(dto::MutationResponse {
                new_balance: entry.balance_after,
                entry,
            }),
        )
            .into_response(),
        Err(e) => errors::error_response(&e),
    }
}

pub async fn ledger_history(
    Extension(state): Extension<Arc<AppState>>,
    Path(account_id): Path<AccountId>,
    Query(query): Query<dto::LedgerQuery>,
) -> axum::response::Response {
    match state.queries.history(account_id, &query.into()).await {
        Ok(items) => (
            StatusCode::OK,
            Json(serde_json::json!({ "items": items })),
        )
            .into_response(),
        Err(e) => errors::error_response(&e),
    }
}

pub async fn analytics_summary(
    Extension(state): Extension<Arc<AppState>>,
    Path(account_id): Path<AccountId>,
) -> axum::response::Response {
    match state.queries.summary(account_id).await {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(e) => errors::error_response(&e),
    }
}

pub async fn analytics_monthly(
    Extension(state): Extension<Arc<AppState>>,
    Path(account_id): Path<AccountId>,
) -> axum::response::Response {
    match state.queries.monthly_trends(account_id).await {
        Ok(items) => (
            StatusCode::OK,
            Json(serde_json::json!({ "items": items })),
        )
            .into_response(),
        Err(e) => errors::error_response(&e),
    }
}
