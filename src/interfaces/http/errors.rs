//! Maps engine errors onto HTTP responses.
//!
//! Clean rejections carry a specific reason the caller can act on. The
//! partial-failure case (`LedgerWriteFailure`) must never look retryable:
//! the debit may already be durable, so the message points at support
//! instead of suggesting a resubmission.

use crate::error::LedgerError;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

pub fn error_response(err: &LedgerError) -> axum::response::Response {
    match err {
        LedgerError::InvalidAmount => {
            json_error(StatusCode::BAD_REQUEST, "invalid_amount", err.to_string())
        }
        LedgerError::AccountNotFound(_) => {
            json_error(StatusCode::NOT_FOUND, "account_not_found", err.to_string())
        }
        LedgerError::AccountExists(_) => {
            json_error(StatusCode::CONFLICT, "account_exists", err.to_string())
        }
        LedgerError::InsufficientFunds { .. } => json_error(
            StatusCode::BAD_REQUEST,
            "insufficient_funds",
            "Insufficient balance for the transaction.",
        ),
        LedgerError::LockTimeout => json_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "lock_timeout",
            "The account is busy; the operation was not applied. Safe to retry.",
        ),
        LedgerError::LedgerWriteFailure { account_id, .. } => json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "ledger_write_failure",
            format!(
                "The operation on account {account_id} may have taken effect but could not be \
                 recorded. Do not retry; contact support."
            ),
        ),
        LedgerError::Storage(_) => json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "storage_error",
            "Internal storage error.",
        ),
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
