//! Simple REST API server example for the points ledger engine.
//!
//! Run with: `cargo run --example server`
//!
//! ## Endpoints
//!
//! - `POST /transactions` - Submit a transaction (purchase, redemption, transfer, adjustment, event)
//! - `PATCH /transactions/{id}` - Process a pending redemption
//! - `GET /accounts` - List all account balances
//! - `GET /accounts/{id}` - Get one account's balance summary
//! - `GET /accounts/{id}/transactions` - Get one account's history
//!
//! Authentication is an external concern; requests carry an
//! already-resolved principal (`acting` field).
//!
//! ## Example Usage
//!
//! ```bash
//! # Purchase rung up by cashier 100 for member 1
//! curl -X POST http://localhost:3000/transactions \
//!   -H "Content-Type: application/json" \
//!   -d '{"type": "purchase", "account": 1, "spend": "100.00", "promotion_ids": [], "remark": "", "acting": {"account": 100, "role": "cashier"}}'
//!
//! # Member 1 requests a 50-point redemption
//! curl -X POST http://localhost:3000/transactions \
//!   -H "Content-Type: application/json" \
//!   -d '{"type": "redemption", "account": 1, "amount": 50, "remark": "", "acting": {"account": 1, "role": "member"}}'
//!
//! # Cashier 100 processes redemption transaction 2
//! curl -X PATCH http://localhost:3000/transactions/2 \
//!   -H "Content-Type: application/json" \
//!   -d '{"processed": true, "acting": {"account": 100, "role": "cashier"}}'
//!
//! # Balances
//! curl http://localhost:3000/accounts/1
//! ```

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
};
use points_ledger::{
    AccountId, BalanceSummary, CommittedTransaction, Engine, Principal, Role, TransactionError,
    TransactionId, TransactionRequest,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;

// === Request/Response DTOs ===

/// Request body for submitting transactions: the typed transaction plus
/// the acting principal resolved by the (external) auth layer.
///
/// ```json
/// {"type": "purchase", "account": 1, "spend": "100.00", "promotion_ids": [],
///  "remark": "", "acting": {"account": 100, "role": "cashier"}}
/// ```
#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    #[serde(flatten)]
    pub transaction: TransactionRequest,
    pub acting: ActingPrincipal,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ActingPrincipal {
    pub account: u32,
    pub role: Role,
}

impl ActingPrincipal {
    fn into_principal(self) -> Principal {
        Principal::new(AccountId(self.account), self.role)
    }
}

/// Request body for processing a redemption.
#[derive(Debug, Deserialize)]
pub struct ProcessRequest {
    pub processed: bool,
    pub acting: ActingPrincipal,
}

/// Response body for errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

// === Application State ===

/// Shared application state containing the ledger engine.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
}

// === Error Handling ===

/// Wrapper for converting `TransactionError` into HTTP responses.
pub struct AppError(TransactionError);

impl From<TransactionError> for AppError {
    fn from(err: TransactionError) -> Self {
        AppError(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self.0 {
            TransactionError::Unauthorized => (StatusCode::FORBIDDEN, "UNAUTHORIZED"),
            TransactionError::InvalidAmount => (StatusCode::BAD_REQUEST, "INVALID_AMOUNT"),
            TransactionError::InsufficientBalance => {
                (StatusCode::UNPROCESSABLE_ENTITY, "INSUFFICIENT_BALANCE")
            }
            TransactionError::UnknownAccount => (StatusCode::NOT_FOUND, "ACCOUNT_NOT_FOUND"),
            TransactionError::DuplicateAccount => (StatusCode::CONFLICT, "DUPLICATE_ACCOUNT"),
            TransactionError::UnknownCounterpart => {
                (StatusCode::NOT_FOUND, "COUNTERPART_NOT_FOUND")
            }
            TransactionError::SelfTransfer => (StatusCode::BAD_REQUEST, "SELF_TRANSFER"),
            TransactionError::UnknownTransaction => {
                (StatusCode::NOT_FOUND, "TRANSACTION_NOT_FOUND")
            }
            TransactionError::NotARedemption => (StatusCode::BAD_REQUEST, "NOT_A_REDEMPTION"),
            TransactionError::AlreadyProcessed => (StatusCode::CONFLICT, "ALREADY_PROCESSED"),
            TransactionError::UnknownPromotion(_) => {
                (StatusCode::NOT_FOUND, "PROMOTION_NOT_FOUND")
            }
            TransactionError::PromotionIneligible(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "PROMOTION_INELIGIBLE")
            }
            TransactionError::DuplicateOneTimePromotionUse(_) => {
                (StatusCode::CONFLICT, "DUPLICATE_PROMOTION_USE")
            }
            TransactionError::UnknownEvent => (StatusCode::NOT_FOUND, "EVENT_NOT_FOUND"),
            TransactionError::NotAGuest => (StatusCode::UNPROCESSABLE_ENTITY, "NOT_A_GUEST"),
        };

        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
                code: code.to_string(),
            }),
        )
            .into_response()
    }
}

// === Handlers ===

/// POST /transactions - Submit a new transaction.
async fn create_transaction(
    State(state): State<AppState>,
    Json(request): Json<SubmitRequest>,
) -> Result<(StatusCode, Json<CommittedTransaction>), AppError> {
    let principal = request.acting.into_principal();
    let committed = state.engine.submit(request.transaction, principal)?;
    Ok((StatusCode::CREATED, Json(committed)))
}

/// PATCH /transactions/{id} - Process a pending redemption.
async fn process_transaction(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(request): Json<ProcessRequest>,
) -> Result<Json<CommittedTransaction>, AppError> {
    if !request.processed {
        return Err(AppError(TransactionError::InvalidAmount));
    }
    let principal = request.acting.into_principal();
    let processed = state
        .engine
        .process_redemption(TransactionId(id), principal)?;
    Ok(Json(processed))
}

/// GET /accounts/{id} - One account's balance summary.
async fn get_account(
    State(state): State<AppState>,
    Path(id): Path<u32>,
) -> Result<Json<BalanceSummary>, AppError> {
    let summary = state.engine.balance(AccountId(id))?;
    Ok(Json(summary))
}

/// GET /accounts/{id}/transactions - One account's history in commit order.
async fn get_history(
    State(state): State<AppState>,
    Path(id): Path<u32>,
) -> Result<Json<Vec<CommittedTransaction>>, AppError> {
    let history = state.engine.history(AccountId(id))?;
    Ok(Json(history))
}

/// GET /accounts - All account balances.
async fn list_accounts(State(state): State<AppState>) -> Json<Vec<BalanceSummary>> {
    Json(state.engine.balances())
}

// === Router ===

fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/transactions", post(create_transaction))
        .route("/transactions/{id}", patch(process_transaction))
        .route("/accounts", get(list_accounts))
        .route("/accounts/{id}", get(get_account))
        .route("/accounts/{id}/transactions", get(get_history))
        .with_state(state)
}

// === Main ===

#[tokio::main]
async fn main() {
    let engine = Engine::new();

    // Seed a few accounts so the curl examples work out of the box.
    engine.register(AccountId(1), Role::Member).unwrap();
    engine.register(AccountId(2), Role::Member).unwrap();
    engine.register(AccountId(100), Role::Cashier).unwrap();
    engine.register(AccountId(200), Role::Manager).unwrap();

    let state = AppState {
        engine: Arc::new(engine),
    };

    let app = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:3000").await.unwrap();
    println!("Points ledger API server running on http://127.0.0.1:3000");
    println!();
    println!("Endpoints:");
    println!("  POST  /transactions                - Submit a transaction");
    println!("  PATCH /transactions/:id            - Process a redemption");
    println!("  GET   /accounts                    - List all balances");
    println!("  GET   /accounts/:id                - Balance summary");
    println!("  GET   /accounts/:id/transactions   - Transaction history");

    axum::serve(listener, app).await.unwrap();
}
