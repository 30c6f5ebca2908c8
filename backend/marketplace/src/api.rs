//! Axum REST API handlers.

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::catalog;
use crate::errors::MarketError;
use crate::listing::{sample_transactions, TransactionRecord};
use crate::node::{AptosNodeClient, NodeStatus, VerificationStatus};
use crate::payload::MarketFunction;
use crate::submitter::{Submitter, TradeRequest};
use crate::wallet::{WalletContext, WalletSession};

pub struct ApiState {
    pub contract_address: String,
    pub projects_file: PathBuf,
    pub projects_fallback_file: PathBuf,
    pub wallet: WalletContext,
    pub submitter: Submitter,
    pub node: Option<Arc<AptosNodeClient>>,
}

pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/projects", get(get_projects))
        .route("/api/projects/:id/verification", get(get_verification))
        .route("/api/transactions", get(get_transactions))
        .route("/api/wallet", get(get_wallet))
        .route("/api/wallet/connect", post(connect_wallet))
        .route("/api/wallet/disconnect", post(disconnect_wallet))
        .route("/api/purchase", post(purchase))
        .route("/api/retire", post(retire))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ─────────────────────────────────────────────────────────
// Request / response shapes
// ─────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node: Option<NodeStatus>,
}

#[derive(Serialize)]
pub struct TransactionsResponse {
    pub count: usize,
    pub transactions: Vec<TransactionRecord>,
}

#[derive(Serialize)]
pub struct VerificationResponse {
    pub project_id: String,
    pub status: VerificationStatus,
    pub status_code: u8,
}

#[derive(Serialize)]
pub struct WalletResponse {
    #[serde(flatten)]
    pub session: WalletSession,
    pub available: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ConnectRequest {
    #[serde(default)]
    pub wallet: Option<String>,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(err: MarketError) -> Response {
    let status = match &err {
        MarketError::WalletNotConnected => StatusCode::CONFLICT,
        MarketError::UnknownWallet(_)
        | MarketError::InvalidCategory(_)
        | MarketError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        MarketError::NoTransactionMethod => StatusCode::SERVICE_UNAVAILABLE,
        MarketError::SubmissionFailed(_)
        | MarketError::MissingHash
        | MarketError::Signer(_)
        | MarketError::View(_)
        | MarketError::Http(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        error!("Request failed: {err}");
    }
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
        .into_response()
}

// ─────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────

/// `GET /health`
pub async fn health(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    let node = match &state.node {
        Some(node) => match node.ledger_info().await {
            Ok(status) => Some(status),
            Err(e) => {
                warn!("Fullnode unreachable: {e}");
                None
            }
        },
        None => None,
    };
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        node,
    })
}

/// `GET /api/projects`
///
/// Returns the listing document as stored on disk; never fails.
pub async fn get_projects(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    let loaded =
        catalog::load_listing_document(&state.projects_file, &state.projects_fallback_file).await;
    Json(loaded.document)
}

/// `GET /api/projects/:id/verification`
pub async fn get_verification(
    State(state): State<Arc<ApiState>>,
    Path(project_id): Path<String>,
) -> Response {
    let Some(node) = &state.node else {
        return error_response(MarketError::View("no fullnode configured".to_string()));
    };
    match node
        .view_verification_status(&state.contract_address, &project_id)
        .await
    {
        Ok(status) => Json(VerificationResponse {
            project_id,
            status_code: status.code(),
            status,
        })
        .into_response(),
        Err(e) => {
            warn!("Error checking status for project {project_id}: {e}");
            error_response(e)
        }
    }
}

/// `GET /api/transactions`
pub async fn get_transactions() -> impl IntoResponse {
    let transactions = sample_transactions();
    Json(TransactionsResponse {
        count: transactions.len(),
        transactions,
    })
}

/// `GET /api/wallet`
pub async fn get_wallet(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    Json(WalletResponse {
        session: state.wallet.session().await,
        available: state.wallet.available(),
    })
}

/// `POST /api/wallet/connect`
pub async fn connect_wallet(
    State(state): State<Arc<ApiState>>,
    Json(req): Json<ConnectRequest>,
) -> Response {
    match state.wallet.connect(req.wallet.as_deref()).await {
        Ok(session) => Json(WalletResponse {
            session,
            available: state.wallet.available(),
        })
        .into_response(),
        Err(e) => {
            warn!("Failed to connect wallet: {e}");
            error_response(e)
        }
    }
}

/// `POST /api/wallet/disconnect`
pub async fn disconnect_wallet(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    state.wallet.disconnect().await;
    StatusCode::NO_CONTENT
}

/// `POST /api/purchase`
pub async fn purchase(
    State(state): State<Arc<ApiState>>,
    req: std::result::Result<Json<TradeRequest>, JsonRejection>,
) -> Response {
    trade(&state, MarketFunction::PurchaseCredits, req).await
}

/// `POST /api/retire`
pub async fn retire(
    State(state): State<Arc<ApiState>>,
    req: std::result::Result<Json<TradeRequest>, JsonRejection>,
) -> Response {
    trade(&state, MarketFunction::RetireCredits, req).await
}

async fn trade(
    state: &ApiState,
    function: MarketFunction,
    req: std::result::Result<Json<TradeRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match req {
        Ok(req) => req,
        Err(rejection) => {
            warn!("Rejected {function} request: {}", rejection.body_text());
            return error_response(MarketError::InvalidRequest(rejection.body_text()));
        }
    };
    let session = state.wallet.session().await;
    match state.submitter.submit(&session, function, &req).await {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(e) => error_response(e),
    }
}

// ─────────────────────────────────────────────────────────
// Unit tests
// ─────────────────────────────────────────────────────────
