//! # REST + WebSocket API
//!
//! Builds the axum router that exposes the escrow node's HTTP interface.
//! All endpoints share application state through axum's `State` extractor.
//!
//! ## Endpoints
//!
//! | Method | Path                   | Description                          |
//! |--------|------------------------|--------------------------------------|
//! | GET    | `/health`              | Liveness probe                       |
//! | GET    | `/status`              | Deployment and ledger summary        |
//! | POST   | `/rpc`                 | JSON-RPC 2.0 gateway                 |
//! | GET    | `/ws`                  | WebSocket for live escrow events     |
//! | GET    | `/events`              | Retained event log (`?since=N`)      |
//! | GET    | `/properties/:id`      | Token, listing and sale progress     |
//! | GET    | `/accounts/:address`   | Wallet balance and owned properties  |
//!
//! ## Transactions
//!
//! Mutating RPC methods name their caller in the `from` parameter. The node
//! is a devnet: it does not authenticate callers, it just hands `from` to
//! the ledger, which decides whether that address may perform the call.
//! A successful call returns a [`TransactionReceipt`] carrying the events
//! it emitted; a rejected call returns a JSON-RPC error whose code
//! identifies the [`EscrowError`] variant.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, Query, State,
    },
    http::{Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use estate_contracts::{
    Address, EscrowError, EscrowEvent, EscrowPolicy, InMemoryLedger, Listing, OwnershipRegistry,
    Precondition, PropertyId, SaleStage, SaleStatus,
};

use crate::metrics::SharedMetrics;

// ---------------------------------------------------------------------------
// Error Codes
// ---------------------------------------------------------------------------

/// Malformed envelope.
pub const INVALID_REQUEST: i32 = -32600;
/// Unknown method.
pub const METHOD_NOT_FOUND: i32 = -32601;
/// Missing or mistyped parameters.
pub const INVALID_PARAMS: i32 = -32602;
/// Serialization failure inside the node.
pub const INTERNAL_ERROR: i32 = -32603;
/// Caller lacks the role the transition requires.
pub const ERR_UNAUTHORIZED: i32 = -32010;
/// A finalization precondition is unmet. `data.reason` names it.
pub const ERR_PRECONDITION: i32 = -32011;
/// The property's lifecycle status forbids the call.
pub const ERR_INVALID_STATE: i32 = -32012;
/// A payout or value pull failed; the ledger was rolled back.
pub const ERR_TRANSFER_FAILED: i32 = -32013;
/// The ownership registry refused a token operation.
pub const ERR_REGISTRY: i32 = -32014;
/// Listing or deposit arguments were rejected.
pub const ERR_INVALID_ARGUMENT: i32 = -32015;
/// Escrow balance arithmetic would overflow.
pub const ERR_OVERFLOW: i32 = -32016;

// ---------------------------------------------------------------------------
// Application State
// ---------------------------------------------------------------------------

/// Shared application state available to all request handlers.
///
/// Cheap to clone, everything behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// The node's reported version string.
    pub version: String,
    /// The escrow ledger. Transitions run under this lock one at a time.
    pub ledger: Arc<Mutex<InMemoryLedger>>,
    /// Broadcast channel for live escrow events.
    pub event_tx: broadcast::Sender<EscrowEvent>,
    /// Reference to Prometheus metrics for in-handler recording.
    pub metrics: SharedMetrics,
}

// ---------------------------------------------------------------------------
// Router Construction
// ---------------------------------------------------------------------------

/// Builds the full axum [`Router`] with all API routes, CORS, and tracing.
///
/// The returned router is ready to be served on the configured RPC port.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/status", get(status_handler))
        .route("/rpc", post(rpc_handler))
        .route("/ws", get(ws_handler))
        .route("/events", get(events_handler))
        .route("/properties/:id", get(property_handler))
        .route("/accounts/:address", get(account_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// JSON-RPC Types
// ---------------------------------------------------------------------------

/// A JSON-RPC 2.0 request envelope.
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    /// Protocol version. Must be "2.0".
    pub jsonrpc: String,
    /// The method to invoke.
    pub method: String,
    /// Named method parameters.
    pub params: Option<Value>,
    /// Request identifier. Echoed back in the response.
    pub id: Value,
}

/// A JSON-RPC 2.0 response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// Protocol version. Always "2.0".
    pub jsonrpc: String,
    /// The result on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// The error on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    /// Request identifier, echoed from the request.
    pub id: Value,
}

impl JsonRpcResponse {
    fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            result: Some(result),
            error: None,
            id,
        }
    }

    fn failure(id: Value, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            result: None,
            error: Some(error),
            id,
        }
    }
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// Numeric error code.
    pub code: i32,
    /// Short human-readable error description.
    pub message: String,
    /// Optional structured error data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }
}

impl From<&EscrowError> for JsonRpcError {
    fn from(err: &EscrowError) -> Self {
        let (code, data) = match err {
            EscrowError::Unauthorized { action, caller } => (
                ERR_UNAUTHORIZED,
                Some(serde_json::json!({ "action": action, "caller": caller })),
            ),
            EscrowError::PreconditionNotMet(p) => {
                (ERR_PRECONDITION, serde_json::to_value(p).ok())
            }
            EscrowError::InvalidPropertyState { property, status } => (
                ERR_INVALID_STATE,
                Some(serde_json::json!({ "property": property, "status": status })),
            ),
            EscrowError::TransferFailed(_) => (ERR_TRANSFER_FAILED, None),
            EscrowError::Registry(_) => (ERR_REGISTRY, None),
            EscrowError::ZeroBuyer
            | EscrowError::EarnestMismatch { .. }
            | EscrowError::EscrowExceedsPrice { .. } => (ERR_INVALID_ARGUMENT, None),
            EscrowError::AmountOverflow => (ERR_OVERFLOW, None),
        };
        Self {
            code,
            message: err.to_string(),
            data,
        }
    }
}

/// Result of an accepted transaction.
#[derive(Debug, Serialize, Deserialize)]
pub struct TransactionReceipt {
    /// Identifier assigned by the node.
    pub tx_id: String,
    /// Always "confirmed": rejected calls return an error instead.
    pub status: String,
    /// Method-specific return value (the new id for `registry_mint`).
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub output: Value,
    /// Escrow events emitted by the call, in order.
    pub events: Vec<EscrowEvent>,
}

// ---------------------------------------------------------------------------
// RPC Parameters
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListParams {
    from: Address,
    property: PropertyId,
    purchase_price: u64,
    escrow_amount: u64,
    buyer: Address,
}

#[derive(Debug, Deserialize)]
struct PaymentParams {
    from: Address,
    property: PropertyId,
    value: u64,
}

#[derive(Debug, Deserialize)]
struct ReceiveParams {
    from: Address,
    value: u64,
}

#[derive(Debug, Deserialize)]
struct CallParams {
    from: Address,
    property: PropertyId,
}

#[derive(Debug, Deserialize)]
struct InspectionParams {
    from: Address,
    property: PropertyId,
    passed: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MintParams {
    from: Address,
    token_uri: String,
}

#[derive(Debug, Deserialize)]
struct RegistryApproveParams {
    from: Address,
    operator: Address,
    property: PropertyId,
}

#[derive(Debug, Deserialize)]
struct FundParams {
    address: Address,
    amount: u64,
}

#[derive(Debug, Deserialize)]
struct PropertyParams {
    property: PropertyId,
}

#[derive(Debug, Deserialize)]
struct ApprovalParams {
    property: PropertyId,
    address: Address,
}

#[derive(Debug, Deserialize)]
struct AddressParams {
    address: Address,
}

fn parse_params<T: DeserializeOwned>(params: Option<Value>) -> Result<T, JsonRpcError> {
    serde_json::from_value(params.unwrap_or(Value::Null))
        .map_err(|e| JsonRpcError::new(INVALID_PARAMS, format!("Invalid params: {}", e)))
}

// ---------------------------------------------------------------------------
// Response Types
// ---------------------------------------------------------------------------

/// Response payload for `GET /status`.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Node software version.
    pub version: String,
    /// Custody address of the escrow ledger.
    pub escrow_address: Address,
    /// Address of the property registry.
    pub registry_address: Address,
    pub seller: Address,
    pub inspector: Address,
    pub lender: Address,
    /// Active policy switches.
    pub policy: EscrowPolicy,
    /// Aggregate value held in escrow.
    pub escrow_balance: u64,
    /// Properties ever listed.
    pub listings: usize,
    /// Properties currently awaiting settlement.
    pub active_listings: usize,
    /// Property tokens minted.
    pub total_supply: u64,
    /// Events recorded since startup.
    pub event_count: u64,
    /// ISO-8601 timestamp of the response.
    pub timestamp: String,
}

/// Response payload for `GET /properties/:id`.
#[derive(Debug, Serialize, Deserialize)]
pub struct PropertyResponse {
    pub property: PropertyId,
    /// Current token owner, if minted.
    pub owner: Option<Address>,
    pub token_uri: Option<String>,
    pub status: SaleStatus,
    pub stage: SaleStage,
    pub listing: Option<Listing>,
    pub inspection_passed: bool,
    pub buyer_approved: bool,
    pub seller_approved: bool,
    pub lender_approved: bool,
    /// First condition still blocking finalization.
    pub unmet_precondition: Option<Precondition>,
}

/// Response payload for `GET /accounts/:address`.
#[derive(Debug, Serialize, Deserialize)]
pub struct AccountResponse {
    pub address: Address,
    /// Wallet balance.
    pub balance: u64,
    /// Property tokens owned.
    pub properties: Vec<PropertyId>,
}

/// Query string of `GET /events`.
#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    /// Only return events with at least this sequence number.
    pub since: Option<u64>,
}

/// Generic error body returned by REST endpoints on failure.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /health` — returns 200 if the node is alive.
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

/// `GET /status` — returns the deployment and ledger summary.
async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let ledger = state.ledger.lock();
    let resp = StatusResponse {
        version: state.version.clone(),
        escrow_address: ledger.escrow_address(),
        registry_address: ledger.registry_address(),
        seller: ledger.seller(),
        inspector: ledger.inspector(),
        lender: ledger.lender(),
        policy: ledger.policy(),
        escrow_balance: ledger.balance(),
        listings: ledger.listings().count(),
        active_listings: ledger
            .listings()
            .filter(|l| l.status == SaleStatus::Listed)
            .count(),
        total_supply: ledger.registry().total_supply(),
        event_count: ledger.next_sequence(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    };
    Json(resp)
}

/// `POST /rpc` — JSON-RPC 2.0 gateway.
///
/// Routes method calls to the ledger. Unknown methods return error code
/// -32601 (Method not found).
async fn rpc_handler(
    State(state): State<AppState>,
    Json(req): Json<JsonRpcRequest>,
) -> impl IntoResponse {
    if req.jsonrpc != "2.0" {
        return Json(JsonRpcResponse::failure(
            req.id,
            JsonRpcError::new(INVALID_REQUEST, "Invalid Request: jsonrpc must be \"2.0\""),
        ));
    }

    let timer = state.metrics.rpc_latency_seconds.start_timer();
    let outcome = dispatch(&state, &req.method, req.params);
    timer.observe_duration();

    match outcome {
        Ok(result) => Json(JsonRpcResponse::success(req.id, result)),
        Err(error) => Json(JsonRpcResponse::failure(req.id, error)),
    }
}

/// Executes one RPC method.
fn dispatch(state: &AppState, method: &str, params: Option<Value>) -> Result<Value, JsonRpcError> {
    match method {
        // -- Transactions ----------------------------------------------------
        "escrow_list" => {
            let p: ListParams = parse_params(params)?;
            transact(state, |l| {
                l.list(p.from, p.property, p.purchase_price, p.escrow_amount, p.buyer)
                    .map(|()| Value::Null)
            })
        }
        "escrow_depositEarnest" => {
            let p: PaymentParams = parse_params(params)?;
            transact(state, |l| {
                l.deposit_earnest(p.from, p.property, p.value)
                    .map(|()| Value::Null)
            })
        }
        "escrow_receive" => {
            let p: ReceiveParams = parse_params(params)?;
            transact(state, |l| l.receive(p.from, p.value).map(|()| Value::Null))
        }
        "escrow_approveSale" => {
            let p: CallParams = parse_params(params)?;
            transact(state, |l| l.approve_sale(p.from, p.property).map(|()| Value::Null))
        }
        "escrow_updateInspectionStatus" => {
            let p: InspectionParams = parse_params(params)?;
            transact(state, |l| {
                l.update_inspection_status(p.from, p.property, p.passed)
                    .map(|()| Value::Null)
            })
        }
        "escrow_finalizeSale" => {
            let p: CallParams = parse_params(params)?;
            transact(state, |l| l.finalize_sale(p.from, p.property).map(|()| Value::Null))
        }
        "escrow_cancelSale" => {
            let p: CallParams = parse_params(params)?;
            transact(state, |l| l.cancel_sale(p.from, p.property).map(|()| Value::Null))
        }
        "registry_mint" => {
            let p: MintParams = parse_params(params)?;
            transact(state, |l| {
                let id = l.registry_mut().mint(p.from, &p.token_uri)?;
                tracing::info!(property = id, owner = %p.from, "property minted");
                Ok(serde_json::json!(id))
            })
        }
        "registry_approve" => {
            let p: RegistryApproveParams = parse_params(params)?;
            transact(state, |l| {
                l.registry_mut()
                    .approve(p.from, p.operator, p.property)
                    .map_err(EscrowError::from)
                    .map(|()| Value::Null)
            })
        }
        "dev_fund" => {
            let p: FundParams = parse_params(params)?;
            transact(state, |l| {
                l.transfers_mut()
                    .credit(p.address, p.amount)
                    .map_err(EscrowError::from)?;
                Ok(serde_json::json!(l.transfers().balance_of(&p.address)))
            })
        }

        // -- Escrow queries --------------------------------------------------
        "escrow_isListed" => {
            let p: PropertyParams = parse_params(params)?;
            query(state, |l| l.is_listed(p.property))
        }
        "escrow_purchasePrice" => {
            let p: PropertyParams = parse_params(params)?;
            query(state, |l| l.purchase_price(p.property))
        }
        "escrow_escrowAmount" => {
            let p: PropertyParams = parse_params(params)?;
            query(state, |l| l.escrow_amount(p.property))
        }
        "escrow_buyerOf" => {
            let p: PropertyParams = parse_params(params)?;
            query(state, |l| l.buyer_of(p.property))
        }
        "escrow_approvalOf" => {
            let p: ApprovalParams = parse_params(params)?;
            query(state, |l| l.approval_of(p.property, &p.address))
        }
        "escrow_inspectionPassed" => {
            let p: PropertyParams = parse_params(params)?;
            query(state, |l| l.inspection_passed(p.property))
        }
        "escrow_status" => {
            let p: PropertyParams = parse_params(params)?;
            query(state, |l| l.status(p.property))
        }
        "escrow_listing" => {
            let p: PropertyParams = parse_params(params)?;
            query(state, |l| l.listing(p.property).cloned())
        }
        "escrow_balance" => query(state, |l| l.balance()),
        "escrow_seller" => query(state, |l| l.seller()),
        "escrow_inspector" => query(state, |l| l.inspector()),
        "escrow_lender" => query(state, |l| l.lender()),
        "escrow_registry" => query(state, |l| l.registry_address()),
        "escrow_address" => query(state, |l| l.escrow_address()),

        // -- Registry and wallet queries -------------------------------------
        "registry_ownerOf" => {
            let p: PropertyParams = parse_params(params)?;
            registry_query(state, |l| l.registry().owner_of(p.property))
        }
        "registry_getApproved" => {
            let p: PropertyParams = parse_params(params)?;
            registry_query(state, |l| l.registry().get_approved(p.property))
        }
        "registry_tokenURI" => {
            let p: PropertyParams = parse_params(params)?;
            registry_query(state, |l| l.registry().token_uri(p.property))
        }
        "registry_totalSupply" => query(state, |l| l.registry().total_supply()),
        "account_balance" => {
            let p: AddressParams = parse_params(params)?;
            query(state, |l| l.transfers().balance_of(&p.address))
        }

        _ => Err(JsonRpcError::new(
            METHOD_NOT_FOUND,
            format!("Method not found: {}", method),
        )),
    }
}

/// Runs a mutating call under the ledger lock, then publishes the events it
/// emitted.
fn transact<F>(state: &AppState, call: F) -> Result<Value, JsonRpcError>
where
    F: FnOnce(&mut InMemoryLedger) -> Result<Value, EscrowError>,
{
    let mut ledger = state.ledger.lock();
    let first = ledger.next_sequence();

    let output = match call(&mut *ledger) {
        Ok(output) => output,
        Err(e) => {
            drop(ledger);
            state.metrics.rejected_calls_total.inc();
            return Err(JsonRpcError::from(&e));
        }
    };

    let events = ledger.events_since(first).to_vec();
    state.metrics.observe_ledger(&ledger);
    drop(ledger);

    for event in &events {
        state.metrics.record_event(&event.kind);
        // No subscribers is fine.
        let _ = state.event_tx.send(event.clone());
    }

    let receipt = TransactionReceipt {
        tx_id: uuid::Uuid::new_v4().to_string(),
        status: "confirmed".into(),
        output,
        events,
    };
    serde_json::to_value(receipt)
        .map_err(|e| JsonRpcError::new(INTERNAL_ERROR, format!("Internal error: {}", e)))
}

/// Reads from the ledger under its lock.
fn query<T, F>(state: &AppState, read: F) -> Result<Value, JsonRpcError>
where
    T: Serialize,
    F: FnOnce(&InMemoryLedger) -> T,
{
    let ledger = state.ledger.lock();
    let value = read(&*ledger);
    serde_json::to_value(value)
        .map_err(|e| JsonRpcError::new(INTERNAL_ERROR, format!("Internal error: {}", e)))
}

/// Reads from the registry, mapping its errors onto [`ERR_REGISTRY`].
fn registry_query<T, F>(state: &AppState, read: F) -> Result<Value, JsonRpcError>
where
    T: Serialize,
    F: FnOnce(&InMemoryLedger) -> Result<T, estate_contracts::RegistryError>,
{
    let ledger = state.ledger.lock();
    let value = read(&*ledger).map_err(|e| JsonRpcError::from(&EscrowError::from(e)))?;
    serde_json::to_value(value)
        .map_err(|e| JsonRpcError::new(INTERNAL_ERROR, format!("Internal error: {}", e)))
}

/// `GET /ws` — WebSocket upgrade for live event streaming.
///
/// Clients receive each [`EscrowEvent`] as a JSON text frame. The connection
/// is read-only from the server's perspective; client messages are ignored.
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws_connection(socket, state))
}

/// Drives a single WebSocket connection, forwarding broadcast events
/// until the client disconnects or the channel is closed.
async fn handle_ws_connection(mut socket: WebSocket, state: AppState) {
    let mut rx = state.event_tx.subscribe();

    loop {
        tokio::select! {
            event = rx.recv() => {
                match event {
                    Ok(ev) => {
                        let payload = match serde_json::to_string(&ev) {
                            Ok(s) => s,
                            Err(e) => {
                                tracing::warn!("failed to serialize ws event: {}", e);
                                continue;
                            }
                        };
                        if socket.send(Message::Text(payload)).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!("ws subscriber lagged by {} events", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        break;
                    }
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(_)) => {}
                    _ => break,
                }
            }
        }
    }
}

/// `GET /events` — the retained event log, optionally from `?since=N`.
async fn events_handler(
    Query(query): Query<EventsQuery>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let ledger = state.ledger.lock();
    let events = ledger.events_since(query.since.unwrap_or(0)).to_vec();
    Json(events)
}

/// `GET /properties/:id` — token, listing and sale progress of a property.
///
/// Returns 404 for ids that were never minted nor listed.
async fn property_handler(
    Path(id): Path<PropertyId>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let ledger = state.ledger.lock();
    let owner = ledger.registry().owner_of(id).ok();
    let listing = ledger.listing(id).cloned();

    if owner.is_none() && listing.is_none() {
        let err = ErrorResponse {
            error: format!("Property {} not found", id),
        };
        return (StatusCode::NOT_FOUND, Json(serde_json::json!(err))).into_response();
    }

    let resp = PropertyResponse {
        property: id,
        owner,
        token_uri: ledger.registry().token_uri(id).ok(),
        status: ledger.status(id),
        stage: ledger.stage(id),
        inspection_passed: ledger.inspection_passed(id),
        buyer_approved: ledger.approval_of(id, &ledger.buyer_of(id)),
        seller_approved: ledger.approval_of(id, &ledger.seller()),
        lender_approved: ledger.approval_of(id, &ledger.lender()),
        unmet_precondition: listing.as_ref().and_then(|_| ledger.unmet_precondition(id)),
        listing,
    };
    (StatusCode::OK, Json(serde_json::json!(resp))).into_response()
}

/// `GET /accounts/:address` — wallet balance and owned property tokens.
///
/// Addresses that never received value report a zero balance.
async fn account_handler(
    Path(address): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let address: Address = match address.parse() {
        Ok(a) => a,
        Err(e) => {
            let err = ErrorResponse {
                error: format!("Invalid address: {}", e),
            };
            return (StatusCode::BAD_REQUEST, Json(serde_json::json!(err))).into_response();
        }
    };

    let ledger = state.ledger.lock();
    let resp = AccountResponse {
        address,
        balance: ledger.transfers().balance_of(&address),
        properties: ledger.registry().tokens_of(&address),
    };
    (StatusCode::OK, Json(serde_json::json!(resp))).into_response()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
