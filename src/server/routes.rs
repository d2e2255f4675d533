//! Thin adapters from admin-UI HTTP requests to dispatcher/aggregator
//! calls. Validation happens here, before any network call; everything
//! else is delegated.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::Error;
use crate::server::server::AppState;
use crate::vendor::cards::ValidityPeriod;
use crate::vendor::fanout::LockSummary;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/login", post(login))
        .route("/api/locks", get(list_locks))
        .route("/api/locks/{id}/lock", post(lock))
        .route("/api/locks/{id}/unlock", post(unlock))
        .route("/api/locks/{id}/battery", get(battery))
        .route("/api/locks/{id}/state", get(open_state))
        .route("/api/gateways", get(list_gateways))
        .route("/api/gateways/{id}", delete(delete_gateway))
        .route("/api/gateways/{id}/locks", get(gateway_locks))
        .route("/api/locks/{id}/cards", get(list_cards).post(add_card))
        .route("/api/locks/{id}/cards/clear", post(clear_cards))
        .route("/api/locks/{id}/cards/{card_id}", delete(delete_card))
        .route("/api/locks/{id}/cards/{card_id}/period", put(change_card_period))
        .route("/api/cards", get(list_all_cards))
}

/// Every failure renders as `{"error": {kind, message, errcode?}}` so
/// the UI shows one consistent shape regardless of failure origin.
struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::Validation { .. } => StatusCode::BAD_REQUEST,
            Error::Auth { .. } => StatusCode::UNAUTHORIZED,
            Error::Vendor { .. } | Error::Transport(_) | Error::Deserialization { .. } => {
                StatusCode::BAD_GATEWAY
            }
            Error::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let mut body = json!({
            "kind": self.0.kind(),
            "message": self.0.to_string(),
        });
        if let Some(code) = self.0.vendor_code() {
            body["errcode"] = Value::from(code);
        }
        (status, Json(json!({ "error": body }))).into_response()
    }
}

type ApiResult = Result<Json<Value>, ApiError>;

fn parse_id(raw: &str, field: &str) -> Result<i64, ApiError> {
    raw.parse::<i64>().map_err(|_| {
        ApiError(Error::validation(format!(
            "{} must be a numeric identifier, got '{}'",
            field, raw
        )))
    })
}

fn require<'a>(value: &'a Option<String>, field: &str) -> Result<&'a str, ApiError> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ApiError(Error::validation(format!(
            "missing required field '{}'",
            field
        )))),
    }
}

/// `end_date == 0` means permanent, per the vendor convention.
fn validate_period(start_date: Option<i64>, end_date: Option<i64>) -> Result<ValidityPeriod, ApiError> {
    let start_date = start_date
        .ok_or_else(|| ApiError(Error::validation("missing required field 'startDate'")))?;
    let end_date =
        end_date.ok_or_else(|| ApiError(Error::validation("missing required field 'endDate'")))?;
    if end_date != 0 && start_date >= end_date {
        return Err(ApiError(Error::validation(
            "startDate must be earlier than endDate",
        )));
    }
    Ok(ValidityPeriod {
        start_date,
        end_date,
    })
}

// ── Session ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct LoginRequest {
    username: Option<String>,
    password: Option<String>,
}

async fn login(State(state): State<AppState>, Json(req): Json<LoginRequest>) -> ApiResult {
    let username = require(&req.username, "username")?.to_owned();
    let password = require(&req.password, "password")?.to_owned();

    let token = state
        .dispatcher
        .manager()
        .acquire(&username, &password)
        .await?;
    Ok(Json(json!({ "uid": token.uid, "expiresAt": token.expires_at })))
}

// ── Locks ───────────────────────────────────────────────────────────

async fn list_locks(State(state): State<AppState>) -> ApiResult {
    let locks = state.dispatcher.list_locks().await?;
    Ok(Json(json!({ "list": locks })))
}

async fn lock(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let lock_id = parse_id(&id, "lockId")?;
    let body = state.dispatcher.lock(lock_id).await?;
    Ok(Json(body))
}

async fn unlock(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let lock_id = parse_id(&id, "lockId")?;
    let body = state.dispatcher.unlock(lock_id).await?;
    Ok(Json(body))
}

async fn battery(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let lock_id = parse_id(&id, "lockId")?;
    let body = state.dispatcher.query_battery(lock_id).await?;
    Ok(Json(body))
}

async fn open_state(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let lock_id = parse_id(&id, "lockId")?;
    let body = state.dispatcher.query_open_state(lock_id).await?;
    Ok(Json(body))
}

// ── Gateways ────────────────────────────────────────────────────────

async fn list_gateways(State(state): State<AppState>) -> ApiResult {
    let gateways = state.dispatcher.list_gateways().await?;
    Ok(Json(json!({ "list": gateways })))
}

async fn delete_gateway(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let gateway_id = parse_id(&id, "gatewayId")?;
    let body = state.dispatcher.delete_gateway(gateway_id).await?;
    Ok(Json(body))
}

async fn gateway_locks(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let gateway_id = parse_id(&id, "gatewayId")?;
    let locks = state.dispatcher.list_gateway_locks(gateway_id).await?;
    Ok(Json(json!({ "list": locks })))
}

// ── IC cards ────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct AddCardRequest {
    #[serde(rename = "cardNumber")]
    card_number: Option<String>,
    #[serde(rename = "startDate")]
    start_date: Option<i64>,
    #[serde(rename = "endDate")]
    end_date: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct PeriodRequest {
    #[serde(rename = "startDate")]
    start_date: Option<i64>,
    #[serde(rename = "endDate")]
    end_date: Option<i64>,
}

async fn list_cards(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let lock_id = parse_id(&id, "lockId")?;
    let cards = state.dispatcher.list_cards(lock_id).await?;
    Ok(Json(json!({ "list": cards })))
}

async fn add_card(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<AddCardRequest>,
) -> ApiResult {
    let lock_id = parse_id(&id, "lockId")?;
    let card_number = require(&req.card_number, "cardNumber")?.to_owned();
    let period = validate_period(req.start_date, req.end_date)?;

    let body = state
        .dispatcher
        .add_card(lock_id, &card_number, period)
        .await?;
    Ok(Json(body))
}

async fn delete_card(
    State(state): State<AppState>,
    Path((id, card_id)): Path<(String, String)>,
) -> ApiResult {
    let lock_id = parse_id(&id, "lockId")?;
    let card_id = parse_id(&card_id, "cardId")?;
    let body = state.dispatcher.delete_card(lock_id, card_id).await?;
    Ok(Json(body))
}

async fn clear_cards(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let lock_id = parse_id(&id, "lockId")?;
    let body = state.dispatcher.clear_cards(lock_id).await?;
    Ok(Json(body))
}

async fn change_card_period(
    State(state): State<AppState>,
    Path((id, card_id)): Path<(String, String)>,
    Json(req): Json<PeriodRequest>,
) -> ApiResult {
    let lock_id = parse_id(&id, "lockId")?;
    let card_id = parse_id(&card_id, "cardId")?;
    let period = validate_period(req.start_date, req.end_date)?;

    let body = state
        .dispatcher
        .change_card_period(lock_id, card_id, period)
        .await?;
    Ok(Json(body))
}

/// Cross-lock card view. The vendor only exposes cards per-lock, so the
/// lock list is fetched first and one card query fans out per lock;
/// locks that fail are reported in `failed` rather than aborting.
async fn list_all_cards(State(state): State<AppState>) -> ApiResult {
    let locks = state.dispatcher.list_locks().await?;
    let summaries = LockSummary::from_lock_records(&locks);
    let report = state
        .dispatcher
        .list_all_cards(&summaries, state.fanout_concurrency)
        .await;
    Ok(Json(json!({ "list": report.list, "failed": report.failed })))
}
