//! HTTP routes
//!
//! - `POST /api/executions`: save an execution for the caller
//! - `GET  /api/executions?limit=N`: the caller's executions, newest first
//! - `POST /api/chat`: forward a chat completion to the LLM provider
//! - `GET  /health`: liveness
//!
//! Saving rejects anonymous callers ahead of the body filters, so a missing
//! identity is reported before anything about the payload, including its size.

use crate::state::AppState;
use codepad_assistant::{AssistantError, ChatRequest};
use codepad_core::{AuthContext, ExecutionError, SaveExecutionInput};
use serde::Deserialize;
use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;
use warp::http::{HeaderMap, StatusCode};
use warp::hyper::body::Bytes;
use warp::reply::{Json, WithStatus};
use warp::{Filter, Rejection, Reply};

/// Records returned when the query names no limit
pub const DEFAULT_LIST_LIMIT: usize = 20;

type JsonReply = WithStatus<Json>;

fn json_reply(status: StatusCode, body: &serde_json::Value) -> JsonReply {
    warp::reply::with_status(warp::reply::json(body), status)
}

fn error_reply(status: StatusCode, code: &str, message: &str) -> JsonReply {
    json_reply(status, &json!({ "error": message, "code": code }))
}

/// Status and stable code for an execution error
#[must_use]
pub fn execution_status(err: &ExecutionError) -> (StatusCode, &'static str) {
    match err {
        ExecutionError::Unauthenticated => (StatusCode::UNAUTHORIZED, "unauthenticated"),
        ExecutionError::Unauthorized { .. } => (StatusCode::FORBIDDEN, "unauthorized"),
        ExecutionError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "invalid_input"),
        ExecutionError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "storage"),
    }
}

fn execution_error_reply(err: &ExecutionError) -> JsonReply {
    let (status, code) = execution_status(err);
    error_reply(status, code, &err.to_string())
}

/// Full route tree with rejection handling and request tracing
pub fn routes(state: Arc<AppState>) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    health()
        .or(save_execution(state.clone()))
        .or(list_executions(state.clone()))
        .or(chat(state))
        .recover(handle_rejection)
        .with(warp::trace::request())
}

fn with_state(state: Arc<AppState>) -> impl Filter<Extract = (Arc<AppState>,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

fn with_auth(state: Arc<AppState>) -> impl Filter<Extract = (AuthContext,), Error = Infallible> + Clone {
    warp::header::headers_cloned().map(move |headers: HeaderMap| {
        let subject = headers
            .get(state.subject_header.as_str())
            .and_then(|value| value.to_str().ok());
        AuthContext::from_subject(subject)
    })
}

/// Rejection for a request that reached an identity-only route without one
#[derive(Debug)]
struct Unauthenticated;

impl warp::reject::Reject for Unauthenticated {}

fn require_identity(state: Arc<AppState>) -> impl Filter<Extract = (AuthContext,), Error = Rejection> + Clone {
    with_auth(state).and_then(|auth: AuthContext| async move {
        if auth.identity().is_some() {
            Ok(auth)
        } else {
            Err(warp::reject::custom(Unauthenticated))
        }
    })
}

fn health() -> impl Filter<Extract = (JsonReply,), Error = Rejection> + Clone {
    warp::path!("health").and(warp::get()).map(|| {
        json_reply(
            StatusCode::OK,
            &json!({ "status": "ok", "version": crate::VERSION }),
        )
    })
}

fn save_execution(state: Arc<AppState>) -> impl Filter<Extract = (JsonReply,), Error = Rejection> + Clone {
    warp::path!("api" / "executions")
        .and(warp::post())
        .and(require_identity(state.clone()))
        .and(warp::body::content_length_limit(state.max_body_bytes))
        .and(warp::body::bytes())
        .and(with_state(state))
        .and_then(handle_save)
}

async fn handle_save(auth: AuthContext, body: Bytes, state: Arc<AppState>) -> Result<JsonReply, Infallible> {
    let input: SaveExecutionInput = match serde_json::from_slice(&body) {
        Ok(input) => input,
        Err(e) => {
            return Ok(execution_error_reply(&ExecutionError::InvalidInput(e.to_string())));
        }
    };

    match state.executions.save_execution(&auth, input).await {
        Ok(id) => Ok(json_reply(StatusCode::CREATED, &json!({ "id": id.to_string() }))),
        Err(e) => Ok(execution_error_reply(&e)),
    }
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    limit: Option<usize>,
}

fn list_executions(state: Arc<AppState>) -> impl Filter<Extract = (JsonReply,), Error = Rejection> + Clone {
    warp::path!("api" / "executions")
        .and(warp::get())
        .and(with_auth(state.clone()))
        .and(warp::query::<ListQuery>())
        .and(with_state(state))
        .and_then(handle_list)
}

async fn handle_list(auth: AuthContext, query: ListQuery, state: Arc<AppState>) -> Result<JsonReply, Infallible> {
    let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT);
    match state.executions.list_executions(&auth, limit).await {
        Ok(records) => Ok(json_reply(StatusCode::OK, &json!({ "executions": records }))),
        Err(e) => Ok(execution_error_reply(&e)),
    }
}

fn chat(state: Arc<AppState>) -> impl Filter<Extract = (JsonReply,), Error = Rejection> + Clone {
    warp::path!("api" / "chat")
        .and(warp::post())
        .and(warp::body::content_length_limit(state.max_body_bytes))
        .and(warp::body::bytes())
        .and(with_state(state))
        .and_then(handle_chat)
}

async fn handle_chat(body: Bytes, state: Arc<AppState>) -> Result<JsonReply, Infallible> {
    let request: ChatRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => return Ok(error_reply(StatusCode::BAD_REQUEST, "invalid_request", &e.to_string())),
    };

    match state.assistant.complete(request).await {
        Ok(completion) => Ok(json_reply(StatusCode::OK, &completion)),
        Err(e) => Ok(assistant_error_reply(&e)),
    }
}

fn assistant_error_reply(err: &AssistantError) -> JsonReply {
    match err {
        AssistantError::MissingApiKey => json_reply(
            StatusCode::INTERNAL_SERVER_ERROR,
            &json!({ "error": "Missing API key" }),
        ),
        AssistantError::QuotaExhausted => json_reply(
            StatusCode::PAYMENT_REQUIRED,
            &json!({ "error": err.to_string() }),
        ),
        AssistantError::InvalidRequest(msg) => {
            error_reply(StatusCode::BAD_REQUEST, "invalid_request", msg)
        }
        _ => json_reply(
            StatusCode::INTERNAL_SERVER_ERROR,
            &json!({ "error": "Internal Server Error" }),
        ),
    }
}

async fn handle_rejection(err: Rejection) -> Result<JsonReply, Infallible> {
    if err.find::<Unauthenticated>().is_some() {
        return Ok(execution_error_reply(&ExecutionError::Unauthenticated));
    }

    let (status, code) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "not_found")
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        (StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large")
    } else if err.find::<warp::reject::LengthRequired>().is_some() {
        (StatusCode::LENGTH_REQUIRED, "length_required")
    } else if err.find::<warp::reject::InvalidQuery>().is_some() {
        (StatusCode::BAD_REQUEST, "invalid_query")
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "method_not_allowed")
    } else {
        tracing::error!(rejection = ?err, "unhandled rejection");
        (StatusCode::INTERNAL_SERVER_ERROR, "internal")
    };

    let message = status.canonical_reason().unwrap_or("error");
    Ok(error_reply(status, code, message))
}
