//! Authenticated HTTP surface
//!
//! Two endpoints under `/api/v1`: `sendMessage` posts a message through
//! the transport, `recvMessage` echoes the queried number back. Every
//! request is checked against the configured credentials before anything
//! else; error responses carry a single `error` field.

use crate::auth::AuthGate;
use crate::error::{AuthError, ValidationError};
use crate::transport::MessageTransport;
use crate::validate::{recipient_address, validate_recipient};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthGate>,
    pub transport: Arc<dyn MessageTransport>,
    pub network_domain: Arc<str>,
}

#[derive(Debug, Deserialize)]
pub struct SendRequest {
    // Missing fields deserialize to "" and fail recipient validation
    #[serde(default)]
    pub number: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
struct RecvParams {
    #[serde(default)]
    number: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/sendMessage", post(send_message))
        .route("/api/v1/recvMessage", get(recv_message))
        .with_state(state)
}

/// Bind `addr` and serve until a shutdown signal arrives
pub async fn serve(addr: SocketAddr, state: AppState) -> crate::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    serve_on(listener, state).await
}

/// Serve on an already-bound listener. Split out so tests can bind an
/// ephemeral port first and read it back.
pub async fn serve_on(listener: tokio::net::TcpListener, state: AppState) -> crate::Result<()> {
    let addr = listener.local_addr()?;
    info!(%addr, "listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => {}
            _ = sigterm.recv() => {}
        }
    }

    #[cfg(not(unix))]
    ctrl_c.await.expect("failed to install Ctrl+C handler");

    info!("received shutdown signal");
}

/// A header that is present but not readable as a string counts as
/// malformed, not missing
fn auth_header(headers: &HeaderMap) -> Result<Option<&str>, AuthError> {
    match headers.get(AUTHORIZATION) {
        Some(value) => match value.to_str() {
            Ok(value) => Ok(Some(value)),
            Err(_) => Err(AuthError::MalformedHeader),
        },
        None => Ok(None),
    }
}

fn error_body(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// POST /api/v1/sendMessage
///
/// The body is taken as a `Result` so a malformed payload still reaches
/// the handler; auth is checked before the body is looked at.
async fn send_message(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<SendRequest>, JsonRejection>,
) -> Response {
    if let Err(e) = auth_header(&headers).and_then(|header| state.auth.authenticate(header)) {
        warn!(error = %e, "rejected unauthenticated send");
        return error_body(StatusCode::UNAUTHORIZED, &e.to_string());
    }

    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => {
            let reason = ValidationError::MalformedRequestBody(rejection.body_text());
            return error_body(StatusCode::BAD_REQUEST, &reason.to_string());
        }
    };

    if let Err(e) = validate_recipient(&request.number) {
        warn!(number = %request.number, "rejected recipient");
        return error_body(StatusCode::BAD_REQUEST, &e.to_string());
    }

    let address = recipient_address(&request.number, &state.network_domain);
    match state.transport.send(&address, &request.message).await {
        Ok(()) => {
            info!(number = %request.number, "message sent");
            let text = format!("Sent to {}: {}", request.number, request.message);
            (StatusCode::OK, Json(json!({ "response": text }))).into_response()
        }
        Err(e) => {
            warn!(number = %request.number, error = %e, "send failed");
            error_body(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
    }
}

/// GET /api/v1/recvMessage
async fn recv_message(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<RecvParams>,
) -> Response {
    if let Err(e) = auth_header(&headers).and_then(|header| state.auth.authenticate(header)) {
        warn!(error = %e, "rejected unauthenticated recv");
        return error_body(StatusCode::UNAUTHORIZED, &e.to_string());
    }

    if params.number.is_empty() {
        return error_body(StatusCode::BAD_REQUEST, "number parameter is required");
    }

    let text = format!("Received number: {}", params.number);
    (StatusCode::OK, Json(json!({ "message": text }))).into_response()
}
