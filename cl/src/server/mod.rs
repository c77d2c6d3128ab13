//! HTTP surface for the clarifier
//!
//! Thin axum layer over [`Clarifier`]: each handler validates the body,
//! delegates one operation and maps the result to a status code.

pub mod messages;

use std::sync::Arc;
use std::time::Duration;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use eyre::{Context, Result};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::clarify::{ClarifyError, ClarifyResult, Clarifier, RoundOutcome};
use crate::config::ServerConfig;
pub use messages::{ClarifyResponse, ContinueRequest, FinishRequest, HealthResponse, StartRequest};

type Reply = (StatusCode, Json<ClarifyResponse>);

/// Build the router with all endpoints
pub fn router(clarifier: Arc<Clarifier>) -> Router {
    Router::new()
        .route("/clarify/start", post(start))
        .route("/clarify/continue", post(continue_session))
        .route("/clarify/finish", post(finish))
        .route("/health", get(health))
        .with_state(clarifier)
}

/// Bind `config.bind` and serve until Ctrl-C
pub async fn serve(clarifier: Arc<Clarifier>, config: &ServerConfig) -> Result<()> {
    let listener = TcpListener::bind(&config.bind)
        .await
        .context(format!("Failed to bind {}", config.bind))?;
    serve_on(listener, clarifier, config).await
}

/// Serve on an already-bound listener until Ctrl-C
pub async fn serve_on(listener: TcpListener, clarifier: Arc<Clarifier>, config: &ServerConfig) -> Result<()> {
    let addr = listener.local_addr().context("Failed to read listener address")?;
    info!(%addr, "serve_on: clarifier listening");

    let sweeper = spawn_sweeper(clarifier.clone(), config);

    axum::serve(listener, router(clarifier))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    if let Some(handle) = sweeper {
        handle.abort();
    }
    info!("serve_on: server stopped");
    Ok(())
}

/// Periodically evict idle sessions; `None` when eviction is disabled
pub fn spawn_sweeper(clarifier: Arc<Clarifier>, config: &ServerConfig) -> Option<JoinHandle<()>> {
    if config.session_ttl_secs == 0 {
        info!("spawn_sweeper: session eviction disabled");
        return None;
    }
    let Some(ttl) = config.session_ttl() else {
        warn!(ttl_secs = config.session_ttl_secs, "spawn_sweeper: session ttl out of range, eviction disabled");
        return None;
    };
    let period = Duration::from_secs(config.sweep_interval_secs.max(1));
    debug!(ttl_secs = config.session_ttl_secs, period_secs = period.as_secs(), "spawn_sweeper: called");

    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        // First tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            clarifier.evict_idle(ttl).await;
        }
    }))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "shutdown_signal: failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("shutdown_signal: Ctrl-C received, shutting down");
}

async fn start(State(clarifier): State<Arc<Clarifier>>, body: Result<Json<StartRequest>, JsonRejection>) -> Reply {
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => return bad_body(rejection),
    };
    debug!(session_id = %request.session_id, "start: called");
    let result = clarifier.start(&request.session_id, &request.query).await;
    reply(&request.session_id, result)
}

async fn continue_session(
    State(clarifier): State<Arc<Clarifier>>,
    body: Result<Json<ContinueRequest>, JsonRejection>,
) -> Reply {
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => return bad_body(rejection),
    };
    debug!(session_id = %request.session_id, "continue_session: called");
    let result = clarifier.continue_session(&request.session_id, &request.answer).await;
    reply(&request.session_id, result)
}

async fn finish(State(clarifier): State<Arc<Clarifier>>, body: Result<Json<FinishRequest>, JsonRejection>) -> Reply {
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => return bad_body(rejection),
    };
    debug!(session_id = %request.session_id, "finish: called");
    let result = clarifier.finish(&request.session_id).await;
    reply(&request.session_id, result)
}

async fn health(State(clarifier): State<Arc<Clarifier>>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(clarifier.session_count().await))
}

fn reply(session_id: &str, result: ClarifyResult<RoundOutcome>) -> Reply {
    match result {
        Ok(outcome) => (
            StatusCode::OK,
            Json(ClarifyResponse::from_outcome(session_id.trim(), outcome)),
        ),
        Err(e) => {
            let status = status_for(&e);
            if e.is_client_error() {
                debug!(%status, error = %e, "reply: rejected request");
            } else {
                warn!(%status, error = %e, "reply: request failed");
            }
            (status, Json(ClarifyResponse::error(e.to_string())))
        }
    }
}

fn bad_body(rejection: JsonRejection) -> Reply {
    debug!(error = %rejection, "bad_body: rejected request body");
    let e = ClarifyError::InvalidInput(rejection.body_text());
    (status_for(&e), Json(ClarifyResponse::error(e.to_string())))
}

/// HTTP status for a failed operation
pub fn status_for(error: &ClarifyError) -> StatusCode {
    match error {
        ClarifyError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        ClarifyError::SessionNotFound(_) => StatusCode::NOT_FOUND,
        ClarifyError::SessionClosed { .. } | ClarifyError::SessionExists(_) => StatusCode::CONFLICT,
        ClarifyError::Collaborator { .. } => StatusCode::BAD_GATEWAY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clarify::{SessionStatus, Stage};
    use crate::collaborator::CollaboratorError;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_for(&ClarifyError::InvalidInput("x".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&ClarifyError::SessionNotFound("s1".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&ClarifyError::SessionClosed {
                id: "s1".to_string(),
                status: SessionStatus::Completed
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_for(&ClarifyError::SessionExists("s1".to_string())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_for(&ClarifyError::Collaborator {
                stage: Stage::Classify,
                source: CollaboratorError::Empty("reply"),
            }),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_reply_error_body() {
        let (status, Json(body)) = reply("s1", Err(ClarifyError::SessionNotFound("s1".to_string())));
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, ClarifyResponse::error("Session not found: s1"));
    }
}
