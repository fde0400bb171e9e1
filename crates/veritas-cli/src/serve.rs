//! HTTP surface: `POST /run` and `GET /health`.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use tracing::{info, warn};
use veritas_core::CaseInput;
use veritas_host::{Bookkeeper, Tribunal, bookkeeping};

#[derive(Clone)]
pub struct AppState {
    pub tribunal: Tribunal,
    pub bookkeeper: Option<Arc<dyn Bookkeeper>>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .route("/run", post(handle_run))
        .with_state(state)
}

pub async fn serve(host: &str, port: u16, state: AppState) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind((host, port)).await?;
    info!(addr = %listener.local_addr()?, "veritas listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}

/// GET /health
async fn handle_health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// POST /run: process one case.
async fn handle_run(
    State(state): State<AppState>,
    body: Result<Json<CaseInput>, JsonRejection>,
) -> Response {
    let Json(input) = match body {
        Ok(b) => b,
        Err(e) => {
            warn!(error = %e, "rejected /run body");
            return bad_request(format!("Invalid JSON body: {}", e.body_text()));
        }
    };

    let record = match state.tribunal.process_case(input).await {
        Ok(record) => record,
        Err(e) => return bad_request(e.to_string()),
    };

    // Store writes are blocking file I/O; keep them off the async workers.
    if let Some(keeper) = state.bookkeeper.clone() {
        let persisted = record.clone();
        let joined = tokio::task::spawn_blocking(move || {
            bookkeeping::record_verdict(&persisted, keeper.as_ref())
        })
        .await;
        if let Err(e) = joined {
            warn!(error = %e, "bookkeeping task failed");
        }
    }
    Json(record).into_response()
}

fn bad_request(detail: String) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "detail": detail }))).into_response()
}
