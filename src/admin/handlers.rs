use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use crate::admin::AdminState;
use crate::breaker::{BreakerSnapshot, CircuitStatus};

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub breakers: usize,
    pub open: usize,
    pub damaged: usize,
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    let snapshots = state.registry.snapshots();
    let open = snapshots.iter().filter(|s| s.status == CircuitStatus::Open).count();
    let damaged = snapshots.iter().filter(|s| s.status == CircuitStatus::Damaged).count();

    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: if open + damaged == 0 { "operational" } else { "degraded" },
        breakers: snapshots.len(),
        open,
        damaged,
    })
}

pub async fn list_breakers(State(state): State<AdminState>) -> Json<Vec<BreakerSnapshot>> {
    Json(state.registry.snapshots())
}

pub async fn get_breaker(
    State(state): State<AdminState>,
    Path(name): Path<String>,
) -> Result<Json<BreakerSnapshot>, StatusCode> {
    state
        .registry
        .get(&name)
        .map(|b| Json(b.snapshot()))
        .ok_or(StatusCode::NOT_FOUND)
}

pub async fn reset_breaker(
    State(state): State<AdminState>,
    Path(name): Path<String>,
) -> Result<Json<BreakerSnapshot>, StatusCode> {
    let breaker = state.registry.get(&name).ok_or(StatusCode::NOT_FOUND)?;
    tracing::warn!(name = %name, from = %breaker.status(), "Administrative reset requested");
    breaker.reset();
    Ok(Json(breaker.snapshot()))
}
