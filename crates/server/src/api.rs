//! Read-only JSON endpoints over the latest monitoring cycle.
//!
//! Every data endpoint answers `null` until the first cycle completes.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use hostwatch_core::{AnalysisRecord, MetricsSnapshot, RiskEstimate};

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub data_ready: bool,
    pub uptime_secs: i64,
    pub last_cycle_at: Option<DateTime<Utc>>,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let latest = state.analysis.latest();
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        data_ready: latest.is_some(),
        uptime_secs: (Utc::now() - state.started_at).num_seconds(),
        last_cycle_at: latest.map(|r| r.record.timestamp),
    })
}

pub async fn metrics(State(state): State<Arc<AppState>>) -> Json<Option<MetricsSnapshot>> {
    Json(state.analysis.latest_snapshot())
}

pub async fn analysis(State(state): State<Arc<AppState>>) -> Json<Option<AnalysisRecord>> {
    Json(state.analysis.latest_record())
}

pub async fn prediction(State(state): State<Arc<AppState>>) -> Json<Option<RiskEstimate>> {
    Json(state.analysis.latest_risk())
}
