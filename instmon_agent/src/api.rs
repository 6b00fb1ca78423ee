//! HTTP routes serving the sample history in the shape the normalizer decodes.

use std::collections::{BTreeMap, HashMap};

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{Duration, Utc};
use instmon::interval::lookback_minutes;
use instmon::{IntervalError, RawSample};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, warn};

use crate::state::AppState;

const BYTES_PER_MIB: f64 = 1024.0 * 1024.0;

type Params = Query<HashMap<String, String>>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("instance_id query parameter is required")]
    MissingInstanceId,
    #[error("Instance not found")]
    InstanceNotFound,
    #[error(transparent)]
    Interval(#[from] IntervalError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::InstanceNotFound => StatusCode::NOT_FOUND,
            ApiError::MissingInstanceId | ApiError::Interval(_) => StatusCode::BAD_REQUEST,
        };
        if status != StatusCode::NOT_FOUND {
            warn!(%status, "request rejected: {self}");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct MetricsResponse<T> {
    pub latest: bool,
    pub timestamp: String,
    pub metrics: T,
}

impl<T> MetricsResponse<T> {
    fn new(latest: bool, metrics: T) -> Self {
        Self {
            latest,
            timestamp: Utc::now().to_rfc3339(),
            metrics,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/metrics", get(all_latest))
        .route("/metrics/export/csv", get(export_csv))
        .route("/metrics/:instance_id", get(instance_metrics))
        .with_state(state)
}

// Plain string compare: the token gates casual access only and is not
// hardened against timing attacks.
fn authorize(state: &AppState, q: &HashMap<String, String>) -> Result<(), ApiError> {
    match state.auth_token.as_ref() {
        Some(expected) if q.get("token") != Some(expected) => Err(ApiError::Unauthorized),
        _ => Ok(()),
    }
}

async fn all_latest(
    State(state): State<AppState>,
    Query(q): Params,
) -> Result<Json<MetricsResponse<BTreeMap<String, RawSample>>>, ApiError> {
    authorize(&state, &q)?;
    let latest = state.history.read().await.latest_all();
    Ok(Json(MetricsResponse::new(true, latest)))
}

async fn instance_metrics(
    State(state): State<AppState>,
    Path(instance_id): Path<String>,
    Query(q): Params,
) -> Result<Json<MetricsResponse<Vec<RawSample>>>, ApiError> {
    authorize(&state, &q)?;
    let history = state.history.read().await;

    if let Some(interval) = q.get("timeInterval") {
        let minutes = lookback_minutes(interval)?;
        let end = Utc::now();
        let start = end - Duration::minutes(i64::from(minutes));
        let samples = history.range(&instance_id, start, end);
        debug!(instance = %instance_id, %interval, count = samples.len(), "history query");
        return Ok(Json(MetricsResponse::new(false, samples)));
    }

    let latest = history
        .latest(&instance_id)
        .cloned()
        .ok_or(ApiError::InstanceNotFound)?;
    Ok(Json(MetricsResponse::new(true, vec![latest])))
}

/// One CSV row for the newest sample: CPU %, memory %, network totals in MiB.
pub fn csv_export(sample: &RawSample) -> String {
    let cpu = sample
        .cpu
        .as_ref()
        .and_then(|c| c.total_usage)
        .unwrap_or(0.0);
    let memory = sample
        .memory
        .as_ref()
        .and_then(|m| m.memory_usage_percent)
        .unwrap_or(0.0);
    let rx: f64 = sample
        .networks()
        .iter()
        .map(|n| n.rx_bytes.unwrap_or(0) as f64 / BYTES_PER_MIB)
        .sum();
    let tx: f64 = sample
        .networks()
        .iter()
        .map(|n| n.tx_bytes.unwrap_or(0) as f64 / BYTES_PER_MIB)
        .sum();
    format!(
        "Timestamp,CPU Usage (%),Memory Usage (%),Network RX (MB),Network TX (MB)\n\
         {},{cpu:.2},{memory:.2},{rx:.2},{tx:.2}\n",
        sample.timestamp.to_rfc3339()
    )
}

async fn export_csv(
    State(state): State<AppState>,
    Query(q): Params,
) -> Result<Response, ApiError> {
    authorize(&state, &q)?;
    let instance_id = q
        .get("instance_id")
        .filter(|s| !s.is_empty())
        .ok_or(ApiError::MissingInstanceId)?;
    let body = {
        let history = state.history.read().await;
        let sample = history
            .latest(instance_id)
            .ok_or(ApiError::InstanceNotFound)?;
        csv_export(sample)
    };
    let disposition = format!("attachment; filename=metrics_export_{instance_id}.csv");
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}
