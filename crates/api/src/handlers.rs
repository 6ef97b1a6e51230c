use crate::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
};
use memballast_models::{
    AddBallastResponse, BallastConfig, BallastError, ClearBallastResponse, ErrorShape,
    FreeBallastResponse, PoolStatus, SetBallastResponse,
};
use memballast_pool::ResizeOutcome;
use std::collections::HashMap;
use tracing::{error, info, instrument};

/// Operators drive this service from outside the container, so the status
/// body carries a pointer to the companion observation tool.
const STATUS_TIP: &str = "watch the container RSS with docker stats";

const DEFAULT_ADD_MB: u64 = 100;

fn error_response(e: &BallastError) -> (StatusCode, Json<ErrorShape>) {
    (
        StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(e.to_error_shape()),
    )
}

fn parse_mb_param(
    params: &HashMap<String, String>,
    name: &str,
    default: u64,
) -> Result<u64, BallastError> {
    match params.get(name) {
        None => Ok(default),
        Some(raw) => raw.parse::<u64>().map_err(|_| BallastError::InvalidParameter {
            reason: format!("{name} must be a non-negative integer"),
        }),
    }
}

fn validate_add_params(
    params: &HashMap<String, String>,
    ballast: &BallastConfig,
) -> Result<(u64, u64), BallastError> {
    let mb = parse_mb_param(params, "mb", DEFAULT_ADD_MB)?;
    let chunk_mb = parse_mb_param(params, "chunk", ballast.chunk_mb)?;

    if mb == 0 {
        return Err(BallastError::InvalidParameter {
            reason: "mb must be greater than zero".to_string(),
        });
    }
    if chunk_mb == 0 {
        return Err(BallastError::InvalidParameter {
            reason: "chunk must be greater than zero".to_string(),
        });
    }
    if mb > ballast.max_add_mb {
        return Err(BallastError::ReservationTooLarge {
            requested_mb: mb,
            max_mb: ballast.max_add_mb,
        });
    }

    Ok((mb, chunk_mb))
}

#[instrument(skip(state))]
pub async fn pool_status(State(state): State<AppState>) -> Json<PoolStatus> {
    let snapshot = state.pool.snapshot();
    Json(PoolStatus {
        allocated_mb: snapshot.allocated_mb,
        groups: snapshot.groups,
        tip: STATUS_TIP.to_string(),
    })
}

#[instrument(skip(state))]
pub async fn add_ballast(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<AddBallastResponse>, (StatusCode, Json<ErrorShape>)> {
    let (mb, chunk_mb) = match validate_add_params(&params, &state.config.ballast) {
        Ok(parsed) => parsed,
        Err(e) => {
            error!("Rejected ballast grow request: {}", e);
            state.metrics.record_rejection(e.error_type()).await;
            return Err(error_response(&e));
        }
    };

    info!("Growing ballast pool by {} MB ({} MB chunks)", mb, chunk_mb);

    // Filling hundreds of megabytes is CPU-bound work; keep it off the
    // async workers.
    let pool = state.pool.clone();
    let result = tokio::task::spawn_blocking(move || pool.grow(mb, chunk_mb))
        .await
        .map_err(|e| {
            let err = BallastError::InternalError {
                reason: e.to_string(),
            };
            error!("Ballast grow task failed: {}", err);
            error_response(&err)
        })?;

    match result {
        Ok(snapshot) => {
            state.metrics.record_reservation(mb).await;
            state.metrics.set_pool(snapshot.allocated_mb, snapshot.groups);
            Ok(Json(AddBallastResponse {
                ok: true,
                added_mb: mb,
                chunk_mb,
                total_mb: snapshot.allocated_mb,
            }))
        }
        Err(e) => {
            error!("Failed to grow ballast pool: {}", e);
            Err(error_response(&e))
        }
    }
}

#[instrument(skip(state))]
pub async fn set_ballast(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<SetBallastResponse>, (StatusCode, Json<ErrorShape>)> {
    let target_mb = match parse_mb_param(&params, "mb", 0) {
        Ok(target) => target,
        Err(e) => {
            error!("Rejected ballast resize request: {}", e);
            state.metrics.record_rejection(e.error_type()).await;
            return Err(error_response(&e));
        }
    };

    info!("Resizing ballast pool to {} MB", target_mb);

    let pool = state.pool.clone();
    let chunk_mb = state.config.ballast.chunk_mb;
    let result = tokio::task::spawn_blocking(move || pool.resize(target_mb, chunk_mb))
        .await
        .map_err(|e| {
            let err = BallastError::InternalError {
                reason: e.to_string(),
            };
            error!("Ballast resize task failed: {}", err);
            error_response(&err)
        })?;

    match result {
        Ok((snapshot, outcome)) => {
            match outcome {
                ResizeOutcome::Grew => state.metrics.record_reservation(target_mb).await,
                ResizeOutcome::Shrank => state.metrics.record_release(target_mb).await,
                ResizeOutcome::Unchanged => {}
            }
            state.metrics.set_pool(snapshot.allocated_mb, snapshot.groups);

            let note = matches!(outcome, ResizeOutcome::Unchanged)
                .then(|| "already at target".to_string());
            Ok(Json(SetBallastResponse {
                ok: true,
                total_mb: snapshot.allocated_mb,
                note,
            }))
        }
        Err(e) => {
            error!("Failed to resize ballast pool: {}", e);
            Err(error_response(&e))
        }
    }
}

#[instrument(skip(state))]
pub async fn free_ballast(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<FreeBallastResponse>, (StatusCode, Json<ErrorShape>)> {
    let mb = match parse_mb_param(&params, "mb", 0).and_then(|mb| {
        if mb == 0 {
            Err(BallastError::InvalidParameter {
                reason: "mb must be greater than zero".to_string(),
            })
        } else {
            Ok(mb)
        }
    }) {
        Ok(mb) => mb,
        Err(e) => {
            error!("Rejected ballast release request: {}", e);
            state.metrics.record_rejection(e.error_type()).await;
            return Err(error_response(&e));
        }
    };

    info!("Releasing {} MB of ballast", mb);

    let snapshot = state.pool.release(mb);
    state.metrics.record_release(mb).await;
    state.metrics.set_pool(snapshot.allocated_mb, snapshot.groups);

    Ok(Json(FreeBallastResponse {
        ok: true,
        freed_request_mb: mb,
        total_mb: snapshot.allocated_mb,
    }))
}

#[instrument(skip(state))]
pub async fn clear_ballast(
    State(state): State<AppState>,
) -> Result<Json<ClearBallastResponse>, (StatusCode, Json<ErrorShape>)> {
    let held_mb = state.pool.snapshot().allocated_mb;
    info!("Clearing ballast pool ({} MB held)", held_mb);

    let snapshot = state.pool.clear();
    state.metrics.record_release(held_mb).await;
    state.metrics.set_pool(snapshot.allocated_mb, snapshot.groups);

    Ok(Json(ClearBallastResponse {
        ok: true,
        total_mb: snapshot.allocated_mb,
    }))
}

#[instrument(skip(_state))]
pub async fn health_check(State(_state): State<AppState>) -> Result<&'static str, StatusCode> {
    Ok("ok")
}

#[instrument(skip(state))]
pub async fn metrics(State(state): State<AppState>) -> Result<String, StatusCode> {
    match state.metrics.get_prometheus_metrics().await {
        Ok(metrics) => Ok(metrics),
        Err(e) => {
            error!("Failed to get metrics: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
