//! The axum façade: thin bindings from the routes of the spec's
//! external-interfaces section onto `DecisionEngine` calls. No middleware
//! stack, no auth — both are declared Non-goals of the core.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::Router;
use eir_core::{Colour, DecisionEngine, DecisionError, InMemoryRangeStore};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::load::LoadMonitor;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<DecisionEngine<InMemoryRangeStore>>,
    pub load: LoadMonitor,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/n5g-eir-eic/v1/equipment-status", get(equipment_status))
        .route("/api/v1/check-imei/{imei}", get(check_imei))
        .route("/api/v1/check-tac/{imei}", get(check_tac))
        .route("/api/v1/insert-tac", post(insert_tac))
        .route("/api/v1/insert-imei", post(insert_imei))
        .route("/api/v1/tac/{key}", delete(remove_tac))
        .route("/api/v1/imei/{imei}", delete(remove_imei))
        .route("/api/v1/tac", get(list_tac))
        .with_state(state)
}

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
}

async fn health() -> Json<HealthBody> {
    Json(HealthBody { status: "healthy" })
}

#[derive(Serialize)]
struct StatusBody {
    status: &'static str,
}

/// Apply the operator-configurable unknown→WHITELISTED default; any other
/// error propagates as-is.
fn resolve_unknown(
    result: Result<eir_core::CheckResult, DecisionError>,
    default_whitelisted: bool,
) -> Result<Colour, DecisionError> {
    match result {
        Ok(r) => Ok(r.colour),
        Err(DecisionError::Unknown) if default_whitelisted => Ok(Colour::White),
        Err(other) => Err(other),
    }
}

#[derive(Deserialize)]
struct EquipmentStatusQuery {
    pei: String,
    #[allow(dead_code)]
    supi: Option<String>,
    #[allow(dead_code)]
    gpsi: Option<String>,
}

async fn equipment_status(
    State(state): State<AppState>,
    Query(query): Query<EquipmentStatusQuery>,
) -> Result<impl IntoResponse, AppError> {
    let colour = resolve_unknown(
        state
            .engine
            .check_tac(query.pei.as_bytes(), state.load.snapshot())
            .await,
        state.engine.config.default_policy_unknown_is_whitelisted,
    )?;
    Ok(Json(StatusBody {
        status: colour.http_status(),
    }))
}

async fn check_imei(
    State(state): State<AppState>,
    Path(imei): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let colour = resolve_unknown(
        state
            .engine
            .check_imei(imei.as_bytes(), state.load.snapshot())
            .await,
        state.engine.config.default_policy_unknown_is_whitelisted,
    )?;
    Ok(Json(StatusBody {
        status: colour.http_status(),
    }))
}

async fn check_tac(
    State(state): State<AppState>,
    Path(imei): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let colour = resolve_unknown(
        state
            .engine
            .check_tac(imei.as_bytes(), state.load.snapshot())
            .await,
        state.engine.config.default_policy_unknown_is_whitelisted,
    )?;
    Ok(Json(StatusBody {
        status: colour.http_status(),
    }))
}

#[derive(Deserialize)]
struct InsertTacBody {
    start_range_tac: String,
    end_range_tac: Option<String>,
    color: String,
}

async fn insert_tac(
    State(state): State<AppState>,
    Json(body): Json<InsertTacBody>,
) -> Result<impl IntoResponse, AppError> {
    let colour = Colour::from_long_name(&body.color).ok_or(DecisionError::InvalidColor)?;
    state
        .engine
        .insert_tac(
            body.start_range_tac.as_bytes(),
            body.end_range_tac.as_deref().map(str::as_bytes),
            colour,
        )
        .await?;
    Ok(StatusCode::CREATED)
}

#[derive(Deserialize)]
struct InsertImeiBody {
    imei: String,
    color: String,
}

async fn insert_imei(
    State(state): State<AppState>,
    Json(body): Json<InsertImeiBody>,
) -> Result<impl IntoResponse, AppError> {
    let colour = Colour::from_short_code(&body.color).ok_or(DecisionError::InvalidColor)?;
    state
        .engine
        .insert_imei(body.imei.as_bytes(), colour)
        .await?;
    Ok(StatusCode::CREATED)
}

async fn remove_tac(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.engine.remove_tac(key.as_bytes()).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn remove_imei(
    State(state): State<AppState>,
    Path(imei): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.engine.remove_imei(imei.as_bytes()).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Serialize)]
struct TacRangeBody {
    key: String,
    colour: Colour,
}

async fn list_tac(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let ranges = state
        .engine
        .tac_list()
        .await
        .map_err(|e| AppError(DecisionError::Store(e)))?;
    let body: Vec<TacRangeBody> = ranges
        .into_iter()
        .map(|r| TacRangeBody {
            key: String::from_utf8_lossy(&r.key).into_owned(),
            colour: r.colour,
        })
        .collect();
    Ok(Json(body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use eir_core::EngineConfig;

    fn state() -> AppState {
        AppState {
            engine: Arc::new(DecisionEngine::new(
                Arc::new(InMemoryRangeStore::new()),
                EngineConfig::default(),
            )),
            load: LoadMonitor::new(1024),
        }
    }

    #[tokio::test]
    async fn health_reports_healthy() {
        let Json(body) = health().await;
        assert_eq!(body.status, "healthy");
    }

    #[tokio::test]
    async fn insert_then_check_tac_round_trips_over_the_facade() {
        let state = state();
        insert_tac(
            State(state.clone()),
            Json(InsertTacBody {
                start_range_tac: "35".to_string(),
                end_range_tac: Some("35".to_string()),
                color: "black".to_string(),
            }),
        )
        .await
        .unwrap();

        let colour = resolve_unknown(
            state
                .engine
                .check_tac(b"35", state.load.snapshot())
                .await,
            true,
        )
        .unwrap();
        assert_eq!(colour, Colour::Black);
    }

    #[tokio::test]
    async fn unknown_defaults_to_whitelisted_when_policy_enabled() {
        let state = state();
        let result = state.engine.check_tac(b"1", state.load.snapshot()).await;
        let colour = resolve_unknown(result, true).unwrap();
        assert_eq!(colour, Colour::White);
    }

    #[tokio::test]
    async fn unknown_propagates_when_policy_disabled() {
        let state = state();
        let result = state.engine.check_tac(b"1", state.load.snapshot()).await;
        let err = resolve_unknown(result, false).unwrap_err();
        assert_eq!(err, DecisionError::Unknown);
    }
}
