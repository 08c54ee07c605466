//! HTTP API for the Regime Engine.
//!
//! This module exposes the comparison engine as a single JSON endpoint
//! using the [`axum`](https://crates.io/crates/axum) framework.  Clients
//! `POST` a [`CompensationInput`] to `/api/calculate` and receive a
//! [`RegimeComparisonResult`](crate::models::RegimeComparisonResult),
//! or a list of field-level errors.  The server keeps no state besides
//! the tax tables loaded at startup.

use crate::config::ServerConfig;
use crate::engine::RegimeComparator;
use crate::models::CompensationInput;
use crate::tax::{load_tax_tables_from_dir, TaxTableRegistry};
use crate::validation::{validate, ValidationError};
use anyhow::{Context, Result};
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Application state shared across requests.
pub struct AppState {
    pub tax_tables: TaxTableRegistry,
}

#[derive(Debug, Deserialize)]
pub struct CalculateParams {
    /// Tax year to compute with; the configured default when absent.
    pub year: Option<u16>,
}

/// Error body: `{"errors": [{"field": ..., "message": ...}]}`.
#[derive(Debug, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    status: StatusCode,
    errors: Vec<ValidationError>,
}

impl ApiError {
    fn bad_request(field: &str, message: String) -> Self {
        ApiError {
            status: StatusCode::BAD_REQUEST,
            errors: vec![ValidationError::new(field, message)],
        }
    }

    fn unprocessable(errors: Vec<ValidationError>) -> Self {
        ApiError {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            errors,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

/// Load tax tables as configured and wrap them in the shared state.
pub fn load_state(config: &ServerConfig) -> Result<Arc<AppState>> {
    let extra = load_tax_tables_from_dir(&config.tax_table_dir)
        .with_context(|| format!("reading tax tables from {}", config.tax_table_dir.display()))?;
    let tax_tables = TaxTableRegistry::with_tables(extra, config.tax_year)?;
    info!(
        years = ?tax_tables.years().collect::<Vec<_>>(),
        default_year = config.tax_year,
        "tax tables loaded"
    );
    Ok(Arc::new(AppState { tax_tables }))
}

/// Build the API router around `state`.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/calculate", post(calculate_handler))
        .with_state(state)
}

/// Handler for POST /api/calculate
async fn calculate_handler(
    State(app_state): State<Arc<AppState>>,
    params: Result<Query<CalculateParams>, QueryRejection>,
    body: Result<Json<CompensationInput>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Query(params) = params.map_err(|err| {
        warn!(%err, "rejected query string");
        ApiError::bad_request("year", err.body_text())
    })?;
    let Json(input) = body.map_err(|err| {
        warn!(%err, "rejected request body");
        ApiError::bad_request("body", err.body_text())
    })?;

    let tables = match params.year {
        Some(year) => app_state.tax_tables.get(year).map_err(|err| {
            ApiError::unprocessable(vec![ValidationError::new("year", err.to_string())])
        })?,
        None => app_state.tax_tables.default_tables(),
    };

    if let Err(invalid) = validate(&input) {
        debug!(fields = invalid.errors.len(), "input failed validation");
        return Err(ApiError::unprocessable(invalid.errors));
    }

    let result = RegimeComparator::new(tables).compare(&input);
    Ok((StatusCode::OK, Json(result)).into_response())
}

/// Launch the API server.  This function loads the tax tables, binds
/// to the configured address and blocks until the server terminates.
pub async fn serve(config: ServerConfig) -> Result<()> {
    let state = load_state(&config)?;
    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;
    info!(addr = %config.bind_addr, "server listening");
    axum::serve(listener, router).await?;
    Ok(())
}
