//! HTTP Handlers

use std::collections::BTreeMap;

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

use macro_advisor::{AnalysisReport, AnalysisRequest, Asset, ClassifierKind, RiskProfile};
use macro_core::{ErrorKind, MacroError};

use crate::state::AppState;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub provider: String,
    pub dimension: usize,
    pub provider_reachable: bool,
    pub classifier: ClassifierKind,
}

#[derive(Debug, Serialize)]
pub struct ArchetypeSummary {
    pub name: String,
    pub description: String,
    pub impact: BTreeMap<Asset, f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_profile: Option<RiskProfile>,
    pub noise: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(err: &MacroError) -> ApiError {
    let (status, code) = match (err.kind(), err) {
        (ErrorKind::Validation, _) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
        (ErrorKind::Configuration, _) => (StatusCode::UNPROCESSABLE_ENTITY, "CONFIGURATION_ERROR"),
        (ErrorKind::Retrieval, MacroError::RetrievalTimeout { .. }) => {
            (StatusCode::GATEWAY_TIMEOUT, "RETRIEVAL_TIMEOUT")
        }
        (ErrorKind::Retrieval, _) => (StatusCode::BAD_GATEWAY, "RETRIEVAL_ERROR"),
    };

    if status.is_server_error() {
        tracing::warn!("Analysis failed: {}", err);
    }

    (
        status,
        Json(ErrorResponse {
            error: err.user_message(),
            code: code.into(),
        }),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let provider = state.analyzer.provider();
    let info = provider.info();
    let provider_reachable = provider.health_check().await.unwrap_or(false);

    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        provider: info.name,
        dimension: info.dimension,
        provider_reachable,
        classifier: state.analyzer.config().classifier,
    })
}

/// Archetype registry in canonical order
pub async fn list_archetypes(State(state): State<AppState>) -> Json<Vec<ArchetypeSummary>> {
    let archetypes = state
        .analyzer
        .registry()
        .iter()
        .map(|a| ArchetypeSummary {
            name: a.name.clone(),
            description: a.description.clone(),
            impact: a.exposures().collect(),
            risk_profile: a.risk_profile,
            noise: a.noise,
        })
        .collect();

    Json(archetypes)
}

/// Classify a headline and rebalance the supplied portfolio
pub async fn analyze(
    State(state): State<AppState>,
    Json(request): Json<AnalysisRequest>,
) -> Result<Json<AnalysisReport>, ApiError> {
    let report = state
        .analyzer
        .analyze(&request)
        .await
        .map_err(|e| api_error(&e))?;

    tracing::info!(
        "Analysis {}: '{}' -> {} (severity {:.2}, triggered {})",
        report.id,
        report.headline,
        report.archetype,
        report.severity.value(),
        report.triggered
    );

    Ok(Json(report))
}
