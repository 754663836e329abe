//! API handlers for the compliance server
//!
//! Provides REST endpoints for:
//! - Packaging validation (JSON report or plain text)
//! - Requirement preview (column sniffing inspection)
//! - Synonym table listing

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use compliance_engine::{ColumnMapping, RequirementSet, RequirementSource, SynonymFamily};
use shared_types::DetectionInput;

use crate::error::ServerError;
use crate::AppState;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Handler: GET /health
pub async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "compliance-server",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Validation request body
///
/// Both payloads are kept as raw JSON; the engine degrades malformed parts
/// to empty input instead of rejecting the request.
#[derive(Deserialize)]
pub struct ValidateRequest {
    #[serde(default)]
    pub requirements: Value,

    #[serde(default)]
    pub detections: Value,

    /// Pin column roles to specific headers (tabular requirements only)
    pub columns: Option<ColumnMapping>,
}

#[derive(Deserialize, Default)]
pub struct ValidateParams {
    /// "json" (default) or "text"
    pub format: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Json,
    Text,
}

impl ReportFormat {
    pub fn parse(format: Option<&str>) -> Result<Self, ServerError> {
        match format.map(|f| f.trim().to_lowercase()).as_deref() {
            None | Some("") | Some("json") => Ok(ReportFormat::Json),
            Some("text") | Some("txt") => Ok(ReportFormat::Text),
            Some(other) => Err(ServerError::InvalidRequest(format!(
                "Unknown report format '{}'. Use 'json' or 'text'.",
                other
            ))),
        }
    }
}

/// Handler: POST /api/validate
pub async fn handle_validate(
    State(state): State<AppState>,
    Query(params): Query<ValidateParams>,
    Json(req): Json<ValidateRequest>,
) -> Result<Response, ServerError> {
    let format = ReportFormat::parse(params.format.as_deref())?;
    let engine = Arc::clone(&state.engine);

    let evaluation = run_with_timeout(state.timeout_ms, move || {
        let source = RequirementSource::from_value(&req.requirements);
        let requirements = engine.build_requirements(&source, req.columns.as_ref());
        let detections = DetectionInput::from_value(&req.detections);
        debug!(
            requirements = requirements.len(),
            text_regions = detections.text_regions.len(),
            symbols = detections.symbols.len(),
            "Validating packaging"
        );
        engine.evaluate(&requirements, &detections)
    })
    .await?;

    info!(
        "Validation: compliant={}, overall={:.3}",
        evaluation.score.passed, evaluation.score.overall
    );

    Ok(match format {
        ReportFormat::Json => Json(evaluation.report()).into_response(),
        ReportFormat::Text => evaluation.to_text().into_response(),
    })
}

/// Requirement preview request body
#[derive(Deserialize)]
pub struct PreviewRequest {
    #[serde(default)]
    pub requirements: Value,

    pub columns: Option<ColumnMapping>,
}

/// Requirement preview response
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResponse {
    pub success: bool,
    /// "tabular", "structured" or "empty"
    pub source: &'static str,
    /// Column mapping used for tabular sources
    pub columns: Option<ColumnMapping>,
    pub requirements: RequirementSet,
    pub count: usize,
}

/// Handler: POST /api/requirements/preview
pub async fn handle_preview_requirements(
    State(state): State<AppState>,
    Json(req): Json<PreviewRequest>,
) -> Result<Json<PreviewResponse>, ServerError> {
    let engine = Arc::clone(&state.engine);

    run_with_timeout(state.timeout_ms, move || {
        let source = RequirementSource::from_value(&req.requirements);
        let columns = source.column_mapping(req.columns.as_ref());
        let requirements = engine.build_requirements(&source, req.columns.as_ref());
        let count = requirements.len();

        Json(PreviewResponse {
            success: true,
            source: source_label(&source),
            columns,
            requirements,
            count,
        })
    })
    .await
}

fn source_label(source: &RequirementSource) -> &'static str {
    match source {
        RequirementSource::Tabular(_) => "tabular",
        RequirementSource::Structured(_) => "structured",
        RequirementSource::Empty => "empty",
    }
}

/// Synonym table response
#[derive(Serialize)]
pub struct SynonymsResponse {
    pub success: bool,
    pub families: Vec<SynonymFamily>,
    pub count: usize,
}

/// Handler: GET /api/synonyms
pub async fn handle_list_synonyms(State(state): State<AppState>) -> Json<SynonymsResponse> {
    let families = state.engine.synonyms().families().to_vec();
    let count = families.len();

    Json(SynonymsResponse {
        success: true,
        families,
        count,
    })
}

/// Run CPU-bound engine work off the async runtime, bounded by `timeout_ms`
pub async fn run_with_timeout<T, F>(timeout_ms: u64, task: F) -> Result<T, ServerError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let result = tokio::time::timeout(
        Duration::from_millis(timeout_ms),
        tokio::task::spawn_blocking(task),
    )
    .await;

    match result {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(join_error)) => Err(ServerError::Internal(format!(
            "Validation task panicked: {}",
            join_error
        ))),
        Err(_timeout) => Err(ServerError::Timeout(timeout_ms)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_endpoint() {
        let response = handle_health().await;
        assert_eq!(response.status, "healthy");
        assert_eq!(response.service, "compliance-server");
    }

    #[test]
    fn test_report_format_parsing() {
        assert_eq!(ReportFormat::parse(None).unwrap(), ReportFormat::Json);
        assert_eq!(ReportFormat::parse(Some("JSON")).unwrap(), ReportFormat::Json);
        assert_eq!(ReportFormat::parse(Some("text")).unwrap(), ReportFormat::Text);
        assert!(matches!(
            ReportFormat::parse(Some("pdf")),
            Err(ServerError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_run_with_timeout_returns_value() {
        let value = run_with_timeout(1000, || 21 * 2).await.unwrap();
        assert_eq!(value, 42);
    }

    #[tokio::test]
    async fn test_run_with_timeout_expires() {
        let result = run_with_timeout(10, || std::thread::sleep(Duration::from_millis(300))).await;
        assert!(matches!(result, Err(ServerError::Timeout(10))));
    }

    #[tokio::test]
    async fn test_run_with_timeout_reports_panics() {
        let result: Result<(), ServerError> = run_with_timeout(1000, || panic!("boom")).await;
        assert!(matches!(result, Err(ServerError::Internal(_))));
    }
}
