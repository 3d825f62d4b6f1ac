//! Axum route handler for the analysis invocation.

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::Serialize;

use crate::analysis::pipeline::{run_analysis, AnalyzeRequest};
use crate::errors::AppError;
use crate::models::analysis::ResumeAnalysis;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub success: bool,
    pub analysis: ResumeAnalysis,
    pub fallback_used: bool,
}

/// POST /api/v1/analyze-resume
///
/// Body `{resumeId, filePath}`. Runs the full pipeline and returns the
/// analysis that was stored.
pub async fn handle_analyze(
    State(state): State<AppState>,
    body: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let Json(request) = body.map_err(|e| AppError::Validation(e.body_text()))?;

    let outcome = run_analysis(&state.backends(), &request).await?;

    Ok(Json(AnalyzeResponse {
        success: true,
        analysis: outcome.analysis,
        fallback_used: outcome.fallback_used,
    }))
}
