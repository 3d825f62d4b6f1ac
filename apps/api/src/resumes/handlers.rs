//! Axum route handlers for the Resume API.

use axum::{
    extract::{Multipart, Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::analysis::pipeline::analyze_resume;
use crate::errors::AppError;
use crate::models::analysis::{AnalysisRow, ResumeAnalysis};
use crate::models::resume::{HistoryEntry, ResumeRow};
use crate::resumes::upload::{store_resume, validate_upload, UploadedFile};
use crate::state::AppState;

const FILE_FIELD: &str = "file";

#[derive(Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub resume: ResumeRow,
    pub analysis: ResumeAnalysis,
    pub fallback_used: bool,
}

/// POST /api/v1/resumes?user_id=
///
/// Multipart upload with a single `file` field. Stores the PDF, records the
/// resume and runs the analysis before responding.
pub async fn handle_upload(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let mut upload: Option<UploadedFile> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(e.body_text()))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(String::from);
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?;
        upload = Some(UploadedFile {
            file_name,
            content_type,
            data,
        });
    }

    let upload = upload
        .ok_or_else(|| AppError::Validation(format!("Missing '{FILE_FIELD}' field")))?;
    validate_upload(&upload, state.config.max_upload_bytes)?;

    let resume = store_resume(
        state.files.as_ref(),
        state.repo.as_ref(),
        params.user_id,
        upload,
    )
    .await?;

    let outcome = analyze_resume(&state.backends(), resume.id, &resume.file_path).await?;

    Ok(Json(UploadResponse {
        resume,
        analysis: outcome.analysis,
        fallback_used: outcome.fallback_used,
    }))
}

/// GET /api/v1/resumes?user_id=
///
/// The user's uploads, newest first, with the latest score for each.
pub async fn handle_history(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<HistoryEntry>>, AppError> {
    Ok(Json(state.repo.list_history(params.user_id).await?))
}

/// GET /api/v1/resumes/:id/analysis?user_id=
pub async fn handle_get_analysis(
    State(state): State<AppState>,
    Path(resume_id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<AnalysisRow>, AppError> {
    let analysis = state
        .repo
        .latest_analysis(resume_id, params.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No analysis for resume {resume_id}")))?;
    Ok(Json(analysis))
}
