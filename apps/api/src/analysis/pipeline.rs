//! The analysis pipeline for one resume:
//! status `analyzing` → download → AI call → parse → insert → status `completed`.
//!
//! Every step is a sequential await with no retry. A fatal error after the
//! resume id has been validated marks the resume `failed` before surfacing.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::analysis::parser::parse_analysis;
use crate::analysis::prompts::{build_user_prompt, ANALYSIS_SYSTEM, BASE64_PREVIEW_CHARS};
use crate::errors::AppError;
use crate::llm_client::CompletionClient;
use crate::models::analysis::ResumeAnalysis;
use crate::models::resume::ResumeStatus;
use crate::repository::ResumeRepository;
use crate::storage::FileStore;

/// Backend handles acquired for a single invocation.
#[derive(Clone)]
pub struct Backends {
    pub repo: Arc<dyn ResumeRepository>,
    pub files: Arc<dyn FileStore>,
    pub llm: Arc<dyn CompletionClient>,
}

/// Invocation body. Fields are optional so a missing one is reported as a
/// validation error instead of a deserialization failure.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    pub resume_id: Option<String>,
    pub file_path: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisOutcome {
    pub analysis_id: Uuid,
    pub resume_id: Uuid,
    pub analysis: ResumeAnalysis,
    pub fallback_used: bool,
}

/// Validates the request, then runs the pipeline.
/// No backend is touched when validation fails.
pub async fn run_analysis(
    backends: &Backends,
    request: &AnalyzeRequest,
) -> Result<AnalysisOutcome, AppError> {
    let (resume_id, file_path) = validate_request(request)?;
    analyze_resume(backends, resume_id, file_path).await
}

fn validate_request(request: &AnalyzeRequest) -> Result<(Uuid, &str), AppError> {
    let resume_id = request.resume_id.as_deref().filter(|s| !s.is_empty());
    let file_path = request.file_path.as_deref().filter(|s| !s.is_empty());

    let (Some(resume_id), Some(file_path)) = (resume_id, file_path) else {
        return Err(AppError::Validation(
            "Missing resumeId or filePath".to_string(),
        ));
    };

    let resume_id = Uuid::parse_str(resume_id)
        .map_err(|_| AppError::Validation(format!("resumeId '{resume_id}' is not a valid id")))?;

    Ok((resume_id, file_path))
}

/// Runs the pipeline for an already-validated resume id.
pub async fn analyze_resume(
    backends: &Backends,
    resume_id: Uuid,
    file_path: &str,
) -> Result<AnalysisOutcome, AppError> {
    match execute(backends, resume_id, file_path).await {
        Ok(outcome) => Ok(outcome),
        Err(e) => {
            error!("Analysis of resume {resume_id} failed: {e}");
            if let Err(mark_err) = backends
                .repo
                .set_status(resume_id, ResumeStatus::Failed)
                .await
            {
                warn!("Could not mark resume {resume_id} as failed: {mark_err}");
            }
            Err(e)
        }
    }
}

async fn execute(
    backends: &Backends,
    resume_id: Uuid,
    file_path: &str,
) -> Result<AnalysisOutcome, AppError> {
    backends
        .repo
        .set_status(resume_id, ResumeStatus::Analyzing)
        .await?;
    info!("Analyzing resume {resume_id} ({file_path})");

    let data = backends.files.get(file_path).await?;
    let encoded = STANDARD.encode(&data);

    let prompt = build_user_prompt(&encoded);
    if prompt.truncated {
        warn!(
            "Resume {resume_id}: sending {} of {} base64 chars to the model",
            BASE64_PREVIEW_CHARS,
            encoded.len()
        );
    }

    let text = backends.llm.complete(ANALYSIS_SYSTEM, &prompt.text).await?;
    let parsed = parse_analysis(&text);

    let user_id = backends
        .repo
        .find_owner(resume_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Resume not found".to_string()))?;

    let row = backends
        .repo
        .insert_analysis(resume_id, user_id, &parsed.analysis, parsed.fallback_used)
        .await?;

    backends
        .repo
        .set_status(resume_id, ResumeStatus::Completed)
        .await?;

    info!(
        "Resume {resume_id} analyzed: score={} fallback_used={}",
        parsed.analysis.overall_score, parsed.fallback_used
    );

    Ok(AnalysisOutcome {
        analysis_id: row.id,
        resume_id,
        analysis: parsed.analysis,
        fallback_used: parsed.fallback_used,
    })
}
