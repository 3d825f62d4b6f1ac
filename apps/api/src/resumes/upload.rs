use bytes::Bytes;
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::resume::{NewResume, ResumeRow};
use crate::repository::ResumeRepository;
use crate::storage::FileStore;

const PDF_CONTENT_TYPE: &str = "application/pdf";

/// A file pulled out of the multipart form.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

pub fn validate_upload(file: &UploadedFile, max_bytes: usize) -> Result<(), AppError> {
    if file.file_name.trim().is_empty() {
        return Err(AppError::Validation("File name cannot be empty".to_string()));
    }

    let is_pdf = match file.content_type.as_deref() {
        Some(ct) => ct == PDF_CONTENT_TYPE,
        None => file.file_name.to_lowercase().ends_with(".pdf"),
    };
    if !is_pdf {
        return Err(AppError::Validation("Please upload a PDF file".to_string()));
    }

    if file.data.len() > max_bytes {
        return Err(AppError::Validation(format!(
            "File size must be less than {}",
            format_size(max_bytes)
        )));
    }

    Ok(())
}

/// Human-readable limit: whole MB, else KB, else bytes.
fn format_size(bytes: usize) -> String {
    const KIB: usize = 1024;
    const MIB: usize = 1024 * KIB;
    if bytes >= MIB {
        format!("{}MB", bytes / MIB)
    } else if bytes >= KIB {
        format!("{}KB", bytes / KIB)
    } else {
        format!("{bytes} bytes")
    }
}

/// `{user_id}/{unix_millis}_{file_name}`
pub fn storage_key(user_id: Uuid, unix_millis: i64, file_name: &str) -> String {
    format!("{user_id}/{unix_millis}_{file_name}")
}

/// Writes the file to object storage and records an `uploaded` resume row.
pub async fn store_resume(
    files: &dyn FileStore,
    repo: &dyn ResumeRepository,
    user_id: Uuid,
    file: UploadedFile,
) -> Result<ResumeRow, AppError> {
    let file_path = storage_key(user_id, Utc::now().timestamp_millis(), &file.file_name);
    let file_size = file.data.len() as i64;

    files.put(&file_path, file.data, PDF_CONTENT_TYPE).await?;

    let resume = repo
        .create_resume(NewResume {
            user_id,
            file_name: file.file_name,
            file_path,
            file_size,
        })
        .await?;

    info!(
        "Stored resume {} for user {user_id} ({file_size} bytes)",
        resume.id
    );
    Ok(resume)
}
