//! All reads and writes against the `resumes` and `resume_analyses` tables.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::analysis::{AnalysisRow, ResumeAnalysis};
use crate::models::resume::{
    AnalysisSummary, HistoryEntry, NewResume, ResumeRow, ResumeStatus,
};

/// Persistence seam for the analysis pipeline and the resume endpoints.
///
/// Carried in `AppState` as `Arc<dyn ResumeRepository>`.
#[async_trait]
pub trait ResumeRepository: Send + Sync {
    /// Inserts a resume with status `uploaded`.
    async fn create_resume(&self, new: NewResume) -> Result<ResumeRow, AppError>;

    /// Updating a missing row is not an error.
    async fn set_status(&self, resume_id: Uuid, status: ResumeStatus) -> Result<(), AppError>;

    async fn find_owner(&self, resume_id: Uuid) -> Result<Option<Uuid>, AppError>;

    /// Appends an analysis row. There is no uniqueness check on `resume_id`.
    async fn insert_analysis(
        &self,
        resume_id: Uuid,
        user_id: Uuid,
        analysis: &ResumeAnalysis,
        fallback_used: bool,
    ) -> Result<AnalysisRow, AppError>;

    /// A user's resumes, newest upload first, each with its latest score.
    async fn list_history(&self, user_id: Uuid) -> Result<Vec<HistoryEntry>, AppError>;

    async fn latest_analysis(
        &self,
        resume_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<AnalysisRow>, AppError>;
}

pub struct PgResumeRepository {
    pool: PgPool,
}

impl PgResumeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct HistoryRow {
    id: Uuid,
    file_name: String,
    upload_date: DateTime<Utc>,
    status: String,
    overall_score: Option<i32>,
    analyzed_at: Option<DateTime<Utc>>,
}

impl From<HistoryRow> for HistoryEntry {
    fn from(row: HistoryRow) -> Self {
        let latest_analysis = match (row.overall_score, row.analyzed_at) {
            (Some(overall_score), Some(created_at)) => Some(AnalysisSummary {
                overall_score,
                created_at,
            }),
            _ => None,
        };
        HistoryEntry {
            id: row.id,
            file_name: row.file_name,
            upload_date: row.upload_date,
            status: row.status,
            latest_analysis,
        }
    }
}

#[async_trait]
impl ResumeRepository for PgResumeRepository {
    async fn create_resume(&self, new: NewResume) -> Result<ResumeRow, AppError> {
        let row = sqlx::query_as::<_, ResumeRow>(
            r#"
            INSERT INTO resumes (id, user_id, file_name, file_path, file_size, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new.user_id)
        .bind(&new.file_name)
        .bind(&new.file_path)
        .bind(new.file_size)
        .bind(ResumeStatus::Uploaded.as_str())
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn set_status(&self, resume_id: Uuid, status: ResumeStatus) -> Result<(), AppError> {
        sqlx::query("UPDATE resumes SET status = $1 WHERE id = $2")
            .bind(status.as_str())
            .bind(resume_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn find_owner(&self, resume_id: Uuid) -> Result<Option<Uuid>, AppError> {
        let owner = sqlx::query_scalar("SELECT user_id FROM resumes WHERE id = $1")
            .bind(resume_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(owner)
    }

    async fn insert_analysis(
        &self,
        resume_id: Uuid,
        user_id: Uuid,
        analysis: &ResumeAnalysis,
        fallback_used: bool,
    ) -> Result<AnalysisRow, AppError> {
        let row = sqlx::query_as::<_, AnalysisRow>(
            r#"
            INSERT INTO resume_analyses
                (id, resume_id, user_id, overall_score, strengths, weaknesses,
                 recommended_roles, skill_suggestions, keyword_analysis,
                 sections_analysis, fallback_used)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(resume_id)
        .bind(user_id)
        .bind(analysis.overall_score)
        .bind(&analysis.strengths)
        .bind(&analysis.weaknesses)
        .bind(Json(&analysis.recommended_roles))
        .bind(&analysis.skill_suggestions)
        .bind(Json(&analysis.keyword_analysis))
        .bind(json!({}))
        .bind(fallback_used)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list_history(&self, user_id: Uuid) -> Result<Vec<HistoryEntry>, AppError> {
        let rows = sqlx::query_as::<_, HistoryRow>(
            r#"
            SELECT r.id, r.file_name, r.upload_date, r.status,
                   a.overall_score, a.created_at AS analyzed_at
            FROM resumes r
            LEFT JOIN LATERAL (
                SELECT overall_score, created_at
                FROM resume_analyses
                WHERE resume_id = r.id
                ORDER BY created_at DESC
                LIMIT 1
            ) a ON true
            WHERE r.user_id = $1
            ORDER BY r.upload_date DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(HistoryEntry::from).collect())
    }

    async fn latest_analysis(
        &self,
        resume_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<AnalysisRow>, AppError> {
        let row = sqlx::query_as::<_, AnalysisRow>(
            r#"
            SELECT * FROM resume_analyses
            WHERE resume_id = $1 AND user_id = $2
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(resume_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history_row(score: Option<i32>) -> HistoryRow {
        HistoryRow {
            id: Uuid::new_v4(),
            file_name: "cv.pdf".into(),
            upload_date: Utc::now(),
            status: "completed".into(),
            overall_score: score,
            analyzed_at: score.map(|_| Utc::now()),
        }
    }

    #[test]
    fn test_history_row_with_analysis() {
        let entry = HistoryEntry::from(history_row(Some(82)));
        assert_eq!(entry.latest_analysis.map(|a| a.overall_score), Some(82));
    }

    #[test]
    fn test_history_row_without_analysis() {
        let entry = HistoryEntry::from(history_row(None));
        assert!(entry.latest_analysis.is_none());
    }
}
