use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Lifecycle of an uploaded resume: `uploaded → analyzing → completed | failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResumeStatus {
    Uploaded,
    Analyzing,
    Completed,
    Failed,
}

impl ResumeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResumeStatus::Uploaded => "uploaded",
            ResumeStatus::Analyzing => "analyzing",
            ResumeStatus::Completed => "completed",
            ResumeStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for ResumeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResumeStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "uploaded" => Ok(ResumeStatus::Uploaded),
            "analyzing" => Ok(ResumeStatus::Analyzing),
            "completed" => Ok(ResumeStatus::Completed),
            "failed" => Ok(ResumeStatus::Failed),
            other => Err(format!("unknown resume status '{other}'")),
        }
    }
}

/// One row per upload. Only `status` ever changes after insert.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ResumeRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub file_name: String,
    pub file_path: String,
    pub file_size: i64,
    pub upload_date: DateTime<Utc>,
    pub status: String,
}

/// Fields supplied by the upload path; id, timestamp and status are assigned on insert.
#[derive(Debug, Clone)]
pub struct NewResume {
    pub user_id: Uuid,
    pub file_name: String,
    pub file_path: String,
    pub file_size: i64,
}

/// Score and timestamp of the newest analysis, shown in the history list.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisSummary {
    pub overall_score: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub file_name: String,
    pub upload_date: DateTime<Utc>,
    pub status: String,
    pub latest_analysis: Option<AnalysisSummary>,
}
