//! In-memory backends for tests. Each fake records what it was asked to do.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use sqlx::types::Json;
use uuid::Uuid;

use crate::analysis::pipeline::Backends;
use crate::config::Config;
use crate::errors::AppError;
use crate::llm_client::{CompletionClient, LlmError};
use crate::models::analysis::{AnalysisRow, ResumeAnalysis};
use crate::models::resume::{
    AnalysisSummary, HistoryEntry, NewResume, ResumeRow, ResumeStatus,
};
use crate::repository::ResumeRepository;
use crate::state::AppState;
use crate::storage::{FileStore, StorageError};

pub const VALID_ANALYSIS_JSON: &str = r#"{
  "overall_score": 85,
  "strengths": ["Quantified achievements", "Clean layout"],
  "weaknesses": ["No summary section"],
  "recommended_roles": [
    {"title": "Backend Engineer", "match_score": 88, "reason": "Strong Rust and SQL experience"}
  ],
  "skill_suggestions": ["Kubernetes", "Terraform"],
  "keyword_analysis": {"present": ["Rust", "PostgreSQL"], "missing": ["AWS"]}
}"#;

pub fn test_config() -> Config {
    Config {
        database_url: "postgres://localhost/test".into(),
        s3_bucket: "resumes".into(),
        s3_endpoint: "http://localhost:9000".into(),
        aws_access_key_id: "test".into(),
        aws_secret_access_key: "test".into(),
        ai_api_key: "test".into(),
        ai_base_url: "http://localhost:1".into(),
        max_upload_bytes: 1024,
        port: 0,
        rust_log: "debug".into(),
    }
}

#[derive(Default)]
struct RepoState {
    resumes: HashMap<Uuid, ResumeRow>,
    analyses: Vec<AnalysisRow>,
    status_log: Vec<(Uuid, ResumeStatus)>,
    writes: usize,
}

#[derive(Default)]
pub struct InMemoryRepository {
    state: Mutex<RepoState>,
}

impl InMemoryRepository {
    pub fn insert_resume(&self, row: ResumeRow) {
        let mut state = self.state.lock().unwrap();
        if let Ok(status) = row.status.parse() {
            state.status_log.push((row.id, status));
        }
        state.resumes.insert(row.id, row);
    }

    pub fn analyses(&self) -> Vec<AnalysisRow> {
        self.state.lock().unwrap().analyses.clone()
    }

    pub fn status_of(&self, resume_id: Uuid) -> Option<ResumeStatus> {
        let state = self.state.lock().unwrap();
        state
            .resumes
            .get(&resume_id)
            .and_then(|r| r.status.parse().ok())
    }

    /// Every status the resume has held, starting with its insert status.
    pub fn status_history(&self, resume_id: Uuid) -> Vec<ResumeStatus> {
        let state = self.state.lock().unwrap();
        state
            .status_log
            .iter()
            .filter(|(id, _)| *id == resume_id)
            .map(|(_, s)| *s)
            .collect()
    }

    pub fn write_count(&self) -> usize {
        self.state.lock().unwrap().writes
    }
}

#[async_trait]
impl ResumeRepository for InMemoryRepository {
    async fn create_resume(&self, new: NewResume) -> Result<ResumeRow, AppError> {
        let row = ResumeRow {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            file_name: new.file_name,
            file_path: new.file_path,
            file_size: new.file_size,
            upload_date: Utc::now(),
            status: ResumeStatus::Uploaded.to_string(),
        };
        self.insert_resume(row.clone());
        self.state.lock().unwrap().writes += 1;
        Ok(row)
    }

    async fn set_status(&self, resume_id: Uuid, status: ResumeStatus) -> Result<(), AppError> {
        let mut guard = self.state.lock().unwrap();
        let state = &mut *guard;
        state.writes += 1;
        if let Some(row) = state.resumes.get_mut(&resume_id) {
            row.status = status.to_string();
            state.status_log.push((resume_id, status));
        }
        Ok(())
    }

    async fn find_owner(&self, resume_id: Uuid) -> Result<Option<Uuid>, AppError> {
        let state = self.state.lock().unwrap();
        Ok(state.resumes.get(&resume_id).map(|r| r.user_id))
    }

    async fn insert_analysis(
        &self,
        resume_id: Uuid,
        user_id: Uuid,
        analysis: &ResumeAnalysis,
        fallback_used: bool,
    ) -> Result<AnalysisRow, AppError> {
        let row = AnalysisRow {
            id: Uuid::new_v4(),
            resume_id,
            user_id,
            overall_score: analysis.overall_score,
            strengths: analysis.strengths.clone(),
            weaknesses: analysis.weaknesses.clone(),
            recommended_roles: Json(analysis.recommended_roles.clone()),
            skill_suggestions: analysis.skill_suggestions.clone(),
            keyword_analysis: Json(analysis.keyword_analysis.clone()),
            sections_analysis: serde_json::json!({}),
            fallback_used,
            created_at: Utc::now(),
        };
        let mut state = self.state.lock().unwrap();
        state.writes += 1;
        state.analyses.push(row.clone());
        Ok(row)
    }

    async fn list_history(&self, user_id: Uuid) -> Result<Vec<HistoryEntry>, AppError> {
        let state = self.state.lock().unwrap();
        let mut resumes: Vec<_> = state
            .resumes
            .values()
            .filter(|r| r.user_id == user_id)
            .collect();
        resumes.sort_by(|a, b| b.upload_date.cmp(&a.upload_date));

        Ok(resumes
            .into_iter()
            .map(|r| HistoryEntry {
                id: r.id,
                file_name: r.file_name.clone(),
                upload_date: r.upload_date,
                status: r.status.clone(),
                latest_analysis: state
                    .analyses
                    .iter()
                    .filter(|a| a.resume_id == r.id)
                    .max_by_key(|a| a.created_at)
                    .map(|a| AnalysisSummary {
                        overall_score: a.overall_score,
                        created_at: a.created_at,
                    }),
            })
            .collect())
    }

    async fn latest_analysis(
        &self,
        resume_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<AnalysisRow>, AppError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .analyses
            .iter()
            .filter(|a| a.resume_id == resume_id && a.user_id == user_id)
            .max_by_key(|a| a.created_at)
            .cloned())
    }
}

#[derive(Default)]
pub struct InMemoryFileStore {
    files: Mutex<HashMap<String, Bytes>>,
    gets: AtomicUsize,
}

impl InMemoryFileStore {
    pub fn insert(&self, key: &str, data: &[u8]) {
        self.files
            .lock()
            .unwrap()
            .insert(key.to_string(), Bytes::copy_from_slice(data));
    }

    pub fn keys(&self) -> Vec<String> {
        self.files.lock().unwrap().keys().cloned().collect()
    }

    pub fn get_count(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FileStore for InMemoryFileStore {
    async fn put(&self, key: &str, body: Bytes, _content_type: &str) -> Result<(), StorageError> {
        self.files.lock().unwrap().insert(key.to_string(), body);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Bytes, StorageError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.files
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }
}

/// What the fake AI gateway answers with.
#[derive(Clone)]
pub enum ScriptedReply {
    Text(String),
    Status(u16),
}

pub struct ScriptedCompletion {
    reply: ScriptedReply,
    prompts: Mutex<Vec<(String, String)>>,
}

impl ScriptedCompletion {
    pub fn new(reply: ScriptedReply) -> Self {
        Self {
            reply,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// (system, user) pairs in call order.
    pub fn prompts(&self) -> Vec<(String, String)> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionClient for ScriptedCompletion {
    async fn complete(&self, system: &str, user: &str) -> Result<String, LlmError> {
        self.prompts
            .lock()
            .unwrap()
            .push((system.to_string(), user.to_string()));
        tokio::task::yield_now().await;
        match &self.reply {
            ScriptedReply::Text(text) => Ok(text.clone()),
            ScriptedReply::Status(status) => Err(LlmError::Api {
                status: *status,
                message: "scripted failure".to_string(),
            }),
        }
    }
}

pub struct Harness {
    pub repo: Arc<InMemoryRepository>,
    pub files: Arc<InMemoryFileStore>,
    pub llm: Arc<ScriptedCompletion>,
}

impl Harness {
    pub fn new(reply: ScriptedReply) -> Self {
        Self {
            repo: Arc::new(InMemoryRepository::default()),
            files: Arc::new(InMemoryFileStore::default()),
            llm: Arc::new(ScriptedCompletion::new(reply)),
        }
    }

    pub fn backends(&self) -> Backends {
        Backends {
            repo: self.repo.clone(),
            files: self.files.clone(),
            llm: self.llm.clone(),
        }
    }

    pub fn state(&self) -> AppState {
        AppState {
            repo: self.repo.clone(),
            files: self.files.clone(),
            llm: self.llm.clone(),
            config: test_config(),
        }
    }

    /// Stores a file and an `uploaded` resume row pointing at it.
    pub async fn seed_resume(&self, path: &str, data: &[u8]) -> ResumeRow {
        self.seed_resume_for(Uuid::new_v4(), path, data).await
    }

    pub async fn seed_resume_for(&self, user_id: Uuid, path: &str, data: &[u8]) -> ResumeRow {
        self.files.insert(path, data);
        let row = ResumeRow {
            id: Uuid::new_v4(),
            user_id,
            file_name: path.rsplit('/').next().unwrap_or(path).to_string(),
            file_path: path.to_string(),
            file_size: data.len() as i64,
            upload_date: Utc::now(),
            status: ResumeStatus::Uploaded.to_string(),
        };
        self.repo.insert_resume(row.clone());
        row
    }
}
