use std::sync::Arc;

use crate::analysis::pipeline::Backends;
use crate::config::Config;
use crate::llm_client::CompletionClient;
use crate::repository::ResumeRepository;
use crate::storage::FileStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn ResumeRepository>,
    pub files: Arc<dyn FileStore>,
    pub llm: Arc<dyn CompletionClient>,
    pub config: Config,
}

impl AppState {
    /// Handles for one analysis run. Nothing is cached between runs.
    pub fn backends(&self) -> Backends {
        Backends {
            repo: self.repo.clone(),
            files: self.files.clone(),
            llm: self.llm.clone(),
        }
    }
}
