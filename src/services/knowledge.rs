//! Knowledge service boundary.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::{KnowledgeSettings, Message, SearchType};

/// How the knowledge service should search.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalStrategy {
    pub top_k: usize,
    pub min_score: f64,
    pub search_type: SearchType,
    pub use_rewrite: bool,
    pub use_rerank: bool,
    pub use_nl2sql: bool,
}

impl From<&KnowledgeSettings> for RetrievalStrategy {
    fn from(settings: &KnowledgeSettings) -> Self {
        Self {
            top_k: settings.top_k,
            min_score: settings.min_score,
            search_type: settings.search_type,
            use_rewrite: settings.use_rewrite,
            use_rerank: settings.use_rerank,
            use_nl2sql: settings.use_nl2sql,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RetrieveRequest {
    pub query: String,
    pub history: Vec<Message>,
    pub knowledge_ids: Vec<String>,
    pub strategy: RetrievalStrategy,
}

/// One recalled slice of knowledge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedFragment {
    pub content: String,
    pub score: f64,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

impl RetrievedFragment {
    pub fn new(content: impl Into<String>, score: f64) -> Self {
        Self {
            content: content.into(),
            score,
            metadata: BTreeMap::new(),
        }
    }
}

#[async_trait]
pub trait KnowledgeService: Send + Sync {
    async fn retrieve(&self, request: RetrieveRequest) -> Result<Vec<RetrievedFragment>>;
}
