//! Database service boundary.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, PartialEq)]
pub struct ExecuteSqlRequest {
    pub user_id: String,
    pub agent_id: i64,
    pub table_id: i64,
    pub is_draft: bool,
    pub sql: String,
}

/// Rows returned by a query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SqlResult {
    pub columns: Vec<String>,
    pub rows: Vec<BTreeMap<String, serde_json::Value>>,
    #[serde(default)]
    pub rows_affected: u64,
}

#[async_trait]
pub trait DatabaseService: Send + Sync {
    async fn execute_sql(&self, request: ExecuteSqlRequest) -> Result<SqlResult>;
}
