//! Variable storage boundary.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::ExecutionRequest;

/// Identifies whose variables are read or written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableScope {
    pub user_id: String,
    pub agent_id: i64,
    pub connector_id: i64,
    pub is_draft: bool,
}

impl VariableScope {
    pub fn for_request(request: &ExecutionRequest) -> Self {
        Self {
            user_id: request.user_id.clone(),
            agent_id: request.identity.agent_id,
            connector_id: request.identity.connector_id,
            is_draft: request.identity.is_draft,
        }
    }
}

#[async_trait]
pub trait VariableService: Send + Sync {
    /// Current values for the given keywords. Keywords without a stored
    /// value are omitted.
    async fn get_variables(
        &self,
        scope: &VariableScope,
        keywords: &[String],
    ) -> Result<BTreeMap<String, String>>;

    async fn set_variables(
        &self,
        scope: &VariableScope,
        values: BTreeMap<String, String>,
    ) -> Result<()>;
}
