//! External collaborators the flow depends on.
//!
//! Every service is a trait object injected through [`Collaborators`], so
//! hosts wire in their own plugin runtime, workflow engine, knowledge base,
//! variable store and database.

pub mod checkpoint;
pub mod database;
pub mod knowledge;
pub mod plugin;
pub mod variables;
pub mod workflow;

pub use checkpoint::{CheckpointStore, InMemoryCheckpointStore};
pub use database::{DatabaseService, ExecuteSqlRequest, SqlResult};
pub use knowledge::{KnowledgeService, RetrievalStrategy, RetrieveRequest, RetrievedFragment};
pub use plugin::{
    AgentToolsRequest, ExecuteScene, ExecuteToolOutcome, ExecuteToolRequest, PluginService,
    PluginToolInfo,
};
pub use variables::{VariableScope, VariableService};
pub use workflow::{
    WorkflowExecuteRequest, WorkflowOutcome, WorkflowPolicy, WorkflowService, WorkflowStream,
    WorkflowToolInfo,
};

use std::sync::Arc;

use bon::Builder;

use crate::models::ModelManager;
use crate::provider::ModelFactory;

/// All services a flow needs, injected by the host.
#[derive(Clone, Builder)]
pub struct Collaborators {
    pub models: Arc<dyn ModelManager>,
    pub model_factory: Arc<dyn ModelFactory>,
    pub plugins: Arc<dyn PluginService>,
    pub workflows: Arc<dyn WorkflowService>,
    pub knowledge: Arc<dyn KnowledgeService>,
    pub variables: Arc<dyn VariableService>,
    pub database: Arc<dyn DatabaseService>,
    #[builder(default = default_checkpoint_store())]
    pub checkpoints: Arc<dyn CheckpointStore>,
}

fn default_checkpoint_store() -> Arc<dyn CheckpointStore> {
    Arc::new(InMemoryCheckpointStore::new())
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}
