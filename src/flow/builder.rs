//! Assembles the per-request execution graph.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use super::nodes::{
    ChatModelNode, KnowledgePackNode, KnowledgeRetrieveNode, PersonaRenderNode,
    PromptTemplateNode, PromptVariablesNode, SuggestNode,
};
use super::pre_tools::PreToolsNode;
use super::react::ReactNode;
use crate::config::FlowSettings;
use crate::error::{AgentFlowError, Result};
use crate::graph::{CompiledGraph, GraphBuilder, NodeKey};
use crate::modality::{adapt_history, adapt_input};
use crate::models::ModelCapabilities;
use crate::prompt::{extract_placeholders, merge_variables, truncate_history, variable_keywords};
use crate::services::{Collaborators, VariableScope};
use crate::tools::ToolSet;
use crate::types::{AgentConfiguration, ExecutionRequest};

/// A compiled graph plus what the runner needs to know about it.
#[derive(Debug)]
pub struct BuiltAgent {
    pub graph: CompiledGraph,
    /// True exactly when the agent has tools.
    pub requires_checkpoint: bool,
    pub return_directly_tools: HashSet<String>,
    pub model_capabilities: ModelCapabilities,
    /// Fresh for a new run; the interrupt id when resuming.
    pub checkpoint_id: String,
}

/// Build the graph for one turn.
///
/// Every failure here is a build error returned before any streaming
/// starts: missing model, unsupported protocol, unresolvable tools, or
/// tools on a model without function calling.
pub async fn build(
    config: &AgentConfiguration,
    request: &ExecutionRequest,
    collaborators: &Collaborators,
    settings: &FlowSettings,
) -> Result<BuiltAgent> {
    let model_id = config
        .model
        .model_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AgentFlowError::ModelNotFound("agent has no model configured".to_string()))?;
    let meta = collaborators
        .models
        .get_model(model_id)
        .await?
        .ok_or_else(|| AgentFlowError::ModelNotFound(model_id.to_string()))?;
    if !collaborators.model_factory.supports_protocol(&meta.protocol) {
        return Err(AgentFlowError::UnsupportedProtocol(meta.protocol));
    }
    let model = collaborators
        .model_factory
        .create_chat_model(&meta.protocol, &meta.connection)
        .await?;

    let placeholders = extract_placeholders(&config.persona);
    let keywords = variable_keywords(&config.variables, &placeholders);
    let stored = if keywords.is_empty() {
        BTreeMap::new()
    } else {
        collaborators
            .variables
            .get_variables(&VariableScope::for_request(request), &keywords)
            .await?
    };
    let values = merge_variables(&config.variables, stored, &request.variables);

    let tools = ToolSet::assemble(config, request, collaborators).await?;
    let requires_checkpoint = !tools.is_empty();
    if requires_checkpoint && !meta.capabilities.supports_tools {
        return Err(AgentFlowError::FunctionCallUnsupported {
            model: model_id.to_string(),
            tool_count: tools.len(),
        });
    }
    let return_directly_tools = tools.return_directly_names();

    let rounds = config
        .model
        .history_rounds
        .unwrap_or(settings.default_history_rounds);
    let history = adapt_history(&truncate_history(&request.history, rounds), &meta.capabilities);
    let input = adapt_input(&request.input, &meta.capabilities);

    let checkpoint_id = request
        .resume_info
        .as_ref()
        .map(|resume| resume.interrupt_id.clone())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let mut graph = GraphBuilder::new();
    graph
        .add_node(
            NodeKey::PersonaRender,
            Arc::new(PersonaRenderNode {
                persona: config.persona.clone(),
                values: values.clone(),
            }),
        )?
        .add_node(NodeKey::PromptVariables, Arc::new(PromptVariablesNode { values }))?
        .add_node(
            NodeKey::KnowledgeRetrieve,
            Arc::new(KnowledgeRetrieveNode {
                service: collaborators.knowledge.clone(),
                settings: config.knowledge.clone(),
                query: input.text(),
                history: history.clone(),
            }),
        )?
        .add_node(NodeKey::KnowledgePack, Arc::new(KnowledgePackNode))?
        .add_node(
            NodeKey::PreTools,
            Arc::new(PreToolsNode {
                calls: request.pre_call_tools.clone(),
                user_id: request.user_id.clone(),
                identity: request.identity.clone(),
                plugins: collaborators.plugins.clone(),
                workflows: collaborators.workflows.clone(),
            }),
        )?
        .add_node(
            NodeKey::PromptTemplate,
            Arc::new(PromptTemplateNode {
                history,
                input: input.clone(),
            }),
        )?;

    let main = if requires_checkpoint {
        graph.add_node(
            NodeKey::React,
            Arc::new(ReactNode {
                model: model.clone(),
                model_ref: config.model.clone(),
                tools,
                max_iterations: settings.max_iterations,
                user_id: request.user_id.clone(),
                identity: request.identity.clone(),
                input: input.clone(),
            }),
        )?;
        NodeKey::React
    } else {
        graph.add_node(
            NodeKey::ChatModel,
            Arc::new(ChatModelNode {
                model: model.clone(),
                model_ref: config.model.clone(),
            }),
        )?;
        NodeKey::ChatModel
    };

    graph
        .add_edge(NodeKey::PersonaRender, NodeKey::PromptTemplate)
        .add_edge(NodeKey::PromptVariables, NodeKey::PromptTemplate)
        .add_edge(NodeKey::KnowledgeRetrieve, NodeKey::KnowledgePack)
        .add_edge(NodeKey::KnowledgePack, NodeKey::PromptTemplate)
        .add_edge(NodeKey::PreTools, NodeKey::PromptTemplate)
        .add_edge(NodeKey::PromptTemplate, main);

    if config.suggest_reply.is_enabled() {
        graph
            .add_node(
                NodeKey::Suggest,
                Arc::new(SuggestNode {
                    model,
                    config: config.suggest_reply.clone(),
                    input,
                }),
            )?
            .add_edge(main, NodeKey::Suggest);
    }

    let graph = graph.compile(requires_checkpoint.then(|| collaborators.checkpoints.clone()))?;
    debug!(
        agent_id = config.agent_id,
        checkpoint_id = %checkpoint_id,
        main = %main,
        requires_checkpoint,
        "compiled agent graph"
    );

    Ok(BuiltAgent {
        graph,
        requires_checkpoint,
        return_directly_tools,
        model_capabilities: meta.capabilities,
        checkpoint_id,
    })
}
