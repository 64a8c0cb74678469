use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde_json::json;

use crate::error::{AgentFlowError, Result};
use crate::events::{AgentEvent, AgentEventStream};
use crate::flow::AgentFlow;
use crate::interrupt::{InterruptInfo, ToolInterrupt, WorkflowEventType, WorkflowInterruptEvent};
use crate::models::{ConnectionConfig, ModelCapabilities, ModelMeta, StaticModelManager};
use crate::provider::{ChatModel, ChatRequest, MessageStream, ModelFactory};
use crate::services::{
    AgentToolsRequest, Collaborators, DatabaseService, ExecuteSqlRequest, ExecuteToolOutcome,
    ExecuteToolRequest, InMemoryCheckpointStore, KnowledgeService, PluginService, PluginToolInfo,
    RetrieveRequest, RetrievedFragment, SqlResult, VariableScope, VariableService,
    WorkflowExecuteRequest, WorkflowOutcome, WorkflowPolicy, WorkflowService, WorkflowStream,
    WorkflowToolInfo,
};
use crate::types::{
    AgentConfiguration, ExecutionRequest, Message, ModelRef, PluginToolDecl, ToolCall,
    WorkflowToolDecl,
};

pub(crate) const MODEL_ID: &str = "stub-model";
pub(crate) const PLUGIN_TOOL: &str = "calendar_list";
pub(crate) const WORKFLOW_TOOL: &str = "booking";

/// One scripted model response.
pub(crate) enum Turn {
    Chunks(Vec<Message>),
    Panic,
}

pub(crate) fn text_turn(chunks: &[&str]) -> Turn {
    Turn::Chunks(chunks.iter().map(|chunk| Message::assistant(*chunk)).collect())
}

pub(crate) fn call_turn(calls: &[(&str, &str, &str)]) -> Turn {
    Turn::Chunks(vec![Message::assistant_tool_calls(
        calls
            .iter()
            .map(|(id, name, arguments)| ToolCall::new(*id, *name, *arguments))
            .collect(),
    )])
}

/// Answers requests from a fixed script, one turn per call.
pub(crate) struct ScriptedModel {
    turns: Mutex<VecDeque<Turn>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedModel {
    pub(crate) fn new(turns: Vec<Turn>) -> Self {
        Self {
            turns: Mutex::new(turns.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().expect("requests lock").clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    fn model_name(&self) -> &str {
        MODEL_ID
    }

    async fn stream(&self, request: &ChatRequest) -> Result<MessageStream> {
        self.requests
            .lock()
            .expect("requests lock")
            .push(request.clone());
        let turn = self.turns.lock().expect("turns lock").pop_front();
        match turn {
            Some(Turn::Chunks(chunks)) => Ok(stream::iter(chunks.into_iter().map(Ok)).boxed()),
            Some(Turn::Panic) => panic!("scripted model panic"),
            None => Err(AgentFlowError::Stream("model script exhausted".to_string())),
        }
    }
}

struct StubFactory {
    model: Arc<ScriptedModel>,
}

#[async_trait]
impl ModelFactory for StubFactory {
    fn supports_protocol(&self, protocol: &str) -> bool {
        protocol == "stub"
    }

    async fn create_chat_model(
        &self,
        _protocol: &str,
        _connection: &ConnectionConfig,
    ) -> Result<Arc<dyn ChatModel>> {
        let model: Arc<dyn ChatModel> = self.model.clone();
        Ok(model)
    }
}

/// One calendar tool; optionally demands OAuth until [`authorize`] is called.
///
/// [`authorize`]: StubPlugins::authorize
pub(crate) struct StubPlugins {
    tools: Vec<PluginToolInfo>,
    auth_pending: AtomicBool,
    calls: Mutex<Vec<ExecuteToolRequest>>,
}

impl StubPlugins {
    pub(crate) fn new(auth_pending: bool) -> Self {
        Self {
            tools: vec![
                PluginToolInfo {
                    plugin_id: 1,
                    tool_id: 10,
                    name: PLUGIN_TOOL.to_string(),
                    description: "List calendar events for a date".to_string(),
                    parameters: json!({
                        "type": "object",
                        "properties": {"date": {"type": "string"}},
                        "required": ["date"]
                    }),
                },
                PluginToolInfo {
                    plugin_id: 2,
                    tool_id: 20,
                    name: "weather_now".to_string(),
                    description: "Current weather".to_string(),
                    parameters: json!({"type": "object", "properties": {}}),
                },
            ],
            auth_pending: AtomicBool::new(auth_pending),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn authorize(&self) {
        self.auth_pending.store(false, Ordering::SeqCst);
    }

    pub(crate) fn calls(&self) -> Vec<ExecuteToolRequest> {
        self.calls.lock().expect("calls lock").clone()
    }
}

#[async_trait]
impl PluginService for StubPlugins {
    async fn agent_tools(&self, request: AgentToolsRequest) -> Result<Vec<PluginToolInfo>> {
        // Reverse order so callers cannot rely on service ordering.
        Ok(self
            .tools
            .iter()
            .rev()
            .filter(|info| {
                request
                    .tools
                    .iter()
                    .any(|decl| decl.plugin_id == info.plugin_id && decl.tool_id == info.tool_id)
            })
            .cloned()
            .collect())
    }

    async fn execute_tool(&self, request: ExecuteToolRequest) -> Result<ExecuteToolOutcome> {
        let tool_id = request.tool_id;
        self.calls.lock().expect("calls lock").push(request);
        if self.auth_pending.load(Ordering::SeqCst) {
            return Ok(ExecuteToolOutcome::AuthRequired {
                message: "log in at https://auth.example/calendar".to_string(),
            });
        }
        Ok(ExecuteToolOutcome::Completed {
            trimmed_response: format!("{{\"tool\":{tool_id},\"events\":2}}"),
        })
    }
}

/// A booking workflow that can stream chunks or suspend on a question.
pub(crate) struct StubWorkflows {
    tool: WorkflowToolInfo,
    chunks: Vec<String>,
    stream_error: Option<String>,
    interrupt: Option<WorkflowEventType>,
    requests: Mutex<Vec<WorkflowExecuteRequest>>,
}

impl StubWorkflows {
    pub(crate) fn new() -> Self {
        Self {
            tool: WorkflowToolInfo {
                workflow_id: 7,
                name: WORKFLOW_TOOL.to_string(),
                description: "Book a table".to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": {"city": {"type": "string"}}
                }),
                return_directly: false,
            },
            chunks: Vec::new(),
            stream_error: None,
            interrupt: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn streaming(mut self, chunks: &[&str]) -> Self {
        self.chunks = chunks.iter().map(|chunk| chunk.to_string()).collect();
        self
    }

    /// Stream `chunks`, then fail with a workflow service error.
    pub(crate) fn failing_after(mut self, chunks: &[&str], message: &str) -> Self {
        self.chunks = chunks.iter().map(|chunk| chunk.to_string()).collect();
        self.stream_error = Some(message.to_string());
        self
    }

    pub(crate) fn returning_directly(mut self) -> Self {
        self.tool.return_directly = true;
        self
    }

    pub(crate) fn asking(mut self, event_type: WorkflowEventType) -> Self {
        self.interrupt = Some(event_type);
        self
    }

    pub(crate) fn requests(&self) -> Vec<WorkflowExecuteRequest> {
        self.requests.lock().expect("requests lock").clone()
    }
}

#[async_trait]
impl WorkflowService for StubWorkflows {
    async fn workflow_tools(&self, policies: Vec<WorkflowPolicy>) -> Result<Vec<WorkflowToolInfo>> {
        Ok(policies
            .iter()
            .filter(|policy| policy.workflow_id == self.tool.workflow_id)
            .map(|_| self.tool.clone())
            .collect())
    }

    async fn sync_execute(&self, request: WorkflowExecuteRequest) -> Result<WorkflowOutcome> {
        self.requests
            .lock()
            .expect("requests lock")
            .push(request.clone());
        Ok(match (self.interrupt, &request.resume) {
            (_, Some(resume)) => WorkflowOutcome::Completed {
                output: format!("booked for {}", resume.resume_data),
            },
            (Some(event_type), None) => WorkflowOutcome::Interrupted(WorkflowInterruptEvent {
                tool_name: request.tool_name.clone(),
                execute_id: 501,
                event_id: 9,
                event_type,
                data: r#"{"question":"Which day?"}"#.to_string(),
            }),
            (None, None) => WorkflowOutcome::Completed {
                output: "booked".to_string(),
            },
        })
    }

    async fn stream_execute(&self, request: WorkflowExecuteRequest) -> Result<WorkflowStream> {
        if !self.chunks.is_empty() {
            self.requests.lock().expect("requests lock").push(request);
            let mut chunks: Vec<Result<String>> = self.chunks.iter().cloned().map(Ok).collect();
            if let Some(message) = &self.stream_error {
                chunks.push(Err(AgentFlowError::collaborator("workflow", message.clone())));
            }
            return Ok(stream::iter(chunks).boxed());
        }
        match self.sync_execute(request).await? {
            WorkflowOutcome::Completed { output } => Ok(stream::once(async move { Ok(output) }).boxed()),
            WorkflowOutcome::Interrupted(event) => Err(AgentFlowError::ToolInterrupt {
                tool_name: event.tool_name.clone(),
                interrupt: ToolInterrupt::Workflow(event),
            }),
        }
    }
}

#[derive(Default)]
pub(crate) struct StubKnowledge {
    fragments: Vec<RetrievedFragment>,
    failing: bool,
}

impl StubKnowledge {
    pub(crate) fn with_fragments(fragments: Vec<RetrievedFragment>) -> Self {
        Self {
            fragments,
            failing: false,
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            fragments: Vec::new(),
            failing: true,
        }
    }
}

#[async_trait]
impl KnowledgeService for StubKnowledge {
    async fn retrieve(&self, _request: RetrieveRequest) -> Result<Vec<RetrievedFragment>> {
        if self.failing {
            return Err(AgentFlowError::collaborator("knowledge", "index unavailable"));
        }
        Ok(self.fragments.clone())
    }
}

#[derive(Default)]
pub(crate) struct StubVariables {
    stored: Mutex<BTreeMap<String, String>>,
}

impl StubVariables {
    pub(crate) fn with(values: &[(&str, &str)]) -> Self {
        Self {
            stored: Mutex::new(
                values
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            ),
        }
    }
}

#[async_trait]
impl VariableService for StubVariables {
    async fn get_variables(
        &self,
        _scope: &VariableScope,
        keywords: &[String],
    ) -> Result<BTreeMap<String, String>> {
        let stored = self.stored.lock().expect("variables lock");
        Ok(keywords
            .iter()
            .filter_map(|key| stored.get(key).map(|value| (key.clone(), value.clone())))
            .collect())
    }

    async fn set_variables(
        &self,
        _scope: &VariableScope,
        values: BTreeMap<String, String>,
    ) -> Result<()> {
        self.stored.lock().expect("variables lock").extend(values);
        Ok(())
    }
}

struct StubDatabase;

#[async_trait]
impl DatabaseService for StubDatabase {
    async fn execute_sql(&self, _request: ExecuteSqlRequest) -> Result<SqlResult> {
        Ok(SqlResult {
            columns: vec!["n".to_string()],
            rows: vec![BTreeMap::from([("n".to_string(), json!(1))])],
            rows_affected: 0,
        })
    }
}

/// Stub collaborators plus the handles tests inspect afterwards.
pub(crate) struct Harness {
    pub(crate) model: Arc<ScriptedModel>,
    pub(crate) plugins: Arc<StubPlugins>,
    pub(crate) workflows: Arc<StubWorkflows>,
    pub(crate) knowledge: Arc<StubKnowledge>,
    pub(crate) variables: Arc<StubVariables>,
    pub(crate) checkpoints: Arc<InMemoryCheckpointStore>,
    pub(crate) capabilities: ModelCapabilities,
    pub(crate) protocol: String,
}

impl Harness {
    pub(crate) fn new(turns: Vec<Turn>) -> Self {
        Self {
            model: Arc::new(ScriptedModel::new(turns)),
            plugins: Arc::new(StubPlugins::new(false)),
            workflows: Arc::new(StubWorkflows::new()),
            knowledge: Arc::new(StubKnowledge::default()),
            variables: Arc::new(StubVariables::default()),
            checkpoints: Arc::new(InMemoryCheckpointStore::new()),
            capabilities: ModelCapabilities::text_with_tools(),
            protocol: "stub".to_string(),
        }
    }

    pub(crate) fn protocol(mut self, protocol: &str) -> Self {
        self.protocol = protocol.to_string();
        self
    }

    pub(crate) fn capabilities(mut self, capabilities: ModelCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub(crate) fn plugins(mut self, plugins: StubPlugins) -> Self {
        self.plugins = Arc::new(plugins);
        self
    }

    pub(crate) fn workflows(mut self, workflows: StubWorkflows) -> Self {
        self.workflows = Arc::new(workflows);
        self
    }

    pub(crate) fn knowledge(mut self, knowledge: StubKnowledge) -> Self {
        self.knowledge = Arc::new(knowledge);
        self
    }

    pub(crate) fn variables(mut self, variables: StubVariables) -> Self {
        self.variables = Arc::new(variables);
        self
    }

    pub(crate) fn flow(&self) -> AgentFlow {
        let models = StaticModelManager::new().with_model(ModelMeta {
            model_id: MODEL_ID.to_string(),
            protocol: self.protocol.clone(),
            capabilities: self.capabilities.clone(),
            connection: ConnectionConfig::default(),
        });
        let collaborators = Collaborators::builder()
            .models(Arc::new(models))
            .model_factory(Arc::new(StubFactory {
                model: self.model.clone(),
            }))
            .plugins(self.plugins.clone())
            .workflows(self.workflows.clone())
            .knowledge(self.knowledge.clone())
            .variables(self.variables.clone())
            .database(Arc::new(StubDatabase))
            .checkpoints(self.checkpoints.clone())
            .build();
        AgentFlow::new(collaborators)
    }
}

pub(crate) fn agent() -> AgentConfiguration {
    AgentConfiguration::builder()
        .agent_id(42)
        .persona("You are {{name}}, a concise assistant.")
        .model(ModelRef::new(MODEL_ID))
        .build()
}

/// [`agent`] with the calendar plugin and the booking workflow attached.
pub(crate) fn tool_agent() -> AgentConfiguration {
    let mut config = agent();
    config.plugins = vec![PluginToolDecl {
        plugin_id: 1,
        tool_id: 10,
    }];
    config.workflows = vec![WorkflowToolDecl {
        workflow_id: 7,
        plugin_id: 0,
    }];
    config
}

pub(crate) fn request(text: &str) -> ExecutionRequest {
    ExecutionRequest::builder()
        .user_id("user-1")
        .input(Message::user(text))
        .build()
}

/// Events reduced to comparable values, nested streams drained in place.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Seen {
    FunctionCall(Vec<String>),
    Tools(Vec<String>),
    Knowledge(usize),
    Answer(String),
    Direct(String),
    Suggest(String),
    Interrupt(InterruptInfo),
    Error(String),
}

pub(crate) async fn collect(mut events: AgentEventStream) -> Vec<Seen> {
    let mut seen = Vec::new();
    while let Some(item) = events.next().await {
        let event = match item {
            Ok(event) => event,
            Err(err) => {
                seen.push(Seen::Error(err.to_string()));
                continue;
            }
        };
        seen.push(match event {
            AgentEvent::FunctionCall(message) => Seen::FunctionCall(
                message
                    .tool_calls
                    .iter()
                    .map(|call| call.id.clone())
                    .collect(),
            ),
            AgentEvent::ToolsMessage(messages) => {
                Seen::Tools(messages.into_iter().map(|message| message.content).collect())
            }
            AgentEvent::Knowledge(fragments) => Seen::Knowledge(fragments.len()),
            AgentEvent::ChatModelAnswer(stream) => match drain(stream).await {
                Ok(text) => Seen::Answer(text),
                Err(err) => Seen::Error(err.to_string()),
            },
            AgentEvent::ToolAsChatModelStream(stream) => match drain(stream).await {
                Ok(text) => Seen::Direct(text),
                Err(err) => Seen::Error(err.to_string()),
            },
            AgentEvent::Suggest(message) => Seen::Suggest(message.content),
            AgentEvent::Interrupt(info) => Seen::Interrupt(info),
        });
    }
    seen
}

async fn drain(mut stream: MessageStream) -> Result<String> {
    let mut text = String::new();
    while let Some(chunk) = stream.next().await {
        text.push_str(&chunk?.content);
    }
    Ok(text)
}

pub(crate) fn interrupt_of(seen: &[Seen]) -> InterruptInfo {
    match seen.last() {
        Some(Seen::Interrupt(info)) => info.clone(),
        other => panic!("expected a trailing interrupt, got {other:?}"),
    }
}
