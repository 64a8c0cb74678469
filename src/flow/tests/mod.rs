use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use tokio_util::sync::CancellationToken;

use super::*;
use crate::config::FlowSettings;
use crate::graph::{NodeContext, NodeKey, NodeValue, RunObserver};
use crate::interrupt::{InterruptKind, ResumeInfo, WorkflowEventType};
use crate::models::ModelCapabilities;
use crate::services::RetrievedFragment;
use crate::stream::DIRECT_REPLY_ACK;
use crate::types::{
    ContentPart, DatabaseDecl, Message, ModelRef, PreCallTarget, PreCallTool, Role,
    SuggestReplyConfig, SuggestReplyMode, VariableDecl,
};

pub(crate) mod support;

use support::{
    agent, call_turn, collect, interrupt_of, request, text_turn, tool_agent, Harness, Seen,
    StubKnowledge, StubPlugins, StubVariables, StubWorkflows, Turn, PLUGIN_TOOL, WORKFLOW_TOOL,
};

fn resume_request(info: &crate::interrupt::InterruptInfo, data: &str) -> ExecutionRequest {
    ExecutionRequest::builder()
        .user_id("user-1")
        .input(Message::user(""))
        .resume_info(ResumeInfo::new(info, data))
        .build()
}

async fn execute_err(
    flow: &AgentFlow,
    config: &AgentConfiguration,
    request: ExecutionRequest,
) -> AgentFlowError {
    match flow.execute(config, request).await {
        Ok(_) => panic!("expected execute to fail"),
        Err(err) => err,
    }
}

#[tokio::test]
async fn agent_without_tools_streams_a_single_answer() {
    let harness = Harness::new(vec![text_turn(&["Hel", "lo"])]);
    let flow = harness.flow();

    let built = flow.build(&agent(), &request("hi")).await.expect("build");
    assert!(!built.requires_checkpoint);
    assert!(!built.graph.has_checkpoint_store());
    assert!(built.graph.contains(NodeKey::ChatModel));
    assert!(!built.graph.contains(NodeKey::React));

    let seen = collect(flow.execute(&agent(), request("hi")).await.expect("execute")).await;
    assert_eq!(seen, vec![Seen::Answer("Hello".to_string())]);
    assert!(harness.checkpoints.is_empty().await);
}

#[tokio::test]
async fn persona_variables_and_input_reach_the_model() {
    let harness = Harness::new(vec![text_turn(&["ok"])])
        .variables(StubVariables::with(&[("name", "Ada")]));
    collect(harness.flow().execute(&agent(), request("hi")).await.expect("execute")).await;

    let requests = harness.model.requests();
    let messages = &requests[0].messages;
    assert_eq!(messages[0].role, Role::System);
    assert!(messages[0].content.starts_with("You are Ada, a concise assistant."));
    assert!(messages[0].content.contains("Current time: "));
    assert_eq!(messages.last().map(Message::text), Some("hi".to_string()));
    assert!(requests[0].tools.is_empty());
}

#[tokio::test]
async fn tool_set_follows_declaration_order() {
    let harness = Harness::new(vec![text_turn(&["ok"])]);
    let mut config = tool_agent();
    config.plugins.push(crate::types::PluginToolDecl {
        plugin_id: 2,
        tool_id: 20,
    });
    config.databases = vec![DatabaseDecl {
        table_id: 3,
        table_name: "orders".to_string(),
        description: String::new(),
        fields: Vec::new(),
        prompt_disabled: false,
    }];
    config.variables = vec![VariableDecl {
        keyword: "city".to_string(),
        default_value: String::new(),
        description: String::new(),
        enabled: true,
        system: false,
    }];

    let built = harness.flow().build(&config, &request("hi")).await.expect("build");
    assert!(built.requires_checkpoint);
    assert!(built.graph.contains(NodeKey::React));

    collect(harness.flow().execute(&config, request("hi")).await.expect("execute")).await;
    let requests = harness.model.requests();
    let names: Vec<&str> = requests[0].tools.iter().map(|tool| tool.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            PLUGIN_TOOL,
            "weather_now",
            WORKFLOW_TOOL,
            "ts_orders_3",
            crate::tools::SET_VARIABLE_TOOL
        ]
    );
}

#[tokio::test]
async fn build_errors_are_returned_before_streaming() {
    let harness = Harness::new(Vec::new()).capabilities(ModelCapabilities::default());
    let err = execute_err(&harness.flow(), &tool_agent(), request("hi")).await;
    assert!(matches!(
        err,
        AgentFlowError::FunctionCallUnsupported { tool_count: 2, .. }
    ));
    assert!(err.is_build_error());

    let mut config = agent();
    config.model = ModelRef::default();
    let err = execute_err(&harness.flow(), &config, request("hi")).await;
    assert!(matches!(err, AgentFlowError::ModelNotFound(_)));

    config.model = ModelRef::new("unknown-model");
    let err = execute_err(&harness.flow(), &config, request("hi")).await;
    assert!(matches!(err, AgentFlowError::ModelNotFound(_)));

    let harness = Harness::new(Vec::new()).protocol("ark");
    let err = execute_err(&harness.flow(), &agent(), request("hi")).await;
    assert!(matches!(err, AgentFlowError::UnsupportedProtocol(protocol) if protocol == "ark"));
}

#[tokio::test]
async fn unsupported_modalities_become_text_markers() {
    let harness = Harness::new(vec![text_turn(&["ok"])]);
    let input = Message::user_parts(vec![
        ContentPart::text("hello"),
        ContentPart::image("http://x/img.png"),
    ]);
    let request = ExecutionRequest::builder()
        .user_id("user-1")
        .input(input.clone())
        .history(vec![input, Message::assistant("seen it")])
        .build();
    collect(harness.flow().execute(&agent(), request).await.expect("execute")).await;

    let messages = harness.model.requests()[0].messages.clone();
    let user_messages: Vec<&Message> =
        messages.iter().filter(|m| m.role == Role::User).collect();
    assert_eq!(user_messages.len(), 2);
    for message in user_messages {
        assert_eq!(message.content, "hello  this is a image:http://x/img.png");
        assert!(message.parts.is_empty());
    }
}

#[derive(Default)]
struct Recorder {
    log: Mutex<Vec<(bool, NodeKey)>>,
}

impl Recorder {
    fn position(&self, started: bool, node: NodeKey) -> usize {
        self.log
            .lock()
            .expect("log lock")
            .iter()
            .position(|entry| *entry == (started, node))
            .unwrap_or_else(|| panic!("{node} never {}", if started { "started" } else { "ended" }))
    }
}

#[async_trait]
impl RunObserver for Recorder {
    async fn on_node_start(&self, node: NodeKey) {
        self.log.lock().expect("log lock").push((true, node));
    }

    async fn on_node_end(&self, node: NodeKey, _output: &NodeValue) {
        self.log.lock().expect("log lock").push((false, node));
    }
}

#[tokio::test]
async fn prompt_template_waits_for_all_four_branches() {
    let harness = Harness::new(vec![text_turn(&["ok"])]);
    let built = harness.flow().build(&agent(), &request("hi")).await.expect("build");
    let recorder = Arc::new(Recorder::default());
    let ctx = NodeContext::new(built.checkpoint_id.clone(), recorder.clone());

    built.graph.run(&ctx, None).await.expect("run");

    let template = recorder.position(true, NodeKey::PromptTemplate);
    for branch in [
        NodeKey::PersonaRender,
        NodeKey::PromptVariables,
        NodeKey::KnowledgePack,
        NodeKey::PreTools,
    ] {
        assert!(recorder.position(false, branch) < template, "{branch} ended late");
    }
    assert!(
        recorder.position(false, NodeKey::KnowledgeRetrieve)
            < recorder.position(true, NodeKey::KnowledgePack)
    );
    assert!(
        recorder.position(false, NodeKey::PromptTemplate)
            < recorder.position(true, NodeKey::ChatModel)
    );
}

#[tokio::test]
async fn oauth_interrupt_round_trip_resumes_the_same_checkpoint() {
    let harness = Harness::new(vec![
        call_turn(&[("call_1", PLUGIN_TOOL, r#"{"date":"2024-05-01"}"#)]),
        text_turn(&["You have ", "2 events."]),
    ])
    .plugins(StubPlugins::new(true));
    let flow = harness.flow();
    let config = tool_agent();

    let seen = collect(flow.execute(&config, request("what's on?")).await.expect("execute")).await;
    let info = interrupt_of(&seen);
    assert_eq!(
        seen[..seen.len() - 1].to_vec(),
        vec![
            Seen::Answer(String::new()),
            Seen::FunctionCall(vec!["call_1".to_string()]),
            Seen::Tools(vec![DIRECT_REPLY_ACK.to_string()]),
        ]
    );
    assert_eq!(info.tool_call_id, "call_1");
    assert_eq!(info.kind, InterruptKind::OAuthPlugin);
    assert!(info.display_message().contains("auth.example"));
    assert!(harness.checkpoints.contains(&info.interrupt_id).await);

    harness.plugins.authorize();
    let resume = resume_request(&info, "");
    let built = flow.build(&config, &resume).await.expect("build");
    assert_eq!(built.checkpoint_id, info.interrupt_id);

    let seen = collect(flow.execute(&config, resume).await.expect("resume")).await;
    assert_eq!(
        seen,
        vec![
            Seen::FunctionCall(vec!["call_1".to_string()]),
            Seen::Tools(vec![r#"{"tool":10,"events":2}"#.to_string()]),
            Seen::Answer("You have 2 events.".to_string()),
        ]
    );
    assert!(!harness.checkpoints.contains(&info.interrupt_id).await);
    assert_eq!(harness.plugins.calls().len(), 2);

    let requests = harness.model.requests();
    assert_eq!(requests.len(), 2);
    let last = requests[1].messages.last().expect("tool result");
    assert_eq!(last.role, Role::Tool);
    assert_eq!(last.tool_call_id.as_deref(), Some("call_1"));
}

#[tokio::test]
async fn suspended_round_reports_finished_calls_only_after_resume() {
    let harness = Harness::new(vec![
        call_turn(&[
            ("call_1", PLUGIN_TOOL, r#"{"date":"2024-05-01"}"#),
            ("call_2", WORKFLOW_TOOL, "{}"),
        ]),
        text_turn(&["done"]),
    ])
    .plugins(StubPlugins::new(true));
    let flow = harness.flow();
    let config = tool_agent();

    let seen = collect(flow.execute(&config, request("plan my day")).await.expect("execute")).await;
    let info = interrupt_of(&seen);
    assert_eq!(
        seen[..seen.len() - 1].to_vec(),
        vec![
            Seen::Answer(String::new()),
            Seen::FunctionCall(vec!["call_1".to_string(), "call_2".to_string()]),
            Seen::Tools(vec![DIRECT_REPLY_ACK.to_string()]),
        ]
    );
    assert_eq!(info.tool_call_id, "call_1");

    harness.plugins.authorize();
    let seen = collect(flow.execute(&config, resume_request(&info, "")).await.expect("resume")).await;
    assert_eq!(
        seen,
        vec![
            Seen::FunctionCall(vec!["call_1".to_string(), "call_2".to_string()]),
            Seen::Tools(vec![
                r#"{"tool":10,"events":2}"#.to_string(),
                "booked".to_string(),
            ]),
            Seen::Answer("done".to_string()),
        ]
    );
    assert_eq!(harness.workflows.requests().len(), 1);
}

#[tokio::test]
async fn workflow_resume_threads_the_prior_event_and_new_input() {
    let harness = Harness::new(vec![
        call_turn(&[("call_1", WORKFLOW_TOOL, r#"{"city":"Oslo"}"#)]),
        text_turn(&["Booked."]),
    ])
    .workflows(StubWorkflows::new().asking(WorkflowEventType::Question));
    let flow = harness.flow();
    let config = tool_agent();

    let seen = collect(flow.execute(&config, request("book it")).await.expect("execute")).await;
    let info = interrupt_of(&seen);
    assert_eq!(info.kind, InterruptKind::WorkflowEvent);
    assert_eq!(info.display_message(), "Which day?");

    let seen = collect(
        flow.execute(&config, resume_request(&info, "monday"))
            .await
            .expect("resume"),
    )
    .await;
    assert!(seen.contains(&Seen::Tools(vec!["booked for monday".to_string()])));
    assert_eq!(seen.last(), Some(&Seen::Answer("Booked.".to_string())));

    let requests = harness.workflows.requests();
    let resumed = requests
        .last()
        .and_then(|request| request.resume.clone())
        .expect("resume options");
    assert_eq!(resumed.interrupt.execute_id, 501);
    assert_eq!(resumed.resume_data, "monday");
    assert_eq!(resumed.tool_call_id, "call_1");
}

#[tokio::test]
async fn resume_requests_are_validated_against_the_checkpoint() {
    let harness = Harness::new(vec![call_turn(&[(
        "call_1",
        PLUGIN_TOOL,
        r#"{"date":"2024-05-01"}"#,
    )])])
    .plugins(StubPlugins::new(true));
    let flow = harness.flow();
    let config = tool_agent();

    let unknown = crate::interrupt::InterruptInfo {
        interrupt_id: "missing".to_string(),
        tool_call_id: "call_1".to_string(),
        kind: InterruptKind::OAuthPlugin,
        payloads: Vec::new(),
    };
    let err = execute_err(&flow, &config, resume_request(&unknown, "")).await;
    assert!(matches!(err, AgentFlowError::CheckpointNotFound(_)));

    let seen = collect(flow.execute(&config, request("hi")).await.expect("execute")).await;
    let info = interrupt_of(&seen);

    let mut wrong_call = info.clone();
    wrong_call.tool_call_id = "call_9".to_string();
    let err = execute_err(&flow, &config, resume_request(&wrong_call, "")).await;
    assert!(matches!(err, AgentFlowError::ResumeMismatch(_)));

    let mut wrong_kind = info.clone();
    wrong_kind.kind = InterruptKind::WorkflowEvent;
    let err = execute_err(&flow, &config, resume_request(&wrong_kind, "")).await;
    assert!(matches!(err, AgentFlowError::ResumeMismatch(_)));

    let err = execute_err(&flow, &agent(), resume_request(&info, "")).await;
    assert!(matches!(err, AgentFlowError::ResumeMismatch(_)));
    assert!(harness.checkpoints.contains(&info.interrupt_id).await);
}

#[tokio::test]
async fn streamed_tool_chunks_concatenate_per_call() {
    let harness = Harness::new(vec![
        call_turn(&[("call_1", WORKFLOW_TOOL, "{}")]),
        text_turn(&["ok"]),
    ])
    .workflows(StubWorkflows::new().streaming(&["a", "b", "c"]));

    let seen = collect(
        harness
            .flow()
            .execute(&tool_agent(), request("go"))
            .await
            .expect("execute"),
    )
    .await;
    assert_eq!(
        seen,
        vec![
            Seen::Answer(String::new()),
            Seen::FunctionCall(vec!["call_1".to_string()]),
            Seen::Tools(vec!["abc".to_string()]),
            Seen::Answer("ok".to_string()),
        ]
    );
}

#[tokio::test]
async fn tool_failing_mid_stream_ends_the_run_without_partial_results() {
    let harness = Harness::new(vec![call_turn(&[("call_1", WORKFLOW_TOOL, "{}")])])
        .workflows(StubWorkflows::new().failing_after(&["a"], "boom"));

    let seen = collect(
        harness
            .flow()
            .execute(&tool_agent(), request("go"))
            .await
            .expect("execute"),
    )
    .await;
    assert_eq!(
        seen,
        vec![
            Seen::Answer(String::new()),
            Seen::FunctionCall(vec!["call_1".to_string()]),
            Seen::Error("workflow service error: boom".to_string()),
        ]
    );
    assert!(harness.checkpoints.is_empty().await);
}

#[tokio::test]
async fn return_directly_mirror_fails_when_the_tool_fails() {
    let harness = Harness::new(vec![call_turn(&[("call_1", WORKFLOW_TOOL, "{}")])]).workflows(
        StubWorkflows::new()
            .failing_after(&["x"], "boom")
            .returning_directly(),
    );

    let seen = collect(
        harness
            .flow()
            .execute(&tool_agent(), request("go"))
            .await
            .expect("execute"),
    )
    .await;
    assert_eq!(
        seen,
        vec![
            Seen::Answer(String::new()),
            Seen::FunctionCall(vec!["call_1".to_string()]),
            Seen::Error("Stream error: workflow service error: boom".to_string()),
            Seen::Error("workflow service error: boom".to_string()),
        ]
    );
}

#[tokio::test]
async fn return_directly_tool_ends_the_turn_with_a_mirror_stream() {
    let harness = Harness::new(vec![call_turn(&[("call_1", WORKFLOW_TOOL, "{}")])])
        .workflows(StubWorkflows::new().streaming(&["x", "y"]).returning_directly());
    let flow = harness.flow();

    let built = flow.build(&tool_agent(), &request("go")).await.expect("build");
    assert!(built.return_directly_tools.contains(WORKFLOW_TOOL));

    let seen = collect(flow.execute(&tool_agent(), request("go")).await.expect("execute")).await;
    assert_eq!(
        seen,
        vec![
            Seen::Answer(String::new()),
            Seen::FunctionCall(vec!["call_1".to_string()]),
            Seen::Direct("xy".to_string()),
            Seen::Tools(vec!["xy".to_string()]),
        ]
    );
    assert_eq!(harness.model.requests().len(), 1);
    assert!(harness.checkpoints.is_empty().await);
}

#[tokio::test]
async fn suggestions_follow_the_answer_only_when_enabled() {
    let harness = Harness::new(vec![text_turn(&["Hi"])]);
    let seen = collect(harness.flow().execute(&agent(), request("hi")).await.expect("execute")).await;
    assert_eq!(seen, vec![Seen::Answer("Hi".to_string())]);
    assert_eq!(harness.model.requests().len(), 1);

    let harness = Harness::new(vec![text_turn(&[r#"["a","b"]"#])]);
    let seen = collect(harness.flow().execute(&agent(), request("hi")).await.expect("execute")).await;
    assert_eq!(seen, vec![Seen::Answer(r#"["a","b"]"#.to_string())]);
    assert!(!seen.iter().any(|event| matches!(event, Seen::Suggest(_))));
    assert_eq!(harness.model.requests().len(), 1);

    let harness = Harness::new(vec![
        text_turn(&["Hi"]),
        text_turn(&[r#"["More?","#, r#""Weather?"]"#]),
    ]);
    let mut config = agent();
    config.suggest_reply = SuggestReplyConfig {
        mode: SuggestReplyMode::Default,
        custom_persona: None,
    };
    let seen = collect(harness.flow().execute(&config, request("hi")).await.expect("execute")).await;
    assert_eq!(
        seen,
        vec![
            Seen::Answer("Hi".to_string()),
            Seen::Suggest("More?".to_string()),
            Seen::Suggest("Weather?".to_string()),
        ]
    );
    let suggest_request = &harness.model.requests()[1];
    assert!(suggest_request.messages[1].content.contains("Assistant: Hi"));
}

#[tokio::test]
async fn invalid_tool_calls_are_fed_back_to_the_model() {
    let harness = Harness::new(vec![
        call_turn(&[("call_1", PLUGIN_TOOL, "{}"), ("call_2", "no_such_tool", "{}")]),
        text_turn(&["Which date?"]),
    ]);
    let seen = collect(
        harness
            .flow()
            .execute(&tool_agent(), request("what's on?"))
            .await
            .expect("execute"),
    )
    .await;

    assert!(harness.plugins.calls().is_empty());
    let Some(Seen::Tools(results)) = seen.get(2) else {
        panic!("expected tool results, got {seen:?}");
    };
    assert_eq!(results.len(), 2);
    assert!(results[0].starts_with("error: "));
    assert!(results[0].contains("date"));
    assert_eq!(results[1], "error: unknown tool 'no_such_tool'");
    assert_eq!(seen.last(), Some(&Seen::Answer("Which date?".to_string())));
}

#[tokio::test]
async fn variable_tool_writes_through_the_service() {
    let harness = Harness::new(vec![
        call_turn(&[(
            "call_1",
            crate::tools::SET_VARIABLE_TOOL,
            r#"{"keyword":"city","value":"Oslo"}"#,
        )]),
        text_turn(&["Noted."]),
        text_turn(&["Hello again"]),
    ]);
    let mut config = agent();
    config.persona = "Lives in {{city}}.".to_string();
    config.variables = vec![VariableDecl {
        keyword: "city".to_string(),
        default_value: "unknown".to_string(),
        description: "Home city".to_string(),
        enabled: true,
        system: false,
    }];
    let flow = harness.flow();
    collect(flow.execute(&config, request("I live in Oslo")).await.expect("execute")).await;

    collect(flow.execute(&config, request("hi")).await.expect("execute")).await;
    let requests = harness.model.requests();
    assert!(requests[0].messages[0].content.starts_with("Lives in unknown."));
    assert!(requests[2].messages[0].content.starts_with("Lives in Oslo."));
}

#[tokio::test]
async fn knowledge_is_reported_and_packed_into_the_prompt() {
    let harness = Harness::new(vec![text_turn(&["Paris."])]).knowledge(
        StubKnowledge::with_fragments(vec![
            RetrievedFragment::new("noise", 0.1),
            RetrievedFragment::new("Paris is the capital of France.", 0.9),
        ]),
    );
    let mut config = agent();
    config.knowledge.knowledge_ids = vec!["kb-1".to_string()];

    let seen = collect(
        harness
            .flow()
            .execute(&config, request("capital of France?"))
            .await
            .expect("execute"),
    )
    .await;
    assert_eq!(seen, vec![Seen::Knowledge(1), Seen::Answer("Paris.".to_string())]);
    let system = &harness.model.requests()[0].messages[0].content;
    assert!(system.contains("recall slice 1:\nParis is the capital of France."));
    assert!(!system.contains("noise"));
}

#[tokio::test]
async fn pre_call_tools_are_reported_and_injected() {
    let harness = Harness::new(vec![text_turn(&["Sunny."])]);
    let request = ExecutionRequest::builder()
        .user_id("user-1")
        .input(Message::user("weather?"))
        .pre_call_tools(vec![PreCallTool {
            call_id: Some("pre_1".to_string()),
            tool_name: "weather_now".to_string(),
            target: PreCallTarget::Plugin {
                plugin_id: 2,
                tool_id: 20,
            },
            arguments: "{}".to_string(),
        }])
        .build();

    let seen = collect(harness.flow().execute(&agent(), request).await.expect("execute")).await;
    assert_eq!(
        seen,
        vec![
            Seen::FunctionCall(vec!["pre_1".to_string()]),
            Seen::Tools(vec![r#"{"tool":20,"events":2}"#.to_string()]),
            Seen::Answer("Sunny.".to_string()),
        ]
    );
    let messages = harness.model.requests()[0].messages.clone();
    let roles: Vec<Role> = messages.iter().map(|m| m.role).collect();
    assert_eq!(roles, vec![Role::System, Role::Assistant, Role::Tool, Role::User]);
}

#[tokio::test]
async fn collaborator_failures_abort_the_run() {
    let harness = Harness::new(vec![text_turn(&["never"])]).knowledge(StubKnowledge::failing());
    let mut config = agent();
    config.knowledge.knowledge_ids = vec!["kb-1".to_string()];

    let seen = collect(harness.flow().execute(&config, request("hi")).await.expect("execute")).await;
    assert_eq!(
        seen,
        vec![Seen::Error("knowledge service error: index unavailable".to_string())]
    );
    assert!(harness.model.requests().is_empty());
}

#[tokio::test]
async fn panics_become_an_internal_error_and_close_the_stream() {
    let harness = Harness::new(vec![Turn::Panic]);
    let seen = collect(harness.flow().execute(&agent(), request("hi")).await.expect("execute")).await;
    assert_eq!(seen, vec![Seen::Error("Internal error: internal error".to_string())]);
}

#[tokio::test]
async fn canceled_runs_end_with_a_cancel_error() {
    let harness = Harness::new(vec![text_turn(&["never"])]);
    let cancel = CancellationToken::new();
    cancel.cancel();
    let events = harness
        .flow()
        .execute_with_cancel(&agent(), request("hi"), cancel)
        .await
        .expect("execute");
    assert_eq!(collect(events).await, vec![Seen::Error("Run canceled".to_string())]);
}

#[tokio::test]
async fn runaway_tool_loops_hit_the_iteration_limit() {
    let args = r#"{"date":"2024-05-01"}"#;
    let harness = Harness::new(vec![
        call_turn(&[("call_1", PLUGIN_TOOL, args)]),
        call_turn(&[("call_2", PLUGIN_TOOL, args)]),
    ]);
    let flow = harness
        .flow()
        .with_settings(FlowSettings::builder().max_iterations(1).build());

    let seen = collect(flow.execute(&tool_agent(), request("loop")).await.expect("execute")).await;
    match seen.last() {
        Some(Seen::Error(message)) => assert!(message.contains("after 1 iterations")),
        other => panic!("expected iteration error, got {other:?}"),
    }
    assert_eq!(harness.model.requests().len(), 1);
}
