//! Background execution of a built graph.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::{FutureExt, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use super::builder::BuiltAgent;
use crate::config::FlowSettings;
use crate::error::{AgentFlowError, Result};
use crate::events::AgentEventStream;
use crate::graph::{NodeContext, ResumePoint};
use crate::interrupt::RunPhase;
use crate::stream::{pipe, EventTranslator};

/// Spawn the run and return its event stream immediately.
///
/// The output pipe closes on every exit path: the task owns the only
/// writer, and a panic anywhere in the graph is caught and reported as an
/// internal error before the task ends.
pub(crate) fn spawn_run(
    built: BuiltAgent,
    resume: Option<ResumePoint>,
    settings: &FlowSettings,
    cancel: CancellationToken,
) -> AgentEventStream {
    let (writer, reader) = pipe(settings.event_buffer);
    let BuiltAgent {
        graph,
        return_directly_tools,
        checkpoint_id,
        ..
    } = built;
    let translator = Arc::new(EventTranslator::new(
        writer,
        checkpoint_id.clone(),
        Arc::new(return_directly_tools),
        settings.tool_stream_buffer,
    ));

    tokio::spawn(async move {
        let phase = RunPhase::start(resume.is_some());
        debug!(checkpoint_id = %checkpoint_id, phase = %phase, "run started");

        let ctx = NodeContext::new(checkpoint_id.clone(), translator.clone()).with_cancel(cancel);
        let outcome: Result<()> = match AssertUnwindSafe(graph.run(&ctx, resume))
            .catch_unwind()
            .await
        {
            Ok(result) => result.map(|_| ()),
            Err(panic) => {
                error!(
                    checkpoint_id = %checkpoint_id,
                    panic = %panic_message(panic.as_ref()),
                    "agent run panicked"
                );
                Err(AgentFlowError::Internal("internal error".to_string()))
            }
        };
        drop(ctx);

        let phase = phase.finish(&outcome);
        if !phase.keeps_checkpoint() {
            if let Some(store) = graph.checkpoint_store() {
                if let Err(err) = store.delete(&checkpoint_id).await {
                    warn!(checkpoint_id = %checkpoint_id, error = %err, "failed to delete checkpoint");
                }
            }
        }
        debug!(checkpoint_id = %checkpoint_id, phase = %phase, "run finished");
        translator.finish(outcome).await;
    });

    reader.boxed()
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
