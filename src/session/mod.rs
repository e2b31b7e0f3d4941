//! One end-to-end run: engine, then transcript, then takeaways.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::RunConfig;
use crate::engine::{ConversationEngine, EngineState, EventSink, RunId};
use crate::error::{ParleyError, Result};
use crate::output::{self, OutputSink};
use crate::provider::ModelProvider;

/// Optional hooks for a session.
#[derive(Clone, Default)]
pub struct SessionOptions {
    pub event_sink: Option<EventSink>,
    pub cancel: Option<CancellationToken>,
}

impl SessionOptions {
    fn apply(self, mut engine: ConversationEngine) -> ConversationEngine {
        if let Some(sink) = self.event_sink {
            engine = engine.with_event_sink(sink);
        }
        if let Some(token) = self.cancel {
            engine = engine.with_cancellation(token);
        }
        engine
    }
}

/// What a session produced.
#[derive(Debug)]
pub struct SessionReport {
    pub run_id: RunId,
    pub state: EngineState,
    pub failed_during: Option<EngineState>,
    /// Turns in the history, excluding any seed.
    pub turns: usize,
    pub transcript_path: Option<PathBuf>,
    pub takeaways_path: Option<PathBuf>,
    pub takeaways: Option<String>,
    /// Why the run itself failed.
    pub error: Option<ParleyError>,
    /// Failure persisting the transcript; independent of `error`.
    pub transcript_error: Option<ParleyError>,
    pub takeaways_error: Option<ParleyError>,
}

impl SessionReport {
    /// The run reached `Done` and every artifact was written.
    pub fn is_success(&self) -> bool {
        self.state == EngineState::Done
            && self.transcript_error.is_none()
            && self.takeaways_error.is_none()
    }

    /// First failure of the session: the run's own error, then any write error.
    pub fn into_error(self) -> Option<ParleyError> {
        self.error
            .or(self.transcript_error)
            .or(self.takeaways_error)
    }
}

/// Build an engine over `provider` and run it, persisting artifacts to `sink`.
///
/// Configuration problems are returned as `Err` before any call is made. A
/// failed run or a failed write is still `Ok`: its error lives in the report.
pub async fn run_session(
    config: &RunConfig,
    provider: Arc<dyn ModelProvider>,
    sink: &dyn OutputSink,
    options: SessionOptions,
) -> Result<SessionReport> {
    let engine = ConversationEngine::from_run_config(config, provider)?;
    Ok(run_engine(options.apply(engine), &config.goal, sink).await)
}

/// Run a prepared engine and persist what it produced.
///
/// The transcript is written whenever at least a seed or one turn exists;
/// takeaways only when the run reached `Done`. Write failures are recorded
/// in the report next to the run's own outcome.
pub async fn run_engine(
    engine: ConversationEngine,
    goal: &str,
    sink: &dyn OutputSink,
) -> SessionReport {
    let started_at = Utc::now();
    let outcome = engine.run().await;
    let run_id = outcome.run_id;

    let transcript_name = output::transcript_file_name(goal, run_id, started_at);
    let (transcript_path, transcript_error) = if outcome.history.is_empty() {
        warn!(%run_id, "No conversation to save");
        (None, None)
    } else {
        persist(
            sink,
            run_id,
            &transcript_name,
            &outcome.history.render_as_text(),
        )
    };

    let (takeaways_path, takeaways_error) = match outcome.takeaways {
        Some(ref takeaways) if outcome.is_done() => persist(
            sink,
            run_id,
            &output::takeaways_file_name(&transcript_name),
            &output::takeaways_document(&transcript_name, takeaways),
        ),
        _ => (None, None),
    };

    info!(
        %run_id,
        state = %outcome.state,
        turns = outcome.history.len(),
        transcript = transcript_path.is_some(),
        takeaways = takeaways_path.is_some(),
        "Session finished"
    );

    SessionReport {
        run_id,
        state: outcome.state,
        failed_during: outcome.failed_during,
        turns: outcome.history.len(),
        transcript_path,
        takeaways_path,
        takeaways: outcome.takeaways,
        error: outcome.error,
        transcript_error,
        takeaways_error,
    }
}

fn persist(
    sink: &dyn OutputSink,
    run_id: RunId,
    file_name: &str,
    contents: &str,
) -> (Option<PathBuf>, Option<ParleyError>) {
    match sink.write_artifact(file_name, contents) {
        Ok(path) => (Some(path), None),
        Err(e) => {
            error!(%run_id, file = file_name, error = %e, "Failed to save artifact");
            (None, Some(e))
        }
    }
}
