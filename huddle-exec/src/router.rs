use judge_client::{JudgeClient, JudgeConfig, JudgeSession, Submission};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, error, info};

use crate::{
    error::Error,
    primary::PrimaryEvaluator,
    report::{self, ReportBuilder},
    simulator::{dialect_for, simulate},
    types::{ExecutionRequest, ExecutionResult, Language, StatusKind},
};

const ENGINE_FAILURE: &str = "Internal error: the local engine stopped unexpectedly.";

/// Chooses the engine for a request and bounds the whole run by a deadline.
///
/// Remote judging is used only when a judge is configured and it supports
/// the requested language; everything else runs locally. A missing judge
/// is a routing decision, never an error.
#[derive(Clone)]
pub struct ExecutionRouter {
    judge: Option<JudgeSession>,
    primary: PrimaryEvaluator,
    deadline: Duration,
}

impl Default for ExecutionRouter {
    fn default() -> Self {
        Self::local()
    }
}

impl ExecutionRouter {
    pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(30);

    /// Router without a remote judge
    pub fn local() -> Self {
        Self {
            judge: None,
            primary: PrimaryEvaluator::new(),
            deadline: Self::DEFAULT_DEADLINE,
        }
    }

    /// Builds the HTTP judge client when a configuration is present
    pub fn from_config(config: Option<JudgeConfig>) -> Result<Self, Error> {
        let router = Self::local();
        match config {
            Some(config) => {
                let client = JudgeClient::new(config)?;
                Ok(router.with_judge(JudgeSession::new(Arc::new(client))))
            }
            None => Ok(router),
        }
    }

    pub fn with_judge(mut self, judge: JudgeSession) -> Self {
        self.judge = Some(judge);
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn with_primary(mut self, primary: PrimaryEvaluator) -> Self {
        self.primary = primary;
        self
    }

    pub fn is_remote(&self) -> bool {
        self.judge.is_some()
    }

    /// Runs the request to a terminal result. Never fails.
    pub async fn execute(&self, request: &ExecutionRequest) -> ExecutionResult {
        if request.code.trim().is_empty() {
            debug!("Empty code, nothing to execute");
            return report::empty_code();
        }

        let deadline = Instant::now() + self.deadline;
        let language = request.language;

        let result = match (&self.judge, language.judge_language_id()) {
            (Some(judge), Some(language_id)) => {
                info!("Routing {} run to the remote judge", language);
                let submission =
                    Submission::new(request.code.clone(), language_id, request.stdin_text());
                match timeout_at(deadline, judge.run(&submission, deadline)).await {
                    Ok(outcome) => report::format_outcome(language, &outcome),
                    Err(_) => report::timed_out(language, language.judge_banner()),
                }
            }
            _ => {
                info!("Running {} locally", language);
                self.run_local(request, deadline).await
            }
        };

        debug!("Run finished with status {}", result.status);
        result
    }

    async fn run_local(&self, request: &ExecutionRequest, deadline: Instant) -> ExecutionResult {
        let language = request.language;
        let primary = self.primary;
        let code = request.code.clone();
        let stdin = request.stdin.clone();
        let engine_deadline = deadline.into_std();

        let task = tokio::task::spawn_blocking(move || match dialect_for(language) {
            Some(dialect) => simulate(dialect, &code, &stdin),
            None => primary.evaluate(&code, &stdin, engine_deadline),
        });

        match timeout_at(deadline, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                error!("Local {} engine failed: {}", language, e);
                engine_failure(language)
            }
            Err(_) => report::timed_out(language, language.local_banner()),
        }
    }
}

fn engine_failure(language: Language) -> ExecutionResult {
    let report = ReportBuilder::new(language.local_banner(), language)
        .runtime_error("", ENGINE_FAILURE)
        .finish();
    ExecutionResult::new(StatusKind::RuntimeError, report)
}
