use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout_at, Instant};
use tracing::{debug, warn};

use crate::{
    client::JudgeApi,
    types::{JudgeOutcome, Submission},
};

/// Maximum number of status polls per submission
pub const MAX_POLL_ATTEMPTS: u32 = 10;

const BASE_DELAY_SECS: f64 = 1.0;
const BACKOFF_FACTOR: f64 = 1.5;

/// Wait before poll `attempt` (0-based): `1000 * 1.5^attempt` ms
pub fn poll_delay(attempt: u32) -> Duration {
    Duration::from_secs_f64(BASE_DELAY_SECS * BACKOFF_FACTOR.powi(attempt as i32))
}

#[derive(Debug)]
enum SessionState {
    Submitting,
    Polling { token: String, attempt: u32 },
    Done(JudgeOutcome),
}

/// Submit-then-poll protocol against a judging service.
///
/// Every suspension point (submit, backoff wait, poll) is bounded by the
/// caller's deadline; once it passes the session ends with
/// [`JudgeOutcome::TimedOut`]. Errors never escape: every path ends in a
/// classified outcome.
#[derive(Clone)]
pub struct JudgeSession {
    api: Arc<dyn JudgeApi>,
    max_attempts: u32,
}

impl JudgeSession {
    pub fn new(api: Arc<dyn JudgeApi>) -> Self {
        Self {
            api,
            max_attempts: MAX_POLL_ATTEMPTS,
        }
    }

    pub async fn run(&self, submission: &Submission, deadline: Instant) -> JudgeOutcome {
        let mut state = SessionState::Submitting;
        loop {
            state = match state {
                SessionState::Submitting => self.submit(submission, deadline).await,
                SessionState::Polling { attempt, .. } if attempt >= self.max_attempts => {
                    warn!("No verdict after {} polls", attempt);
                    SessionState::Done(JudgeOutcome::TimedOut)
                }
                SessionState::Polling { token, attempt } => {
                    self.poll(token, attempt, deadline).await
                }
                SessionState::Done(outcome) => return outcome,
            };
        }
    }

    async fn submit(&self, submission: &Submission, deadline: Instant) -> SessionState {
        match timeout_at(deadline, self.api.submit(submission)).await {
            Err(_) => SessionState::Done(JudgeOutcome::TimedOut),
            Ok(Err(e)) => {
                warn!("Submission failed: {}", e);
                SessionState::Done(JudgeOutcome::Transport(e.to_string()))
            }
            Ok(Ok(token)) => SessionState::Polling { token, attempt: 0 },
        }
    }

    async fn poll(&self, token: String, attempt: u32, deadline: Instant) -> SessionState {
        if timeout_at(deadline, sleep(poll_delay(attempt))).await.is_err() {
            return SessionState::Done(JudgeOutcome::TimedOut);
        }

        match timeout_at(deadline, self.api.fetch(&token)).await {
            Err(_) => SessionState::Done(JudgeOutcome::TimedOut),
            Ok(Ok(report)) if report.is_terminal() => {
                debug!(
                    "Submission {} finished with status {} ({})",
                    token, report.status.id, report.status.description
                );
                SessionState::Done(JudgeOutcome::Finished {
                    kind: report.classify(),
                    report,
                })
            }
            Ok(Ok(report)) => {
                debug!(
                    "Submission {} still {} after poll {}",
                    token, report.status.description, attempt
                );
                SessionState::Polling {
                    token,
                    attempt: attempt + 1,
                }
            }
            Ok(Err(e)) => {
                warn!("Poll {} for submission {} failed: {}", attempt, token, e);
                SessionState::Polling {
                    token,
                    attempt: attempt + 1,
                }
            }
        }
    }
}
